use sqlx::{FromRow, SqliteConnection};

use crate::{
    axis::{AxisNumbers, AxisSet},
    traits::PoolDatabaseError,
};

#[derive(Debug, Clone, FromRow)]
struct AxisRow {
    set_index: i64,
    home_digits: String,
    away_digits: String,
}

pub async fn insert_axis_numbers(
    pool_id: i64,
    axis: &AxisNumbers,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    for (index, set) in axis.sets().iter().enumerate() {
        sqlx::query("INSERT INTO axis_numbers (pool_id, set_index, home_digits, away_digits) VALUES ($1, $2, $3, $4)")
            .bind(pool_id)
            .bind(index as i64)
            .bind(set.home_digits())
            .bind(set.away_digits())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Fetches the axis numbers of a pool, or `None` if they have not been drawn yet.
pub async fn fetch_axis_numbers(
    pool_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<AxisNumbers>, PoolDatabaseError> {
    let rows: Vec<AxisRow> = sqlx::query_as("SELECT * FROM axis_numbers WHERE pool_id = $1 ORDER BY set_index")
        .bind(pool_id)
        .fetch_all(conn)
        .await?;
    if rows.is_empty() {
        return Ok(None);
    }
    let sets = rows
        .iter()
        .map(|r| {
            AxisSet::from_digit_strings(&r.home_digits, &r.away_digits)
                .map_err(|e| PoolDatabaseError::CorruptData(format!("axis set {} of pool #{pool_id}. {e}", r.set_index)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(AxisNumbers::new(sets)))
}

pub async fn delete_axis_numbers(pool_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM axis_numbers WHERE pool_id = $1").bind(pool_id).execute(conn).await?;
    Ok(result.rows_affected())
}
