use sqlx::SqliteConnection;
use sqp_common::Cents;

use crate::db_types::{NewSettlement, Settlement, Winner};

/// Inserts the settlement unless the checkpoint `(pool, checkpoint, score)` has already been settled. Returns `None`
/// if it has.
pub async fn idempotent_insert(
    pool_id: i64,
    settlement: &NewSettlement,
    conn: &mut SqliteConnection,
) -> Result<Option<Settlement>, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO settlements (
                pool_id,
                checkpoint,
                home_score,
                away_score,
                home_digit,
                away_digit,
                square,
                owner,
                outcome,
                amount,
                rollover_in
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (pool_id, checkpoint, home_score, away_score) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(pool_id)
    .bind(settlement.checkpoint)
    .bind(settlement.home_score)
    .bind(settlement.away_score)
    .bind(i64::from(settlement.home_digit))
    .bind(i64::from(settlement.away_digit))
    .bind(i64::from(settlement.square))
    .bind(settlement.owner.as_deref())
    .bind(settlement.outcome)
    .bind(settlement.amount)
    .bind(settlement.rollover_in)
    .fetch_optional(conn)
    .await
}

/// Records the winner of a paid settlement.
pub async fn insert_winner(
    settlement: &Settlement,
    owner: &str,
    description: &str,
    conn: &mut SqliteConnection,
) -> Result<Winner, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO winners (
                pool_id,
                settlement_id,
                period,
                home_digit,
                away_digit,
                square,
                owner,
                amount,
                description,
                home_score,
                away_score
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *;
        "#,
    )
    .bind(settlement.pool_id)
    .bind(settlement.id)
    .bind(settlement.checkpoint)
    .bind(settlement.home_digit)
    .bind(settlement.away_digit)
    .bind(settlement.square)
    .bind(owner)
    .bind(settlement.amount)
    .bind(description)
    .bind(settlement.home_score)
    .bind(settlement.away_score)
    .fetch_one(conn)
    .await
}

pub async fn fetch_settlements(pool_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Settlement>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM settlements WHERE pool_id = $1 ORDER BY id").bind(pool_id).fetch_all(conn).await
}

pub async fn fetch_winners(pool_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Winner>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM winners WHERE pool_id = $1 ORDER BY id").bind(pool_id).fetch_all(conn).await
}

/// The total paid out for the pool so far.
pub async fn distributed_total(pool_id: i64, conn: &mut SqliteConnection) -> Result<Cents, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM winners WHERE pool_id = $1")
        .bind(pool_id)
        .fetch_one(conn)
        .await?;
    Ok(Cents::from(total))
}

pub async fn count_settlements(pool_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM settlements WHERE pool_id = $1").bind(pool_id).fetch_one(conn).await
}

/// Deletes all winners and settlements for the pool. Returns the number of settlements removed.
pub async fn delete_settlements(pool_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    sqlx::query("DELETE FROM winners WHERE pool_id = $1").bind(pool_id).execute(&mut *conn).await?;
    let result = sqlx::query("DELETE FROM settlements WHERE pool_id = $1").bind(pool_id).execute(conn).await?;
    Ok(result.rows_affected())
}
