use sqlx::SqliteConnection;

use crate::{db_types::Square, traits::PoolDatabaseError};

pub async fn insert_square(
    pool_id: i64,
    position: i64,
    owner: &str,
    paid: bool,
    conn: &mut SqliteConnection,
) -> Result<Square, PoolDatabaseError> {
    if !(0..100).contains(&position) {
        return Err(PoolDatabaseError::InvalidSquare(position));
    }
    sqlx::query_as("INSERT INTO squares (pool_id, position, owner, paid) VALUES ($1, $2, $3, $4) RETURNING *")
        .bind(pool_id)
        .bind(position)
        .bind(owner)
        .bind(paid)
        .fetch_one(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(err) if err.is_unique_violation() => {
                PoolDatabaseError::SquareTaken { pool_id, position }
            },
            _ => PoolDatabaseError::from(e),
        })
}

pub async fn fetch_squares(pool_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Square>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM squares WHERE pool_id = $1 ORDER BY position").bind(pool_id).fetch_all(conn).await
}
