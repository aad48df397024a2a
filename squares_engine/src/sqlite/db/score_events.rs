use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{NewScoreEvent, ScoreEvent};

/// Inserts the event unless an event with the same `(pool, checkpoint, score)` key already exists. Returns `None` for
/// a duplicate.
pub async fn idempotent_insert(
    pool_id: i64,
    event: &NewScoreEvent,
    conn: &mut SqliteConnection,
) -> Result<Option<ScoreEvent>, sqlx::Error> {
    let inserted: Option<ScoreEvent> = sqlx::query_as(
        r#"
            INSERT INTO score_events (pool_id, kind, checkpoint, home_score, away_score, period, clock, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (pool_id, checkpoint, home_score, away_score) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(pool_id)
    .bind(event.kind)
    .bind(event.checkpoint)
    .bind(event.home_score)
    .bind(event.away_score)
    .bind(event.period)
    .bind(event.clock.as_deref())
    .bind(event.description.as_str())
    .fetch_optional(conn)
    .await?;
    if inserted.is_none() {
        trace!("🗃️ Score event {} {}-{} for pool #{pool_id} already exists", event.checkpoint, event.home_score, event.away_score);
    }
    Ok(inserted)
}

pub async fn fetch_score_events(pool_id: i64, conn: &mut SqliteConnection) -> Result<Vec<ScoreEvent>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM score_events WHERE pool_id = $1 ORDER BY id").bind(pool_id).fetch_all(conn).await
}

pub async fn delete_score_events(pool_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM score_events WHERE pool_id = $1").bind(pool_id).execute(conn).await?;
    Ok(result.rows_affected())
}
