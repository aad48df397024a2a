use sqlx::SqliteConnection;

use crate::db_types::{AuditEvent, NewAuditEvent};

pub async fn insert_audit(
    pool_id: i64,
    audit: NewAuditEvent,
    conn: &mut SqliteConnection,
) -> Result<AuditEvent, sqlx::Error> {
    let payload = audit.payload.map(|p| p.to_string());
    let event = sqlx::query_as(
        r#"
            INSERT INTO audit_events (pool_id, event_type, severity, message, payload)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(pool_id)
    .bind(audit.event_type)
    .bind(audit.severity)
    .bind(audit.message)
    .bind(payload)
    .fetch_one(conn)
    .await?;
    Ok(event)
}

/// Returns the audit log for the pool, oldest first.
pub async fn fetch_audit_events(pool_id: i64, conn: &mut SqliteConnection) -> Result<Vec<AuditEvent>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM audit_events WHERE pool_id = $1 ORDER BY id").bind(pool_id).fetch_all(conn).await
}
