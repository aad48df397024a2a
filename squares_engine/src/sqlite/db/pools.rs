use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{FeedStatus, NewPool, Pool, ScorePair},
    settlement::PoolState,
    traits::PoolDatabaseError,
};

pub async fn insert_pool(pool: NewPool, conn: &mut SqliteConnection) -> Result<Pool, PoolDatabaseError> {
    pool.rules.validate()?;
    let rules = pool.rules;
    let pool: Pool = sqlx::query_as(
        r#"
            INSERT INTO pools (
                name,
                external_game_id,
                cost_per_square,
                every_score_pays,
                quarterly_rollover,
                reverse_winners,
                number_sets,
                payout_q1,
                payout_half,
                payout_q3,
                payout_final,
                payout_per_score
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *;
        "#,
    )
    .bind(pool.name)
    .bind(pool.external_game_id)
    .bind(pool.cost_per_square)
    .bind(rules.every_score_pays)
    .bind(rules.quarterly_rollover)
    .bind(rules.reverse_winners)
    .bind(rules.number_sets)
    .bind(rules.payouts.q1)
    .bind(rules.payouts.half)
    .bind(rules.payouts.q3)
    .bind(rules.payouts.final_score)
    .bind(rules.payouts.per_score)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Pool #{} [{}] created", pool.id, pool.name);
    Ok(pool)
}

pub async fn fetch_pool(pool_id: i64, conn: &mut SqliteConnection) -> Result<Option<Pool>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM pools WHERE id = $1").bind(pool_id).fetch_optional(conn).await
}

/// Fetches the pool, or fails with [`PoolDatabaseError::PoolNotFound`].
pub async fn fetch_existing_pool(pool_id: i64, conn: &mut SqliteConnection) -> Result<Pool, PoolDatabaseError> {
    fetch_pool(pool_id, conn).await?.ok_or(PoolDatabaseError::PoolNotFound(pool_id))
}

pub async fn fetch_active_pools(conn: &mut SqliteConnection) -> Result<Vec<Pool>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT * FROM pools
        WHERE external_game_id IS NOT NULL AND trim(external_game_id) <> ''
          AND game_status IN ('pre', 'in')
          AND suspended = FALSE
        ORDER BY id
        "#,
    )
    .fetch_all(conn)
    .await
}

/// Writes the new pool state, but only if the pool is still at `expected_version`. Returns `None` if it is not, or if
/// the pool does not exist.
pub async fn update_state(
    pool_id: i64,
    expected_version: i64,
    state: &PoolState,
    conn: &mut SqliteConnection,
) -> Result<Option<Pool>, sqlx::Error> {
    let split = |s: Option<ScorePair>| (s.map(|s| s.home), s.map(|s| s.away));
    let (q1_home, q1_away) = split(state.q1);
    let (half_home, half_away) = split(state.half);
    let (q3_home, q3_away) = split(state.q3);
    let (final_home, final_away) = split(state.final_score);
    sqlx::query_as(
        r#"
            UPDATE pools SET
                game_status = $1,
                period = $2,
                clock = $3,
                home_score = $4,
                away_score = $5,
                q1_home = $6,
                q1_away = $7,
                half_home = $8,
                half_away = $9,
                q3_home = $10,
                q3_away = $11,
                final_home = $12,
                final_away = $13,
                rollover_pot = $14,
                last_home_digit = $15,
                last_away_digit = $16,
                suspended = $17,
                suspended_reason = $18,
                version = version + 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $19 AND version = $20
            RETURNING *;
        "#,
    )
    .bind(state.game_status)
    .bind(state.period)
    .bind(state.clock.as_deref())
    .bind(state.current.home)
    .bind(state.current.away)
    .bind(q1_home)
    .bind(q1_away)
    .bind(half_home)
    .bind(half_away)
    .bind(q3_home)
    .bind(q3_away)
    .bind(final_home)
    .bind(final_away)
    .bind(state.rollover_pot)
    .bind(state.last_digits.map(|d| i64::from(d.0)))
    .bind(state.last_digits.map(|d| i64::from(d.1)))
    .bind(state.suspended)
    .bind(state.suspended_reason.as_deref())
    .bind(pool_id)
    .bind(expected_version)
    .fetch_optional(conn)
    .await
}

pub async fn set_locked(pool_id: i64, locked: bool, conn: &mut SqliteConnection) -> Result<Pool, PoolDatabaseError> {
    let pool = sqlx::query_as(
        "UPDATE pools SET is_locked = $1, version = version + 1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 \
         RETURNING *",
    )
    .bind(locked)
    .bind(pool_id)
    .fetch_optional(conn)
    .await?;
    pool.ok_or(PoolDatabaseError::PoolNotFound(pool_id))
}

pub async fn set_feed_status(
    pool_id: i64,
    status: FeedStatus,
    conn: &mut SqliteConnection,
) -> Result<Pool, PoolDatabaseError> {
    let pool = sqlx::query_as(
        "UPDATE pools SET feed_status = $1, version = version + 1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 \
         RETURNING *",
    )
    .bind(status)
    .bind(pool_id)
    .fetch_optional(conn)
    .await?;
    pool.ok_or(PoolDatabaseError::PoolNotFound(pool_id))
}

pub async fn set_suspended(
    pool_id: i64,
    reason: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Pool, PoolDatabaseError> {
    let pool = sqlx::query_as(
        r#"
        UPDATE pools SET
            suspended = $1,
            suspended_reason = $2,
            version = version + 1,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(reason.is_some())
    .bind(reason)
    .bind(pool_id)
    .fetch_optional(conn)
    .await?;
    pool.ok_or(PoolDatabaseError::PoolNotFound(pool_id))
}

/// Returns the pool to its pre-game state. The grid and the rules are left alone.
pub async fn reset_state(pool_id: i64, conn: &mut SqliteConnection) -> Result<Pool, PoolDatabaseError> {
    let pool = sqlx::query_as(
        r#"
        UPDATE pools SET
            is_locked = FALSE,
            game_status = 'pre',
            period = 0,
            clock = NULL,
            home_score = 0,
            away_score = 0,
            q1_home = NULL,
            q1_away = NULL,
            half_home = NULL,
            half_away = NULL,
            q3_home = NULL,
            q3_away = NULL,
            final_home = NULL,
            final_away = NULL,
            rollover_pot = 0,
            last_home_digit = NULL,
            last_away_digit = NULL,
            feed_status = 'healthy',
            suspended = FALSE,
            suspended_reason = NULL,
            version = version + 1,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(pool_id)
    .fetch_optional(conn)
    .await?;
    pool.ok_or(PoolDatabaseError::PoolNotFound(pool_id))
}
