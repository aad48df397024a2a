//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or open a transaction and pass
//! `&mut *tx` when several calls have to land atomically, as the settlement writer does.
use std::{env, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod audit;
pub mod axis;
pub mod pools;
pub mod score_events;
pub mod settlements;
pub mod squares;

const SQLITE_DB_URL: &str = "sqlite://data/squares.db";

pub fn db_url() -> String {
    let result = env::var("SQP_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ SQP_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    // Pollers and the admin API write concurrently
    let options = url
        .parse::<SqliteConnectOptions>()?
        .foreign_keys(true)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
