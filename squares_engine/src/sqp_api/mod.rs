//! # Squares engine public API
//!
//! The `sqp_api` module exposes the programmatic API of the settlement engine. It is split by concern so that a
//! read-only consumer never has to be handed a backend that can write.
//!
//! * [`settlement_api`] drives the settlement pipeline. Every producer of game state goes through it: the feed
//!   poller, the admin *simulate* action, and the *fix* (resettle) action. It also owns the pool lifecycle actions
//!   (lock, reset, resume).
//! * [`pool_query_api`] serves the read models: scores, winners, score events and the audit log.
//! * [`simulation`] describes the synthetic plays an admin can inject.
//!
//! # API usage
//!
//! ```rust,ignore
//! use squares_engine::{events::EventProducers, SettlementApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = SettlementApi::new(db, EventProducers::default());
//! let outcome = api.process_snapshot(pool_id, &snapshot).await?;
//! ```
pub mod errors;
pub mod pool_query_api;
pub mod settlement_api;
pub mod simulation;
