//! # Storage and feed contracts
//!
//! This module defines the interfaces the settlement engine needs from the outside world.
//!
//! * [`PoolQueries`] is the read path: pools, score events, winners, settlements and the audit log. Everything the
//!   HTTP read models need is here, so read-only consumers can be handed a backend that cannot write.
//! * [`PoolDatabase`] is the write path. Every method is atomic. The settlement writer ([`PoolDatabase::apply_plan`])
//!   commits a whole snapshot plan or nothing, and enforces the pool version check.
//! * [`ScoreFeed`] is the upstream source of game snapshots.
mod data_objects;
mod pool_database;
mod pool_queries;
mod score_feed;

pub use data_objects::ApplyResult;
pub use pool_database::{PoolDatabase, PoolDatabaseError};
pub use pool_queries::PoolQueries;
pub use score_feed::{FeedError, ScoreFeed};
