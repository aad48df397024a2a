//! Squares Pool Settlement Engine
//!
//! The settlement engine turns the evolving score of a live game into persisted winners for a squares pool. It
//! ingests snapshots of an external score feed, derives discrete score events, resolves the winning grid square at
//! every checkpoint under the pool's rules, and writes winners and an audit trail exactly once per checkpoint, no
//! matter how often a snapshot is replayed or retried.
//!
//! The library is split in three layers:
//! 1. Pure logic. [`mod@rules`] (validated pool configuration), [`mod@axis`] (the digit permutations drawn when a pool
//!    locks), [`mod@normalizer`] (snapshot diffs to score events), [`mod@resolver`] (score to winning square) and
//!    [`mod@settlement`] (plans combining all of the above). None of these do any I/O.
//! 2. Storage ([`mod@traits`]). The [`PoolDatabase`] and [`PoolQueries`] traits hide the backend. SQLite is the
//!    supported backend. The settlement writer ([`PoolDatabase::apply_plan`]) commits a whole plan in one transaction
//!    and rejects stale plans with an optimistic version check.
//! 3. The public API ([`SettlementApi`], [`PoolQueryApi`]) and the feed [`poller`]. Every producer of game state
//!    (feed, admin simulate, admin fix) goes through the same pipeline.
//!
//! The engine also emits events when winners are settled and audit entries are written. See [`mod@events`] for how
//! to hook into them.
pub mod axis;
pub mod db_types;
pub mod events;
pub mod normalizer;
pub mod poller;
pub mod resolver;
pub mod rules;
pub mod settlement;
mod sqp_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::{db, SqliteDatabase};
pub use sqp_api::{
    errors::{PoolQueryError, SettlementError},
    pool_query_api::{OwnerWinnings, PoolQueryApi},
    settlement_api::{SettlementApi, SettlementConfig, SnapshotOutcome},
    simulation,
};
pub use traits::{ApplyResult, FeedError, PoolDatabase, PoolDatabaseError, PoolQueries, ScoreFeed};
