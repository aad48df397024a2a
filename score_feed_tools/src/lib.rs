//! Client for the external score feed.
//!
//! The feed is an untrusted HTTP service that reports the state of a game, identified by the provider's game id.
//! Two payload shapes are understood: a flat `{status, homeScore, awayScore, period, clock}` object, and a
//! scoreboard event with a list of competitors (see [`ScoreboardEvent`]). Both end up as a validated
//! [`sqp_common::GameSnapshot`].
mod api;
mod config;
mod error;

mod data_objects;

pub use api::ScoreFeedApi;
pub use config::ScoreFeedConfig;
pub use data_objects::{Competitor, ScoreboardEvent, ScoreboardStatus, StatusType};
pub use error::ScoreFeedError;
