//! # Squares pool server
//! This crate hosts the server for the squares pool settlement engine. It is responsible for:
//! * Running one score feed poller per live pool, under a supervisor that picks up new and resumed pools.
//! * Serving the read models of a pool (scores, winners, audit log, score events).
//! * Exposing the administrative overrides: lock, simulate, fix, reset and resume.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/pools/{id}/scores`, `/pools/{id}/winners`, `/pools/{id}/leaderboard`, `/pools/{id}/audit`,
//!   `/pools/{id}/events`: read-only views of a pool.
//! * `/admin/pools/{id}/{lock|simulate|fix|reset|resume}`: admin overrides. These require the `X-Admin-Token` header.

pub mod cli;
pub mod config;
pub mod errors;

pub mod data_objects;
pub mod helpers;
pub mod integrations;
pub mod poll_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
