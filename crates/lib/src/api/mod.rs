//! HTTP API: translates each request into one dispatcher call and returns the
//! Action Result as JSON.
//!
//! Single port, no authentication. `GET /health` is a static readiness probe; every
//! other route collapses to an action of the dispatch table.

mod server;

pub use server::{router, run_server, serve, ApiState};
