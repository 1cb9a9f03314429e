//! Gesher Web - HTTP API layer
//!
//! Thin axum layer over `gesher-core`: the contact fan-out endpoint, media
//! preload/readiness endpoints, and a health probe.

pub mod handlers;
pub mod server;

pub use server::{AppState, build_router, run_server};
