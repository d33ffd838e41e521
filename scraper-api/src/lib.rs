//! best-scraper Server Library
//!
//! This library provides the HTTP query surface over the latency store

pub mod app;
pub mod observability;
pub mod router;

// Re-export the main server function
pub use app::{start_server, ServerOptions};
