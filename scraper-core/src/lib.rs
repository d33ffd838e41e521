//! best-scraper Core Library
//!
//! This library provides core functionality for the best-scraper system including:
//! - Configuration management
//! - Site list loading
//! - Measurement type and shared errors

pub mod config;
pub mod error;
pub mod measurement;
pub mod sites;

// Re-export commonly used types
pub use config::model::{Config, ScraperSettings, ServerSettings};
pub use error::{ProbeError, StoreError};
pub use measurement::Measurement;
