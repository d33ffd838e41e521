//! best-scraper Pipeline Library
//!
//! This library provides the latency measurement pipeline including:
//! - HTTP time-to-first-byte probing
//! - Interval scheduling of the site list
//! - A fixed-size probe worker pool
//! - The concurrent result store with min / max / random selection

pub mod pipeline;

// Re-export commonly used types
pub use pipeline::{
    probe_cancellable, run_single_sweep, HttpProber, IngestHook, IngestOutcome, Prober,
    ResponseTimeStore, Scheduler, ScraperService, WorkQueue, WorkerPool,
};
