pub mod prober;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod traits;
pub mod worker;

#[cfg(test)]
mod store_tests;

pub use prober::{probe_cancellable, HttpProber};
pub use scheduler::Scheduler;
pub use service::{run_single_sweep, ScraperService};
pub use store::{IngestOutcome, ResponseTimeStore};
pub use traits::{IngestHook, Prober};
pub use worker::{WorkQueue, WorkerPool};
