//! Worker system — claims jobs and drives them through the pipeline.
//!
//! Core components:
//! - `runner` — stage sequence for one claimed job (credential → fetch
//!   → classify → compose → send), with a per-call timeout
//! - `pool` — fixed set of workers polling one queue until shutdown

pub mod pool;
pub mod runner;

pub use pool::{spawn_workers, WorkerPool};
pub use runner::{JobOutcome, PipelineRunner, WorkerDeps};
