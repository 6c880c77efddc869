//! Durable, named job queues.
//!
//! One queue per provider (`gmail`, `outlook`), so a queue name is
//! enough to pick the adapter that will handle its jobs. Delivery is
//! at-least-once: a job claimed by a worker that dies before reaching
//! a terminal status can be handed out again after recovery, but a
//! single queued job is never given to two racing claimers.

mod job;
mod memory;
mod redis;

pub use job::{EnqueueRequest, Job, JobStatus};
pub use memory::MemoryQueue;
pub use self::redis::RedisQueue;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::QueueError;

/// Storage backend for one named queue.
///
/// Backends report broken storage as [`QueueError::Infrastructure`]
/// so callers can tell an unreachable queue apart from job failures.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Queue name; matches the provider adapter the jobs are for.
    fn name(&self) -> &str;

    /// Add a job and return its id.
    async fn enqueue(&self, request: EnqueueRequest) -> Result<Uuid, QueueError>;

    /// Atomically claim the oldest queued job, flipping it to active.
    /// Returns `None` when nothing is waiting.
    async fn claim(&self) -> Result<Option<Job>, QueueError>;

    /// Mark a claimed job completed and drop its record.
    async fn complete(&self, job_id: Uuid) -> Result<(), QueueError>;

    /// Mark a claimed job failed, keeping the record with error detail
    /// for later inspection.
    async fn fail(&self, job_id: Uuid, error: &str) -> Result<(), QueueError>;

    /// Current status of a job, `None` for ids the queue no longer
    /// knows (never enqueued, or completed and removed).
    async fn status(&self, job_id: Uuid) -> Result<Option<JobStatus>, QueueError>;
}
