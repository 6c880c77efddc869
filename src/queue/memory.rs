//! In-memory queue backend.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::QueueError;
use crate::queue::{EnqueueRequest, Job, JobQueue, JobStatus};

/// FIFO queue backed by process memory. Used in tests and when no
/// Redis URL is configured; jobs do not survive a restart.
///
/// Claiming pops the pending id and flips the status under one lock,
/// so two racing workers can never claim the same job.
pub struct MemoryQueue {
    name: String,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    pending: VecDeque<Uuid>,
    jobs: HashMap<Uuid, Job>,
}

impl MemoryQueue {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            inner: Mutex::new(Inner::default()),
        })
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn enqueue(&self, request: EnqueueRequest) -> Result<Uuid, QueueError> {
        let job = Job::new(request);
        let id = job.id;
        let mut inner = self.inner.lock().await;
        inner.pending.push_back(id);
        inner.jobs.insert(id, job);
        Ok(id)
    }

    async fn claim(&self) -> Result<Option<Job>, QueueError> {
        let mut inner = self.inner.lock().await;
        let Some(id) = inner.pending.pop_front() else {
            return Ok(None);
        };
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or(QueueError::UnknownJob { id })?;
        job.status = JobStatus::Active;
        Ok(Some(job.clone()))
    }

    async fn complete(&self, job_id: Uuid) -> Result<(), QueueError> {
        let mut inner = self.inner.lock().await;
        let job = inner
            .jobs
            .get(&job_id)
            .ok_or(QueueError::UnknownJob { id: job_id })?;
        if !job.status.can_transition_to(JobStatus::Completed) {
            return Err(QueueError::InvalidTransition {
                id: job_id,
                state: job.status.to_string(),
                target: JobStatus::Completed.to_string(),
            });
        }
        inner.jobs.remove(&job_id);
        Ok(())
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> Result<(), QueueError> {
        let mut inner = self.inner.lock().await;
        let job = inner
            .jobs
            .get_mut(&job_id)
            .ok_or(QueueError::UnknownJob { id: job_id })?;
        if !job.status.can_transition_to(JobStatus::Failed) {
            return Err(QueueError::InvalidTransition {
                id: job_id,
                state: job.status.to_string(),
                target: JobStatus::Failed.to_string(),
            });
        }
        job.status = JobStatus::Failed;
        job.error = Some(error.to_string());
        Ok(())
    }

    async fn status(&self, job_id: Uuid) -> Result<Option<JobStatus>, QueueError> {
        let inner = self.inner.lock().await;
        Ok(inner.jobs.get(&job_id).map(|job| job.status))
    }
}
