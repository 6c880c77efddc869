//! Redis-backed queue.
//!
//! Layout per queue:
//!   `queue:{name}:pending`   list of job ids, producers LPUSH
//!   `queue:{name}:active`    list of ids claimed by live workers
//!   `queue:{name}:job:{id}`  JSON job record
//!
//! Claiming is a single LMOVE from pending to active, which the server
//! runs atomically, so concurrent claimers always receive distinct ids.

use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::warn;
use uuid::Uuid;

use crate::error::QueueError;
use crate::queue::{EnqueueRequest, Job, JobQueue, JobStatus};

pub struct RedisQueue {
    name: String,
    pending_key: String,
    active_key: String,
    conn: ConnectionManager,
}

fn infra(err: redis::RedisError) -> QueueError {
    QueueError::Infrastructure {
        reason: err.to_string(),
    }
}

fn pending_key(name: &str) -> String {
    format!("queue:{name}:pending")
}

fn active_key(name: &str) -> String {
    format!("queue:{name}:active")
}

fn job_key(name: &str, id: Uuid) -> String {
    format!("queue:{name}:job:{id}")
}

impl RedisQueue {
    pub fn new(name: &str, conn: ConnectionManager) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            pending_key: pending_key(name),
            active_key: active_key(name),
            conn,
        })
    }

    fn job_key(&self, id: Uuid) -> String {
        job_key(&self.name, id)
    }

    async fn load_job(&self, id: Uuid) -> Result<Job, QueueError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(self.job_key(id))
            .query_async(&mut conn)
            .await
            .map_err(infra)?;
        let raw = raw.ok_or(QueueError::UnknownJob { id })?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn save_job(&self, job: &Job) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        let raw = serde_json::to_string(job)?;
        let _: () = redis::cmd("SET")
            .arg(self.job_key(job.id))
            .arg(raw)
            .query_async(&mut conn)
            .await
            .map_err(infra)?;
        Ok(())
    }

    async fn drop_from_active(&self, id: Uuid) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("LREM")
            .arg(&self.active_key)
            .arg(0)
            .arg(id.to_string())
            .query_async(&mut conn)
            .await
            .map_err(infra)?;
        Ok(())
    }

    /// Move jobs stranded on the active list by a crashed process back
    /// to pending. Runs once at startup, before workers spawn.
    ///
    /// A recovered job may already have had its reply sent; delivery is
    /// at-least-once, so it runs again rather than being lost.
    pub async fn recover_stalled(&self) -> Result<usize, QueueError> {
        let mut conn = self.conn.clone();
        let mut recovered = 0;
        loop {
            let id: Option<String> = redis::cmd("LMOVE")
                .arg(&self.active_key)
                .arg(&self.pending_key)
                .arg("RIGHT")
                .arg("RIGHT")
                .query_async(&mut conn)
                .await
                .map_err(infra)?;
            let Some(id) = id else {
                break;
            };
            let Ok(id) = Uuid::parse_str(&id) else {
                warn!(queue = %self.name, raw = %id, "dropping unparseable job id during recovery");
                continue;
            };
            match self.load_job(id).await {
                Ok(mut job) => {
                    job.status = JobStatus::Queued;
                    job.error = None;
                    self.save_job(&job).await?;
                    recovered += 1;
                }
                Err(QueueError::UnknownJob { .. }) => {
                    warn!(queue = %self.name, id = %id, "active id had no job record, skipping");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(recovered)
    }
}

#[async_trait]
impl JobQueue for RedisQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn enqueue(&self, request: EnqueueRequest) -> Result<Uuid, QueueError> {
        let job = Job::new(request);
        let id = job.id;
        // write the record first so a racing claim always finds it
        self.save_job(&job).await?;
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("LPUSH")
            .arg(&self.pending_key)
            .arg(id.to_string())
            .query_async(&mut conn)
            .await
            .map_err(infra)?;
        Ok(id)
    }

    async fn claim(&self) -> Result<Option<Job>, QueueError> {
        let mut conn = self.conn.clone();
        let id: Option<String> = redis::cmd("LMOVE")
            .arg(&self.pending_key)
            .arg(&self.active_key)
            .arg("RIGHT")
            .arg("LEFT")
            .query_async(&mut conn)
            .await
            .map_err(infra)?;
        let Some(id) = id else {
            return Ok(None);
        };
        let id = Uuid::parse_str(&id).map_err(|_| QueueError::Infrastructure {
            reason: format!("unparseable job id on queue {}: {id}", self.name),
        })?;
        let mut job = self.load_job(id).await?;
        job.status = JobStatus::Active;
        self.save_job(&job).await?;
        Ok(Some(job))
    }

    async fn complete(&self, job_id: Uuid) -> Result<(), QueueError> {
        let job = self.load_job(job_id).await?;
        if !job.status.can_transition_to(JobStatus::Completed) {
            return Err(QueueError::InvalidTransition {
                id: job_id,
                state: job.status.to_string(),
                target: JobStatus::Completed.to_string(),
            });
        }
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("DEL")
            .arg(self.job_key(job_id))
            .query_async(&mut conn)
            .await
            .map_err(infra)?;
        self.drop_from_active(job_id).await
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> Result<(), QueueError> {
        let mut job = self.load_job(job_id).await?;
        if !job.status.can_transition_to(JobStatus::Failed) {
            return Err(QueueError::InvalidTransition {
                id: job_id,
                state: job.status.to_string(),
                target: JobStatus::Failed.to_string(),
            });
        }
        job.status = JobStatus::Failed;
        job.error = Some(error.to_string());
        self.save_job(&job).await?;
        self.drop_from_active(job_id).await
    }

    async fn status(&self, job_id: Uuid) -> Result<Option<JobStatus>, QueueError> {
        match self.load_job(job_id).await {
            Ok(job) => Ok(Some(job.status)),
            Err(QueueError::UnknownJob { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
