//! Worker pools that drain provider queues.
//!
//! Each pool binds a fixed number of workers to one queue. A worker
//! loops: claim → run the pipeline → mark the job completed or failed.
//! Failed jobs stay failed; nothing here re-enqueues them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::queue::{Job, JobQueue};
use crate::worker::runner::{JobOutcome, PipelineRunner};

/// Poll gap when the queue is empty.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Back-off after a claim hits queue infrastructure trouble.
const CLAIM_RETRY: Duration = Duration::from_secs(1);

/// Handle to a running set of workers bound to one queue.
pub struct WorkerPool {
    queue_name: String,
    handles: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

/// Spawn `count` workers that claim and run jobs from `queue` until
/// shut down. A worker finishes the job in hand before exiting.
pub fn spawn_workers(
    queue: Arc<dyn JobQueue>,
    runner: Arc<PipelineRunner>,
    count: usize,
) -> WorkerPool {
    let shutdown = Arc::new(AtomicBool::new(false));

    let handles = (0..count)
        .map(|n| {
            let queue = Arc::clone(&queue);
            let runner = Arc::clone(&runner);
            let shutdown = Arc::clone(&shutdown);
            tokio::spawn(async move {
                info!(queue = %queue.name(), worker = n, "worker started");
                loop {
                    if shutdown.load(Ordering::Relaxed) {
                        info!(queue = %queue.name(), worker = n, "worker shutting down");
                        return;
                    }
                    match queue.claim().await {
                        Ok(Some(job)) => process_job(queue.as_ref(), runner.as_ref(), job).await,
                        Ok(None) => tokio::time::sleep(IDLE_POLL).await,
                        Err(err) => {
                            error!(
                                queue = %queue.name(),
                                worker = n,
                                error = %err,
                                "claim failed, backing off"
                            );
                            tokio::time::sleep(CLAIM_RETRY).await;
                        }
                    }
                }
            })
        })
        .collect();

    WorkerPool {
        queue_name: queue.name().to_string(),
        handles,
        shutdown,
    }
}

impl WorkerPool {
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Signal shutdown and wait for every worker to exit.
    pub async fn shutdown(self) {
        self.shutdown.store(true, Ordering::Relaxed);
        join_all(self.handles).await;
        info!(queue = %self.queue_name, "worker pool stopped");
    }
}

/// Drive one claimed job to a terminal status.
async fn process_job(queue: &dyn JobQueue, runner: &PipelineRunner, job: Job) {
    let job_id = job.id;
    info!(
        id = %job_id,
        queue = %queue.name(),
        message_ref = %job.message_ref,
        "job claimed"
    );

    match runner.run(&job).await {
        Ok(JobOutcome::Replied(receipt)) => {
            if let Err(err) = queue.complete(job_id).await {
                error!(id = %job_id, error = %err, "could not mark job completed");
            } else {
                info!(id = %job_id, message_id = %receipt.message_id, "job completed");
            }
        }
        Ok(JobOutcome::NoReply(label)) => {
            if let Err(err) = queue.complete(job_id).await {
                error!(id = %job_id, error = %err, "could not mark job completed");
            } else {
                info!(id = %job_id, label = %label, "job completed without delivery");
            }
        }
        Err(err) => {
            // stage detail was already logged by the runner
            error!(id = %job_id, error = %err, "job failed");
            if let Err(store_err) = queue.fail(job_id, &err.to_string()).await {
                error!(id = %job_id, error = %store_err, "could not mark job failed");
            }
        }
    }
}
