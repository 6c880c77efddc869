//! Job model and state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a queued job.
///
/// There is no retrying state: a failed job is terminal and is never
/// re-enqueued automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting in the queue.
    Queued,
    /// Claimed by a worker; the pipeline is running.
    Active,
    /// Pipeline reached its end, with or without a delivery.
    Completed,
    /// A stage failed; error detail is kept on the record.
    Failed,
}

impl JobStatus {
    /// Check if this status allows transitioning to another.
    pub fn can_transition_to(&self, target: JobStatus) -> bool {
        use JobStatus::*;

        matches!(
            (self, target),
            (Queued, Active) | (Active, Completed) | (Active, Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Payload accepted by the enqueue entrypoint — the only write surface
/// into a queue from outside the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueRequest {
    /// Account whose cached credential authorizes the provider calls.
    pub source_account: String,
    /// Destination address for the reply.
    pub recipient: String,
    /// Provider-specific id of the message to classify.
    pub message_ref: String,
}

/// One unit of queued work: enough data to classify and reply to a
/// single message. Exclusively owned by the queue until claimed, then
/// by the claiming worker until a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub source_account: String,
    pub recipient: String,
    pub message_ref: String,
    pub status: JobStatus,
    /// Error detail for failed jobs, kept for later inspection.
    pub error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
}

impl Job {
    /// Build a fresh queued job with a new id.
    pub fn new(request: EnqueueRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_account: request.source_account,
            recipient: request.recipient,
            message_ref: request.message_ref,
            status: JobStatus::Queued,
            error: None,
            enqueued_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions_valid() {
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Active));
        assert!(JobStatus::Active.can_transition_to(JobStatus::Completed));
        assert!(JobStatus::Active.can_transition_to(JobStatus::Failed));
    }

    #[test]
    fn status_transitions_invalid() {
        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Completed));
        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Queued));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Active));
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Active));
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Active.is_terminal());
    }

    #[test]
    fn status_display() {
        assert_eq!(JobStatus::Queued.to_string(), "queued");
        assert_eq!(JobStatus::Active.to_string(), "active");
    }

    #[test]
    fn status_serde_roundtrip() {
        let json = serde_json::to_string(&JobStatus::Active).unwrap();
        assert_eq!(json, "\"active\"");
        let parsed: JobStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, JobStatus::Active);
    }

    #[test]
    fn new_job_starts_queued_without_error() {
        let job = Job::new(EnqueueRequest {
            source_account: "a@x.com".into(),
            recipient: "b@y.com".into(),
            message_ref: "m1".into(),
        });
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.error.is_none());
        assert_eq!(job.source_account, "a@x.com");
    }

    #[test]
    fn job_serde_roundtrip() {
        let job = Job::new(EnqueueRequest {
            source_account: "a@x.com".into(),
            recipient: "b@y.com".into(),
            message_ref: "m1".into(),
        });
        let json = serde_json::to_string(&job).unwrap();
        let back: Job = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, job.id);
        assert_eq!(back.status, JobStatus::Queued);
        assert_eq!(back.message_ref, "m1");
    }
}
