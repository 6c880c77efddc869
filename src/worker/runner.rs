//! Per-job pipeline execution.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::credentials::{Credential, CredentialStore};
use crate::error::{CredentialError, Error};
use crate::pipeline::{Classifier, Composer, Label};
use crate::providers::{DeliveryReceipt, MailProvider};
use crate::queue::Job;

/// Shared dependencies for pipeline execution.
#[derive(Clone)]
pub struct WorkerDeps {
    pub credentials: Arc<dyn CredentialStore>,
    pub provider: Arc<dyn MailProvider>,
    pub classifier: Arc<Classifier>,
    pub composer: Arc<Composer>,
    /// Budget for each external call. A slow credential store,
    /// provider, or completion call fails the job instead of stalling
    /// the worker.
    pub call_timeout: Duration,
}

/// Terminal result of a successful run.
#[derive(Debug)]
pub enum JobOutcome {
    /// Reply composed and delivered.
    Replied(DeliveryReceipt),
    /// The label has no reply template; the job completes without a
    /// delivery.
    NoReply(Label),
}

/// Runs one claimed job through the stage sequence:
/// credential → fetch → classify → compose → send.
pub struct PipelineRunner {
    deps: WorkerDeps,
}

impl PipelineRunner {
    pub fn new(deps: WorkerDeps) -> Self {
        Self { deps }
    }

    /// Execute the full stage sequence for one claimed job.
    ///
    /// The first stage error aborts the run; by the time this returns
    /// an error it has already been logged with its stage tag.
    pub async fn run(&self, job: &Job) -> Result<JobOutcome, Error> {
        let credential = self
            .stage(
                job,
                "credential",
                self.resolve_credential(&job.source_account),
            )
            .await?;

        let message = self
            .stage(
                job,
                "fetch",
                self.deps
                    .provider
                    .fetch_message(&job.message_ref, &credential.token),
            )
            .await?;

        let label = self
            .stage(job, "classify", self.deps.classifier.classify(&message))
            .await?;
        info!(id = %job.id, label = %label, "message classified");

        if !self.deps.composer.can_reply(label) {
            info!(
                id = %job.id,
                label = %label,
                "no reply template for label, completing without delivery"
            );
            return Ok(JobOutcome::NoReply(label));
        }

        let reply = self
            .stage(
                job,
                "compose",
                self.deps.composer.compose(label, &job.recipient),
            )
            .await?;

        let receipt = self
            .stage(
                job,
                "send",
                self.deps
                    .provider
                    .send_reply(&reply, &job.recipient, &credential.token),
            )
            .await?;
        info!(
            id = %job.id,
            provider = %receipt.provider,
            message_id = %receipt.message_id,
            "reply delivered"
        );

        Ok(JobOutcome::Replied(receipt))
    }

    /// Look up the account credential, mapping absent and expired
    /// entries to their distinct errors before any provider call.
    async fn resolve_credential(&self, account: &str) -> Result<Credential, CredentialError> {
        match self.deps.credentials.get(account).await? {
            Some(credential) if credential.is_expired() => Err(CredentialError::Expired {
                account: account.to_string(),
            }),
            Some(credential) => Ok(credential),
            None => Err(CredentialError::Missing {
                account: account.to_string(),
            }),
        }
    }

    /// Run one stage under the per-call timeout, logging start and
    /// outcome tagged with the stage name.
    async fn stage<T, E, F>(&self, job: &Job, stage: &'static str, fut: F) -> Result<T, Error>
    where
        E: Into<Error>,
        F: std::future::Future<Output = Result<T, E>>,
    {
        debug!(id = %job.id, stage, "stage started");
        match tokio::time::timeout(self.deps.call_timeout, fut).await {
            Ok(Ok(value)) => {
                debug!(id = %job.id, stage, "stage finished");
                Ok(value)
            }
            Ok(Err(err)) => {
                let err = err.into();
                error!(id = %job.id, stage, error = %err, "stage failed");
                Err(err)
            }
            Err(_) => {
                let err = Error::Timeout {
                    stage,
                    seconds: self.deps.call_timeout.as_secs(),
                };
                error!(id = %job.id, stage, error = %err, "stage timed out");
                Err(err)
            }
        }
    }
}
