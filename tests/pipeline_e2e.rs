//! End-to-end pipeline tests.
//!
//! Each test runs the real stack — memory queue, memory credential
//! store, worker pool, Gmail adapter, OpenAI-style client — against
//! wiremock servers standing in for the provider and the completion
//! endpoint. Only the network is faked.

use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use secrecy::SecretString;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mail_triage::config::LlmConfig;
use mail_triage::credentials::{CredentialStore, MemoryCredentialStore};
use mail_triage::llm::create_model;
use mail_triage::pipeline::{Classifier, Composer};
use mail_triage::providers::GmailProvider;
use mail_triage::queue::{EnqueueRequest, JobQueue, JobStatus, MemoryQueue};
use mail_triage::worker::{spawn_workers, PipelineRunner, WorkerDeps};

/// How long a test waits for jobs to reach a terminal status.
const WAIT_BUDGET: Duration = Duration::from_secs(5);

const COMPOSED_REPLY: &str = "Thank you for your interest!\n\n\
    Secure mailing with encryption\nAutomated scheduling\n\n\
    Privacy you can trust\nTime saved every week";

fn completion_body(content: &str) -> serde_json::Value {
    json!({ "choices": [ { "message": { "content": content } } ] })
}

fn gmail_message_body(text: &str) -> serde_json::Value {
    json!({
        "snippet": "short preview",
        "payload": {
            "headers": [ { "name": "Subject", "value": "Quick question" } ],
            "parts": [
                {
                    "mimeType": "text/plain",
                    "body": { "data": URL_SAFE_NO_PAD.encode(text) }
                }
            ]
        }
    })
}

/// Classify calls ask for a one-word label; compose calls ask for the
/// three-section reply. Both hit the same completions path, so the
/// mocks are told apart by prompt text.
async fn mount_llm(server: &MockServer, label: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("one word answer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(label)))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("exactly three sections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(COMPOSED_REPLY)))
        .mount(server)
        .await;
}

fn build_deps(
    store: Arc<MemoryCredentialStore>,
    gmail_base: &str,
    llm_base: &str,
) -> WorkerDeps {
    let llm = create_model(&LlmConfig {
        api_key: SecretString::from("test-key".to_string()),
        api_base: llm_base.to_string(),
        model: "gpt-3.5-turbo".to_string(),
    })
    .unwrap();

    WorkerDeps {
        credentials: store,
        provider: Arc::new(GmailProvider::new(gmail_base)),
        classifier: Arc::new(Classifier::new(llm.clone())),
        composer: Arc::new(Composer::new(llm, "ReachInbox")),
        call_timeout: Duration::from_secs(5),
    }
}

async fn wait_for_status(queue: &Arc<MemoryQueue>, id: Uuid, wanted: Option<JobStatus>) {
    let deadline = Instant::now() + WAIT_BUDGET;
    loop {
        if queue.status(id).await.unwrap() == wanted {
            return;
        }
        assert!(
            Instant::now() < deadline,
            "job did not reach {wanted:?} in time"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn interested_message_is_classified_and_replied() {
    let gmail = MockServer::start().await;
    let llm = MockServer::start().await;
    mount_llm(&llm, "Interested").await;

    Mock::given(method("GET"))
        .and(path("/users/me/messages/m1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gmail_message_body("I'm interested in learning more")),
        )
        .expect(1)
        .mount(&gmail)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/me/messages/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "sent-123" })))
        .expect(1)
        .mount(&gmail)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    store
        .set("a@x.com", "tok-1", Duration::from_secs(3600))
        .await
        .unwrap();

    let queue = MemoryQueue::new("gmail");
    let id = queue
        .enqueue(EnqueueRequest {
            source_account: "a@x.com".into(),
            recipient: "b@y.com".into(),
            message_ref: "m1".into(),
        })
        .await
        .unwrap();

    let runner = Arc::new(PipelineRunner::new(build_deps(
        store,
        &gmail.uri(),
        &llm.uri(),
    )));
    let pool = spawn_workers(queue.clone(), runner, 2);

    // completed jobs are removed from the queue
    wait_for_status(&queue, id, None).await;
    pool.shutdown().await;

    // the delivered envelope carries the recipient, the label-derived
    // subject, and the three-section HTML
    let requests = gmail.received_requests().await.unwrap();
    let send = requests
        .iter()
        .find(|r| r.url.path() == "/users/me/messages/send")
        .expect("send request recorded");
    let body: serde_json::Value = serde_json::from_slice(&send.body).unwrap();
    let envelope =
        String::from_utf8(URL_SAFE_NO_PAD.decode(body["raw"].as_str().unwrap()).unwrap()).unwrap();
    assert!(envelope.contains("To: b@y.com"));
    assert!(envelope.contains("Subject: Interested of ReachInbox"));
    assert!(envelope.contains("<h2>Thank you for your interest!</h2>"));
    assert!(envelope.contains("<li>Secure mailing with encryption</li>"));
}

#[tokio::test]
async fn missing_credential_fails_the_job_without_provider_calls() {
    let gmail = MockServer::start().await;
    let llm = MockServer::start().await;
    mount_llm(&llm, "Interested").await;

    // no credential for the account
    let store = Arc::new(MemoryCredentialStore::new());

    let queue = MemoryQueue::new("gmail");
    let id = queue
        .enqueue(EnqueueRequest {
            source_account: "a@x.com".into(),
            recipient: "b@y.com".into(),
            message_ref: "m1".into(),
        })
        .await
        .unwrap();

    let runner = Arc::new(PipelineRunner::new(build_deps(
        store,
        &gmail.uri(),
        &llm.uri(),
    )));
    let pool = spawn_workers(queue.clone(), runner, 1);

    wait_for_status(&queue, id, Some(JobStatus::Failed)).await;
    pool.shutdown().await;

    assert!(gmail.received_requests().await.unwrap().is_empty());
    assert!(llm.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unrecognized_label_completes_without_a_send() {
    let gmail = MockServer::start().await;
    let llm = MockServer::start().await;
    mount_llm(&llm, "Hard to say, could go either way").await;

    Mock::given(method("GET"))
        .and(path("/users/me/messages/m1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gmail_message_body("hmm")))
        .expect(1)
        .mount(&gmail)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/me/messages/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "sent-999" })))
        .expect(0)
        .mount(&gmail)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    store
        .set("a@x.com", "tok-1", Duration::from_secs(3600))
        .await
        .unwrap();

    let queue = MemoryQueue::new("gmail");
    let id = queue
        .enqueue(EnqueueRequest {
            source_account: "a@x.com".into(),
            recipient: "b@y.com".into(),
            message_ref: "m1".into(),
        })
        .await
        .unwrap();

    let runner = Arc::new(PipelineRunner::new(build_deps(
        store,
        &gmail.uri(),
        &llm.uri(),
    )));
    let pool = spawn_workers(queue.clone(), runner, 1);

    // removed from the queue means completed, not failed
    wait_for_status(&queue, id, None).await;
    pool.shutdown().await;
}
