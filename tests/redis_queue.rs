//! Redis queue integration tests.
//!
//! These run against a real Redis instance (`REDIS_URL`, falling back
//! to `redis://127.0.0.1:6379`) and are ignored by default:
//!
//! ```text
//! cargo test --test redis_queue -- --ignored
//! ```

use redis::aio::ConnectionManager;
use uuid::Uuid;

use mail_triage::queue::{EnqueueRequest, JobQueue, JobStatus, RedisQueue};

async fn connect() -> ConnectionManager {
    let url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let client = redis::Client::open(url.as_str()).unwrap();
    ConnectionManager::new(client).await.unwrap()
}

fn request(message_ref: &str) -> EnqueueRequest {
    EnqueueRequest {
        source_account: "a@x.com".into(),
        recipient: "b@y.com".into(),
        message_ref: message_ref.into(),
    }
}

/// Fresh queue name per test so runs never see each other's keys.
fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

#[tokio::test]
#[ignore] // requires a running Redis
async fn enqueue_claim_complete_roundtrip() {
    let conn = connect().await;
    let queue = RedisQueue::new(&unique_name("gmail"), conn);

    let id = queue.enqueue(request("m1")).await.unwrap();
    assert_eq!(queue.status(id).await.unwrap(), Some(JobStatus::Queued));

    let job = queue.claim().await.unwrap().unwrap();
    assert_eq!(job.id, id);
    assert_eq!(job.status, JobStatus::Active);

    queue.complete(id).await.unwrap();
    assert_eq!(queue.status(id).await.unwrap(), None);
    assert!(queue.claim().await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // requires a running Redis
async fn failed_job_keeps_its_record() {
    let conn = connect().await;
    let queue = RedisQueue::new(&unique_name("gmail"), conn);

    let id = queue.enqueue(request("m1")).await.unwrap();
    queue.claim().await.unwrap().unwrap();
    queue.fail(id, "Delivery via gmail failed: status 500").await.unwrap();

    assert_eq!(queue.status(id).await.unwrap(), Some(JobStatus::Failed));
    assert!(queue.claim().await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // requires a running Redis
async fn recover_stalled_requeues_active_jobs() {
    let conn = connect().await;
    let queue = RedisQueue::new(&unique_name("gmail"), conn);

    let id = queue.enqueue(request("m1")).await.unwrap();
    // claimed but never finished, as if the worker process died here
    queue.claim().await.unwrap().unwrap();

    let recovered = queue.recover_stalled().await.unwrap();
    assert_eq!(recovered, 1);
    assert_eq!(queue.status(id).await.unwrap(), Some(JobStatus::Queued));

    let job = queue.claim().await.unwrap().unwrap();
    assert_eq!(job.id, id);
}
