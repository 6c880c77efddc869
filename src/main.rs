use std::sync::Arc;

use redis::aio::ConnectionManager;

use mail_triage::config::Config;
use mail_triage::credentials::{CredentialStore, MemoryCredentialStore, RedisCredentialStore};
use mail_triage::llm::create_model;
use mail_triage::pipeline::{Classifier, Composer};
use mail_triage::providers::{GmailProvider, MailProvider, OutlookProvider};
use mail_triage::queue::{JobQueue, MemoryQueue, RedisQueue};
use mail_triage::worker::{spawn_workers, PipelineRunner, WorkerDeps, WorkerPool};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export OPENAI_API_KEY=sk-...");
        std::process::exit(1);
    });

    eprintln!("📬 Mail Triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   Workers per queue: {}", config.workers_per_queue);
    eprintln!(
        "   Call timeout: {}s\n",
        config.call_timeout.as_secs()
    );

    let llm = create_model(&config.llm)?;

    // ── Providers ────────────────────────────────────────────────────────
    let gmail: Arc<dyn MailProvider> = Arc::new(GmailProvider::new(&config.gmail_api_base));
    let outlook: Arc<dyn MailProvider> = Arc::new(OutlookProvider::new(&config.outlook_api_base));

    // ── Credential store + queues ────────────────────────────────────────
    // Redis when configured, otherwise process-local memory.
    let credentials: Arc<dyn CredentialStore>;
    let queues: Vec<Arc<dyn JobQueue>>;
    match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            let conn = ConnectionManager::new(client).await?;
            eprintln!("   Backend: redis");

            let gmail_queue = RedisQueue::new(gmail.name(), conn.clone());
            let outlook_queue = RedisQueue::new(outlook.name(), conn.clone());

            // Jobs stranded mid-run by a previous process go back to
            // pending before any worker starts.
            let recovered =
                gmail_queue.recover_stalled().await? + outlook_queue.recover_stalled().await?;
            if recovered > 0 {
                eprintln!("   Recovered {recovered} stalled job(s)");
            }

            credentials = Arc::new(RedisCredentialStore::new(conn));
            queues = vec![gmail_queue as Arc<dyn JobQueue>, outlook_queue];
        }
        None => {
            eprintln!("   Backend: memory (jobs do not survive restarts)");
            credentials = Arc::new(MemoryCredentialStore::new());
            queues = vec![
                MemoryQueue::new(gmail.name()) as Arc<dyn JobQueue>,
                MemoryQueue::new(outlook.name()),
            ];
        }
    }

    // ── Pipeline stages ──────────────────────────────────────────────────
    let classifier = Arc::new(Classifier::new(llm.clone()));
    let composer = Arc::new(Composer::new(llm.clone(), &config.product_name));

    // ── Worker pools, one per provider queue ─────────────────────────────
    let mut pools: Vec<WorkerPool> = Vec::new();
    for (provider, queue) in [gmail, outlook].into_iter().zip(queues) {
        let runner = Arc::new(PipelineRunner::new(WorkerDeps {
            credentials: Arc::clone(&credentials),
            provider,
            classifier: Arc::clone(&classifier),
            composer: Arc::clone(&composer),
            call_timeout: config.call_timeout,
        }));
        eprintln!(
            "   Queue {}: {} worker(s)",
            queue.name(),
            config.workers_per_queue
        );
        pools.push(spawn_workers(queue, runner, config.workers_per_queue));
    }
    eprintln!();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    for pool in pools {
        pool.shutdown().await;
    }

    Ok(())
}
