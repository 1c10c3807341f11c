//! riskguard-node — the worker/API binary (C7 Worker Runtime, spec.md §4.7).
//!
//! Startup sequence, adapted from `chronx-node`'s:
//!   1. Open (or initialise) the transaction store
//!   2. Connect the job broker
//!   3. Load the threshold snapshot and start the rule updater (C8)
//!   4. Spawn a fixed-size worker pool draining the broker consumer
//!   5. Start the HTTP API

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use riskguard_broker::{Acker, AmqpBroker, AmqpConfig, Delivery, InMemoryBroker, JobBroker};
use riskguard_core::{constants, RiskGuardConfig};
use riskguard_rules::ThresholdHandle;
use riskguard_scoring::run_pipeline;
use riskguard_store::{InMemoryTransactionStore, SledTransactionStore, TransactionStore};

#[derive(Parser, Debug)]
#[command(
    name = "riskguard-node",
    version,
    about = "RiskGuard worker node — durable fraud-risk scoring for payment transactions"
)]
struct Args {
    /// Directory for the persistent transaction store (sled).
    #[arg(long, default_value = "./data/riskguard-db")]
    data_dir: PathBuf,

    /// HTTP listen address for the REST API.
    #[arg(long, default_value = "127.0.0.1:8080")]
    http_addr: std::net::SocketAddr,

    /// Run against in-memory store and broker instead of sled/AMQP —
    /// for local development and demos, never production.
    #[arg(long)]
    in_memory: bool,

    /// Override the worker pool size (defaults to `RiskGuardConfig::worker_count`).
    #[arg(long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,riskguard=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let config = RiskGuardConfig::from_env();
    info!("RiskGuard node starting");

    // ── Transaction store ───────────────────────────────────────────────────
    let store: Arc<dyn TransactionStore> = if args.in_memory {
        info!("using in-memory transaction store (--in-memory)");
        Arc::new(InMemoryTransactionStore::new())
    } else {
        std::fs::create_dir_all(&args.data_dir)
            .with_context(|| format!("creating data dir {}", args.data_dir.display()))?;
        Arc::new(SledTransactionStore::open(&args.data_dir).context("opening transaction store")?)
    };

    // ── Job broker ───────────────────────────────────────────────────────────
    let (broker, inbound_rx) = if args.in_memory {
        let (broker, consumer) = InMemoryBroker::new();
        let (out_tx, out_rx) = tokio::sync::mpsc::channel::<Delivery>(64);
        tokio::spawn(consumer.run(out_tx));
        (Arc::new(broker) as Arc<dyn JobBroker>, out_rx)
    } else {
        let amqp_config = AmqpConfig { url: config.broker_url(), queue_name: config.queue_name.clone() };
        let (broker, consumer) = AmqpBroker::connect(&amqp_config).await.context("connecting to broker")?;
        let (out_tx, out_rx) = tokio::sync::mpsc::channel::<Delivery>(64);
        tokio::spawn(consumer.run(out_tx));
        (Arc::new(broker) as Arc<dyn JobBroker>, out_rx)
    };

    // ── Threshold snapshot + rule updater (C8) ─────────────────────────────
    let thresholds = Arc::new(ThresholdHandle::load_or_default(&config.threshold_snapshot_path));
    tokio::spawn(riskguard_rules::run_rule_updater(Arc::clone(&store), Arc::clone(&thresholds)));

    // ── Worker pool (C7) ─────────────────────────────────────────────────────
    let worker_count = args.workers.unwrap_or(config.worker_count).max(1);
    info!(worker_count, "starting worker pool");
    let inbound_rx = Arc::new(tokio::sync::Mutex::new(inbound_rx));
    for worker_id in 0..worker_count {
        let store = Arc::clone(&store);
        let thresholds = Arc::clone(&thresholds);
        let inbound_rx = Arc::clone(&inbound_rx);
        tokio::spawn(async move {
            loop {
                let delivery = {
                    let mut rx = inbound_rx.lock().await;
                    rx.recv().await
                };
                let Some(delivery) = delivery else {
                    info!(worker_id, "broker channel closed, worker exiting");
                    break;
                };
                process_delivery(worker_id, Arc::clone(&store), Arc::clone(&thresholds), delivery).await;
            }
        });
    }

    // ── HTTP API ────────────────────────────────────────────────────────────
    let app_state = Arc::new(riskguard_api::AppState { store: Arc::clone(&store), broker, thresholds });
    let router = riskguard_api::build_router(app_state);
    let listener = tokio::net::TcpListener::bind(args.http_addr)
        .await
        .with_context(|| format!("binding HTTP listener on {}", args.http_addr))?;
    info!(addr = %args.http_addr, "RiskGuard node ready");
    axum::serve(listener, router).await.context("HTTP server failed")?;

    Ok(())
}

/// One job's lifecycle — spec.md §4.7 step 1-6: parse/get, skip if already
/// processed, run C3-C6 under a deadline, finalize, ack or nack-requeue.
async fn process_delivery(
    worker_id: usize,
    store: Arc<dyn TransactionStore>,
    thresholds: Arc<ThresholdHandle>,
    delivery: Delivery,
) {
    let transaction_id = delivery.transaction_id;

    let tx = match store.get(transaction_id) {
        Ok(tx) => tx,
        Err(e) => {
            warn!(worker_id, %transaction_id, error = %e, "job refers to unknown transaction, dropping");
            let _ = delivery.acker.ack().await;
            return;
        }
    };

    if tx.processed {
        info!(worker_id, %transaction_id, "transaction already processed, acking (idempotent redelivery)");
        let _ = delivery.acker.ack().await;
        return;
    }

    let snapshot = thresholds.snapshot();
    let deadline = Duration::from_secs(constants::JOB_DEADLINE_SECS);

    // `run_pipeline` is a synchronous, non-yielding computation (spec.md
    // §5: "no cooperative yields inside the scoring algorithms"), so it
    // must run on a blocking thread for `timeout` to actually be able to
    // preempt it — an `async {}` wrapper around a sync call resolves in a
    // single poll and `timeout` can't step in until after it's done.
    let blocking_store = Arc::clone(&store);
    let blocking_tx = tx.clone();
    let outcome = tokio::time::timeout(
        deadline,
        tokio::task::spawn_blocking(move || run_pipeline(blocking_store.as_ref(), &blocking_tx, &snapshot)),
    )
    .await;
    let outcome = match outcome {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(join_err)) => {
            warn!(worker_id, %transaction_id, error = %join_err, "pipeline task panicked, nack-requeue");
            let _ = delivery.acker.nack_requeue().await;
            return;
        }
        Err(_) => Err(riskguard_core::RiskError::Timeout),
    };

    match outcome {
        Ok(Ok(pipeline)) => {
            let finalize = riskguard_store::FinalizeOutcome {
                risk_score: pipeline.engine.risk_score,
                graph_temporal_score: pipeline.graph_temporal.score,
                content_analysis_score: pipeline.content.score,
                status: pipeline.engine.decision,
                risk_details: pipeline.engine.risk_details,
            };
            match store.finalize(transaction_id, finalize) {
                Ok(()) => {
                    let _ = delivery.acker.ack().await;
                }
                Err(e) if e.is_retryable() => {
                    warn!(worker_id, %transaction_id, error = %e, "finalize failed, nack-requeue");
                    let _ = delivery.acker.nack_requeue().await;
                }
                Err(e) => {
                    warn!(worker_id, %transaction_id, error = %e, "finalize failed permanently, acking to avoid a poison loop");
                    let _ = delivery.acker.ack().await;
                }
            }
        }
        Ok(Err(e)) if e.is_retryable() => {
            warn!(worker_id, %transaction_id, error = %e, "pipeline failed, nack-requeue");
            let _ = delivery.acker.nack_requeue().await;
        }
        Ok(Err(e)) => {
            warn!(worker_id, %transaction_id, error = %e, "pipeline failed permanently, acking to avoid a poison loop");
            let _ = delivery.acker.ack().await;
        }
        Err(_) => {
            warn!(worker_id, %transaction_id, "job exceeded deadline, nack-requeue");
            let _ = delivery.acker.nack_requeue().await;
        }
    }
}
