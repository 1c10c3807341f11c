//! Rule Updater (C8) — spec.md §4.8.

pub mod recompute;
pub mod snapshot;

pub use recompute::recompute;
pub use snapshot::ThresholdHandle;

use std::sync::Arc;
use std::time::Duration;

use riskguard_core::constants;
use riskguard_store::TransactionStore;
use tracing::{error, info};

/// Runs the 24h recompute cadence, retrying in 1h on error — spec.md §4.8
/// "Scheduled every 24h (on error: retry in 1h)". Spawn with
/// `tokio::spawn(run_rule_updater(store, handle))`.
pub async fn run_rule_updater(store: Arc<dyn TransactionStore>, handle: Arc<ThresholdHandle>) {
    loop {
        let outcome = recompute(store.as_ref(), chrono::Utc::now());
        let sleep_for = match outcome {
            Ok(config) => {
                let sample_size = config.sample_size;
                match handle.publish(config) {
                    Ok(()) => {
                        info!(sample_size, "threshold snapshot refreshed");
                        Duration::from_secs(constants::RULE_UPDATE_INTERVAL_SECS)
                    }
                    Err(e) => {
                        error!(error = %e, "failed to publish threshold snapshot, retrying in 1h");
                        Duration::from_secs(constants::RULE_UPDATE_RETRY_SECS)
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "threshold recompute failed, retrying in 1h");
                Duration::from_secs(constants::RULE_UPDATE_RETRY_SECS)
            }
        };
        tokio::time::sleep(sleep_for).await;
    }
}
