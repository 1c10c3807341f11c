//! Threshold recalibration — spec.md §4.8.
//!
//! Grounded on `chronx_consensus::difficulty::adjust_difficulty`'s shape
//! (summarize a recent window of samples, produce a new config value) but
//! over percentile/top-K statistics rather than a single ratio.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use riskguard_core::stats::{mean, percentile};
use riskguard_core::{constants, DistributionStats, NetworkStats, ThresholdConfig, Transaction, TransactionStatus, VelocityStats};
use riskguard_store::TransactionStore;

fn distribution_stats(mut values: Vec<f64>) -> DistributionStats {
    if values.is_empty() {
        return DistributionStats::default();
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    DistributionStats {
        mean: mean(&values),
        median: percentile(&values, 0.5),
        p95: percentile(&values, 0.95),
        p99: percentile(&values, 0.99),
    }
}

fn velocity_stats(mut counts: Vec<f64>) -> VelocityStats {
    if counts.is_empty() {
        return VelocityStats::default();
    }
    counts.sort_by(|a, b| a.partial_cmp(b).unwrap());
    VelocityStats { mean: mean(&counts), p95: percentile(&counts, 0.95), p99: percentile(&counts, 0.99) }
}

fn top_k_by_count(counts: HashMap<String, usize>, k: usize) -> Vec<String> {
    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.into_iter().take(k).map(|(k, _)| k).collect()
}

fn domain_of(url: &str) -> String {
    let without_scheme = url.split("://").nth(1).unwrap_or(url);
    without_scheme.split('/').next().unwrap_or(without_scheme).to_lowercase()
}

/// spec.md §4.8: pull 30 days of finalized transactions, fall back to
/// defaults if the sample is below `RULE_UPDATE_MIN_SAMPLE`, else compute
/// fresh percentiles, velocity stats, connection degree, and top-K
/// fraud domains/receivers.
pub fn recompute(
    store: &dyn TransactionStore,
    now: DateTime<Utc>,
) -> Result<ThresholdConfig, riskguard_core::RiskError> {
    let since = now - chrono::Duration::days(constants::RULE_UPDATE_LOOKBACK_DAYS);
    let finalized = store.query_finalized_since(since)?;

    if finalized.len() < constants::RULE_UPDATE_MIN_SAMPLE {
        return Ok(ThresholdConfig { sample_size: finalized.len(), ..ThresholdConfig::default() });
    }

    let amounts: Vec<f64> = finalized.iter().map(|t| t.amount).collect();
    let amount = distribution_stats(amounts);

    let mut hourly_counts: HashMap<String, usize> = HashMap::new();
    let mut daily_counts: HashMap<String, usize> = HashMap::new();
    let mut connections: HashMap<String, std::collections::HashSet<String>> = HashMap::new();

    for tx in &finalized {
        let sender = tx.sender_id.as_str().to_string();
        *hourly_counts.entry(format!("{sender}:{}", tx.timestamp.format("%Y-%m-%dT%H"))).or_insert(0) += 1;
        *daily_counts.entry(format!("{sender}:{}", tx.timestamp.format("%Y-%m-%d"))).or_insert(0) += 1;
        connections.entry(sender).or_default().insert(tx.receiver_id.as_str().to_string());
    }

    let velocity_hourly = velocity_stats(hourly_counts.values().map(|&c| c as f64).collect());
    let velocity_daily = velocity_stats(daily_counts.values().map(|&c| c as f64).collect());

    let connection_counts: Vec<f64> = connections.values().map(|peers| peers.len() as f64).collect();
    let network = NetworkStats {
        mean_connections: mean(&connection_counts),
        p95_connections: {
            let mut sorted = connection_counts.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            percentile(&sorted, 0.95)
        },
    };

    let blocked: Vec<&Transaction> =
        finalized.iter().filter(|t| t.status == TransactionStatus::Blocked).collect();

    let mut domain_counts: HashMap<String, usize> = HashMap::new();
    let mut receiver_counts: HashMap<String, usize> = HashMap::new();
    for tx in &blocked {
        if let Some(url) = tx.payment_url() {
            *domain_counts.entry(domain_of(url)).or_insert(0) += 1;
        }
        *receiver_counts.entry(tx.receiver_id.as_str().to_string()).or_insert(0) += 1;
    }

    let top_fraud_domains = top_k_by_count(domain_counts, constants::RULE_UPDATE_TOP_K);
    let top_fraud_receivers = top_k_by_count(receiver_counts, constants::RULE_UPDATE_TOP_K);

    Ok(ThresholdConfig {
        amount,
        velocity_hourly,
        velocity_daily,
        network,
        top_fraud_domains,
        top_fraud_receivers,
        computed_at: Some(now),
        sample_size: finalized.len(),
        ..ThresholdConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskguard_core::{AccountId, RiskDetails};
    use riskguard_store::{FinalizeOutcome, InMemoryTransactionStore};
    use serde_json::Map;

    fn finalized_tx(store: &InMemoryTransactionStore, sender: &str, receiver: &str, amount: f64, blocked: bool) {
        let tx = Transaction::new(AccountId::new(sender), AccountId::new(receiver), amount, Utc::now(), Map::new())
            .unwrap();
        let id = tx.id;
        store.insert(&tx).unwrap();
        let status = if blocked { TransactionStatus::Blocked } else { TransactionStatus::Approved };
        store
            .finalize(
                id,
                FinalizeOutcome {
                    risk_score: if blocked { 0.95 } else { 0.1 },
                    graph_temporal_score: 0.1,
                    content_analysis_score: 0.1,
                    status,
                    risk_details: RiskDetails::default(),
                },
            )
            .unwrap();
    }

    #[test]
    fn below_minimum_sample_falls_back_to_defaults() {
        let store = InMemoryTransactionStore::new();
        finalized_tx(&store, "alice", "bob", 100.0, false);

        let config = recompute(&store, Utc::now()).unwrap();
        assert_eq!(config.low_risk_threshold, ThresholdConfig::default().low_risk_threshold);
        assert_eq!(config.sample_size, 1);
    }

    #[test]
    fn sufficient_sample_computes_percentiles() {
        let store = InMemoryTransactionStore::new();
        for i in 0..constants::RULE_UPDATE_MIN_SAMPLE {
            finalized_tx(&store, "alice", "bob", 100.0 + i as f64, i % 10 == 0);
        }

        let config = recompute(&store, Utc::now()).unwrap();
        assert!(config.amount.p95 > config.amount.median);
        assert!(config.sample_size >= constants::RULE_UPDATE_MIN_SAMPLE);
    }
}
