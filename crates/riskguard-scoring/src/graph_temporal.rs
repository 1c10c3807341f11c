//! Combines the temporal and graph sub-scores into C4's single output —
//! spec.md §4.4's final combine rule.

use chrono::{DateTime, Utc};
use riskguard_core::{AccountId, Amount, RiskError};
use riskguard_store::TransactionStore;
use serde_json::json;

use crate::graph_analysis::analyze_graph;
use crate::temporal::analyze_temporal;

pub struct GraphTemporalResult {
    pub score: f64,
    pub details: serde_json::Value,
    pub hourly_count: usize,
}

/// spec.md §4.4: `score = 0.7·temporal + 0.3·graph` when the sender has
/// fewer than 5 prior transactions, else `0.5·temporal + 0.5·graph`.
pub fn analyze_graph_temporal(
    store: &dyn TransactionStore,
    sender_id: &AccountId,
    receiver_id: &AccountId,
    amount: Amount,
    timestamp: DateTime<Utc>,
    sender_history_len: usize,
) -> Result<GraphTemporalResult, RiskError> {
    let window_start = timestamp - chrono::Duration::days(riskguard_core::constants::GRAPH_WINDOW_DAYS);

    let temporal = analyze_temporal(store, sender_id, receiver_id, amount, timestamp, window_start)?;
    let graph = analyze_graph(store, sender_id, receiver_id, window_start)?;

    let (w_t, w_g) = if sender_history_len < 5 { (0.7, 0.3) } else { (0.5, 0.5) };
    let score = (w_t * temporal.score + w_g * graph.score).clamp(0.0, 1.0);

    let hourly_count = temporal
        .details
        .get("hourly_count")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0) as usize;

    Ok(GraphTemporalResult {
        score,
        details: json!({
            "temporal_weight": w_t,
            "graph_weight": w_g,
            "temporal": temporal.details,
            "graph": graph.details,
        }),
        hourly_count,
    })
}
