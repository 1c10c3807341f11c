//! Graph half of the Graph-Temporal Analyzer (C4) — spec.md §4.4.
//!
//! Grounded on `chronx_dag::vertex`/`validation` (DAG neighbor/parent
//! reasoning), generalized from blockchain parent references to an
//! account-activity graph queried fresh per job.

use chrono::{DateTime, Utc};
use riskguard_core::{AccountId, RiskError, TransactionStatus};
use riskguard_graph::TransactionGraph;
use riskguard_store::TransactionStore;
use serde_json::json;

pub struct GraphResult {
    pub score: f64,
    pub details: serde_json::Value,
}

/// Count an account's own blocked, high-risk (`risk_score > 0.8`) history —
/// spec.md §4.4 step 3. Queried directly against the store rather than the
/// bounded per-job graph, since a neighbor's fraud history may not touch
/// the sender/receiver pair at all.
fn blocked_high_risk_history(
    store: &dyn TransactionStore,
    account: &AccountId,
    since: DateTime<Utc>,
) -> Result<usize, RiskError> {
    let as_sender = store.query_sender_history(account, since, usize::MAX)?;
    let as_receiver = store.query_receiver_history(account, since, usize::MAX)?;
    let count = as_sender
        .iter()
        .chain(as_receiver.iter())
        .filter(|t| t.status == TransactionStatus::Blocked && t.risk_score.unwrap_or(0.0) > 0.8)
        .count();
    Ok(count)
}

/// spec.md §4.4 steps 1–8 (graph portion only).
pub fn analyze_graph(
    store: &dyn TransactionStore,
    sender_id: &AccountId,
    receiver_id: &AccountId,
    window_start: DateTime<Utc>,
) -> Result<GraphResult, RiskError> {
    // Build the per-job graph from edges touching sender or receiver.
    let sender_as_sender = store.query_sender_history(sender_id, window_start, usize::MAX)?;
    let sender_as_receiver = store.query_receiver_history(sender_id, window_start, usize::MAX)?;
    let receiver_as_sender = store.query_sender_history(receiver_id, window_start, usize::MAX)?;
    let receiver_as_receiver = store.query_receiver_history(receiver_id, window_start, usize::MAX)?;

    let mut seen = std::collections::HashSet::new();
    let edges = sender_as_sender
        .iter()
        .chain(sender_as_receiver.iter())
        .chain(receiver_as_sender.iter())
        .chain(receiver_as_receiver.iter())
        .filter(|t| seen.insert(t.id))
        .map(|t| {
            (
                t.sender_id.clone(),
                t.receiver_id.clone(),
                t.amount,
                t.timestamp,
                t.risk_score,
                t.status == TransactionStatus::Blocked,
            )
        });

    let graph = TransactionGraph::build(edges);

    let mut score = 0.5f64;
    let mut is_first_transaction = true;
    let mut prev_count = 0usize;
    let mut common_count = 0usize;
    let mut distance: Option<usize> = None;
    let mut fraud_neighbor_count = 0usize;

    if let (Some(sender_node), Some(receiver_node)) =
        (graph.node_of(sender_id), graph.node_of(receiver_id))
    {
        // ── Fraud-neighborhood ───────────────────────────────────────────
        // One neighbor's query failing shouldn't sink the whole C4 analysis —
        // log and keep counting the rest, matching `_get_fraud_connections`'s
        // per-neighbor try/except-and-continue in the original.
        let neighbors = graph.neighbors(sender_node);
        for neighbor in &neighbors {
            let neighbor_account = graph.account_of(*neighbor).clone();
            match blocked_high_risk_history(store, &neighbor_account, window_start) {
                Ok(count) if count > 0 => fraud_neighbor_count += 1,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(account = %neighbor_account, error = %e, "fraud-neighbor lookup failed, skipping neighbor");
                }
            }
        }
        if blocked_high_risk_history(store, receiver_id, window_start)? > 0 {
            fraud_neighbor_count += 2;
        }
        score += (0.1 * fraud_neighbor_count as f64).min(0.5);

        // ── Existing edge sender -> receiver ─────────────────────────────
        prev_count = graph.edge_count(sender_node, receiver_node);
        if prev_count > 0 {
            is_first_transaction = false;
            score -= (0.05 * prev_count as f64).min(0.3);
        }

        // ── Shortest-path distance ────────────────────────────────────────
        distance = graph.shortest_path(sender_node, receiver_node, 4);
        match distance {
            Some(1) => score -= 0.2,
            Some(2) => score -= 0.1,
            _ => {}
        }

        // ── Common neighbors ──────────────────────────────────────────────
        let common = graph.common_neighbors(sender_node, receiver_node);
        common_count = common.len();
        score -= (0.05 * common_count as f64).min(0.3);

        // ── First-transaction bonus ───────────────────────────────────────
        if is_first_transaction && common_count == 0 {
            score += 0.3;
        }
    }

    score = score.clamp(0.0, 1.0);

    Ok(GraphResult {
        score,
        details: json!({
            "fraud_neighbor_count": fraud_neighbor_count,
            "is_first_transaction": is_first_transaction,
            "prior_edge_count": prev_count,
            "shortest_path_distance": distance,
            "common_neighbor_count": common_count,
        }),
    })
}
