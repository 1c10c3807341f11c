//! C3 through C6 of the evaluation pipeline: input context, graph-temporal
//! analysis, content analysis, and the risk engine — spec.md §4.3-§4.6.

pub mod content;
pub mod context;
pub mod engine;
pub mod graph_analysis;
pub mod graph_temporal;
pub mod similarity;
pub mod temporal;

pub use content::{analyze_content, ContentResult};
pub use context::{AccountProfile, EvaluationContext};
pub use engine::EngineResult;
pub use graph_temporal::{analyze_graph_temporal, GraphTemporalResult};

use riskguard_core::{constants, RiskError, ThresholdConfig, Transaction};
use riskguard_store::TransactionStore;

/// Output of running the full C3→C6 pipeline for one transaction.
pub struct PipelineOutcome {
    pub graph_temporal: GraphTemporalResult,
    pub content: ContentResult,
    pub engine: EngineResult,
}

/// Runs C3 (context load), C4 (graph-temporal), C5 (content), C6 (engine)
/// in sequence for one transaction — spec.md §4.7 step 4.
pub fn run_pipeline(
    store: &dyn TransactionStore,
    tx: &Transaction,
    thresholds: &ThresholdConfig,
) -> Result<PipelineOutcome, RiskError> {
    // spec.md §4.3 bounds C3's history to the last N=20 transactions with no
    // date cutoff (the original's `.order_by(timestamp.desc()).limit(20)`
    // applies no date filter either) — a dormant account reactivating after
    // more than GRAPH_WINDOW_DAYS must still see its real history and not be
    // misclassified `is_new_account`. C4's graph/temporal window below is a
    // separate, intentionally bounded query.
    let context = EvaluationContext::load(
        store,
        tx,
        constants::HISTORY_WINDOW_SIZE,
        constants::DEFAULT_NEW_ACCOUNT_HISTORY_THRESHOLD,
        chrono::DateTime::<chrono::Utc>::MIN_UTC,
    )?;

    let graph_temporal = analyze_graph_temporal(
        store,
        &tx.sender_id,
        &tx.receiver_id,
        tx.amount,
        tx.timestamp,
        context.sender.history.len(),
    )?;

    let content = analyze_content(tx);

    let engine = engine::evaluate(
        store,
        tx,
        context.sender.is_new_account,
        &graph_temporal,
        &content,
        thresholds,
        tx.timestamp,
    )?;

    Ok(PipelineOutcome { graph_temporal, content, engine })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use riskguard_core::{AccountId, TransactionStatus};
    use riskguard_store::{InMemoryTransactionStore, TransactionStore as _};
    use serde_json::{json, Map};

    fn insert_tx(store: &InMemoryTransactionStore, sender: &str, receiver: &str, amount: f64) {
        let tx = Transaction::new(
            AccountId::new(sender),
            AccountId::new(receiver),
            amount,
            Utc::now(),
            Map::new(),
        )
        .unwrap();
        store.insert(&tx).unwrap();
    }

    #[test]
    fn clean_first_transaction_is_approved() {
        let store = InMemoryTransactionStore::new();
        let thresholds = ThresholdConfig::default();
        let tx = Transaction::new(
            AccountId::new("alice"),
            AccountId::new("bob"),
            50.0,
            Utc::now(),
            Map::new(),
        )
        .unwrap();

        let outcome = run_pipeline(&store, &tx, &thresholds).unwrap();
        assert_eq!(outcome.engine.decision, TransactionStatus::Approved);
    }

    #[test]
    fn phishing_url_is_blocked() {
        let store = InMemoryTransactionStore::new();
        let thresholds = ThresholdConfig::default();
        let mut metadata = Map::new();
        metadata.insert(
            "payment_url".to_string(),
            json!("http://legitbank-secure.fishy-domain.xyz/payment"),
        );
        let tx = Transaction::new(
            AccountId::new("alice"),
            AccountId::new("bob"),
            50.0,
            Utc::now(),
            metadata,
        )
        .unwrap();

        let outcome = run_pipeline(&store, &tx, &thresholds).unwrap();
        assert!(outcome.content.score >= 0.8);
        assert_eq!(outcome.engine.decision, TransactionStatus::Blocked);
        assert!(outcome.engine.risk_details.override_reason.is_some());
    }

    #[test]
    fn velocity_burst_raises_risk() {
        let store = InMemoryTransactionStore::new();
        let thresholds = ThresholdConfig::default();
        for _ in 0..8 {
            insert_tx(&store, "carol", "dave", 100.0);
        }
        let tx = Transaction::new(
            AccountId::new("carol"),
            AccountId::new("dave"),
            100.0,
            Utc::now(),
            Map::new(),
        )
        .unwrap();

        let outcome = run_pipeline(&store, &tx, &thresholds).unwrap();
        // 8 prior sends inside the last hour push hourly_count past the
        // cutoff of 5, so the temporal half must flag high_frequency_hour
        // and carry a nonzero velocity adjustment regardless of how the
        // graph half (same established counterparty) pulls the combine.
        let temporal_details = &outcome.graph_temporal.details["temporal"];
        assert_eq!(temporal_details["high_frequency_hour"], true);
        assert_eq!(temporal_details["hourly_count"].as_u64().unwrap(), 8);
        assert!(outcome.graph_temporal.score > 0.0);
    }

    #[test]
    fn qr_code_tampering_simulation_is_blocked() {
        let store = InMemoryTransactionStore::new();
        let thresholds = ThresholdConfig::default();
        let mut tx = Transaction::new(
            AccountId::new("erin"),
            AccountId::new("frank"),
            200.0,
            Utc::now(),
            Map::new(),
        )
        .unwrap();
        tx.is_simulated = true;
        tx.simulation_type = Some(riskguard_core::SimulationType::QrCodeTampering);

        let outcome = run_pipeline(&store, &tx, &thresholds).unwrap();
        assert_eq!(outcome.content.score, 0.92);
        assert_eq!(outcome.engine.decision, TransactionStatus::Blocked);
    }

    #[test]
    fn risk_score_and_subscores_stay_in_unit_range() {
        let store = InMemoryTransactionStore::new();
        let thresholds = ThresholdConfig::default();
        for (day, amount) in [400.0, 600.0, 450.0, 550.0, 500.0].into_iter().enumerate() {
            let tx = Transaction::new(
                AccountId::new("alice"),
                AccountId::new("bob"),
                amount,
                Utc::now() - chrono::Duration::days(5 - day as i64),
                Map::new(),
            )
            .unwrap();
            store.insert(&tx).unwrap();
        }
        let tx = Transaction::new(AccountId::new("alice"), AccountId::new("bob"), 60_000.0, Utc::now(), Map::new())
            .unwrap();

        let outcome = run_pipeline(&store, &tx, &thresholds).unwrap();
        for v in [outcome.graph_temporal.score, outcome.content.score, outcome.engine.risk_details.overall_score] {
            assert!((0.0..=1.0).contains(&v), "score out of range: {v}");
        }
        assert!((outcome.engine.risk_details.amount_factor - 0.2).abs() < 1e-6);
    }
}
