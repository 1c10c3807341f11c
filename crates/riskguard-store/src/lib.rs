//! The transaction store (C1) — spec.md §4.1.
//!
//! Generalizes `chronx_state::db::StateDb` (a single sled-backed struct with
//! one method per concrete query) to an interface, `TransactionStore`, with
//! two variants per Design Notes §9's "Polymorphism requirement": a
//! production-grade sled adapter (`SledTransactionStore`) and a pure-Rust
//! in-memory test double (`InMemoryTransactionStore`). The rest of the
//! system — `riskguard-scoring`, `riskguard-node`, `riskguard-api` — programs
//! only to the trait.

pub mod memory;
pub mod sled_store;

use chrono::{DateTime, Utc};
use riskguard_core::{AccountId, RiskDetails, RiskError, Transaction, TransactionId, TransactionStatus};

pub use memory::InMemoryTransactionStore;
pub use sled_store::SledTransactionStore;

/// Aggregate velocity figures for one account over a window — spec.md §4.1
/// `QueryVelocity`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Velocity {
    pub count: usize,
    pub volume: f64,
}

/// One specific calendar hour's transaction count (e.g. "2024-06-01T14"),
/// not an hour-of-day aggregate — spec.md §4.1 `QueryHourlyBuckets`,
/// consumed by C6's per-sender `max_hourly_count` and by C8.
#[derive(Clone, Copy, Debug)]
pub struct HourlyBucket {
    pub hour: u32,
    pub count: usize,
}

/// Finalized result fields, set atomically together — spec.md §4.1 `Finalize`.
pub struct FinalizeOutcome {
    pub risk_score: f64,
    pub graph_temporal_score: f64,
    pub content_analysis_score: f64,
    pub status: TransactionStatus,
    pub risk_details: RiskDetails,
}

/// Program only to this trait — spec.md §9 "Polymorphism requirement".
///
/// Every method can fail with `RiskError::StoreTransient` (surfaced to the
/// worker as a nack-requeue signal) in a real deployment; the in-memory
/// adapter never fails this way since it has no I/O to fail.
pub trait TransactionStore: Send + Sync {
    /// Insert a freshly submitted, pending transaction. Fails with
    /// `DuplicateId` if the id already exists.
    fn insert(&self, tx: &Transaction) -> Result<(), RiskError>;

    /// Atomically set the terminal result fields and `processed = true`.
    /// Fails with `NotFound` or `AlreadyProcessed` — both are caller
    /// conditions, not storage faults (spec.md §4.1).
    fn finalize(&self, id: TransactionId, outcome: FinalizeOutcome) -> Result<(), RiskError>;

    fn get(&self, id: TransactionId) -> Result<Transaction, RiskError>;

    fn query_sender_history(
        &self,
        sender_id: &AccountId,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Transaction>, RiskError>;

    fn query_receiver_history(
        &self,
        receiver_id: &AccountId,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Transaction>, RiskError>;

    fn query_recent_blocked(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Transaction>, RiskError>;

    fn query_velocity(&self, user_id: &AccountId, since: DateTime<Utc>) -> Result<Velocity, RiskError>;

    fn query_hourly_buckets(
        &self,
        user_id: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<Vec<HourlyBucket>, RiskError>;

    /// Newest `limit` transactions regardless of account — `/api/recent-transactions`.
    fn query_recent(&self, limit: usize) -> Result<Vec<Transaction>, RiskError>;

    /// All finalized transactions with `timestamp >= since` — used by C8 and
    /// by `/api/system-stats`'s 24h aggregate.
    fn query_finalized_since(&self, since: DateTime<Utc>) -> Result<Vec<Transaction>, RiskError>;
}

#[cfg(test)]
mod contract_tests {
    //! Shared behavioral contract both adapters must satisfy — run against
    //! each concrete store so a regression in either implementation fails
    //! the same test, matching `chronx_dag::validation`'s habit of
    //! colocating invariant tests with the code they protect.
    use super::*;
    use chrono::Duration;
    use riskguard_core::Transaction;
    use serde_json::Map;

    fn make_tx(sender: &str, receiver: &str, amount: f64) -> Transaction {
        Transaction::new(
            AccountId::new(sender),
            AccountId::new(receiver),
            amount,
            Utc::now(),
            Map::new(),
        )
        .unwrap()
    }

    fn run_contract(store: &dyn TransactionStore) {
        let tx = make_tx("alice", "bob", 100.0);
        let id = tx.id;
        store.insert(&tx).unwrap();

        // Duplicate insert fails.
        assert!(matches!(store.insert(&tx), Err(RiskError::DuplicateId(_))));

        // Unprocessed row round-trips.
        let fetched = store.get(id).unwrap();
        assert!(!fetched.processed);
        assert_eq!(fetched.status, TransactionStatus::Pending);

        // Finalize sets all result fields atomically.
        let outcome = FinalizeOutcome {
            risk_score: 0.2,
            graph_temporal_score: 0.1,
            content_analysis_score: 0.3,
            status: TransactionStatus::Approved,
            risk_details: RiskDetails::default(),
        };
        store.finalize(id, outcome).unwrap();
        let finalized = store.get(id).unwrap();
        assert!(finalized.processed);
        assert_eq!(finalized.status, TransactionStatus::Approved);
        assert_eq!(finalized.risk_score, Some(0.2));

        // Re-finalizing is AlreadyProcessed, not fatal.
        let outcome2 = FinalizeOutcome {
            risk_score: 0.9,
            graph_temporal_score: 0.9,
            content_analysis_score: 0.9,
            status: TransactionStatus::Blocked,
            risk_details: RiskDetails::default(),
        };
        assert!(matches!(
            store.finalize(id, outcome2),
            Err(RiskError::AlreadyProcessed(_))
        ));
        // And the stored record did not change.
        let unchanged = store.get(id).unwrap();
        assert_eq!(unchanged.status, TransactionStatus::Approved);

        // History queries.
        let since = Utc::now() - Duration::days(30);
        let hist = store.query_sender_history(&AccountId::new("alice"), since, 20).unwrap();
        assert_eq!(hist.len(), 1);

        assert!(matches!(
            store.get(TransactionId::new()),
            Err(RiskError::NotFound(_))
        ));
    }

    #[test]
    fn in_memory_satisfies_contract() {
        run_contract(&InMemoryTransactionStore::new());
    }

    #[test]
    fn sled_satisfies_contract() {
        let dir = tempfile::tempdir().unwrap();
        run_contract(&SledTransactionStore::open(dir.path()).unwrap());
    }
}
