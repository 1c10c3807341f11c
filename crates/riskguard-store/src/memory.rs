use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Timelike, Utc};
use riskguard_core::{AccountId, RiskError, Transaction, TransactionId, TransactionStatus};

use crate::{FinalizeOutcome, HourlyBucket, TransactionStore, Velocity};

/// Pure in-memory test double — spec.md §9 Design Notes: "do not retain the
/// original ad-hoc process-local map" as a production path, but it remains
/// the right shape for unit/integration tests that must not depend on an
/// external database.
#[derive(Default)]
pub struct InMemoryTransactionStore {
    rows: RwLock<HashMap<TransactionId, Transaction>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionStore for InMemoryTransactionStore {
    fn insert(&self, tx: &Transaction) -> Result<(), RiskError> {
        let mut rows = self.rows.write().unwrap();
        if rows.contains_key(&tx.id) {
            return Err(RiskError::DuplicateId(tx.id.to_string()));
        }
        rows.insert(tx.id, tx.clone());
        Ok(())
    }

    fn finalize(&self, id: TransactionId, outcome: FinalizeOutcome) -> Result<(), RiskError> {
        let mut rows = self.rows.write().unwrap();
        let tx = rows.get_mut(&id).ok_or_else(|| RiskError::NotFound(id.to_string()))?;
        if tx.processed {
            return Err(RiskError::AlreadyProcessed(id.to_string()));
        }
        tx.risk_score = Some(outcome.risk_score);
        tx.graph_temporal_score = Some(outcome.graph_temporal_score);
        tx.content_analysis_score = Some(outcome.content_analysis_score);
        tx.status = outcome.status;
        tx.risk_details = Some(outcome.risk_details);
        tx.processed = true;
        Ok(())
    }

    fn get(&self, id: TransactionId) -> Result<Transaction, RiskError> {
        self.rows
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| RiskError::NotFound(id.to_string()))
    }

    fn query_sender_history(
        &self,
        sender_id: &AccountId,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Transaction>, RiskError> {
        let rows = self.rows.read().unwrap();
        let mut out: Vec<Transaction> = rows
            .values()
            .filter(|t| &t.sender_id == sender_id && t.timestamp >= since)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out.truncate(limit);
        Ok(out)
    }

    fn query_receiver_history(
        &self,
        receiver_id: &AccountId,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Transaction>, RiskError> {
        let rows = self.rows.read().unwrap();
        let mut out: Vec<Transaction> = rows
            .values()
            .filter(|t| &t.receiver_id == receiver_id && t.timestamp >= since)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out.truncate(limit);
        Ok(out)
    }

    fn query_recent_blocked(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Transaction>, RiskError> {
        let rows = self.rows.read().unwrap();
        let mut out: Vec<Transaction> = rows
            .values()
            .filter(|t| t.status == TransactionStatus::Blocked && t.timestamp >= since)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out.truncate(limit);
        Ok(out)
    }

    fn query_velocity(&self, user_id: &AccountId, since: DateTime<Utc>) -> Result<Velocity, RiskError> {
        let rows = self.rows.read().unwrap();
        let matching: Vec<&Transaction> = rows
            .values()
            .filter(|t| &t.sender_id == user_id && t.timestamp >= since)
            .collect();
        Ok(Velocity {
            count: matching.len(),
            volume: matching.iter().map(|t| t.amount).sum(),
        })
    }

    fn query_hourly_buckets(
        &self,
        user_id: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<Vec<HourlyBucket>, RiskError> {
        let rows = self.rows.read().unwrap();
        // Bucketed per specific calendar hour (e.g. "2024-06-01T14"), not
        // per hour-of-day, matching riskguard-rules::recompute's velocity
        // grouping — a bucket keyed only by hour-of-day would sum every day
        // in the window into the same 24 buckets.
        let mut counts: HashMap<String, (u32, usize)> = HashMap::new();
        for t in rows.values() {
            if &t.sender_id == user_id && t.timestamp >= since {
                let key = t.timestamp.format("%Y-%m-%dT%H").to_string();
                let entry = counts.entry(key).or_insert((t.timestamp.hour(), 0));
                entry.1 += 1;
            }
        }
        Ok(counts.into_values().map(|(hour, count)| HourlyBucket { hour, count }).collect())
    }

    fn query_recent(&self, limit: usize) -> Result<Vec<Transaction>, RiskError> {
        let rows = self.rows.read().unwrap();
        let mut out: Vec<Transaction> = rows.values().cloned().collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out.truncate(limit);
        Ok(out)
    }

    fn query_finalized_since(&self, since: DateTime<Utc>) -> Result<Vec<Transaction>, RiskError> {
        let rows = self.rows.read().unwrap();
        Ok(rows
            .values()
            .filter(|t| t.processed && t.timestamp >= since)
            .cloned()
            .collect())
    }
}
