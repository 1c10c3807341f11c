use std::path::Path;

use chrono::{DateTime, Timelike, Utc};
use riskguard_core::{AccountId, RiskError, Transaction, TransactionId, TransactionStatus};
use tracing::info;

use crate::{FinalizeOutcome, HourlyBucket, TransactionStore, Velocity};

/// Production-adapter transaction store, backed by sled (pure-Rust embedded
/// DB, no C/LLVM toolchain dependency) — the same storage engine the
/// teacher uses for `chronx_state::db::StateDb`, generalized from an
/// account/vertex/timelock schema to a single `transactions` tree.
///
/// Design Notes §9 treats "a relational store" as an interchangeable
/// external collaborator behind this trait; sled stands in as the one
/// concrete, runnable adapter so the workspace is self-contained.
pub struct SledTransactionStore {
    _db: sled::Db,
    transactions: sled::Tree,
}

impl SledTransactionStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RiskError> {
        let db = sled::open(path).map_err(|e| RiskError::StoreTransient(e.to_string()))?;
        let transactions = db
            .open_tree("transactions")
            .map_err(|e| RiskError::StoreTransient(e.to_string()))?;
        info!("transaction store opened");
        Ok(Self { _db: db, transactions })
    }

    fn get_row(&self, id: TransactionId) -> Result<Option<Transaction>, RiskError> {
        match self
            .transactions
            .get(id.0.as_bytes())
            .map_err(|e| RiskError::StoreTransient(e.to_string()))?
        {
            Some(bytes) => {
                let tx: Transaction = bincode::deserialize(&bytes)
                    .map_err(|e| RiskError::StoreTransient(e.to_string()))?;
                Ok(Some(tx))
            }
            None => Ok(None),
        }
    }

    fn put_row(&self, tx: &Transaction) -> Result<(), RiskError> {
        let bytes = bincode::serialize(tx).map_err(|e| RiskError::StoreTransient(e.to_string()))?;
        self.transactions
            .insert(tx.id.0.as_bytes(), bytes)
            .map_err(|e| RiskError::StoreTransient(e.to_string()))?;
        Ok(())
    }

    /// Scan every row. Acceptable for the scale this workspace targets; a
    /// real deployment would add secondary indices (sender_id, receiver_id,
    /// timestamp) — left as a known limitation (see DESIGN.md).
    fn scan_all(&self) -> Result<Vec<Transaction>, RiskError> {
        self.transactions
            .iter()
            .values()
            .map(|r| {
                let bytes = r.map_err(|e| RiskError::StoreTransient(e.to_string()))?;
                bincode::deserialize(&bytes).map_err(|e| RiskError::StoreTransient(e.to_string()))
            })
            .collect()
    }
}

impl TransactionStore for SledTransactionStore {
    fn insert(&self, tx: &Transaction) -> Result<(), RiskError> {
        if self
            .transactions
            .contains_key(tx.id.0.as_bytes())
            .map_err(|e| RiskError::StoreTransient(e.to_string()))?
        {
            return Err(RiskError::DuplicateId(tx.id.to_string()));
        }
        self.put_row(tx)
    }

    fn finalize(&self, id: TransactionId, outcome: FinalizeOutcome) -> Result<(), RiskError> {
        // Conditional update: only succeeds while `processed == false`, the
        // single-writer-per-row discipline spec.md §5 requires.
        let mut tx = self.get_row(id)?.ok_or_else(|| RiskError::NotFound(id.to_string()))?;
        if tx.processed {
            return Err(RiskError::AlreadyProcessed(id.to_string()));
        }
        tx.risk_score = Some(outcome.risk_score);
        tx.graph_temporal_score = Some(outcome.graph_temporal_score);
        tx.content_analysis_score = Some(outcome.content_analysis_score);
        tx.status = outcome.status;
        tx.risk_details = Some(outcome.risk_details);
        tx.processed = true;
        self.put_row(&tx)
    }

    fn get(&self, id: TransactionId) -> Result<Transaction, RiskError> {
        self.get_row(id)?.ok_or_else(|| RiskError::NotFound(id.to_string()))
    }

    fn query_sender_history(
        &self,
        sender_id: &AccountId,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Transaction>, RiskError> {
        let mut out: Vec<Transaction> = self
            .scan_all()?
            .into_iter()
            .filter(|t| &t.sender_id == sender_id && t.timestamp >= since)
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
        let mut out: Vec<Transaction> = self
            .scan_all()?
            .into_iter()
            .filter(|t| &t.receiver_id == receiver_id && t.timestamp >= since)
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
        let mut out: Vec<Transaction> = self
            .scan_all()?
            .into_iter()
            .filter(|t| t.status == TransactionStatus::Blocked && t.timestamp >= since)
            .collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out.truncate(limit);
        Ok(out)
    }

    fn query_velocity(&self, user_id: &AccountId, since: DateTime<Utc>) -> Result<Velocity, RiskError> {
        let matching: Vec<Transaction> = self
            .scan_all()?
            .into_iter()
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
        // Bucketed per specific calendar hour (e.g. "2024-06-01T14"), not
        // per hour-of-day, matching riskguard-rules::recompute's velocity
        // grouping — a bucket keyed only by hour-of-day would sum every day
        // in the window into the same 24 buckets.
        let mut counts: std::collections::HashMap<String, (u32, usize)> = std::collections::HashMap::new();
        for t in self.scan_all()? {
            if &t.sender_id == user_id && t.timestamp >= since {
                let key = t.timestamp.format("%Y-%m-%dT%H").to_string();
                let entry = counts.entry(key).or_insert((t.timestamp.hour(), 0));
                entry.1 += 1;
            }
        }
        Ok(counts.into_values().map(|(hour, count)| HourlyBucket { hour, count }).collect())
    }

    fn query_recent(&self, limit: usize) -> Result<Vec<Transaction>, RiskError> {
        let mut out = self.scan_all()?;
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out.truncate(limit);
        Ok(out)
    }

    fn query_finalized_since(&self, since: DateTime<Utc>) -> Result<Vec<Transaction>, RiskError> {
        Ok(self
            .scan_all()?
            .into_iter()
            .filter(|t| t.processed && t.timestamp >= since)
            .collect())
    }
}
