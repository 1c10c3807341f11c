//! Input Processor (C3) — spec.md §4.3.
//!
//! No teacher analogue: `chronx-state` never aggregates read-side history
//! for a decision, it only applies writes. This module is new, kept
//! deliberately thin (a plain record, no side effects) in the same spirit
//! as the teacher's small, single-purpose modules (e.g. `chronx_dag::vertex`).

use std::collections::HashSet;

use riskguard_core::{AccountId, Amount, Transaction};
use riskguard_store::TransactionStore;

/// Per-account history summary, computed fresh for each job.
#[derive(Clone, Debug, Default)]
pub struct AccountProfile {
    pub history: Vec<Transaction>,
    pub is_new_account: bool,
    pub avg_amount: Amount,
    pub max_amount: Amount,
    pub recent_receivers: HashSet<AccountId>,
}

/// Everything C4/C5/C6 need about the two parties to one transaction —
/// spec.md §4.3 `EvaluationContext`.
#[derive(Clone, Debug, Default)]
pub struct EvaluationContext {
    pub sender: AccountProfile,
    pub receiver: AccountProfile,
}

impl EvaluationContext {
    /// Load sender/receiver history windows and derive the profile fields —
    /// spec.md §4.3: last N=20 transactions each side, `is_new_account` when
    /// fewer than the configured new-account threshold.
    pub fn load(
        store: &dyn TransactionStore,
        tx: &Transaction,
        history_window_size: usize,
        new_account_threshold: usize,
        since: chrono::DateTime<chrono::Utc>,
    ) -> Result<Self, riskguard_core::RiskError> {
        let sender_history =
            store.query_sender_history(&tx.sender_id, since, history_window_size)?;
        let receiver_history =
            store.query_receiver_history(&tx.receiver_id, since, history_window_size)?;

        let sender = build_profile(sender_history, new_account_threshold);
        let receiver = build_profile(receiver_history, new_account_threshold);

        Ok(Self { sender, receiver })
    }
}

fn build_profile(history: Vec<Transaction>, new_account_threshold: usize) -> AccountProfile {
    let is_new_account = history.len() < new_account_threshold;
    let (sum, max) = history
        .iter()
        .fold((0.0, 0.0), |(sum, max), t| (sum + t.amount, f64::max(max, t.amount)));
    let avg_amount = if history.is_empty() { 0.0 } else { sum / history.len() as f64 };
    let recent_receivers = history.iter().map(|t| t.receiver_id.clone()).collect();

    AccountProfile {
        history,
        is_new_account,
        avg_amount,
        max_amount: max,
        recent_receivers,
    }
}
