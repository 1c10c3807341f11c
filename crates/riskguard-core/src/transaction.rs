use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{AccountId, Amount, Timestamp, TransactionId};

/// Terminal (and pending) lifecycle states — spec.md §3.
///
/// `PendingVerification` is the single state backing both the
/// `pending_verification` and `review` aliases named in spec.md §9's open
/// question: the source material used the two names inconsistently, so this
/// workspace picks one representation and exposes the alias only as a
/// request-side convenience (see `riskguard-api`), never as a second stored
/// variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Approved,
    PendingVerification,
    Blocked,
}

impl TransactionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

/// Deterministic-outcome simulation hooks — spec.md §4.5/§4.6/§9.
///
/// Simulation flags live on the data model, not a side channel, and are
/// honored only inside the content analyzer and risk engine override list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationType {
    HighValue,
    PhishingUrl,
    QrCodeTampering,
    NetworkFraud,
}

impl SimulationType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high_value" => Some(Self::HighValue),
            "phishing_url" => Some(Self::PhishingUrl),
            "qr_code_tampering" => Some(Self::QrCodeTampering),
            "network_fraud" => Some(Self::NetworkFraud),
            _ => None,
        }
    }
}

/// The structured risk breakdown persisted verbatim alongside the score —
/// spec.md §4.6 "Risk-details payload".
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RiskDetails {
    pub overall_score: f64,
    pub decision: String,
    pub graph_temporal_weight: f64,
    pub content_analysis_weight: f64,
    pub graph_temporal_details: Value,
    pub content_analysis_details: Value,
    pub amount_factor: f64,
    pub dynamic_adjustments: Value,
    pub override_reason: Option<String>,
    pub explanation: String,
}

/// A submitted payment intent and, once processed, its evaluation outcome.
///
/// Owned exclusively by the transaction store (C1). Mutated exactly once,
/// by a worker, on completion — see invariants I1–I4 in spec.md §3.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    pub amount: Amount,
    pub timestamp: Timestamp,
    pub txn_metadata: Map<String, Value>,

    pub status: TransactionStatus,
    pub processed: bool,

    pub risk_score: Option<f64>,
    pub graph_temporal_score: Option<f64>,
    pub content_analysis_score: Option<f64>,
    pub risk_details: Option<RiskDetails>,

    pub is_simulated: bool,
    pub simulation_type: Option<SimulationType>,
}

impl Transaction {
    /// Construct a fresh, unprocessed transaction. Fails if `amount` is
    /// negative — the one validation invariant the store itself enforces
    /// (everything else is an ingress-side `ValidationError`, spec.md §7).
    pub fn new(
        sender_id: AccountId,
        receiver_id: AccountId,
        amount: Amount,
        timestamp: Timestamp,
        txn_metadata: Map<String, Value>,
    ) -> Result<Self, crate::error::RiskError> {
        if amount < 0.0 || !amount.is_finite() {
            return Err(crate::error::RiskError::Validation(
                "amount must be a non-negative finite number".into(),
            ));
        }
        Ok(Self {
            id: TransactionId::new(),
            sender_id,
            receiver_id,
            amount,
            timestamp,
            txn_metadata,
            status: TransactionStatus::Pending,
            processed: false,
            risk_score: None,
            graph_temporal_score: None,
            content_analysis_score: None,
            risk_details: None,
            is_simulated: false,
            simulation_type: None,
        })
    }

    /// `payment_url` metadata key, if present — spec.md §6 recognized keys.
    pub fn payment_url(&self) -> Option<&str> {
        self.txn_metadata.get("payment_url").and_then(Value::as_str)
    }

    /// `qr_code_payload` metadata key, if present.
    pub fn qr_code_payload(&self) -> Option<&Map<String, Value>> {
        self.txn_metadata.get("qr_code_payload").and_then(Value::as_object)
    }
}
