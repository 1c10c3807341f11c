//! Request/response shapes — spec.md §6 "bit-exact field names".

use riskguard_core::{Amount, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Deserialize)]
pub struct SubmitTransactionRequest {
    pub sender_id: String,
    pub receiver_id: String,
    pub amount: Amount,
    pub timestamp: Option<Timestamp>,
    #[serde(default)]
    pub txn_metadata: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct SimulateFraudRequest {
    pub fraud_type: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub amount: Amount,
}

#[derive(Serialize)]
pub struct SubmitTransactionResponse {
    pub transaction_id: String,
    pub status: &'static str,
    pub message: String,
}

#[derive(Serialize)]
pub struct RiskDetailsResponse {
    pub transaction_id: String,
    pub risk_score: Option<f64>,
    pub status: String,
    pub risk_details: Option<riskguard_core::RiskDetails>,
    pub graph_temporal_score: Option<f64>,
    pub content_analysis_score: Option<f64>,
    pub explanation: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Serialize)]
pub struct SystemStatsResponse {
    pub window_hours: u32,
    pub total_transactions: usize,
    pub blocked: usize,
    pub pending_verification: usize,
    pub approved: usize,
    pub fraud_rate_pct: f64,
    pub total_volume: f64,
    pub thresholds: riskguard_core::ThresholdConfig,
}
