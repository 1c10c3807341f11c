use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use riskguard_core::{AccountId, RiskError, SimulationType, Transaction, TransactionId, TransactionStatus};

use crate::dto::{
    RiskDetailsResponse, SimulateFraudRequest, SubmitTransactionRequest, SubmitTransactionResponse,
    SystemStatsResponse,
};
use crate::error::ApiError;
use crate::AppState;

async fn enqueue(state: &AppState, tx: &Transaction) -> Result<(), ApiError> {
    state.store.insert(tx)?;
    state.broker.publish(tx.id).await?;
    Ok(())
}

fn accepted(tx: &Transaction) -> SubmitTransactionResponse {
    SubmitTransactionResponse {
        transaction_id: tx.id.to_string(),
        status: "pending",
        message: "transaction accepted for evaluation".to_string(),
    }
}

/// `POST /api/transaction` — spec.md §6.
pub async fn submit_transaction(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitTransactionRequest>,
) -> Result<Response, ApiError> {
    let timestamp = req.timestamp.unwrap_or_else(Utc::now);
    let tx = Transaction::new(
        AccountId::new(req.sender_id),
        AccountId::new(req.receiver_id),
        req.amount,
        timestamp,
        req.txn_metadata,
    )?;

    enqueue(&state, &tx).await?;
    Ok((StatusCode::ACCEPTED, Json(accepted(&tx))).into_response())
}

/// `POST /api/simulate-fraud` — spec.md §6, populates deterministic
/// `txn_metadata` per fraud type.
pub async fn simulate_fraud(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SimulateFraudRequest>,
) -> Result<Response, ApiError> {
    let simulation_type = SimulationType::parse(&req.fraud_type)
        .ok_or_else(|| RiskError::Validation(format!("unknown fraud_type: {}", req.fraud_type)))?;

    let mut metadata = serde_json::Map::new();
    let amount = match simulation_type {
        SimulationType::HighValue => req.amount * 100.0,
        SimulationType::PhishingUrl => {
            metadata.insert(
                "payment_url".to_string(),
                serde_json::json!("http://secure-verify-authenticate.fraud-sim.tk/payment"),
            );
            req.amount
        }
        SimulationType::QrCodeTampering => {
            metadata.insert(
                "qr_code_payload".to_string(),
                serde_json::json!({ "tampering_confidence": 0.92 }),
            );
            req.amount
        }
        SimulationType::NetworkFraud => {
            metadata.insert(
                "transaction_metadata".to_string(),
                serde_json::json!({ "high_velocity": true, "new_beneficiary": true }),
            );
            req.amount
        }
    };

    let mut tx = Transaction::new(
        AccountId::new(req.sender_id),
        AccountId::new(req.receiver_id),
        amount,
        Utc::now(),
        metadata,
    )?;
    tx.is_simulated = true;
    tx.simulation_type = Some(simulation_type);

    enqueue(&state, &tx).await?;
    Ok((StatusCode::ACCEPTED, Json(accepted(&tx))).into_response())
}

/// `GET /api/transaction/{id}` — 200 processed, 202 pending, 404 unknown.
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = TransactionId::parse(&id).map_err(|_| RiskError::NotFound(id.clone()))?;
    let tx = state.store.get(id)?;
    let status = if tx.processed { StatusCode::OK } else { StatusCode::ACCEPTED };
    Ok((status, Json(tx)).into_response())
}

/// `GET /api/risk-details/{id}` — spec.md §6.
pub async fn get_risk_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let parsed = TransactionId::parse(&id).map_err(|_| RiskError::NotFound(id.clone()))?;
    let tx = state.store.get(parsed)?;

    let body = RiskDetailsResponse {
        transaction_id: tx.id.to_string(),
        risk_score: tx.risk_score,
        status: status_label(&tx.status).to_string(),
        risk_details: tx.risk_details.clone(),
        graph_temporal_score: tx.graph_temporal_score,
        content_analysis_score: tx.content_analysis_score,
        explanation: tx.risk_details.as_ref().map(|d| d.explanation.clone()),
    };

    let status = if tx.processed { StatusCode::OK } else { StatusCode::ACCEPTED };
    Ok((status, Json(body)).into_response())
}

#[derive(serde::Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// `GET /api/recent-transactions?limit=N` — default 10.
pub async fn recent_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let limit = query.limit.unwrap_or(10);
    let recent = state.store.query_recent(limit)?;
    Ok(Json(recent))
}

/// `GET /api/system-stats` — 24h aggregate plus the live threshold snapshot.
pub async fn system_stats(State(state): State<Arc<AppState>>) -> Result<Json<SystemStatsResponse>, ApiError> {
    let since = Utc::now() - chrono::Duration::hours(24);
    let finalized = state.store.query_finalized_since(since)?;

    let total_transactions = finalized.len();
    let blocked = finalized.iter().filter(|t| t.status == TransactionStatus::Blocked).count();
    let pending_verification =
        finalized.iter().filter(|t| t.status == TransactionStatus::PendingVerification).count();
    let approved = finalized.iter().filter(|t| t.status == TransactionStatus::Approved).count();
    let total_volume: f64 = finalized.iter().map(|t| t.amount).sum();
    let fraud_rate_pct = if total_transactions == 0 {
        0.0
    } else {
        100.0 * blocked as f64 / total_transactions as f64
    };

    Ok(Json(SystemStatsResponse {
        window_hours: 24,
        total_transactions,
        blocked,
        pending_verification,
        approved,
        fraud_rate_pct,
        total_volume,
        thresholds: (*state.thresholds.snapshot()).clone(),
    }))
}

fn status_label(status: &TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Pending => "pending",
        TransactionStatus::Approved => "approved",
        TransactionStatus::PendingVerification => "pending_verification",
        TransactionStatus::Blocked => "blocked",
    }
}
