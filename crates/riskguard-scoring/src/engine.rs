//! Risk Engine (C6) — spec.md §4.6.
//!
//! Grounded on `chronx_consensus::validator`/`finality` (multiple signals
//! folded into one pass/fail decision) and `chronx_state::engine::apply`'s
//! staged-mutation-then-commit shape, generalized from a binary
//! valid/invalid gate to a weighted, adjustable score with overrides.

use chrono::{DateTime, Utc};
use riskguard_core::stats::percentile;
use riskguard_core::{
    constants, Amount, RiskDetails, RiskError, SimulationType, ThresholdConfig, Transaction,
    TransactionStatus,
};
use riskguard_store::TransactionStore;
use serde_json::json;

use crate::content::ContentResult;
use crate::graph_temporal::GraphTemporalResult;
use crate::similarity::similarity_ratio;

pub struct EngineResult {
    pub risk_score: f64,
    pub decision: TransactionStatus,
    pub risk_details: RiskDetails,
}

/// Per-sender amount p95 and max observed hourly count over 90 days —
/// resolved as an Open Question in SPEC_FULL.md §9: computed live, not
/// read from the shared `ThresholdConfig` aggregate.
fn sender_stats(
    store: &dyn TransactionStore,
    sender_id: &riskguard_core::AccountId,
    now: DateTime<Utc>,
) -> Result<(f64, usize), RiskError> {
    let since = now - chrono::Duration::days(90);
    let history = store.query_sender_history(sender_id, since, usize::MAX)?;
    let mut amounts: Vec<f64> = history.iter().map(|t| t.amount).collect();
    amounts.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let p95 = percentile(&amounts, 0.95);

    let buckets = store.query_hourly_buckets(sender_id, since)?;
    let max_hourly_count = buckets.iter().map(|b| b.count).max().unwrap_or(0);

    Ok((p95, max_hourly_count))
}

/// spec.md §4.6 trending-fraud contribution, scanning the last 7 days of
/// blocked transactions (cap 200).
fn trending_fraud_adjustment(
    store: &dyn TransactionStore,
    tx: &Transaction,
    now: DateTime<Utc>,
) -> Result<(f64, bool, Option<String>), RiskError> {
    let since = now - chrono::Duration::days(constants::TRENDING_FRAUD_WINDOW_DAYS);
    let blocked = store.query_recent_blocked(since, constants::TRENDING_FRAUD_SCAN_CAP)?;

    let mut contribution = 0.0f64;
    let receiver_seen = blocked.iter().any(|t| t.receiver_id == tx.receiver_id);
    if receiver_seen {
        contribution += 0.4;
    }

    let mut matched_url: Option<String> = None;
    if let Some(current_url) = tx.payment_url() {
        for blocked_tx in &blocked {
            if let Some(blocked_url) = blocked_tx.payment_url() {
                if similarity_ratio(current_url, blocked_url) > 0.7 {
                    contribution += 0.3;
                    matched_url = Some(blocked_url.to_string());
                    break;
                }
            }
        }
    }

    let capped = contribution.min(constants::TRENDING_FRAUD_CAP);
    Ok((capped, receiver_seen, matched_url))
}

/// spec.md §4.6: combine sub-scores, apply dynamic adjustments and
/// amount escalation, map to a decision, then apply overrides.
pub fn evaluate(
    store: &dyn TransactionStore,
    tx: &Transaction,
    is_new_account: bool,
    graph_temporal: &GraphTemporalResult,
    content: &ContentResult,
    thresholds: &ThresholdConfig,
    now: DateTime<Utc>,
) -> Result<EngineResult, RiskError> {
    let (w_gt, w_c) = if is_new_account {
        (0.4, 0.6)
    } else {
        (thresholds.graph_temporal_weight, thresholds.content_analysis_weight)
    };

    let base = w_gt * graph_temporal.score + w_c * content.score;

    let (p95, max_hourly_count) = sender_stats(store, &tx.sender_id, now)?;

    let mut amount_adjustment = 0.0f64;
    if p95 > 0.0 && tx.amount > p95 {
        amount_adjustment = ((tx.amount - p95) / p95).min(1.0) * 0.3;
    }

    let mut velocity_adjustment = 0.0f64;
    if graph_temporal.hourly_count > max_hourly_count {
        velocity_adjustment =
            ((graph_temporal.hourly_count - max_hourly_count) as f64 / 5.0).min(1.0) * 0.2;
    }

    let (trending_adjustment, trending_receiver_hit, trending_url_match) =
        trending_fraud_adjustment(store, tx, now)?;

    let dynamic_total = amount_adjustment + velocity_adjustment + trending_adjustment;

    let amount_factor = if tx.amount > 10_000.0 {
        ((tx.amount - 10_000.0) / 50_000.0).min(0.2)
    } else {
        0.0
    };

    let risk_score = (base + dynamic_total + amount_factor).clamp(0.0, 1.0);

    let mut decision = if risk_score < thresholds.low_risk_threshold {
        TransactionStatus::Approved
    } else if risk_score < thresholds.high_risk_threshold {
        TransactionStatus::PendingVerification
    } else {
        TransactionStatus::Blocked
    };

    let mut override_reason: Option<String> = None;

    if content.score > 0.8 {
        decision = TransactionStatus::Blocked;
        override_reason = Some("high-confidence phishing or QR tampering".to_string());
    }

    if tx.is_simulated {
        match tx.simulation_type {
            Some(SimulationType::PhishingUrl)
            | Some(SimulationType::QrCodeTampering)
            | Some(SimulationType::NetworkFraud) => {
                decision = TransactionStatus::Blocked;
                override_reason = Some(format!(
                    "simulated fraud: {}",
                    tx.simulation_type.map(simulation_label).unwrap_or("unknown")
                ));
            }
            Some(SimulationType::HighValue) => {
                decision = TransactionStatus::PendingVerification;
                override_reason = Some("simulated fraud: high_value".to_string());
            }
            None => {}
        }
    }

    let dynamic_adjustments = json!({
        "amount_beyond_p95": amount_adjustment,
        "velocity_factor": velocity_adjustment,
        "trending_fraud": trending_adjustment,
        "trending_receiver_hit": trending_receiver_hit,
        "trending_url_match": trending_url_match,
        "sender_amount_p95": p95,
        "sender_max_hourly_count": max_hourly_count,
    });

    let explanation = build_explanation(
        risk_score,
        &decision,
        graph_temporal.score,
        content.score,
        amount_factor,
        &override_reason,
    );

    let risk_details = RiskDetails {
        overall_score: risk_score,
        decision: decision_label(&decision).to_string(),
        graph_temporal_weight: w_gt,
        content_analysis_weight: w_c,
        graph_temporal_details: graph_temporal.details.clone(),
        content_analysis_details: content.details.clone(),
        amount_factor,
        dynamic_adjustments,
        override_reason: override_reason.clone(),
        explanation,
    };

    Ok(EngineResult { risk_score, decision, risk_details })
}

fn simulation_label(s: SimulationType) -> &'static str {
    match s {
        SimulationType::HighValue => "high_value",
        SimulationType::PhishingUrl => "phishing_url",
        SimulationType::QrCodeTampering => "qr_code_tampering",
        SimulationType::NetworkFraud => "network_fraud",
    }
}

fn decision_label(status: &TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Pending => "pending",
        TransactionStatus::Approved => "approved",
        TransactionStatus::PendingVerification => "pending_verification",
        TransactionStatus::Blocked => "blocked",
    }
}

fn build_explanation(
    risk_score: f64,
    decision: &TransactionStatus,
    graph_temporal_score: f64,
    content_score: f64,
    amount_factor: Amount,
    override_reason: &Option<String>,
) -> String {
    let mut parts = vec![format!(
        "overall risk {:.2} ({}), graph-temporal {:.2}, content {:.2}",
        risk_score,
        decision_label(decision),
        graph_temporal_score,
        content_score
    )];
    if amount_factor > 0.0 {
        parts.push(format!("amount escalation +{:.2}", amount_factor));
    }
    if let Some(reason) = override_reason {
        parts.push(format!("override: {reason}"));
    }
    parts.join("; ")
}
