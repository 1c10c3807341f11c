//! Temporal half of the Graph-Temporal Analyzer (C4) — spec.md §4.4.

use chrono::{DateTime, Timelike, Utc};
use riskguard_core::stats::{mean, stdev};
use riskguard_core::{AccountId, Amount, Transaction};
use riskguard_store::TransactionStore;
use serde_json::json;

/// Result of the temporal sub-analysis, folded into C4's combined score.
pub struct TemporalResult {
    pub score: f64,
    pub details: serde_json::Value,
}

/// spec.md §4.4 steps 1–8 (temporal portion only).
pub fn analyze_temporal(
    store: &dyn TransactionStore,
    sender_id: &AccountId,
    receiver_id: &AccountId,
    amount: Amount,
    timestamp: DateTime<Utc>,
    window_start: DateTime<Utc>,
) -> Result<TemporalResult, riskguard_core::RiskError> {
    let history = store.query_sender_history(sender_id, window_start, usize::MAX)?;

    if history.is_empty() {
        return Ok(TemporalResult {
            score: 0.5,
            details: json!({ "reason": "no history" }),
        });
    }

    let mut adjustments = 0.0f64;

    // ── Velocity ─────────────────────────────────────────────────────────
    let velocity_1h = store.query_velocity(sender_id, timestamp - chrono::Duration::hours(1))?;
    let velocity_24h = store.query_velocity(sender_id, timestamp - chrono::Duration::hours(24))?;
    let h = velocity_1h.count;
    let d = velocity_24h.count;

    let mut high_frequency_hour = false;
    if h > 5 {
        adjustments += (0.1 * (h as f64 - 5.0)).min(0.5);
        high_frequency_hour = true;
    }
    if d > 20 {
        adjustments += (0.05 * (d as f64 - 20.0)).min(0.4);
    }

    // ── New recipient ────────────────────────────────────────────────────
    let seen_before = history.iter().any(|t| &t.receiver_id == receiver_id);
    if !seen_before {
        adjustments += (0.3 - 0.01 * (history.len().min(20) as f64)).max(0.0);
    }

    // ── Amount anomaly ───────────────────────────────────────────────────
    let amounts: Vec<f64> = history.iter().map(|t| t.amount).collect();
    let amount_mean = mean(&amounts);
    let amount_sigma = stdev(&amounts, amount_mean).max(0.01);
    let z = (amount - amount_mean) / amount_sigma;
    let amount_anomaly = (z.abs() / 3.0).clamp(0.0, 1.0);

    // ── Frequency anomaly ────────────────────────────────────────────────
    // Needs at least two prior timestamps to form an inter-arrival gap;
    // with a single data point, leave this at 0.0 rather than let an empty
    // mean/floor-sigma pair saturate the z-score.
    let mut timestamps: Vec<DateTime<Utc>> = history.iter().map(|t| t.timestamp).collect();
    timestamps.sort();
    let frequency_anomaly = if timestamps.len() > 1 {
        let inter_arrival_hours: Vec<f64> = timestamps
            .windows(2)
            .map(|w| (w[1] - w[0]).num_seconds() as f64 / 3600.0)
            .collect();
        let freq_mean = mean(&inter_arrival_hours);
        let freq_sigma = stdev(&inter_arrival_hours, freq_mean).max(0.01);
        let last = *timestamps.last().unwrap();
        let current_gap_hours = (timestamp - last).num_seconds() as f64 / 3600.0;
        let z_t = (current_gap_hours - freq_mean).abs() / freq_sigma;
        (z_t / 3.0).clamp(0.0, 1.0)
    } else {
        0.0
    };

    // ── Time window ──────────────────────────────────────────────────────
    let hour = timestamp.hour();
    let time_window_anomaly = if hour < 6 || hour > 22 { 0.7 } else { 0.0 };

    let base = 0.6 * amount_anomaly + 0.3 * frequency_anomaly + 0.1 * time_window_anomaly;
    let score = (base + adjustments).clamp(0.0, 1.0);

    Ok(TemporalResult {
        score,
        details: json!({
            "amount_anomaly": amount_anomaly,
            "frequency_anomaly": frequency_anomaly,
            "time_window_anomaly": time_window_anomaly,
            "hourly_count": h,
            "daily_count": d,
            "high_frequency_hour": high_frequency_hour,
            "new_recipient": !seen_before,
            "history_size": history.len(),
        }),
    })
}
