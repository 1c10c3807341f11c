use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Percentile/mean/p95/p99 summary of a numeric distribution — spec.md §3
/// `ThresholdConfig`'s `amount.{mean,median,p95,p99}` and
/// `velocity.{hourly,daily}.{mean,p95,p99}` groups.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DistributionStats {
    pub mean: f64,
    pub median: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Default for DistributionStats {
    fn default() -> Self {
        Self { mean: 0.0, median: 0.0, p95: 0.0, p99: 0.0 }
    }
}

/// Velocity percentiles, keyed separately for hourly and daily windows.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct VelocityStats {
    pub mean: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Network-topology percentiles — spec.md §3 `network.connections.{mean,p95}`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct NetworkStats {
    pub mean_connections: f64,
    pub p95_connections: f64,
}

/// The process-wide, immutable configuration snapshot consumed by C4/C5/C6
/// and rewritten wholesale by C8 — spec.md §3 `ThresholdConfig`.
///
/// Readers take an `Arc` to one snapshot per job (see
/// `riskguard-rules::snapshot::ThresholdHandle`); a snapshot is never
/// mutated in place after publish.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub amount: DistributionStats,
    pub velocity_hourly: VelocityStats,
    pub velocity_daily: VelocityStats,
    pub network: NetworkStats,
    pub top_fraud_domains: Vec<String>,
    pub top_fraud_receivers: Vec<String>,

    pub graph_temporal_weight: f64,
    pub content_analysis_weight: f64,

    pub low_risk_threshold: f64,
    pub medium_risk_threshold: f64,
    pub high_risk_threshold: f64,

    /// When this snapshot was computed. `None` for the bootstrap default.
    pub computed_at: Option<crate::types::Timestamp>,
    /// Number of finalized transactions the snapshot was computed from.
    pub sample_size: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            amount: DistributionStats::default(),
            velocity_hourly: VelocityStats::default(),
            velocity_daily: VelocityStats::default(),
            network: NetworkStats::default(),
            top_fraud_domains: Vec::new(),
            top_fraud_receivers: Vec::new(),
            graph_temporal_weight: DEFAULT_GRAPH_TEMPORAL_WEIGHT,
            content_analysis_weight: DEFAULT_CONTENT_ANALYSIS_WEIGHT,
            low_risk_threshold: DEFAULT_LOW_RISK_THRESHOLD,
            medium_risk_threshold: DEFAULT_MEDIUM_RISK_THRESHOLD,
            high_risk_threshold: DEFAULT_HIGH_RISK_THRESHOLD,
            computed_at: None,
            sample_size: 0,
        }
    }
}
