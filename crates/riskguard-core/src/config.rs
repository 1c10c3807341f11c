use crate::constants::*;

/// Process-wide startup configuration, read once from the environment —
/// spec.md §6 "Environment". Generalizes the teacher's `chronx-node::Args`
/// (clap-parsed CLI flags) to environment variables because this service's
/// deployment surface (broker creds, DB URL) is conventionally env-driven;
/// `riskguard-node`'s CLI flags layer on top and override these.
#[derive(Clone, Debug)]
pub struct RiskGuardConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub broker_user: String,
    pub broker_pass: String,
    pub broker_vhost: String,
    pub queue_name: String,

    pub database_url: String,

    pub graph_temporal_weight: f64,
    pub content_analysis_weight: f64,

    pub low_risk_threshold: f64,
    pub medium_risk_threshold: f64,
    pub high_risk_threshold: f64,

    pub new_account_history_threshold: usize,

    pub threshold_snapshot_path: String,
    pub worker_count: usize,
}

impl Default for RiskGuardConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".into(),
            broker_port: 5672,
            broker_user: "guest".into(),
            broker_pass: "guest".into(),
            broker_vhost: "/".into(),
            queue_name: "riskguard.transactions".into(),
            database_url: "riskguard.db".into(),
            graph_temporal_weight: DEFAULT_GRAPH_TEMPORAL_WEIGHT,
            content_analysis_weight: DEFAULT_CONTENT_ANALYSIS_WEIGHT,
            low_risk_threshold: DEFAULT_LOW_RISK_THRESHOLD,
            medium_risk_threshold: DEFAULT_MEDIUM_RISK_THRESHOLD,
            high_risk_threshold: DEFAULT_HIGH_RISK_THRESHOLD,
            new_account_history_threshold: DEFAULT_NEW_ACCOUNT_HISTORY_THRESHOLD,
            threshold_snapshot_path: "./data/threshold_snapshot.json".into(),
            worker_count: 4,
        }
    }
}

impl RiskGuardConfig {
    /// Load from the environment, falling back to `Default` for anything unset.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            broker_host: env_or("BROKER_HOST", d.broker_host),
            broker_port: env_parse_or("BROKER_PORT", d.broker_port),
            broker_user: env_or("BROKER_USER", d.broker_user),
            broker_pass: env_or("BROKER_PASS", d.broker_pass),
            broker_vhost: env_or("BROKER_VHOST", d.broker_vhost),
            queue_name: env_or("QUEUE_NAME", d.queue_name),
            database_url: env_or("DATABASE_URL", d.database_url),
            graph_temporal_weight: env_parse_or("GRAPH_TEMPORAL_WEIGHT", d.graph_temporal_weight),
            content_analysis_weight: env_parse_or(
                "CONTENT_ANALYSIS_WEIGHT",
                d.content_analysis_weight,
            ),
            low_risk_threshold: env_parse_or("LOW_RISK_THRESHOLD", d.low_risk_threshold),
            medium_risk_threshold: env_parse_or(
                "MEDIUM_RISK_THRESHOLD",
                d.medium_risk_threshold,
            ),
            high_risk_threshold: env_parse_or("HIGH_RISK_THRESHOLD", d.high_risk_threshold),
            new_account_history_threshold: env_parse_or(
                "NEW_ACCOUNT_HISTORY_THRESHOLD",
                d.new_account_history_threshold,
            ),
            threshold_snapshot_path: env_or(
                "THRESHOLD_SNAPSHOT_PATH",
                d.threshold_snapshot_path,
            ),
            worker_count: env_parse_or("RISKGUARD_WORKER_COUNT", d.worker_count),
        }
    }

    pub fn broker_url(&self) -> String {
        format!(
            "amqp://{}:{}@{}:{}{}",
            self.broker_user, self.broker_pass, self.broker_host, self.broker_port, self.broker_vhost
        )
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
