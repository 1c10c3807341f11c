//! ─── RiskGuard Constants ────────────────────────────────────────────────────
//!
//! Default tunables, read from the environment at startup (spec.md §6) and
//! overridden thereafter only by `riskguard-rules`'s threshold snapshot.

/// Default decision boundary: below this, `approved`.
pub const DEFAULT_LOW_RISK_THRESHOLD: f64 = 0.3;

/// Default decision boundary: below this, `pending_verification`; at/above, `blocked`.
pub const DEFAULT_HIGH_RISK_THRESHOLD: f64 = 0.9;

/// Unused boundary name kept for deployments that configure a three-way
/// split (low/medium/high); the production decision mapping in spec.md §4.6
/// only consumes low and high.
pub const DEFAULT_MEDIUM_RISK_THRESHOLD: f64 = 0.7;

/// Below this many prior transactions, an account is "new" — spec.md §4.3/§4.6.
pub const DEFAULT_NEW_ACCOUNT_HISTORY_THRESHOLD: usize = 5;

/// Default C6 sub-score weights when the account is not new.
pub const DEFAULT_GRAPH_TEMPORAL_WEIGHT: f64 = 0.6;
pub const DEFAULT_CONTENT_ANALYSIS_WEIGHT: f64 = 0.4;

/// C3 Input Processor history window size — spec.md §4.3.
pub const HISTORY_WINDOW_SIZE: usize = 20;

/// C4/C8 lookback window for graph/velocity construction — spec.md §4.4.
pub const GRAPH_WINDOW_DAYS: i64 = 30;

/// C6 trending-fraud lookback — spec.md §4.6.
pub const TRENDING_FRAUD_WINDOW_DAYS: i64 = 7;
pub const TRENDING_FRAUD_SCAN_CAP: usize = 200;

/// C6 trending-fraud combined contribution cap (production path) — spec.md §9.
pub const TRENDING_FRAUD_CAP: f64 = 0.5;

/// Per-job wall-clock deadline — spec.md §5.
pub const JOB_DEADLINE_SECS: u64 = 30;

/// Broker consumer prefetch — spec.md §4.2/§5 (fixed at 1 by design).
pub const BROKER_PREFETCH: u16 = 1;

/// Broker reconnect backoff — spec.md §4.2: initial 5s, cap >=5 attempts, linear k*5s.
pub const BROKER_BACKOFF_INITIAL_SECS: u64 = 5;
pub const BROKER_BACKOFF_MAX_ATTEMPTS: u32 = 5;

/// Rule updater cadence — spec.md §4.8.
pub const RULE_UPDATE_INTERVAL_SECS: u64 = 24 * 60 * 60;
pub const RULE_UPDATE_RETRY_SECS: u64 = 60 * 60;
pub const RULE_UPDATE_LOOKBACK_DAYS: i64 = 30;
pub const RULE_UPDATE_MIN_SAMPLE: usize = 100;
pub const RULE_UPDATE_TOP_K: usize = 10;
