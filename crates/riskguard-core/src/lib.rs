pub mod config;
pub mod constants;
pub mod error;
pub mod stats;
pub mod threshold;
pub mod transaction;
pub mod types;

pub use config::RiskGuardConfig;
pub use error::RiskError;
pub use threshold::{DistributionStats, NetworkStats, ThresholdConfig, VelocityStats};
pub use transaction::{RiskDetails, SimulationType, Transaction, TransactionStatus};
pub use types::{AccountId, Amount, Timestamp, TransactionId};
