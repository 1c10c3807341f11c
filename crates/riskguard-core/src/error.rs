use thiserror::Error;

/// Flat error enum covering every `Kind` in spec.md §7, in the same style
/// as the teacher's `ChronxError`: one variant per recovery policy, never a
/// wrapped opaque cause where a caller needs to branch on it.
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("duplicate transaction id: {0}")]
    DuplicateId(String),

    #[error("transaction not found: {0}")]
    NotFound(String),

    #[error("transaction already processed: {0}")]
    AlreadyProcessed(String),

    #[error("broker unavailable: {0}")]
    BrokerUnavailable(String),

    #[error("transient store error: {0}")]
    StoreTransient(String),

    #[error("analysis error: {0}")]
    Analysis(String),

    #[error("job deadline exceeded")]
    Timeout,

    #[error("{0}")]
    Other(String),
}

impl RiskError {
    /// Whether a worker should nack-requeue the job on this error — spec.md
    /// §7: everything except `AlreadyProcessed` and poison/ack cases.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RiskError::BrokerUnavailable(_) | RiskError::StoreTransient(_) | RiskError::Timeout
        )
    }
}
