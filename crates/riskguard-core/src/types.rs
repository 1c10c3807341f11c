use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment amount, in the smallest denomination of the processing currency.
/// Always non-negative; enforced at construction in `Transaction::new`.
pub type Amount = f64;

/// UTC instant. Stored as a `chrono::DateTime<Utc>` everywhere so that
/// window arithmetic (`timestamp - Duration::days(30)`) reads naturally.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque account identifier (sender or receiver side of a payment).
/// Accounts are not modeled beyond this id — no balance, no auth policy —
/// the risk service only ever resolves an account's transaction history.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque 128-bit transaction identifier (spec.md §3: "opaque 128-bit
/// identifier, unique"). Backed by a UUID rather than the teacher's
/// BLAKE3-of-body scheme: a fraud transaction has no canonical signed body
/// to hash, and the spec calls only for uniqueness, not content-addressing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
