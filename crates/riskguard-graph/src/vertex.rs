use riskguard_core::{Amount, Timestamp};

/// Interned account index within one `TransactionGraph`. Not meaningful
/// across graphs — a fresh graph is built per job (Design Notes §9).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// One historical transaction, as an edge in the transaction graph.
#[derive(Clone, Debug)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub amount: Amount,
    pub timestamp: Timestamp,
    /// `risk_score` of this past transaction, if it was processed.
    pub risk_score: Option<f64>,
    /// Whether this past transaction was ultimately `blocked`.
    pub blocked: bool,
}
