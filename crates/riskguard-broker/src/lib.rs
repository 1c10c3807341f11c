//! Job Broker Adapter (C2) — spec.md §4.2.
//!
//! Generalizes `chronx_p2p::network::P2pNetwork`'s handle/run-loop split
//! (an owned driver task forwarding into an `mpsc` channel, paired with a
//! thin application-facing handle) from gossip broadcast to a durable,
//! acked work queue. Two adapters implement `JobBroker` per Design Notes
//! §9's polymorphism requirement: `AmqpBroker` (production, `lapin`) and
//! `InMemoryBroker` (test double, no I/O to fail).

pub mod amqp;
pub mod memory;

use async_trait::async_trait;
use riskguard_core::{RiskError, TransactionId};

pub use amqp::{AmqpBroker, AmqpConfig, AmqpConsumer};
pub use memory::{InMemoryBroker, InMemoryConsumer};

/// One dequeued job, carrying the means to ack or nack-requeue it.
pub struct Delivery {
    pub transaction_id: TransactionId,
    pub acker: Box<dyn Acker>,
}

/// Settles a single delivery — spec.md §4.2 "consumers receive, ack on
/// success, nack-requeue on transient failure".
#[async_trait]
pub trait Acker: Send + Sync {
    async fn ack(&self) -> Result<(), RiskError>;
    async fn nack_requeue(&self) -> Result<(), RiskError>;
}

/// Producer-side contract: enqueue a `transaction_id` onto the durable
/// queue — spec.md §4.2.
#[async_trait]
pub trait JobBroker: Send + Sync {
    async fn publish(&self, transaction_id: TransactionId) -> Result<(), RiskError>;
}
