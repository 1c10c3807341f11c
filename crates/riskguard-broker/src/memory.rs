//! In-memory job broker — a pure-Rust test double with no I/O to fail,
//! mirroring `riskguard_store::memory::InMemoryTransactionStore`'s role for
//! `TransactionStore`. Nack-requeue pushes the job back onto the queue
//! rather than onto a server-side redelivery counter.

use async_trait::async_trait;
use riskguard_core::{RiskError, TransactionId};
use tokio::sync::mpsc;

use crate::{Acker, Delivery, JobBroker};

struct MemoryAcker {
    transaction_id: TransactionId,
    requeue_tx: mpsc::UnboundedSender<TransactionId>,
}

#[async_trait]
impl Acker for MemoryAcker {
    async fn ack(&self) -> Result<(), RiskError> {
        Ok(())
    }

    async fn nack_requeue(&self) -> Result<(), RiskError> {
        let _ = self.requeue_tx.send(self.transaction_id);
        Ok(())
    }
}

/// Handle returned alongside the consumer loop — publish from here.
pub struct InMemoryBroker {
    inbound_tx: mpsc::UnboundedSender<TransactionId>,
}

#[async_trait]
impl JobBroker for InMemoryBroker {
    async fn publish(&self, transaction_id: TransactionId) -> Result<(), RiskError> {
        self.inbound_tx
            .send(transaction_id)
            .map_err(|_| RiskError::BrokerUnavailable("in-memory queue closed".into()))
    }
}

/// Drives deliveries into `inbound_tx` for a worker pool to drain —
/// `tokio::spawn(consumer.run(tx))`, matching `P2pNetwork::run`.
pub struct InMemoryConsumer {
    queue_rx: mpsc::UnboundedReceiver<TransactionId>,
    requeue_tx: mpsc::UnboundedSender<TransactionId>,
    requeue_rx: mpsc::UnboundedReceiver<TransactionId>,
}

impl InMemoryBroker {
    /// Build a connected (broker, consumer) pair — no connection to open.
    pub fn new() -> (Self, InMemoryConsumer) {
        let (inbound_tx, queue_rx) = mpsc::unbounded_channel();
        let (requeue_tx, requeue_rx) = mpsc::unbounded_channel();
        (InMemoryBroker { inbound_tx }, InMemoryConsumer { queue_rx, requeue_tx, requeue_rx })
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new().0
    }
}

impl InMemoryConsumer {
    pub async fn run(mut self, out_tx: mpsc::Sender<Delivery>) {
        loop {
            tokio::select! {
                Some(transaction_id) = self.queue_rx.recv() => {
                    let acker = MemoryAcker { transaction_id, requeue_tx: self.requeue_tx.clone() };
                    if out_tx.send(Delivery { transaction_id, acker: Box::new(acker) }).await.is_err() {
                        break;
                    }
                }
                Some(transaction_id) = self.requeue_rx.recv() => {
                    let acker = MemoryAcker { transaction_id, requeue_tx: self.requeue_tx.clone() };
                    if out_tx.send(Delivery { transaction_id, acker: Box::new(acker) }).await.is_err() {
                        break;
                    }
                }
                else => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_then_consume_round_trips() {
        let (broker, consumer) = InMemoryBroker::new();
        let (out_tx, mut out_rx) = mpsc::channel(8);
        tokio::spawn(consumer.run(out_tx));

        let id = TransactionId::new();
        broker.publish(id).await.unwrap();

        let delivery = out_rx.recv().await.unwrap();
        assert_eq!(delivery.transaction_id, id);
        delivery.acker.ack().await.unwrap();
    }

    #[tokio::test]
    async fn nack_requeues_the_job() {
        let (broker, consumer) = InMemoryBroker::new();
        let (out_tx, mut out_rx) = mpsc::channel(8);
        tokio::spawn(consumer.run(out_tx));

        let id = TransactionId::new();
        broker.publish(id).await.unwrap();

        let first = out_rx.recv().await.unwrap();
        first.acker.nack_requeue().await.unwrap();

        let second = out_rx.recv().await.unwrap();
        assert_eq!(second.transaction_id, id);
    }
}
