//! AMQP-backed job broker (production adapter) — spec.md §4.2.
//!
//! No broker crate appears anywhere in the retrieval pack (the teacher
//! talks to peers over `libp2p` gossip, not a durable queue); `lapin` is
//! picked as the standard, widely-used real AMQP client since the
//! specification requires one and none of the reference repos offer a
//! closer match (documented in DESIGN.md).

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions, BasicQosOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use riskguard_core::{constants, RiskError, TransactionId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{Acker, Delivery, JobBroker};

#[derive(Clone, Debug)]
pub struct AmqpConfig {
    pub url: String,
    pub queue_name: String,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    transaction_id: String,
}

/// Reconnect with bounded exponential-ish backoff: initial 5s, linear
/// growth `k*5s`, give up after `BROKER_BACKOFF_MAX_ATTEMPTS` — spec.md §4.2.
async fn connect_with_backoff(config: &AmqpConfig) -> Result<Connection, RiskError> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let props = ConnectionProperties::default().with_connection_name(
            format!("riskguard-node-{attempt}").into(),
        );
        match Connection::connect(&config.url, props).await {
            Ok(conn) => return Ok(conn),
            Err(e) if attempt >= constants::BROKER_BACKOFF_MAX_ATTEMPTS => {
                return Err(RiskError::BrokerUnavailable(format!(
                    "failed to connect after {attempt} attempts: {e}"
                )));
            }
            Err(e) => {
                let backoff = Duration::from_secs(constants::BROKER_BACKOFF_INITIAL_SECS * attempt as u64);
                warn!(attempt, error = %e, backoff_secs = backoff.as_secs(), "AMQP connect failed, retrying");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

pub struct AmqpBroker {
    channel: Channel,
    queue_name: String,
}

#[async_trait]
impl JobBroker for AmqpBroker {
    async fn publish(&self, transaction_id: TransactionId) -> Result<(), RiskError> {
        let payload = serde_json::to_vec(&WireMessage { transaction_id: transaction_id.to_string() })
            .map_err(|e| RiskError::Other(e.to_string()))?;

        self.channel
            .basic_publish(
                "",
                &self.queue_name,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default()
                    .with_content_type("application/json".into())
                    .with_delivery_mode(2), // persistent
            )
            .await
            .map_err(|e| RiskError::BrokerUnavailable(e.to_string()))?
            .await
            .map_err(|e| RiskError::BrokerUnavailable(e.to_string()))?;

        Ok(())
    }
}

pub struct AmqpConsumer {
    consumer: lapin::Consumer,
}

struct AmqpAcker {
    acker: lapin::acker::Acker,
}

#[async_trait]
impl Acker for AmqpAcker {
    async fn ack(&self) -> Result<(), RiskError> {
        self.acker
            .ack(BasicAckOptions::default())
            .await
            .map_err(|e| RiskError::BrokerUnavailable(e.to_string()))
    }

    async fn nack_requeue(&self) -> Result<(), RiskError> {
        self.acker
            .nack(BasicNackOptions { requeue: true, ..Default::default() })
            .await
            .map_err(|e| RiskError::BrokerUnavailable(e.to_string()))
    }
}

impl AmqpBroker {
    /// Connect, declare the durable queue, set `prefetch=1`, and return a
    /// `(producer, consumer)` pair — mirrors `P2pNetwork::new`'s
    /// `(network, handle)` split.
    pub async fn connect(config: &AmqpConfig) -> Result<(Self, AmqpConsumer), RiskError> {
        let connection = connect_with_backoff(config).await?;
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| RiskError::BrokerUnavailable(e.to_string()))?;

        channel
            .queue_declare(
                &config.queue_name,
                QueueDeclareOptions { durable: true, ..Default::default() },
                FieldTable::default(),
            )
            .await
            .map_err(|e| RiskError::BrokerUnavailable(e.to_string()))?;

        channel
            .basic_qos(constants::BROKER_PREFETCH, BasicQosOptions::default())
            .await
            .map_err(|e| RiskError::BrokerUnavailable(e.to_string()))?;

        let consumer = channel
            .basic_consume(
                &config.queue_name,
                "riskguard-worker",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| RiskError::BrokerUnavailable(e.to_string()))?;

        info!(queue = %config.queue_name, "AMQP consumer attached");

        Ok((
            AmqpBroker { channel, queue_name: config.queue_name.clone() },
            AmqpConsumer { consumer },
        ))
    }
}

impl AmqpConsumer {
    /// Drives deliveries into `out_tx`. Malformed payloads are acked and
    /// dropped (poison-drop, spec.md §4.7 step 1) rather than forwarded.
    pub async fn run(mut self, out_tx: mpsc::Sender<Delivery>) {
        while let Some(result) = self.consumer.next().await {
            let delivery = match result {
                Ok(d) => d,
                Err(e) => {
                    warn!(error = %e, "AMQP consumer stream error");
                    continue;
                }
            };

            let parsed = serde_json::from_slice::<WireMessage>(&delivery.data)
                .ok()
                .and_then(|m| TransactionId::parse(&m.transaction_id).ok());

            let transaction_id = match parsed {
                Some(id) => id,
                None => {
                    warn!("dropping malformed broker message");
                    let _ = delivery.acker.ack(BasicAckOptions::default()).await;
                    continue;
                }
            };

            let acker = AmqpAcker { acker: delivery.acker };
            if out_tx.send(Delivery { transaction_id, acker: Box::new(acker) }).await.is_err() {
                break;
            }
        }
    }
}
