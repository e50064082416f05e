use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use rdkafka::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

/// The envelope written to the dead-letter topic: the original payload, why
/// it couldn't be processed, and enough of the source coordinates to find
/// it again in the original topic. `value` is base64-encoded the way a Go
/// `[]byte` field marshals through `encoding/json` — the DLQ body is human
/// inspectable JSON, not raw bytes wrapped in JSON array brackets.
#[derive(Serialize)]
pub struct DlqEnvelope {
    pub value: String,
    pub error: String,
    pub failure_timestamp: DateTime<Utc>,
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

/// The one capability the consumer needs to route a poison message —
/// extracted as a trait so `MessageHandler` can be tested without a live
/// Kafka producer behind it.
#[async_trait]
pub trait DlqPublisher: Send + Sync {
    async fn publish(
        &self,
        key: &str,
        value: &[u8],
        error: &anyhow::Error,
        source_topic: &str,
        partition: i32,
        offset: i64,
    );
}

pub struct DlqProducer {
    producer: FutureProducer,
    topic: String,
}

impl DlqProducer {
    pub fn new(brokers: &str, topic: impl Into<String>) -> anyhow::Result<Self> {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self {
            producer,
            topic: topic.into(),
        })
    }
}

#[async_trait]
impl DlqPublisher for DlqProducer {
    /// Publishes the failed message to the DLQ topic, keyed the same as the
    /// original so downstream tooling can still group by order.
    async fn publish(
        &self,
        key: &str,
        value: &[u8],
        error: &anyhow::Error,
        source_topic: &str,
        partition: i32,
        offset: i64,
    ) {
        let envelope = DlqEnvelope {
            value: BASE64.encode(value),
            error: format!("{error:#}"),
            failure_timestamp: Utc::now(),
            topic: source_topic.to_string(),
            partition,
            offset,
        };

        let payload = match serde_json::to_vec(&envelope) {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "failed to serialize DLQ envelope, dropping message");
                return;
            }
        };

        let record = FutureRecord::to(&self.topic).key(key).payload(&payload);

        match self
            .producer
            .send(record, Timeout::After(Duration::from_secs(5)))
            .await
        {
            Ok(_) => info!(key, topic = %self.topic, "routed poison message to DLQ"),
            Err((e, _)) => error!(key, error = %e, "failed to publish to DLQ"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_is_base64_encoded_not_a_byte_array() {
        let envelope = DlqEnvelope {
            value: BASE64.encode(b"{\"order_uid\":\"\"}"),
            error: "validation failed".into(),
            failure_timestamp: Utc::now(),
            topic: "orders".into(),
            partition: 0,
            offset: 42,
        };

        let json = serde_json::to_value(&envelope).unwrap();
        let value = json.get("value").unwrap();
        assert!(value.is_string());
        let decoded = BASE64.decode(value.as_str().unwrap()).unwrap();
        assert_eq!(decoded, b"{\"order_uid\":\"\"}");
    }
}
