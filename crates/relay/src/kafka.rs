use std::time::Duration;

use logrelay_core::broker::StreamBroker;
use logrelay_core::{RelayError, Result};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;

/// Kafka-backed stream broker. Delivery is acknowledged per entry; rdkafka's
/// internal retries are the only retry policy applied.
#[derive(Clone)]
pub struct KafkaBroker {
    producer: FutureProducer,
    timeout: Duration,
}

impl KafkaBroker {
    pub fn new(brokers: &str, timeout: Duration) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .create()
            .map_err(|e| RelayError::Config(format!("failed to create kafka producer: {e}")))?;
        Ok(Self { producer, timeout })
    }
}

impl StreamBroker for KafkaBroker {
    async fn publish(&self, topic: &str, key: Option<&str>, payload: &str) -> Result<()> {
        let mut record = FutureRecord::<str, str>::to(topic).payload(payload);
        if let Some(key) = key {
            record = record.key(key);
        }

        self.producer
            .send(record, Timeout::After(self.timeout))
            .await
            .map(|_| ())
            .map_err(|(e, _msg)| RelayError::Publish(format!("kafka delivery failed: {e}")))
    }
}
