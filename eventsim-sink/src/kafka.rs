//! Kafka producer sink.
//!
//! Uses a `ThreadedProducer`, whose background thread polls delivery
//! reports, so `publish` only enqueues into librdkafka and returns.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{BaseRecord, DefaultProducerContext, Producer, ThreadedProducer};
use rdkafka::util::Timeout;
use tracing::{debug, info};

use eventsim_core::sink::{PublishSink, SinkError};

const FLUSH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct KafkaSink {
    topic: String,
    producer: ThreadedProducer<DefaultProducerContext>,
}

impl KafkaSink {
    pub fn connect(broker: &str, topic: &str) -> Result<Self, KafkaError> {
        let producer: ThreadedProducer<DefaultProducerContext> = ClientConfig::new()
            .set("bootstrap.servers", broker)
            .create()?;
        info!(topic, broker, "producer created");
        Ok(Self {
            topic: topic.to_string(),
            producer,
        })
    }
}

#[async_trait]
impl PublishSink for KafkaSink {
    async fn publish(&self, payload: Bytes) -> Result<(), SinkError> {
        debug!(topic = %self.topic, bytes = payload.len(), "sending message");
        let record: BaseRecord<'_, (), [u8]> = BaseRecord::to(&self.topic).payload(payload.as_ref());
        self.producer
            .send(record)
            .map_err(|(err, _)| SinkError::Rejected(err.to_string()))
    }

    async fn flush(&self) -> Result<(), SinkError> {
        self.producer
            .flush(Timeout::After(FLUSH_TIMEOUT))
            .map_err(|err| SinkError::Unavailable(err.to_string()))
    }
}
