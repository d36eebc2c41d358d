//! # eventsim-sink
//!
//! Concrete [`PublishSink`] implementations and the factory that picks one
//! from [`SinkConfig`].

use std::sync::Arc;

use eventsim_config::{SinkConfig, SinkKind};
use eventsim_core::sink::PublishSink;
use thiserror::Error;

#[cfg(feature = "kafka")]
pub mod kafka;
pub mod log;
pub mod writer;

#[cfg(feature = "kafka")]
pub use kafka::KafkaSink;
pub use log::LogSink;
pub use writer::WriterSink;

#[derive(Debug, Error)]
pub enum SinkBuildError {
    #[error("file sink requires sink.path")]
    MissingPath,

    #[error("cannot open sink file: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink kind {0:?} is not compiled in (enable the `{1}` feature)")]
    FeatureDisabled(SinkKind, &'static str),

    #[cfg(feature = "kafka")]
    #[error("kafka producer: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

/// Builds the sink the configuration asks for.
pub fn build_sink(config: &SinkConfig) -> Result<Arc<dyn PublishSink>, SinkBuildError> {
    match config.kind {
        SinkKind::Stdout => Ok(Arc::new(WriterSink::stdout())),
        SinkKind::Stderr => Ok(Arc::new(WriterSink::stderr())),
        SinkKind::File => {
            let path = config.path.as_deref().ok_or(SinkBuildError::MissingPath)?;
            Ok(Arc::new(WriterSink::file(path)?))
        }
        SinkKind::Log => Ok(Arc::new(LogSink::new(config.topic.clone()))),
        SinkKind::Kafka => build_kafka(config),
    }
}

#[cfg(feature = "kafka")]
fn build_kafka(config: &SinkConfig) -> Result<Arc<dyn PublishSink>, SinkBuildError> {
    Ok(Arc::new(KafkaSink::connect(&config.broker, &config.topic)?))
}

#[cfg(not(feature = "kafka"))]
fn build_kafka(_config: &SinkConfig) -> Result<Arc<dyn PublishSink>, SinkBuildError> {
    Err(SinkBuildError::FeatureDisabled(SinkKind::Kafka, "kafka"))
}
