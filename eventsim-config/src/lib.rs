//! # eventsim Configuration
//!
//! Layered configuration for the session simulator.
//!
//! ## Hierarchy
//! 1. Built-in defaults for every option
//! 2. An optional YAML or JSON file
//! 3. `EVENTSIM_*` environment variables in snake case (`__` separates
//!    nested keys, so `EVENTSIM_MODEL__MOBILE_RATIO` sets `model.mobileRatio`)
//!
//! The result is validated once; a configuration that would make session
//! generation impossible is rejected before any job is scheduled.

#![deny(rustdoc::broken_intra_doc_links)]

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use figment::{
    providers::{Env, Format, Json, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod logging;
mod model;
mod sink;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use model::ModelConfig;
pub use sink::{SinkConfig, SinkKind};

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "EVENTSIM_";

/// Process-wide simulation parameters. Loaded once, then shared read-only.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfig {
    /// Number of concurrent session workers.
    #[validate(range(min = 1, message = "at least one worker is required"))]
    pub workers: usize,

    /// Number of sessions to simulate.
    pub sessions: usize,

    /// Upper bound (exclusive) of the random delay before a session starts.
    pub session_start_jitter_ms: u64,

    /// Seed of the generator every random pool is filled from.
    pub seed: u64,

    #[validate(nested)]
    pub model: ModelConfig,

    #[validate(nested)]
    pub logging: LoggingConfig,

    #[validate(nested)]
    pub sink: SinkConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            sessions: 10,
            session_start_jitter_ms: 10_000,
            seed: default_seed(),
            model: ModelConfig::default(),
            logging: LoggingConfig::default(),
            sink: SinkConfig::default(),
        }
    }
}

fn default_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

impl SimulationConfig {
    /// Loads defaults, then `path` if given, then the environment.
    ///
    /// A path that was explicitly passed but does not exist is an error; a
    /// missing default file is not, since every option has a default.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(SimulationConfig::default()));

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(PathBuf::from(path)));
            }
            figment = merge_file(figment, path)?;
        }

        Self::extract(figment.merge(env_provider()))
    }

    /// Loads only the given file on top of the defaults, ignoring the environment.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }
        let figment = Figment::from(Serialized::defaults(SimulationConfig::default()));
        Self::extract(merge_file(figment, path)?)
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}

/// `EVENTSIM_MODEL__MOBILE_RATIO` becomes `model.mobileRatio`.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX)
        .lowercase(false)
        .map(|key| env_key_to_path(key.as_str()).into())
}

fn env_key_to_path(key: &str) -> String {
    key.split("__")
        .map(|segment| {
            let mut words = segment.split('_').filter(|w| !w.is_empty());
            let mut field = words.next().unwrap_or_default().to_ascii_lowercase();
            for word in words {
                let mut chars = word.chars();
                if let Some(first) = chars.next() {
                    field.push(first.to_ascii_uppercase());
                    field.push_str(&chars.as_str().to_ascii_lowercase());
                }
            }
            field
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment, ConfigError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => Ok(figment.merge(Yaml::file(path))),
        Some("json") => Ok(figment.merge(Json::file(path))),
        _ => Err(ConfigError::UnsupportedFormat(PathBuf::from(path))),
    }
}

impl fmt::Display for SimulationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.model;
        write!(
            f,
            "global: {{workers: {}, sessions: {}, sessionStartJitterMs: {}, seed: {}}} \
             logging: {{level: {}, file: {}, format: {:?}}} \
             sink: {{kind: {:?}, broker: {}, topic: {}}} \
             model: {{maxEventsPerSession: {}, minEventsPerSession: {}, avgEventIntervalMs: {}, \
             eventIntervalStddevMs: {}, avgNetworkDelayMs: {}, mobileRatio: {}, bufferedRatio: {}, \
             reconnectDelayMs: {}, errorRatio: {}}}",
            self.workers,
            self.sessions,
            self.session_start_jitter_ms,
            self.seed,
            self.logging.level,
            self.logging.file,
            self.logging.format,
            self.sink.kind,
            self.sink.broker,
            self.sink.topic,
            m.max_events_per_session,
            m.min_events_per_session,
            m.avg_event_interval_ms,
            m.event_interval_stddev_ms,
            m.avg_network_delay_ms,
            m.mobile_ratio,
            m.buffered_ratio,
            m.reconnect_delay_ms,
            m.error_ratio,
        )
    }
}
