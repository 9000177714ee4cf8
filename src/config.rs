//! Layered settings.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. environment variables prefixed `FIREWATCH__` (nested keys joined
//!    with `__`, e.g. `FIREWATCH__LIVENESS__THRESHOLD=15s`)
//!
//! Command-line flags are applied on top by the binary.
//!
//! ```toml
//! device_path = "/devices/esp32_1"
//! history_capacity = 30
//! timestamp_unit = "millis"
//! poll_interval = "1s"
//!
//! [liveness]
//! policy = "arrival-timeout"
//! threshold = "10s"
//!
//! [thresholds]
//! temperature_high = 45.0
//!
//! [alerts]
//! sound = true
//! notify_command = "notify-send"
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;
use crate::reconciler::ReconcilerOptions;
use crate::source::DEFAULT_POLL_INTERVAL;
use crate::telemetry::duration::parse_duration;
use crate::telemetry::{
    LivenessPolicy, Thresholds, TimestampUnit, DEFAULT_HISTORY_CAPACITY,
    DEFAULT_LIVENESS_THRESHOLD,
};

/// Longest accepted liveness threshold or poll interval.
pub const MAX_DURATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Device node watched when none is configured.
pub const DEFAULT_DEVICE_PATH: &str = "/devices/esp32_1";

/// Which liveness policy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// Online on arrival, offline after a quiet period.
    #[default]
    ArrivalTimeout,
    /// Online while the producer timestamp is recent.
    TimestampAge,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LivenessSettings {
    pub policy: PolicyKind,
    #[serde(deserialize_with = "duration")]
    pub threshold: Duration,
}

impl Default for LivenessSettings {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            threshold: DEFAULT_LIVENESS_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    /// Ring the terminal bell on a new alarm.
    pub sound: bool,
    /// Command invoked as `<command> <title> <body>` on a new alarm.
    pub notify_command: Option<String>,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            sound: true,
            notify_command: None,
        }
    }
}

/// Complete dashboard settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path of the device node in the telemetry tree.
    pub device_path: String,
    /// Number of past snapshots kept for display.
    pub history_capacity: usize,
    /// Unit of the producer's `timestamp` field.
    pub timestamp_unit: TimestampUnit,
    /// File polling interval (file source only).
    #[serde(deserialize_with = "duration")]
    pub poll_interval: Duration,
    pub liveness: LivenessSettings,
    pub thresholds: Thresholds,
    pub alerts: AlertSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_path: DEFAULT_DEVICE_PATH.to_string(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            timestamp_unit: TimestampUnit::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            liveness: LivenessSettings::default(),
            thresholds: Thresholds::default(),
            alerts: AlertSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional file, and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(Environment::with_prefix("FIREWATCH").separator("__"))
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        if self.liveness.threshold.is_zero() {
            return Err(ConfigError::Invalid(
                "liveness threshold must be positive".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "poll_interval must be positive".to_string(),
            ));
        }
        if self.liveness.threshold > MAX_DURATION || self.poll_interval > MAX_DURATION {
            return Err(ConfigError::Invalid(
                "durations must not exceed 7 days".to_string(),
            ));
        }
        Ok(())
    }

    pub fn liveness_policy(&self) -> LivenessPolicy {
        match self.liveness.policy {
            PolicyKind::ArrivalTimeout => LivenessPolicy::ArrivalTimeout(self.liveness.threshold),
            PolicyKind::TimestampAge => LivenessPolicy::TimestampAge(self.liveness.threshold),
        }
    }

    pub fn reconciler_options(&self) -> ReconcilerOptions {
        ReconcilerOptions {
            history_capacity: self.history_capacity,
            liveness: self.liveness_policy(),
            timestamp_unit: self.timestamp_unit,
        }
    }
}

/// Accept `"10s"`-style strings or a bare number of seconds.
fn duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Duration::try_from_secs_f64(secs)
            .map_err(|_| serde::de::Error::custom(format!("invalid duration: {}", secs))),
        Raw::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}
