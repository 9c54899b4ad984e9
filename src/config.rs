//! # Configuration
//!
//! One TOML file with three sections: the input line (`[sensor]`), the
//! classifier thresholds (`[timing]`) and the event endpoints (`[sink]`).
//! Every field has a default, so a partial file is fine and a missing file
//! degrades to the defaults with a warning. A file that does not parse is fatal.
//!
//! The file lives at `$DREAMTAP_CONFIG` if set, otherwise at
//! `<config dir>/dreamtap/config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::gesture::{Gesture, GestureTiming};
use crate::sensor::{Bias, LineLevel, Polarity, SensorSettings};

pub const CONFIG_ENV: &str = "DREAMTAP_CONFIG";
const CONFIG_DIR: &str = "dreamtap";
const CONFIG_FILE: &str = "config.toml";

// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No configuration directory available")]
    NoConfigDir,

    #[error("Failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub sensor: SensorConfig,
    pub timing: TimingConfig,
    pub sink: SinkConfig,
}

/// Input line settings
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SensorConfig {
    /// BCM number of the button line
    pub pin: u8,
    /// Wait before the line is claimed, gives the event endpoint time to start
    pub startup_delay_secs: f64,
    /// Level that means "pressed". The Dream Recorder button reads 1 when pressed.
    pub active_level: LineLevel,
    pub bias: Bias,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            pin: 17,
            startup_delay_secs: 5.0,
            active_level: LineLevel::High,
            bias: Bias::PullUp,
        }
    }
}

/// Classifier thresholds, in seconds
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub debounce_secs: f64,
    pub double_tap_window_secs: f64,
    pub long_tap_secs: f64,
    pub correlation_window_secs: f64,
    pub poll_interval_secs: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce_secs: 0.05,
            double_tap_window_secs: 0.8,
            long_tap_secs: 3.0,
            correlation_window_secs: 3.0,
            poll_interval_secs: 0.01,
        }
    }
}

/// Event endpoint settings
///
/// `endpoints` maps a gesture name (`single_tap`, `double_tap`, `long_tap`) to
/// a path appended to `base_url`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SinkConfig {
    pub base_url: String,
    pub timeout_secs: f64,
    pub endpoints: BTreeMap<String, String>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        let endpoints = Gesture::ALL
            .iter()
            .map(|gesture| (gesture.name().to_string(), format!("/api/gpio_{}", gesture.name())))
            .collect();

        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_secs: 2.0,
            endpoints,
        }
    }
}

impl AppConfig {
    /// Resolves the configuration file path from the environment or the
    /// platform config directory.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        let mut path = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        Ok(path)
    }

    /// Loads the configuration from `path`, or the defaults if it does not exist.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                info!("Loading configuration from {}", path.display());
                Self::from_toml(&content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "No configuration at {}, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        debug!("Parsed configuration: {:?}", config);
        Ok(config)
    }

    pub fn sensor_settings(&self) -> Result<SensorSettings, ConfigError> {
        Ok(SensorSettings {
            timing: self.timing.to_timing()?,
            polarity: Polarity::new(self.sensor.active_level),
        })
    }

    pub fn startup_delay(&self) -> Result<Duration, ConfigError> {
        let value = self.sensor.startup_delay_secs;
        Duration::try_from_secs_f64(value).map_err(|e| ConfigError::InvalidValue {
            field: "sensor.startup_delay_secs",
            reason: e.to_string(),
        })
    }

    pub fn sink_timeout(&self) -> Result<Duration, ConfigError> {
        positive_secs("sink.timeout_secs", self.sink.timeout_secs)
    }
}

impl TimingConfig {
    /// Converts to typed durations and checks that the thresholds are ordered.
    ///
    /// A long-tap threshold above the correlation window widens the window, so a
    /// press released between the two still resolves to a single tap.
    pub fn to_timing(&self) -> Result<GestureTiming, ConfigError> {
        let debounce = positive_secs("timing.debounce_secs", self.debounce_secs)?;
        let double_tap_window =
            positive_secs("timing.double_tap_window_secs", self.double_tap_window_secs)?;
        let long_tap = positive_secs("timing.long_tap_secs", self.long_tap_secs)?;
        let mut correlation_window =
            positive_secs("timing.correlation_window_secs", self.correlation_window_secs)?;
        let poll_interval = positive_secs("timing.poll_interval_secs", self.poll_interval_secs)?;

        if poll_interval >= debounce {
            return Err(ConfigError::InvalidValue {
                field: "timing.poll_interval_secs",
                reason: "must be shorter than the debounce time".to_string(),
            });
        }
        if debounce >= double_tap_window {
            return Err(ConfigError::InvalidValue {
                field: "timing.debounce_secs",
                reason: "must be shorter than the double tap window".to_string(),
            });
        }
        if double_tap_window > correlation_window {
            return Err(ConfigError::InvalidValue {
                field: "timing.correlation_window_secs",
                reason: "must not be shorter than the double tap window".to_string(),
            });
        }
        if long_tap > correlation_window {
            warn!(
                "Long tap duration {:.3}s exceeds correlation window {:.3}s, widening the window",
                long_tap.as_secs_f64(),
                correlation_window.as_secs_f64()
            );
            correlation_window = long_tap;
        }

        Ok(GestureTiming {
            debounce,
            double_tap_window,
            long_tap,
            correlation_window,
            poll_interval,
        })
    }
}

fn positive_secs(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    let duration = Duration::try_from_secs_f64(value).map_err(|e| ConfigError::InvalidValue {
        field,
        reason: e.to_string(),
    })?;
    if duration.is_zero() {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(duration)
}
