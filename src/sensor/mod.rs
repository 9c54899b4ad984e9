//! Sensor subsystem for the gesture button
//!
//! 1. [`signal_source`] - the input line and its polarity
//! 2. [`gesture_sensor`] - sampling loop feeding the tap classifier
//! 3. [`sensor_handle`] - lifecycle of the loop on a blocking worker
//!
//! # Architecture
//!
//! ```text
//! SignalSource ──► GestureSensor ──► mpsc::Sender<GestureEvent>
//!  (raw level)    (debounce, classify)
//! ```
//!
//! The loop samples every 10ms by default, well below the 50ms debounce time.

pub mod gesture_sensor;
pub mod sensor_handle;
pub mod signal_source;

pub use gesture_sensor::{GestureSensor, Initializing, Sampling, SamplingStats, SensorState};
pub use sensor_handle::SensorHandle;
pub use signal_source::{Bias, GpioLine, LineLevel, Polarity, SignalSource};

use crate::gesture::GestureTiming;

/// Capacity of the queue between the sampling loop and the dispatcher
pub const EVENT_QUEUE_CAPACITY: usize = 32;

// Settings for the sampling loop
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SensorSettings {
    pub timing: GestureTiming,
    pub polarity: Polarity,
}

// Sensor errors
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("Failed to acquire signal source: {0}")]
    Acquisition(String),

    #[error("Failed to read signal source: {0}")]
    Read(String),

    #[error("Sampling worker failed: {0}")]
    Worker(String),
}
