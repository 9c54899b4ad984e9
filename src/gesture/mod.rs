//! Gesture types and the timing model shared by the sensor and the dispatcher
//!
//! 1. [`debounce`] - accept or reject a raw level change
//! 2. [`classifier`] - turn accepted edges and elapsed time into gestures

pub mod classifier;
pub mod debounce;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub use classifier::{ClassifierState, Edge, EdgeOutcome, Observation, TapClassifier};
pub use debounce::Decision;

/// Semantic meaning of one physical button interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    SingleTap,
    DoubleTap,
    LongTap,
}

impl Gesture {
    pub const ALL: [Gesture; 3] = [Gesture::SingleTap, Gesture::DoubleTap, Gesture::LongTap];

    /// Name used to look up the event endpoint
    pub fn name(&self) -> &'static str {
        match self {
            Gesture::SingleTap => "single_tap",
            Gesture::DoubleTap => "double_tap",
            Gesture::LongTap => "long_tap",
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Classified gesture on its way to the event sink
#[derive(Debug, Clone, PartialEq)]
pub struct GestureEvent {
    pub gesture: Gesture,
    pub detected_at: DateTime<Local>,
}

impl GestureEvent {
    pub fn now(gesture: Gesture) -> Self {
        Self {
            gesture,
            detected_at: Local::now(),
        }
    }
}

/// Timing thresholds of the debouncer and the classifier
///
/// All decisions are made on monotonic elapsed time. The poll interval has to
/// stay well below the debounce time and the double-tap window, otherwise
/// scheduling jitter starts to shift gesture boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GestureTiming {
    /// Minimum time between two accepted level changes
    pub debounce: Duration,

    /// Maximum gap between two press starts that still counts as a double tap.
    /// A lone press resolves to a single tap once this has elapsed.
    pub double_tap_window: Duration,

    /// Hold time after which a press is a long tap
    pub long_tap: Duration,

    /// How long press starts are kept for multi-tap correlation
    pub correlation_window: Duration,

    /// Sleep between two samples of the line
    pub poll_interval: Duration,
}

impl Default for GestureTiming {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(50),
            double_tap_window: Duration::from_millis(800),
            long_tap: Duration::from_secs(3),
            correlation_window: Duration::from_secs(3),
            poll_interval: Duration::from_millis(10),
        }
    }
}
