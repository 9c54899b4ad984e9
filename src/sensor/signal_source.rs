use rppal::gpio::{Gpio, InputPin, Level};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use super::SensorError;

// Electrical level of the input line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineLevel {
    Low,
    High,
}

impl From<Level> for LineLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => LineLevel::Low,
            Level::High => LineLevel::High,
        }
    }
}

impl fmt::Display for LineLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineLevel::Low => f.write_str("0"),
            LineLevel::High => f.write_str("1"),
        }
    }
}

// Internal resistor applied when the line is claimed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    #[default]
    PullUp,
    PullDown,
    Off,
}

/// Maps the electrical level to pressed/released.
///
/// The button hardware of the Dream Recorder reads `1` while pressed and `0`
/// while released, which is [`Polarity::default`]. The mapping is fixed once at
/// startup and applied in exactly one place, the sampling loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Polarity {
    active_level: LineLevel,
}

impl Polarity {
    pub fn new(active_level: LineLevel) -> Self {
        Self { active_level }
    }

    pub fn active_level(&self) -> LineLevel {
        self.active_level
    }

    pub fn is_pressed(&self, level: LineLevel) -> bool {
        level == self.active_level
    }
}

impl Default for Polarity {
    fn default() -> Self {
        Self::new(LineLevel::High)
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let released = match self.active_level {
            LineLevel::High => LineLevel::Low,
            LineLevel::Low => LineLevel::High,
        };
        write!(f, "{}=not pressed, {}=pressed", released, self.active_level)
    }
}

/// A single boolean input line that can be read on demand
///
/// The handle is claimed exclusively by the sampling loop. Implementations
/// release the underlying line when dropped.
pub trait SignalSource: Send + fmt::Debug {
    /// Reads the current electrical level. An error here is fatal to the loop.
    fn read(&mut self) -> Result<LineLevel, SensorError>;

    /// Human-readable name of the line for logs
    fn describe(&self) -> String;
}

/// GPIO input line on the Raspberry Pi header
pub struct GpioLine {
    pin: InputPin,
    bcm: u8,
}

impl GpioLine {
    /// Claims BCM line `bcm` as an input with the requested bias.
    ///
    /// Fails if the GPIO peripheral cannot be opened or the line is already
    /// claimed. Callers treat this as fatal.
    pub fn open(bcm: u8, bias: Bias) -> Result<Self, SensorError> {
        debug!("Opening GPIO peripheral");
        let gpio = Gpio::new()
            .map_err(|e| SensorError::Acquisition(format!("failed to open GPIO: {}", e)))?;

        let pin = gpio.get(bcm).map_err(|e| {
            SensorError::Acquisition(format!("failed to claim GPIO line {}: {}", bcm, e))
        })?;

        let pin = match bias {
            Bias::PullUp => pin.into_input_pullup(),
            Bias::PullDown => pin.into_input_pulldown(),
            Bias::Off => pin.into_input(),
        };

        info!("GPIO initialized on pin {} ({:?})", bcm, bias);
        Ok(Self { pin, bcm })
    }
}

impl SignalSource for GpioLine {
    fn read(&mut self) -> Result<LineLevel, SensorError> {
        Ok(self.pin.read().into())
    }

    fn describe(&self) -> String {
        format!("GPIO{}", self.bcm)
    }
}

impl fmt::Debug for GpioLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpioLine").field("bcm", &self.bcm).finish()
    }
}

impl Drop for GpioLine {
    fn drop(&mut self) {
        // InputPin resets the line to its previous mode on drop
        info!("Releasing GPIO line {}", self.bcm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_polarity_treats_high_as_pressed() {
        let polarity = Polarity::default();
        assert!(polarity.is_pressed(LineLevel::High));
        assert!(!polarity.is_pressed(LineLevel::Low));
        assert_eq!(polarity.to_string(), "0=not pressed, 1=pressed");
    }

    #[test]
    fn active_low_polarity_inverts() {
        let polarity = Polarity::new(LineLevel::Low);
        assert!(polarity.is_pressed(LineLevel::Low));
        assert_eq!(polarity.to_string(), "1=not pressed, 0=pressed");
    }
}
