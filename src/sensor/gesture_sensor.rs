use statum::{machine, state};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::signal_source::SignalSource;
use super::{SensorError, SensorSettings};
use crate::gesture::{Edge, EdgeOutcome, GestureEvent, TapClassifier};

const STATS_INTERVAL: Duration = Duration::from_secs(60);

// Counters for the periodic stats line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SamplingStats {
    pub samples: u64,
    pub presses: u64,
    pub releases: u64,
    pub bounces: u64,
    pub gestures: u64,
    pub dropped: u64,
}

// Sensor lifecycle using statum's state macro
#[state]
#[derive(Debug, Clone)]
pub enum SensorState {
    Initializing,
    Sampling,
}

#[machine]
#[derive(Debug)]
pub struct GestureSensor<S: SensorState> {
    // Claimed input line, released when the sensor is dropped
    source: Box<dyn SignalSource>,

    settings: SensorSettings,

    // Owned exclusively by the sampling loop
    classifier: TapClassifier,

    // Channel to the dispatcher
    event_sender: mpsc::Sender<GestureEvent>,

    stats: SamplingStats,
}

// Methods available in all states
impl<S: SensorState> GestureSensor<S> {
    pub fn settings(&self) -> &SensorSettings {
        &self.settings
    }

    pub fn classifier(&self) -> &TapClassifier {
        &self.classifier
    }

    pub fn stats(&self) -> &SamplingStats {
        &self.stats
    }
}

impl GestureSensor<Initializing> {
    pub fn create(
        source: Box<dyn SignalSource>,
        settings: SensorSettings,
        event_sender: mpsc::Sender<GestureEvent>,
    ) -> Self {
        debug!("Creating GestureSensor on {} with {:?}", source.describe(), settings);
        let classifier = TapClassifier::new(settings.timing);
        Self::new(
            source,
            settings,
            classifier,
            event_sender,
            SamplingStats::default(),
        )
    }

    /// Checks that the line answers and transitions to `Sampling`.
    ///
    /// The classifier always starts released, even if the line reads pressed
    /// right now. A button held through startup therefore shows up as a press
    /// on the first sample.
    pub fn initialize(mut self) -> Result<GestureSensor<Sampling>, SensorError> {
        let timing = self.settings.timing;
        info!("Starting tap detection on {}", self.source.describe());
        info!("Double tap window: {:.3}s", timing.double_tap_window.as_secs_f64());
        info!("Long tap duration: {:.3}s", timing.long_tap.as_secs_f64());
        info!(
            "Debounce: {:.3}s, correlation window: {:.3}s, poll interval: {:.3}s",
            timing.debounce.as_secs_f64(),
            timing.correlation_window.as_secs_f64(),
            timing.poll_interval.as_secs_f64()
        );
        info!("Button logic: {}", self.settings.polarity);

        let level = self.source.read()?;
        if self.settings.polarity.is_pressed(level) {
            warn!("Button reads pressed at startup (level {})", level);
        } else {
            debug!("Initial line level: {}", level);
        }

        info!("GestureSensor initialized, transitioning to Sampling state");
        Ok(self.transition())
    }
}

impl GestureSensor<Sampling> {
    /// Takes one sample at `now` and runs it through the classifier.
    ///
    /// A classified gesture is queued for the dispatcher with `try_send`; a full
    /// or closed queue loses the event. Only a failed read is an error.
    pub fn sample_once(&mut self, now: Instant) -> Result<Option<GestureEvent>, SensorError> {
        let level = self.source.read()?;
        let pressed = self.settings.polarity.is_pressed(level);
        let observation = self.classifier.observe(pressed, now);

        self.stats.samples += 1;
        match observation.edge {
            EdgeOutcome::Accepted(Edge::Press) => self.stats.presses += 1,
            EdgeOutcome::Accepted(Edge::Release) => self.stats.releases += 1,
            EdgeOutcome::Bounced => self.stats.bounces += 1,
            EdgeOutcome::Steady => {}
        }

        let Some(gesture) = observation.gesture else {
            return Ok(None);
        };

        self.stats.gestures += 1;
        let event = GestureEvent::now(gesture);
        info!(
            "Gesture {} at {}",
            gesture,
            event.detected_at.format("%H:%M:%S%.3f")
        );

        match self.event_sender.try_send(event.clone()) {
            Ok(_) => debug!("Gesture queued for dispatch"),
            Err(e) => {
                self.stats.dropped += 1;
                error!("Failed to queue {}: {}", gesture, e);
            }
        }

        Ok(Some(event))
    }

    /// Runs the sampling loop until `cancel` fires or a read fails.
    pub fn run(&mut self, cancel: &CancellationToken) -> Result<(), SensorError> {
        info!("Starting sampling loop");

        let poll_interval = self.settings.timing.poll_interval;
        let mut last_stats = Instant::now();
        let mut last_logged = self.stats;

        while !cancel.is_cancelled() {
            let now = Instant::now();
            if let Err(e) = self.sample_once(now) {
                error!("Sampling stopped: {}", e);
                return Err(e);
            }

            if now.saturating_duration_since(last_stats) >= STATS_INTERVAL {
                debug!(
                    "Sampler stats: {} samples, {} presses, {} releases, {} bounces, {} gestures in last {}s",
                    self.stats.samples - last_logged.samples,
                    self.stats.presses - last_logged.presses,
                    self.stats.releases - last_logged.releases,
                    self.stats.bounces - last_logged.bounces,
                    self.stats.gestures - last_logged.gestures,
                    STATS_INTERVAL.as_secs()
                );
                last_logged = self.stats;
                last_stats = now;
            }

            std::thread::sleep(poll_interval);
        }

        info!("Sampling loop stopped");
        Ok(())
    }
}
