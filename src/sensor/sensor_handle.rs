//! Sensor Handle - lifecycle of the sampling loop
//!
//! The loop is synchronous and sleeps between samples, so it runs on a
//! dedicated blocking worker rather than on the async runtime. The signal source
//! moves into the worker and is dropped there on every exit path, which
//! releases the GPIO line.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::gesture_sensor::GestureSensor;
use super::signal_source::SignalSource;
use super::{SensorError, SensorSettings};
use crate::gesture::GestureEvent;

/// Handle for a running sampling loop
///
/// # Shutdown
///
/// Cancelling the token passed to [`SensorHandle::spawn`] (or calling
/// [`SensorHandle::stop`]) ends the loop after the current sample. The loop also
/// ends by itself when a read fails; [`SensorHandle::join`] then returns that
/// error.
pub struct SensorHandle {
    task: JoinHandle<Result<(), SensorError>>,
    cancel: CancellationToken,
}

impl SensorHandle {
    /// Initializes the sensor on the calling task and spawns the sampling loop.
    ///
    /// # Errors
    ///
    /// * [`SensorError::Read`] - the line did not answer the initial read
    pub fn spawn(
        source: Box<dyn SignalSource>,
        settings: SensorSettings,
        event_sender: mpsc::Sender<GestureEvent>,
        cancel: CancellationToken,
    ) -> Result<Self, SensorError> {
        info!("Spawning GestureSensor on {}", source.describe());

        let sensor = GestureSensor::create(source, settings, event_sender);
        let mut sampling = sensor.initialize()?;

        let token = cancel.clone();
        let task = tokio::task::spawn_blocking(move || {
            let result = sampling.run(&token);
            if let Err(e) = &result {
                error!("GestureSensor terminated with error: {}", e);
            }
            debug!("Final sampler stats: {:?}", sampling.stats());
            // Dropping the sensor releases the line and closes the event queue
            drop(sampling);
            result
        });

        info!("GestureSensor successfully started");
        Ok(Self { task, cancel })
    }

    /// Requests the loop to stop after the current sample.
    pub fn stop(&self) {
        debug!("Stop requested for GestureSensor");
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the sampling loop to end and returns its outcome.
    pub async fn join(self) -> Result<(), SensorError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(SensorError::Worker(e.to_string())),
        }
    }
}
