use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use dreamtap::config::AppConfig;
use dreamtap::dispatch::{DispatchHandle, EventSink};
use dreamtap::sensor::{GpioLine, SensorHandle, EVENT_QUEUE_CAPACITY};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

// Upper bound for in-flight deliveries after the sensor stopped
const DISPATCH_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Button gesture sensor for the Dream Recorder
#[derive(Debug, Parser)]
#[command(name = "dreamtap", version)]
struct Cli {
    /// Enable debug-level diagnostics
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup(cli.debug)?;

    let config_path = AppConfig::default_path()?;
    let config = AppConfig::load(&config_path).await?;
    let settings = config.sensor_settings()?;
    let startup_delay = config.startup_delay()?;

    let cancel = CancellationToken::new();
    spawn_interrupt_watcher(cancel.clone());

    info!("Waiting {:.1}s for startup...", startup_delay.as_secs_f64());
    tokio::select! {
        _ = tokio::time::sleep(startup_delay) => {}
        _ = cancel.cancelled() => {
            info!("Stopped");
            return Ok(());
        }
    }

    let sink = EventSink::from_config(&config.sink, config.sink_timeout()?)
        .map_err(|e| eyre!("Failed to create event sink: {}", e))?;
    let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let dispatcher = DispatchHandle::spawn(sink, event_rx);

    // Without the line there is nothing to classify
    let line = GpioLine::open(config.sensor.pin, config.sensor.bias)
        .map_err(|e| eyre!("Failed to initialize GPIO: {}", e))?;

    let sensor = SensorHandle::spawn(Box::new(line), settings, event_tx, cancel.clone())
        .map_err(|e| eyre!("Failed to start gesture sensor: {}", e))?;

    let outcome = sensor.join().await;
    cancel.cancel();

    if tokio::time::timeout(DISPATCH_DRAIN_TIMEOUT, dispatcher.join())
        .await
        .is_err()
    {
        warn!("Dispatcher did not drain in time, pending events are lost");
    }

    outcome.map_err(|e| eyre!("Gesture sensor failed: {}", e))?;
    info!("Stopped");
    Ok(())
}

fn spawn_interrupt_watcher(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => {
                        info!("Interrupt received, shutting down");
                        cancel.cancel();
                    }
                    Err(e) => error!("Failed to listen for interrupt: {}", e),
                }
            }
            _ = cancel.cancelled() => {}
        }
    });
}

fn setup(debug: bool) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env(if debug { Level::DEBUG } else { Level::INFO });
    Ok(())
}

fn setup_logging_env(level: Level) {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
