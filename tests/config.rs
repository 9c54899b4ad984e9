use dreamtap::config::{AppConfig, ConfigError, TimingConfig};
use dreamtap::gesture::GestureTiming;
use dreamtap::sensor::{Bias, LineLevel};
use std::time::Duration;

#[test]
fn defaults_match_reference_timing() {
    let config = AppConfig::default();
    assert_eq!(config.timing.to_timing().unwrap(), GestureTiming::default());
    assert_eq!(config.sink_timeout().unwrap(), Duration::from_secs(2));
    assert_eq!(config.sensor.active_level, LineLevel::High);
    assert_eq!(config.sensor.bias, Bias::PullUp);
    assert_eq!(
        config.sink.endpoints.get("single_tap").map(String::as_str),
        Some("/api/gpio_single_tap")
    );
}

#[test]
fn empty_file_is_all_defaults() {
    assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
}

#[test]
fn partial_file_overrides_only_given_fields() {
    let config = AppConfig::from_toml(
        r#"
        [sensor]
        pin = 27
        startup_delay_secs = 0.0
        active_level = "low"
        bias = "off"

        [timing]
        long_tap_secs = 2.5

        [sink]
        base_url = "http://dream.local:8080"

        [sink.endpoints]
        double_tap = "/hooks/double"
        "#,
    )
    .unwrap();

    assert_eq!(config.sensor.pin, 27);
    assert_eq!(config.sensor.active_level, LineLevel::Low);
    assert_eq!(config.sensor.bias, Bias::Off);
    assert_eq!(config.startup_delay().unwrap(), Duration::ZERO);

    let timing = config.timing.to_timing().unwrap();
    assert_eq!(timing.long_tap, Duration::from_millis(2500));
    assert_eq!(timing.double_tap_window, Duration::from_millis(800));

    assert_eq!(config.sink.base_url, "http://dream.local:8080");
    assert_eq!(config.sink.endpoints.len(), 1);
    assert_eq!(config.sink.endpoints["double_tap"], "/hooks/double");

    let settings = config.sensor_settings().unwrap();
    assert!(settings.polarity.is_pressed(LineLevel::Low));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let result = AppConfig::from_toml("[sensor]\npin = \"seventeen\"\n");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn unknown_polarity_is_a_parse_error() {
    let result = AppConfig::from_toml("[sensor]\nactive_level = \"sideways\"\n");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn non_positive_durations_are_rejected() {
    for timing in [
        TimingConfig {
            debounce_secs: 0.0,
            ..TimingConfig::default()
        },
        TimingConfig {
            long_tap_secs: -1.0,
            ..TimingConfig::default()
        },
        TimingConfig {
            double_tap_window_secs: f64::NAN,
            ..TimingConfig::default()
        },
    ] {
        assert!(
            matches!(timing.to_timing(), Err(ConfigError::InvalidValue { .. })),
            "{:?}",
            timing
        );
    }
}

#[test]
fn negative_startup_delay_is_rejected() {
    let config = AppConfig::from_toml("[sensor]\nstartup_delay_secs = -2.0\n").unwrap();
    assert!(matches!(
        config.startup_delay(),
        Err(ConfigError::InvalidValue { .. })
    ));
}

#[test]
fn poll_interval_must_be_below_debounce() {
    let timing = TimingConfig {
        poll_interval_secs: 0.05,
        ..TimingConfig::default()
    };
    assert!(matches!(
        timing.to_timing(),
        Err(ConfigError::InvalidValue {
            field: "timing.poll_interval_secs",
            ..
        })
    ));
}

#[test]
fn debounce_must_be_below_double_tap_window() {
    let timing = TimingConfig {
        debounce_secs: 1.0,
        poll_interval_secs: 0.01,
        ..TimingConfig::default()
    };
    assert!(matches!(
        timing.to_timing(),
        Err(ConfigError::InvalidValue {
            field: "timing.debounce_secs",
            ..
        })
    ));
}

#[test]
fn long_tap_beyond_correlation_window_widens_it() {
    let timing = TimingConfig {
        long_tap_secs: 5.0,
        ..TimingConfig::default()
    }
    .to_timing()
    .unwrap();
    assert_eq!(timing.correlation_window, Duration::from_secs(5));
}

#[tokio::test]
async fn missing_file_falls_back_to_defaults() {
    let path = std::env::temp_dir().join("dreamtap-test-does-not-exist/config.toml");
    let config = AppConfig::load(&path).await.unwrap();
    assert_eq!(config, AppConfig::default());
}

#[tokio::test]
async fn file_on_disk_is_loaded() {
    let dir = std::env::temp_dir().join(format!("dreamtap-config-{}", std::process::id()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let path = dir.join("config.toml");
    tokio::fs::write(&path, "[sensor]\npin = 4\n").await.unwrap();

    let config = AppConfig::load(&path).await.unwrap();
    assert_eq!(config.sensor.pin, 4);

    tokio::fs::remove_dir_all(&dir).await.ok();
}
