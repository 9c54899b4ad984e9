//! dreamtap - physical button interpreter for the Dream Recorder
//!
//! Samples a single GPIO input line, removes contact bounce and classifies the
//! resulting press/release sequence into one of three gestures. Each gesture is
//! posted exactly once to an HTTP endpoint chosen by gesture name.
//!
//! # Architecture
//!
//! ```text
//! GPIO line ──► GestureSensor ──► [mpsc] ──► Dispatcher ──► HTTP endpoint
//!              (debounce +                   (POST, 2s timeout,
//!               classifier)                   log and swallow)
//! ```
//!
//! The sampling loop runs on its own blocking worker and never waits on the
//! network. Delivery failures are logged and dropped.

pub mod config;
pub mod dispatch;
pub mod gesture;
pub mod sensor;
