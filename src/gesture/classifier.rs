//! Tap classifier - the press/release state machine
//!
//! Two triggers drive the machine:
//!
//! - an **accepted edge** from the debouncer (press or release)
//! - a **tick**, evaluated on every sample whether or not an edge occurred
//!
//! Single vs. double tap can only be decided once the double-tap window has
//! passed without a second press, and long vs. short only once the long-tap
//! threshold is crossed while still held. Both are therefore tick rules.
//!
//! ```text
//!            press (gap < window)                 hold >= long_tap
//!   Idle ──press──► Pressed ──────────► DoubleTap    Pressed ─────────► LongTap
//!                     │release
//!                     ▼                 no press for > window
//!                  Pending ────────────────────────────────────────────► SingleTap
//! ```
//!
//! Firing DoubleTap or LongTap clears the press-start buffer, which is what keeps
//! a trailing SingleTap from firing for the same contact.

use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, info};

use super::debounce::{self, Decision};
use super::{Gesture, GestureTiming};

/// Debounced edge of the line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Press,
    Release,
}

/// What the debouncer made of a sample
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// Sample equals the last accepted level
    Steady,
    /// Level change that passed the debounce test
    Accepted(Edge),
    /// Level change that came too early after the last transition
    Bounced,
}

/// Result of feeding one sample into the classifier
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Observation {
    pub edge: EdgeOutcome,
    pub gesture: Option<Gesture>,
}

/// Bookkeeping of the classifier, owned by the sampling loop
///
/// Created once at start with everything empty. Never persisted: a restart is
/// the same as releasing the button at time zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassifierState {
    last_level: bool,
    last_transition_at: Option<Instant>,
    press_start_at: Option<Instant>,
    recent_press_starts: VecDeque<Instant>,
    long_tap_fired: bool,
}

impl ClassifierState {
    /// Most recently debounced level, `true` meaning pressed
    pub fn last_level(&self) -> bool {
        self.last_level
    }

    pub fn last_transition_at(&self) -> Option<Instant> {
        self.last_transition_at
    }

    /// Start of the currently open press
    pub fn press_start_at(&self) -> Option<Instant> {
        self.press_start_at
    }

    pub fn recent_press_starts(&self) -> impl Iterator<Item = &Instant> {
        self.recent_press_starts.iter()
    }

    pub fn pending_presses(&self) -> usize {
        self.recent_press_starts.len()
    }

    pub fn long_tap_fired(&self) -> bool {
        self.long_tap_fired
    }

    /// True when no gesture is in flight.
    ///
    /// Compares against the initial state, ignoring the level and the time of the
    /// last transition.
    pub fn is_idle(&self) -> bool {
        self.press_start_at.is_none() && self.recent_press_starts.is_empty() && !self.long_tap_fired
    }
}

#[derive(Clone, Debug)]
pub struct TapClassifier {
    timing: GestureTiming,
    state: ClassifierState,
}

impl TapClassifier {
    pub fn new(timing: GestureTiming) -> Self {
        Self {
            timing,
            state: ClassifierState::default(),
        }
    }

    pub fn timing(&self) -> &GestureTiming {
        &self.timing
    }

    pub fn state(&self) -> &ClassifierState {
        &self.state
    }

    /// Feeds one sample taken at `now`. `pressed` is the level already mapped
    /// through the line polarity.
    ///
    /// Runs the debouncer, the edge transition if one was accepted and then the
    /// tick rules. At most one gesture comes out of a single call.
    pub fn observe(&mut self, pressed: bool, now: Instant) -> Observation {
        let decision = debounce::decide(
            self.state.last_level,
            pressed,
            self.state.last_transition_at,
            now,
            self.timing.debounce,
        );

        let edge = match decision {
            Decision::Accept => {
                self.state.last_level = pressed;
                self.state.last_transition_at = Some(now);
                EdgeOutcome::Accepted(if pressed { Edge::Press } else { Edge::Release })
            }
            Decision::Reject if pressed != self.state.last_level => EdgeOutcome::Bounced,
            Decision::Reject => EdgeOutcome::Steady,
        };

        let from_edge = match edge {
            EdgeOutcome::Accepted(Edge::Press) => self.on_press(now),
            EdgeOutcome::Accepted(Edge::Release) => {
                self.on_release(now);
                None
            }
            EdgeOutcome::Steady | EdgeOutcome::Bounced => None,
        };

        let gesture = match from_edge {
            Some(gesture) => Some(gesture),
            None => self.tick(now),
        };

        Observation { edge, gesture }
    }

    /// Rising edge: opens a press and checks it against the previous press start.
    ///
    /// A previous start closer than the double-tap window makes a double tap. A
    /// previous start still pending beyond the window is resolved as a single
    /// tap, and the new press starts a fresh sequence.
    pub fn on_press(&mut self, now: Instant) -> Option<Gesture> {
        debug!("PRESS accepted");
        self.state.press_start_at = Some(now);
        self.state.long_tap_fired = false;

        self.state.recent_press_starts.push_back(now);
        self.prune(now);

        let len = self.state.recent_press_starts.len();
        if len < 2 {
            return None;
        }

        let gap = self.state.recent_press_starts[len - 1]
            .saturating_duration_since(self.state.recent_press_starts[len - 2]);
        debug!("Gap between presses: {:.3}s", gap.as_secs_f64());

        if gap < self.timing.double_tap_window {
            info!("DOUBLE TAP detected");
            // The second contact is consumed even though the line may still read pressed
            self.state.recent_press_starts.clear();
            self.state.press_start_at = None;
            return Some(Gesture::DoubleTap);
        }

        // The earlier press is outside the window but the tick has not resolved it
        // yet (second press sampled on the window boundary)
        info!("SINGLE TAP detected");
        self.state.recent_press_starts.drain(..len - 1);
        Some(Gesture::SingleTap)
    }

    /// Falling edge: closes the open press. Never emits; a single tap is only
    /// resolved by the tick once the double-tap window has passed.
    pub fn on_release(&mut self, now: Instant) {
        match self.state.press_start_at.take() {
            Some(start) => {
                let duration = now.saturating_duration_since(start);
                debug!("RELEASE accepted, duration: {:.3}s", duration.as_secs_f64());
            }
            None => debug!("RELEASE accepted for an already consumed press"),
        }
        self.state.long_tap_fired = false;
    }

    /// Time-driven rules, evaluated on every sample.
    pub fn tick(&mut self, now: Instant) -> Option<Gesture> {
        self.prune(now);

        if let Some(start) = self.state.press_start_at {
            if !self.state.long_tap_fired
                && now.saturating_duration_since(start) >= self.timing.long_tap
            {
                info!("LONG TAP detected");
                self.state.long_tap_fired = true;
                self.state.recent_press_starts.clear();
                return Some(Gesture::LongTap);
            }
        }

        if self.state.recent_press_starts.len() == 1
            && self.state.press_start_at.is_none()
            && !self.state.long_tap_fired
        {
            let since_press = now.saturating_duration_since(self.state.recent_press_starts[0]);
            if since_press > self.timing.double_tap_window {
                info!("SINGLE TAP detected");
                self.state.recent_press_starts.clear();
                return Some(Gesture::SingleTap);
            }
        }

        None
    }

    // Drops press starts older than the correlation window
    fn prune(&mut self, now: Instant) {
        let window = self.timing.correlation_window;
        self.state
            .recent_press_starts
            .retain(|start| now.saturating_duration_since(*start) <= window);
    }
}
