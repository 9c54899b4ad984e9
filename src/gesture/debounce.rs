use std::time::{Duration, Instant};

/// Outcome of the debounce test for one raw sample
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

/// Decides whether a sampled level is a real transition.
///
/// A sample is accepted only if it differs from the last accepted level and at
/// least `debounce` has passed since the last accepted transition. Before the
/// first transition (`last_transition_at == None`) any change is accepted.
pub fn decide(
    previous: bool,
    sampled: bool,
    last_transition_at: Option<Instant>,
    now: Instant,
    debounce: Duration,
) -> Decision {
    if previous == sampled {
        return Decision::Reject;
    }

    match last_transition_at {
        None => Decision::Accept,
        Some(at) if now.saturating_duration_since(at) >= debounce => Decision::Accept,
        Some(_) => Decision::Reject,
    }
}
