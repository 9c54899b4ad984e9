use dreamtap::gesture::{Edge, EdgeOutcome, Gesture, GestureTiming, TapClassifier};
use std::time::{Duration, Instant};

const POLL_MS: u64 = 10;

// Samples the line every 10ms from t=0 to `until_ms` (inclusive). `presses`
// are [start, end) intervals in ms during which the line reads pressed.
fn drive(classifier: &mut TapClassifier, presses: &[(u64, u64)], until_ms: u64) -> Vec<(u64, Gesture)> {
    let t0 = Instant::now();
    let mut fired = Vec::new();
    let mut t = 0;
    while t <= until_ms {
        let pressed = presses.iter().any(|&(start, end)| start <= t && t < end);
        let observation = classifier.observe(pressed, t0 + Duration::from_millis(t));
        if let Some(gesture) = observation.gesture {
            fired.push((t, gesture));
        }
        t += POLL_MS;
    }
    fired
}

fn classify(presses: &[(u64, u64)], until_ms: u64) -> Vec<(u64, Gesture)> {
    let mut classifier = TapClassifier::new(GestureTiming::default());
    drive(&mut classifier, presses, until_ms)
}

#[test]
fn scenario_a_two_quick_presses_make_one_double_tap() {
    let fired = classify(&[(0, 100), (300, 400)], 3000);
    assert_eq!(fired, vec![(300, Gesture::DoubleTap)]);
}

#[test]
fn scenario_b_held_press_makes_one_long_tap_at_threshold() {
    let fired = classify(&[(0, 3200)], 5000);
    assert_eq!(fired, vec![(3000, Gesture::LongTap)]);
}

#[test]
fn scenario_c_short_press_makes_single_tap_after_window() {
    let fired = classify(&[(0, 200)], 3000);
    // First sample strictly past the 800ms window
    assert_eq!(fired, vec![(810, Gesture::SingleTap)]);
}

#[test]
fn scenario_d_release_after_long_tap_is_inert() {
    let mut classifier = TapClassifier::new(GestureTiming::default());
    let fired = drive(&mut classifier, &[(0, 3500)], 6000);
    assert_eq!(fired, vec![(3000, Gesture::LongTap)]);
    assert!(classifier.state().is_idle());
}

#[test]
fn double_tap_for_every_gap_inside_window() {
    for gap in (100..800).step_by(10) {
        let release = (gap / 2 / POLL_MS) * POLL_MS;
        let fired = classify(&[(0, release), (gap, gap + 60)], 4000);
        assert_eq!(fired, vec![(gap, Gesture::DoubleTap)], "gap {}ms", gap);
    }
}

#[test]
fn presses_further_apart_than_window_are_two_single_taps() {
    let fired = classify(&[(0, 100), (1500, 1600)], 4000);
    assert_eq!(
        fired,
        vec![(810, Gesture::SingleTap), (2310, Gesture::SingleTap)]
    );
}

#[test]
fn second_press_on_window_boundary_resolves_first_as_single_tap() {
    let fired = classify(&[(0, 100), (800, 900)], 4000);
    assert_eq!(
        fired,
        vec![(800, Gesture::SingleTap), (1610, Gesture::SingleTap)]
    );
}

#[test]
fn long_tap_fires_regardless_of_release_time() {
    for release in [3010, 3500, 4200, 6000] {
        let fired = classify(&[(0, release)], 8000);
        assert_eq!(fired, vec![(3000, Gesture::LongTap)], "release {}", release);
    }
}

#[test]
fn release_on_the_long_tap_sample_is_still_a_single_tap() {
    // Last sample reading pressed is at 2990
    let fired = classify(&[(0, 3000)], 5000);
    assert_eq!(fired, vec![(3000, Gesture::SingleTap)]);
}

#[test]
fn press_released_between_window_and_long_tap_is_single_tap_on_release() {
    let fired = classify(&[(0, 2000)], 5000);
    assert_eq!(fired, vec![(2000, Gesture::SingleTap)]);
}

#[test]
fn third_quick_press_starts_a_fresh_sequence() {
    let fired = classify(&[(0, 100), (300, 400), (600, 700)], 4000);
    assert_eq!(
        fired,
        vec![(300, Gesture::DoubleTap), (1410, Gesture::SingleTap)]
    );
}

#[test]
fn four_quick_presses_make_two_double_taps() {
    let fired = classify(&[(0, 100), (300, 400), (600, 700), (900, 1000)], 4000);
    assert_eq!(
        fired,
        vec![(300, Gesture::DoubleTap), (900, Gesture::DoubleTap)]
    );
}

#[test]
fn holding_second_press_of_double_tap_does_not_make_long_tap() {
    let fired = classify(&[(0, 100), (300, 5000)], 7000);
    assert_eq!(fired, vec![(300, Gesture::DoubleTap)]);
}

#[test]
fn single_tap_followed_by_held_press_is_single_then_long() {
    let fired = classify(&[(0, 100), (900, 4500)], 7000);
    assert_eq!(
        fired,
        vec![(810, Gesture::SingleTap), (3900, Gesture::LongTap)]
    );
}

#[test]
fn state_returns_to_idle_after_each_gesture() {
    for presses in [
        vec![(0, 100)],
        vec![(0, 100), (300, 400)],
        vec![(0, 3500)],
        vec![(0, 100), (300, 4000)],
    ] {
        let mut classifier = TapClassifier::new(GestureTiming::default());
        let fired = drive(&mut classifier, &presses, 8000);
        assert_eq!(fired.len(), 1, "presses {:?}", presses);
        assert!(classifier.state().is_idle(), "presses {:?}", presses);
        assert!(!classifier.state().last_level());
    }
}

#[test]
fn bounces_are_rejected_without_state_change() {
    let mut classifier = TapClassifier::new(GestureTiming::default());
    let t0 = Instant::now();
    let at = |ms: u64| t0 + Duration::from_millis(ms);

    let first = classifier.observe(true, at(0));
    assert_eq!(first.edge, EdgeOutcome::Accepted(Edge::Press));
    let before = classifier.state().clone();

    // Contact chatter inside the 50ms debounce time
    for (ms, level) in [(5, false), (12, true), (20, false), (31, true), (44, false)] {
        let observation = classifier.observe(level, at(ms));
        let expected = if level { EdgeOutcome::Steady } else { EdgeOutcome::Bounced };
        assert_eq!(observation.edge, expected, "sample at {}ms", ms);
        assert_eq!(observation.gesture, None);
        assert_eq!(classifier.state(), &before);
    }

    let release = classifier.observe(false, at(50));
    assert_eq!(release.edge, EdgeOutcome::Accepted(Edge::Release));
}

#[test]
fn accepted_transitions_are_at_least_debounce_apart() {
    let mut classifier = TapClassifier::new(GestureTiming::default());
    let t0 = Instant::now();
    let debounce = classifier.timing().debounce;

    // Toggle every 7ms for two seconds
    let mut accepted = Vec::new();
    for step in 0..300u64 {
        let now = t0 + Duration::from_millis(step * 7);
        let observation = classifier.observe(step % 2 == 0, now);
        if let EdgeOutcome::Accepted(_) = observation.edge {
            accepted.push(now);
        }
    }

    assert!(accepted.len() > 2);
    for pair in accepted.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= debounce);
    }
}

#[test]
fn configured_long_tap_threshold_is_used() {
    let timing = GestureTiming {
        long_tap: Duration::from_millis(1500),
        ..GestureTiming::default()
    };
    let mut classifier = TapClassifier::new(timing);
    let fired = drive(&mut classifier, &[(0, 2000)], 4000);
    assert_eq!(fired, vec![(1500, Gesture::LongTap)]);
}
