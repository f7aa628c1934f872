//! Interval planner and configuration tests.

use std::time::Duration;

use stillpick::planner::{self, DEFAULT_DURATION, MIN_INTERVAL, Planner, effective_duration};
use stillpick::SamplingOptions;

// ── Interval ───────────────────────────────────────────────────────

#[test]
fn target_count_spreads_frames_over_the_video() {
    let plan = planner::plan(Duration::from_secs(10), None, 30, 600);
    assert_eq!(plan.interval, Duration::from_micros(333_334));
    assert_eq!(plan.start_offset, Duration::from_millis(100));
    assert_eq!(plan.implied_frame_count(Duration::from_secs(10)), 30);
}

#[test]
fn short_videos_respect_minimum_spacing() {
    let plan = planner::plan(Duration::from_secs(1), None, 30, 600);
    assert_eq!(plan.interval, Duration::from_millis(50));
    assert_eq!(plan.implied_frame_count(Duration::from_secs(1)), 18);
}

#[test]
fn desired_rate_wins_when_within_the_ceiling() {
    let plan = planner::plan(Duration::from_secs(60), Some(4.0), 30, 600);
    assert_eq!(plan.interval, Duration::from_millis(250));
}

#[test]
fn hard_ceiling_caps_a_high_rate() {
    let duration = Duration::from_secs(3600);
    let plan = planner::plan(duration, Some(30.0), 30, 600);

    assert_eq!(plan.interval, Duration::from_secs(6));
    assert!(plan.implied_frame_count(duration) <= 600);
}

#[test]
fn unusable_rates_fall_back_to_target_count() {
    let duration = Duration::from_secs(10);
    let expected = planner::plan(duration, None, 30, 600);
    for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert_eq!(planner::plan(duration, Some(rate), 30, 600), expected, "{rate}");
    }
}

#[test]
fn target_count_is_capped_by_the_ceiling() {
    let duration = Duration::from_secs(100);
    let plan = planner::plan(duration, None, 1_000, 40);
    assert!(plan.implied_frame_count(duration) <= 40);
}

#[test]
fn zero_budgets_are_treated_as_one() {
    let duration = Duration::from_secs(5);
    let plan = planner::plan(duration, None, 0, 0);
    assert_eq!(plan.implied_frame_count(duration), 1);
}

#[test]
fn interval_is_never_zero() {
    let plan = Planner {
        min_spacing: Duration::ZERO,
        lead_in: Duration::ZERO,
    }
    .plan(Duration::from_micros(10), None, 600, 600);
    assert!(plan.interval >= MIN_INTERVAL);
}

#[test]
fn ceiling_holds_across_durations_and_rates() {
    for seconds in [0.2, 1.0, 7.5, 90.0, 7_200.0] {
        let duration = Duration::from_secs_f64(seconds);
        for rate in [None, Some(0.5), Some(24.0), Some(240.0)] {
            let plan = planner::plan(duration, rate, 30, 600);
            assert!(plan.interval > Duration::ZERO);
            assert!(
                plan.implied_frame_count(duration) <= 600,
                "{seconds}s at {rate:?}"
            );
        }
    }
}

// ── Start offset ───────────────────────────────────────────────────

#[test]
fn lead_in_is_bounded_by_a_tenth_of_the_duration() {
    assert_eq!(
        planner::plan(Duration::from_secs(30), None, 30, 600).start_offset,
        Duration::from_millis(100)
    );
    assert_eq!(
        planner::plan(Duration::from_millis(200), None, 30, 600).start_offset,
        Duration::from_millis(20)
    );
}

#[test]
fn custom_lead_in() {
    let planner = Planner {
        lead_in: Duration::from_millis(250),
        ..Planner::default()
    };
    let plan = planner.plan(Duration::from_secs(10), None, 30, 600);
    assert_eq!(plan.start_offset, Duration::from_millis(250));
}

#[test]
fn offset_past_the_end_implies_no_frames() {
    let plan = planner::plan(Duration::from_secs(10), None, 30, 600);
    assert_eq!(plan.implied_frame_count(Duration::from_millis(50)), 0);
}

// ── Effective duration ─────────────────────────────────────────────

#[test]
fn effective_duration_passes_finite_values() {
    assert_eq!(effective_duration(Some(12.5)), Duration::from_millis(12_500));
}

#[test]
fn effective_duration_replaces_broken_values() {
    for reported in [
        None,
        Some(f64::INFINITY),
        Some(f64::NEG_INFINITY),
        Some(f64::NAN),
        Some(0.0),
        Some(-3.0),
        Some(1e300),
    ] {
        assert_eq!(effective_duration(reported), DEFAULT_DURATION, "{reported:?}");
    }
}

// ── Configuration ──────────────────────────────────────────────────

#[test]
fn default_options() {
    let options = SamplingOptions::default();
    assert_eq!(options.desired_rate(), None);
    assert_eq!(options.target_count(), 30);
    assert_eq!(options.hard_ceiling(), 600);
    assert_eq!(options.step_ceiling(), 600);
    assert!(options.default_selected());
}

#[test]
fn option_builders_clamp_budgets() {
    let options = SamplingOptions::new()
        .with_target_count(0)
        .with_hard_ceiling(0)
        .with_desired_rate(5.0);
    assert_eq!(options.target_count(), 1);
    assert_eq!(options.hard_ceiling(), 1);
    assert_eq!(options.desired_rate(), Some(5.0));
    assert_eq!(options.without_desired_rate().desired_rate(), None);
}
