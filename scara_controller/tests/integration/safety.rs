//! Integration test: interlock trip, latch and reset.
//!
//! Validates the full safety lifecycle:
//! 1. Sensor or `E` → halt within the same tick, notification once
//! 2. Latched: motion refused, queries and settings still answered
//! 3. `R` refused while a sensor is asserted, accepted once clear

use scara_common::config::WorkspaceBounds;
use scara_common::consts::MAX_QUEUED_LINES;
use scara_common::hal::{Axis, LimitSwitches};
use scara_common::units::UnitConverter;
use scara_controller::hal::SimulatedHal;
use scara_controller::safety::InterlockState;

use super::{bench_config, Bench};

// ── Helpers ─────────────────────────────────────────────────────────

/// Tick once and return the lines that tick produced.
fn tick_lines(bench: &mut Bench) -> Vec<String> {
    let start = bench.out.len();
    bench.tick();
    bench.out[start..]
        .iter()
        .filter(|r| !r.is_status())
        .map(ToString::to_string)
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn limit_trip_mid_pick_halts_within_one_tick() {
    let mut bench = Bench::new();
    assert!(bench.send("K:20,20").is_empty());
    for _ in 0..200 {
        bench.tick();
    }
    assert!(bench.ctl.sequencer().is_busy());
    assert!(bench.ctl.motion().any_active());

    bench.hal.set_limits(LimitSwitches::X_MAX);
    let steps = bench.hal.step_count();
    assert_eq!(
        tick_lines(&mut bench),
        vec!["LIMIT_SWITCH_TRIGGERED", "ERROR:sequence aborted:K:20,20"]
    );
    assert_eq!(bench.hal.step_count(), steps);
    assert_eq!(bench.ctl.interlock(), InterlockState::Halted);
    assert!(bench.ctl.state().emergency_stop);
    assert!(!bench.ctl.sequencer().is_busy());
    assert!(!bench.ctl.motion().any_active());

    // Still asserted: no further notifications, no further steps.
    for _ in 0..100 {
        assert!(tick_lines(&mut bench).is_empty());
    }
    assert_eq!(bench.hal.step_count(), steps);
}

#[test]
fn halted_position_matches_the_steps_taken() {
    let mut bench = Bench::new();
    bench.send("Y:50");
    for _ in 0..150 {
        bench.tick();
    }
    bench.hal.set_limits(LimitSwitches::Y_MAX);
    bench.tick();

    let stopped = bench.hal.position(Axis::Y);
    assert!(stopped > 0 && stopped < 500);
    assert_eq!(bench.ctl.state().y, stopped as f64 / 10.0);
}

#[test]
fn reset_refused_until_sensor_clears() {
    let mut bench = Bench::new();
    bench.send("Y:30");
    bench.tick();
    bench.hal.set_limits(LimitSwitches::Y_MAX);
    assert_eq!(tick_lines(&mut bench), vec!["LIMIT_SWITCH_TRIGGERED"]);

    assert_eq!(bench.send("R"), vec!["ERROR:interlock still asserted:R"]);
    assert_eq!(bench.send("Y:-5"), vec!["ERROR:emergency stop latched:Y:-5"]);

    bench.hal.set_limits(LimitSwitches::empty());
    assert_eq!(bench.send("R"), vec!["OK"]);
    assert_eq!(bench.ctl.interlock(), InterlockState::Ready);
    assert!(!bench.ctl.state().emergency_stop);

    let steps = bench.hal.step_count();
    assert_eq!(bench.send("Y:-5"), vec!["OK"]);
    bench.run_until_idle(10_000);
    assert!(bench.hal.step_count() > steps);
    assert_eq!(bench.replies().last().map(String::as_str), Some("OK"));
}

#[test]
fn emergency_stop_command_latches() {
    let mut bench = Bench::new();
    assert_eq!(bench.send("E"), vec!["EMERGENCY_STOP"]);
    assert_eq!(
        bench.send("X:0,0,0,50"),
        vec!["ERROR:emergency stop latched:X:0,0,0,50"]
    );
    assert_eq!(bench.send("G:10"), vec!["ERROR:emergency stop latched:G:10"]);
    assert_eq!(bench.send("C:10,10"), vec!["ERROR:emergency stop latched:C:10,10"]);

    // Non-motion commands still work.
    let before = bench.status_lines();
    assert!(bench.send("T").is_empty());
    assert_eq!(bench.status_lines(), before + 1);
    assert_eq!(bench.send("S:10"), vec!["OK"]);
    assert_eq!(bench.send("O:cup,10,10"), vec!["OK"]);

    assert_eq!(bench.send("R"), vec!["OK"]);
    assert_eq!(bench.send("G:10"), vec!["OK"]);
}

#[test]
fn emergency_stop_aborts_composite_move() {
    let mut bench = Bench::new();
    assert!(bench.send("C:10,10").is_empty());
    for _ in 0..50 {
        bench.tick();
    }
    assert_eq!(
        bench.send("E"),
        vec!["EMERGENCY_STOP", "ERROR:sequence aborted:C:10,10"]
    );
    assert!(!bench.ctl.sequencer().is_busy());
}

#[test]
fn stop_at_end_of_flood_halts_next_tick() {
    let mut bench = Bench::new();
    let mut burst = b"Y:100\n".to_vec();
    burst.extend_from_slice(&b"T\n".repeat(5_000));
    burst.extend_from_slice(b"E\n");
    bench.feed(&burst);

    let refused = bench.replies();
    assert_eq!(refused.len(), 5_000 - (MAX_QUEUED_LINES - 1));
    assert!(refused.iter().all(|r| r == "ERROR:input overflow:T"));

    assert_eq!(tick_lines(&mut bench), vec!["EMERGENCY_STOP"]);
    assert!(bench.ctl.state().emergency_stop);
    assert_eq!(bench.hal.step_count(), 0);

    // The queued move is still answered, and refused by the latch.
    assert_eq!(
        tick_lines(&mut bench),
        vec!["ERROR:emergency stop latched:Y:100"]
    );
    bench.run_until_idle(100);
    assert!(bench.status_lines() >= MAX_QUEUED_LINES - 1);
    assert_eq!(bench.hal.step_count(), 0);
}

#[test]
fn stop_input_wins_over_limits() {
    let mut bench = Bench::new();
    bench.hal.set_estop(true);
    bench.hal.set_limits(LimitSwitches::Z_MIN);
    assert_eq!(tick_lines(&mut bench), vec!["EMERGENCY_STOP"]);
    assert!(tick_lines(&mut bench).is_empty());
}

#[test]
fn simulated_travel_end_trips_limit() {
    let config = bench_config();
    let travel = WorkspaceBounds {
        x_max: 5.0,
        ..WorkspaceBounds::default()
    };
    let mut bench = Bench::with_config(&config);
    bench.hal = SimulatedHal::new().with_travel(&travel, &UnitConverter::new(&config.mechanics));

    assert_eq!(bench.send("X:10,0,0,100"), vec!["OK"]);
    let mut notified = Vec::new();
    for _ in 0..2000 {
        notified.extend(tick_lines(&mut bench));
        if bench.ctl.state().emergency_stop {
            break;
        }
    }
    assert_eq!(notified, vec!["LIMIT_SWITCH_TRIGGERED"]);
    // One step past the switch, then nothing.
    assert_eq!(bench.hal.position(Axis::X), 51);
    assert_eq!(bench.ctl.state().x, 5.1);

    // The switch is momentary, so the latch can be cleared.
    assert_eq!(bench.send("R"), vec!["OK"]);
    assert_eq!(bench.send("X:0,0,0,100"), vec!["OK"]);
    bench.run_until_idle(10_000);
    assert_eq!(bench.hal.position(Axis::X), 0);
}
