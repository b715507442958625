//! Integration test: command protocol round trips.
//!
//! Every accepted line gets exactly one reply line, errors echo the
//! offending line, and accepted moves land on the expected step targets.

use scara_common::hal::Axis;

use super::Bench;

#[test]
fn absolute_move_targets_steps_and_acks() {
    let mut bench = Bench::new();
    assert_eq!(bench.send("X:50,50,0,30"), vec!["OK"]);

    let units = *bench.ctl.motion().units();
    assert_eq!(bench.ctl.axis(Axis::X).target(), units.to_steps(50.0));
    assert_eq!(bench.ctl.axis(Axis::Y).target(), units.to_steps(50.0));
    assert_eq!(bench.ctl.axis(Axis::Z).target(), 0);
    // speed 30 of 1000 steps/s
    assert_eq!(bench.ctl.axis(Axis::X).max_speed(), 300.0);

    bench.run_until_idle(10_000);
    assert_eq!(bench.hal.position(Axis::X), 500);
    assert_eq!(bench.hal.position(Axis::Y), 500);
    assert_eq!(bench.hal.position(Axis::Z), 0);
    assert_eq!(bench.replies(), vec!["OK"]);
}

#[test]
fn out_of_range_gripper_is_rejected_without_effect() {
    let mut bench = Bench::new();
    assert_eq!(
        bench.send("G:200"),
        vec!["ERROR:gripper angle outside 0-180:G:200"]
    );
    assert_eq!(bench.ctl.state().grip, 0.0);
    assert_eq!(bench.hal.gripper(), Some(0.0));

    assert_eq!(bench.send("G:120"), vec!["OK"]);
    assert_eq!(bench.hal.gripper(), Some(120.0));
}

#[test]
fn one_reply_per_line() {
    let mut bench = Bench::new();
    let lines = ["S:50", "A:20", "G:30", "T", "?", "Y:5", "Q", "S:101", "K:1", "X:1,2"];
    for line in lines {
        let replies = bench.send(line);
        // T answers with a STATUS line, which `send` filters out.
        let expected = usize::from(line != "T");
        assert_eq!(replies.len(), expected, "line {line:?} gave {replies:?}");
    }
}

#[test]
fn error_lines_echo_the_request() {
    let mut bench = Bench::new();
    assert_eq!(bench.send("Q:1"), vec!["ERROR:unknown command:Q:1"]);
    assert_eq!(bench.send("S:101"), vec!["ERROR:speed outside 0-100:S:101"]);
    assert_eq!(bench.send("X:1,2"), vec!["ERROR:expected 4 parameters, got 2:X:1,2"]);
    assert_eq!(bench.send("Z:-5"), vec!["ERROR:target outside workspace:Z:-5"]);
    assert_eq!(bench.send("X:500,0,0,50"), vec!["ERROR:target outside workspace:X:500,0,0,50"]);
    assert_eq!(bench.send("T:1"), vec!["ERROR:command takes no parameters:T:1"]);
}

#[test]
fn help_lists_every_verb() {
    let mut bench = Bench::new();
    let replies = bench.send("?");
    assert_eq!(replies.len(), 1);
    let help = replies[0].strip_prefix("HELP:").expect("help prefix");
    for verb in ['X', 'Y', 'Z', 'G', 'H', 'S', 'A', 'T', 'E', 'K', 'C', 'V', 'O', 'R'] {
        assert!(help.contains(verb), "help misses {verb}: {help}");
    }
}

#[test]
fn overlong_line_is_reported_once() {
    let mut bench = Bench::new();
    let mut bytes = vec![b'Y'; 200];
    bytes.push(b'\n');
    bench.feed(&bytes);
    bench.feed(b"T\n");
    assert_eq!(bench.ctl.queued_lines(), 2);

    bench.tick();
    let replies = bench.replies();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("ERROR:line too long:"));

    // The next line is parsed normally.
    bench.tick();
    assert_eq!(bench.status_lines(), 1);
}

#[test]
fn relative_moves_accumulate_in_status() {
    let mut bench = Bench::new();
    assert_eq!(bench.send("Y:20"), vec!["OK"]);
    assert_eq!(bench.send("Z:10"), vec!["OK"]);
    bench.run_until_idle(10_000);

    bench.feed(b"T\n");
    let start = bench.out.len();
    bench.tick();
    // The reply precedes any telemetry line of the same tick.
    assert_eq!(bench.out[start].to_string(), "STATUS:0.00,20.00,10.00,0.0,100");
    assert_eq!(bench.hal.position(Axis::Y), 200);
    assert_eq!(bench.hal.position(Axis::Z), 100);
}

#[test]
fn home_returns_to_origin() {
    let mut bench = Bench::new();
    bench.send("X:-30,40,20,100");
    bench.run_until_idle(10_000);
    assert_eq!(bench.hal.position(Axis::X), -300);

    assert_eq!(bench.send("H"), vec!["OK"]);
    bench.run_until_idle(10_000);
    for axis in Axis::ALL {
        assert_eq!(bench.hal.position(axis), 0);
        assert_eq!(bench.ctl.state().position(axis), 0.0);
    }
}
