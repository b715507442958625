//! Integration test: composite pick / place / vision-pick sequences.

use scara_common::hal::Axis;

use super::Bench;

#[test]
fn pick_completes_with_single_ok() {
    let mut bench = Bench::new();
    assert!(bench.send("K:20,-10").is_empty());
    assert!(bench.ctl.sequencer().is_busy());

    bench.run_until_idle(20_000);
    assert_eq!(bench.replies(), vec!["OK"]);
    assert_eq!(bench.hal.position(Axis::X), 200);
    assert_eq!(bench.hal.position(Axis::Y), -100);
    // Lifted back to the safe height.
    assert_eq!(bench.hal.position(Axis::Z), 500);
    assert_eq!(bench.hal.gripper(), Some(10.0));
    assert_eq!(bench.ctl.state().grip, 10.0);
    assert_eq!(bench.ctl.state().z, 50.0);
}

#[test]
fn place_opens_the_gripper() {
    let mut bench = Bench::new();
    assert!(bench.send("C:-15,5").is_empty());
    bench.run_until_idle(20_000);
    assert_eq!(bench.replies(), vec!["OK"]);
    assert_eq!(bench.hal.gripper(), Some(90.0));
}

#[test]
fn gripper_closes_only_at_the_surface() {
    let mut bench = Bench::new();
    bench.send("K:10,10");
    let mut closed_at = None;
    for _ in 0..20_000 {
        bench.tick();
        if closed_at.is_none() && bench.hal.gripper() == Some(10.0) {
            closed_at = Some([
                bench.hal.position(Axis::X),
                bench.hal.position(Axis::Y),
                bench.hal.position(Axis::Z),
            ]);
        }
        if bench.ctl.is_idle() {
            break;
        }
    }
    assert_eq!(closed_at, Some([100, 100, 0]));
}

#[test]
fn motion_refused_while_sequence_runs() {
    let mut bench = Bench::new();
    bench.send("K:10,10");
    assert_eq!(bench.send("Y:5"), vec!["ERROR:busy:Y:5"]);
    assert_eq!(bench.send("G:45"), vec!["ERROR:busy:G:45"]);
    assert_eq!(bench.send("C:0,0"), vec!["ERROR:busy:C:0,0"]);
    assert_eq!(bench.send("S:50"), vec!["OK"]);

    bench.run_until_idle(20_000);
    assert_eq!(bench.send("Y:5"), vec!["OK"]);
}

#[test]
fn absolute_move_acks_at_once_and_blocks_until_done() {
    let mut bench = Bench::new();
    assert_eq!(bench.send("X:10,10,10,50"), vec!["OK"]);
    assert_eq!(bench.send("X:0,0,0,50"), vec!["ERROR:busy:X:0,0,0,50"]);
    bench.run_until_idle(10_000);
    assert_eq!(bench.send("X:0,0,0,50"), vec!["OK"]);
}

#[test]
fn vision_pick_uses_reported_object() {
    let mut bench = Bench::new();
    assert_eq!(bench.send("V:cup"), vec!["ERROR:unknown object:V:cup"]);

    assert_eq!(bench.send("O:cup,30,40"), vec!["OK"]);
    assert_eq!(bench.ctl.objects().len(), 1);
    assert!(bench.send("V:cup").is_empty());
    bench.run_until_idle(20_000);

    assert_eq!(bench.replies().last().map(String::as_str), Some("OK"));
    assert_eq!(bench.hal.position(Axis::X), 300);
    assert_eq!(bench.hal.position(Axis::Y), 400);
}

#[test]
fn vision_pick_falls_back_when_configured() {
    let mut config = super::bench_config();
    config.vision.fallback = Some([5.0, 5.0]);
    let mut bench = Bench::with_config(&config);

    assert!(bench.send("V:anything").is_empty());
    bench.run_until_idle(20_000);
    assert_eq!(bench.replies(), vec!["OK"]);
    assert_eq!(bench.hal.position(Axis::X), 50);
}
