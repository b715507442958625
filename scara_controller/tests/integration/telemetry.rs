//! Integration test: periodic status telemetry.

use scara_common::protocol::{Reply, StatusReport};

use super::Bench;

#[test]
fn status_count_follows_elapsed_time() {
    let mut bench = Bench::new();
    // 2.55 s at 1 ms per tick, 100 ms interval
    for _ in 0..2550 {
        bench.tick();
    }
    assert_eq!(bench.status_lines(), 25);
}

#[test]
fn status_cadence_ignores_traffic_and_motion() {
    let mut bench = Bench::new();
    bench.feed(b"X:20,20,20,100\nT\nS:10\nG:30\n");
    for _ in 0..1000 {
        bench.tick();
    }
    // 10 periodic lines plus the one answering `T`.
    assert_eq!(bench.status_lines(), 11);
}

#[test]
fn status_lines_parse_back() {
    let mut bench = Bench::new();
    bench.send("Y:12.5");
    bench.run_until_idle(10_000);
    for _ in 0..100 {
        bench.tick();
    }
    let last = bench
        .out
        .iter()
        .rev()
        .find_map(|r| match r {
            Reply::Status(report) => Some(report.to_string()),
            _ => None,
        })
        .expect("a status line");
    let report: StatusReport = last.parse().unwrap();
    assert_eq!(report.y, 12.5);
    assert_eq!(report.speed, 100);
}
