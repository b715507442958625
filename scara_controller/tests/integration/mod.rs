mod protocol;
mod safety;
mod sequence;
mod startup;
mod telemetry;

use std::time::Duration;

use scara_common::config::ControllerConfig;
use scara_common::protocol::Reply;
use scara_controller::controller::Controller;
use scara_controller::hal::SimulatedHal;

// ── Helpers ─────────────────────────────────────────────────────────

/// One tick of the bench clock.
pub const DT: Duration = Duration::from_millis(1);

/// Coarse mechanics so that moves finish in a few thousand ticks:
/// 10 steps/mm, 1 ms tick, 1000 steps/s at speed 100.
pub fn bench_config() -> ControllerConfig {
    let mut config = ControllerConfig::default();
    config.mechanics.steps_per_rev = 10;
    config.mechanics.microsteps = 1;
    config.mechanics.mm_per_rev = 1.0;
    config.cycle.cycle_time_us = 1000;
    config.motion.max_speed_steps = 1000.0;
    config.motion.max_accel_steps = 20_000.0;
    config.motion.min_speed_steps = 50.0;
    config.gripper.settle_ms = 5;
    config.status.interval_ms = 100;
    config
}

/// Controller, simulated hardware and everything written to the host.
pub struct Bench {
    pub ctl: Controller,
    pub hal: SimulatedHal,
    pub out: Vec<Reply>,
}

impl Bench {
    pub fn new() -> Self {
        Self::with_config(&bench_config())
    }

    pub fn with_config(config: &ControllerConfig) -> Self {
        Self {
            ctl: Controller::new(config).expect("valid bench config"),
            hal: SimulatedHal::new(),
            out: Vec::new(),
        }
    }

    pub fn tick(&mut self) {
        self.ctl.tick(DT, &mut self.hal, &mut self.out);
    }

    /// Hand received bytes to the controller. Refusals raised on receipt
    /// land in `out`.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.ctl.feed(bytes, &mut self.out);
    }

    /// Feed one line and run the tick that dispatches it. Returns the
    /// non-telemetry lines produced by that tick.
    pub fn send(&mut self, line: &str) -> Vec<String> {
        let start = self.out.len();
        self.feed(format!("{line}\n").as_bytes());
        self.tick();
        self.out[start..]
            .iter()
            .filter(|r| !r.is_status())
            .map(ToString::to_string)
            .collect()
    }

    /// Tick until the controller is idle. Returns the number of ticks.
    pub fn run_until_idle(&mut self, max_ticks: usize) -> usize {
        for n in 0..max_ticks {
            if self.ctl.is_idle() {
                return n;
            }
            self.tick();
        }
        panic!("controller still busy after {max_ticks} ticks");
    }

    /// Every line written so far, telemetry excluded.
    pub fn replies(&self) -> Vec<String> {
        self.out
            .iter()
            .filter(|r| !r.is_status())
            .map(ToString::to_string)
            .collect()
    }

    pub fn status_lines(&self) -> usize {
        self.out.iter().filter(|r| r.is_status()).count()
    }
}
