//! Command dispatcher.
//!
//! Every accepted line produces exactly one reply, except composite moves
//! (`K`, `C`, `V`) whose `OK` is sent by the sequencer when the whole
//! sequence completes, or replaced by `ERROR:sequence aborted:<raw>`.
//!
//! | Verbs | Effect |
//! |-------|--------|
//! | `Y` `Z` `G` `H` `S` `A` `E` `R` | direct channel / state mutation |
//! | `X` `K` `C` `V` | enqueue a sequence |
//! | `O` | vision table update |
//! | `T` `?` | query |
//!
//! Motion verbs are refused while the emergency latch is set and while a
//! sequence is in flight. The recorded position is updated when a move is
//! accepted.

use scara_common::hal::{Axis, MotionHal};
use scara_common::protocol::{Command, CommandError, Reply};
use tracing::{debug, info, warn};

use crate::controller::Controller;
use crate::error::VisionError;
use crate::safety::TripCause;
use crate::sequencer::{MotionPlant, Sequence};
use crate::vision::ObjectResolver;

impl Controller {
    /// Parse and dispatch one line.
    pub fn dispatch_line<H: MotionHal + ?Sized>(
        &mut self,
        line: &str,
        hal: &mut H,
        out: &mut Vec<Reply>,
    ) {
        match self.parser.parse(line) {
            Ok(command) => self.dispatch(command, line.trim(), hal, out),
            Err(err) => {
                warn!(%err, "command rejected");
                out.push(Reply::Error(err));
            }
        }
    }

    /// Execute a validated command. `raw` is echoed in error replies.
    pub fn dispatch<H: MotionHal + ?Sized>(
        &mut self,
        command: Command,
        raw: &str,
        hal: &mut H,
        out: &mut Vec<Reply>,
    ) {
        debug!(?command, "dispatch");
        match self.execute(command, raw, hal, out) {
            Ok(Some(reply)) => out.push(reply),
            Ok(None) => {}
            Err(err) => {
                warn!(%err, "command rejected");
                out.push(Reply::Error(err));
            }
        }
    }

    fn execute<H: MotionHal + ?Sized>(
        &mut self,
        command: Command,
        raw: &str,
        hal: &mut H,
        out: &mut Vec<Reply>,
    ) -> Result<Option<Reply>, CommandError> {
        if command.issues_motion() {
            if self.state.emergency_stop {
                return Err(CommandError::rejected("emergency stop latched", raw));
            }
            if self.sequencer.is_busy() {
                return Err(CommandError::rejected("busy", raw));
            }
        }
        let rejected = |e: crate::error::AxisError| CommandError::rejected(e.to_string(), raw);

        match command {
            Command::MoveTo { x, y, z, speed } => {
                self.sequencer.enqueue(Sequence::move_to(x, y, z, speed, raw))?;
                self.set_commanded(x, y, z);
                Ok(Some(Reply::Ok))
            }
            Command::MoveRelative { axis, distance } => {
                let target = self.state.position(axis) + distance;
                if !self.parser.bounds().axis_contains(axis, target) {
                    return Err(CommandError::range("target outside workspace", raw));
                }
                self.motion
                    .move_axis(axis, target, self.state.speed)
                    .map_err(rejected)?;
                self.state.set_position(axis, target);
                Ok(Some(Reply::Ok))
            }
            Command::Gripper { angle } => {
                self.motion.set_gripper(angle);
                self.state.grip = angle;
                Ok(Some(Reply::Ok))
            }
            Command::Home => {
                self.motion
                    .begin_move(0.0, 0.0, 0.0, self.state.speed)
                    .map_err(rejected)?;
                self.set_commanded(0.0, 0.0, 0.0);
                Ok(Some(Reply::Ok))
            }
            Command::SetSpeed(speed) => {
                self.state.speed = speed;
                Ok(Some(Reply::Ok))
            }
            Command::SetAccel(accel) => {
                self.state.accel = accel;
                self.motion.set_accel_percent(accel);
                Ok(Some(Reply::Ok))
            }
            Command::Status => Ok(Some(Reply::Status(self.state.status_report()))),
            Command::EmergencyStop => {
                self.monitor.trip(TripCause::Command);
                out.push(Reply::EmergencyStop);
                self.halt(out);
                Ok(None)
            }
            Command::Pick { x, y } => {
                self.start_grasp(Sequence::pick(x, y, &self.params, raw), x, y)?;
                Ok(None)
            }
            Command::Place { x, y } => {
                self.start_grasp(Sequence::place(x, y, &self.params, raw), x, y)?;
                Ok(None)
            }
            Command::VisionPick { object } => {
                let Some((x, y)) = self.objects.resolve(&object) else {
                    return Err(CommandError::range("unknown object", raw));
                };
                info!(id = object.as_str(), x, y, "vision pick");
                self.start_grasp(Sequence::pick(x, y, &self.params, raw), x, y)?;
                Ok(None)
            }
            Command::Reset => {
                self.monitor.reset(hal.read_inputs()).map_err(|reason| {
                    CommandError::rejected(reason, raw)
                })?;
                self.motion.release_all();
                self.state.emergency_stop = false;
                Ok(Some(Reply::Ok))
            }
            Command::ReportObject { object, x, y } => {
                self.objects.insert(object, x, y).map_err(|e| match e {
                    VisionError::TableFull => CommandError::rejected("object table full", raw),
                    other => CommandError::rejected(other.to_string(), raw),
                })?;
                Ok(Some(Reply::Ok))
            }
            Command::Help => Ok(Some(Reply::Help)),
        }
    }

    fn start_grasp(&mut self, sequence: Sequence, x: f64, y: f64) -> Result<(), CommandError> {
        self.sequencer.enqueue(sequence)?;
        let z = self.params.safe_height;
        self.set_commanded(x, y, z);
        Ok(())
    }

    fn set_commanded(&mut self, x: f64, y: f64, z: f64) {
        for (axis, mm) in [(Axis::X, x), (Axis::Y, y), (Axis::Z, z)] {
            self.state.set_position(axis, mm);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::SimulatedHal;
    use scara_common::config::ControllerConfig;
    use scara_common::protocol::ErrorKind;

    fn controller() -> Controller {
        Controller::new(&ControllerConfig::default()).unwrap()
    }

    fn send(ctl: &mut Controller, hal: &mut SimulatedHal, line: &str) -> Vec<Reply> {
        let mut out = Vec::new();
        ctl.dispatch_line(line, hal, &mut out);
        out
    }

    fn error_kind(replies: &[Reply]) -> Option<ErrorKind> {
        match replies {
            [Reply::Error(err)] => Some(err.kind),
            _ => None,
        }
    }

    #[test]
    fn move_to_sets_commanded_position_and_acks() {
        let mut ctl = controller();
        let mut hal = SimulatedHal::new();
        assert_eq!(send(&mut ctl, &mut hal, "X:50,50,0,30"), vec![Reply::Ok]);
        assert_eq!((ctl.state().x, ctl.state().y, ctl.state().z), (50.0, 50.0, 0.0));
        assert!(ctl.sequencer().is_busy());
    }

    #[test]
    fn out_of_bounds_leaves_position_unchanged() {
        let mut ctl = controller();
        let mut hal = SimulatedHal::new();
        let replies = send(&mut ctl, &mut hal, "X:500,0,0,30");
        assert_eq!(error_kind(&replies), Some(ErrorKind::Range));
        assert_eq!(ctl.state().x, 0.0);
        assert!(!ctl.sequencer().is_busy());
    }

    #[test]
    fn relative_move_checks_resulting_position() {
        let mut ctl = controller();
        let mut hal = SimulatedHal::new();
        assert_eq!(send(&mut ctl, &mut hal, "Z:60"), vec![Reply::Ok]);
        assert_eq!(ctl.state().z, 60.0);
        assert_eq!(ctl.axis(Axis::Z).target(), ctl.motion().units().to_steps(60.0));

        // 60 + 50 exceeds z_max = 100
        let replies = send(&mut ctl, &mut hal, "Z:50");
        assert_eq!(error_kind(&replies), Some(ErrorKind::Range));
        assert_eq!(ctl.state().z, 60.0);

        // Below z_min = 0
        let replies = send(&mut ctl, &mut hal, "Z:-61");
        assert_eq!(error_kind(&replies), Some(ErrorKind::Range));
    }

    #[test]
    fn speed_accel_and_status() {
        let mut ctl = controller();
        let mut hal = SimulatedHal::new();
        assert_eq!(send(&mut ctl, &mut hal, "S:40"), vec![Reply::Ok]);
        assert_eq!(send(&mut ctl, &mut hal, "A:100"), vec![Reply::Ok]);
        assert_eq!(ctl.state().speed, 40);
        assert_eq!(ctl.state().accel, 100);
        assert_eq!(ctl.axis(Axis::Y).acceleration(), 8000.0);

        let replies = send(&mut ctl, &mut hal, "T");
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].to_string(), "STATUS:0.00,0.00,0.00,0.0,40");
    }

    #[test]
    fn relative_move_uses_speed_setting() {
        let mut ctl = controller();
        let mut hal = SimulatedHal::new();
        send(&mut ctl, &mut hal, "S:25");
        send(&mut ctl, &mut hal, "Y:10");
        assert_eq!(ctl.axis(Axis::Y).max_speed(), 1000.0);
    }

    #[test]
    fn emergency_stop_latches_and_rejects_motion() {
        let mut ctl = controller();
        let mut hal = SimulatedHal::new();
        assert_eq!(send(&mut ctl, &mut hal, "E"), vec![Reply::EmergencyStop]);
        assert!(ctl.state().emergency_stop);

        for line in ["X:1,1,1,10", "Y:1", "Z:1", "G:10", "H", "K:1,1", "C:1,1", "V:a"] {
            let replies = send(&mut ctl, &mut hal, line);
            match replies.as_slice() {
                [Reply::Error(err)] => {
                    assert_eq!(err.kind, ErrorKind::Rejected, "{line}");
                    assert_eq!(err.reason, "emergency stop latched");
                }
                other => panic!("{line}: unexpected {other:?}"),
            }
        }
        // Non-motion verbs still work.
        assert!(send(&mut ctl, &mut hal, "T")[0].is_status());
        assert_eq!(send(&mut ctl, &mut hal, "S:10"), vec![Reply::Ok]);
        assert_eq!(send(&mut ctl, &mut hal, "?"), vec![Reply::Help]);
        assert_eq!(send(&mut ctl, &mut hal, "O:a,1,1"), vec![Reply::Ok]);

        assert_eq!(send(&mut ctl, &mut hal, "R"), vec![Reply::Ok]);
        assert!(!ctl.state().emergency_stop);
        assert_eq!(send(&mut ctl, &mut hal, "G:10"), vec![Reply::Ok]);
    }

    #[test]
    fn motion_rejected_while_sequence_busy() {
        let mut ctl = controller();
        let mut hal = SimulatedHal::new();
        send(&mut ctl, &mut hal, "K:10,10");
        let replies = send(&mut ctl, &mut hal, "Y:5");
        assert_eq!(replies[0].to_string(), "ERROR:busy:Y:5");
        // Queries still answer.
        assert!(send(&mut ctl, &mut hal, "T")[0].is_status());
    }

    #[test]
    fn pick_acknowledges_later() {
        let mut ctl = controller();
        let mut hal = SimulatedHal::new();
        assert!(send(&mut ctl, &mut hal, "K:10,-10").is_empty());
        assert_eq!((ctl.state().x, ctl.state().y, ctl.state().z), (10.0, -10.0, 50.0));
    }

    #[test]
    fn vision_pick_resolves_reported_objects() {
        let mut ctl = controller();
        let mut hal = SimulatedHal::new();
        let replies = send(&mut ctl, &mut hal, "V:red_circle_camera_x_0");
        assert_eq!(replies[0].to_string(), "ERROR:unknown object:V:red_circle_camera_x_0");

        send(&mut ctl, &mut hal, "O:red_circle_camera_x_0,25,-40");
        assert!(send(&mut ctl, &mut hal, "V:red_circle_camera_x_0").is_empty());
        assert_eq!((ctl.state().x, ctl.state().y), (25.0, -40.0));
        assert!(ctl.sequencer().is_busy());
    }

    #[test]
    fn reset_refused_while_sensor_tripped() {
        let mut ctl = controller();
        let mut hal = SimulatedHal::new();
        send(&mut ctl, &mut hal, "E");
        hal.set_estop(true);
        let replies = send(&mut ctl, &mut hal, "R");
        assert_eq!(replies[0].to_string(), "ERROR:interlock still asserted:R");
        assert!(ctl.state().emergency_stop);

        hal.set_estop(false);
        assert_eq!(send(&mut ctl, &mut hal, "R"), vec![Reply::Ok]);
    }

    #[test]
    fn parse_errors_echo_raw_line() {
        let mut ctl = controller();
        let mut hal = SimulatedHal::new();
        assert_eq!(
            send(&mut ctl, &mut hal, "Q:12")[0].to_string(),
            "ERROR:unknown command:Q:12"
        );
        assert_eq!(
            send(&mut ctl, &mut hal, "G:200")[0].to_string(),
            "ERROR:gripper angle outside 0-180:G:200"
        );
    }
}
