//! Safety interlock state machine and input monitor.
//!
//! READY ↔ MOVING follow the motion activity; any state → HALTED on a
//! tripped limit sensor, the stop input or the `E` command. HALTED is left
//! only through an explicit reset, which is refused while any interlock input
//! is still asserted.
//!
//! The monitor reports a trip exactly once per transition into HALTED, not
//! once per tick while the input stays asserted.

use scara_common::hal::{LimitSwitches, SensorSnapshot};
use scara_common::protocol::Reply;
use tracing::{debug, info, warn};

/// Interlock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterlockState {
    /// Idle, accepting motion.
    #[default]
    Ready,
    /// At least one axis active or a sequence busy.
    Moving,
    /// Latched stop.
    Halted,
}

/// Reason for entering HALTED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripCause {
    /// One or more limit sensors tripped.
    Limit(LimitSwitches),
    /// Hardware stop input asserted.
    StopInput,
    /// `E` command from the host.
    Command,
}

impl TripCause {
    /// Asynchronous notification line for this cause.
    pub const fn notification(self) -> Reply {
        match self {
            TripCause::Limit(_) => Reply::LimitSwitchTriggered,
            TripCause::StopInput | TripCause::Command => Reply::EmergencyStop,
        }
    }
}

/// Events that drive the interlock machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterlockEvent {
    MotionStarted,
    MotionFinished,
    Trip(TripCause),
    Reset,
}

/// Result of an interlock transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterlockTransition {
    Ok(InterlockState),
    Rejected(&'static str),
}

/// READY / MOVING / HALTED machine.
#[derive(Debug, Clone, Default)]
pub struct InterlockStateMachine {
    state: InterlockState,
}

impl InterlockStateMachine {
    pub const fn new() -> Self {
        Self {
            state: InterlockState::Ready,
        }
    }

    #[inline]
    pub const fn state(&self) -> InterlockState {
        self.state
    }

    #[inline]
    pub const fn is_halted(&self) -> bool {
        matches!(self.state, InterlockState::Halted)
    }

    /// Handle an interlock event.
    pub fn handle_event(&mut self, event: InterlockEvent) -> InterlockTransition {
        use InterlockEvent as E;
        use InterlockState as S;

        let next = match (self.state, event) {
            (S::Ready, E::MotionStarted) => S::Moving,
            (S::Moving, E::MotionFinished) => S::Ready,

            // Repeated activity reports are no-ops
            (S::Moving, E::MotionStarted) => S::Moving,
            (S::Ready, E::MotionFinished) => S::Ready,

            // Any → Halted, idempotent
            (_, E::Trip(_)) => S::Halted,

            (S::Halted, E::Reset) => S::Ready,
            (S::Ready | S::Moving, E::Reset) => self.state,

            (S::Halted, E::MotionStarted | E::MotionFinished) => {
                return InterlockTransition::Rejected("motion while halted");
            }
        };

        self.state = next;
        InterlockTransition::Ok(next)
    }
}

/// Polls the interlock inputs once per tick.
#[derive(Debug, Clone, Default)]
pub struct SafetyMonitor {
    machine: InterlockStateMachine,
    last_inputs: SensorSnapshot,
    last_cause: Option<TripCause>,
}

impl SafetyMonitor {
    pub const fn new() -> Self {
        Self {
            machine: InterlockStateMachine::new(),
            last_inputs: SensorSnapshot {
                limits: LimitSwitches::empty(),
                estop: false,
            },
            last_cause: None,
        }
    }

    #[inline]
    pub const fn state(&self) -> InterlockState {
        self.machine.state()
    }

    #[inline]
    pub const fn is_halted(&self) -> bool {
        self.machine.is_halted()
    }

    /// Inputs seen by the last [`check`](Self::check).
    #[inline]
    pub const fn last_inputs(&self) -> SensorSnapshot {
        self.last_inputs
    }

    /// Cause of the current (or last) halt.
    #[inline]
    pub const fn last_cause(&self) -> Option<TripCause> {
        self.last_cause
    }

    /// Evaluate one poll of the inputs.
    ///
    /// Returns the trip cause when this poll moves the machine into HALTED.
    /// The stop input wins over limits when both are asserted.
    pub fn check(&mut self, inputs: SensorSnapshot) -> Option<TripCause> {
        self.last_inputs = inputs;
        if !inputs.any_tripped() || self.machine.is_halted() {
            return None;
        }
        let cause = if inputs.estop {
            TripCause::StopInput
        } else {
            TripCause::Limit(inputs.limits)
        };
        self.trip(cause);
        Some(cause)
    }

    /// Enter HALTED. Returns `false` if already halted.
    pub fn trip(&mut self, cause: TripCause) -> bool {
        let was_halted = self.machine.is_halted();
        self.machine.handle_event(InterlockEvent::Trip(cause));
        if !was_halted {
            warn!(?cause, "interlock tripped, motion halted");
            self.last_cause = Some(cause);
        }
        !was_halted
    }

    /// Track motion activity for READY / MOVING.
    pub fn update_motion(&mut self, moving: bool) {
        let event = if moving {
            InterlockEvent::MotionStarted
        } else {
            InterlockEvent::MotionFinished
        };
        let before = self.machine.state();
        if let InterlockTransition::Ok(after) = self.machine.handle_event(event) {
            if after != before {
                debug!(?before, ?after, "interlock state");
            }
        }
    }

    /// Leave HALTED.
    ///
    /// `inputs` must be a fresh poll; the reset is refused while any input
    /// is still asserted.
    pub fn reset(&mut self, inputs: SensorSnapshot) -> Result<(), &'static str> {
        self.last_inputs = inputs;
        if inputs.any_tripped() {
            return Err("interlock still asserted");
        }
        match self.machine.handle_event(InterlockEvent::Reset) {
            InterlockTransition::Ok(_) => {
                if self.last_cause.take().is_some() {
                    info!("emergency latch cleared");
                }
                Ok(())
            }
            InterlockTransition::Rejected(reason) => Err(reason),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
