//! HAL input and output types.
//!
//! - `Axis` - The three driven axes
//! - `Direction` - Step direction
//! - `LimitSwitches` - Six limit sensors packed as bitflags
//! - `SensorSnapshot` - One poll of all interlock inputs

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three independently driven axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    /// All axes in channel order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Channel index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Limit flag for the low end of travel.
    #[inline]
    pub const fn min_limit(self) -> LimitSwitches {
        match self {
            Axis::X => LimitSwitches::X_MIN,
            Axis::Y => LimitSwitches::Y_MIN,
            Axis::Z => LimitSwitches::Z_MIN,
        }
    }

    /// Limit flag for the high end of travel.
    #[inline]
    pub const fn max_limit(self) -> LimitSwitches {
        match self {
            Axis::X => LimitSwitches::X_MAX,
            Axis::Y => LimitSwitches::Y_MAX,
            Axis::Z => LimitSwitches::Z_MAX,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(name)
    }
}

/// Step direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards increasing step count.
    Forward,
    /// Towards decreasing step count.
    Reverse,
}

impl Direction {
    /// Signed unit step.
    #[inline]
    pub const fn sign(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }

    /// Direction of a signed step delta; `None` for zero.
    #[inline]
    pub const fn of(delta: i64) -> Option<Self> {
        if delta > 0 {
            Some(Direction::Forward)
        } else if delta < 0 {
            Some(Direction::Reverse)
        } else {
            None
        }
    }
}

bitflags! {
    /// Limit sensor states, one bit per sensor (min/max × X, Y, Z).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LimitSwitches: u8 {
        const X_MIN = 0x01;
        const X_MAX = 0x02;
        const Y_MIN = 0x04;
        const Y_MAX = 0x08;
        const Z_MIN = 0x10;
        const Z_MAX = 0x20;
    }
}

/// One poll of every interlock input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorSnapshot {
    /// Tripped limit sensors.
    pub limits: LimitSwitches,
    /// Emergency-stop input asserted.
    pub estop: bool,
}

impl SensorSnapshot {
    /// Whether any interlock input is asserted.
    #[inline]
    pub fn any_tripped(&self) -> bool {
        self.estop || !self.limits.is_empty()
    }
}
