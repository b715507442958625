//! Millimetre ↔ step conversion.
//!
//! `steps_per_mm = steps_per_rev × microsteps ÷ mm_per_rev`. Conversion to
//! steps rounds to the nearest integer (half away from zero) so a round trip
//! never drifts by more than half a step.

use crate::config::MechanicsConfig;

/// Fixed mechanical ratio between linear distance and motor steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    steps_per_mm: f64,
}

impl UnitConverter {
    /// Build from a validated mechanics section.
    pub fn new(mechanics: &MechanicsConfig) -> Self {
        let steps_per_rev = f64::from(mechanics.steps_per_rev) * f64::from(mechanics.microsteps);
        Self {
            steps_per_mm: steps_per_rev / mechanics.mm_per_rev,
        }
    }

    /// Steps per millimetre.
    #[inline]
    pub const fn steps_per_mm(&self) -> f64 {
        self.steps_per_mm
    }

    /// Length of one step [mm].
    #[inline]
    pub fn mm_per_step(&self) -> f64 {
        1.0 / self.steps_per_mm
    }

    /// Distance → nearest step count.
    #[inline]
    pub fn to_steps(&self, mm: f64) -> i64 {
        (mm * self.steps_per_mm).round() as i64
    }

    /// Step count → distance.
    #[inline]
    pub fn to_mm(&self, steps: i64) -> f64 {
        steps as f64 / self.steps_per_mm
    }
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self::new(&MechanicsConfig::default())
    }
}
