//! Periodic shaking of the compass by a running orienteer.
//!
//! When the pivot is shaken along the field direction with stroke `Y` at
//! angular frequency `Ω`, the offset magnet feels an inertial torque
//! `(m_magnet x) Y Ω² cos(θ - φ) sin(Ω t)`.

use std::f64::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uom::si::{
    angle::radian,
    f64::{Angle, Length, Torque},
    length::meter,
    torque::newton_meter,
};

use crate::compass::CompassDesign;

/// Stroke of the hand holding the compass while running, in meters.
pub const RUNNING_STROKE: f64 = 0.093;

/// Stride cadence of a running orienteer, in cycles per minute.
pub const RUNNING_CADENCE: f64 = 70.0;

/// Sinusoidal translation of the pivot.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Excitation {
    /// Magnet mass times its offset from the pivot, in kg·m.
    pub mass_moment: f64,

    /// Peak displacement of the pivot.
    pub stroke: Length,

    /// Shaking frequency in cycles per minute.
    pub cadence: f64,
}

/// Steady-state response of the linearized needle to an [`Excitation`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteadyState {
    /// Peak angular deviation from equilibrium.
    pub amplitude: Angle,

    /// Lag of the needle behind the excitation.
    pub phase: Angle,
}

impl Excitation {
    /// Shaking of `design` in the hand of a running orienteer.
    #[must_use]
    pub fn running(design: &CompassDesign) -> Self {
        Self {
            mass_moment: design.mass_moment(),
            stroke: Length::new::<meter>(RUNNING_STROKE),
            cadence: RUNNING_CADENCE,
        }
    }

    /// Angular frequency `Ω` in rad/s.
    #[must_use]
    pub fn angular_frequency(&self) -> f64 {
        TAU * self.cadence / 60.0
    }

    /// Peak inertial torque `(m_magnet x) Y Ω²` on a field-aligned needle.
    #[must_use]
    pub fn torque_amplitude(&self) -> Torque {
        Torque::new::<newton_meter>(
            self.mass_moment * self.stroke.get::<meter>() * self.angular_frequency().powi(2),
        )
    }

    /// Analytic steady state of `I θ'' + c θ' + k θ = T sin(Ω t)`.
    ///
    /// `stiffness` is in N·m/rad and `damping` in N·m·s/rad.
    #[must_use]
    pub fn steady_state(&self, inertia: f64, stiffness: f64, damping: f64) -> SteadyState {
        let omega = self.angular_frequency();
        let reactance = stiffness - inertia * omega.powi(2);
        let resistance = damping * omega;
        let torque = self.torque_amplitude().get::<newton_meter>();

        SteadyState {
            amplitude: Angle::new::<radian>(torque.abs() / reactance.hypot(resistance)),
            phase: Angle::new::<radian>(resistance.atan2(reactance)),
        }
    }
}
