//! Equation of motion of the needle as a first-order system in `(θ, ω)`.
//!
//! ```text
//! I θ'' = T_mag(θ) + T_imb(θ) - c ω + T_fric + T_ext(t, θ)
//! ```
//!
//! The imbalance torque `-k_g sin(θ - θ0)` acts a quarter turn off the
//! magnetic axis with `k_g = k_m |tan δ|`, so the two restoring torques
//! cancel exactly at `θ_eq = φ + δ` and together stiffen the needle to
//! `k = k_m / cos δ`.

use std::{
    convert::Infallible,
    f64::consts::{FRAC_PI_2, TAU},
};

use compass_core::{OdeModel, angle::wrap_to_pi};
use uom::si::{
    angle::radian, angular_velocity::radian_per_second, magnetic_flux_density::tesla,
    magnetic_moment::ampere_square_meter, moment_of_inertia::kilogram_square_meter,
    torque::newton_meter,
};

use super::config::{DynamicConfig, TorqueModel};
use crate::{compass::Compass, field::MagneticField};

/// Calibrated needle model, all quantities in SI base units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeedleModel {
    inertia: f64,
    magnetic_stiffness: f64,
    imbalance_stiffness: f64,
    direction: f64,
    imbalance_reference: f64,
    equilibrium: f64,
    stiffness: f64,
    damping: f64,
    friction: f64,
    stick_velocity: f64,
    torque_model: TorqueModel,
    forcing: Option<Forcing>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Forcing {
    amplitude: f64,
    frequency: f64,
}

impl NeedleModel {
    /// Builds the model of `compass` in `field` under `config`.
    #[must_use]
    pub fn new(compass: &Compass, field: &MagneticField, config: &DynamicConfig) -> Self {
        let imbalance = compass.static_imbalance().get::<radian>();
        let direction = field.direction().get::<radian>();

        let magnetic_stiffness = config.calibration.magnetic
            * compass.magnetic_moment().get::<ampere_square_meter>()
            * field.magnitude().get::<tesla>();

        let forcing = config.excitation.map(|excitation| Forcing {
            amplitude: excitation.torque_amplitude().get::<newton_meter>(),
            frequency: excitation.angular_frequency(),
        });

        Self {
            inertia: compass.moment_of_inertia().get::<kilogram_square_meter>(),
            magnetic_stiffness,
            imbalance_stiffness: magnetic_stiffness * imbalance.tan().abs(),
            direction,
            imbalance_reference: direction + imbalance.signum() * FRAC_PI_2,
            equilibrium: direction + imbalance,
            stiffness: magnetic_stiffness / imbalance.cos(),
            damping: config.calibration.viscous * compass.damping_coefficient(),
            friction: compass.dry_friction().get::<newton_meter>(),
            stick_velocity: config.stick_velocity.get::<radian_per_second>(),
            torque_model: config.torque_model,
            forcing,
        }
    }

    /// Moment of inertia in kg·m².
    #[must_use]
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Rest angle `φ + δ` in radians, not wrapped.
    #[must_use]
    pub fn equilibrium(&self) -> f64 {
        self.equilibrium
    }

    /// Linearized restoring stiffness in N·m/rad.
    #[must_use]
    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    /// Calibrated viscous damping in N·m·s/rad.
    #[must_use]
    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Undamped natural angular frequency in rad/s.
    #[must_use]
    pub fn natural_frequency(&self) -> f64 {
        (self.stiffness / self.inertia).sqrt()
    }

    /// Undamped natural period in seconds.
    #[must_use]
    pub fn natural_period(&self) -> f64 {
        TAU / self.natural_frequency()
    }

    #[must_use]
    pub fn damping_ratio(&self) -> f64 {
        self.damping / (2.0 * (self.inertia * self.stiffness).sqrt())
    }

    /// Combined magnetic and imbalance torque at `angle`.
    #[must_use]
    pub fn restoring_torque(&self, angle: f64) -> f64 {
        match self.torque_model {
            TorqueModel::Nonlinear => {
                let magnetic = -self.magnetic_stiffness * (angle - self.direction).sin();
                let imbalance =
                    -self.imbalance_stiffness * (angle - self.imbalance_reference).sin();
                magnetic + imbalance
            }
            TorqueModel::SmallAngle => -self.stiffness * wrap_to_pi(angle - self.equilibrium),
        }
    }

    /// Torque from shaking the pivot, zero without an excitation.
    #[must_use]
    pub fn external_torque(&self, time: f64, angle: f64) -> f64 {
        let Some(Forcing {
            amplitude,
            frequency,
        }) = self.forcing
        else {
            return 0.0;
        };
        let alignment = match self.torque_model {
            TorqueModel::Nonlinear => (angle - self.direction).cos(),
            TorqueModel::SmallAngle => 1.0,
        };
        amplitude * alignment * (frequency * time).sin()
    }

    /// Oscillation amplitude in radians that the needle's mechanical energy
    /// would sustain, `√(2 E / k)`.
    ///
    /// Equals the deviation of a needle at rest and decays with the energy
    /// whether or not the motion is oscillatory.
    #[must_use]
    pub fn energy_amplitude(&self, angle: f64, angular_velocity: f64) -> f64 {
        let deviation = wrap_to_pi(angle - self.equilibrium);
        let kinetic = self.inertia * angular_velocity.powi(2) / self.stiffness;
        let potential = match self.torque_model {
            TorqueModel::Nonlinear => 2.0 * (1.0 - deviation.cos()),
            TorqueModel::SmallAngle => deviation.powi(2),
        };
        (kinetic + potential).sqrt()
    }

    /// Time derivative of `(θ, ω)`.
    fn rates(&self, time: f64, angle: f64, angular_velocity: f64) -> [f64; 2] {
        let driving = self.restoring_torque(angle) + self.external_torque(time, angle)
            - self.damping * angular_velocity;

        if self.friction == 0.0 {
            return [angular_velocity, driving / self.inertia];
        }

        let net = if angular_velocity.abs() > self.stick_velocity {
            driving - self.friction * angular_velocity.signum()
        } else if driving.abs() <= self.friction {
            // Stuck: hold the angle and bleed off the residual velocity.
            return [0.0, -angular_velocity * self.natural_frequency()];
        } else {
            driving - self.friction * driving.signum()
        };
        [angular_velocity, net / self.inertia]
    }
}

impl OdeModel<2> for NeedleModel {
    type Error = Infallible;

    fn derivative(&self, x: f64, y: &[f64; 2]) -> Result<[f64; 2], Self::Error> {
        let [angle, angular_velocity] = *y;
        Ok(self.rates(x, angle, angular_velocity))
    }
}
