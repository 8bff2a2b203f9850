use compass_solve::ode;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uom::si::{
    angle::{degree, radian},
    angular_velocity::radian_per_second,
    f64::{Angle, AngularVelocity, Time},
    length::meter,
    time::second,
};

use crate::excitation::Excitation;

/// Numerical and physical options of a [`Dynamic`](super::Dynamic).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct DynamicConfig {
    /// Length of every run, starting at `t = 0`.
    pub time_span: Time,

    /// Spacing of the reported samples.
    pub output_step: Time,

    pub initial_angle: Angle,
    pub initial_angular_velocity: AngularVelocity,

    /// Integration method, tolerances and step budget.
    pub solver: ode::Config,

    pub torque_model: TorqueModel,
    pub calibration: Calibration,

    /// Optional shaking of the pivot while the needle settles.
    pub excitation: Option<Excitation>,

    pub criteria: Criteria,

    /// Below this speed a needle with dry friction may stick.
    pub stick_velocity: AngularVelocity,
}

impl Default for DynamicConfig {
    fn default() -> Self {
        Self {
            time_span: Time::new::<second>(5.0),
            output_step: Time::new::<second>(0.01),
            initial_angle: Angle::new::<degree>(90.0),
            initial_angular_velocity: AngularVelocity::new::<radian_per_second>(0.0),
            solver: ode::Config::default(),
            torque_model: TorqueModel::default(),
            calibration: Calibration::default(),
            excitation: None,
            criteria: Criteria::default(),
            stick_velocity: AngularVelocity::new::<radian_per_second>(1e-5),
        }
    }
}

/// Form of the restoring torque.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum TorqueModel {
    /// Full dipole and imbalance torques, valid at any deflection.
    #[default]
    Nonlinear,

    /// Restoring torque linearized about equilibrium, `-k (θ - θ_eq)`.
    SmallAngle,
}

/// Multipliers fitted against measured needle motions.
///
/// Both default to one, which uses the compass constants as given.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Calibration {
    /// Scales the magnetic torque.
    pub magnetic: f64,

    /// Scales the viscous damping coefficient.
    pub viscous: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            magnetic: 1.0,
            viscous: 1.0,
        }
    }
}

/// Width of the band around equilibrium that counts as settled.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Band {
    /// A fraction of the initial disturbance.
    Relative(f64),

    /// A fixed angle.
    Absolute(Angle),
}

impl Default for Band {
    fn default() -> Self {
        Self::Relative(0.02)
    }
}

impl Band {
    /// Band half-width in radians for a run starting `disturbance` radians out.
    #[must_use]
    pub fn resolve(&self, disturbance: f64) -> f64 {
        match self {
            Self::Relative(fraction) => fraction * disturbance,
            Self::Absolute(angle) => angle.get::<radian>(),
        }
    }
}

/// Thresholds used to judge a run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Criteria {
    pub settling_band: Band,

    /// Largest angle range over the final window of a needle at rest.
    ///
    /// Velocities are held to this tolerance times the natural frequency.
    pub rest_tolerance: Angle,

    /// Natural periods a needle must stay inside the band to count as settled.
    ///
    /// Capped at half the time span.
    pub hold_periods: f64,

    /// Shortest time span, in response times, that a disturbed run needs.
    pub min_horizon_periods: f64,

    /// Relative drop in energy amplitude between the last two quarters of a
    /// run that counts as decaying.
    ///
    /// Never below a thousand times the solver's relative tolerance.
    pub decay_threshold: f64,

    /// Deviations at or below this do not count as crossing equilibrium.
    pub noise_floor: Angle,
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            settling_band: Band::default(),
            rest_tolerance: Angle::new::<radian>(1e-3),
            hold_periods: 1.0,
            min_horizon_periods: 2.0,
            decay_threshold: 0.0,
            noise_floor: Angle::new::<radian>(crate::metrics::DEFAULT_NOISE_FLOOR),
        }
    }
}

impl DynamicConfig {
    /// Validates every option.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid option.
    pub fn validate(&self) -> Result<(), &'static str> {
        let span = self.time_span.get::<second>();
        let step = self.output_step.get::<second>();
        if !span.is_finite() || span <= 0.0 {
            return Err("time_span must be finite and positive");
        }
        if !step.is_finite() || step <= 0.0 || step > span {
            return Err("output_step must be positive and no longer than time_span");
        }
        if !self.initial_angle.get::<radian>().is_finite() {
            return Err("initial_angle must be finite");
        }
        if !self
            .initial_angular_velocity
            .get::<radian_per_second>()
            .is_finite()
        {
            return Err("initial_angular_velocity must be finite");
        }
        self.solver.validate()?;
        self.calibration.validate()?;
        self.criteria.validate()?;

        let stick = self.stick_velocity.get::<radian_per_second>();
        if !stick.is_finite() || stick < 0.0 {
            return Err("stick_velocity must be finite and non-negative");
        }

        if let Some(excitation) = &self.excitation {
            if !excitation.mass_moment.is_finite() || !excitation.stroke.get::<meter>().is_finite()
            {
                return Err("excitation mass moment and stroke must be finite");
            }
            if !excitation.cadence.is_finite() || excitation.cadence < 0.0 {
                return Err("excitation cadence must be finite and non-negative");
            }
        }
        Ok(())
    }
}

impl Calibration {
    fn validate(&self) -> Result<(), &'static str> {
        if !self.magnetic.is_finite() || self.magnetic <= 0.0 {
            return Err("magnetic calibration must be finite and positive");
        }
        if !self.viscous.is_finite() || self.viscous < 0.0 {
            return Err("viscous calibration must be finite and non-negative");
        }
        Ok(())
    }
}

impl Criteria {
    fn validate(&self) -> Result<(), &'static str> {
        match self.settling_band {
            Band::Relative(fraction) if !fraction.is_finite() || fraction <= 0.0 => {
                return Err("relative settling band must be finite and positive");
            }
            Band::Absolute(angle)
                if !angle.get::<radian>().is_finite() || angle.get::<radian>() <= 0.0 =>
            {
                return Err("absolute settling band must be finite and positive");
            }
            _ => {}
        }

        let rest = self.rest_tolerance.get::<radian>();
        if !rest.is_finite() || rest <= 0.0 {
            return Err("rest_tolerance must be finite and positive");
        }
        if !self.hold_periods.is_finite() || self.hold_periods < 0.0 {
            return Err("hold_periods must be finite and non-negative");
        }
        if !self.min_horizon_periods.is_finite() || self.min_horizon_periods < 0.0 {
            return Err("min_horizon_periods must be finite and non-negative");
        }
        if !(0.0..1.0).contains(&self.decay_threshold) {
            return Err("decay_threshold must be in [0, 1)");
        }
        let floor = self.noise_floor.get::<radian>();
        if !floor.is_finite() || floor < 0.0 {
            return Err("noise_floor must be finite and non-negative");
        }
        Ok(())
    }
}
