//! Mechanical description of a compass needle on its pivot.

pub mod design;
pub mod magnet;

use std::f64::consts::{FRAC_PI_2, TAU};

use compass_core::{
    angle::wrap_to_tau,
    constraint::{Constrained, NonNegative, StrictlyPositive, check_within},
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uom::si::{
    angle::radian,
    angular_velocity::radian_per_second,
    f64::{Angle, AngularVelocity, MagneticMoment, MomentOfInertia, Time, Torque},
    magnetic_flux_density::tesla,
    magnetic_moment::ampere_square_meter,
    moment_of_inertia::kilogram_square_meter,
    time::second,
    torque::newton_meter,
};

use crate::{Error, field::MagneticField};

pub use design::CompassDesign;
pub use magnet::MagnetProperties;

/// A magnetized needle turning about a vertical pivot.
///
/// Holds validated constants only. Torques are evaluated against a
/// [`MagneticField`] supplied by the caller, so one compass can be studied
/// in any number of fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compass {
    moment_of_inertia: Constrained<MomentOfInertia, StrictlyPositive>,
    magnetic_moment: Constrained<MagneticMoment, StrictlyPositive>,
    damping_coefficient: Constrained<f64, NonNegative>,
    static_imbalance: Angle,
    dry_friction: Constrained<Torque, NonNegative>,
}

/// Options for building a [`Compass`].
///
/// The default is the GEONAUTE R500, see [`CompassDesign::r500`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct CompassConfig {
    /// Moment of inertia about the pivot axis.
    pub moment_of_inertia: MomentOfInertia,

    pub magnetic_moment: MagneticMoment,

    /// Viscous damping coefficient in N·m·s/rad.
    pub damping_coefficient: f64,

    /// Angular offset of the rest position from the magnetic axis.
    ///
    /// Caused by a center of mass that is not on the magnetic axis. Must be
    /// strictly between -90° and 90°.
    pub static_imbalance: Angle,

    /// Pivot dry-friction torque threshold. Zero for a frictionless pivot.
    pub dry_friction: Torque,
}

impl Default for CompassConfig {
    fn default() -> Self {
        CompassDesign::r500().to_config()
    }
}

impl Compass {
    /// Creates a compass from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the inertia or magnetic moment
    /// is not strictly positive, the damping or friction is negative, any
    /// value is not finite, or the imbalance reaches ±90°.
    pub fn new(config: CompassConfig) -> Result<Self, Error> {
        let CompassConfig {
            moment_of_inertia,
            magnetic_moment,
            damping_coefficient,
            static_imbalance,
            dry_friction,
        } = config;

        let static_imbalance = check_within(static_imbalance.get::<radian>(), FRAC_PI_2)
            .map_err(Error::invalid("static_imbalance"))?;

        Ok(Self {
            moment_of_inertia: Constrained::new(moment_of_inertia)
                .map_err(Error::invalid("moment_of_inertia"))?,
            magnetic_moment: Constrained::new(magnetic_moment)
                .map_err(Error::invalid("magnetic_moment"))?,
            damping_coefficient: Constrained::new(damping_coefficient)
                .map_err(Error::invalid("damping_coefficient"))?,
            static_imbalance: Angle::new::<radian>(static_imbalance),
            dry_friction: Constrained::new(dry_friction).map_err(Error::invalid("dry_friction"))?,
        })
    }

    /// Creates a compass from the geometry of a real design.
    ///
    /// # Errors
    ///
    /// See [`Compass::new`].
    pub fn from_design(design: &CompassDesign) -> Result<Self, Error> {
        Self::new(design.to_config())
    }

    #[must_use]
    pub fn moment_of_inertia(&self) -> MomentOfInertia {
        self.moment_of_inertia.into_inner()
    }

    #[must_use]
    pub fn magnetic_moment(&self) -> MagneticMoment {
        self.magnetic_moment.into_inner()
    }

    /// Viscous damping coefficient in N·m·s/rad.
    #[must_use]
    pub fn damping_coefficient(&self) -> f64 {
        self.damping_coefficient.into_inner()
    }

    #[must_use]
    pub fn static_imbalance(&self) -> Angle {
        self.static_imbalance
    }

    #[must_use]
    pub fn dry_friction(&self) -> Torque {
        self.dry_friction.into_inner()
    }

    /// Product `m B` of magnetic moment and horizontal field, in N·m.
    fn magnetic_coupling(&self, field: &MagneticField) -> f64 {
        self.magnetic_moment().get::<ampere_square_meter>() * field.magnitude().get::<tesla>()
    }

    /// Dipole torque on a needle pointing at `angle`, `-m B sin(θ - φ)`.
    #[must_use]
    pub fn magnetic_torque(&self, angle: Angle, field: &MagneticField) -> Torque {
        let relative = angle.get::<radian>() - field.direction().get::<radian>();
        Torque::new::<newton_meter>(-self.magnetic_coupling(field) * relative.sin())
    }

    /// Viscous torque plus kinetic friction, `-c ω - sign(ω) f`.
    ///
    /// Zero for a needle at rest; use [`Compass::friction_torque`] when the
    /// driving torque on a resting needle is known.
    #[must_use]
    pub fn damping_torque(&self, angular_velocity: AngularVelocity) -> Torque {
        let omega = angular_velocity.get::<radian_per_second>();
        if omega == 0.0 {
            return Torque::new::<newton_meter>(0.0);
        }
        let viscous = -self.damping_coefficient() * omega;
        Torque::new::<newton_meter>(viscous) - self.dry_friction() * omega.signum()
    }

    /// Coulomb friction at the pivot with a static/kinetic split.
    ///
    /// A moving needle sees `-sign(ω) f`. A resting needle is held as long
    /// as the driving torque does not exceed `f`; past that it breaks away
    /// against `-sign(driving) f`.
    #[must_use]
    pub fn friction_torque(&self, angular_velocity: AngularVelocity, driving: Torque) -> Torque {
        let omega = angular_velocity.get::<radian_per_second>();
        let friction = self.dry_friction();
        if omega != 0.0 {
            return -friction * omega.signum();
        }
        if driving.abs() <= friction {
            -driving
        } else {
            -friction * driving.get::<newton_meter>().signum()
        }
    }

    /// Rest angle in `field`, the field direction shifted by the imbalance.
    #[must_use]
    pub fn equilibrium(&self, field: &MagneticField) -> Angle {
        Angle::new::<radian>(wrap_to_tau(
            field.direction().get::<radian>() + self.static_imbalance.get::<radian>(),
        ))
    }

    /// Linearized restoring stiffness about equilibrium, `m B / cos δ`, in N·m/rad.
    #[must_use]
    pub fn restoring_stiffness(&self, field: &MagneticField) -> f64 {
        self.magnetic_coupling(field) / self.static_imbalance.get::<radian>().cos()
    }

    /// Undamped natural angular frequency `√(k / I)`.
    #[must_use]
    pub fn natural_frequency(&self, field: &MagneticField) -> AngularVelocity {
        let inertia = self.moment_of_inertia().get::<kilogram_square_meter>();
        AngularVelocity::new::<radian_per_second>(
            (self.restoring_stiffness(field) / inertia).sqrt(),
        )
    }

    /// Undamped natural period `2π √(I / k)`.
    #[must_use]
    pub fn natural_period(&self, field: &MagneticField) -> Time {
        Time::new::<second>(TAU / self.natural_frequency(field).get::<radian_per_second>())
    }

    /// Damping coefficient that makes the motion critically damped, `2 √(I k)`.
    #[must_use]
    pub fn critical_damping(&self, field: &MagneticField) -> f64 {
        let inertia = self.moment_of_inertia().get::<kilogram_square_meter>();
        2.0 * (inertia * self.restoring_stiffness(field)).sqrt()
    }

    #[must_use]
    pub fn damping_ratio(&self, field: &MagneticField) -> f64 {
        self.damping_coefficient() / self.critical_damping(field)
    }
}
