//! The ambient magnetic field acting on the needle.

use std::f64::consts::FRAC_PI_2;

use compass_core::{
    angle::wrap_to_tau,
    constraint::{Constrained, StrictlyPositive, check_finite, check_within},
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uom::si::{
    angle::{degree, radian},
    f64::{Angle, MagneticFluxDensity},
    magnetic_flux_density::tesla,
};

use crate::Error;

/// Total field intensity at Lille, France, in tesla.
pub const LILLE_TOTAL_INTENSITY: f64 = 4.8699e-5;

/// Field inclination at Lille, France, in degrees.
pub const LILLE_INCLINATION: f64 = 65.822;

/// A magnetic field seen from the plane of needle rotation.
///
/// The needle only responds to the horizontal part of the field, described
/// by `magnitude` and `direction`. The dip below the horizontal is kept as
/// `inclination` for the static tilt balance of the needle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagneticField {
    magnitude: Constrained<MagneticFluxDensity, StrictlyPositive>,
    direction: Angle,
    inclination: Angle,
}

/// Options for building a [`MagneticField`].
///
/// The default is the field at Lille, France.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct FieldConfig {
    /// Horizontal flux density.
    pub magnitude: MagneticFluxDensity,

    /// Heading of the horizontal field, taken modulo a full turn.
    pub direction: Angle,

    /// Dip of the full field below the horizontal.
    pub inclination: Angle,
}

impl Default for FieldConfig {
    fn default() -> Self {
        let inclination = Angle::new::<degree>(LILLE_INCLINATION);
        Self {
            magnitude: MagneticFluxDensity::new::<tesla>(
                LILLE_TOTAL_INTENSITY * inclination.get::<radian>().cos(),
            ),
            direction: Angle::new::<radian>(0.0),
            inclination,
        }
    }
}

impl MagneticField {
    /// Creates a horizontal field with no inclination.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the magnitude is not strictly
    /// positive or the direction is not finite.
    pub fn new(magnitude: MagneticFluxDensity, direction: Angle) -> Result<Self, Error> {
        Self::from_config(&FieldConfig {
            magnitude,
            direction,
            inclination: Angle::new::<radian>(0.0),
        })
    }

    /// Creates a field from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the inclination is not strictly
    /// between -90° and 90°, the magnitude is not strictly positive, or the
    /// direction is not finite.
    pub fn from_config(config: &FieldConfig) -> Result<Self, Error> {
        let inclination = check_within(config.inclination.get::<radian>(), FRAC_PI_2)
            .map_err(Error::invalid("inclination"))?;
        let magnitude = Constrained::new(config.magnitude).map_err(Error::invalid("magnitude"))?;
        let direction =
            check_finite(config.direction.get::<radian>()).map_err(Error::invalid("direction"))?;

        Ok(Self {
            magnitude,
            direction: Angle::new::<radian>(wrap_to_tau(direction)),
            inclination: Angle::new::<radian>(inclination),
        })
    }

    /// Creates a field from the intensity of the full (inclined) field.
    ///
    /// # Errors
    ///
    /// See [`MagneticField::from_config`].
    pub fn from_total_intensity(
        intensity: MagneticFluxDensity,
        inclination: Angle,
        direction: Angle,
    ) -> Result<Self, Error> {
        Self::from_config(&FieldConfig {
            magnitude: intensity * inclination.get::<radian>().cos(),
            direction,
            inclination,
        })
    }

    /// Horizontal flux density.
    #[must_use]
    pub fn magnitude(&self) -> MagneticFluxDensity {
        self.magnitude.into_inner()
    }

    /// Heading of the horizontal field in `[0, 2π)`.
    #[must_use]
    pub fn direction(&self) -> Angle {
        self.direction
    }

    #[must_use]
    pub fn inclination(&self) -> Angle {
        self.inclination
    }

    /// Vertical flux density, positive downward.
    #[must_use]
    pub fn vertical_component(&self) -> MagneticFluxDensity {
        self.magnitude() * self.inclination.get::<radian>().tan()
    }

    /// Intensity of the full field.
    #[must_use]
    pub fn total_intensity(&self) -> MagneticFluxDensity {
        self.magnitude() / self.inclination.get::<radian>().cos()
    }

    /// Component of the horizontal field along a needle pointing at `angle`.
    #[must_use]
    pub fn field_component(&self, angle: Angle) -> MagneticFluxDensity {
        self.magnitude() * (angle.get::<radian>() - self.direction.get::<radian>()).cos()
    }
}
