//! Static balance of a compass held out of level.
//!
//! The vertical field component pulls the north end of the needle down. A
//! magnet mounted below the pivot counters that with gravity, less the
//! buoyancy of the liquid. When the two torques do not cancel, tilting the
//! capsule turns the needle away from the field, which is the heading error
//! computed here.

use compass_core::constraint::{Constrained, NonNegative};
use uom::si::{
    angle::radian,
    f64::{Angle, Length},
    length::meter,
    magnetic_flux_density::tesla,
    magnetic_moment::ampere_square_meter,
    mass::kilogram,
    mass_density::kilogram_per_cubic_meter,
    volume::cubic_meter,
};

use crate::{compass::CompassDesign, field::MagneticField};

/// Gravitational acceleration in m/s².
pub const GRAVITY: f64 = 9.81;

/// Tilt balance of one design in one field.
#[derive(Debug, Clone, Copy)]
pub struct TiltAnalysis<'a> {
    design: &'a CompassDesign,
    field: &'a MagneticField,
}

impl<'a> TiltAnalysis<'a> {
    #[must_use]
    pub fn new(design: &'a CompassDesign, field: &'a MagneticField) -> Self {
        Self { design, field }
    }

    /// Magnet offset that cancels the vertical-field torque,
    /// `-m B_v / (g (m_magnet - ρ V))`.
    ///
    /// A magnet lighter than the liquid it displaces gives an offset above
    /// the pivot.
    #[must_use]
    pub fn optimal_offset(&self) -> Length {
        let moment = self.design.magnetic_moment().get::<ampere_square_meter>();
        let vertical = self.field.vertical_component().get::<tesla>();
        let buoyant_mass = self.design.buoyant_mass().get::<kilogram>();

        Length::new::<meter>(-moment * vertical / (GRAVITY * buoyant_mass))
    }

    /// Heading error of the needle when the capsule is tilted by `tilt`.
    ///
    /// `atan(((ρ V - m_magnet) g x / (m B_h) - tan i) sin(tilt))`
    #[must_use]
    pub fn needle_error(&self, tilt: Angle) -> Angle {
        let design = self.design;
        let displaced = design.liquid_density.get::<kilogram_per_cubic_meter>()
            * design.magnet_volume.get::<cubic_meter>();
        let gravity_torque = (displaced - design.magnet_mass.get::<kilogram>())
            * GRAVITY
            * design.magnet_offset.get::<meter>();
        let magnetic_torque = design.magnetic_moment().get::<ampere_square_meter>()
            * self.field.magnitude().get::<tesla>();
        let dip = self.field.inclination().get::<radian>().tan();

        Angle::new::<radian>(
            ((gravity_torque / magnetic_torque - dip) * tilt.get::<radian>().sin()).atan(),
        )
    }

    /// Whether tilting up to `tilt_limit` keeps the heading error within
    /// `error_limit`.
    ///
    /// The error grows with the tilt, so only the limit itself is checked.
    #[must_use]
    pub fn is_acceptable(&self, tilt_limit: Angle, error_limit: Angle) -> bool {
        let Ok(error_limit) = Constrained::<_, NonNegative>::new(error_limit.get::<radian>())
        else {
            return false;
        };
        self.needle_error(tilt_limit).get::<radian>().abs() <= error_limit.into_inner()
    }
}
