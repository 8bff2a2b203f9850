//! Geometry of a liquid-filled compass capsule and its needle.
//!
//! The mechanical constants of a [`Compass`](super::Compass) follow from the
//! needle dimensions, the magnet fitted to it and the liquid it turns in.
//! The needle is modelled as a flat plate of length `L` and width `W` on a
//! friction disk of radius `r`; the liquid films of thickness `z_h` above and
//! `z_b` below shear as the needle turns.

use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uom::si::{
    angle::radian,
    dynamic_viscosity::pascal_second,
    f64::{
        Angle, DynamicViscosity, Length, MagneticFluxDensity, MagneticMoment, Mass, MassDensity,
        MomentOfInertia, Torque, Volume,
    },
    length::meter,
    magnetic_flux_density::tesla,
    magnetic_moment::ampere_square_meter,
    mass::kilogram,
    mass_density::kilogram_per_cubic_meter,
    moment_of_inertia::kilogram_square_meter,
    torque::newton_meter,
    volume::cubic_meter,
};

use super::{CompassConfig, magnet::MagnetProperties};

/// Vacuum permeability in T·m/A.
pub const VACUUM_PERMEABILITY: f64 = 4.0e-7 * PI;

/// Dimensions and materials of a compass needle assembly.
///
/// The default is the GEONAUTE R500 orienteering compass.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct CompassDesign {
    pub needle_length: Length,
    pub needle_width: Length,
    pub needle_thickness: Length,
    pub needle_density: MassDensity,
    pub disk_radius: Length,
    pub disk_thickness: Length,

    /// Remanent flux density of the magnet material.
    pub remanence: MagneticFluxDensity,
    pub magnet_volume: Volume,
    pub magnet_mass: Mass,
    /// Moment of inertia of the magnet about its own center.
    pub magnet_inertia: MomentOfInertia,
    /// Distance from the pivot to the magnet's center of mass.
    ///
    /// Negative values place the magnet below the pivot.
    pub magnet_offset: Length,

    pub liquid_density: MassDensity,
    pub liquid_viscosity: DynamicViscosity,
    /// Liquid film thickness above the needle.
    pub upper_gap: Length,
    /// Liquid film thickness below the needle.
    pub lower_gap: Length,
}

impl Default for CompassDesign {
    fn default() -> Self {
        Self::r500()
    }
}

impl CompassDesign {
    /// The GEONAUTE R500 baseplate compass.
    #[must_use]
    pub fn r500() -> Self {
        Self {
            needle_length: Length::new::<meter>(0.032),
            needle_width: Length::new::<meter>(0.008),
            needle_thickness: Length::new::<meter>(0.00025),
            needle_density: MassDensity::new::<kilogram_per_cubic_meter>(1200.0),
            disk_radius: Length::new::<meter>(0.0115),
            disk_thickness: Length::new::<meter>(0.0001),
            remanence: MagneticFluxDensity::new::<tesla>(1.3),
            magnet_volume: Volume::new::<cubic_meter>(6e-8),
            magnet_mass: Mass::new::<kilogram>(0.00045),
            magnet_inertia: MomentOfInertia::new::<kilogram_square_meter>(5.1e-9),
            magnet_offset: Length::new::<meter>(-0.0005),
            liquid_density: MassDensity::new::<kilogram_per_cubic_meter>(700.0),
            liquid_viscosity: DynamicViscosity::new::<pascal_second>(1.08),
            upper_gap: Length::new::<meter>(0.004),
            lower_gap: Length::new::<meter>(0.004),
        }
    }

    /// Returns this design fitted with a different magnet.
    #[must_use]
    pub fn with_magnet(self, magnet: MagnetProperties) -> Self {
        Self {
            magnet_volume: magnet.volume,
            magnet_mass: magnet.mass,
            magnet_inertia: magnet.moment_of_inertia,
            ..self
        }
    }

    /// Returns this design with the magnet moved to `offset` from the pivot.
    #[must_use]
    pub fn with_magnet_offset(self, offset: Length) -> Self {
        Self {
            magnet_offset: offset,
            ..self
        }
    }

    /// Moment of inertia of disk, needle plate and magnet about the pivot.
    #[must_use]
    pub fn moment_of_inertia(&self) -> MomentOfInertia {
        let length = self.needle_length.get::<meter>();
        let width = self.needle_width.get::<meter>();
        let thickness = self.needle_thickness.get::<meter>();
        let density = self.needle_density.get::<kilogram_per_cubic_meter>();
        let radius = self.disk_radius.get::<meter>();
        let offset = self.magnet_offset.get::<meter>();

        let disk = PI * radius.powi(4) * self.disk_thickness.get::<meter>() * density / 2.0;
        let plate =
            length * width * thickness * density * (length.powi(2) + width.powi(2)) / 12.0;
        let magnet = self.magnet_inertia.get::<kilogram_square_meter>()
            + self.magnet_mass.get::<kilogram>() * offset.powi(2);

        MomentOfInertia::new::<kilogram_square_meter>(disk + plate + magnet)
    }

    /// Viscous damping coefficient of the liquid films, in N·m·s/rad.
    ///
    /// Couette shear over the disk and over the needle arms beyond it.
    #[must_use]
    pub fn viscous_coefficient(&self) -> f64 {
        let length = self.needle_length.get::<meter>();
        let width = self.needle_width.get::<meter>();
        let radius = self.disk_radius.get::<meter>();
        let films = 1.0 / self.upper_gap.get::<meter>() + 1.0 / self.lower_gap.get::<meter>();

        let disk = PI * radius.powi(4) / 2.0;
        let arms = (length.powi(3) / 8.0 - radius.powi(3)) * width / 3.0
            + (length / 2.0 - radius) * width.powi(3) / 12.0;

        self.liquid_viscosity.get::<pascal_second>() * films * (disk + arms)
    }

    /// Magnetic moment of the magnet, `Br V / μ0`.
    #[must_use]
    pub fn magnetic_moment(&self) -> MagneticMoment {
        MagneticMoment::new::<ampere_square_meter>(
            self.remanence.get::<tesla>() * self.magnet_volume.get::<cubic_meter>()
                / VACUUM_PERMEABILITY,
        )
    }

    /// Magnet mass less the mass of liquid it displaces.
    #[must_use]
    pub fn buoyant_mass(&self) -> Mass {
        self.magnet_mass - self.liquid_density * self.magnet_volume
    }

    /// First moment of the magnet mass about the pivot, in kg·m.
    #[must_use]
    pub fn mass_moment(&self) -> f64 {
        self.magnet_mass.get::<kilogram>() * self.magnet_offset.get::<meter>()
    }

    /// Converts the design into compass options.
    ///
    /// The design carries no in-plane imbalance or pivot friction.
    #[must_use]
    pub fn to_config(&self) -> CompassConfig {
        CompassConfig {
            moment_of_inertia: self.moment_of_inertia(),
            magnetic_moment: self.magnetic_moment(),
            damping_coefficient: self.viscous_coefficient(),
            static_imbalance: Angle::new::<radian>(0.0),
            dry_friction: Torque::new::<newton_meter>(0.0),
        }
    }
}
