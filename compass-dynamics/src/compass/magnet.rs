//! Mass properties of the permanent magnets fitted to a needle.

use std::f64::consts::PI;

use uom::si::{
    f64::{Length, Mass, MassDensity, MomentOfInertia, Volume},
    length::meter,
    mass::kilogram,
    mass_density::kilogram_per_cubic_meter,
    moment_of_inertia::kilogram_square_meter,
    volume::cubic_meter,
};

/// Volume, mass and own moment of inertia of a magnet assembly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnetProperties {
    pub volume: Volume,
    pub mass: Mass,
    /// Moment of inertia about the pivot axis through the magnet's center.
    pub moment_of_inertia: MomentOfInertia,
}

impl MagnetProperties {
    fn from_si(volume: f64, mass: f64, moment_of_inertia: f64) -> Self {
        Self {
            volume: Volume::new::<cubic_meter>(volume),
            mass: Mass::new::<kilogram>(mass),
            moment_of_inertia: MomentOfInertia::new::<kilogram_square_meter>(moment_of_inertia),
        }
    }
}

/// Two parallel cylindrical magnets lying along the needle.
///
/// The cylinders have the given `radius` and `length` and sit
/// `center_distance` on either side of the needle axis.
#[must_use]
pub fn double_cylindrical(
    radius: Length,
    length: Length,
    center_distance: Length,
    density: MassDensity,
) -> MagnetProperties {
    let r = radius.get::<meter>();
    let l = length.get::<meter>();
    let d = center_distance.get::<meter>();

    let volume = 2.0 * PI * r.powi(2) * l;
    let mass = volume * density.get::<kilogram_per_cubic_meter>();
    let inertia = mass * (r.powi(2) / 4.0 + l.powi(2) / 12.0 + d.powi(2));

    MagnetProperties::from_si(volume, mass, inertia)
}

/// The double cylindrical magnet used by default: 0.75 mm radius, 10 mm long,
/// 1.5 mm off axis, sintered at 7500 kg/m³.
#[must_use]
pub fn default_double_cylindrical() -> MagnetProperties {
    double_cylindrical(
        Length::new::<meter>(0.00075),
        Length::new::<meter>(0.01),
        Length::new::<meter>(0.0015),
        MassDensity::new::<kilogram_per_cubic_meter>(7500.0),
    )
}

/// A single rectangular bar magnet.
#[must_use]
pub fn parallelepiped(
    length: Length,
    width: Length,
    thickness: Length,
    density: MassDensity,
) -> MagnetProperties {
    let l = length.get::<meter>();
    let w = width.get::<meter>();

    let volume = l * w * thickness.get::<meter>();
    let mass = volume * density.get::<kilogram_per_cubic_meter>();
    let inertia = mass * (l.powi(2) + w.powi(2)) / 12.0;

    MagnetProperties::from_si(volume, mass, inertia)
}

/// The 10 × 6 × 1 mm bar magnet used by default, at 7500 kg/m³.
#[must_use]
pub fn default_parallelepiped() -> MagnetProperties {
    parallelepiped(
        Length::new::<meter>(0.01),
        Length::new::<meter>(0.006),
        Length::new::<meter>(0.001),
        MassDensity::new::<kilogram_per_cubic_meter>(7500.0),
    )
}
