//! Dynamics of an orienteering compass needle.
//!
//! A [`Compass`] is a magnetized needle on a vertical pivot, damped by the
//! liquid filling its capsule. A [`MagneticField`] pulls it toward magnetic
//! north. [`Dynamic`] disturbs the needle, integrates its motion and answers
//! three questions about it:
//!
//! - balance: where does it come to rest?
//! - stability: does it converge on equilibrium?
//! - rapidity: how quickly does it settle?
//!
//! The supporting modules cover the rest of a compass study:
//!
//! - [`compass::design`]: derives the constants from capsule and magnet geometry
//! - [`tilt`]: static needle error when the compass is not held level
//! - [`excitation`]: shaking of the compass by a running orienteer
//! - [`metrics`]: pure summaries of a sampled trajectory
//!
//! # Example
//!
//! ```
//! use compass_dynamics::{Compass, Dynamic, DynamicConfig, FieldConfig, MagneticField};
//! use uom::si::{f64::Time, time::second};
//!
//! let compass = Compass::new(Default::default())?;
//! let field = MagneticField::from_config(&FieldConfig::default())?;
//! let config = DynamicConfig {
//!     time_span: Time::new::<second>(1.0),
//!     ..DynamicConfig::default()
//! };
//!
//! let mut dynamic = Dynamic::new(&compass, &field, config)?;
//! let report = dynamic.balance()?;
//! assert!(!report.trajectory.is_empty());
//! # Ok::<(), compass_dynamics::Error>(())
//! ```

pub mod compass;
pub mod dynamic;
mod error;
pub mod excitation;
pub mod field;
pub mod metrics;
pub mod tilt;

pub use compass::{Compass, CompassConfig, CompassDesign};
pub use dynamic::{Dynamic, DynamicConfig, Status};
pub use error::Error;
pub use field::{FieldConfig, MagneticField};
