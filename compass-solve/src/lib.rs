//! Numerical solvers for compass needle simulation.
//!
//! - [`ode`]: integrates an [`OdeModel`] with fixed-step or adaptive
//!   Runge–Kutta methods and reports states on a fixed output grid
//!
//! [`OdeModel`]: compass_core::OdeModel

pub mod ode;
