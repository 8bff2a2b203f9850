//! Core traits and types for compass needle simulation.
//!
//! This crate defines the shared abstractions that the solver and the
//! physical models build on:
//!
//! - [`constraint`]: numeric invariants checked once at construction
//! - [`OdeModel`]: a system of first-order ODEs with `N` state variables
//! - [`State`]: a point on the solution of an [`OdeModel`]
//! - [`Observer`]: receives solver events and optionally returns control actions
//! - [`angle`]: helpers for angles taken modulo a full turn

pub mod angle;
pub mod constraint;
mod observer;
mod ode;

pub use observer::Observer;
pub use ode::{OdeModel, State};
