//! Helpers for angles taken modulo a full turn.
//!
//! All functions work in radians.

use std::f64::consts::{PI, TAU};

/// Wraps an angle into the half-open interval `(-π, π]`.
///
/// Zero maps to exactly zero, so a needle resting on its equilibrium has no
/// deviation at all rather than a rounding residue.
#[must_use]
pub fn wrap_to_pi(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Wraps an angle into the half-open interval `[0, 2π)`.
#[must_use]
pub fn wrap_to_tau(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // `rem_euclid` can round up to exactly `TAU` for tiny negative inputs.
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Returns the signed difference `to - from` wrapped into `(-π, π]`.
#[must_use]
pub fn difference(to: f64, from: f64) -> f64 {
    wrap_to_pi(to - from)
}
