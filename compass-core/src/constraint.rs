//! Type-level numeric constraints checked at construction time.
//!
//! Physical parameters such as a moment of inertia or a damping coefficient
//! only make sense within a range. Wrapping them in [`Constrained`] moves the
//! check to the one place a value is created, so models can trust their
//! parameters without re-validating them on every evaluation.
//!
//! # Provided Constraints
//!
//! - [`NonNegative`]: Zero or greater, and finite
//! - [`StrictlyPositive`]: Greater than zero, and finite
//!
//! Both work with plain floats and with `uom` quantities.

mod non_negative;
mod strictly_positive;

use std::marker::PhantomData;

use num_traits::Zero;
use thiserror::Error;

pub use non_negative::NonNegative;
pub use strictly_positive::StrictlyPositive;

/// A trait for enforcing numeric invariants at construction time.
pub trait Constraint<T> {
    /// Checks that the given value satisfies this constraint.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstraintError`] if the value does not satisfy the constraint.
    fn check(value: &T) -> Result<(), ConstraintError>;
}

/// An error returned when a numeric invariant is violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConstraintError {
    #[error("value must not be negative")]
    Negative,
    #[error("value must not be zero")]
    Zero,
    #[error("value is not a number")]
    NotANumber,
    #[error("value must be finite")]
    Infinite,
    #[error("value is below the minimum allowed")]
    BelowMinimum,
    #[error("value is above the maximum allowed")]
    AboveMaximum,
}

/// A wrapper enforcing a numeric constraint at construction time.
///
/// # Example
///
/// ```
/// use compass_core::constraint::{Constrained, StrictlyPositive};
///
/// let inertia = Constrained::<_, StrictlyPositive>::new(1.5e-8).unwrap();
/// assert_eq!(inertia.into_inner(), 1.5e-8);
///
/// assert!(Constrained::<_, StrictlyPositive>::new(0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Constrained<T, C: Constraint<T>> {
    value: T,
    _marker: PhantomData<C>,
}

impl<T, C: Constraint<T>> Constrained<T, C> {
    /// Constructs a new constrained value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not satisfy the constraint.
    pub fn new(value: T) -> Result<Self, ConstraintError> {
        C::check(&value)?;
        Ok(Self {
            value,
            _marker: PhantomData,
        })
    }

    /// Consumes the wrapper and returns the inner value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T, C: Constraint<T>> AsRef<T> for Constrained<T, C> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

/// Whether a non-zero value absorbs itself under addition, which for floats
/// and float quantities means it is infinite.
fn is_infinite<T: Zero + Clone + PartialEq>(value: &T) -> bool {
    !value.is_zero() && value.clone() + value.clone() == *value
}

/// Checks that a float is finite, for parameters with no sign restriction.
///
/// # Errors
///
/// Returns [`ConstraintError::NotANumber`] for NaN and
/// [`ConstraintError::Infinite`] for either infinity.
pub fn check_finite(value: f64) -> Result<f64, ConstraintError> {
    if value.is_nan() {
        Err(ConstraintError::NotANumber)
    } else if value.is_infinite() {
        Err(ConstraintError::Infinite)
    } else {
        Ok(value)
    }
}

/// Checks that a float lies strictly inside `(-limit, limit)`.
///
/// # Errors
///
/// Returns a [`ConstraintError`] if the value is not finite or its magnitude
/// reaches `limit`.
pub fn check_within(value: f64, limit: f64) -> Result<f64, ConstraintError> {
    let value = check_finite(value)?;
    if value <= -limit {
        Err(ConstraintError::BelowMinimum)
    } else if value >= limit {
        Err(ConstraintError::AboveMaximum)
    } else {
        Ok(value)
    }
}
