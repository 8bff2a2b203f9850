use std::cmp::Ordering;

use num_traits::Zero;

use super::{Constraint, ConstraintError, is_infinite};

/// Marker type enforcing that a value is zero or greater and finite.
///
/// Used for dissipative parameters where zero is the ideal, lossless case,
/// such as viscous damping or dry friction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonNegative;

impl<T: PartialOrd + Zero + Clone> Constraint<T> for NonNegative {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match value.partial_cmp(&T::zero()) {
            Some(Ordering::Greater) if is_infinite(value) => Err(ConstraintError::Infinite),
            Some(Ordering::Greater | Ordering::Equal) => Ok(()),
            Some(Ordering::Less) => Err(ConstraintError::Negative),
            None => Err(ConstraintError::NotANumber),
        }
    }
}
