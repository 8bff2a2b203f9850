use std::cmp::Ordering;

use num_traits::Zero;

use super::{Constraint, ConstraintError, is_infinite};

/// Marker type enforcing that a value is strictly positive (greater than zero)
/// and finite.
///
/// Used for parameters that divide or take square roots, such as a moment of
/// inertia or a field magnitude.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StrictlyPositive;

impl<T: PartialOrd + Zero + Clone> Constraint<T> for StrictlyPositive {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match value.partial_cmp(&T::zero()) {
            Some(Ordering::Greater) if is_infinite(value) => Err(ConstraintError::Infinite),
            Some(Ordering::Greater) => Ok(()),
            Some(Ordering::Equal) => Err(ConstraintError::Zero),
            Some(Ordering::Less) => Err(ConstraintError::Negative),
            None => Err(ConstraintError::NotANumber),
        }
    }
}
