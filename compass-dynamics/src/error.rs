use compass_core::constraint::ConstraintError;
use compass_solve::ode;
use thiserror::Error;

/// Errors returned while building or running a compass simulation.
///
/// A needle that never settles or a horizon that is too short are not
/// errors; they are reported through [`Status`](crate::dynamic::Status).
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        #[source]
        reason: ConstraintError,
    },

    #[error("invalid solver config: {reason}")]
    InvalidSolverConfig { reason: &'static str },

    #[error(transparent)]
    Integration(#[from] ode::Error),
}

impl Error {
    /// Returns a closure that tags a constraint violation with a parameter name.
    pub(crate) fn invalid(name: &'static str) -> impl FnOnce(ConstraintError) -> Self {
        move |reason| Self::InvalidParameter { name, reason }
    }
}
