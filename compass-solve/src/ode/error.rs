use std::error::Error as StdError;

use thiserror::Error;

/// Errors that can occur during ODE integration.
///
/// Running out of steps is not an error; it is reported through
/// [`Status::StepBudgetExhausted`](super::Status::StepBudgetExhausted).
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: &'static str },

    #[error("step size underflow at x = {x}")]
    StepSizeUnderflow { x: f64 },

    #[error("problem became stiff at x = {x}")]
    StiffnessDetected { x: f64 },

    #[error("model evaluation failed at x = {x}")]
    Model {
        x: f64,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("model returned a non-finite derivative at x = {x}")]
    NonFiniteDerivative { x: f64 },
}
