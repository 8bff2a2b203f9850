#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Supported numerical integration methods.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Method {
    /// Classic fixed-step 4th-order Runge–Kutta method.
    ///
    /// Steps exactly on the output grid. Does not adapt step size based on
    /// local error, so the output step must resolve the fastest dynamics.
    Rk4,

    /// Adaptive Dormand–Prince 5(4) Runge–Kutta method.
    ///
    /// An explicit embedded method that keeps the local error within
    /// `abs_tol + rel_tol * |y|`. Dense output places states on the output
    /// grid independently of the internal step size.
    Dopri5 { abs_tol: f64, rel_tol: f64 },

    /// Adaptive Dormand–Prince 8(5,3) Runge–Kutta method.
    ///
    /// Higher order and more expensive per step than [`Method::Dopri5`],
    /// useful when very tight tolerances are needed over long horizons.
    Dop853 { abs_tol: f64, rel_tol: f64 },
}

impl Method {
    /// Absolute tolerance used by [`Method::Dopri5`] by default.
    pub const DEFAULT_ABS_TOL: f64 = 1e-10;

    /// Relative tolerance used by [`Method::Dopri5`] by default.
    pub const DEFAULT_REL_TOL: f64 = 1e-8;

    /// Returns the same method with both tolerances multiplied by `factor`.
    ///
    /// Fixed-step [`Method::Rk4`] is returned unchanged.
    #[must_use]
    pub fn scale_tolerances(self, factor: f64) -> Self {
        match self {
            Self::Rk4 => Self::Rk4,
            Self::Dopri5 { abs_tol, rel_tol } => Self::Dopri5 {
                abs_tol: abs_tol * factor,
                rel_tol: rel_tol * factor,
            },
            Self::Dop853 { abs_tol, rel_tol } => Self::Dop853 {
                abs_tol: abs_tol * factor,
                rel_tol: rel_tol * factor,
            },
        }
    }

    /// Relative tolerance of an adaptive method, `None` for [`Method::Rk4`].
    #[must_use]
    pub fn relative_tolerance(&self) -> Option<f64> {
        match self {
            Self::Rk4 => None,
            Self::Dopri5 { rel_tol, .. } | Self::Dop853 { rel_tol, .. } => Some(*rel_tol),
        }
    }
}

impl Default for Method {
    fn default() -> Self {
        Self::Dopri5 {
            abs_tol: Self::DEFAULT_ABS_TOL,
            rel_tol: Self::DEFAULT_REL_TOL,
        }
    }
}

/// Configuration for the ODE solver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Config {
    /// Integration method and its tolerances.
    pub method: Method,

    /// Maximum number of steps an adaptive method may take.
    ///
    /// Exhausting the budget ends the run with
    /// [`Status::StepBudgetExhausted`](super::Status::StepBudgetExhausted).
    pub max_steps: u32,

    /// Whether adaptive methods report stiffness as an error.
    ///
    /// Heavily damped needles are stiff; with detection off the explicit
    /// methods keep going at stability-limited step sizes until the step
    /// budget runs out.
    pub detect_stiffness: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            method: Method::default(),
            max_steps: 100_000,
            detect_stiffness: false,
        }
    }
}

impl Config {
    /// Validates that tolerances are finite and positive and that the step
    /// budget is non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<(), &'static str> {
        match self.method {
            Method::Rk4 => {}
            Method::Dopri5 { abs_tol, rel_tol } | Method::Dop853 { abs_tol, rel_tol } => {
                if !abs_tol.is_finite() || abs_tol <= 0.0 {
                    return Err("abs_tol must be finite and positive");
                }
                if !rel_tol.is_finite() || rel_tol <= 0.0 {
                    return Err("rel_tol must be finite and positive");
                }
            }
        }
        if self.max_steps == 0 {
            return Err("max_steps must be at least one");
        }
        Ok(())
    }

    /// Stiffness check interval handed to the adaptive steppers.
    ///
    /// The steppers test for stiffness every `n` accepted steps; an interval
    /// that is never reached turns the check off.
    pub(crate) fn stiffness_interval(&self) -> u32 {
        if self.detect_stiffness { 1000 } else { u32::MAX }
    }
}
