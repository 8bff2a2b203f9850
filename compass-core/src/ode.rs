/// A system of first-order ordinary differential equations with `N` state
/// variables.
///
/// Higher-order equations of motion are reduced to this form by stacking
/// the variable and its derivatives, e.g. `[angle, angular_velocity]` for a
/// needle rotating about its pivot.
pub trait OdeModel<const N: usize> {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Evaluates the state derivative at time `x` and state `y`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the derivative cannot be evaluated.
    fn derivative(&self, x: f64, y: &[f64; N]) -> Result<[f64; N], Self::Error>;
}

/// The state of an ODE system at a given point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State<const N: usize> {
    /// The independent variable (typically time).
    pub x: f64,

    /// The dependent variables at this point.
    ///
    /// The order of values matches the array returned by
    /// [`OdeModel::derivative`].
    pub y: [f64; N],
}

impl<const N: usize> State<N> {
    /// Creates a state from an independent variable and dependent values.
    pub fn new(x: f64, y: [f64; N]) -> Self {
        Self { x, y }
    }
}
