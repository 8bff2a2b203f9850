use compass_core::State;

/// Event emitted by the ODE solver after each accepted step.
#[derive(Debug, Clone, Copy)]
pub struct Event<const N: usize> {
    /// Number of accepted steps so far (1-based).
    pub step: usize,

    /// State at the end of the accepted step.
    pub state: State<N>,
}
