use compass_core::State;

/// Indicates how the solver terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Integrated across the whole requested interval.
    Complete,

    /// Ran out of the configured step budget before reaching the end.
    ///
    /// The states cover the interval up to the point where the budget ran
    /// out and are valid, just incomplete.
    StepBudgetExhausted,

    /// Stopped early due to an observer action.
    StoppedByObserver,
}

/// Work counters collected during integration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Number of model derivative evaluations.
    pub evaluations: u32,

    /// Number of accepted integration steps.
    pub accepted_steps: usize,
}

/// The result of an ODE integration.
#[derive(Debug, Clone)]
pub struct Solution<const N: usize> {
    /// How the solver terminated.
    pub status: Status,

    /// States on the output grid, starting with the initial state.
    pub states: Vec<State<N>>,

    /// Work counters.
    pub stats: Stats,
}

impl<const N: usize> Solution<N> {
    /// Returns the last state reached by the solver.
    #[must_use]
    pub fn last(&self) -> Option<&State<N>> {
        self.states.last()
    }
}
