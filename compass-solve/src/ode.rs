//! Integration of [`OdeModel`]s over a fixed output grid.
//!
//! The actual stepping is delegated to the `ode_solvers` crate. This module
//! adapts a model to that crate's `System` trait, captures model failures
//! that the stepper has no way to report, and turns the stepper's outcome
//! into a [`Solution`] with an explicit [`Status`].
//!
//! States are reported every `x_step` regardless of method. Fixed-step
//! [`Method::Rk4`] steps exactly on that grid; the adaptive methods choose
//! their own internal steps and interpolate onto it.

mod action;
mod config;
mod error;
mod event;
mod solution;

use std::cell::RefCell;

use compass_core::{Observer, OdeModel, State};
use ode_solvers::{
    SVector, System,
    dop_shared::{IntegrationError, OutputType},
};
use tracing::{debug, warn};

pub use action::Action;
pub use config::{Config, Method};
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Stats, Status};

/// Integrates `model` from `initial` to `x_end`, reporting states every `x_step`.
///
/// The observer is called after every accepted step and may return
/// [`Action::StopEarly`] to end the run. The states produced so far are
/// returned with [`Status::StoppedByObserver`].
///
/// # Errors
///
/// Returns an [`Error`] if the configuration or inputs are invalid, the model
/// fails or produces a non-finite derivative, or the stepper gives up.
/// Exhausting the step budget is not an error.
pub fn solve<M, O, const N: usize>(
    model: &M,
    initial: State<N>,
    x_end: f64,
    x_step: f64,
    config: &Config,
    mut observer: O,
) -> Result<Solution<N>, Error>
where
    M: OdeModel<N>,
    O: Observer<Event<N>, Action>,
{
    config
        .validate()
        .map_err(|reason| Error::InvalidConfig { reason })?;
    validate_inputs(&initial, x_end, x_step)?;

    debug!(
        method = ?config.method,
        x_start = initial.x,
        x_end,
        x_step,
        "integrating"
    );

    let tracker = RefCell::new(Tracker::<N>::default());
    let system = OdeSystem {
        model,
        tracker: &tracker,
        observer: &mut observer,
    };

    let x_start = initial.x;
    let y_start = SVector::<f64, N>::from(initial.y);

    let (outcome, x_out, y_out) = match config.method {
        Method::Rk4 => {
            let planned = ((x_end - x_start) / x_step - 1e-9).ceil().max(1.0);
            let budget = f64::from(config.max_steps);
            let (steps, capped) = if planned > budget {
                (budget, true)
            } else {
                (planned, false)
            };
            // The stepper rounds the step count up, so aim half a step short.
            let x_stop = x_start + (steps - 0.5) * x_step;
            let mut stepper = ode_solvers::Rk4::new(system, x_start, y_start, x_stop, x_step);
            let outcome = stepper.integrate().map(|_| capped);
            (outcome, stepper.x_out().clone(), stepper.y_out().clone())
        }
        Method::Dopri5 { abs_tol, rel_tol } => {
            let mut stepper = ode_solvers::Dopri5::from_param(
                system,
                x_start,
                x_end,
                x_step,
                y_start,
                rel_tol,
                abs_tol,
                0.9,
                0.04,
                0.2,
                10.0,
                x_end - x_start,
                0.0,
                config.max_steps,
                config.stiffness_interval(),
                OutputType::Dense,
            );
            let outcome = stepper.integrate().map(|_| false);
            (outcome, stepper.x_out().clone(), stepper.y_out().clone())
        }
        Method::Dop853 { abs_tol, rel_tol } => {
            let mut stepper = ode_solvers::Dop853::from_param(
                system,
                x_start,
                x_end,
                x_step,
                y_start,
                rel_tol,
                abs_tol,
                0.9,
                0.0,
                0.333,
                6.0,
                x_end - x_start,
                0.0,
                config.max_steps,
                config.stiffness_interval(),
                OutputType::Dense,
            );
            let outcome = stepper.integrate().map(|_| false);
            (outcome, stepper.x_out().clone(), stepper.y_out().clone())
        }
    };

    let Tracker {
        failure,
        stopped,
        evaluations,
        accepted_steps,
        last_accepted,
    } = tracker.into_inner();

    if let Some(error) = failure {
        return Err(error);
    }

    let budget_exhausted = match outcome {
        Ok(capped) => capped,
        Err(error) => integration_outcome(error)?,
    };

    let states = collect_states(initial, &x_out, &y_out, last_accepted, x_step);
    let status = if stopped {
        Status::StoppedByObserver
    } else if budget_exhausted {
        warn!(
            max_steps = config.max_steps,
            x_reached = states.last().map_or(x_start, |state| state.x),
            "step budget exhausted before the end of the interval"
        );
        Status::StepBudgetExhausted
    } else {
        Status::Complete
    };

    debug!(?status, evaluations, accepted_steps, "integration finished");

    Ok(Solution {
        status,
        states,
        stats: Stats {
            evaluations,
            accepted_steps,
        },
    })
}

/// Integrates without observing solver events.
///
/// # Errors
///
/// See [`solve`].
pub fn solve_unobserved<M, const N: usize>(
    model: &M,
    initial: State<N>,
    x_end: f64,
    x_step: f64,
    config: &Config,
) -> Result<Solution<N>, Error>
where
    M: OdeModel<N>,
{
    solve(model, initial, x_end, x_step, config, ())
}

fn validate_inputs<const N: usize>(
    initial: &State<N>,
    x_end: f64,
    x_step: f64,
) -> Result<(), Error> {
    if !initial.x.is_finite() || initial.y.iter().any(|value| !value.is_finite()) {
        return Err(Error::InvalidInput {
            reason: "initial state must be finite",
        });
    }
    if !x_end.is_finite() || x_end <= initial.x {
        return Err(Error::InvalidInput {
            reason: "x_end must be finite and greater than the initial x",
        });
    }
    if !x_step.is_finite() || x_step <= 0.0 {
        return Err(Error::InvalidInput {
            reason: "x_step must be finite and positive",
        });
    }
    Ok(())
}

/// Maps a stepper error to either a budget flag or a solver error.
fn integration_outcome(error: IntegrationError) -> Result<bool, Error> {
    match error {
        IntegrationError::MaxNumStepReached { .. } => Ok(true),
        IntegrationError::StepSizeUnderflow { x } => Err(Error::StepSizeUnderflow { x }),
        IntegrationError::StiffnessDetected { x } => Err(Error::StiffnessDetected { x }),
    }
}

/// Builds the output states.
///
/// Starts with the initial state and ends with the last accepted step, which
/// dense output can miss when the grid does not divide the interval exactly.
/// Points closer than a millionth of a step to their predecessor are dropped.
fn collect_states<const N: usize>(
    initial: State<N>,
    x_out: &[f64],
    y_out: &[SVector<f64, N>],
    last_accepted: Option<State<N>>,
    x_step: f64,
) -> Vec<State<N>> {
    let min_gap = x_step * 1e-6;
    let mut states = Vec::with_capacity(x_out.len() + 2);
    states.push(initial);

    let grid = x_out
        .iter()
        .zip(y_out)
        .map(|(&x, y)| State::new(x, (*y).into()));
    for state in grid.chain(last_accepted) {
        let previous = states.last().map_or(f64::NEG_INFINITY, |last| last.x);
        if state.x - previous > min_gap {
            states.push(state);
        }
    }
    states
}

/// Bookkeeping shared between the derivative and output callbacks.
#[derive(Debug)]
struct Tracker<const N: usize> {
    failure: Option<Error>,
    stopped: bool,
    evaluations: u32,
    accepted_steps: usize,
    last_accepted: Option<State<N>>,
}

impl<const N: usize> Default for Tracker<N> {
    fn default() -> Self {
        Self {
            failure: None,
            stopped: false,
            evaluations: 0,
            accepted_steps: 0,
            last_accepted: None,
        }
    }
}

/// Adapts an [`OdeModel`] to the `ode_solvers` system trait.
struct OdeSystem<'a, M, O, const N: usize> {
    model: &'a M,
    tracker: &'a RefCell<Tracker<N>>,
    observer: &'a mut O,
}

impl<M, O, const N: usize> System<f64, SVector<f64, N>> for OdeSystem<'_, M, O, N>
where
    M: OdeModel<N>,
    O: Observer<Event<N>, Action>,
{
    fn system(&self, x: f64, y: &SVector<f64, N>, dy: &mut SVector<f64, N>) {
        let mut tracker = self.tracker.borrow_mut();
        tracker.evaluations = tracker.evaluations.saturating_add(1);

        let result = match self.model.derivative(x, &(*y).into()) {
            Ok(derivative) if derivative.iter().all(|value| value.is_finite()) => Ok(derivative),
            Ok(_) => Err(Error::NonFiniteDerivative { x }),
            Err(source) => Err(Error::Model {
                x,
                source: Box::new(source),
            }),
        };

        match result {
            Ok(derivative) => *dy = SVector::from(derivative),
            Err(error) => {
                if tracker.failure.is_none() {
                    tracker.failure = Some(error);
                }
                // A finite placeholder lets the step complete so `solout` can stop it.
                *dy = SVector::zeros();
            }
        }
    }

    fn solout(&mut self, x: f64, y: &SVector<f64, N>, _dy: &SVector<f64, N>) -> bool {
        let mut tracker = self.tracker.borrow_mut();
        if tracker.failure.is_some() {
            return true;
        }

        tracker.accepted_steps += 1;
        let state = State::new(x, (*y).into());
        tracker.last_accepted = Some(state);
        let event = Event {
            step: tracker.accepted_steps,
            state,
        };

        match self.observer.observe(&event) {
            Some(Action::StopEarly) => {
                tracker.stopped = true;
                true
            }
            None => false,
        }
    }
}
