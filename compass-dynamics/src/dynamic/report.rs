use uom::si::f64::{Angle, Time};

use super::Trajectory;
use crate::metrics::Peak;

/// Qualifies the outcome of a simulation mode.
///
/// When several apply, the first one listed wins, except that a needle that
/// met the mode's settling criterion is [`Status::Completed`] even on a run
/// shorter than the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The step budget ran out before the end of the time span. The
    /// trajectory stops where integration stopped.
    Incomplete,

    /// The needle has not settled and the time span is too short for its
    /// response time, so the metrics would be meaningless.
    InsufficientHorizon,

    /// The mode's convergence criterion was met.
    Completed,

    /// The run is valid but the needle did not settle.
    NotConverged,
}

impl Status {
    #[must_use]
    pub fn is_completed(self) -> bool {
        self == Self::Completed
    }
}

/// How a disturbed needle behaves over a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Held inside the settling band for the hold duration.
    Settled,

    /// Energy still falling over the last quarter of the run.
    Decaying,

    /// Energy neither rising nor falling, as for an undamped needle or one
    /// held off equilibrium by dry friction.
    Sustained,

    /// Energy rising over the last quarter of the run.
    Diverging,
}

impl Verdict {
    /// Whether the needle is converging on equilibrium.
    #[must_use]
    pub fn is_stable(self) -> bool {
        matches!(self, Self::Settled | Self::Decaying)
    }
}

/// Result of [`Dynamic::balance`](super::Dynamic::balance).
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceReport {
    pub status: Status,
    pub trajectory: Trajectory,

    /// Needle heading at the end of the run.
    pub rest_angle: Angle,

    /// Rest angle relative to the field direction, in `(-π, π]`.
    pub balance_error: Angle,
}

/// Result of [`Dynamic::stability`](super::Dynamic::stability).
#[derive(Debug, Clone, PartialEq)]
pub struct StabilityReport {
    pub status: Status,
    pub trajectory: Trajectory,
    pub verdict: Verdict,

    /// Whether the needle swung through equilibrium at least once.
    pub oscillatory: bool,

    /// Local maxima of the deviation from equilibrium, in radians.
    pub envelope: Vec<Peak>,

    /// Largest deviation from equilibrium over the run.
    pub peak_deviation: Angle,

    /// Deviation from equilibrium at the end of the run.
    pub final_deviation: Angle,

    /// Time since which angle and velocity have stayed inside their bands.
    pub held_since: Option<Time>,

    /// Peak-to-peak angle over the second half of the run.
    pub peak_to_peak: Angle,
}

/// Result of [`Dynamic::rapidity`](super::Dynamic::rapidity).
#[derive(Debug, Clone, PartialEq)]
pub struct RapidityReport {
    pub status: Status,
    pub trajectory: Trajectory,

    /// Time after which the needle stays inside the settling band.
    ///
    /// `None` unless the status is [`Status::Completed`].
    pub settling_time: Option<Time>,

    /// Largest swing past equilibrium relative to the initial disturbance.
    pub overshoot: f64,

    /// Oscillation period, when the needle crossed equilibrium at least twice.
    pub period: Option<Time>,
}
