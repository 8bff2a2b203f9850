//! Simulation of a needle disturbed from rest.
//!
//! A [`Dynamic`] couples one [`Compass`] with one [`MagneticField`],
//! integrates the needle's equation of motion from the configured initial
//! conditions, and judges the resulting [`Trajectory`] in one of three modes:
//!
//! - [`Dynamic::balance`]: where does the needle come to rest?
//! - [`Dynamic::stability`]: does it converge on equilibrium?
//! - [`Dynamic::rapidity`]: how quickly does it settle?
//!
//! # Status
//!
//! Every report carries a [`Status`]. A run that exhausted the solver's step
//! budget is [`Status::Incomplete`]. A needle that met the mode's settling
//! criterion is [`Status::Completed`] however short the run. Otherwise a
//! disturbed run shorter than `min_horizon_periods` response times is
//! [`Status::InsufficientHorizon`], and the mode's weaker criterion, if it
//! has one, decides between [`Status::Completed`] and
//! [`Status::NotConverged`].
//!
//! The response time is the undamped natural period for an under- or
//! critically damped needle, and the time constant of the slow mode
//! `2π / (ω_n (ζ - √(ζ² - 1)))` for an over-damped one.

mod config;
mod equation;
mod report;
mod trajectory;

use std::f64::consts::TAU;

use compass_core::{State, angle::wrap_to_pi};
use compass_solve::ode;
use tracing::{debug, debug_span, warn};
use uom::si::{
    angle::radian,
    angular_velocity::radian_per_second,
    f64::{Angle, AngularVelocity, Time},
    time::second,
};

use crate::{
    Error,
    compass::Compass,
    excitation::SteadyState,
    field::MagneticField,
    metrics,
};

pub use config::{Band, Calibration, Criteria, DynamicConfig, TorqueModel};
pub use equation::NeedleModel;
pub use report::{BalanceReport, RapidityReport, StabilityReport, Status, Verdict};
pub use trajectory::{Sample, Trajectory};

/// Multiple of the solver's relative tolerance below which energy changes
/// are treated as integration error.
const SOLVER_DRIFT_FACTOR: f64 = 1e3;

/// A compass needle in a field, ready to be simulated.
///
/// Holds the last trajectory produced by any mode. Each run replaces it, and
/// changing the initial conditions or a failed run clears it.
#[derive(Debug, Clone)]
pub struct Dynamic<'a> {
    compass: &'a Compass,
    field: &'a MagneticField,
    config: DynamicConfig,
    model: NeedleModel,
    trajectory: Option<Trajectory>,
}

/// Output of one integration, before any mode judges it.
struct Run {
    trajectory: Trajectory,
    solver_status: ode::Status,
}

impl<'a> Dynamic<'a> {
    /// Couples `compass` and `field` under `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSolverConfig`] if any option is invalid.
    pub fn new(
        compass: &'a Compass,
        field: &'a MagneticField,
        config: DynamicConfig,
    ) -> Result<Self, Error> {
        config
            .validate()
            .map_err(|reason| Error::InvalidSolverConfig { reason })?;

        Ok(Self {
            compass,
            field,
            model: NeedleModel::new(compass, field, &config),
            config,
            trajectory: None,
        })
    }

    #[must_use]
    pub fn compass(&self) -> &Compass {
        self.compass
    }

    #[must_use]
    pub fn field(&self) -> &MagneticField {
        self.field
    }

    #[must_use]
    pub fn config(&self) -> &DynamicConfig {
        &self.config
    }

    /// The calibrated equation of motion.
    #[must_use]
    pub fn model(&self) -> &NeedleModel {
        &self.model
    }

    /// The trajectory of the last successful run.
    #[must_use]
    pub fn trajectory(&self) -> Option<&Trajectory> {
        self.trajectory.as_ref()
    }

    /// Replaces the initial conditions and clears the stored trajectory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if either value is not finite.
    pub fn set_initial_conditions(
        &mut self,
        angle: Angle,
        angular_velocity: AngularVelocity,
    ) -> Result<(), Error> {
        compass_core::constraint::check_finite(angle.get::<radian>())
            .map_err(Error::invalid("initial_angle"))?;
        compass_core::constraint::check_finite(angular_velocity.get::<radian_per_second>())
            .map_err(Error::invalid("initial_angular_velocity"))?;

        self.config.initial_angle = angle;
        self.config.initial_angular_velocity = angular_velocity;
        self.trajectory = None;
        Ok(())
    }

    /// Angle at which the net torque vanishes.
    #[must_use]
    pub fn equilibrium(&self) -> Angle {
        Angle::new::<radian>(self.model.equilibrium())
    }

    #[must_use]
    pub fn natural_frequency(&self) -> AngularVelocity {
        AngularVelocity::new::<radian_per_second>(self.model.natural_frequency())
    }

    #[must_use]
    pub fn natural_period(&self) -> Time {
        Time::new::<second>(self.model.natural_period())
    }

    #[must_use]
    pub fn damping_ratio(&self) -> f64 {
        self.model.damping_ratio()
    }

    /// Time scale on which a disturbance dies out, see the module docs.
    #[must_use]
    pub fn response_time(&self) -> Time {
        let omega = self.model.natural_frequency();
        let zeta = self.model.damping_ratio();
        let rate = if zeta <= 1.0 {
            omega
        } else {
            // Same as ω_n (ζ - √(ζ² - 1)) without the cancellation.
            omega / (zeta + (zeta * zeta - 1.0).sqrt())
        };
        Time::new::<second>(TAU / rate)
    }

    /// Size of the initial disturbance, `hypot(θ(0) - θ_eq, ω(0) / ω_n)`.
    #[must_use]
    pub fn disturbance(&self) -> Angle {
        let deviation = wrap_to_pi(self.initial_angle() - self.model.equilibrium());
        let velocity = self.initial_angular_velocity() / self.model.natural_frequency();
        Angle::new::<radian>(deviation.hypot(velocity))
    }

    /// Analytic small-angle response to the configured excitation, if any.
    #[must_use]
    pub fn steady_state(&self) -> Option<SteadyState> {
        self.config.excitation.map(|excitation| {
            excitation.steady_state(
                self.model.inertia(),
                self.model.stiffness(),
                self.model.damping(),
            )
        })
    }

    /// Runs from the initial conditions and reports where the needle rests.
    ///
    /// Completed when the needle is still over the final hold window.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Integration`] if the solver fails.
    pub fn balance(&mut self) -> Result<BalanceReport, Error> {
        let _span = debug_span!("balance").entered();
        let Run {
            trajectory,
            solver_status,
        } = self.run()?;

        let samples = trajectory.samples();
        let direction = self.field.direction().get::<radian>();
        let rest_angle = trajectory.last().map_or(self.initial_angle(), |sample| sample.angle);
        let balance_error = metrics::balance_error(samples, direction).unwrap_or(0.0);

        let rest_tolerance = self.config.criteria.rest_tolerance.get::<radian>();
        let at_rest = metrics::is_at_rest(
            samples,
            self.end_time(&trajectory) - self.hold_duration(),
            rest_tolerance,
            rest_tolerance * self.model.natural_frequency(),
        );
        let status = self.status(solver_status, at_rest, false);

        debug!(?status, rest_angle, balance_error, "balance");

        Ok(BalanceReport {
            status,
            trajectory,
            rest_angle: Angle::new::<radian>(rest_angle),
            balance_error: Angle::new::<radian>(balance_error),
        })
    }

    /// Runs from the initial conditions and judges convergence on equilibrium.
    ///
    /// Completed when the needle settles, or when its energy is still
    /// clearly decaying at the end of a long enough run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Integration`] if the solver fails.
    pub fn stability(&mut self) -> Result<StabilityReport, Error> {
        let _span = debug_span!("stability").entered();
        let Run {
            trajectory,
            solver_status,
        } = self.run()?;

        let samples = trajectory.samples();
        let equilibrium = self.model.equilibrium();
        let noise_floor = self.config.criteria.noise_floor.get::<radian>();
        let (angle_band, velocity_band) = self.bands();

        let held_since = metrics::held_since(samples, equilibrium, angle_band, velocity_band);
        let settled = held_since.is_some_and(|since| self.holds_from(&trajectory, since));
        let verdict = if settled {
            Verdict::Settled
        } else {
            self.energy_trend(samples)
        };

        let envelope = metrics::envelope(samples, equilibrium);
        let peak_deviation = envelope
            .iter()
            .map(|peak| peak.deviation)
            .fold(0.0, f64::max);
        let final_deviation = trajectory.last().map_or(0.0, |sample| {
            metrics::deviation(sample.angle, equilibrium)
        });
        let oscillatory = !metrics::zero_crossings(samples, equilibrium, noise_floor).is_empty();
        let peak_to_peak = metrics::peak_to_peak(samples, self.end_time(&trajectory) / 2.0);

        let status = self.status(
            solver_status,
            verdict == Verdict::Settled,
            verdict == Verdict::Decaying,
        );

        debug!(?status, ?verdict, oscillatory, final_deviation, "stability");

        Ok(StabilityReport {
            status,
            trajectory,
            verdict,
            oscillatory,
            envelope,
            peak_deviation: Angle::new::<radian>(peak_deviation),
            final_deviation: Angle::new::<radian>(final_deviation),
            held_since: held_since.map(Time::new::<second>),
            peak_to_peak: Angle::new::<radian>(peak_to_peak),
        })
    }

    /// Runs from the initial conditions and measures how fast the needle settles.
    ///
    /// Completed when the needle enters the settling band and stays there for
    /// at least the hold duration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Integration`] if the solver fails.
    pub fn rapidity(&mut self) -> Result<RapidityReport, Error> {
        let _span = debug_span!("rapidity").entered();
        let Run {
            trajectory,
            solver_status,
        } = self.run()?;

        let samples = trajectory.samples();
        let equilibrium = self.model.equilibrium();
        let noise_floor = self.config.criteria.noise_floor.get::<radian>();
        let disturbance = self.disturbance().get::<radian>();
        let (angle_band, _) = self.bands();

        let settling_time = metrics::settling_time(samples, equilibrium, angle_band)
            .filter(|&since| self.holds_from(&trajectory, since));
        let overshoot = metrics::overshoot_ratio(samples, equilibrium, disturbance, noise_floor);
        let period = metrics::oscillation_period(samples, equilibrium, noise_floor);

        let status = self.status(solver_status, settling_time.is_some(), false);
        let settling_time = settling_time.filter(|_| status.is_completed());

        debug!(?status, ?settling_time, overshoot, ?period, "rapidity");

        Ok(RapidityReport {
            status,
            trajectory,
            settling_time: settling_time.map(Time::new::<second>),
            overshoot,
            period: period.map(Time::new::<second>),
        })
    }

    fn initial_angle(&self) -> f64 {
        self.config.initial_angle.get::<radian>()
    }

    fn initial_angular_velocity(&self) -> f64 {
        self.config
            .initial_angular_velocity
            .get::<radian_per_second>()
    }

    fn time_span(&self) -> f64 {
        self.config.time_span.get::<second>()
    }

    /// How long a needle must stay inside the band to count as settled.
    fn hold_duration(&self) -> f64 {
        (self.config.criteria.hold_periods * self.model.natural_period()).min(self.time_span() / 2.0)
    }

    /// Angle and velocity half-widths of the settling band.
    fn bands(&self) -> (f64, f64) {
        let angle = self
            .config
            .criteria
            .settling_band
            .resolve(self.disturbance().get::<radian>());
        (angle, angle * self.model.natural_frequency())
    }

    fn end_time(&self, trajectory: &Trajectory) -> f64 {
        trajectory.last().map_or(0.0, |sample| sample.time)
    }

    /// Whether the run continues for at least the hold duration after `since`.
    fn holds_from(&self, trajectory: &Trajectory, since: f64) -> bool {
        let slack = 1e-9 * self.time_span();
        self.end_time(trajectory) - since >= self.hold_duration() - slack
    }

    /// Compares the largest energy amplitude of the last quarter of the run
    /// with that of the quarter before it.
    fn energy_trend(&self, samples: &[Sample]) -> Verdict {
        let Some(last) = samples.last() else {
            return Verdict::Sustained;
        };
        let (from, split) = (last.time / 2.0, 0.75 * last.time);
        let threshold = self.decay_threshold();

        let (mut earlier, mut later) = (0.0_f64, 0.0_f64);
        for sample in samples.iter().filter(|sample| sample.time >= from) {
            let amplitude = self
                .model
                .energy_amplitude(sample.angle, sample.angular_velocity);
            if sample.time < split {
                earlier = earlier.max(amplitude);
            } else {
                later = later.max(amplitude);
            }
        }

        debug!(earlier, later, threshold, "energy trend");
        if later < earlier * (1.0 - threshold) {
            Verdict::Decaying
        } else if later > earlier * (1.0 + threshold) {
            Verdict::Diverging
        } else {
            Verdict::Sustained
        }
    }

    /// Relative energy change that counts as a trend.
    ///
    /// Never below the drift the solver's relative tolerance allows over a run.
    fn decay_threshold(&self) -> f64 {
        let rel_tol = self
            .config
            .solver
            .method
            .relative_tolerance()
            .unwrap_or(ode::Method::DEFAULT_REL_TOL);
        self.config
            .criteria
            .decay_threshold
            .max(SOLVER_DRIFT_FACTOR * rel_tol)
    }

    /// Integrates over the time span and stores the trajectory.
    fn run(&mut self) -> Result<Run, Error> {
        self.trajectory = None;

        let initial = State::new(0.0, [self.initial_angle(), self.initial_angular_velocity()]);
        let solution = ode::solve_unobserved(
            &self.model,
            initial,
            self.time_span(),
            self.config.output_step.get::<second>(),
            &self.config.solver,
        )
        .inspect_err(|error| warn!(%error, "integration failed"))?;

        debug!(
            samples = solution.states.len(),
            evaluations = solution.stats.evaluations,
            accepted_steps = solution.stats.accepted_steps,
            "integrated needle motion"
        );

        let trajectory: Trajectory = solution.states.iter().copied().map(Sample::from).collect();
        self.trajectory = Some(trajectory.clone());

        Ok(Run {
            trajectory,
            solver_status: solution.status,
        })
    }

    /// Combines the solver outcome with a mode's criteria.
    ///
    /// `settled` is the mode's own settling test. `converging` is a weaker
    /// sign of convergence that only counts over a long enough run.
    fn status(&self, solver_status: ode::Status, settled: bool, converging: bool) -> Status {
        if solver_status != ode::Status::Complete {
            warn!(?solver_status, "run ended before the end of the time span");
            return Status::Incomplete;
        }
        if settled {
            return Status::Completed;
        }

        let disturbance = self.disturbance().get::<radian>();
        let required = self.config.criteria.min_horizon_periods * self.response_time().get::<second>();
        if disturbance > 0.0 && self.time_span() < required {
            warn!(
                time_span = self.time_span(),
                required, "time span too short for the needle's response time"
            );
            return Status::InsufficientHorizon;
        }

        if converging {
            Status::Completed
        } else {
            Status::NotConverged
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use uom::si::{
        angle::degree,
        f64::{MagneticFluxDensity, MagneticMoment, MomentOfInertia, Torque},
        magnetic_flux_density::tesla,
        magnetic_moment::ampere_square_meter,
        moment_of_inertia::kilogram_square_meter,
        torque::newton_meter,
    };

    use super::*;
    use crate::compass::CompassConfig;

    fn unit_compass(damping: f64) -> Compass {
        Compass::new(CompassConfig {
            moment_of_inertia: MomentOfInertia::new::<kilogram_square_meter>(1.0),
            magnetic_moment: MagneticMoment::new::<ampere_square_meter>(1.0),
            damping_coefficient: damping,
            static_imbalance: Angle::new::<radian>(0.0),
            dry_friction: Torque::new::<newton_meter>(0.0),
        })
        .unwrap()
    }

    fn unit_field() -> MagneticField {
        MagneticField::new(
            MagneticFluxDensity::new::<tesla>(1.0),
            Angle::new::<radian>(0.0),
        )
        .unwrap()
    }

    fn disturbed(span: f64) -> DynamicConfig {
        DynamicConfig {
            time_span: Time::new::<second>(span),
            initial_angle: Angle::new::<radian>(0.3),
            ..DynamicConfig::default()
        }
    }

    #[test]
    fn characteristic_times() {
        let compass = unit_compass(0.5);
        let field = unit_field();
        let dynamic = Dynamic::new(&compass, &field, disturbed(50.0)).unwrap();

        assert_relative_eq!(dynamic.natural_period().get::<second>(), TAU);
        assert_relative_eq!(dynamic.response_time().get::<second>(), TAU);
        assert_relative_eq!(dynamic.damping_ratio(), 0.25);
        assert_relative_eq!(dynamic.disturbance().get::<radian>(), 0.3, epsilon = 1e-12);

        // Over-damped needles respond on the slow mode.
        let compass = unit_compass(4.0);
        let dynamic = Dynamic::new(&compass, &field, disturbed(50.0)).unwrap();
        let slow_rate = 2.0 - 3.0_f64.sqrt();
        assert_relative_eq!(
            dynamic.response_time().get::<second>(),
            TAU / slow_rate,
            max_relative = 1e-12
        );
    }

    #[test]
    fn calibration_scales_stiffness_and_damping() {
        let compass = unit_compass(0.5);
        let field = unit_field();
        let config = DynamicConfig {
            calibration: Calibration {
                magnetic: 4.0,
                viscous: 2.0,
            },
            ..disturbed(50.0)
        };
        let dynamic = Dynamic::new(&compass, &field, config).unwrap();

        assert_relative_eq!(dynamic.natural_period().get::<second>(), TAU / 2.0);
        assert_relative_eq!(dynamic.damping_ratio(), 0.25);
    }

    #[test]
    fn initial_velocity_counts_toward_the_disturbance() {
        let compass = unit_compass(0.5);
        let field = unit_field();
        let mut dynamic = Dynamic::new(&compass, &field, disturbed(50.0)).unwrap();

        dynamic
            .set_initial_conditions(
                Angle::new::<radian>(0.3),
                AngularVelocity::new::<radian_per_second>(0.4),
            )
            .unwrap();
        assert_relative_eq!(dynamic.disturbance().get::<radian>(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn runs_replace_and_clear_the_trajectory() {
        let compass = unit_compass(0.5);
        let field = unit_field();
        let mut dynamic = Dynamic::new(&compass, &field, disturbed(20.0)).unwrap();
        assert!(dynamic.trajectory().is_none());

        let report = dynamic.rapidity().unwrap();
        assert_eq!(dynamic.trajectory(), Some(&report.trajectory));
        assert!((2000..=2002).contains(&report.trajectory.len()));
        assert_relative_eq!(report.trajectory.last().unwrap().time, 20.0, epsilon = 1e-9);

        dynamic
            .set_initial_conditions(
                Angle::new::<degree>(10.0),
                AngularVelocity::new::<radian_per_second>(0.0),
            )
            .unwrap();
        assert!(dynamic.trajectory().is_none());

        let report = dynamic.balance().unwrap();
        let first = report.trajectory.samples()[0];
        assert_relative_eq!(first.angle, 10.0_f64.to_radians(), max_relative = 1e-12);
    }

    #[test]
    fn rejects_invalid_initial_conditions() {
        let compass = unit_compass(0.5);
        let field = unit_field();
        let mut dynamic = Dynamic::new(&compass, &field, disturbed(20.0)).unwrap();

        let result = dynamic.set_initial_conditions(
            Angle::new::<radian>(f64::NAN),
            AngularVelocity::new::<radian_per_second>(0.0),
        );
        assert!(matches!(
            result,
            Err(Error::InvalidParameter {
                name: "initial_angle",
                ..
            })
        ));
    }

    #[test]
    fn rejects_invalid_config() {
        let compass = unit_compass(0.5);
        let field = unit_field();
        let config = DynamicConfig {
            output_step: Time::new::<second>(-0.01),
            ..DynamicConfig::default()
        };
        assert!(matches!(
            Dynamic::new(&compass, &field, config),
            Err(Error::InvalidSolverConfig { .. })
        ));
    }

    #[test]
    fn step_budget_marks_the_run_incomplete() {
        let compass = unit_compass(0.5);
        let field = unit_field();
        let config = DynamicConfig {
            solver: ode::Config {
                max_steps: 5,
                ..ode::Config::default()
            },
            ..disturbed(50.0)
        };
        let mut dynamic = Dynamic::new(&compass, &field, config).unwrap();

        let report = dynamic.stability().unwrap();
        assert_eq!(report.status, Status::Incomplete);
        assert!(report.trajectory.last().unwrap().time < 50.0);
    }

    #[test]
    fn settled_needles_complete_on_a_short_horizon() {
        // ζ = 5 responds over about 62 s, so two response times exceed the span.
        let compass = unit_compass(10.0);
        let field = unit_field();
        let mut dynamic = Dynamic::new(&compass, &field, disturbed(10.0 * TAU)).unwrap();
        assert!(dynamic.response_time().get::<second>() > 5.0 * TAU);

        let report = dynamic.stability().unwrap();
        assert_eq!(report.verdict, Verdict::Settled);
        assert_eq!(report.status, Status::Completed);

        let report = dynamic.rapidity().unwrap();
        assert_eq!(report.status, Status::Completed);
        assert!(report.settling_time.is_some());

        assert_eq!(dynamic.balance().unwrap().status, Status::Completed);

        // Cut short before the needle settles, the horizon still applies.
        let mut dynamic = Dynamic::new(&compass, &field, disturbed(3.0 * TAU)).unwrap();
        let report = dynamic.stability().unwrap();
        assert_ne!(report.verdict, Verdict::Settled);
        assert_eq!(report.status, Status::InsufficientHorizon);
    }

    #[test]
    fn decay_threshold_tracks_the_solver_tolerance() {
        let compass = unit_compass(0.5);
        let field = unit_field();
        let threshold = |criteria: Criteria, method: ode::Method| {
            let config = DynamicConfig {
                criteria,
                solver: ode::Config {
                    method,
                    ..ode::Config::default()
                },
                ..disturbed(50.0)
            };
            Dynamic::new(&compass, &field, config)
                .unwrap()
                .decay_threshold()
        };

        let default = Criteria::default();
        assert_relative_eq!(threshold(default, ode::Method::default()), 1e-5);
        assert_relative_eq!(threshold(default, ode::Method::Rk4), 1e-5);
        assert_relative_eq!(
            threshold(default, ode::Method::default().scale_tolerances(100.0)),
            1e-3,
            max_relative = 1e-12
        );

        let strict = Criteria {
            decay_threshold: 0.1,
            ..Criteria::default()
        };
        assert_relative_eq!(threshold(strict, ode::Method::default()), 0.1);
    }

    #[test]
    fn excited_needle_reaches_the_analytic_steady_state() {
        let compass = unit_compass(0.5);
        let field = unit_field();
        let config = DynamicConfig {
            time_span: Time::new::<second>(60.0),
            initial_angle: Angle::new::<radian>(0.0),
            torque_model: TorqueModel::SmallAngle,
            excitation: Some(crate::excitation::Excitation {
                mass_moment: 0.01,
                stroke: uom::si::f64::Length::new::<uom::si::length::meter>(1.0),
                cadence: 70.0,
            }),
            ..DynamicConfig::default()
        };
        let mut dynamic = Dynamic::new(&compass, &field, config).unwrap();
        let expected = dynamic.steady_state().unwrap().amplitude.get::<radian>();

        let report = dynamic.stability().unwrap();
        let swing = report.peak_to_peak.get::<radian>() / 2.0;
        assert_relative_eq!(swing, expected, max_relative = 0.01);
    }
}
