//! End-to-end runs of needles with known closed-form behavior.

use std::f64::consts::TAU;

use approx::assert_relative_eq;
use compass_dynamics::{
    Compass, CompassConfig, CompassDesign, Dynamic, DynamicConfig, Error, FieldConfig,
    MagneticField, Status,
    dynamic::{TorqueModel, Verdict},
};
use compass_solve::ode;
use uom::si::{
    angle::{degree, radian},
    angular_velocity::radian_per_second,
    f64::{Angle, AngularVelocity, MagneticFluxDensity, MagneticMoment, MomentOfInertia, Time, Torque},
    magnetic_flux_density::tesla,
    magnetic_moment::ampere_square_meter,
    moment_of_inertia::kilogram_square_meter,
    time::second,
    torque::newton_meter,
};

/// Needle with unit inertia, moment and field, so `ω_n = 1` and `ζ = c / 2`.
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

fn unit_field(direction_degrees: f64) -> MagneticField {
    MagneticField::new(
        MagneticFluxDensity::new::<tesla>(1.0),
        Angle::new::<degree>(direction_degrees),
    )
    .unwrap()
}

fn reference_config() -> DynamicConfig {
    DynamicConfig {
        time_span: Time::new::<second>(50.0),
        initial_angle: Angle::new::<radian>(0.3),
        torque_model: TorqueModel::SmallAngle,
        ..DynamicConfig::default()
    }
}

#[test]
fn underdamped_reference_needle() {
    let compass = unit_compass(0.5);
    let field = unit_field(0.0);
    let mut dynamic = Dynamic::new(&compass, &field, reference_config()).unwrap();

    let zeta: f64 = 0.25;
    let damped = (1.0 - zeta * zeta).sqrt();
    assert_relative_eq!(dynamic.damping_ratio(), zeta);

    let report = dynamic.rapidity().unwrap();
    assert_eq!(report.status, Status::Completed);

    assert_relative_eq!(
        report.overshoot,
        (-zeta * std::f64::consts::PI / damped).exp(),
        max_relative = 1e-3
    );

    let period = report.period.unwrap().get::<second>();
    assert_relative_eq!(period, TAU / damped, max_relative = 1e-3);

    // Last swing out of a 0.006 rad band, found by sampling the closed form.
    let settling = report.settling_time.unwrap().get::<second>();
    assert!(settling > TAU && settling < 50.0, "settled at {settling}");
    assert_relative_eq!(settling, 14.12, epsilon = 0.02);

    let report = dynamic.stability().unwrap();
    assert_eq!(report.status, Status::Completed);
    assert_eq!(report.verdict, Verdict::Settled);
    assert!(report.oscillatory);
    assert_relative_eq!(report.peak_deviation.get::<radian>(), 0.3, epsilon = 1e-12);
    assert!(report.final_deviation.get::<radian>().abs() < 1e-5);
}

#[test]
fn nonlinear_reference_needle() {
    let compass = unit_compass(0.5);
    let field = unit_field(0.0);
    let config = DynamicConfig {
        torque_model: TorqueModel::Nonlinear,
        ..reference_config()
    };
    let mut dynamic = Dynamic::new(&compass, &field, config).unwrap();

    let report = dynamic.stability().unwrap();
    assert_eq!(report.status, Status::Completed);
    assert_eq!(report.verdict, Verdict::Settled);
    assert!(report.final_deviation.get::<radian>().abs() < 1e-3);

    let report = dynamic.rapidity().unwrap();
    assert_eq!(report.status, Status::Completed);
    let settling = report.settling_time.unwrap().get::<second>();
    assert!(settling > TAU && settling < 50.0, "settled at {settling}");
    assert!(report.overshoot > 0.0 && report.overshoot < 1.0);
}

#[test]
fn nonlinear_and_small_angle_models_agree_for_small_swings() {
    let compass = unit_compass(0.5);
    let field = unit_field(0.0);
    let small = |torque_model| DynamicConfig {
        initial_angle: Angle::new::<radian>(0.01),
        torque_model,
        ..reference_config()
    };

    let linear = Dynamic::new(&compass, &field, small(TorqueModel::SmallAngle))
        .unwrap()
        .rapidity()
        .unwrap();
    let nonlinear = Dynamic::new(&compass, &field, small(TorqueModel::Nonlinear))
        .unwrap()
        .rapidity()
        .unwrap();

    for (a, b) in linear.trajectory.iter().zip(&nonlinear.trajectory) {
        assert_relative_eq!(a.angle, b.angle, epsilon = 1e-6);
    }
}

#[test]
fn runs_are_deterministic() {
    let compass = unit_compass(0.5);
    let field = unit_field(20.0);
    let config = DynamicConfig {
        torque_model: TorqueModel::Nonlinear,
        initial_angle: Angle::new::<degree>(120.0),
        ..reference_config()
    };

    let first = Dynamic::new(&compass, &field, config)
        .unwrap()
        .stability()
        .unwrap();
    let again = Dynamic::new(&compass, &field, config)
        .unwrap()
        .stability()
        .unwrap();

    assert_eq!(first, again);
}

#[test]
fn settling_time_is_insensitive_to_tighter_tolerances() {
    let compass = unit_compass(0.5);
    let field = unit_field(0.0);

    let settling = |method: ode::Method| {
        let config = DynamicConfig {
            solver: ode::Config {
                method,
                ..ode::Config::default()
            },
            ..reference_config()
        };
        Dynamic::new(&compass, &field, config)
            .unwrap()
            .rapidity()
            .unwrap()
            .settling_time
            .unwrap()
            .get::<second>()
    };

    let nominal = settling(ode::Method::default());
    let tighter = settling(ode::Method::default().scale_tolerances(0.5));
    assert_relative_eq!(nominal, tighter, max_relative = 0.01);
}

#[test]
fn every_method_finds_the_same_settling_time() {
    let compass = unit_compass(0.5);
    let field = unit_field(0.0);

    let settling: Vec<f64> = [
        ode::Method::Rk4,
        ode::Method::default(),
        ode::Method::Dop853 {
            abs_tol: ode::Method::DEFAULT_ABS_TOL,
            rel_tol: ode::Method::DEFAULT_REL_TOL,
        },
    ]
    .into_iter()
    .map(|method| {
        let config = DynamicConfig {
            solver: ode::Config {
                method,
                ..ode::Config::default()
            },
            ..reference_config()
        };
        let mut dynamic = Dynamic::new(&compass, &field, config).unwrap();
        dynamic.rapidity().unwrap().settling_time.unwrap().get::<second>()
    })
    .collect();

    for time in &settling[1..] {
        assert_relative_eq!(*time, settling[0], max_relative = 0.01);
    }
}

#[test]
fn r500_needs_a_long_horizon() {
    let compass = Compass::new(CompassConfig::default()).unwrap();
    let field = MagneticField::from_config(&FieldConfig::default()).unwrap();
    let mut dynamic = Dynamic::new(&compass, &field, DynamicConfig::default()).unwrap();

    // The liquid damps the R500 heavily, so it creeps back over minutes.
    assert!(dynamic.damping_ratio() > 50.0);
    assert!(dynamic.response_time().get::<second>() > 60.0);

    assert_eq!(dynamic.balance().unwrap().status, Status::InsufficientHorizon);
    assert_eq!(dynamic.stability().unwrap().status, Status::InsufficientHorizon);

    let report = dynamic.rapidity().unwrap();
    assert_eq!(report.status, Status::InsufficientHorizon);
    assert_eq!(report.settling_time, None);
}

#[test]
fn r500_comes_to_rest_on_north() {
    let compass = Compass::from_design(&CompassDesign::r500()).unwrap();
    let field = MagneticField::from_config(&FieldConfig::default()).unwrap();
    let config = DynamicConfig {
        time_span: Time::new::<second>(200.0),
        output_step: Time::new::<second>(0.1),
        solver: ode::Config {
            max_steps: 1_000_000,
            ..ode::Config::default()
        },
        ..DynamicConfig::default()
    };
    let mut dynamic = Dynamic::new(&compass, &field, config).unwrap();

    let report = dynamic.balance().unwrap();
    assert_eq!(report.status, Status::Completed);
    assert!(report.balance_error.get::<radian>().abs() < 1e-4);
}

#[test]
fn stiffness_detection_fails_the_run() {
    let compass = Compass::from_design(&CompassDesign::r500()).unwrap();
    let field = MagneticField::from_config(&FieldConfig::default()).unwrap();
    let config = DynamicConfig {
        time_span: Time::new::<second>(50.0),
        solver: ode::Config {
            detect_stiffness: true,
            ..ode::Config::default()
        },
        ..DynamicConfig::default()
    };
    let mut dynamic = Dynamic::new(&compass, &field, config).unwrap();

    let result = dynamic.stability();
    assert!(
        matches!(
            result,
            Err(Error::Integration(ode::Error::StiffnessDetected { .. }))
        ),
        "{result:?}"
    );
    assert!(dynamic.trajectory().is_none());
}

#[test]
fn undamped_needle_never_converges() {
    let compass = unit_compass(0.0);
    let field = unit_field(0.0);
    let mut dynamic = Dynamic::new(&compass, &field, reference_config()).unwrap();

    let report = dynamic.stability().unwrap();
    assert_eq!(report.status, Status::NotConverged);
    assert_eq!(report.verdict, Verdict::Sustained);
    assert_relative_eq!(report.peak_to_peak.get::<radian>(), 0.6, max_relative = 1e-3);

    let report = dynamic.rapidity().unwrap();
    assert_eq!(report.status, Status::NotConverged);
    assert_eq!(report.settling_time, None);
    assert_relative_eq!(report.overshoot, 1.0, max_relative = 1e-3);
}

#[test]
fn needle_released_on_the_field_stays_exactly_there() {
    let compass = unit_compass(0.5);
    let field = unit_field(30.0);
    let config = DynamicConfig {
        initial_angle: Angle::new::<degree>(30.0),
        torque_model: TorqueModel::Nonlinear,
        ..reference_config()
    };
    let mut dynamic = Dynamic::new(&compass, &field, config).unwrap();
    assert_eq!(dynamic.disturbance().get::<radian>(), 0.0);

    let report = dynamic.balance().unwrap();
    assert_eq!(report.status, Status::Completed);
    assert_eq!(report.balance_error.get::<radian>(), 0.0);
    assert_relative_eq!(report.rest_angle.get::<degree>(), 30.0, max_relative = 1e-12);
}

#[test]
fn imbalance_shifts_the_rest_angle() {
    let compass = Compass::new(CompassConfig {
        static_imbalance: Angle::new::<degree>(5.0),
        ..CompassConfig {
            moment_of_inertia: MomentOfInertia::new::<kilogram_square_meter>(1.0),
            magnetic_moment: MagneticMoment::new::<ampere_square_meter>(1.0),
            damping_coefficient: 1.0,
            static_imbalance: Angle::new::<radian>(0.0),
            dry_friction: Torque::new::<newton_meter>(0.0),
        }
    })
    .unwrap();
    let field = unit_field(0.0);
    let config = DynamicConfig {
        torque_model: TorqueModel::Nonlinear,
        ..reference_config()
    };
    let mut dynamic = Dynamic::new(&compass, &field, config).unwrap();

    let report = dynamic.balance().unwrap();
    assert_eq!(report.status, Status::Completed);
    assert_relative_eq!(report.balance_error.get::<degree>(), 5.0, epsilon = 1e-3);
}

#[test]
fn changing_initial_conditions_discards_the_last_run() {
    let compass = unit_compass(0.5);
    let field = unit_field(0.0);
    let mut dynamic = Dynamic::new(&compass, &field, reference_config()).unwrap();

    dynamic.balance().unwrap();
    assert!(dynamic.trajectory().is_some());

    dynamic
        .set_initial_conditions(
            Angle::new::<radian>(-0.3),
            AngularVelocity::new::<radian_per_second>(0.0),
        )
        .unwrap();
    assert!(dynamic.trajectory().is_none());

    let report = dynamic.rapidity().unwrap();
    assert_eq!(report.status, Status::Completed);
    assert_relative_eq!(report.trajectory.samples()[0].angle, -0.3);
}

#[test]
fn lightly_damped_needle_is_still_decaying() {
    let compass = unit_compass(0.01);
    let field = unit_field(0.0);
    let config = DynamicConfig {
        time_span: Time::new::<second>(10.0 * TAU),
        ..reference_config()
    };
    let mut dynamic = Dynamic::new(&compass, &field, config).unwrap();

    let report = dynamic.stability().unwrap();
    assert_eq!(report.verdict, Verdict::Decaying);
    assert_eq!(report.status, Status::Completed);
    assert!(report.envelope.windows(2).all(|pair| pair[1].deviation < pair[0].deviation));

    // Not settled yet, so no settling time.
    let report = dynamic.rapidity().unwrap();
    assert_eq!(report.status, Status::NotConverged);
    assert_eq!(report.settling_time, None);
}

#[test]
fn faint_damping_still_counts_as_decay() {
    // ζ = 5e-6 loses about 8e-5 of its amplitude per quarter of the run.
    let compass = unit_compass(1e-5);
    let field = unit_field(0.0);
    let config = DynamicConfig {
        time_span: Time::new::<second>(10.0 * TAU),
        ..reference_config()
    };
    let mut dynamic = Dynamic::new(&compass, &field, config).unwrap();

    let report = dynamic.stability().unwrap();
    assert_eq!(report.verdict, Verdict::Decaying);
    assert_eq!(report.status, Status::Completed);
}

#[test]
fn dry_friction_holds_the_needle_off_equilibrium() {
    let friction = 0.1;
    let compass = Compass::new(CompassConfig {
        dry_friction: Torque::new::<newton_meter>(friction),
        ..CompassConfig {
            moment_of_inertia: MomentOfInertia::new::<kilogram_square_meter>(1.0),
            magnetic_moment: MagneticMoment::new::<ampere_square_meter>(1.0),
            damping_coefficient: 0.5,
            static_imbalance: Angle::new::<radian>(0.0),
            dry_friction: Torque::new::<newton_meter>(0.0),
        }
    })
    .unwrap();
    let field = unit_field(0.0);
    let config = DynamicConfig {
        torque_model: TorqueModel::Nonlinear,
        ..reference_config()
    };
    let mut dynamic = Dynamic::new(&compass, &field, config).unwrap();

    // Sticks where the magnetic torque no longer beats friction, outside
    // the 0.006 rad settling band.
    let dead_band = friction.asin();
    let report = dynamic.stability().unwrap();
    let stuck_at = report.final_deviation.get::<radian>().abs();
    assert!(stuck_at > 0.006 && stuck_at <= dead_band, "stuck at {stuck_at}");
    assert!(!report.verdict.is_stable(), "{:?}", report.verdict);
    assert_eq!(report.status, Status::NotConverged);

    let report = dynamic.rapidity().unwrap();
    assert_eq!(report.status, Status::NotConverged);
    assert_eq!(report.settling_time, None);

    // At rest nonetheless, so balance completes with the stuck offset.
    let report = dynamic.balance().unwrap();
    assert_eq!(report.status, Status::Completed);
    assert_relative_eq!(
        report.balance_error.get::<radian>().abs(),
        stuck_at,
        max_relative = 1e-9
    );
}

#[test]
fn short_runs_report_an_insufficient_horizon() {
    let compass = unit_compass(0.5);
    let field = unit_field(0.0);
    let config = DynamicConfig {
        time_span: Time::new::<second>(3.0),
        ..reference_config()
    };
    let mut dynamic = Dynamic::new(&compass, &field, config).unwrap();

    let report = dynamic.stability().unwrap();
    assert_eq!(report.status, Status::InsufficientHorizon);
    assert_relative_eq!(report.trajectory.last().unwrap().time, 3.0, epsilon = 1e-9);
}
