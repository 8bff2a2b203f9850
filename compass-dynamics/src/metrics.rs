//! Scalar summaries of a needle trajectory.
//!
//! Every function here is a pure function of its arguments. Angles are in
//! radians, angular velocities in rad/s and times in seconds, matching the
//! fields of [`Sample`]. Deviations from equilibrium are always wrapped into
//! `(-π, π]` so that a needle resting just either side of north reads as a
//! small deviation.

use compass_core::angle::wrap_to_pi;

use crate::dynamic::Sample;

/// Deviations at or below this many radians count as sitting on equilibrium.
pub const DEFAULT_NOISE_FLOOR: f64 = 1e-8;

/// A local maximum of `|θ - θ_eq|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub time: f64,
    pub deviation: f64,
}

/// Signed deviation of `angle` from `equilibrium`, wrapped into `(-π, π]`.
#[must_use]
pub fn deviation(angle: f64, equilibrium: f64) -> f64 {
    wrap_to_pi(angle - equilibrium)
}

/// First time after which the deviation stays within `band`.
///
/// Scans backward from the end, so a transient dip into the band before a
/// later excursion is not mistaken for settling. Returns `None` if the last
/// sample is outside the band.
#[must_use]
pub fn settling_time(samples: &[Sample], equilibrium: f64, band: f64) -> Option<f64> {
    trailing_run_start(samples, |sample| {
        deviation(sample.angle, equilibrium).abs() <= band
    })
}

/// First time after which both angle and velocity stay within their bands.
#[must_use]
pub fn held_since(
    samples: &[Sample],
    equilibrium: f64,
    angle_band: f64,
    velocity_band: f64,
) -> Option<f64> {
    trailing_run_start(samples, |sample| {
        deviation(sample.angle, equilibrium).abs() <= angle_band
            && sample.angular_velocity.abs() <= velocity_band
    })
}

fn trailing_run_start(samples: &[Sample], inside: impl Fn(&Sample) -> bool) -> Option<f64> {
    let outside = samples.iter().rposition(|sample| !inside(sample));
    match outside {
        None => samples.first().map(|sample| sample.time),
        Some(index) => samples.get(index + 1).map(|sample| sample.time),
    }
}

/// Times at which the needle swings through equilibrium.
///
/// Samples within `noise_floor` of equilibrium are skipped, and crossing
/// times are interpolated linearly between the significant samples either
/// side. A jump of more than half a turn between samples is the deviation
/// wrapping around, not a crossing.
#[must_use]
pub fn zero_crossings(samples: &[Sample], equilibrium: f64, noise_floor: f64) -> Vec<f64> {
    let mut crossings = Vec::new();
    let mut previous: Option<(f64, f64)> = None;

    for sample in samples {
        let current = deviation(sample.angle, equilibrium);
        if current.abs() <= noise_floor {
            continue;
        }
        if let Some((time, last)) = previous {
            let wraps = (current - last).abs() > std::f64::consts::PI;
            if last.signum() != current.signum() && !wraps {
                crossings.push(time + (sample.time - time) * last / (last - current));
            }
        }
        previous = Some((sample.time, current));
    }

    crossings
}

/// Oscillation period, twice the mean interval between crossings.
///
/// Only defined with at least two crossings.
#[must_use]
pub fn oscillation_period(samples: &[Sample], equilibrium: f64, noise_floor: f64) -> Option<f64> {
    let crossings = zero_crossings(samples, equilibrium, noise_floor);
    match crossings.as_slice() {
        [first, .., last] => {
            let intervals = (crossings.len() - 1) as f64;
            Some(2.0 * (last - first) / intervals)
        }
        _ => None,
    }
}

/// Largest swing past equilibrium after the first crossing, relative to
/// `disturbance`.
///
/// Zero when the needle never crosses equilibrium or the disturbance is zero.
#[must_use]
pub fn overshoot_ratio(
    samples: &[Sample],
    equilibrium: f64,
    disturbance: f64,
    noise_floor: f64,
) -> f64 {
    if disturbance <= 0.0 {
        return 0.0;
    }

    let mut deviations = samples
        .iter()
        .map(|sample| deviation(sample.angle, equilibrium))
        .filter(|value| value.abs() > noise_floor);

    let Some(start) = deviations.next() else {
        return 0.0;
    };

    let overshoot = deviations
        .filter(|value| value.signum() != start.signum())
        .map(f64::abs)
        .fold(0.0, f64::max);

    overshoot / disturbance
}

/// Local maxima of `|θ - θ_eq|`, starting with the first sample.
#[must_use]
pub fn envelope(samples: &[Sample], equilibrium: f64) -> Vec<Peak> {
    let peak = |sample: &Sample| Peak {
        time: sample.time,
        deviation: deviation(sample.angle, equilibrium).abs(),
    };

    let Some(first) = samples.first() else {
        return Vec::new();
    };

    let mut peaks = vec![peak(first)];
    peaks.extend(samples.windows(3).filter_map(|window| {
        let [before, middle, after] = window else {
            return None;
        };
        let (before, middle, after) = (peak(before), peak(middle), peak(after));
        (middle.deviation > before.deviation && middle.deviation >= after.deviation)
            .then_some(middle)
    }));
    peaks
}

/// Final angle relative to the `ideal` rest angle, wrapped into `(-π, π]`.
#[must_use]
pub fn balance_error(samples: &[Sample], ideal: f64) -> Option<f64> {
    samples
        .last()
        .map(|sample| deviation(sample.angle, ideal))
}

/// Peak-to-peak angle over samples at or after `from_time`.
#[must_use]
pub fn peak_to_peak(samples: &[Sample], from_time: f64) -> f64 {
    let (low, high) = samples
        .iter()
        .filter(|sample| sample.time >= from_time)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), sample| {
            (low.min(sample.angle), high.max(sample.angle))
        });
    if high >= low { high - low } else { 0.0 }
}

/// Whether the needle is still from `from_time` on.
///
/// Requires at least one sample in the window, an angle range within
/// `angle_tolerance` and every velocity within `velocity_tolerance`.
#[must_use]
pub fn is_at_rest(
    samples: &[Sample],
    from_time: f64,
    angle_tolerance: f64,
    velocity_tolerance: f64,
) -> bool {
    let window: Vec<_> = samples
        .iter()
        .filter(|sample| sample.time >= from_time)
        .collect();

    !window.is_empty()
        && window
            .iter()
            .all(|sample| sample.angular_velocity.abs() <= velocity_tolerance)
        && peak_to_peak(samples, from_time) <= angle_tolerance
}
