use compass_core::State;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One point of a simulated needle motion.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    /// Time since the start of the run, in seconds.
    pub time: f64,

    /// Needle heading in radians, unwrapped so the motion is continuous.
    pub angle: f64,

    /// Angular velocity in rad/s.
    pub angular_velocity: f64,
}

impl From<State<2>> for Sample {
    fn from(state: State<2>) -> Self {
        let State {
            x: time,
            y: [angle, angular_velocity],
        } = state;
        Self {
            time,
            angle,
            angular_velocity,
        }
    }
}

/// Ordered samples of a needle motion on the output grid.
///
/// This is what a chart of the motion consumes.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trajectory {
    samples: Vec<Sample>,
}

impl Trajectory {
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The last sample, where the run ended.
    #[must_use]
    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }
}

impl FromIterator<Sample> for Trajectory {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
