//! Median-filtered sonar.
//!
//! Keeps the last `sample_size` raw readings in a fixed-capacity window
//! (oldest evicted first) and reports their median.  A single spurious
//! echo cannot move the median, which is what makes raw HC-SR04 output
//! usable as a training observation.

use heapless::Deque;
use log::warn;

use crate::app::ports::RangeFinder;
use crate::error::Result;

/// Upper bound on the configurable window length.
pub const MAX_SAMPLE_SIZE: usize = 16;

pub struct SonarSensor<R> {
    ranger: R,
    samples: Deque<f64, MAX_SAMPLE_SIZE>,
    sample_size: usize,
}

impl<R: RangeFinder> SonarSensor<R> {
    /// `sample_size` is clamped into `1..=MAX_SAMPLE_SIZE`; configuration
    /// validation rejects anything outside that range beforehand.
    pub fn new(ranger: R, sample_size: usize) -> Self {
        Self {
            ranger,
            samples: Deque::new(),
            sample_size: sample_size.clamp(1, MAX_SAMPLE_SIZE),
        }
    }

    /// Take one reading and push it into the window.  Returns the raw
    /// reading.
    ///
    /// A hardware fault leaves the window untouched and is propagated.
    pub fn tick(&mut self) -> Result<f64> {
        let reading = self
            .ranger
            .measure()
            .inspect_err(|e| warn!("sonar: reading failed, window unchanged: {e}"))?;
        self.push(reading);
        Ok(reading)
    }

    /// Unexport the ranger's pins.
    pub fn release(&mut self) -> Result<()> {
        self.ranger.release()
    }

    fn push(&mut self, reading: f64) {
        if self.samples.len() >= self.sample_size {
            self.samples.pop_front();
        }
        // Cannot fail: the window was just trimmed below capacity.
        let _ = self.samples.push_back(reading);
    }
}

impl<R> SonarSensor<R> {
    /// Median of the window, or `None` until it has filled once.
    ///
    /// Even window lengths take the upper of the two middle values.
    pub fn distance(&self) -> Option<f64> {
        if !self.is_warm() {
            return None;
        }
        let mut sorted: heapless::Vec<f64, MAX_SAMPLE_SIZE> =
            self.samples.iter().copied().collect();
        sorted.sort_unstable_by(f64::total_cmp);
        Some(sorted[sorted.len() / 2])
    }

    /// True once the window holds `sample_size` readings.
    pub fn is_warm(&self) -> bool {
        self.samples.len() >= self.sample_size
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Window contents, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn ranger(&self) -> &R {
        &self.ranger
    }

    pub fn ranger_mut(&mut self) -> &mut R {
        &mut self.ranger
    }
}
