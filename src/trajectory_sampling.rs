use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::NUMERICAL_TOLERANCE;

/// How often the sampler keeps a point from the position stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleInterval {
    /// Keep a point each time simulated time crosses a multiple of this many seconds
    Seconds(f64),
    /// Keep a point every n ticks, for hosts that expose no clock
    Ticks(u32),
}

/// Sparse, time-uniform polyline of a flight
///
/// Points are in temporal order. Once a run ends the trajectory is only
/// read, never extended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trajectory {
    points: Vec<Vector3<f64>>,
}

impl Trajectory {
    pub fn new(points: Vec<Vector3<f64>>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn final_point(&self) -> Option<&Vector3<f64>> {
        self.points.last()
    }

    /// Highest sampled point
    pub fn apex(&self) -> Option<&Vector3<f64>> {
        self.points
            .iter()
            .max_by(|a, b| a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Highest sampled y, 0 when empty
    pub fn max_height(&self) -> f64 {
        self.points.iter().map(|p| p.y).reduce(f64::max).unwrap_or(0.0)
    }

    /// Position at `fraction` of the way through the polyline, for replay
    ///
    /// `fraction` is clamped to [0, 1] and mapped linearly onto point
    /// indices. Returns `None` for an empty trajectory.
    pub fn position_at(&self, fraction: f64) -> Option<Vector3<f64>> {
        let n = self.points.len();
        if n == 0 {
            return None;
        }
        if n == 1 || !fraction.is_finite() {
            return Some(self.points[0]);
        }

        let index = fraction.clamp(0.0, 1.0) * (n - 1) as f64;
        let lower = index.floor() as usize;
        let upper = index.ceil() as usize;
        if lower == upper {
            return Some(self.points[lower]);
        }

        let weight = index - lower as f64;
        Some(self.points[lower] * (1.0 - weight) + self.points[upper] * weight)
    }
}

/// Reduces a high-frequency position stream to a [`Trajectory`]
#[derive(Debug, Clone)]
pub struct TrajectorySampler {
    interval: SampleInterval,
    points: Vec<Vector3<f64>>,
    last_slot: u64,
    observed: bool,
    last_recorded: bool,
}

impl TrajectorySampler {
    pub fn new(interval: SampleInterval) -> Self {
        Self {
            interval,
            points: Vec::new(),
            last_slot: 0,
            observed: false,
            last_recorded: false,
        }
    }

    pub fn interval(&self) -> SampleInterval {
        self.interval
    }

    /// Drop all samples and start over for a new run
    pub fn reset(&mut self) {
        self.points.clear();
        self.last_slot = 0;
        self.observed = false;
        self.last_recorded = false;
    }

    /// Offer one position from the stream
    ///
    /// `elapsed` is simulated time since launch and `tick` the number of
    /// completed steps. Returns true when the point was kept.
    pub fn observe(&mut self, position: Vector3<f64>, elapsed: f64, tick: u64) -> bool {
        self.observed = true;

        let slot = match self.interval {
            SampleInterval::Seconds(interval) if interval > 0.0 && elapsed.is_finite() => {
                (elapsed / interval + NUMERICAL_TOLERANCE).floor() as u64
            }
            SampleInterval::Seconds(_) => tick,
            SampleInterval::Ticks(n) => tick / u64::from(n.max(1)),
        };

        self.last_recorded = slot > self.last_slot;
        if self.last_recorded {
            self.last_slot = slot;
            self.points.push(position);
        }
        self.last_recorded
    }

    /// Record the terminal position unless the last observation already did
    ///
    /// Does nothing when the stream never produced a point, so a run that
    /// never advanced keeps an empty trajectory.
    pub fn finish(&mut self, final_position: Vector3<f64>) {
        if self.observed && !self.last_recorded {
            self.points.push(final_position);
            self.last_recorded = true;
        }
    }

    pub fn samples(&self) -> &[Vector3<f64>] {
        &self.points
    }

    /// Freeze the samples collected so far
    pub fn into_trajectory(self) -> Trajectory {
        Trajectory::new(self.points)
    }

    /// Copy out the samples, leaving the sampler untouched
    pub fn snapshot(&self) -> Trajectory {
        Trajectory::new(self.points.clone())
    }
}
