//! Single launches and randomized batches of headless trials.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::driven::{DrivenIntegrator, RigidBodyHost};
use crate::error::{ProjectileError, Result};
use crate::integrator::HeadlessIntegrator;
use crate::params::LaunchParams;
use crate::trial::{TrialId, TrialOrigin, TrialStore};

/// Source of launch parameters for batch trials
pub trait ParamSampler {
    fn sample(&mut self) -> LaunchParams;
}

impl<F: FnMut() -> LaunchParams> ParamSampler for F {
    fn sample(&mut self) -> LaunchParams {
        self()
    }
}

/// Closed interval a parameter is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
}

impl ParamRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn check(&self, name: &'static str) -> Result<()> {
        // gen_range panics when the width overflows
        if self.min <= self.max && (self.max - self.min).is_finite() {
            Ok(())
        } else {
            Err(ProjectileError::InvalidRange { name, min: self.min, max: self.max })
        }
    }

    fn draw<R: Rng>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.min..=self.max)
    }
}

/// Sampling ranges for the randomized parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamRanges {
    pub launch_velocity: ParamRange,  // m/s
    pub angle_deg: ParamRange,        // degrees
    pub mass: ParamRange,             // kg
    pub drag: ParamRange,
    pub spin: ParamRange,             // rad/s
}

impl Default for ParamRanges {
    fn default() -> Self {
        Self {
            launch_velocity: ParamRange::new(1.0, 50.0),
            angle_deg: ParamRange::new(0.0, 90.0),
            mass: ParamRange::new(0.1, 100.0),
            drag: ParamRange::new(0.0, 2.0),
            spin: ParamRange::new(-50.0, 50.0),
        }
    }
}

impl ParamRanges {
    pub fn validate(&self) -> Result<()> {
        self.launch_velocity.check("launch_velocity")?;
        self.angle_deg.check("angle")?;
        self.mass.check("mass")?;
        self.drag.check("drag")?;
        self.spin.check("spin")
    }
}

/// Uniform draws within [`ParamRanges`]
///
/// Gravity, air density and restitution come from `base` unchanged.
#[derive(Debug, Clone)]
pub struct UniformSampler {
    ranges: ParamRanges,
    base: LaunchParams,
    rng: StdRng,
}

impl UniformSampler {
    pub fn new(ranges: ParamRanges, base: LaunchParams, seed: u64) -> Result<Self> {
        ranges.validate()?;
        Ok(Self {
            ranges,
            base,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn ranges(&self) -> &ParamRanges {
        &self.ranges
    }
}

impl ParamSampler for UniformSampler {
    fn sample(&mut self) -> LaunchParams {
        let rng = &mut self.rng;
        LaunchParams {
            launch_velocity: self.ranges.launch_velocity.draw(rng),
            angle_deg: self.ranges.angle_deg.draw(rng),
            mass: self.ranges.mass.draw(rng),
            drag: self.ranges.drag.draw(rng),
            spin: self.ranges.spin.draw(rng),
            ..self.base
        }
    }
}

/// Standard deviations for [`JitterSampler`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Jitter {
    pub velocity_std_dev: f64,  // m/s
    pub angle_std_dev: f64,     // degrees
    pub mass_std_dev: f64,      // kg
    pub drag_std_dev: f64,
    pub spin_std_dev: f64,      // rad/s
}

impl Default for Jitter {
    fn default() -> Self {
        Self {
            velocity_std_dev: 1.0,
            angle_std_dev: 1.0,
            mass_std_dev: 0.0,
            drag_std_dev: 0.02,
            spin_std_dev: 0.0,
        }
    }
}

/// Normally distributed variation around one nominal launch
///
/// Draws are clamped back into each parameter's physical domain.
#[derive(Debug, Clone)]
pub struct JitterSampler {
    base: LaunchParams,
    velocity: Normal<f64>,
    angle: Normal<f64>,
    mass: Normal<f64>,
    drag: Normal<f64>,
    spin: Normal<f64>,
    rng: StdRng,
}

fn normal(name: &'static str, mean: f64, std_dev: f64) -> Result<Normal<f64>> {
    if !(std_dev >= 0.0 && std_dev.is_finite()) || !mean.is_finite() {
        return Err(ProjectileError::InvalidSpread { name, std_dev });
    }
    Normal::new(mean, std_dev).map_err(|_| ProjectileError::InvalidSpread { name, std_dev })
}

impl JitterSampler {
    pub fn new(base: LaunchParams, jitter: Jitter, seed: u64) -> Result<Self> {
        Ok(Self {
            velocity: normal("launch_velocity", base.launch_velocity, jitter.velocity_std_dev)?,
            angle: normal("angle", base.angle_deg, jitter.angle_std_dev)?,
            mass: normal("mass", base.mass, jitter.mass_std_dev)?,
            drag: normal("drag", base.drag, jitter.drag_std_dev)?,
            spin: normal("spin", base.spin, jitter.spin_std_dev)?,
            base,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl ParamSampler for JitterSampler {
    fn sample(&mut self) -> LaunchParams {
        let rng = &mut self.rng;
        LaunchParams {
            launch_velocity: self.velocity.sample(rng).max(0.0),
            angle_deg: self.angle.sample(rng).clamp(0.0, 90.0),
            mass: self.mass.sample(rng).max(0.01),
            drag: self.drag.sample(rng).max(0.0),
            spin: self.spin.sample(rng),
            ..self.base
        }
    }
}

/// Progress signal emitted once per completed batch trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
    pub percent: f64,
    pub trial_id: TrialId,
}

/// Lazily running batch; each `next()` simulates and stores one trial
///
/// Dropping the iterator abandons the rest of the batch. Trials already
/// stored stay in the store.
pub struct BatchRun<'a, S: ParamSampler + ?Sized> {
    total: usize,
    completed: usize,
    sampler: &'a mut S,
    store: &'a mut TrialStore,
    integrator: HeadlessIntegrator,
}

/// Start a batch of `n` randomized headless trials
pub fn run_batch<'a, S: ParamSampler + ?Sized>(
    n: usize,
    sampler: &'a mut S,
    store: &'a mut TrialStore,
    integrator: HeadlessIntegrator,
) -> BatchRun<'a, S> {
    if n > 0 {
        info!(trials = n, "starting batch");
    }
    BatchRun {
        total: n,
        completed: 0,
        sampler,
        store,
        integrator,
    }
}

impl<'a, S: ParamSampler + ?Sized> BatchRun<'a, S> {
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Drive the remaining trials, reporting each one; returns how many ran
    pub fn run_to_end<F: FnMut(&BatchProgress)>(mut self, mut on_progress: F) -> usize {
        let mut ran = 0;
        for progress in &mut self {
            on_progress(&progress);
            ran += 1;
        }
        ran
    }
}

impl<'a, S: ParamSampler + ?Sized> Iterator for BatchRun<'a, S> {
    type Item = BatchProgress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.completed >= self.total {
            return None;
        }

        let params = self.sampler.sample();
        let result = self.integrator.run(&params);
        debug!(
            velocity = params.launch_velocity,
            angle = params.angle_deg,
            distance = result.distance,
            outcome = ?result.outcome,
            "batch trial"
        );
        let trial_id = self.store.record(params, result, TrialOrigin::Batch);
        self.completed += 1;

        let percent = if self.completed == self.total {
            info!(trials = self.total, "batch complete");
            100.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        };

        Some(BatchProgress {
            completed: self.completed,
            total: self.total,
            percent,
            trial_id,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.completed;
        (remaining, Some(remaining))
    }
}

impl<'a, S: ParamSampler + ?Sized> ExactSizeIterator for BatchRun<'a, S> {}

/// Start an interactive launch on a hosted body
///
/// The result arrives from [`DrivenIntegrator::after_step`] once the body
/// lands; record it with [`TrialOrigin::Interactive`].
pub fn launch_one<H: RigidBodyHost + ?Sized>(
    integrator: &mut DrivenIntegrator,
    host: &mut H,
    params: LaunchParams,
) {
    integrator.launch(host, params);
}
