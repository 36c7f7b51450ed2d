//! Self-contained fixed-timestep integrator for offline trials.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{
    DEFAULT_INITIAL_HEIGHT, DEFAULT_MAX_ITERATIONS, DEFAULT_SAMPLE_INTERVAL_S, DEFAULT_TIME_STEP,
    GROUND_THRESHOLD,
};
use crate::forces::ForceModel;
use crate::params::LaunchParams;
use crate::trajectory_sampling::{SampleInterval, TrajectorySampler};
use crate::trial::{FlightOutcome, TrialResult};

/// Settings for a headless run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig {
    pub dt: f64,                  // s per tick
    pub max_iterations: usize,    // hard cap on ticks
    pub initial_height: f64,      // m, launch y
    pub ground_threshold: f64,    // m, landed once y drops below
    pub sample_interval: f64,     // s between trajectory samples
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            dt: DEFAULT_TIME_STEP,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            initial_height: DEFAULT_INITIAL_HEIGHT,
            ground_threshold: GROUND_THRESHOLD,
            sample_interval: DEFAULT_SAMPLE_INTERVAL_S,
        }
    }
}

impl IntegratorConfig {
    /// Launch and land at y = 0, for comparisons against closed-form range
    pub fn ground_level() -> Self {
        Self {
            initial_height: 0.0,
            ground_threshold: 0.0,
            ..Default::default()
        }
    }
}

/// Kinematic state of one run, reset at every launch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationState {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub elapsed_time: f64,
    pub peak_height: f64,
}

impl SimulationState {
    pub fn launch(params: &LaunchParams, initial_height: f64) -> Self {
        Self {
            position: Vector3::new(0.0, initial_height, 0.0),
            velocity: params.initial_velocity(),
            elapsed_time: 0.0,
            peak_height: initial_height,
        }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            elapsed_time: 0.0,
            peak_height: 0.0,
        }
    }
}

/// Runs a trial from launch to landing without an external physics host
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessIntegrator {
    config: IntegratorConfig,
    forces: ForceModel,
}

impl HeadlessIntegrator {
    pub fn new(config: IntegratorConfig, forces: ForceModel) -> Self {
        Self { config, forces }
    }

    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    pub fn forces(&self) -> &ForceModel {
        &self.forces
    }

    /// Simulate one flight to completion
    ///
    /// Never fails. Non-finite velocity, angle or gravity give the zeroed
    /// [`FlightOutcome::Invalid`] result without advancing time.
    pub fn run(&self, params: &LaunchParams) -> TrialResult {
        if !params.is_runnable() {
            warn!(
                velocity = params.launch_velocity,
                angle = params.angle_deg,
                gravity = params.gravity,
                "rejecting launch with non-finite parameters"
            );
            return TrialResult::invalid();
        }

        let dt = self.config.dt;
        let gravity = Vector3::new(0.0, -params.gravity, 0.0);
        let mut state = SimulationState::launch(params, self.config.initial_height);
        let mut sampler = TrajectorySampler::new(SampleInterval::Seconds(self.config.sample_interval));
        let mut ticks: u64 = 0;

        let outcome = loop {
            let speed = state.speed();
            if !(speed > 0.0 && speed.is_finite()) {
                break FlightOutcome::Degenerate;
            }

            let acceleration = self.forces.acceleration(&state.velocity, params.spin, params) + gravity;

            // Semi-implicit Euler
            state.velocity += acceleration * dt;
            state.position += state.velocity * dt;
            state.elapsed_time += dt;
            state.peak_height = state.peak_height.max(state.position.y);
            ticks += 1;

            sampler.observe(state.position, state.elapsed_time, ticks);

            if state.position.y < self.config.ground_threshold {
                break FlightOutcome::Landed;
            }
            if ticks as usize >= self.config.max_iterations {
                debug!(
                    ticks,
                    x = state.position.x,
                    y = state.position.y,
                    "run hit the iteration cap before landing"
                );
                break FlightOutcome::Aborted;
            }
        };

        if ticks > 0 {
            sampler.finish(state.position);
        }
        let trajectory = sampler.into_trajectory();

        let distance = if state.position.x.is_finite() { state.position.x } else { 0.0 };
        TrialResult {
            distance,
            max_height: trajectory.max_height(),
            air_time: state.elapsed_time,
            trajectory,
            outcome,
        }
    }
}

/// Headless run with default integrator and force settings
pub fn run_headless(params: &LaunchParams) -> TrialResult {
    HeadlessIntegrator::default().run(params)
}
