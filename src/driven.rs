//! Integrator embodiment driven by an external rigid-body engine.
//!
//! The host owns position and velocity and integrates them itself. Each
//! tick the host calls [`DrivenIntegrator::before_step`] (forces are
//! computed and applied), advances its own simulation, then calls
//! [`DrivenIntegrator::after_step`] (landing detection). During flight the
//! integrator only ever applies forces; the setters on
//! [`RigidBodyHost`] are used by [`DrivenIntegrator::launch`] alone.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{
    DEFAULT_INITIAL_HEIGHT, DEFAULT_MAX_ITERATIONS, DEFAULT_SAMPLE_INTERVAL_S,
    DEFAULT_SAMPLE_INTERVAL_TICKS, DEFAULT_TIME_STEP, GROUND_THRESHOLD, LANDING_NOISE_THRESHOLD,
};
use crate::forces::ForceModel;
use crate::integrator::SimulationState;
use crate::params::LaunchParams;
use crate::trajectory_sampling::{SampleInterval, Trajectory, TrajectorySampler};
use crate::trial::{FlightOutcome, TrialResult};

/// Physics-engine contract required by the driven integrator
pub trait RigidBodyHost {
    fn linear_velocity(&self) -> Vector3<f64>;
    fn angular_velocity(&self) -> Vector3<f64>;
    fn position(&self) -> Vector3<f64>;

    /// Add a force for the next step; accumulates until reset
    fn apply_force(&mut self, force: Vector3<f64>);
    fn reset_forces(&mut self);
    fn reset_torques(&mut self);

    fn set_translation(&mut self, position: Vector3<f64>);
    fn set_linear_velocity(&mut self, velocity: Vector3<f64>);
    fn set_angular_velocity(&mut self, angular_velocity: Vector3<f64>);
}

/// A host that can advance its own simulation by one tick
pub trait SteppableHost: RigidBodyHost {
    fn step(&mut self, dt: f64);
}

/// Where the Magnus spin value comes from each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinSource {
    /// The launch parameter, constant through the flight
    #[default]
    Params,
    /// The host body's angular velocity about z, which the host may damp
    Host,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivenConfig {
    pub initial_height: f64,           // m
    pub ground_threshold: f64,         // m
    pub landing_noise_threshold: f64,  // m, peak required before landing counts
    pub tick_dt: Option<f64>,          // s per host tick, None when the host has no clock
    pub sample_interval: f64,          // s, used when tick_dt is known
    pub sample_interval_ticks: u32,    // used otherwise
    pub max_ticks: usize,
    pub spin_source: SpinSource,
}

impl Default for DrivenConfig {
    fn default() -> Self {
        Self {
            initial_height: DEFAULT_INITIAL_HEIGHT,
            ground_threshold: GROUND_THRESHOLD,
            landing_noise_threshold: LANDING_NOISE_THRESHOLD,
            tick_dt: Some(DEFAULT_TIME_STEP),
            sample_interval: DEFAULT_SAMPLE_INTERVAL_S,
            sample_interval_ticks: DEFAULT_SAMPLE_INTERVAL_TICKS,
            max_ticks: DEFAULT_MAX_ITERATIONS,
            spin_source: SpinSource::Params,
        }
    }
}

impl DrivenConfig {
    /// Duration of one host tick, falling back to the default frame time
    pub fn tick_duration(&self) -> f64 {
        self.tick_dt.unwrap_or(DEFAULT_TIME_STEP)
    }

    fn sample_interval(&self) -> SampleInterval {
        match self.tick_dt {
            Some(_) => SampleInterval::Seconds(self.sample_interval),
            None => SampleInterval::Ticks(self.sample_interval_ticks),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightPhase {
    Idle,
    InFlight,
    Finished,
}

/// Per-tick force application and landing detection for a hosted body
#[derive(Debug, Clone)]
pub struct DrivenIntegrator {
    config: DrivenConfig,
    forces: ForceModel,
    params: LaunchParams,
    state: SimulationState,
    sampler: TrajectorySampler,
    ticks: u64,
    phase: FlightPhase,
}

impl DrivenIntegrator {
    pub fn new(config: DrivenConfig, forces: ForceModel) -> Self {
        Self {
            sampler: TrajectorySampler::new(config.sample_interval()),
            config,
            forces,
            params: LaunchParams::default(),
            state: SimulationState::default(),
            ticks: 0,
            phase: FlightPhase::Idle,
        }
    }

    pub fn config(&self) -> &DrivenConfig {
        &self.config
    }

    pub fn params(&self) -> &LaunchParams {
        &self.params
    }

    /// Live readout, updated every tick
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Samples collected so far, for live trail drawing
    pub fn trajectory_snapshot(&self) -> Trajectory {
        self.sampler.snapshot()
    }

    /// Place the body at the launch point and start a new flight
    ///
    /// Any previous flight is discarded.
    pub fn launch<H: RigidBodyHost + ?Sized>(&mut self, host: &mut H, params: LaunchParams) {
        host.reset_forces();
        host.reset_torques();

        let state = SimulationState::launch(&params, self.config.initial_height);
        host.set_translation(state.position);
        host.set_angular_velocity(Vector3::new(0.0, 0.0, params.spin));
        host.set_linear_velocity(state.velocity);

        self.params = params;
        self.state = state;
        self.sampler.reset();
        self.ticks = 0;
        self.phase = FlightPhase::InFlight;
        debug!(
            velocity = params.launch_velocity,
            angle = params.angle_deg,
            spin = params.spin,
            "driven launch"
        );
    }

    /// Compute aerodynamic forces and hand them to the host
    ///
    /// Must run before the host integrates the tick. Publishes the host's
    /// current position and velocity to [`Self::state`].
    pub fn before_step<H: RigidBodyHost + ?Sized>(&mut self, host: &mut H) {
        if self.phase != FlightPhase::InFlight {
            return;
        }

        let velocity = host.linear_velocity();
        let position = host.position();
        self.state.velocity = velocity;
        self.state.position = position;

        let spin = match self.config.spin_source {
            SpinSource::Params => self.params.spin,
            SpinSource::Host => host.angular_velocity().z,
        };
        let acceleration = self.forces.acceleration(&velocity, spin, &self.params);

        host.reset_forces();
        host.apply_force(acceleration * self.params.mass);
    }

    /// Observe the stepped body; returns the trial result once it lands
    ///
    /// Records the post-step position with the trajectory sampler, so the
    /// sampled stream matches a headless run tick for tick.
    /// The reported max height is the peak over every tick, launch height
    /// included, so it can exceed the highest sampled point a headless run
    /// reports for the same launch.
    pub fn after_step<H: RigidBodyHost + ?Sized>(&mut self, host: &H) -> Option<TrialResult> {
        if self.phase != FlightPhase::InFlight {
            return None;
        }

        let position = host.position();
        self.ticks += 1;
        self.state.position = position;
        self.state.velocity = host.linear_velocity();
        self.state.elapsed_time = self.ticks as f64 * self.config.tick_duration();
        if position.y > self.state.peak_height {
            self.state.peak_height = position.y;
        }
        self.sampler.observe(position, self.state.elapsed_time, self.ticks);

        let outcome = if position.y < self.config.ground_threshold
            && self.state.peak_height > self.config.landing_noise_threshold
        {
            FlightOutcome::Landed
        } else if self.ticks as usize >= self.config.max_ticks {
            FlightOutcome::Aborted
        } else {
            return None;
        };

        self.phase = FlightPhase::Finished;
        self.sampler.finish(position);

        let result = TrialResult {
            distance: if position.x.is_finite() { position.x } else { 0.0 },
            max_height: self.state.peak_height,
            air_time: self.state.elapsed_time,
            trajectory: self.sampler.snapshot(),
            outcome,
        };
        debug!(
            distance = result.distance,
            max_height = result.max_height,
            air_time = result.air_time,
            ?outcome,
            "driven flight finished"
        );
        Some(result)
    }

    /// One full tick: forces, host integration, landing check
    pub fn step<H: SteppableHost + ?Sized>(&mut self, host: &mut H) -> Option<TrialResult> {
        self.before_step(host);
        host.step(self.config.tick_duration());
        self.after_step(host)
    }
}

/// Minimal rigid-body host: a point mass over a flat ground plane
///
/// Integrates with semi-implicit Euler under gravity and whatever forces
/// were applied. Below `ground_level` the body is pushed back up and its
/// vertical velocity reflected, scaled by the restitution coefficient.
#[derive(Debug, Clone)]
pub struct PointMassHost {
    pub mass: f64,
    pub gravity: f64,
    pub restitution: f64,
    pub ground_level: f64,
    position: Vector3<f64>,
    velocity: Vector3<f64>,
    angular_velocity: Vector3<f64>,
    force: Vector3<f64>,
}

impl PointMassHost {
    pub fn new(mass: f64, gravity: f64, restitution: f64) -> Self {
        Self {
            mass,
            gravity,
            restitution,
            ground_level: 0.0,
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            force: Vector3::zeros(),
        }
    }

    /// Host configured from the physical fields of a launch
    pub fn for_params(params: &LaunchParams) -> Self {
        Self::new(params.mass, params.gravity, params.restitution)
    }

    pub fn accumulated_force(&self) -> Vector3<f64> {
        self.force
    }
}

impl RigidBodyHost for PointMassHost {
    fn linear_velocity(&self) -> Vector3<f64> {
        self.velocity
    }

    fn angular_velocity(&self) -> Vector3<f64> {
        self.angular_velocity
    }

    fn position(&self) -> Vector3<f64> {
        self.position
    }

    fn apply_force(&mut self, force: Vector3<f64>) {
        self.force += force;
    }

    fn reset_forces(&mut self) {
        self.force = Vector3::zeros();
    }

    fn reset_torques(&mut self) {
        // no rotational dynamics, spin is carried unchanged
    }

    fn set_translation(&mut self, position: Vector3<f64>) {
        self.position = position;
    }

    fn set_linear_velocity(&mut self, velocity: Vector3<f64>) {
        self.velocity = velocity;
    }

    fn set_angular_velocity(&mut self, angular_velocity: Vector3<f64>) {
        self.angular_velocity = angular_velocity;
    }
}

impl SteppableHost for PointMassHost {
    fn step(&mut self, dt: f64) {
        let mut acceleration = Vector3::new(0.0, -self.gravity, 0.0);
        if self.mass > 0.0 && self.mass.is_finite() {
            acceleration += self.force / self.mass;
        }

        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;

        if self.position.y < self.ground_level {
            self.position.y = self.ground_level;
            if self.velocity.y < 0.0 {
                self.velocity.y = -self.velocity.y * self.restitution.clamp(0.0, 1.0);
            }
        }
    }
}
