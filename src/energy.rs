use nalgebra::Vector3;
use serde::Serialize;

use crate::integrator::SimulationState;

/// Mechanical energy readout of a live flight, in joules
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyBreakdown {
    pub kinetic: f64,
    pub potential: f64,  // relative to y = 0
    pub total: f64,
}

impl EnergyBreakdown {
    pub fn new(mass: f64, gravity: f64, position: &Vector3<f64>, velocity: &Vector3<f64>) -> Self {
        let speed = velocity.norm();
        let kinetic = 0.5 * mass * speed * speed;
        let potential = mass * gravity * position.y;
        Self {
            kinetic,
            potential,
            total: kinetic + potential,
        }
    }

    pub fn from_state(state: &SimulationState, mass: f64, gravity: f64) -> Self {
        Self::new(mass, gravity, &state.position, &state.velocity)
    }

    /// Kinetic share of the total in percent, 0 when the total is not positive
    pub fn kinetic_percent(&self) -> f64 {
        if self.total > 0.0 {
            self.kinetic / self.total * 100.0
        } else {
            0.0
        }
    }

    pub fn potential_percent(&self) -> f64 {
        if self.total > 0.0 {
            self.potential / self.total * 100.0
        } else {
            0.0
        }
    }
}
