use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{
    AIR_DENSITY_SEA_LEVEL, DEFAULT_ANGLE_DEG, DEFAULT_DRAG_COEFFICIENT, DEFAULT_GRAVITY,
    DEFAULT_LAUNCH_VELOCITY, DEFAULT_MASS, DEFAULT_RESTITUTION,
};
use crate::error::{ProjectileError, Result};

/// Launch parameters for a single trial
///
/// Edited freely before a launch; once a [`crate::Trial`] is created it
/// keeps its own copy, so later edits never reach recorded trials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LaunchParams {
    pub mass: f64,             // kg, > 0
    pub angle_deg: f64,        // degrees above horizontal, [0, 90]
    pub launch_velocity: f64,  // m/s, >= 0
    pub drag: f64,             // drag coefficient, >= 0
    pub air_density: f64,      // kg/m³, >= 0
    pub gravity: f64,          // m/s², >= 0
    pub restitution: f64,      // [0, 1], only used by the host physics
    pub spin: f64,             // rad/s, sign selects Magnus direction
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            mass: DEFAULT_MASS,
            angle_deg: DEFAULT_ANGLE_DEG,
            launch_velocity: DEFAULT_LAUNCH_VELOCITY,
            drag: DEFAULT_DRAG_COEFFICIENT,
            air_density: AIR_DENSITY_SEA_LEVEL,
            gravity: DEFAULT_GRAVITY,
            restitution: DEFAULT_RESTITUTION,
            spin: 0.0,
        }
    }
}

impl LaunchParams {
    /// Launch angle in radians
    pub fn angle_rad(&self) -> f64 {
        self.angle_deg.to_radians()
    }

    /// Initial velocity vector in the x/y flight plane
    pub fn initial_velocity(&self) -> Vector3<f64> {
        let angle = self.angle_rad();
        Vector3::new(
            self.launch_velocity * angle.cos(),
            self.launch_velocity * angle.sin(),
            0.0,
        )
    }

    /// True when the fields the integrator needs to start a run are usable
    pub fn is_runnable(&self) -> bool {
        self.launch_velocity.is_finite() && self.angle_deg.is_finite() && self.gravity.is_finite()
    }

    /// Check every field against its physical domain
    ///
    /// The integrators only require [`Self::is_runnable`]; this stricter
    /// check is meant for front ends that want to reject bad input early.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if !(self.mass.is_finite() && self.mass > 0.0) {
            problems.push(format!("mass must be > 0 (got {})", self.mass));
        }
        if !(0.0..=90.0).contains(&self.angle_deg) {
            problems.push(format!("angle must be within [0, 90] degrees (got {})", self.angle_deg));
        }
        if !(self.launch_velocity.is_finite() && self.launch_velocity >= 0.0) {
            problems.push(format!("launch velocity must be >= 0 (got {})", self.launch_velocity));
        }
        if !(self.drag.is_finite() && self.drag >= 0.0) {
            problems.push(format!("drag must be >= 0 (got {})", self.drag));
        }
        if !(self.air_density.is_finite() && self.air_density >= 0.0) {
            problems.push(format!("air density must be >= 0 (got {})", self.air_density));
        }
        if !(self.gravity.is_finite() && self.gravity >= 0.0) {
            problems.push(format!("gravity must be >= 0 (got {})", self.gravity));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            problems.push(format!("restitution must be within [0, 1] (got {})", self.restitution));
        }
        if !self.spin.is_finite() {
            problems.push(format!("spin must be finite (got {})", self.spin));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ProjectileError::InvalidParams(problems))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_velocity_decomposition() {
        let params = LaunchParams {
            launch_velocity: 20.0,
            angle_deg: 30.0,
            ..Default::default()
        };
        let v = params.initial_velocity();
        assert!((v.x - 20.0 * 30f64.to_radians().cos()).abs() < 1e-12);
        assert!((v.y - 10.0).abs() < 1e-9);
        assert_eq!(v.z, 0.0);
        assert!((v.norm() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_params_are_valid() {
        assert!(LaunchParams::default().validate().is_ok());
        assert!(LaunchParams::default().is_runnable());
    }

    #[test]
    fn test_validate_collects_all_problems() {
        let params = LaunchParams {
            mass: 0.0,
            angle_deg: 120.0,
            restitution: 1.5,
            ..Default::default()
        };
        match params.validate() {
            Err(ProjectileError::InvalidParams(problems)) => assert_eq!(problems.len(), 3),
            other => panic!("expected InvalidParams, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_required_fields_not_runnable() {
        let nan_velocity = LaunchParams { launch_velocity: f64::NAN, ..Default::default() };
        let inf_angle = LaunchParams { angle_deg: f64::INFINITY, ..Default::default() };
        let nan_gravity = LaunchParams { gravity: f64::NAN, ..Default::default() };
        assert!(!nan_velocity.is_runnable());
        assert!(!inf_angle.is_runnable());
        assert!(!nan_gravity.is_runnable());

        // Non-finite drag still lets a run start
        let nan_drag = LaunchParams { drag: f64::NAN, ..Default::default() };
        assert!(nan_drag.is_runnable());
    }

    #[test]
    fn test_serde_uses_camel_case_and_defaults() {
        let params: LaunchParams =
            serde_json::from_str(r#"{"launchVelocity": 30.0, "angleDeg": 60.0}"#).unwrap();
        assert_eq!(params.launch_velocity, 30.0);
        assert_eq!(params.angle_deg, 60.0);
        assert_eq!(params.mass, DEFAULT_MASS);
    }
}
