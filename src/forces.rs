//! Aerodynamic force model shared by the headless and driven integrators.
//!
//! Flight happens in the x/y plane, so only the planar components of the
//! velocity take part. Gravity is not part of the model; each integrator
//! (or the host physics engine) applies it separately.

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::constants::{MAGNUS_COEFFICIENT, MAGNUS_SPEED_THRESHOLD, MAGNUS_SPIN_THRESHOLD};
use crate::params::LaunchParams;

/// Drag and Magnus acceleration model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceModel {
    /// k in `F_magnus = k · ρ · |spin| · speed`
    pub magnus_coefficient: f64,
    /// Spin magnitude at or below which Magnus force is ignored
    pub magnus_spin_threshold: f64,
    /// Speed at or below which Magnus force is ignored
    pub magnus_speed_threshold: f64,
}

impl Default for ForceModel {
    fn default() -> Self {
        Self {
            magnus_coefficient: MAGNUS_COEFFICIENT,
            magnus_spin_threshold: MAGNUS_SPIN_THRESHOLD,
            magnus_speed_threshold: MAGNUS_SPEED_THRESHOLD,
        }
    }
}

/// Planar velocity and its magnitude
fn planar(velocity: &Vector3<f64>) -> (Vector2<f64>, f64) {
    let v = Vector2::new(velocity.x, velocity.y);
    let speed = v.norm();
    (v, speed)
}

impl ForceModel {
    /// Drag acceleration opposing the planar velocity
    ///
    /// `F = 0.5 · ρ · Cd · s²`, `a = F / m` along `-v̂`. Zero when the
    /// speed is zero or not finite.
    pub fn drag_acceleration(
        &self,
        velocity: &Vector3<f64>,
        mass: f64,
        air_density: f64,
        drag: f64,
    ) -> Vector3<f64> {
        let (v, speed) = planar(velocity);
        if !(speed > 0.0 && speed.is_finite()) || !(mass > 0.0 && mass.is_finite()) {
            return Vector3::zeros();
        }

        let drag_force = 0.5 * air_density * drag * speed * speed;
        let accel = -(v / speed) * (drag_force / mass);
        Vector3::new(accel.x, accel.y, 0.0)
    }

    /// Magnus acceleration perpendicular to the planar velocity
    ///
    /// Positive spin turns a `+x` velocity towards `+y` (left-hand
    /// perpendicular); negative spin reverses the direction.
    pub fn magnus_acceleration(
        &self,
        velocity: &Vector3<f64>,
        spin: f64,
        mass: f64,
        air_density: f64,
    ) -> Vector3<f64> {
        let (v, speed) = planar(velocity);
        if !(spin.abs() > self.magnus_spin_threshold)
            || !(speed > self.magnus_speed_threshold && speed.is_finite())
            || !(mass > 0.0 && mass.is_finite())
        {
            return Vector3::zeros();
        }

        let magnus_force = self.magnus_coefficient * air_density * spin.abs() * speed;
        let perpendicular = Vector2::new(-v.y, v.x) / speed * spin.signum();
        let accel = perpendicular * (magnus_force / mass);
        Vector3::new(accel.x, accel.y, 0.0)
    }

    /// Combined aerodynamic acceleration (drag + Magnus), gravity excluded
    pub fn acceleration(&self, velocity: &Vector3<f64>, spin: f64, params: &LaunchParams) -> Vector3<f64> {
        self.drag_acceleration(velocity, params.mass, params.air_density, params.drag)
            + self.magnus_acceleration(velocity, spin, params.mass, params.air_density)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(mass: f64, drag: f64, air_density: f64) -> LaunchParams {
        LaunchParams { mass, drag, air_density, ..Default::default() }
    }

    #[test]
    fn test_drag_opposes_velocity() {
        let model = ForceModel::default();
        let velocity = Vector3::new(3.0, 4.0, 0.0);
        let accel = model.drag_acceleration(&velocity, 2.0, 1.2, 0.5);

        // 0.5 * 1.2 * 0.5 * 25 / 2 = 3.75
        assert!((accel.norm() - 3.75).abs() < 1e-12);
        assert!(accel.dot(&velocity) < 0.0);
        assert!((accel.x / accel.y - 0.75).abs() < 1e-12);
        assert_eq!(accel.z, 0.0);
    }

    #[test]
    fn test_drag_zero_for_degenerate_speed() {
        let model = ForceModel::default();
        assert_eq!(model.drag_acceleration(&Vector3::zeros(), 1.0, 1.225, 0.47), Vector3::zeros());
        let nan = Vector3::new(f64::NAN, 1.0, 0.0);
        assert_eq!(model.drag_acceleration(&nan, 1.0, 1.225, 0.47), Vector3::zeros());
        let inf = Vector3::new(f64::INFINITY, 0.0, 0.0);
        assert_eq!(model.drag_acceleration(&inf, 1.0, 1.225, 0.47), Vector3::zeros());
    }

    #[test]
    fn test_drag_ignores_z_component() {
        let model = ForceModel::default();
        let planar_only = model.drag_acceleration(&Vector3::new(10.0, 0.0, 0.0), 1.0, 1.0, 1.0);
        let with_z = model.drag_acceleration(&Vector3::new(10.0, 0.0, 50.0), 1.0, 1.0, 1.0);
        assert_eq!(planar_only, with_z);
    }

    #[test]
    fn test_magnus_direction_follows_spin_sign() {
        let model = ForceModel::default();
        let velocity = Vector3::new(10.0, 0.0, 0.0);

        let positive = model.magnus_acceleration(&velocity, 20.0, 1.0, 1.225);
        assert!(positive.y > 0.0);
        assert!(positive.x.abs() < 1e-15);

        let negative = model.magnus_acceleration(&velocity, -20.0, 1.0, 1.225);
        assert!(negative.y < 0.0);
        assert!((positive + negative).norm() < 1e-15);
    }

    #[test]
    fn test_magnus_magnitude() {
        let model = ForceModel { magnus_coefficient: 0.01, ..Default::default() };
        let accel = model.magnus_acceleration(&Vector3::new(0.0, 5.0, 0.0), 10.0, 2.0, 1.0);
        // 0.01 * 1.0 * 10 * 5 / 2 = 0.25, pointing towards -x for +y velocity
        assert!((accel.norm() - 0.25).abs() < 1e-12);
        assert!(accel.x < 0.0);
    }

    #[test]
    fn test_magnus_thresholds() {
        let model = ForceModel::default();
        let velocity = Vector3::new(10.0, 0.0, 0.0);
        assert_eq!(model.magnus_acceleration(&velocity, 0.05, 1.0, 1.225), Vector3::zeros());
        assert_eq!(
            model.magnus_acceleration(&Vector3::new(0.05, 0.0, 0.0), 30.0, 1.0, 1.225),
            Vector3::zeros()
        );
    }

    #[test]
    fn test_combined_acceleration_is_sum() {
        let model = ForceModel::default();
        let p = LaunchParams { spin: 15.0, ..params(1.5, 0.3, 1.1) };
        let velocity = Vector3::new(7.0, -2.0, 0.0);
        let total = model.acceleration(&velocity, p.spin, &p);
        let expected = model.drag_acceleration(&velocity, p.mass, p.air_density, p.drag)
            + model.magnus_acceleration(&velocity, p.spin, p.mass, p.air_density);
        assert!((total - expected).norm() < 1e-15);
    }

    #[test]
    fn test_zero_air_density_means_no_forces() {
        let model = ForceModel::default();
        let p = LaunchParams { spin: 40.0, ..params(1.0, 0.47, 0.0) };
        let accel = model.acceleration(&Vector3::new(20.0, 20.0, 0.0), p.spin, &p);
        assert_eq!(accel, Vector3::zeros());
    }
}
