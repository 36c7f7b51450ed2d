/// Physical defaults and tuning constants used by the simulation engine

/// Default gravitational acceleration in m/s²
pub const DEFAULT_GRAVITY: f64 = 9.81;

/// Air density at sea level (kg/m³)
pub const AIR_DENSITY_SEA_LEVEL: f64 = 1.225;

/// Default drag coefficient (smooth sphere)
pub const DEFAULT_DRAG_COEFFICIENT: f64 = 0.47;

/// Default projectile mass (kg)
pub const DEFAULT_MASS: f64 = 1.0;

/// Default launch angle (degrees above horizontal)
pub const DEFAULT_ANGLE_DEG: f64 = 45.0;

/// Default launch speed (m/s)
pub const DEFAULT_LAUNCH_VELOCITY: f64 = 15.0;

/// Default coefficient of restitution for ground contact
pub const DEFAULT_RESTITUTION: f64 = 0.5;

// Integrator defaults

/// Fixed integration timestep (seconds), one display frame at 60 Hz
pub const DEFAULT_TIME_STEP: f64 = 1.0 / 60.0;

/// Iteration cap for a headless run
///
/// At the default timestep this bounds a run to roughly 167 simulated
/// seconds. Upward-only parameter combinations (zero gravity, strong
/// Magnus lift) terminate here instead of looping forever.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Launch height above the ground plane (m)
pub const DEFAULT_INITIAL_HEIGHT: f64 = 5.0;

/// Height below which the projectile counts as landed (m)
///
/// Matches the half-extent of the unit cube the interactive host
/// simulates: its centre sits at 0.5 m when resting on the ground.
pub const GROUND_THRESHOLD: f64 = 0.5;

/// Trajectory sampling interval in simulated seconds
pub const DEFAULT_SAMPLE_INTERVAL_S: f64 = 0.1;

/// Trajectory sampling interval in ticks, for hosts without a clock
pub const DEFAULT_SAMPLE_INTERVAL_TICKS: u32 = 6;

/// Peak height the projectile must exceed before a landing is accepted
///
/// Heuristic guard against declaring a landing on the first ticks of a
/// launch from ground level. Not a physical law; overridable through
/// `[landing] noise_threshold` in the config file.
pub const LANDING_NOISE_THRESHOLD: f64 = 1.0;

// Force model constants

/// Magnus force coefficient k in `F = k · ρ · |spin| · speed`
pub const MAGNUS_COEFFICIENT: f64 = 0.0001;

/// Spin magnitude (rad/s) below which no Magnus force is applied
pub const MAGNUS_SPIN_THRESHOLD: f64 = 0.1;

/// Speed (m/s) below which no Magnus force is applied
pub const MAGNUS_SPEED_THRESHOLD: f64 = 0.1;

// Analysis

/// Default heatmap resolution along each axis
pub const DEFAULT_BINS: usize = 12;

/// Percentiles reported by field statistics
pub const REPORTED_PERCENTILES: [f64; 7] = [0.05, 0.10, 0.25, 0.50, 0.75, 0.90, 0.95];

// Numerical stability constants

/// General numerical tolerance for floating point comparisons
pub const NUMERICAL_TOLERANCE: f64 = 1e-9;
