//! # Projectile Engine
//!
//! Fixed-timestep projectile simulation with quadratic drag and Magnus
//! lift, in a headless form for offline batches and a driven form for
//! external rigid-body hosts, plus trial recording, heatmap binning and
//! CSV round-tripping of results.

// Re-export the main types and functions
pub use analysis::{
    bin, comparison_series, field_statistics, theoretical_distance, Bin, ComparisonPoint,
    FieldStatistics, Heatmap, TrialField,
};
pub use batch::{
    launch_one, run_batch, BatchProgress, BatchRun, Jitter, JitterSampler, ParamRange,
    ParamRanges, ParamSampler, UniformSampler,
};
pub use config::SimConfig;
pub use driven::{
    DrivenConfig, DrivenIntegrator, FlightPhase, PointMassHost, RigidBodyHost, SpinSource,
    SteppableHost,
};
pub use energy::EnergyBreakdown;
pub use error::{ProjectileError, Result};
pub use export::{export_csv, import_csv, read_trials, write_trials, ExportColumns, ImportReport, SkippedRow};
pub use forces::ForceModel;
pub use integrator::{run_headless, HeadlessIntegrator, IntegratorConfig, SimulationState};
pub use params::LaunchParams;
pub use trajectory_sampling::{SampleInterval, Trajectory, TrajectorySampler};
pub use trial::{FlightOutcome, Trial, TrialId, TrialOrigin, TrialResult, TrialStore};

// Module declarations
pub mod analysis;
pub mod batch;
pub mod config;
pub mod constants;
pub mod driven;
pub mod energy;
pub mod error;
pub mod export;
pub mod forces;
pub mod integrator;
pub mod params;
pub mod trajectory_sampling;
pub mod trial;
