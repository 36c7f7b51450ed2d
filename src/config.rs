//! TOML configuration for simulations, batches and the CLI.
//!
//! Every section and key is optional; missing values take the engine
//! defaults.
//!
//! ```toml
//! [integrator]
//! dt = 0.004166666666666667
//! initial_height = 0.0
//! ground_threshold = 0.0
//!
//! [forces]
//! magnus_coefficient = 0.0002
//!
//! [landing]
//! noise_threshold = 2.0
//!
//! [batch]
//! seed = 7
//! trials = 500
//! ranges.angle_deg = { min = 10.0, max = 80.0 }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::batch::{Jitter, ParamRanges};
use crate::constants::LANDING_NOISE_THRESHOLD;
use crate::driven::{DrivenConfig, SpinSource};
use crate::error::{ProjectileError, Result};
use crate::forces::ForceModel;
use crate::integrator::{HeadlessIntegrator, IntegratorConfig};
use crate::params::LaunchParams;

/// Landing detection for driven flights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandingConfig {
    pub noise_threshold: f64,  // m
    pub spin_source: SpinSource,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            noise_threshold: LANDING_NOISE_THRESHOLD,
            spin_source: SpinSource::Params,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub seed: u64,
    pub trials: usize,
    pub ranges: ParamRanges,
    pub jitter: Jitter,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            trials: 100,
            ranges: ParamRanges::default(),
            jitter: Jitter::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub launch: LaunchParams,
    pub integrator: IntegratorConfig,
    pub forces: ForceModel,
    pub landing: LandingConfig,
    pub batch: BatchConfig,
}

impl SimConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let integrator = &self.integrator;
        if !(integrator.dt > 0.0 && integrator.dt.is_finite()) {
            return Err(ProjectileError::InvalidConfig(format!(
                "integrator.dt must be > 0 (got {})",
                integrator.dt
            )));
        }
        if !(integrator.sample_interval > 0.0 && integrator.sample_interval.is_finite()) {
            return Err(ProjectileError::InvalidConfig(format!(
                "integrator.sample_interval must be > 0 (got {})",
                integrator.sample_interval
            )));
        }
        if integrator.max_iterations == 0 {
            return Err(ProjectileError::InvalidConfig(
                "integrator.max_iterations must be at least 1".to_string(),
            ));
        }
        if !self.landing.noise_threshold.is_finite() {
            return Err(ProjectileError::InvalidConfig(format!(
                "landing.noise_threshold must be finite (got {})",
                self.landing.noise_threshold
            )));
        }
        self.batch.ranges.validate()
    }

    pub fn headless(&self) -> HeadlessIntegrator {
        HeadlessIntegrator::new(self.integrator, self.forces)
    }

    /// Driven-mode settings sharing this config's timestep and thresholds
    pub fn driven(&self) -> DrivenConfig {
        DrivenConfig {
            initial_height: self.integrator.initial_height,
            ground_threshold: self.integrator.ground_threshold,
            landing_noise_threshold: self.landing.noise_threshold,
            tick_dt: Some(self.integrator.dt),
            sample_interval: self.integrator.sample_interval,
            max_ticks: self.integrator.max_iterations,
            spin_source: self.landing.spin_source,
            ..Default::default()
        }
    }
}
