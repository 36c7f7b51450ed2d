//! Error type for the I/O facing parts of the engine.
//!
//! Simulation itself never fails: bad input produces a zeroed result and
//! malformed import rows are skipped. Only file access, CSV/JSON encoding
//! and configuration parsing surface as [`ProjectileError`].

use thiserror::Error;

/// Errors raised while loading, saving or configuring simulations.
#[derive(Debug, Error)]
pub enum ProjectileError {
    /// Underlying file or stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader or writer failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Trajectory blob could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be parsed.
    #[error("could not parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration could not be serialized.
    #[error("could not write configuration: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Configuration parsed but holds unusable values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Launch parameters outside their physical domain.
    #[error("invalid launch parameters: {}", .0.join("; "))]
    InvalidParams(Vec<String>),

    /// A sampling range with `min > max` or a non-finite width.
    #[error("invalid range for {name}: [{min}, {max}]")]
    InvalidRange {
        /// Parameter the range applies to.
        name: &'static str,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// A normal distribution with a negative or non-finite spread, or a
    /// non-finite mean.
    #[error("invalid spread for {name}: std dev {std_dev}")]
    InvalidSpread {
        /// Parameter the spread applies to.
        name: &'static str,
        /// Offending standard deviation.
        std_dev: f64,
    },

    /// Unrecognised trial field name.
    #[error("unknown trial field: {0}")]
    UnknownField(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ProjectileError>;
