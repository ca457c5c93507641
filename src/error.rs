//! Error taxonomy for the simulation engine, scheduler and result sinks.

use std::path::PathBuf;
use thiserror::Error;

use crate::lattice::MAX_Q;

/// Invalid run parameters. Detected before any job starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("q must be in 2..={max}, got {0}", max = MAX_Q)]
    InvalidQ(usize),

    #[error("L must be at least 1, got {0}")]
    InvalidL(usize),

    #[error("T* must be positive and finite, got {0}")]
    InvalidTemperature(f64),

    #[error("burn_in ({burn_in}) must be smaller than steps ({steps})")]
    BurnInNotBelowSteps { steps: usize, burn_in: usize },

    #[error("worker pool size must be at least 1, got {0}")]
    InvalidPoolSize(usize),

    #[error("no {0} values given")]
    EmptyAxis(&'static str),

    #[error("failed to parse config '{path}': {message}", path = path.display())]
    Parse { path: PathBuf, message: String },
}

/// Failures inside a single job.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Zero production samples or a non-finite reduction. A contract
    /// violation, never silently turned into NaN.
    #[error("numeric degeneracy: {reason}")]
    NumericDegeneracy { reason: String },
}

impl SimulationError {
    pub fn degeneracy(reason: impl Into<String>) -> Self {
        Self::NumericDegeneracy { reason: reason.into() }
    }
}

/// Failures while persisting a result record.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error on '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SinkError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Fatal, sweep-level failures. Per-job failures are reported in
/// `SweepReport::failed` instead.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}
