//! Run parameters: the per-job tuple and the sweep-wide run configuration
//! (single source of truth, passed explicitly to scheduler and sinks).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::lattice::MAX_Q;

/// Immutable (q, L, T*, steps, burn_in) tuple for one job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub q: usize,
    pub l: usize,
    pub t_star: f64,
    pub steps: usize,
    pub burn_in: usize,
}

impl SimulationParameters {
    /// Validated constructor.
    pub fn new(
        q: usize,
        l: usize,
        t_star: f64,
        steps: usize,
        burn_in: usize,
    ) -> Result<Self, ConfigError> {
        let p = Self { q, l, t_star, steps, burn_in };
        p.validate()?;
        Ok(p)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_q(self.q)?;
        validate_l(self.l)?;
        validate_temperature(self.t_star)?;
        validate_steps(self.steps, self.burn_in)
    }

    /// Number of retained production sweeps.
    pub fn production_steps(&self) -> usize {
        self.steps.saturating_sub(self.burn_in)
    }
}

fn validate_q(q: usize) -> Result<(), ConfigError> {
    if (2..=MAX_Q).contains(&q) { Ok(()) } else { Err(ConfigError::InvalidQ(q)) }
}

fn validate_l(l: usize) -> Result<(), ConfigError> {
    if l >= 1 { Ok(()) } else { Err(ConfigError::InvalidL(l)) }
}

fn validate_temperature(t: f64) -> Result<(), ConfigError> {
    if t.is_finite() && t > 0.0 { Ok(()) } else { Err(ConfigError::InvalidTemperature(t)) }
}

fn validate_steps(steps: usize, burn_in: usize) -> Result<(), ConfigError> {
    if burn_in < steps {
        Ok(())
    } else {
        Err(ConfigError::BurnInNotBelowSteps { steps, burn_in })
    }
}

/// Coarse survey vs. high-resolution re-run. Selects default run lengths
/// and output location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    #[default]
    Coarse,
    HighRes,
}

impl ResolutionMode {
    pub fn default_steps(self) -> usize {
        match self {
            Self::Coarse => 10_000,
            Self::HighRes => 30_000,
        }
    }

    pub fn default_burn_in(self) -> usize {
        match self {
            Self::Coarse => 2_000,
            Self::HighRes => 5_000,
        }
    }

    pub fn default_output_dir(self) -> PathBuf {
        match self {
            Self::Coarse => PathBuf::from("results"),
            Self::HighRes => PathBuf::from("results_highres"),
        }
    }

}

/// Run‑time configuration for a whole (q, L, T*) sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub q_values: Vec<usize>,
    pub l_values: Vec<usize>,
    pub t_values: Vec<f64>,
    pub steps: usize,
    pub burn_in: usize,
    pub pool_size: usize,
    pub master_seed: u64,
    pub mode: ResolutionMode,
    pub output_dir: PathBuf,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self::for_mode(ResolutionMode::Coarse)
    }
}

impl SweepConfig {
    /// Default grid: q ∈ {2,3,4}, L ∈ {5,…,20}, 45 temperatures in [0.5, 1.5].
    pub fn for_mode(mode: ResolutionMode) -> Self {
        Self {
            q_values: vec![2, 3, 4],
            l_values: vec![5, 8, 11, 14, 17, 20],
            t_values: linspace(0.5, 1.5, 45),
            steps: mode.default_steps(),
            burn_in: mode.default_burn_in(),
            pool_size: 8,
            master_seed: 0x00C0_FFEE,
            mode,
            output_dir: mode.default_output_dir(),
        }
    }

    /// Load from a TOML file; missing keys take the defaults of the file's
    /// own `mode` (coarse when absent).
    pub fn from_toml_path(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_path_for_mode(path, None)
    }

    /// Load from a TOML file whose missing keys are filled from
    /// `for_mode(mode)`. `Some(mode)` also overrides the file's `mode` key.
    pub fn from_toml_path_for_mode(
        path: &Path,
        mode: Option<ResolutionMode>,
    ) -> Result<Self, ConfigError> {
        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };
        let text = fs::read_to_string(path).map_err(|e| parse_error(e.to_string()))?;
        let file = text
            .parse::<toml::Table>()
            .map_err(|e| parse_error(e.to_string()))?;

        let mode = match (mode, file.get("mode")) {
            (Some(mode), _) => mode,
            (None, Some(value)) => value
                .clone()
                .try_into::<ResolutionMode>()
                .map_err(|e| parse_error(e.to_string()))?,
            (None, None) => ResolutionMode::default(),
        };

        let mut merged = match toml::Value::try_from(Self::for_mode(mode)) {
            Ok(toml::Value::Table(table)) => table,
            Ok(_) => return Err(parse_error("defaults are not a table".to_string())),
            Err(e) => return Err(parse_error(e.to_string())),
        };
        merged.extend(file);

        let mut cfg = toml::Value::Table(merged)
            .try_into::<Self>()
            .map_err(|e| parse_error(e.to_string()))?;
        cfg.mode = mode;
        Ok(cfg)
    }

    /// Fails on the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.q_values.is_empty() {
            return Err(ConfigError::EmptyAxis("q"));
        }
        if self.l_values.is_empty() {
            return Err(ConfigError::EmptyAxis("L"));
        }
        if self.t_values.is_empty() {
            return Err(ConfigError::EmptyAxis("T*"));
        }
        for &q in &self.q_values {
            validate_q(q)?;
        }
        for &l in &self.l_values {
            validate_l(l)?;
        }
        for &t in &self.t_values {
            validate_temperature(t)?;
        }
        validate_steps(self.steps, self.burn_in)?;
        if self.pool_size < 1 {
            return Err(ConfigError::InvalidPoolSize(self.pool_size));
        }
        Ok(())
    }

    /// Total number of jobs, |q|·|L|·|T|.
    pub fn n_jobs(&self) -> usize {
        self.q_values.len() * self.l_values.len() * self.t_values.len()
    }
}

/// `n` evenly spaced points from `start` to `stop`, both inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|k| start + step * k as f64).collect();
            out[n - 1] = stop;
            out
        }
    }
}

/// Zoom-in grid `linspace(center − delta, center + delta, n)` around a
/// previously estimated critical temperature.
pub fn temperature_window(center: f64, delta: f64, n: usize) -> Vec<f64> {
    linspace(center - delta, center + delta, n)
}
