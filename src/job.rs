//! One (q, L, T*) simulation and the record it produces.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::error_analysis::ErrorEstimates;
use crate::lattice::Lattice;
use crate::observables::ObservableAccumulator;
use crate::params::SimulationParameters;
use crate::utils::rng;

/// Identity of a job: (q, L, T*, steps, burn_in). T* is compared bitwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey {
    pub q: usize,
    pub l: usize,
    t_bits: u64,
    pub steps: usize,
    pub burn_in: usize,
}

impl JobKey {
    pub fn t_star(&self) -> f64 {
        f64::from_bits(self.t_bits)
    }
}

impl From<&SimulationParameters> for JobKey {
    fn from(p: &SimulationParameters) -> Self {
        Self {
            q: p.q,
            l: p.l,
            t_bits: p.t_star.to_bits(),
            steps: p.steps,
            burn_in: p.burn_in,
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "q={} L={} T*={:.4} steps={} burn_in={}",
            self.q,
            self.l,
            self.t_star(),
            self.steps,
            self.burn_in
        )
    }
}

/// Final output of one job. Field names follow the on-disk JSON layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub q: usize,
    #[serde(rename = "L")]
    pub l: usize,
    #[serde(rename = "T_star")]
    pub t_star: f64,
    pub steps: usize,
    pub burn_in: usize,
    pub seed: u64,
    /// Energy per site, ⟨E⟩ / L².
    #[serde(rename = "E_avg")]
    pub e_avg: f64,
    pub m_avg: f64,
    pub c: f64,
    pub chi: f64,
    pub acceptance_rate: f64,
    pub errors: ErrorEstimates,
    /// Raw total energies in bond units, one per production sweep.
    pub energies: Vec<f64>,
    pub magnetizations: Vec<f64>,
}

impl ResultRecord {
    pub fn key(&self) -> JobKey {
        JobKey::from(&SimulationParameters {
            q: self.q,
            l: self.l,
            t_star: self.t_star,
            steps: self.steps,
            burn_in: self.burn_in,
        })
    }
}

/// A self-contained unit of work: parameters plus the seed of its own
/// random stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationJob {
    pub params: SimulationParameters,
    pub seed: u64,
}

impl SimulationJob {
    pub fn new(params: SimulationParameters, seed: u64) -> Self {
        Self { params, seed }
    }

    /// Seed derived from the master seed and the job's parameters only, so it
    /// does not depend on enumeration order or pool size.
    pub fn seeded(params: SimulationParameters, master_seed: u64) -> Self {
        let seed = rng::derive_seed(
            master_seed,
            &[
                params.q as u64,
                params.l as u64,
                params.t_star.to_bits(),
                params.steps as u64,
                params.burn_in as u64,
            ],
        );
        Self { params, seed }
    }

    pub fn key(&self) -> JobKey {
        JobKey::from(&self.params)
    }

    /// Hot start, burn-in, production, reduction.
    pub fn run(&self) -> Result<ResultRecord, SimulationError> {
        self.params.validate()?;
        let p = self.params;

        let mut rng = rng::job_rng(self.seed);
        let mut lattice = Lattice::random_with(&mut rng, p.l, p.q);

        let mut acc = ObservableAccumulator::new(p);
        acc.run(&mut lattice, &mut rng);

        let thermo = acc.reduce()?;
        let errors = acc.error_estimates();
        let acceptance_rate = acc.acceptance_rate();
        let (energies, magnetizations) = acc.into_series();

        Ok(ResultRecord {
            q: p.q,
            l: p.l,
            t_star: p.t_star,
            steps: p.steps,
            burn_in: p.burn_in,
            seed: self.seed,
            e_avg: thermo.e_avg,
            m_avg: thermo.m_avg,
            c: thermo.specific_heat,
            chi: thermo.susceptibility,
            acceptance_rate,
            errors,
            energies,
            magnetizations,
        })
    }
}
