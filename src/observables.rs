// observables.rs - Burn-in / production sampling and thermodynamic reduction

use rand::Rng;

use crate::error::SimulationError;
use crate::error_analysis::{self, ErrorEstimates, JACKKNIFE_BLOCKS};
use crate::lattice::Lattice;
use crate::metropolis::{self, SweepStats};
use crate::params::SimulationParameters;

/// One production-sweep snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservableSample {
    /// Total bond energy (not normalised by L²).
    pub energy: f64,
    /// Potts order parameter in [0, 1].
    pub order_parameter: f64,
}

impl ObservableSample {
    pub fn measure(lattice: &Lattice) -> Self {
        Self {
            energy: metropolis::total_energy(lattice) as f64,
            order_parameter: metropolis::order_parameter(lattice),
        }
    }
}

/// Averaged thermodynamic quantities of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thermodynamics {
    /// ⟨E⟩ / L², energy per site.
    pub e_avg: f64,
    pub m_avg: f64,
    /// (⟨E²⟩ − ⟨E⟩²) / (L² T*²)
    pub specific_heat: f64,
    /// L² (⟨m²⟩ − ⟨m⟩²) / T*
    pub susceptibility: f64,
}

/// Phase of the accumulator. Burn-in always precedes production.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    BurnIn,
    Production,
}

/// Drives burn-in and production sweeps and keeps the production time series.
#[derive(Debug, Clone)]
pub struct ObservableAccumulator {
    params: SimulationParameters,
    step: usize,
    energies: Vec<f64>,
    magnetizations: Vec<f64>,
    production: SweepStats,
}

impl ObservableAccumulator {
    pub fn new(params: SimulationParameters) -> Self {
        let capacity = params.production_steps();
        Self {
            params,
            step: 0,
            energies: Vec::with_capacity(capacity),
            magnetizations: Vec::with_capacity(capacity),
            production: SweepStats::default(),
        }
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn phase(&self) -> Phase {
        if self.step < self.params.burn_in {
            Phase::BurnIn
        } else {
            Phase::Production
        }
    }

    /// Sweeps performed so far.
    pub fn steps_done(&self) -> usize {
        self.step
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.params.steps
    }

    /// Perform one sweep; in the production phase record a sample afterwards.
    pub fn advance(&mut self, lattice: &mut Lattice, rng: &mut impl Rng) -> SweepStats {
        let phase = self.phase();
        let stats = metropolis::sweep(lattice, self.params.t_star, rng);
        if phase == Phase::Production {
            let sample = ObservableSample::measure(lattice);
            self.energies.push(sample.energy);
            self.magnetizations.push(sample.order_parameter);
            self.production.attempted += stats.attempted;
            self.production.accepted += stats.accepted;
            self.production.delta_energy += stats.delta_energy;
        }
        self.step += 1;
        stats
    }

    /// Run all remaining sweeps: `burn_in` discarded, then `steps − burn_in`
    /// recorded.
    pub fn run(&mut self, lattice: &mut Lattice, rng: &mut impl Rng) {
        while !self.is_finished() {
            self.advance(lattice, rng);
        }
        tracing::trace!(
            q = self.params.q,
            l = self.params.l,
            t_star = self.params.t_star,
            acceptance = self.production.acceptance_rate(),
            "production finished"
        );
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn magnetizations(&self) -> &[f64] {
        &self.magnetizations
    }

    /// Acceptance rate over production sweeps.
    pub fn acceptance_rate(&self) -> f64 {
        self.production.acceptance_rate()
    }

    /// Reduce the recorded series to averaged quantities.
    ///
    /// Fails with `NumericDegeneracy` when no production sample exists or a
    /// reduced value is not finite.
    pub fn reduce(&self) -> Result<Thermodynamics, SimulationError> {
        if self.energies.is_empty() {
            return Err(SimulationError::degeneracy(format!(
                "no production samples (steps = {}, burn_in = {})",
                self.params.steps, self.params.burn_in
            )));
        }
        let n_sites = (self.params.l * self.params.l) as f64;
        let t = self.params.t_star;

        let e_mean = error_analysis::mean(&self.energies);
        let m_avg = error_analysis::mean(&self.magnetizations);
        let thermo = Thermodynamics {
            e_avg: e_mean / n_sites,
            m_avg,
            specific_heat: error_analysis::variance(&self.energies) / (n_sites * t * t),
            susceptibility: n_sites * error_analysis::variance(&self.magnetizations) / t,
        };

        let values = [
            ("E_avg", thermo.e_avg),
            ("m_avg", thermo.m_avg),
            ("c", thermo.specific_heat),
            ("chi", thermo.susceptibility),
        ];
        if let Some((name, v)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SimulationError::degeneracy(format!("{name} is not finite ({v})")));
        }
        Ok(thermo)
    }

    /// Autocorrelation times and jackknife error bars for c and χ.
    pub fn error_estimates(&self) -> ErrorEstimates {
        let n_sites = (self.params.l * self.params.l) as f64;
        let t = self.params.t_star;
        ErrorEstimates {
            tau_energy: error_analysis::integrated_autocorr_time(&self.energies),
            tau_order: error_analysis::integrated_autocorr_time(&self.magnetizations),
            c_err: error_analysis::jackknife_error(&self.energies, JACKKNIFE_BLOCKS, |m1, m2| {
                (m2 - m1 * m1) / (n_sites * t * t)
            }),
            chi_err: error_analysis::jackknife_error(
                &self.magnetizations,
                JACKKNIFE_BLOCKS,
                |m1, m2| n_sites * (m2 - m1 * m1) / t,
            ),
        }
    }

    /// Hand over the raw series.
    pub fn into_series(self) -> (Vec<f64>, Vec<f64>) {
        (self.energies, self.magnetizations)
    }
}
