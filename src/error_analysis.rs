//! Autocorrelation times and jackknife error bars for Monte Carlo series.

use serde::{Deserialize, Serialize};

/// Upper bound on the autocorrelation window, keeps the estimate O(n) for
/// long production runs.
const MAX_LAG: usize = 1_000;

/// Summation stops once the lag reaches this multiple of the running τ.
const WINDOW_FACTOR: f64 = 6.0;

/// |ρ(t)| below this, past lag 10, is treated as noise.
const NOISE_FLOOR: f64 = 0.05;

/// Number of blocks used by the blocked jackknife.
pub const JACKKNIFE_BLOCKS: usize = 20;

/// Error bars attached to a result record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorEstimates {
    /// Integrated autocorrelation time of the energy series, in sweeps.
    pub tau_energy: f64,
    /// Integrated autocorrelation time of the order-parameter series.
    pub tau_order: f64,
    /// Jackknife error on the specific heat.
    pub c_err: f64,
    /// Jackknife error on the susceptibility.
    pub chi_err: f64,
}

/// Mean of a series; 0 for an empty one.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population variance ⟨x²⟩ − ⟨x⟩², evaluated in two passes so it can
/// never come out negative.
pub fn variance(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    data.iter().map(|&x| (x - m).powi(2)).sum::<f64>() / data.len() as f64
}

/// Mean of `dev[k] · dev[k + lag]` over the `len − lag` available pairs.
fn autocovariance(dev: &[f64], lag: usize) -> f64 {
    let pairs = dev.len() - lag;
    dev.iter().zip(&dev[lag..]).map(|(a, b)| a * b).sum::<f64>() / pairs as f64
}

/// τ_int = ½ + Σ_t ρ(t), summed over a self-consistent window (Sokal).
///
/// Series with fewer than 10 samples or no variance give ½, the value of
/// an uncorrelated chain.
pub fn integrated_autocorr_time(data: &[f64]) -> f64 {
    const UNCORRELATED: f64 = 0.5;
    if data.len() < 10 {
        return UNCORRELATED;
    }

    let m = mean(data);
    let dev: Vec<f64> = data.iter().map(|&x| x - m).collect();
    let c0 = autocovariance(&dev, 0);
    if c0 == 0.0 {
        return UNCORRELATED;
    }

    let max_lag = (dev.len() / 4).min(MAX_LAG);
    let mut tau = UNCORRELATED;
    for lag in 1..max_lag {
        let rho = autocovariance(&dev, lag) / c0;
        tau += rho;
        if lag as f64 >= WINDOW_FACTOR * tau || (lag > 10 && rho.abs() < NOISE_FLOOR) {
            break;
        }
    }
    tau.max(UNCORRELATED)
}

/// Blocked jackknife error of an estimator that depends on the series only
/// through its first two moments ⟨x⟩ and ⟨x²⟩.
///
/// The series is cut into `n_blocks` contiguous blocks; each jackknife
/// sample leaves one block out. Returns 0 when there are fewer samples
/// than two blocks' worth.
pub fn jackknife_error<F>(data: &[f64], n_blocks: usize, estimator: F) -> f64
where
    F: Fn(f64, f64) -> f64,
{
    let n = data.len();
    let n_blocks = n_blocks.min(n);
    if n_blocks < 2 {
        return 0.0;
    }
    let block_len = n / n_blocks;
    let used = block_len * n_blocks;

    let mut block_sum = vec![0.0; n_blocks];
    let mut block_sq = vec![0.0; n_blocks];
    for (k, &x) in data[..used].iter().enumerate() {
        let b = k / block_len;
        block_sum[b] += x;
        block_sq[b] += x * x;
    }
    let total_sum: f64 = block_sum.iter().sum();
    let total_sq: f64 = block_sq.iter().sum();
    let rest = (used - block_len) as f64;

    let estimates: Vec<f64> = (0..n_blocks)
        .map(|b| {
            let m1 = (total_sum - block_sum[b]) / rest;
            let m2 = (total_sq - block_sq[b]) / rest;
            estimator(m1, m2)
        })
        .collect();

    let nb = n_blocks as f64;
    let jack_mean = estimates.iter().sum::<f64>() / nb;
    let jack_var = estimates.iter().map(|&e| (e - jack_mean).powi(2)).sum::<f64>() * (nb - 1.0) / nb;
    jack_var.sqrt()
}
