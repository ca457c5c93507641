//! Parallel (q, L, T*) sweep over a bounded rayon pool.
//!
//! Every job owns its lattice and RNG; the only shared structures are the
//! pool and the completion channel. Results reach the sink on the calling
//! thread in completion order.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, SimulationError, SinkError, SweepError};
use crate::job::{JobKey, ResultRecord, SimulationJob};
use crate::params::{SimulationParameters, SweepConfig};
use crate::sink::ResultSink;

/// A job whose worker panicked or returned an error.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedJob {
    pub key: JobKey,
    pub message: String,
}

/// Outcome of a whole sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Keys of persisted records, in completion order.
    pub completed: Vec<JobKey>,
    pub failed: Vec<FailedJob>,
    pub elapsed: Duration,
}

impl SweepReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn n_jobs(&self) -> usize {
        self.completed.len() + self.failed.len()
    }
}

/// Cartesian product q × L × T* with fixed steps / burn-in, one seeded job
/// per combination.
pub fn enumerate_jobs(config: &SweepConfig) -> Vec<SimulationJob> {
    let mut jobs = Vec::with_capacity(config.n_jobs());
    for &q in &config.q_values {
        for &l in &config.l_values {
            for &t_star in &config.t_values {
                let params = SimulationParameters {
                    q,
                    l,
                    t_star,
                    steps: config.steps,
                    burn_in: config.burn_in,
                };
                jobs.push(SimulationJob::seeded(params, config.master_seed));
            }
        }
    }
    jobs
}

type JobOutcome = (JobKey, Result<ResultRecord, String>);

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("worker panicked: {s}")
    } else {
        "worker panicked".to_string()
    }
}

/// Run one job, turning both errors and panics into a message.
fn run_guarded<F>(job: &SimulationJob, runner: &F) -> Result<ResultRecord, String>
where
    F: Fn(&SimulationJob) -> Result<ResultRecord, SimulationError>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| runner(job))) {
        Ok(Ok(record)) => Ok(record),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

/// Fixed-size worker pool that runs independent simulation jobs.
pub struct SweepScheduler {
    pool: rayon::ThreadPool,
    pool_size: usize,
    show_progress: bool,
}

impl SweepScheduler {
    pub fn new(pool_size: usize) -> Result<Self, SweepError> {
        if pool_size < 1 {
            return Err(ConfigError::InvalidPoolSize(pool_size).into());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(pool_size)
            .thread_name(|i| format!("potts-worker-{i}"))
            .build()?;
        Ok(Self { pool, pool_size, show_progress: false })
    }

    /// Show an indicatif bar counting finished jobs.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Validate, enumerate and run the full sweep described by `config`.
    pub fn run(
        &self,
        config: &SweepConfig,
        sink: &mut dyn ResultSink,
    ) -> Result<SweepReport, SweepError> {
        config.validate()?;
        info!(
            q = ?config.q_values,
            l = ?config.l_values,
            n_t = config.t_values.len(),
            steps = config.steps,
            burn_in = config.burn_in,
            mode = ?config.mode,
            "starting sweep"
        );
        self.run_jobs(enumerate_jobs(config), sink)
    }

    /// Run an explicit job list. Every job is drained before returning.
    ///
    /// A failing job is reported in `SweepReport::failed`; a sink error is
    /// fatal, stops jobs that have not yet started and is returned once the
    /// running ones have finished.
    pub fn run_jobs(
        &self,
        jobs: Vec<SimulationJob>,
        sink: &mut dyn ResultSink,
    ) -> Result<SweepReport, SweepError> {
        self.run_with(jobs, sink, SimulationJob::run)
    }

    fn run_with<F>(
        &self,
        jobs: Vec<SimulationJob>,
        sink: &mut dyn ResultSink,
        runner: F,
    ) -> Result<SweepReport, SweepError>
    where
        F: Fn(&SimulationJob) -> Result<ResultRecord, SimulationError> + Sync,
    {
        for job in &jobs {
            job.params.validate()?;
        }

        let start = Instant::now();
        let bar = self.progress_bar(jobs.len());
        let abort = AtomicBool::new(false);
        let (tx, rx) = mpsc::channel::<JobOutcome>();

        let mut report = SweepReport::default();
        let mut sink_error: Option<SinkError> = None;

        self.pool.in_place_scope(|scope| {
            for job in jobs {
                let tx = tx.clone();
                let abort = &abort;
                let runner = &runner;
                scope.spawn(move |_| {
                    if abort.load(Ordering::Relaxed) {
                        return;
                    }
                    let outcome = run_guarded(&job, runner);
                    // The receiver outlives the scope.
                    let _ = tx.send((job.key(), outcome));
                });
            }
            drop(tx);

            for (key, outcome) in rx.iter() {
                bar.inc(1);
                if sink_error.is_some() {
                    continue;
                }
                match outcome {
                    Ok(record) => {
                        debug!(%key, c = record.c, chi = record.chi, "job finished");
                        match sink.accept(record) {
                            Ok(()) => report.completed.push(key),
                            Err(e) => {
                                abort.store(true, Ordering::Relaxed);
                                sink_error = Some(e);
                            }
                        }
                    }
                    Err(message) => {
                        warn!(%key, %message, "job failed");
                        report.failed.push(FailedJob { key, message });
                    }
                }
            }
        });
        bar.finish();

        if let Some(e) = sink_error {
            return Err(e.into());
        }
        sink.flush()?;

        report.elapsed = start.elapsed();
        info!(
            completed = report.completed.len(),
            failed = report.failed.len(),
            elapsed = ?report.elapsed,
            "sweep finished"
        );
        Ok(report)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::with_template(" {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}] eta {eta}")
        {
            bar.set_style(style);
        }
        bar
    }
}
