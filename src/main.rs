//! Parallel Metropolis scan of the 2D q-state Potts model over (q, L, T*).
//!
//! Writes one JSON record per parameter combination (and optionally a CSV
//! summary) for the offline peak-finding and finite-size-scaling analysis.
//
//  Coarse scan:      `cargo run --release -- -v`
//  High-res window:  `cargo run --release -- --highres --window-center 1.13 -v`

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use potts::params::{linspace, temperature_window};
use potts::{
    CsvSummarySink, JsonDirSink, MultiSink, ResolutionMode, SweepConfig, SweepError,
    SweepReport, SweepScheduler,
};

#[derive(Parser, Debug)]
#[command(name = "potts-scan", about = "Metropolis scan of the 2D q-state Potts model")]
struct Cli {
    /// TOML run configuration; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// q values, comma separated
    #[arg(long, value_delimiter = ',')]
    q: Vec<usize>,

    /// Lattice sizes L, comma separated
    #[arg(long = "l", value_delimiter = ',')]
    l: Vec<usize>,

    #[arg(long)]
    t_min: Option<f64>,

    #[arg(long)]
    t_max: Option<f64>,

    #[arg(long)]
    t_points: Option<usize>,

    /// Centre of a zoom-in window, e.g. a previously fitted T_c(∞)
    #[arg(long)]
    window_center: Option<f64>,

    #[arg(long, default_value = "0.05")]
    window_delta: f64,

    #[arg(long, default_value = "60")]
    window_points: usize,

    /// Monte Carlo sweeps per job
    #[arg(long)]
    steps: Option<usize>,

    /// Discarded equilibration sweeps
    #[arg(long)]
    burn_in: Option<usize>,

    /// High-resolution mode (longer runs, separate output directory)
    #[arg(long)]
    highres: bool,

    /// Worker pool size
    #[arg(long, short)]
    workers: Option<usize>,

    /// Master seed; per-job seeds are derived from it
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for per-job JSON records
    #[arg(long)]
    out: Option<PathBuf>,

    /// Optional CSV summary file
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence logging and the progress bar
    #[arg(long, short)]
    quiet: bool,
}

fn build_config(cli: &Cli) -> Result<SweepConfig, SweepError> {
    let mode = if cli.highres { ResolutionMode::HighRes } else { ResolutionMode::Coarse };
    let mut cfg = match &cli.config {
        Some(path) => SweepConfig::from_toml_path_for_mode(path, cli.highres.then_some(mode))?,
        None => SweepConfig::for_mode(mode),
    };

    if !cli.q.is_empty() {
        cfg.q_values = cli.q.clone();
    }
    if !cli.l.is_empty() {
        cfg.l_values = cli.l.clone();
    }
    if let Some(center) = cli.window_center {
        cfg.t_values = temperature_window(center, cli.window_delta, cli.window_points);
    } else if cli.t_min.is_some() || cli.t_max.is_some() || cli.t_points.is_some() {
        cfg.t_values = linspace(
            cli.t_min.unwrap_or(0.5),
            cli.t_max.unwrap_or(1.5),
            cli.t_points.unwrap_or(45),
        );
    }
    if let Some(steps) = cli.steps {
        cfg.steps = steps;
    }
    if let Some(burn_in) = cli.burn_in {
        cfg.burn_in = burn_in;
    }
    if let Some(workers) = cli.workers {
        cfg.pool_size = workers;
    }
    if let Some(seed) = cli.seed {
        cfg.master_seed = seed;
    }
    if let Some(out) = &cli.out {
        cfg.output_dir = out.clone();
    }

    cfg.validate()?;
    Ok(cfg)
}

fn run(cli: &Cli) -> Result<SweepReport, SweepError> {
    let cfg = build_config(cli)?;
    info!(
        mode = ?cfg.mode,
        jobs = cfg.n_jobs(),
        workers = cfg.pool_size,
        out = %cfg.output_dir.display(),
        "configuration ready"
    );

    let mut sink = MultiSink::new().with(JsonDirSink::create(&cfg.output_dir)?);
    if let Some(path) = &cli.summary {
        sink = sink.with(CsvSummarySink::create(path)?);
    }

    let scheduler = SweepScheduler::new(cfg.pool_size)?.with_progress(!cli.quiet);
    scheduler.run(&cfg, &mut sink)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::setup_logging(cli.verbose, cli.quiet) {
        eprintln!("failed to initialise logging: {e}");
    }

    match run(&cli) {
        Ok(report) if report.is_complete() => {
            info!(jobs = report.n_jobs(), elapsed = ?report.elapsed, "scan complete");
            ExitCode::SUCCESS
        }
        Ok(report) => {
            for failed in &report.failed {
                warn!(key = %failed.key, message = %failed.message, "missing result");
            }
            error!(
                failed = report.failed.len(),
                completed = report.completed.len(),
                "scan finished with failed jobs"
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e}");
            if cli.quiet {
                eprintln!("error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn grid_only_toml() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "q_values = [3]\nl_values = [6, 10]").unwrap();
        file
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("potts-scan").chain(args.iter().copied()))
    }

    #[test]
    fn highres_flag_fills_unset_config_keys_with_highres_defaults() {
        let file = grid_only_toml();
        let path = file.path().to_str().unwrap();
        let cfg = build_config(&parse(&["--highres", "--config", path])).unwrap();

        assert_eq!(cfg.mode, ResolutionMode::HighRes);
        assert_eq!((cfg.steps, cfg.burn_in), (30_000, 5_000));
        assert_eq!(cfg.output_dir, PathBuf::from("results_highres"));
        assert_eq!(cfg.q_values, vec![3]);
        assert_eq!(cfg.l_values, vec![6, 10]);
    }

    #[test]
    fn config_without_highres_keeps_coarse_defaults() {
        let file = grid_only_toml();
        let path = file.path().to_str().unwrap();
        let cfg = build_config(&parse(&["--config", path])).unwrap();

        assert_eq!(cfg.mode, ResolutionMode::Coarse);
        assert_eq!((cfg.steps, cfg.burn_in), (10_000, 2_000));
        assert_eq!(cfg.output_dir, PathBuf::from("results"));
    }

    #[test]
    fn flags_override_file_and_mode_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "q_values = [2]\nsteps = 800\nburn_in = 100\nmode = \"coarse\"").unwrap();
        let path = file.path().to_str().unwrap();
        let cli = parse(&["--highres", "--config", path, "--burn-in", "50", "--out", "zoom"]);
        let cfg = build_config(&cli).unwrap();

        assert_eq!(cfg.mode, ResolutionMode::HighRes);
        assert_eq!(cfg.steps, 800);
        assert_eq!(cfg.burn_in, 50);
        assert_eq!(cfg.output_dir, PathBuf::from("zoom"));
    }

    #[test]
    fn window_center_replaces_the_temperature_axis() {
        let cfg = build_config(&parse(&["--highres", "--window-center", "1.13"])).unwrap();
        assert_eq!(cfg.t_values.len(), 60);
        assert_eq!(cfg.steps, 30_000);
    }
}
