//! Metropolis Monte Carlo for the 2D q-state Potts model on a periodic square
//! lattice, with a parallel driver over (q, L, T*) grids.

pub mod error;
pub mod lattice;
pub mod metropolis;
pub mod observables;
pub mod error_analysis;
pub mod params;
pub mod job;
pub mod scheduler;
pub mod sink;
pub mod utils;

pub use error::{ConfigError, SimulationError, SinkError, SweepError};
pub use job::{JobKey, ResultRecord, SimulationJob};
pub use lattice::Lattice;
pub use params::{ResolutionMode, SimulationParameters, SweepConfig};
pub use scheduler::{FailedJob, SweepReport, SweepScheduler};
pub use sink::{CsvSummarySink, JsonDirSink, MemorySink, MultiSink, ResultSink};
