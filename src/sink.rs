//! Destinations for completed result records.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::SinkError;
use crate::job::ResultRecord;

/// Receives each record as its job completes, in completion order.
pub trait ResultSink {
    fn accept(&mut self, record: ResultRecord) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<ResultRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_records(self) -> Vec<ResultRecord> {
        self.records
    }
}

impl ResultSink for MemorySink {
    fn accept(&mut self, record: ResultRecord) -> Result<(), SinkError> {
        self.records.push(record);
        Ok(())
    }
}

/// One JSON file per record, named after its identifying key.
#[derive(Debug)]
pub struct JsonDirSink {
    dir: PathBuf,
}

impl JsonDirSink {
    /// Creates `dir` (and parents) if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| SinkError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `q{q}_L{L}_T{T:.4}_steps{steps}_burn{burn_in}.json`
    pub fn file_name(record: &ResultRecord) -> String {
        format!(
            "q{}_L{}_T{:.4}_steps{}_burn{}.json",
            record.q, record.l, record.t_star, record.steps, record.burn_in
        )
    }

    pub fn path_for(&self, record: &ResultRecord) -> PathBuf {
        self.dir.join(Self::file_name(record))
    }
}

impl ResultSink for JsonDirSink {
    fn accept(&mut self, record: ResultRecord) -> Result<(), SinkError> {
        let path = self.path_for(&record);
        let file = File::create(&path).map_err(|e| SinkError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &record)?;
        writer.flush().map_err(|e| SinkError::io(&path, e))?;
        Ok(())
    }
}

/// Row of the CSV summary, one per record.
#[derive(Debug, Serialize)]
struct SummaryRow {
    q: usize,
    #[serde(rename = "L")]
    l: usize,
    #[serde(rename = "T_star")]
    t_star: f64,
    steps: usize,
    burn_in: usize,
    #[serde(rename = "E_avg")]
    e_avg: f64,
    m_avg: f64,
    c: f64,
    c_err: f64,
    chi: f64,
    chi_err: f64,
    tau_energy: f64,
    tau_order: f64,
    acceptance_rate: f64,
}

impl From<&ResultRecord> for SummaryRow {
    fn from(r: &ResultRecord) -> Self {
        Self {
            q: r.q,
            l: r.l,
            t_star: r.t_star,
            steps: r.steps,
            burn_in: r.burn_in,
            e_avg: r.e_avg,
            m_avg: r.m_avg,
            c: r.c,
            c_err: r.errors.c_err,
            chi: r.chi,
            chi_err: r.errors.chi_err,
            tau_energy: r.errors.tau_energy,
            tau_order: r.errors.tau_order,
            acceptance_rate: r.acceptance_rate,
        }
    }
}

/// Scalar observables of every record in a single CSV file (no raw series).
pub struct CsvSummarySink {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvSummarySink {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SinkError::io(parent, e))?;
        }
        let writer = csv::WriterBuilder::new().from_path(&path)?;
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for CsvSummarySink {
    fn accept(&mut self, record: ResultRecord) -> Result<(), SinkError> {
        self.writer.serialize(SummaryRow::from(&record))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush().map_err(|e| SinkError::io(&self.path, e))
    }
}

/// Forwards every record to each inner sink in turn.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn ResultSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl ResultSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl ResultSink for MultiSink {
    fn accept(&mut self, record: ResultRecord) -> Result<(), SinkError> {
        if let Some((last, rest)) = self.sinks.split_last_mut() {
            for sink in rest {
                sink.accept(record.clone())?;
            }
            last.accept(record)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}
