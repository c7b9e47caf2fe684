//! Implementation of different callback functions that report the outcome of a run.
use crate::error::Result;
use crate::fields::Field;
use crate::integrators::Mode;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// The outcome of a single integration.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Outcome<T> {
    /// The strategy that produced the value.
    pub mode: Mode,
    /// The integrated field.
    pub field: Field,
    /// The number of ranks that took part.
    pub workers: usize,
    /// The approximation of the integral.
    pub value: T,
    /// Wall-clock duration of the integration in seconds.
    pub elapsed_seconds: f64,
}

/// Trait for implementing callbacks that are invoked on the root once a run has finished.
pub trait Callback<T> {
    /// This method is called with the outcome of a run and may print or store it.
    fn report(&self, outcome: &Outcome<T>) -> Result<()>;
}

/// A callback function that prints the value and the elapsed time, each on a line of its own.
pub struct SimpleCallback {}

impl SimpleCallback {
    /// Write the two lines to `writer`.
    pub fn write_to<T: Display, W: Write>(writer: &mut W, outcome: &Outcome<T>) -> Result<()> {
        writeln!(writer, "{}", outcome.value)?;
        writeln!(writer, "{}", outcome.elapsed_seconds)?;
        Ok(())
    }
}

impl<T: Display> Callback<T> for SimpleCallback {
    fn report(&self, outcome: &Outcome<T>) -> Result<()> {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        Self::write_to(&mut lock, outcome)?;
        lock.flush()?;
        Ok(())
    }
}

/// A callback function that writes the outcome as JSON into a file.
pub struct FileWriterCallback {
    path: PathBuf,
}

impl FileWriterCallback {
    /// Constructor. The file at `path` is created or truncated on every report.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl<T: Serialize> Callback<T> for FileWriterCallback {
    fn report(&self, outcome: &Outcome<T>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, outcome)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// A sequential and a parallel run of the same problem, side by side.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Comparison<T> {
    /// The run on a single rank.
    pub sequential: Outcome<T>,
    /// The run on all ranks.
    pub parallel: Outcome<T>,
    /// `sequential.elapsed_seconds / parallel.elapsed_seconds`.
    pub speedup: f64,
    /// The speedup per rank of the parallel run.
    pub efficiency: f64,
}

impl<T> Comparison<T> {
    /// Constructor.
    pub fn new(sequential: Outcome<T>, parallel: Outcome<T>) -> Self {
        let speedup = sequential.elapsed_seconds / parallel.elapsed_seconds;
        let efficiency = speedup / parallel.workers as f64;

        Self {
            sequential,
            parallel,
            speedup,
            efficiency,
        }
    }
}
