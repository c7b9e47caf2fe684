//! Run configuration, loaded from JSON and overridable from the command line.
use crate::core::Domain;
use crate::error::Result;
use crate::fields::Field;
use crate::integrators::Mode;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Everything needed to start a run. Missing keys in a configuration file take their
/// [`Default`] values.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// The field to integrate.
    pub function: Field,
    /// Integration domain and resolution.
    pub domain: Domain<f64>,
    /// The strategy.
    pub mode: Mode,
    /// Number of ranks of an in-process world.
    pub workers: usize,
    /// Seed of the random number generator; without one every rank draws from entropy.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            function: Field::Rosenbrock,
            domain: Domain::new(-2.0, 2.0, -1.0, 3.0, 100),
            mode: Mode::SequentialTrapezoid,
            workers: 1,
            seed: None,
        }
    }
}

impl RunConfig {
    /// Read a configuration from the JSON file at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
