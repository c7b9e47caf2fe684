//! The integration strategies.
//!
//! Every strategy approximates the integral of an [`Integrand`] over a [`Domain`]. The parallel
//! strategies run on every rank of a world and return the result only on the root;
//! [`Strategy`] selects one of them at run time.
pub mod monte_carlo;
pub mod trapezoid;

pub use self::monte_carlo::{ParallelMonteCarlo, SequentialMonteCarlo, Streams};
pub use self::trapezoid::{ParallelTrapezoid, SequentialTrapezoid};

use crate::comm::Communicator;
use crate::core::{Domain, Integrand};
use crate::error::{Error, Result};

use num_traits::{Float, FromPrimitive};
use rand::distributions::{Distribution, Standard};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Names one of the four integration strategies.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Mode {
    /// See [`SequentialTrapezoid`].
    SequentialTrapezoid,
    /// See [`ParallelTrapezoid`].
    ParallelTrapezoid,
    /// See [`SequentialMonteCarlo`].
    SequentialMonteCarlo,
    /// See [`ParallelMonteCarlo`].
    ParallelMonteCarlo,
}

impl Mode {
    /// All modes.
    pub const ALL: [Self; 4] = [
        Self::SequentialTrapezoid,
        Self::ParallelTrapezoid,
        Self::SequentialMonteCarlo,
        Self::ParallelMonteCarlo,
    ];

    /// Returns the name of the mode.
    pub const fn name(self) -> &'static str {
        match self {
            Self::SequentialTrapezoid => "SequentialTrapezoid",
            Self::ParallelTrapezoid => "ParallelTrapezoid",
            Self::SequentialMonteCarlo => "SequentialMonteCarlo",
            Self::ParallelMonteCarlo => "ParallelMonteCarlo",
        }
    }

    /// Returns `true` if the mode needs a world of ranks.
    pub const fn is_parallel(self) -> bool {
        matches!(self, Self::ParallelTrapezoid | Self::ParallelMonteCarlo)
    }

    /// Returns the mode computing the same quantity on a single rank.
    pub const fn sequential_counterpart(self) -> Self {
        match self {
            Self::SequentialTrapezoid | Self::ParallelTrapezoid => Self::SequentialTrapezoid,
            Self::SequentialMonteCarlo | Self::ParallelMonteCarlo => Self::SequentialMonteCarlo,
        }
    }

    /// Returns the mode computing the same quantity on all ranks of a world.
    pub const fn parallel_counterpart(self) -> Self {
        match self {
            Self::SequentialTrapezoid | Self::ParallelTrapezoid => Self::ParallelTrapezoid,
            Self::SequentialMonteCarlo | Self::ParallelMonteCarlo => Self::ParallelMonteCarlo,
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| Error::UnknownMode(s.to_string()))
    }
}

/// One of the four strategies, ready to integrate.
#[derive(Debug)]
pub enum Strategy<'a, T, C, R> {
    /// Trapezoid rule on a single rank.
    SequentialTrapezoid(SequentialTrapezoid<T>),
    /// Trapezoid rule on the diagonal blocks of all ranks.
    ParallelTrapezoid(ParallelTrapezoid<'a, T, C>),
    /// Monte Carlo integration on a single rank.
    SequentialMonteCarlo(SequentialMonteCarlo<T, R>),
    /// Monte Carlo integration on all ranks.
    ParallelMonteCarlo(ParallelMonteCarlo<'a, T, C, R>),
}

impl<'a, T, C, R> Strategy<'a, T, C, R>
where
    T: Float + FromPrimitive,
    C: Communicator,
    R: Clone + Rng,
    Standard: Distribution<T>,
{
    /// Set up the strategy `mode` for `domain`. The sequential strategies ignore `comm`, the
    /// trapezoid rules ignore `rng`. A parallel Monte Carlo run uses [`Streams::Shared`].
    pub fn new(mode: Mode, domain: Domain<T>, comm: &'a C, rng: R) -> Self {
        Self::with_streams(mode, domain, comm, rng, Streams::Shared)
    }

    /// Like [`Strategy::new`], but with an explicit choice of random number streams for
    /// [`Mode::ParallelMonteCarlo`].
    pub fn with_streams(
        mode: Mode,
        domain: Domain<T>,
        comm: &'a C,
        rng: R,
        streams: Streams,
    ) -> Self {
        match mode {
            Mode::SequentialTrapezoid => {
                Self::SequentialTrapezoid(SequentialTrapezoid::new(domain))
            }
            Mode::ParallelTrapezoid => {
                Self::ParallelTrapezoid(ParallelTrapezoid::new(domain, comm))
            }
            Mode::SequentialMonteCarlo => {
                Self::SequentialMonteCarlo(SequentialMonteCarlo::new(domain, rng))
            }
            Mode::ParallelMonteCarlo => {
                let integrator = ParallelMonteCarlo::with_streams(domain, comm, rng, streams);
                Self::ParallelMonteCarlo(integrator)
            }
        }
    }

    /// Returns the mode of this strategy.
    pub const fn mode(&self) -> Mode {
        match self {
            Self::SequentialTrapezoid(_) => Mode::SequentialTrapezoid,
            Self::ParallelTrapezoid(_) => Mode::ParallelTrapezoid,
            Self::SequentialMonteCarlo(_) => Mode::SequentialMonteCarlo,
            Self::ParallelMonteCarlo(_) => Mode::ParallelMonteCarlo,
        }
    }

    /// Integrate `integrand`. Sequential strategies always return a value; parallel strategies
    /// return it on the root and `None` on every other rank.
    pub fn calculate<I: Integrand<T> + ?Sized>(&mut self, integrand: &I) -> Result<Option<T>> {
        match self {
            Self::SequentialTrapezoid(integrator) => Ok(Some(integrator.calculate(integrand))),
            Self::ParallelTrapezoid(integrator) => integrator.calculate(integrand),
            Self::SequentialMonteCarlo(integrator) => Ok(Some(integrator.calculate(integrand))),
            Self::ParallelMonteCarlo(integrator) => integrator.calculate(integrand),
        }
    }
}
