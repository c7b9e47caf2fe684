//! Error types of `dintir`.
//!
//! Note that an ill-formed integration domain is not an error: the strategies compute whatever
//! the arithmetic yields for it. Errors are reserved for communication between ranks and for
//! the surrounding plumbing.

use thiserror::Error;

/// Result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while running an integration.
#[derive(Error, Debug)]
pub enum Error {
    /// A world must contain at least one rank.
    #[error("a world needs at least one rank")]
    EmptyWorld,

    /// A message was addressed to a rank that does not exist.
    #[error("rank {rank} does not exist in a world of size {size}")]
    InvalidRank {
        /// The rank that was addressed.
        rank: usize,
        /// The size of the world.
        size: usize,
    },

    /// The peer went away before the exchange completed.
    #[error("rank {0} disconnected")]
    Disconnected(usize),

    /// A message had a different number of values than the protocol prescribes.
    #[error("rank {peer} sent {actual} values where {expected} were expected")]
    MalformedMessage {
        /// The rank that sent the message.
        peer: usize,
        /// The number of values the protocol prescribes.
        expected: usize,
        /// The number of values that arrived.
        actual: usize,
    },

    /// A value could not be converted between `f64` and the numeric type of the integration.
    #[error("numeric conversion failed")]
    Conversion,

    /// The MPI environment could not be set up, for instance because it was initialized before.
    #[error("MPI could not be initialized")]
    MpiInitialization,

    /// A rank panicked while computing its share.
    #[error("worker rank {0} panicked")]
    WorkerPanicked(usize),

    /// The name does not belong to any of the built-in fields.
    #[error("unknown field `{0}`, expected one of: rosenbrock, ricker_wavelet, schwefel")]
    UnknownField(String),

    /// The name does not belong to any integration mode.
    #[error(
        "unknown mode `{0}`, expected one of: SequentialTrapezoid, ParallelTrapezoid, \
         SequentialMonteCarlo, ParallelMonteCarlo"
    )]
    UnknownMode(String),

    /// Reading or writing a file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// (De)serializing a configuration or a report failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
