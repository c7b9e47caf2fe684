//! Worker contexts: the identity of a rank within a fixed-size world and the means to exchange
//! values with the other ranks.
//!
//! A world is created once, before any integration starts, and never changes its size. Every
//! rank runs the same program and blocks in [`Communicator::receive`] and
//! [`Communicator::reduce_sum`] until its peers have delivered; there are no timeouts.

pub mod channel;
#[cfg(feature = "mpi")]
pub mod mpi;

pub use self::channel::{run_spmd, ChannelCommunicator};

use crate::core::ROOT;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Labels the purpose of a point-to-point message.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Tag {
    /// The root tells a worker which part of the problem to compute.
    Parameters,
    /// A worker sends its partial result back to the root.
    Result,
    /// A contribution to a collective sum.
    Reduce,
}

impl Tag {
    /// Returns the numeric tag used on the wire.
    pub const fn code(self) -> i32 {
        match self {
            Self::Parameters => 1,
            Self::Result => 2,
            Self::Reduce => 3,
        }
    }
}

/// Identity of a rank plus point-to-point and collective messaging.
pub trait Communicator {
    /// Returns the zero-based rank of this participant.
    fn rank(&self) -> usize;

    /// Returns the number of participants in the world.
    fn size(&self) -> usize;

    /// Returns `true` on the rank that collects final results.
    fn is_root(&self) -> bool {
        self.rank() == ROOT
    }

    /// Sends `payload` to `dest`, labelled with `tag`.
    fn send(&self, dest: usize, tag: Tag, payload: &[f64]) -> Result<()>;

    /// Blocks until a message with `tag` from `source` arrives and returns its payload.
    fn receive(&self, source: usize, tag: Tag) -> Result<Vec<f64>>;

    /// Sums `local` element-wise over all ranks. Every rank must call this; the root gets the
    /// total, all other ranks get `None`.
    ///
    /// The default implementation collects the contributions at the root in rank order, which
    /// makes the sum independent of the order in which the ranks finish.
    fn reduce_sum(&self, local: &[f64]) -> Result<Option<Vec<f64>>> {
        if !self.is_root() {
            self.send(ROOT, Tag::Reduce, local)?;
            return Ok(None);
        }

        let mut total = local.to_vec();

        for source in 1..self.size() {
            let contribution = self.receive(source, Tag::Reduce)?;

            if contribution.len() != total.len() {
                return Err(Error::MalformedMessage {
                    peer: source,
                    expected: total.len(),
                    actual: contribution.len(),
                });
            }

            total
                .iter_mut()
                .zip(contribution)
                .for_each(|(acc, value)| *acc += value);
        }

        Ok(Some(total))
    }
}

/// A world consisting of a single rank. Every message would have to be addressed to itself,
/// which this context does not support.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> usize {
        ROOT
    }

    fn size(&self) -> usize {
        1
    }

    fn send(&self, dest: usize, _: Tag, _: &[f64]) -> Result<()> {
        Err(Error::InvalidRank {
            rank: dest,
            size: 1,
        })
    }

    fn receive(&self, source: usize, _: Tag) -> Result<Vec<f64>> {
        Err(Error::InvalidRank {
            rank: source,
            size: 1,
        })
    }

    fn reduce_sum(&self, local: &[f64]) -> Result<Option<Vec<f64>>> {
        Ok(Some(local.to_vec()))
    }
}
