//! MPI backend: every rank is a separate process started by `mpirun`.
//!
//! Requires the `mpi` feature and an MPI installation. The caller initializes MPI and hands the
//! world communicator to the integrators:
//!
//! ```ignore
//! let universe = mpi::initialize().expect("MPI init failed");
//! let world = universe.world();
//! ```
use crate::comm::{Communicator, Tag};
use crate::core::ROOT;
use crate::error::{Error, Result};

use ::mpi::collective::{Root, SystemOperation};
use ::mpi::point_to_point::{Destination, Source};
use ::mpi::topology::{Communicator as MpiCommunicator, SimpleCommunicator};

fn check_rank(comm: &SimpleCommunicator, rank: usize) -> Result<()> {
    let size = MpiCommunicator::size(comm) as usize;
    if rank < size {
        Ok(())
    } else {
        Err(Error::InvalidRank { rank, size })
    }
}

impl Communicator for SimpleCommunicator {
    fn rank(&self) -> usize {
        MpiCommunicator::rank(self) as usize
    }

    fn size(&self) -> usize {
        MpiCommunicator::size(self) as usize
    }

    fn send(&self, dest: usize, tag: Tag, payload: &[f64]) -> Result<()> {
        check_rank(self, dest)?;
        self.process_at_rank(dest as i32)
            .send_with_tag(payload, tag.code());
        Ok(())
    }

    fn receive(&self, source: usize, tag: Tag) -> Result<Vec<f64>> {
        check_rank(self, source)?;
        let (payload, _) = self
            .process_at_rank(source as i32)
            .receive_vec_with_tag::<f64>(tag.code());
        Ok(payload)
    }

    fn reduce_sum(&self, local: &[f64]) -> Result<Option<Vec<f64>>> {
        let root = self.process_at_rank(ROOT as i32);

        if MpiCommunicator::rank(self) as usize == ROOT {
            let mut total = vec![0.0; local.len()];
            root.reduce_into_root(local, &mut total[..], SystemOperation::sum());
            Ok(Some(total))
        } else {
            root.reduce_into(local, SystemOperation::sum());
            Ok(None)
        }
    }
}
