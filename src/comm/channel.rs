//! In-process worlds: every rank is a thread and messages travel over channels.
use crate::comm::{Communicator, Tag};
use crate::core::ROOT;
use crate::error::{Error, Result};

use crossbeam as cb;
use crossbeam::channel::{bounded, select, unbounded, Receiver, Sender};
use std::cell::RefCell;

/// Clones every endpoint except the one belonging to `rank`.
fn all_but<T: Clone>(endpoints: &[T], rank: usize) -> Vec<Option<T>> {
    endpoints
        .iter()
        .enumerate()
        .map(|(index, endpoint)| {
            if index == rank {
                None
            } else {
                Some(endpoint.clone())
            }
        })
        .collect()
}

#[derive(Debug)]
struct Envelope {
    source: usize,
    tag: Tag,
    payload: Vec<f64>,
}

/// One rank of an in-process world.
///
/// Sending never blocks. Receiving blocks until a matching message arrives; messages that arrive
/// while waiting for a different source or tag are kept and handed out later in arrival order.
/// As soon as the rank a receive waits for drops its communicator, for instance because it
/// returned or panicked, the receive fails with [`Error::Disconnected`] instead of waiting
/// forever. Messages the rank sent before it went away are still delivered.
#[derive(Debug)]
pub struct ChannelCommunicator {
    rank: usize,
    size: usize,
    /// `outboxes[dest]` delivers to the inbox of `dest`; there is none for the own rank.
    outboxes: Vec<Option<Sender<Envelope>>>,
    inbox: Receiver<Envelope>,
    pending: RefCell<Vec<Envelope>>,
    /// Never used to send; peers see it disconnect when this rank goes away.
    _heartbeat: Sender<()>,
    /// `peers[source]` disconnects once `source` is gone; there is none for the own rank.
    peers: Vec<Option<Receiver<()>>>,
}

impl ChannelCommunicator {
    /// Create all ranks of a world with `size` ranks. The communicator at index `i` has rank `i`.
    pub fn world(size: usize) -> Result<Vec<Self>> {
        if size == 0 {
            return Err(Error::EmptyWorld);
        }

        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..size).map(|_| unbounded::<Envelope>()).unzip();
        let (heartbeats, peers): (Vec<_>, Vec<_>) = (0..size).map(|_| bounded::<()>(0)).unzip();

        Ok(receivers
            .into_iter()
            .zip(heartbeats)
            .enumerate()
            .map(|(rank, (inbox, heartbeat))| Self {
                rank,
                size,
                outboxes: all_but(&senders, rank),
                inbox,
                pending: RefCell::new(Vec::new()),
                _heartbeat: heartbeat,
                peers: all_but(&peers, rank),
            })
            .collect())
    }

    fn check_rank(&self, rank: usize) -> Result<()> {
        if rank < self.size {
            Ok(())
        } else {
            Err(Error::InvalidRank {
                rank,
                size: self.size,
            })
        }
    }

    fn take_pending(&self, source: usize, tag: Tag) -> Option<Vec<f64>> {
        let mut pending = self.pending.borrow_mut();
        let index = pending
            .iter()
            .position(|envelope| envelope.source == source && envelope.tag == tag)?;

        Some(pending.remove(index).payload)
    }
}

impl Communicator for ChannelCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, dest: usize, tag: Tag, payload: &[f64]) -> Result<()> {
        self.check_rank(dest)?;

        let envelope = Envelope {
            source: self.rank,
            tag,
            payload: payload.to_vec(),
        };

        match &self.outboxes[dest] {
            Some(outbox) => outbox
                .send(envelope)
                .map_err(|_| Error::Disconnected(dest)),
            None => {
                self.pending.borrow_mut().push(envelope);
                Ok(())
            }
        }
    }

    fn receive(&self, source: usize, tag: Tag) -> Result<Vec<f64>> {
        self.check_rank(source)?;

        if let Some(payload) = self.take_pending(source, tag) {
            return Ok(payload);
        }

        // only this rank itself could have sent it, and it is not pending
        let peer = self.peers[source]
            .as_ref()
            .ok_or(Error::Disconnected(source))?;

        loop {
            select! {
                recv(self.inbox) -> envelope => {
                    let envelope = envelope.map_err(|_| Error::Disconnected(source))?;

                    if envelope.source == source && envelope.tag == tag {
                        return Ok(envelope.payload);
                    }

                    self.pending.borrow_mut().push(envelope);
                }
                recv(peer) -> _ => {
                    // everything the peer sent before leaving is already queued
                    self.pending.borrow_mut().extend(self.inbox.try_iter());

                    return self
                        .take_pending(source, tag)
                        .ok_or(Error::Disconnected(source));
                }
            }
        }
    }
}

/// Run `f` on every rank of a new world with `size` ranks, each rank on its own thread, and
/// return the results ordered by rank.
///
/// This is the in-process counterpart of starting `size` copies of a program with `mpirun`.
pub fn run_spmd<F, R>(size: usize, f: F) -> Result<Vec<R>>
where
    F: Fn(ChannelCommunicator) -> R + Sync,
    R: Send,
{
    let world = ChannelCommunicator::world(size)?;
    let f = &f;

    cb::thread::scope(|s| {
        let handles = world
            .into_iter()
            .map(|comm| {
                let rank = comm.rank();
                let handle = s.spawn(move |_| {
                    let span = tracing::debug_span!("rank", rank, size);
                    let _guard = span.enter();
                    f(comm)
                });
                (rank, handle)
            })
            .collect::<Vec<_>>();

        // join every rank before looking at the results, so that no thread outlives a failure
        let joined = handles
            .into_iter()
            .map(|(rank, handle)| (rank, handle.join()))
            .collect::<Vec<_>>();

        joined
            .into_iter()
            .map(|(rank, result)| result.map_err(|_| Error::WorkerPanicked(rank)))
            .collect::<Result<Vec<_>>>()
    })
    // all threads have been joined inside the scope
    .unwrap_or_else(|_| Err(Error::WorkerPanicked(ROOT)))
}
