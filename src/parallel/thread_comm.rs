// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! In-process ranks on threads, connected by channels

use super::Communicator;
use crate::error::{CutError, Result};
use std::cell::{Cell, RefCell};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Barrier};

#[derive(Debug)]
struct Envelope {
    source: usize,
    round: u64,
    payload: Vec<u8>,
}

/// One rank of a thread group
///
/// Each rank owns the receiving end of its own channel and a sender to
/// every rank. Messages carry the collective round they belong to, so a
/// fast rank's next round never mixes with the current one.
#[derive(Debug)]
pub struct ThreadCommunicator {
    rank: usize,
    senders: Vec<Sender<Envelope>>,
    receiver: Receiver<Envelope>,
    pending: RefCell<Vec<Envelope>>,
    round: Cell<u64>,
    barrier: Arc<Barrier>,
}

impl ThreadCommunicator {
    /// Communicators for `size` ranks, to be moved into one thread each
    pub fn group(size: usize) -> Vec<ThreadCommunicator> {
        let size = size.max(1);
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| channel()).unzip();
        let barrier = Arc::new(Barrier::new(size));
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, receiver)| ThreadCommunicator {
                rank,
                senders: senders.clone(),
                receiver,
                pending: RefCell::new(Vec::new()),
                round: Cell::new(0),
                barrier: Arc::clone(&barrier),
            })
            .collect()
    }
}

impl Communicator for ThreadCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.senders.len()
    }

    fn barrier(&self) -> Result<()> {
        self.barrier.wait();
        Ok(())
    }

    fn all_to_all(&self, outgoing: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>> {
        let size = self.size();
        if outgoing.len() != size {
            return Err(CutError::CommunicationMismatch(format!(
                "{} outgoing buffers for {size} ranks",
                outgoing.len()
            )));
        }
        let round = self.round.get() + 1;
        self.round.set(round);

        for (target, payload) in outgoing.into_iter().enumerate() {
            self.senders[target]
                .send(Envelope {
                    source: self.rank,
                    round,
                    payload,
                })
                .map_err(|_| {
                    CutError::CommunicationMismatch(format!("rank {target} has left the group"))
                })?;
        }

        let mut incoming: Vec<Option<Vec<u8>>> = vec![None; size];
        let mut received = 0;
        {
            let mut pending = self.pending.borrow_mut();
            let (current, later): (Vec<_>, Vec<_>) =
                pending.drain(..).partition(|e| e.round == round);
            *pending = later;
            for envelope in current {
                incoming[envelope.source] = Some(envelope.payload);
                received += 1;
            }
        }
        while received < size {
            let envelope = self.receiver.recv().map_err(|_| {
                CutError::CommunicationMismatch("all other ranks have left the group".into())
            })?;
            if envelope.round == round {
                incoming[envelope.source] = Some(envelope.payload);
                received += 1;
            } else {
                self.pending.borrow_mut().push(envelope);
            }
        }
        Ok(incoming.into_iter().map(Option::unwrap_or_default).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::{exchange, gather};
    use std::thread;

    #[test]
    fn test_all_to_all_between_threads() {
        let handles: Vec<_> = ThreadCommunicator::group(3)
            .into_iter()
            .map(|comm| {
                thread::spawn(move || {
                    let rank = comm.rank();
                    let outgoing: Vec<(usize, usize)> = (0..3).map(|t| (rank, t)).collect();
                    let first: Vec<(usize, usize)> = exchange(&comm, &outgoing).unwrap();
                    comm.barrier().unwrap();
                    let ranks: Vec<usize> = gather(&comm, &(rank * 10)).unwrap();
                    (rank, first, ranks)
                })
            })
            .collect();

        for handle in handles {
            let (rank, first, ranks) = handle.join().unwrap();
            assert_eq!(first, (0..3).map(|s| (s, rank)).collect::<Vec<_>>());
            assert_eq!(ranks, vec![0, 10, 20]);
        }
    }

    #[test]
    fn test_rounds_do_not_mix() {
        let handles: Vec<_> = ThreadCommunicator::group(2)
            .into_iter()
            .map(|comm| {
                thread::spawn(move || {
                    (0..20)
                        .map(|round| gather(&comm, &(round, comm.rank())).unwrap())
                        .collect::<Vec<Vec<(usize, usize)>>>()
                })
            })
            .collect();
        for handle in handles {
            for (round, values) in handle.join().unwrap().into_iter().enumerate() {
                assert_eq!(values, vec![(round, 0), (round, 1)]);
            }
        }
    }
}
