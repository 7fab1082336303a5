// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Rank communication
//!
//! The cutter only needs a handful of collectives: a barrier, a
//! personalized all-to-all of byte buffers and an all-gather built on top
//! of it. Messages are serde-encoded as JSON.

mod sync;
mod thread_comm;

pub use sync::{check_layout, check_marked_sides, sync_dofsets, sync_node_positions};
pub use thread_comm::ThreadCommunicator;

use crate::error::{CutError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Collective operations between ranks
///
/// Every rank must call every collective in the same order.
pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    fn barrier(&self) -> Result<()>;

    /// Send `outgoing[r]` to rank `r`; returns what each rank sent here,
    /// indexed by source
    fn all_to_all(&self, outgoing: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>>;

    fn all_gather(&self, data: Vec<u8>) -> Result<Vec<Vec<u8>>> {
        self.all_to_all(vec![data; self.size()])
    }
}

/// Single-rank communicator
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialCommunicator;

impl Communicator for SerialCommunicator {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) -> Result<()> {
        Ok(())
    }

    fn all_to_all(&self, outgoing: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>> {
        if outgoing.len() != 1 {
            return Err(CutError::CommunicationMismatch(format!(
                "{} outgoing buffers for a single rank",
                outgoing.len()
            )));
        }
        Ok(outgoing)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| CutError::CommunicationMismatch(format!("cannot encode message: {e}")))
}

fn decode<T: DeserializeOwned>(bytes: &[u8], source: usize) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        CutError::CommunicationMismatch(format!("cannot decode message from rank {source}: {e}"))
    })
}

/// Typed all-to-all
pub fn exchange<C, T>(comm: &C, outgoing: &[T]) -> Result<Vec<T>>
where
    C: Communicator + ?Sized,
    T: Serialize + DeserializeOwned,
{
    let buffers = outgoing.iter().map(encode).collect::<Result<Vec<_>>>()?;
    comm.all_to_all(buffers)?
        .iter()
        .enumerate()
        .map(|(source, bytes)| decode(bytes, source))
        .collect()
}

/// Typed all-gather
pub fn gather<C, T>(comm: &C, value: &T) -> Result<Vec<T>>
where
    C: Communicator + ?Sized,
    T: Serialize + DeserializeOwned,
{
    comm.all_gather(encode(value)?)?
        .iter()
        .enumerate()
        .map(|(source, bytes)| decode(bytes, source))
        .collect()
}

/// Make a local outcome collective: fails on every rank if it failed on any
///
/// A rank that errors alone would otherwise leave the others blocked in
/// the next collective.
pub fn agree<C, T>(comm: &C, local: Result<T>) -> Result<T>
where
    C: Communicator + ?Sized,
{
    let message = local.as_ref().err().map(|e| e.to_string());
    let all: Vec<Option<String>> = gather(comm, &message)?;
    let value = local?;
    match all
        .iter()
        .enumerate()
        .find_map(|(rank, m)| m.as_ref().map(|m| (rank, m)))
    {
        Some((rank, message)) => Err(CutError::CommunicationMismatch(format!(
            "rank {rank} failed: {message}"
        ))),
        None => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_exchange() {
        let comm = SerialCommunicator;
        let echoed: Vec<Vec<usize>> = exchange(&comm, &[vec![1, 2, 3]]).unwrap();
        assert_eq!(echoed, vec![vec![1, 2, 3]]);
        let gathered: Vec<String> = gather(&comm, &"x".to_string()).unwrap();
        assert_eq!(gathered, vec!["x".to_string()]);
    }

    #[test]
    fn test_serial_rejects_wrong_buffer_count() {
        let comm = SerialCommunicator;
        assert!(matches!(
            comm.all_to_all(vec![vec![], vec![]]),
            Err(CutError::CommunicationMismatch(_))
        ));
    }

    #[test]
    fn test_agree_passes_local_error_through() {
        let comm = SerialCommunicator;
        let result: Result<()> = agree(&comm, Err(CutError::CommunicationMismatch("x".into())));
        assert!(matches!(result, Err(CutError::CommunicationMismatch(m)) if m == "x"));
        assert_eq!(agree(&comm, Ok(5)).unwrap(), 5);
    }
}
