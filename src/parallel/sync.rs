// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Ghost synchronization: owners overwrite the values of their nodes'
//! copies on other ranks.

use super::{agree, exchange, gather, Communicator};
use crate::dofset::{CellKey, NodalDofSets};
use crate::error::{CutError, EntityRef, Result};
use crate::mesh::{CutMesh, Position};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// All ranks must agree on the group size and the global node count
pub fn check_layout<C: Communicator + ?Sized>(comm: &C, global_node_count: usize) -> Result<()> {
    let layouts: Vec<(usize, usize)> = gather(comm, &(comm.size(), global_node_count))?;
    let expected = (comm.size(), global_node_count);
    if let Some((rank, layout)) = layouts.iter().enumerate().find(|(_, l)| **l != expected) {
        return Err(CutError::CommunicationMismatch(format!(
            "rank {rank} reports {} ranks and {} nodes, rank {} reports {} ranks and {} nodes",
            layout.0,
            layout.1,
            comm.rank(),
            expected.0,
            expected.1
        )));
    }
    Ok(())
}

/// Ghost nodes grouped by owning rank
fn ghost_requests(mesh: &CutMesh, rank: usize, size: usize) -> Result<Vec<Vec<usize>>> {
    let mut requests = vec![Vec::new(); size];
    for (&node, &owner) in &mesh.node_owner {
        if owner == rank {
            continue;
        }
        let Some(list) = requests.get_mut(owner) else {
            return Err(CutError::CommunicationMismatch(format!(
                "node {node} is owned by rank {owner}, but the group has {size} ranks"
            )));
        };
        list.push(node);
    }
    Ok(requests)
}

/// Request/response round: every rank answers the nodes it was asked for
fn request_owned<C, T, F>(comm: &C, mesh: &CutMesh, answer: F) -> Result<Vec<(usize, T)>>
where
    C: Communicator + ?Sized,
    T: serde::Serialize + serde::de::DeserializeOwned,
    F: Fn(usize) -> Option<T>,
{
    let requests = agree(comm, ghost_requests(mesh, comm.rank(), comm.size()))?;
    let asked: Vec<Vec<usize>> = exchange(comm, &requests)?;
    let responses: Vec<Vec<Option<T>>> = asked
        .iter()
        .map(|nodes| nodes.iter().map(|n| answer(*n)).collect())
        .collect();
    let answers: Vec<Vec<Option<T>>> = exchange(comm, &responses)?;

    let mut result = Vec::new();
    let mut failure = None;
    for (owner, (nodes, values)) in requests.iter().zip(answers).enumerate() {
        if nodes.len() != values.len() {
            failure = Some(CutError::CommunicationMismatch(format!(
                "rank {owner} answered {} of {} requests",
                values.len(),
                nodes.len()
            )));
            break;
        }
        for (&node, value) in nodes.iter().zip(values) {
            match value {
                Some(value) => result.push((node, value)),
                None => {
                    failure = Some(CutError::CommunicationMismatch(format!(
                        "rank {owner} does not know its {}",
                        EntityRef::Node(node)
                    )));
                    break;
                }
            }
        }
        if failure.is_some() {
            break;
        }
    }
    agree(comm, failure.map_or(Ok(result), Err))
}

/// Overwrite ghost node positions with the owners' values
pub fn sync_node_positions<C: Communicator + ?Sized>(comm: &C, mesh: &mut CutMesh) -> Result<usize> {
    let owned: BTreeMap<usize, Position> = mesh
        .node_positions
        .iter()
        .filter(|(n, _)| mesh.node_owner.get(n) == Some(&comm.rank()))
        .map(|(n, p)| (*n, *p))
        .collect();
    let values = request_owned(comm, mesh, |n| owned.get(&n).copied())?;
    let updated = values.len();
    for (node, position) in values {
        mesh.node_positions.insert(node, position);
    }
    debug!(rank = comm.rank(), ghosts = updated, "node positions synchronized");
    Ok(updated)
}

/// Overwrite ghost DOF sets with the owners', keeping the owners' count
pub fn sync_dofsets<C: Communicator + ?Sized>(comm: &C, mesh: &mut CutMesh) -> Result<usize> {
    let owned: BTreeMap<usize, NodalDofSets> = mesh
        .node_dofsets
        .iter()
        .filter(|(n, _)| mesh.node_owner.get(n) == Some(&comm.rank()))
        .map(|(n, d)| (*n, d.clone()))
        .collect();
    let values = request_owned(comm, mesh, |n| owned.get(&n).cloned())?;

    let local_cells: BTreeSet<CellKey> = (0..mesh.cells.len())
        .map(|i| mesh.cell_key(crate::mesh::VolumeCellId(i)))
        .collect();
    let updated = values.len();
    for (node, dofsets) in values {
        mesh.node_dofsets
            .insert(node, dofsets.restricted(|k| local_cells.contains(k)));
    }
    debug!(rank = comm.rank(), ghosts = updated, "dof sets synchronized");
    Ok(updated)
}

/// Every marked side must have been found by some rank
pub fn check_marked_sides<C: Communicator + ?Sized>(
    comm: &C,
    marked: &BTreeSet<usize>,
    found: &BTreeSet<usize>,
) -> Result<()> {
    let all_found: Vec<BTreeSet<usize>> = gather(comm, found)?;
    let found_anywhere: BTreeSet<usize> = all_found.into_iter().flatten().collect();
    match marked.iter().find(|s| !found_anywhere.contains(s)) {
        Some(&side) => Err(CutError::geometry(
            EntityRef::Side(side),
            "marked side does not intersect any background element",
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::SerialCommunicator;

    #[test]
    fn test_serial_layout_and_sync_are_noops() {
        let comm = SerialCommunicator;
        check_layout(&comm, 27).unwrap();
        let mut mesh = CutMesh::new(1e-10);
        mesh.node_owner.insert(0, 0);
        mesh.node_positions.insert(0, Position::Outside);
        assert_eq!(sync_node_positions(&comm, &mut mesh).unwrap(), 0);
        assert_eq!(mesh.node_positions[&0], Position::Outside);
    }

    #[test]
    fn test_foreign_owner_is_rejected() {
        let comm = SerialCommunicator;
        let mut mesh = CutMesh::new(1e-10);
        mesh.node_owner.insert(4, 3);
        assert!(matches!(
            sync_node_positions(&comm, &mut mesh),
            Err(CutError::CommunicationMismatch(_))
        ));
    }

    #[test]
    fn test_unmatched_marked_side() {
        let comm = SerialCommunicator;
        let marked: BTreeSet<usize> = [1, 2].into();
        let found: BTreeSet<usize> = [1].into();
        let err = check_marked_sides(&comm, &marked, &found).unwrap_err();
        assert!(matches!(
            err,
            CutError::GeometryInconsistency {
                entity: EntityRef::Side(2),
                ..
            }
        ));
    }
}
