// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Nodal DOF sets
//!
//! At every node, the volume cells of the surrounding elements are grouped
//! into connected components over the cell links (adjacency across a shared
//! non-interface element face). Each component is one DOF set. Numbering is
//! by the smallest `(element gid, local cell index)` key of a component, so
//! two ranks seeing the same cells compute the same numbering.

use crate::mesh::{CutMesh, Position, VolumeCellId};
use disjoint::DisjointSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// `(element global id, local cell index)`
pub type CellKey = (usize, usize);

/// DOF sets of one node, each a sorted list of cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodalDofSets {
    pub node: usize,
    pub sets: Vec<Vec<CellKey>>,
}

impl NodalDofSets {
    pub fn count(&self) -> usize {
        self.sets.len()
    }

    /// Index of the DOF set a cell uses at this node
    pub fn set_of(&self, key: CellKey) -> Option<usize> {
        self.sets.iter().position(|s| s.binary_search(&key).is_ok())
    }

    /// Same numbering restricted to the cells `keep` accepts
    ///
    /// Sets that end up empty stay in place so the count is preserved.
    pub fn restricted(&self, keep: impl Fn(&CellKey) -> bool) -> Self {
        Self {
            node: self.node,
            sets: self
                .sets
                .iter()
                .map(|s| s.iter().copied().filter(|k| keep(k)).collect())
                .collect(),
        }
    }
}

/// DOF sets for every node of the mesh
pub fn assign_dofsets(mesh: &CutMesh, include_inner: bool) -> BTreeMap<usize, NodalDofSets> {
    let mut neighbors: BTreeMap<VolumeCellId, Vec<VolumeCellId>> = BTreeMap::new();
    for &(a, b) in &mesh.links {
        neighbors.entry(a).or_default().push(b);
        neighbors.entry(b).or_default().push(a);
    }

    let included = |id: VolumeCellId| include_inner || mesh.cell(id).position != Position::Inside;

    let mut result = BTreeMap::new();
    for (node, elements) in mesh.node_elements() {
        let cells: Vec<VolumeCellId> = elements
            .iter()
            .flat_map(|e| mesh.element(*e).cells.iter().copied())
            .filter(|c| included(*c))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index: BTreeMap<VolumeCellId, usize> =
            cells.iter().enumerate().map(|(i, c)| (*c, i)).collect();

        let mut components = DisjointSet::with_len(cells.len());
        for (i, cell) in cells.iter().enumerate() {
            for other in neighbors.get(cell).into_iter().flatten() {
                if let Some(&j) = index.get(other) {
                    components.join(i, j);
                }
            }
        }

        let mut sets: Vec<Vec<CellKey>> = components
            .sets()
            .into_iter()
            .map(|set| {
                let mut keys: Vec<CellKey> = set.iter().map(|&i| mesh.cell_key(cells[i])).collect();
                keys.sort_unstable();
                keys
            })
            .collect();
        sets.sort_by_key(|s| s.first().copied());
        result.insert(node, NodalDofSets { node, sets });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_lookup_and_restriction() {
        let dofsets = NodalDofSets {
            node: 3,
            sets: vec![vec![(0, 0), (1, 0)], vec![(1, 1)]],
        };
        assert_eq!(dofsets.count(), 2);
        assert_eq!(dofsets.set_of((1, 0)), Some(0));
        assert_eq!(dofsets.set_of((1, 1)), Some(1));
        assert_eq!(dofsets.set_of((2, 0)), None);

        let local = dofsets.restricted(|k| k.0 == 1);
        assert_eq!(local.count(), 2);
        assert_eq!(local.sets[0], vec![(1, 0)]);
    }
}
