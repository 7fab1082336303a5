// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tolerance-merged point storage
//!
//! Point identity is a function of position only: inserting a coordinate
//! within the merge radius of an existing point returns that point's id,
//! whichever side or element asks for it.

use super::PointId;
use ahash::AHashMap;
use nalgebra::Point3;

type CellKey = (i64, i64, i64);

/// Point pool with a uniform hash grid for neighbor lookup
#[derive(Debug, Clone)]
pub struct PointPool {
    points: Vec<Point3<f64>>,
    grid: AHashMap<CellKey, Vec<usize>>,
    tolerance: f64,
}

impl PointPool {
    pub fn new(tolerance: f64) -> Self {
        Self {
            points: Vec::new(),
            grid: AHashMap::new(),
            tolerance: tolerance.max(f64::MIN_POSITIVE),
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn key(&self, p: &Point3<f64>) -> CellKey {
        (
            (p.x / self.tolerance).floor() as i64,
            (p.y / self.tolerance).floor() as i64,
            (p.z / self.tolerance).floor() as i64,
        )
    }

    /// Existing point within the merge radius, closest first
    pub fn find(&self, p: &Point3<f64>) -> Option<PointId> {
        let (kx, ky, kz) = self.key(p);
        let mut best: Option<(usize, f64)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.grid.get(&(kx + dx, ky + dy, kz + dz)) else {
                        continue;
                    };
                    for &idx in bucket {
                        let distance = (self.points[idx] - p).norm();
                        if distance <= self.tolerance
                            && best.map_or(true, |(b, d)| distance < d || (distance == d && idx < b))
                        {
                            best = Some((idx, distance));
                        }
                    }
                }
            }
        }
        best.map(|(idx, _)| PointId(idx))
    }

    /// Id of the point at `p`, inserting it if nothing is within the radius
    pub fn get_or_insert(&mut self, p: &Point3<f64>) -> PointId {
        if let Some(id) = self.find(p) {
            return id;
        }
        let idx = self.points.len();
        self.points.push(*p);
        let key = self.key(p);
        self.grid.entry(key).or_default().push(idx);
        PointId(idx)
    }

    pub fn coords(&self, id: PointId) -> &Point3<f64> {
        &self.points[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (PointId, &Point3<f64>)> {
        self.points.iter().enumerate().map(|(i, p)| (PointId(i), p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_merge_within_tolerance() {
        let mut pool = PointPool::new(1e-6);
        let a = pool.get_or_insert(&Point3::new(0.1, 0.2, 0.3));
        let b = pool.get_or_insert(&Point3::new(0.1 + 4e-7, 0.2, 0.3));
        let c = pool.get_or_insert(&Point3::new(0.1 + 4e-6, 0.2, 0.3));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_merge_across_grid_cells() {
        let mut pool = PointPool::new(1e-3);
        let a = pool.get_or_insert(&Point3::new(0.9999, 0.0, 0.0));
        let b = pool.get_or_insert(&Point3::new(1.0001, 0.0, 0.0));
        assert_eq!(a, b);
        assert_eq!(pool.find(&Point3::new(2.0, 0.0, 0.0)), None);
    }
}
