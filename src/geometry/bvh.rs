// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding Volume Hierarchy (BVH) for spatial acceleration
//! Static search tree over side bounding boxes, used for self-cut pairing
//! and element-vs-side collision detection

use super::BoundingBox;

/// BVH node
#[derive(Debug, Clone)]
pub struct BVHNode {
    /// Bounding box of this node
    pub bbox: BoundingBox,
    /// Left child (None for leaf)
    pub left: Option<Box<BVHNode>>,
    /// Right child (None for leaf)
    pub right: Option<Box<BVHNode>>,
    /// Item indices (only for leaf nodes)
    pub items: Vec<usize>,
}

impl BVHNode {
    /// Create a leaf node
    fn leaf(bbox: BoundingBox, items: Vec<usize>) -> Self {
        Self {
            bbox,
            left: None,
            right: None,
            items,
        }
    }

    /// Create an internal node
    fn internal(bbox: BoundingBox, left: Box<BVHNode>, right: Box<BVHNode>) -> Self {
        Self {
            bbox,
            left: Some(left),
            right: Some(right),
            items: Vec::new(),
        }
    }

    /// Check if this is a leaf node
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Bounding Volume Hierarchy over boxed items
#[derive(Debug, Clone)]
pub struct BVH {
    root: BVHNode,
    len: usize,
}

impl BVH {
    /// Build BVH from (item index, bbox) pairs
    pub fn build(items: Vec<(usize, BoundingBox)>) -> Self {
        let len = items.len();
        if items.is_empty() {
            return Self {
                root: BVHNode::leaf(BoundingBox::empty(), Vec::new()),
                len,
            };
        }

        let root = Self::build_recursive(items, 0);
        Self { root, len }
    }

    /// Number of indexed items
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bounding box of everything in the tree
    pub fn bounds(&self) -> BoundingBox {
        self.root.bbox
    }

    /// Recursively build BVH node
    fn build_recursive(mut items: Vec<(usize, BoundingBox)>, depth: usize) -> BVHNode {
        const MAX_DEPTH: usize = 32;
        const MIN_ITEMS: usize = 4;

        if items.len() <= MIN_ITEMS || depth >= MAX_DEPTH {
            let bbox = Self::compute_union_bbox(&items);
            let indices: Vec<usize> = items.iter().map(|(idx, _)| *idx).collect();
            return BVHNode::leaf(bbox, indices);
        }

        // Split at the median of the longest axis
        let split_axis = Self::find_best_split_axis(&items);
        items.sort_by(|(ia, a), (ib, b)| {
            a.center()[split_axis]
                .total_cmp(&b.center()[split_axis])
                .then(ia.cmp(ib))
        });

        let right_items = items.split_off(items.len() / 2);
        let left = Box::new(Self::build_recursive(items, depth + 1));
        let right = Box::new(Self::build_recursive(right_items, depth + 1));

        let bbox = left.bbox.merged(&right.bbox);
        BVHNode::internal(bbox, left, right)
    }

    /// Find best split axis (longest axis)
    fn find_best_split_axis(items: &[(usize, BoundingBox)]) -> usize {
        let size = Self::compute_union_bbox(items).size();

        if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        }
    }

    fn compute_union_bbox(items: &[(usize, BoundingBox)]) -> BoundingBox {
        items
            .iter()
            .fold(BoundingBox::empty(), |acc, (_, bbox)| acc.merged(bbox))
    }

    /// Items whose box overlaps the query box, in ascending index order
    pub fn query(&self, bbox: &BoundingBox) -> Vec<usize> {
        let mut result = Vec::new();
        if self.len > 0 {
            Self::query_recursive(&self.root, bbox, &mut result);
        }
        result.sort_unstable();
        result.dedup();
        result
    }

    fn query_recursive(node: &BVHNode, bbox: &BoundingBox, result: &mut Vec<usize>) {
        if !node.bbox.intersects(bbox) {
            return;
        }

        if node.is_leaf() {
            result.extend_from_slice(&node.items);
        } else {
            if let Some(ref left) = node.left {
                Self::query_recursive(left, bbox, result);
            }
            if let Some(ref right) = node.right {
                Self::query_recursive(right, bbox, result);
            }
        }
    }

    /// Leaf-level query: leaves store whole item lists, so this is a
    /// candidate set; callers filter with the item boxes themselves
    pub fn query_filtered(&self, bbox: &BoundingBox, boxes: &[BoundingBox]) -> Vec<usize> {
        self.query(bbox)
            .into_iter()
            .filter(|&i| boxes[i].intersects(bbox))
            .collect()
    }

    #[cfg(test)]
    pub fn root(&self) -> &BVHNode {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn unit_box_at(x: f64) -> BoundingBox {
        BoundingBox::new(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0))
    }

    #[test]
    fn test_bvh_build() {
        let items: Vec<_> = (0..20).map(|i| (i, unit_box_at(2.0 * i as f64))).collect();
        let bvh = BVH::build(items);
        assert!(!bvh.root().is_leaf());
        assert_eq!(bvh.len(), 20);
        assert_eq!(bvh.bounds().max.x, 39.0);
    }

    #[test]
    fn test_bvh_query() {
        let boxes: Vec<_> = (0..20).map(|i| unit_box_at(2.0 * i as f64)).collect();
        let bvh = BVH::build(boxes.iter().copied().enumerate().collect());

        let query = BoundingBox::new(Point3::new(4.5, 0.5, 0.5), Point3::new(6.5, 0.6, 0.6));
        assert_eq!(bvh.query_filtered(&query, &boxes), vec![2, 3]);

        let far = BoundingBox::new(Point3::new(100.0, 0.0, 0.0), Point3::new(101.0, 1.0, 1.0));
        assert!(bvh.query(&far).is_empty());
    }

    #[test]
    fn test_empty_bvh() {
        let bvh = BVH::build(Vec::new());
        assert!(bvh.is_empty());
        assert!(bvh.query(&unit_box_at(0.0)).is_empty());
    }
}
