// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - primitives and predicates the cutter is built on

mod bbox;
pub mod bvh;
pub mod polygon;
pub mod robust_predicates;
pub mod shape;
pub mod triangle_intersection;

pub use bbox::BoundingBox;
pub use bvh::BVH;
pub use robust_predicates::{Plane, PlaneClassification};
pub use shape::{ElementShape, SideShape};
