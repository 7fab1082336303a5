// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - debug dumps of the cut mesh

pub mod gmsh;

pub use gmsh::write_dump;
