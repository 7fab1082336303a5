// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Gmsh post-processing dump
//!
//! Three ASCII `.pos` files per dump, each holding one or more views made of
//! scalar lines (`SL`), triangles (`ST`) and points (`SP`):
//!
//! - `<prefix>_cut_topology.pos`: element edges, cutter sub-sides, cut points
//! - `<prefix>_volume_cells.pos`: facets colored by cell position
//! - `<prefix>_integration_cells.pos`: integration points and boundary cells

use crate::error::Result;
use crate::geometry::polygon;
use crate::mesh::{CutMesh, Position, SideId};
use nalgebra::Point3;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

fn position_value(position: Position) -> f64 {
    match position {
        Position::Undecided => 0.0,
        Position::Inside => 1.0,
        Position::Outside => 2.0,
        Position::OnCutSurface => 3.0,
    }
}

fn coords(points: &[Point3<f64>]) -> String {
    points
        .iter()
        .map(|p| format!("{:.12e},{:.12e},{:.12e}", p.x, p.y, p.z))
        .collect::<Vec<_>>()
        .join(",")
}

fn line<W: Write>(w: &mut W, a: &Point3<f64>, b: &Point3<f64>, value: f64) -> std::io::Result<()> {
    writeln!(w, "SL({}){{{value},{value}}};", coords(&[*a, *b]))
}

fn triangle<W: Write>(w: &mut W, t: &[Point3<f64>; 3], value: f64) -> std::io::Result<()> {
    writeln!(w, "ST({}){{{value},{value},{value}}};", coords(t))
}

fn point<W: Write>(w: &mut W, p: &Point3<f64>, value: f64) -> std::io::Result<()> {
    writeln!(w, "SP({}){{{value}}};", coords(&[*p]))
}

pub fn write_cut_topology<W: Write>(mesh: &CutMesh, w: &mut W) -> std::io::Result<()> {
    writeln!(w, "View \"element edges\" {{")?;
    for element in &mesh.elements {
        let mut edges = BTreeSet::new();
        for face in element.shape.faces() {
            for i in 0..face.len() {
                let (a, b) = (face[i], face[(i + 1) % face.len()]);
                edges.insert((a.min(b), a.max(b)));
            }
        }
        for (a, b) in edges {
            line(w, &element.corners[a], &element.corners[b], element.gid as f64)?;
        }
    }
    writeln!(w, "}};")?;

    writeln!(w, "View \"cut sides\" {{")?;
    for (index, side) in mesh.sides.iter().enumerate() {
        for t in mesh.sub_side_triangles(SideId(index)) {
            triangle(w, &t, side.gid as f64)?;
        }
    }
    writeln!(w, "}};")?;

    writeln!(w, "View \"cut points\" {{")?;
    for (id, p) in mesh.points.iter() {
        point(w, p, id.index() as f64)?;
    }
    writeln!(w, "}};")
}

pub fn write_volume_cells<W: Write>(mesh: &CutMesh, w: &mut W) -> std::io::Result<()> {
    writeln!(w, "View \"volume cells\" {{")?;
    for cell in &mesh.cells {
        let value = position_value(cell.position);
        for facet in &cell.facets {
            for t in polygon::fan_triangles(&mesh.facet(*facet).coords) {
                triangle(w, &t, value)?;
            }
        }
    }
    writeln!(w, "}};")
}

pub fn write_integration_cells<W: Write>(mesh: &CutMesh, w: &mut W) -> std::io::Result<()> {
    writeln!(w, "View \"integration points\" {{")?;
    for cell in &mesh.cells {
        for (p, weight) in cell.rule.iter() {
            point(w, p, weight)?;
        }
    }
    writeln!(w, "}};")?;

    writeln!(w, "View \"boundary cells\" {{")?;
    for bc in &mesh.boundary_cells {
        let value = mesh.side(bc.side).gid as f64;
        for t in polygon::fan_triangles(&bc.points) {
            triangle(w, &t, value)?;
        }
    }
    writeln!(w, "}};")
}

/// Write all three dump files into `directory`
pub fn write_dump(mesh: &CutMesh, directory: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(directory)?;
    type Writer = fn(&CutMesh, &mut BufWriter<File>) -> std::io::Result<()>;
    let parts: [(&str, Writer); 3] = [
        ("cut_topology", write_cut_topology),
        ("volume_cells", write_volume_cells),
        ("integration_cells", write_integration_cells),
    ];

    let mut written = Vec::new();
    for (name, write) in parts {
        let path = directory.join(format!("{prefix}_{name}.pos"));
        let mut w = BufWriter::new(File::create(&path)?);
        write(mesh, &mut w)?;
        w.flush()?;
        written.push(path);
    }
    debug!(files = written.len(), directory = %directory.display(), "debug dump written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ElementShape;

    #[test]
    fn test_topology_view_lists_hex_edges() {
        let mut mesh = CutMesh::new(1e-10);
        mesh.add_element(3, ElementShape::Hex8, (0..8).collect(), ElementShape::Hex8.reference_nodes(), None);
        let mut buffer = Vec::new();
        write_cut_topology(&mesh, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.matches("SL(").count(), 12);
        assert_eq!(text.matches("View").count(), 3);
    }
}
