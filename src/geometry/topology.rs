// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Edge connectivity within a single solid

use super::Solid;
use nalgebra::Point3;
use std::collections::HashMap;

/// Undirected edge between two vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub v0: usize,
    pub v1: usize,
}

impl EdgeKey {
    pub fn new(v0: usize, v1: usize) -> Self {
        // Always store edges with smaller index first for consistent hashing
        if v0 < v1 {
            Self { v0, v1 }
        } else {
            Self { v0: v1, v1: v0 }
        }
    }
}

/// Edge bordering exactly one face of its solid
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryEdge {
    /// Position of the owning solid in the input set
    pub solid: usize,
    /// Vertex indices as they appear in the face loop
    pub vertices: (usize, usize),
    pub face: usize,
    pub start: Point3<f64>,
    pub end: Point3<f64>,
}

impl BoundaryEdge {
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}

/// Map every undirected edge of `solid` to the faces it borders
pub fn edge_faces(solid: &Solid) -> HashMap<EdgeKey, Vec<usize>> {
    let mut edges: HashMap<EdgeKey, Vec<usize>> = HashMap::new();

    for (face_index, face) in solid.faces.iter().enumerate() {
        for (a, b) in face.edges() {
            if a == b {
                continue;
            }
            edges.entry(EdgeKey::new(a, b)).or_default().push(face_index);
        }
    }

    edges
}

/// Edges of `solid` that border exactly one of its faces, in face order
pub fn boundary_edges(solid: &Solid, solid_index: usize) -> Vec<BoundaryEdge> {
    let counts = edge_faces(solid);
    let mut result = Vec::new();

    for (face_index, face) in solid.faces.iter().enumerate() {
        for (a, b) in face.edges() {
            if a == b || counts.get(&EdgeKey::new(a, b)).map_or(0, Vec::len) != 1 {
                continue;
            }
            let (Some(start), Some(end)) = (solid.vertices.get(a), solid.vertices.get(b)) else {
                continue;
            };
            result.push(BoundaryEdge {
                solid: solid_index,
                vertices: (a, b),
                face: face_index,
                start: *start,
                end: *end,
            });
        }
    }

    result
}

/// Check if solid is closed in the plan sense (no edge borders more than two faces)
pub fn is_manifold(solid: &Solid) -> bool {
    edge_faces(solid).values().all(|faces| faces.len() <= 2)
}
