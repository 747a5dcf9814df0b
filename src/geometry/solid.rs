// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polygonal solids in world space

use super::MeshExtent;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Planar polygon given as an ordered loop of vertex indices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub indices: Vec<usize>,
    /// Slot into the owning solid's material list
    #[serde(default)]
    pub material_index: usize,
}

impl Face {
    pub fn new(indices: Vec<usize>) -> Self {
        Self {
            indices,
            material_index: 0,
        }
    }

    pub fn with_material(indices: Vec<usize>, material_index: usize) -> Self {
        Self {
            indices,
            material_index,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Consecutive index pairs, closing the loop
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.indices.len();
        (0..n).map(move |i| (self.indices[i], self.indices[(i + 1) % n]))
    }
}

/// Polygonal mesh with world-space vertices and material slots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solid {
    pub name: String,
    pub vertices: Vec<Point3<f64>>,
    pub faces: Vec<Face>,
    #[serde(default)]
    pub materials: Vec<String>,
}

impl Solid {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertices: Vec::new(),
            faces: Vec::new(),
            materials: Vec::new(),
        }
    }

    /// Build a solid from face loops, sharing vertices closer than `epsilon`
    pub fn from_loops(
        name: impl Into<String>,
        loops: &[Vec<Point3<f64>>],
        material: Option<&str>,
        epsilon: f64,
    ) -> Self {
        let mut solid = Self::new(name);
        if let Some(material) = material {
            solid.materials.push(material.to_string());
        }
        for face_loop in loops {
            let indices = face_loop
                .iter()
                .map(|point| solid.add_vertex(*point))
                .collect();
            solid.add_face(Face::new(indices));
        }
        solid.weld_vertices(epsilon);
        solid
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.materials.push(material.into());
        self
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, position: Point3<f64>) -> usize {
        let index = self.vertices.len();
        self.vertices.push(position);
        index
    }

    /// Add a face and return its index
    pub fn add_face(&mut self, face: Face) -> usize {
        let index = self.faces.len();
        self.faces.push(face);
        index
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// World positions of a face's loop, skipping out-of-range indices
    pub fn face_points(&self, face: &Face) -> Vec<Point3<f64>> {
        face.indices
            .iter()
            .filter_map(|&i| self.vertices.get(i).copied())
            .collect()
    }

    /// Material name assigned to a face, if its slot is filled
    pub fn face_material(&self, face: &Face) -> Option<&str> {
        self.materials.get(face.material_index).map(String::as_str)
    }

    /// First material slot, used when the solid acts as one layer
    pub fn primary_material(&self) -> Option<&str> {
        self.materials.first().map(String::as_str)
    }

    pub fn extent(&self) -> MeshExtent {
        MeshExtent::from_points(self.vertices.iter())
    }

    /// Newell normal of a face, unnormalized length is twice the area
    pub fn face_normal(&self, face: &Face) -> Vector3<f64> {
        let points = self.face_points(face);
        let n = points.len();
        let mut normal = Vector3::zeros();
        for i in 0..n {
            let current = points[i];
            let next = points[(i + 1) % n];
            normal.x += (current.y - next.y) * (current.z + next.z);
            normal.y += (current.z - next.z) * (current.x + next.x);
            normal.z += (current.x - next.x) * (current.y + next.y);
        }
        normal
    }

    /// Median of a face's vertices
    pub fn face_center(&self, face: &Face) -> Point3<f64> {
        let points = self.face_points(face);
        if points.is_empty() {
            return Point3::origin();
        }
        let sum = points
            .iter()
            .fold(Vector3::zeros(), |acc, point| acc + point.coords);
        Point3::from(sum / points.len() as f64)
    }

    /// Flip the winding of every face
    pub fn reverse_winding(&mut self) {
        for face in &mut self.faces {
            face.indices.reverse();
        }
    }

    /// Weld vertices that are within epsilon distance of each other
    /// This removes duplicate vertices and updates face indices
    /// Returns the number of vertices removed
    pub fn weld_vertices(&mut self, epsilon: f64) -> usize {
        if self.vertices.is_empty() {
            return 0;
        }

        let original_count = self.vertices.len();
        let mut new_vertices: Vec<Point3<f64>> = Vec::new();
        let mut new_indices: Vec<usize> = vec![0; original_count];

        for (i, position) in self.vertices.iter().enumerate() {
            match new_vertices
                .iter()
                .position(|existing| (position - existing).norm() < epsilon)
            {
                Some(j) => new_indices[i] = j,
                None => {
                    new_indices[i] = new_vertices.len();
                    new_vertices.push(*position);
                }
            }
        }

        for face in &mut self.faces {
            for index in &mut face.indices {
                if let Some(&mapped) = new_indices.get(*index) {
                    *index = mapped;
                }
            }
            // Welding can collapse neighbours onto each other
            face.indices.dedup();
            while face.indices.len() > 1 && face.indices.first() == face.indices.last() {
                face.indices.pop();
            }
        }

        self.vertices = new_vertices;
        original_count - self.vertices.len()
    }
}
