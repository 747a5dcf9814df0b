// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Read-only preflight checks run before export

use super::Solid;
use serde::{Deserialize, Serialize};

/// Grid remainders closer than this to a multiple count as on-grid
const GRID_SLACK: f64 = 0.001;

/// Findings for one solid
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreflightReport {
    pub solid: String,
    /// Faces whose normal points down
    pub downward_faces: Vec<usize>,
    pub off_grid_vertices: usize,
    pub faces_with_too_few_vertices: usize,
}

impl PreflightReport {
    pub fn is_clean(&self) -> bool {
        self.downward_faces.is_empty()
            && self.off_grid_vertices == 0
            && self.faces_with_too_few_vertices == 0
    }
}

/// Faces whose unit normal has a z-component below `threshold`
pub fn downward_faces(solid: &Solid, threshold: f64) -> Vec<usize> {
    solid
        .faces
        .iter()
        .enumerate()
        .filter_map(|(index, face)| {
            let normal = solid.face_normal(face);
            let length = normal.norm();
            (length > 0.0 && normal.z / length < threshold).then_some(index)
        })
        .collect()
}

/// Number of vertices with any coordinate off the `precision` grid
pub fn off_grid_vertices(solid: &Solid, precision: f64) -> usize {
    if precision <= 0.0 {
        return 0;
    }
    solid
        .vertices
        .iter()
        .filter(|vertex| {
            vertex.coords.iter().any(|coordinate| {
                let remainder = coordinate.abs() % precision;
                remainder > GRID_SLACK && remainder < precision - GRID_SLACK
            })
        })
        .count()
}

/// Run every check on `solid`
pub fn preflight(solid: &Solid, downward_threshold: f64, grid_precision: f64) -> PreflightReport {
    PreflightReport {
        solid: solid.name.clone(),
        downward_faces: downward_faces(solid, downward_threshold),
        off_grid_vertices: off_grid_vertices(solid, grid_precision),
        faces_with_too_few_vertices: solid.faces.iter().filter(|f| f.len() < 3).count(),
    }
}
