// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! True exterior edges of an assembly of solids

use crate::geometry::{boundary_edges, BoundaryEdge, Solid};
use crate::utils::math::endpoints_match;

/// Boundary edges of the assembly that no other solid shares.
///
/// Every solid contributes the edges that border exactly one of its own faces.
/// An edge is dropped when a boundary edge of any *other* solid has the same
/// endpoints (either order) within `tolerance`; those are seams between
/// adjoining solids. An empty input yields an empty result.
pub fn extract_external_edges(solids: &[&Solid], tolerance: f64) -> Vec<BoundaryEdge> {
    let per_solid: Vec<Vec<BoundaryEdge>> = solids
        .iter()
        .enumerate()
        .map(|(index, solid)| boundary_edges(solid, index))
        .collect();

    let candidate_count: usize = per_solid.iter().map(Vec::len).sum();
    let mut exterior = Vec::new();

    for (index, edges) in per_solid.iter().enumerate() {
        for edge in edges {
            let shared = per_solid
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != index)
                .flat_map(|(_, others)| others.iter())
                .any(|other| endpoints_match(&edge.start, &edge.end, &other.start, &other.end, tolerance));

            if !shared {
                exterior.push(edge.clone());
            }
        }
    }

    tracing::debug!(
        solids = solids.len(),
        candidates = candidate_count,
        exterior = exterior.len(),
        "extracted exterior edges"
    );

    exterior
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::Point2;

    fn square(name: &str, x0: f64, y0: f64) -> Solid {
        Primitive::rectangle(Point2::new(x0, y0), Point2::new(x0 + 1.0, y0 + 1.0)).to_solid(name, None)
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_external_edges(&[], 0.001).is_empty());
    }

    #[test]
    fn test_single_convex_solid_keeps_all_boundary_edges() {
        let solid = square("a", 0.0, 0.0);
        assert_eq!(extract_external_edges(&[&solid], 0.001).len(), 4);
    }

    #[test]
    fn test_shared_seam_cancels() {
        let a = square("a", 0.0, 0.0);
        let b = square("b", 1.0, 0.0);
        let edges = extract_external_edges(&[&a, &b], 0.001);

        assert_eq!(edges.len(), 6);
        // Nothing may remain on the seam x = 1
        assert!(!edges
            .iter()
            .any(|e| (e.start.x - 1.0).abs() < 1e-9 && (e.end.x - 1.0).abs() < 1e-9));
    }

    #[test]
    fn test_seam_within_tolerance_cancels() {
        let a = square("a", 0.0, 0.0);
        let b = square("b", 1.0005, 0.0);
        assert_eq!(extract_external_edges(&[&a, &b], 0.001).len(), 6);
        assert_eq!(extract_external_edges(&[&a, &b], 0.0001).len(), 8);
    }

    #[test]
    fn test_partial_overlap_is_not_a_seam() {
        // Second square is shifted up by half: the touching edges differ
        let a = square("a", 0.0, 0.0);
        let b = square("b", 1.0, 0.5);
        assert_eq!(extract_external_edges(&[&a, &b], 0.001).len(), 8);
    }
}
