// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Left-hand-rule orientation of boundary edges

use super::DirectedSegment;
use crate::config::ThermConfig;
use crate::error::GeometryError;
use crate::geometry::{point_in_solid, Solid};
use nalgebra::{Point3, Vector2};

/// Plan-view length below which an edge has no usable direction
const MIN_PLAN_LENGTH: f64 = 1e-12;

/// How the classifier settled on a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Material found on the left of the input order
    Kept,
    /// Material found only on the right, input reversed
    Reversed,
    /// Neither probe hit material, input order kept
    Ambiguous,
}

/// Probes the material side of edges against a fixed set of solids
pub struct OrientationClassifier<'a> {
    solids: &'a [&'a Solid],
    search_distance: f64,
    plane_tolerance: f64,
}

impl<'a> OrientationClassifier<'a> {
    pub fn new(solids: &'a [&'a Solid], search_distance: f64, plane_tolerance: f64) -> Self {
        Self {
            solids,
            search_distance,
            plane_tolerance,
        }
    }

    pub fn from_config(solids: &'a [&'a Solid], config: &ThermConfig) -> Self {
        Self::new(solids, config.search_distance, config.plane_tolerance)
    }

    /// Direct the edge `(v1, v2)` so the material lies to its left
    pub fn orient(
        &self,
        v1: Point3<f64>,
        v2: Point3<f64>,
    ) -> Result<(DirectedSegment, Orientation), GeometryError> {
        let segment = DirectedSegment::new(v1, v2);
        let direction = segment.plan_direction();
        let length = direction.norm();
        if length < MIN_PLAN_LENGTH {
            return Err(GeometryError::DegenerateEdge);
        }

        let direction = direction / length;
        let normal = Vector2::new(-direction.y, direction.x);
        let mid = segment.midpoint();

        let probe = |sign: f64| {
            let offset = normal * (self.search_distance * sign);
            Point3::new(mid.x + offset.x, mid.y + offset.y, mid.z)
        };

        if self.contains(&probe(1.0)) {
            return Ok((segment, Orientation::Kept));
        }
        if self.contains(&probe(-1.0)) {
            tracing::debug!(?v1, ?v2, "material on the right, reversing edge");
            return Ok((segment.reversed(), Orientation::Reversed));
        }

        tracing::debug!(?v1, ?v2, "no material on either side, keeping input order");
        Ok((segment, Orientation::Ambiguous))
    }

    fn contains(&self, point: &Point3<f64>) -> bool {
        self.solids
            .iter()
            .any(|solid| point_in_solid(point, solid, self.plane_tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::Point2;

    fn slab() -> Solid {
        Primitive::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)).to_solid("slab", None)
    }

    #[test]
    fn test_keeps_direction_with_material_on_left() {
        let solid = slab();
        let solids = [&solid];
        let classifier = OrientationClassifier::new(&solids, 0.1, 0.1);

        // Bottom edge walked +x has the square on its left
        let (segment, outcome) = classifier
            .orient(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(outcome, Orientation::Kept);
        assert_eq!(segment.start, Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_reverses_when_material_on_right() {
        let solid = slab();
        let solids = [&solid];
        let classifier = OrientationClassifier::new(&solids, 0.1, 0.1);

        let (segment, outcome) = classifier
            .orient(Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(outcome, Orientation::Reversed);
        assert_eq!(segment.start, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(segment.end, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_winding_of_solid_is_irrelevant() {
        let mut solid = slab();
        solid.reverse_winding();
        let solids = [&solid];
        let classifier = OrientationClassifier::new(&solids, 0.1, 0.1);

        let (segment, _) = classifier
            .orient(Point3::new(1.0, 1.0, 0.0), Point3::new(1.0, 0.0, 0.0))
            .unwrap();
        // Right edge: material (x < 1) is on the left when walking upward
        assert_eq!(segment.start, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_ambiguous_keeps_input() {
        let solid = slab();
        let solids = [&solid];
        let classifier = OrientationClassifier::new(&solids, 0.1, 0.1);

        let v1 = Point3::new(5.0, 5.0, 0.0);
        let v2 = Point3::new(6.0, 5.0, 0.0);
        let (segment, outcome) = classifier.orient(v1, v2).unwrap();
        assert_eq!(outcome, Orientation::Ambiguous);
        assert_eq!(segment, DirectedSegment::new(v1, v2));
    }

    #[test]
    fn test_vertical_edge_is_degenerate() {
        let solid = slab();
        let solids = [&solid];
        let classifier = OrientationClassifier::new(&solids, 0.1, 0.1);

        let result = classifier.orient(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.0));
        assert_eq!(result.unwrap_err(), GeometryError::DegenerateEdge);
    }

    #[test]
    fn test_repeated_runs_agree() {
        let solid = slab();
        let solids = [&solid];
        let classifier = OrientationClassifier::new(&solids, 0.1, 0.1);
        let v1 = Point3::new(0.0, 1.0, 0.0);
        let v2 = Point3::new(1.0, 1.0, 0.0);

        let first = classifier.orient(v1, v2).unwrap();
        let second = classifier.orient(v1, v2).unwrap();
        assert_eq!(first, second);
    }
}
