// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Plan-view polygon predicates

use super::Solid;
use nalgebra::{Point2, Point3};

/// Drop the z coordinate
pub fn plan(point: &Point3<f64>) -> Point2<f64> {
    Point2::new(point.x, point.y)
}

/// Crossing-number containment test.
///
/// An edge is crossed when `y > min(y1, y2) && y <= max(y1, y2)`; points on
/// the half-open boundary resolve the same way on every call.
pub fn point_in_polygon(point: &Point2<f64>, polygon: &[Point2<f64>]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut p1 = polygon[0];

    for i in 1..=n {
        let p2 = polygon[i % n];

        if point.y > p1.y.min(p2.y) && point.y <= p1.y.max(p2.y) && point.x <= p1.x.max(p2.x) {
            // p1.y != p2.y is guaranteed by the interval test above
            let x_intersection = (point.y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x;
            if p1.x == p2.x || point.x <= x_intersection {
                inside = !inside;
            }
        }

        p1 = p2;
    }

    inside
}

/// Whether `point` lies inside any face of `solid`.
///
/// A face is only considered when the point's height is within
/// `plane_tolerance` of the face centre; containment is then tested in plan.
pub fn point_in_solid(point: &Point3<f64>, solid: &Solid, plane_tolerance: f64) -> bool {
    let probe = plan(point);

    solid.faces.iter().any(|face| {
        let center = solid.face_center(face);
        if (point.z - center.z).abs() >= plane_tolerance {
            return false;
        }
        let outline: Vec<Point2<f64>> = solid.face_points(face).iter().map(plan).collect();
        point_in_polygon(&probe, &outline)
    })
}

/// Shoelace area, positive for counter-clockwise loops
pub fn signed_area(polygon: &[Point2<f64>]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let a = polygon[i];
            let b = polygon[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    fn unit_square() -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_inside_and_outside() {
        let square = unit_square();
        assert!(point_in_polygon(&Point2::new(0.5, 0.5), &square));
        assert!(!point_in_polygon(&Point2::new(1.5, 0.5), &square));
        assert!(!point_in_polygon(&Point2::new(0.5, -0.1), &square));
    }

    #[test]
    fn test_winding_does_not_matter() {
        let mut square = unit_square();
        square.reverse();
        assert!(point_in_polygon(&Point2::new(0.25, 0.75), &square));
    }

    #[test]
    fn test_half_open_rule_on_horizontal_boundaries() {
        let square = unit_square();
        // Bottom edge is excluded, top edge is included
        assert!(!point_in_polygon(&Point2::new(0.5, 0.0), &square));
        assert!(point_in_polygon(&Point2::new(0.5, 1.0), &square));
    }

    #[test]
    fn test_ray_through_vertex_is_counted_once() {
        let diamond = vec![
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(point_in_polygon(&Point2::new(1.0, 1.0), &diamond));
        assert!(!point_in_polygon(&Point2::new(-1.0, 1.0), &diamond));
    }

    #[test]
    fn test_degenerate_polygon() {
        let line = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)];
        assert!(!point_in_polygon(&Point2::new(0.5, 0.5), &line));
    }

    #[test]
    fn test_point_in_solid_respects_plane_tolerance() {
        let solid = Primitive::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0))
            .to_solid("slab", None);
        assert!(point_in_solid(&Point3::new(0.5, 0.5, 0.05), &solid, 0.1));
        assert!(!point_in_solid(&Point3::new(0.5, 0.5, 0.5), &solid, 0.1));
    }

    #[test]
    fn test_signed_area() {
        let mut square = unit_square();
        assert_eq!(signed_area(&square), 1.0);
        square.reverse();
        assert_eq!(signed_area(&square), -1.0);
    }
}
