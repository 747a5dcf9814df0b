// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Axis-aligned mesh extents

use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box of a solid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshExtent {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl MeshExtent {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
        let mut extent = Self::empty();
        for point in points {
            extent.expand_to_include(point);
        }
        extent
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);

        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    pub fn center(&self) -> Point3<f64> {
        Point3::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    pub fn size(&self) -> Vector3<f64> {
        Vector3::new(
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        )
    }

    /// The four plan-view corners, counter-clockwise from `min`
    pub fn plan_corners(&self) -> [Point2<f64>; 4] {
        [
            Point2::new(self.min.x, self.min.y),
            Point2::new(self.max.x, self.min.y),
            Point2::new(self.max.x, self.max.y),
            Point2::new(self.min.x, self.max.y),
        ]
    }

    /// Check if two extents are approximately equal within tolerance
    pub fn approx_eq(&self, other: &MeshExtent, tolerance: f64) -> bool {
        (self.min - other.min).abs().max() < tolerance
            && (self.max - other.max).abs().max() < tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_from_points() {
        let points = [Point3::new(1.0, 2.0, 3.0), Point3::new(-1.0, -2.0, -3.0)];
        let extent = MeshExtent::from_points(points.iter());

        assert_eq!(extent.min, Point3::new(-1.0, -2.0, -3.0));
        assert_eq!(extent.max, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(extent.center(), Point3::new(0.0, 0.0, 0.0));
        assert!(!extent.is_empty());
    }

    #[test]
    fn test_empty_extent() {
        let extent = MeshExtent::from_points(std::iter::empty());
        assert!(extent.is_empty());
    }

    #[test]
    fn test_plan_corners() {
        let extent = MeshExtent::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 1.0, 0.0));
        let corners = extent.plan_corners();
        assert_eq!(corners[0], Point2::new(0.0, 0.0));
        assert_eq!(corners[2], Point2::new(2.0, 1.0));
    }
}
