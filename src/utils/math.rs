// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::{Point2, Point3};

/// Millimetres per host length unit
pub const MM_PER_UNIT: f64 = 1000.0;

/// Check if two floats are approximately equal
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Euclidean distance test in 3D
pub fn points_coincide(a: &Point3<f64>, b: &Point3<f64>, tolerance: f64) -> bool {
    (a - b).norm() < tolerance
}

/// Per-axis distance test in plan
pub fn points_match_2d(a: &Point2<f64>, b: &Point2<f64>, tolerance: f64) -> bool {
    approx_eq(a.x, b.x, tolerance) && approx_eq(a.y, b.y, tolerance)
}

/// Whether segment (a1, a2) and (b1, b2) share both endpoints in either order
pub fn endpoints_match(
    a1: &Point3<f64>,
    a2: &Point3<f64>,
    b1: &Point3<f64>,
    b2: &Point3<f64>,
    tolerance: f64,
) -> bool {
    (points_coincide(a1, b1, tolerance) && points_coincide(a2, b2, tolerance))
        || (points_coincide(a1, b2, tolerance) && points_coincide(a2, b1, tolerance))
}

/// Round to a number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Host units to millimetres, rounded to 0.01 mm
pub fn to_mm(value: f64) -> f64 {
    round_to(value * MM_PER_UNIT, 2)
}

/// Millimetres to host units
pub fn from_mm(value: f64) -> f64 {
    value / MM_PER_UNIT
}

/// Plan position in millimetres
pub fn plan_mm(point: &Point3<f64>) -> Point2<f64> {
    Point2::new(to_mm(point.x), to_mm(point.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(1.0, 1.0001, 0.001));
        assert!(!approx_eq(1.0, 1.1, 0.001));
    }

    #[test]
    fn test_endpoints_match_either_order() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let b_close = Point3::new(1.0005, 0.0, 0.0);
        assert!(endpoints_match(&a, &b, &a, &b_close, 0.001));
        assert!(endpoints_match(&a, &b, &b_close, &a, 0.001));
        assert!(!endpoints_match(&a, &b, &a, &Point3::new(1.01, 0.0, 0.0), 0.001));
    }

    #[test]
    fn test_unit_conversion() {
        assert_eq!(to_mm(1.23456), 1234.56);
        assert_eq!(to_mm(-0.2), -200.0);
        assert_eq!(from_mm(250.0), 0.25);
    }

    #[test]
    fn test_points_match_2d() {
        let a = Point2::new(100.0, 200.0);
        assert!(points_match_2d(&a, &Point2::new(100.05, 199.95), 0.1));
        assert!(!points_match_2d(&a, &Point2::new(100.2, 200.0), 0.1));
    }
}
