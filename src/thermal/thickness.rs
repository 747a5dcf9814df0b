// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Layer thickness from a bounding box

use crate::error::GeometryError;
use crate::geometry::MeshExtent;
use nalgebra::Vector2;

const MIN_DIRECTION_LENGTH: f64 = 1e-12;

/// Width of `extent` across `direction`, measured in plan.
///
/// The four plan corners of the box are projected onto the unit normal of
/// `direction`; the thickness is the spread of those projections. An empty
/// extent has zero thickness.
pub fn estimate_thickness(extent: &MeshExtent, direction: &Vector2<f64>) -> Result<f64, GeometryError> {
    let length = direction.norm();
    if length < MIN_DIRECTION_LENGTH {
        return Err(GeometryError::ZeroDirection);
    }
    if extent.is_empty() {
        return Ok(0.0);
    }

    let normal = Vector2::new(-direction.y, direction.x) / length;
    let (min, max) = extent
        .plan_corners()
        .iter()
        .map(|corner| corner.coords.dot(&normal))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), value| {
            (lo.min(value), hi.max(value))
        });

    Ok(max - min)
}
