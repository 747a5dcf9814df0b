// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Plan-section primitives generator

use super::{Face, Solid};
use nalgebra::{Point2, Point3};

/// Weld distance used when generating primitives
const WELD_EPSILON: f64 = 1e-9;

/// Planar primitives lying in the XY plane at a given height
pub enum Primitive {
    Rectangle { min: Point2<f64>, max: Point2<f64> },
    /// `columns × rows` grid of equal cells filling a rectangle
    Grid {
        min: Point2<f64>,
        max: Point2<f64>,
        columns: usize,
        rows: usize,
    },
    Polygon(Vec<Point2<f64>>),
}

impl Primitive {
    pub fn rectangle(min: Point2<f64>, max: Point2<f64>) -> Self {
        Self::Rectangle { min, max }
    }

    pub fn grid(min: Point2<f64>, max: Point2<f64>, columns: usize, rows: usize) -> Self {
        Self::Grid {
            min,
            max,
            columns: columns.max(1),
            rows: rows.max(1),
        }
    }

    pub fn polygon(points: Vec<Point2<f64>>) -> Self {
        Self::Polygon(points)
    }

    /// Build a solid at `z = 0`
    pub fn to_solid(&self, name: &str, material: Option<&str>) -> Solid {
        self.to_solid_at(name, material, 0.0)
    }

    pub fn to_solid_at(&self, name: &str, material: Option<&str>, z: f64) -> Solid {
        let loops = match self {
            Self::Rectangle { min, max } => vec![rectangle_loop(*min, *max, z)],
            Self::Grid {
                min,
                max,
                columns,
                rows,
            } => grid_loops(*min, *max, *columns, *rows, z),
            Self::Polygon(points) => vec![points.iter().map(|p| Point3::new(p.x, p.y, z)).collect()],
        };
        Solid::from_loops(name, &loops, material, WELD_EPSILON)
    }
}

fn rectangle_loop(min: Point2<f64>, max: Point2<f64>, z: f64) -> Vec<Point3<f64>> {
    vec![
        Point3::new(min.x, min.y, z),
        Point3::new(max.x, min.y, z),
        Point3::new(max.x, max.y, z),
        Point3::new(min.x, max.y, z),
    ]
}

fn grid_loops(
    min: Point2<f64>,
    max: Point2<f64>,
    columns: usize,
    rows: usize,
    z: f64,
) -> Vec<Vec<Point3<f64>>> {
    let step_x = (max.x - min.x) / columns as f64;
    let step_y = (max.y - min.y) / rows as f64;
    let mut loops = Vec::with_capacity(columns * rows);

    for row in 0..rows {
        for column in 0..columns {
            let cell_min = Point2::new(min.x + column as f64 * step_x, min.y + row as f64 * step_y);
            let cell_max = Point2::new(cell_min.x + step_x, cell_min.y + step_y);
            loops.push(rectangle_loop(cell_min, cell_max, z));
        }
    }

    loops
}

/// Single-face solid from an explicit loop, with one material slot
pub fn single_face(name: &str, points: Vec<Point3<f64>>, material: &str) -> Solid {
    let mut solid = Solid::new(name).with_material(material);
    let indices = points.into_iter().map(|p| solid.add_vertex(p)).collect();
    solid.add_face(Face::new(indices));
    solid
}
