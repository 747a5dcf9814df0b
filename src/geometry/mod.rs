// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - solids, extents and plan-view predicates

mod bbox;
pub mod checks;
pub mod polygon;
mod primitives;
mod solid;
pub mod topology;

pub use bbox::MeshExtent;
pub use polygon::{plan, point_in_polygon, point_in_solid};
pub use primitives::{single_face, Primitive};
pub use solid::{Face, Solid};
pub use topology::{boundary_edges, BoundaryEdge, EdgeKey};
