// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boundary module - exterior edges, orientation and the segment registry

mod assign;
mod extractor;
mod orientation;
mod registry;
mod segment;

pub use assign::{assign_edges, assign_external_edges, AssignReport};
pub use extractor::extract_external_edges;
pub use orientation::{Orientation, OrientationClassifier};
pub use registry::{Segment, SegmentGroup, SegmentId, SegmentRef, SegmentRegistry};
pub use segment::{
    types_collide, ConditionParams, DirectedSegment, GroupKey, SegmentType, GROUP_PREFIX,
};
