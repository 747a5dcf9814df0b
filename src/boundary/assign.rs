// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Extract → orient → register passes

use super::{
    extract_external_edges, GroupKey, Orientation, OrientationClassifier, SegmentId,
    SegmentRegistry, SegmentType,
};
use crate::config::ThermConfig;
use crate::error::RegistryError;
use crate::geometry::Solid;
use nalgebra::Point3;
use serde::Serialize;

/// Outcome of one assignment pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssignReport {
    pub created: Vec<SegmentId>,
    pub duplicates: usize,
    /// Type already present at each rejected location
    pub collisions: Vec<SegmentType>,
    /// Edges with no plan-view direction
    pub degenerate: usize,
    pub reversed: usize,
    /// Edges where neither side probed as material
    pub ambiguous: usize,
}

impl AssignReport {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.duplicates + self.collisions.len() + self.degenerate
    }

    pub fn merge(&mut self, other: AssignReport) {
        self.created.extend(other.created);
        self.duplicates += other.duplicates;
        self.collisions.extend(other.collisions);
        self.degenerate += other.degenerate;
        self.reversed += other.reversed;
        self.ambiguous += other.ambiguous;
    }
}

/// Register the true exterior edges of `selected` under `key`.
///
/// Seams between selected solids cancel out. Orientation probes against
/// `probe_solids`, normally every solid in the scene.
pub fn assign_external_edges(
    selected: &[&Solid],
    probe_solids: &[&Solid],
    registry: &mut SegmentRegistry,
    key: &GroupKey,
    config: &ThermConfig,
) -> AssignReport {
    let edges: Vec<(Point3<f64>, Point3<f64>)> = extract_external_edges(selected, config.edge_tolerance)
        .into_iter()
        .map(|edge| (edge.start, edge.end))
        .collect();

    assign_edges(&edges, probe_solids, registry, key, config)
}

/// Orient and register a caller-chosen list of edges under `key`
pub fn assign_edges(
    edges: &[(Point3<f64>, Point3<f64>)],
    probe_solids: &[&Solid],
    registry: &mut SegmentRegistry,
    key: &GroupKey,
    config: &ThermConfig,
) -> AssignReport {
    let classifier = OrientationClassifier::from_config(probe_solids, config);
    let mut report = AssignReport::default();

    for (v1, v2) in edges {
        let (segment, orientation) = match classifier.orient(*v1, *v2) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(?v1, ?v2, "skipping edge: {err}");
                report.degenerate += 1;
                continue;
            }
        };

        match orientation {
            Orientation::Reversed => report.reversed += 1,
            Orientation::Ambiguous => report.ambiguous += 1,
            Orientation::Kept => {}
        }

        match registry.add_segment(segment, key.clone()) {
            Ok(id) => report.created.push(id),
            Err(RegistryError::Duplicate) => report.duplicates += 1,
            Err(RegistryError::TypeCollision(existing)) => {
                tracing::warn!(group = %key, %existing, "skipping edge: type collision");
                report.collisions.push(existing);
            }
            Err(err) => tracing::warn!("skipping edge: {err}"),
        }
    }

    tracing::info!(
        group = %key,
        created = report.created_count(),
        duplicates = report.duplicates,
        collisions = report.collisions.len(),
        degenerate = report.degenerate,
        "assignment pass finished"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::Point2;

    fn squares() -> (Solid, Solid) {
        (
            Primitive::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)).to_solid("a", None),
            Primitive::rectangle(Point2::new(1.0, 0.0), Point2::new(2.0, 1.0)).to_solid("b", None),
        )
    }

    #[test]
    fn test_assign_external_edges() {
        let (a, b) = squares();
        let solids = [&a, &b];
        let mut registry = SegmentRegistry::new(0.001);
        let config = ThermConfig::default();

        let report = assign_external_edges(&solids, &solids, &mut registry, &GroupKey::adiabatic(), &config);
        assert_eq!(report.created_count(), 6);
        assert_eq!(report.skipped_count(), 0);

        // Second pass adds nothing
        let again = assign_external_edges(&solids, &solids, &mut registry, &GroupKey::adiabatic(), &config);
        assert_eq!(again.duplicates, 6);
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn test_segments_keep_material_on_left() {
        let (a, _) = squares();
        let solids = [&a];
        let mut registry = SegmentRegistry::new(0.001);
        let config = ThermConfig::default();

        assign_external_edges(&solids, &solids, &mut registry, &GroupKey::adiabatic(), &config);
        for found in registry.find_segments_by_type(|_| true) {
            let segment = found.segment.segment;
            let direction = segment.plan_direction();
            let mid = segment.midpoint();
            let probe = Point2::new(mid.x - direction.y * 0.1, mid.y + direction.x * 0.1);
            assert!(probe.x > 0.0 && probe.x < 1.0 && probe.y > 0.0 && probe.y < 1.0);
        }
    }

    #[test]
    fn test_collisions_are_counted() {
        let (a, _) = squares();
        let solids = [&a];
        let mut registry = SegmentRegistry::new(0.001);
        let config = ThermConfig::default();
        assign_external_edges(&solids, &solids, &mut registry, &GroupKey::internal(20.0, 0.13), &config);

        let edges = [(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0))];
        let report = assign_edges(&edges, &solids, &mut registry, &GroupKey::external(-20.0, 0.04), &config);
        assert_eq!(report.collisions, vec![SegmentType::Internal]);
        assert!(report.created.is_empty());
    }

    #[test]
    fn test_degenerate_edge_does_not_abort() {
        let (a, _) = squares();
        let solids = [&a];
        let mut registry = SegmentRegistry::new(0.001);
        let edges = [
            (Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.0)),
            (Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)),
        ];

        let report = assign_edges(&edges, &solids, &mut registry, &GroupKey::adiabatic(), &ThermConfig::default());
        assert_eq!(report.degenerate, 1);
        assert_eq!(report.created_count(), 1);
    }
}
