// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boundary segment registry
//!
//! Single source of truth for the boundary conditions of a model. Segments
//! live in groups keyed by [`GroupKey`]; a location index over quantized
//! endpoint cells enforces the duplicate and collision rules across groups.

use super::{types_collide, DirectedSegment, GroupKey, SegmentType};
use crate::config::ThermConfig;
use crate::error::RegistryError;
use crate::utils::math::endpoints_match;
use ahash::AHashMap;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Registry-wide segment identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u64);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored boundary segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    /// Sequential name within the group, e.g. `Ti=20.0_Rsi=0.130_3`
    pub name: String,
    pub segment: DirectedSegment,
}

/// Named collection of segments sharing one type and parameter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentGroup {
    key: GroupKey,
    name: String,
    segments: Vec<Segment>,
    next_index: usize,
}

impl SegmentGroup {
    fn new(key: GroupKey) -> Self {
        Self {
            name: key.label(),
            key,
            segments: Vec::new(),
            next_index: 1,
        }
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    /// Display label, e.g. `THERM_Adiabatic`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segment_type(&self) -> SegmentType {
        self.key.segment_type()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    fn push(&mut self, id: SegmentId, segment: DirectedSegment) {
        let name = format!("{}_{}", self.key.short_label(), self.next_index);
        self.next_index += 1;
        self.segments.push(Segment { id, name, segment });
    }
}

/// A segment together with the group that owns it
#[derive(Debug, Clone, Copy)]
pub struct SegmentRef<'a> {
    pub group: &'a SegmentGroup,
    pub segment: &'a Segment,
}

impl SegmentRef<'_> {
    pub fn segment_type(&self) -> SegmentType {
        self.group.segment_type()
    }
}

type Cell = (i64, i64, i64);

/// Deduplicating, collision-checking store of boundary segments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RegistrySnapshot", into = "RegistrySnapshot")]
pub struct SegmentRegistry {
    tolerance: f64,
    groups: BTreeMap<GroupKey, SegmentGroup>,
    next_id: u64,
    /// Endpoint cell -> segments with an endpoint in that cell
    locations: AHashMap<Cell, Vec<SegmentId>>,
    owners: AHashMap<SegmentId, GroupKey>,
}

impl Default for SegmentRegistry {
    fn default() -> Self {
        Self::new(ThermConfig::default().edge_tolerance)
    }
}

impl SegmentRegistry {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.max(f64::EPSILON),
            groups: BTreeMap::new(),
            next_id: 1,
            locations: AHashMap::new(),
            owners: AHashMap::new(),
        }
    }

    pub fn from_config(config: &ThermConfig) -> Self {
        Self::new(config.edge_tolerance)
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Add a segment to the group identified by `key`.
    ///
    /// Rejects with [`RegistryError::TypeCollision`] when an exclusive segment
    /// of another kind already occupies the location, and with
    /// [`RegistryError::Duplicate`] when one of the same kind does. UFactor
    /// segments are never rejected. A rejected call leaves the registry as it was.
    pub fn add_segment(
        &mut self,
        segment: DirectedSegment,
        key: GroupKey,
    ) -> Result<SegmentId, RegistryError> {
        self.check(&segment, &key.segment_type())?;

        let id = SegmentId(self.next_id);
        self.next_id += 1;

        let group = self
            .groups
            .entry(key.clone())
            .or_insert_with(|| SegmentGroup::new(key.clone()));
        group.push(id, segment);
        tracing::debug!(id = id.0, group = %group.name(), "registered segment");

        self.index(id, &segment, key);
        Ok(id)
    }

    /// Whether a segment of `segment_type` could be added at this location
    pub fn check(
        &self,
        segment: &DirectedSegment,
        segment_type: &SegmentType,
    ) -> Result<(), RegistryError> {
        let occupants = self.segments_at(&segment.start, &segment.end);

        if let Some(conflict) = occupants
            .iter()
            .map(SegmentRef::segment_type)
            .find(|existing| types_collide(segment_type, existing))
        {
            return Err(RegistryError::TypeCollision(conflict));
        }

        if segment_type.is_exclusive()
            && occupants
                .iter()
                .any(|found| found.segment_type().same_kind(segment_type))
        {
            return Err(RegistryError::Duplicate);
        }

        Ok(())
    }

    /// Segments whose endpoints match `(a, b)` in either order, by id
    pub fn segments_at(&self, a: &Point3<f64>, b: &Point3<f64>) -> Vec<SegmentRef<'_>> {
        let (cx, cy, cz) = self.cell(a);
        let mut candidates = BTreeSet::new();

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(ids) = self.locations.get(&(cx + dx, cy + dy, cz + dz)) {
                        candidates.extend(ids.iter().copied());
                    }
                }
            }
        }

        candidates
            .into_iter()
            .filter_map(|id| self.segment(id))
            .filter(|found| {
                let stored = &found.segment.segment;
                endpoints_match(a, b, &stored.start, &stored.end, self.tolerance)
            })
            .collect()
    }

    /// Groups in key order: Internal, External, Adiabatic, then UFactor
    pub fn groups(&self) -> impl Iterator<Item = &SegmentGroup> {
        self.groups.values()
    }

    pub fn list_groups(&self) -> Vec<&SegmentGroup> {
        self.groups().collect()
    }

    pub fn group(&self, key: &GroupKey) -> Option<&SegmentGroup> {
        self.groups.get(key)
    }

    pub fn group_by_name(&self, name: &str) -> Option<&SegmentGroup> {
        self.groups().find(|group| group.name() == name)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Remove a group and every segment in it
    pub fn delete_group(&mut self, name: &str) -> Result<SegmentGroup, RegistryError> {
        let key = self
            .group_by_name(name)
            .map(|group| group.key().clone())
            .ok_or_else(|| RegistryError::GroupNotFound(name.to_string()))?;

        self.remove_group(&key)
            .ok_or_else(|| RegistryError::GroupNotFound(name.to_string()))
    }

    pub fn remove_group(&mut self, key: &GroupKey) -> Option<SegmentGroup> {
        let group = self.groups.remove(key)?;
        for segment in group.segments() {
            self.unindex(segment);
        }
        tracing::info!(group = %group.name(), segments = group.len(), "deleted segment group");
        Some(group)
    }

    /// All segments whose type satisfies `predicate`, in group order
    pub fn find_segments_by_type<F>(&self, predicate: F) -> Vec<SegmentRef<'_>>
    where
        F: Fn(&SegmentType) -> bool,
    {
        self.groups()
            .filter(|group| predicate(&group.segment_type()))
            .flat_map(|group| {
                group
                    .segments()
                    .iter()
                    .map(move |segment| SegmentRef { group, segment })
            })
            .collect()
    }

    pub fn segment(&self, id: SegmentId) -> Option<SegmentRef<'_>> {
        let group = self.groups.get(self.owners.get(&id)?)?;
        let segment = group.segments().iter().find(|segment| segment.id == id)?;
        Some(SegmentRef { group, segment })
    }

    /// Remove a single segment; its group stays, possibly empty
    pub fn remove_segment(&mut self, id: SegmentId) -> Result<Segment, RegistryError> {
        let key = self
            .owners
            .get(&id)
            .cloned()
            .ok_or(RegistryError::SegmentNotFound(id.0))?;
        let group = self
            .groups
            .get_mut(&key)
            .ok_or(RegistryError::SegmentNotFound(id.0))?;
        let position = group
            .segments
            .iter()
            .position(|segment| segment.id == id)
            .ok_or(RegistryError::SegmentNotFound(id.0))?;

        let removed = group.segments.remove(position);
        self.unindex(&removed);
        Ok(removed)
    }

    /// Total number of segments across all groups
    pub fn len(&self) -> usize {
        self.groups.values().map(SegmentGroup::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell(&self, point: &Point3<f64>) -> Cell {
        (
            (point.x / self.tolerance).floor() as i64,
            (point.y / self.tolerance).floor() as i64,
            (point.z / self.tolerance).floor() as i64,
        )
    }

    fn index(&mut self, id: SegmentId, segment: &DirectedSegment, key: GroupKey) {
        let start = self.cell(&segment.start);
        let end = self.cell(&segment.end);
        self.locations.entry(start).or_default().push(id);
        if end != start {
            self.locations.entry(end).or_default().push(id);
        }
        self.owners.insert(id, key);
    }

    fn unindex(&mut self, segment: &Segment) {
        for point in [segment.segment.start, segment.segment.end] {
            let cell = self.cell(&point);
            if let Some(ids) = self.locations.get_mut(&cell) {
                ids.retain(|id| *id != segment.id);
                if ids.is_empty() {
                    self.locations.remove(&cell);
                }
            }
        }
        self.owners.remove(&segment.id);
    }
}

/// On-disk form; the location index is rebuilt on load
#[derive(Serialize, Deserialize)]
struct RegistrySnapshot {
    tolerance: f64,
    next_id: u64,
    groups: Vec<SegmentGroup>,
}

impl From<SegmentRegistry> for RegistrySnapshot {
    fn from(registry: SegmentRegistry) -> Self {
        Self {
            tolerance: registry.tolerance,
            next_id: registry.next_id,
            groups: registry.groups.into_values().collect(),
        }
    }
}

impl From<RegistrySnapshot> for SegmentRegistry {
    fn from(snapshot: RegistrySnapshot) -> Self {
        let mut registry = SegmentRegistry::new(snapshot.tolerance);

        for group in snapshot.groups {
            for segment in group.segments() {
                registry.index(segment.id, &segment.segment, group.key().clone());
                registry.next_id = registry.next_id.max(segment.id.0 + 1);
            }
            registry.groups.insert(group.key().clone(), group);
        }
        registry.next_id = registry.next_id.max(snapshot.next_id);

        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> DirectedSegment {
        DirectedSegment::new(Point3::new(x0, y0, 0.0), Point3::new(x1, y1, 0.0))
    }

    #[test]
    fn test_add_creates_group_and_names_sequentially() {
        let mut registry = SegmentRegistry::new(0.001);
        let key = GroupKey::internal(20.0, 0.13);

        registry.add_segment(seg(0.0, 0.0, 1.0, 0.0), key.clone()).unwrap();
        registry.add_segment(seg(1.0, 0.0, 1.0, 1.0), key.clone()).unwrap();

        let group = registry.group(&key).unwrap();
        assert_eq!(group.name(), "THERM_Ti=20.0_Rsi=0.130");
        assert_eq!(group.segments()[0].name, "Ti=20.0_Rsi=0.130_1");
        assert_eq!(group.segments()[1].name, "Ti=20.0_Rsi=0.130_2");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_is_rejected_in_either_direction() {
        let mut registry = SegmentRegistry::new(0.001);
        registry
            .add_segment(seg(0.0, 0.0, 1.0, 0.0), GroupKey::adiabatic())
            .unwrap();

        let result = registry.add_segment(seg(1.0, 0.0, 0.0005, 0.0), GroupKey::adiabatic());
        assert_eq!(result, Err(RegistryError::Duplicate));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_collision_does_not_mutate() {
        let mut registry = SegmentRegistry::new(0.001);
        registry
            .add_segment(seg(0.0, 0.0, 1.0, 0.0), GroupKey::internal(20.0, 0.13))
            .unwrap();

        let result = registry.add_segment(seg(0.0, 0.0, 1.0, 0.0), GroupKey::external(-20.0, 0.04));
        assert_eq!(result, Err(RegistryError::TypeCollision(SegmentType::Internal)));
        assert_eq!(registry.group_count(), 1);
        assert!(registry.group(&GroupKey::external(-20.0, 0.04)).is_none());
    }

    #[test]
    fn test_ufactor_layers_on_existing_location() {
        let mut registry = SegmentRegistry::new(0.001);
        registry
            .add_segment(seg(0.0, 0.0, 1.0, 0.0), GroupKey::internal(20.0, 0.13))
            .unwrap();
        registry
            .add_segment(seg(0.0, 0.0, 1.0, 0.0), GroupKey::ufactor("Frame"))
            .unwrap();

        let at = registry.segments_at(&Point3::new(0.0, 0.0, 0.0), &Point3::new(1.0, 0.0, 0.0));
        assert_eq!(at.len(), 2);
        // An exclusive type still sees only the Internal occupant
        assert_eq!(
            registry.check(&seg(0.0, 0.0, 1.0, 0.0), &SegmentType::Adiabatic),
            Err(RegistryError::TypeCollision(SegmentType::Internal))
        );
    }

    #[test]
    fn test_tolerance_straddles_cell_boundary() {
        let mut registry = SegmentRegistry::new(0.001);
        registry
            .add_segment(seg(0.0009, 0.0, 1.0, 0.0), GroupKey::adiabatic())
            .unwrap();
        assert_eq!(registry.segments_at(&Point3::new(0.0011, 0.0, 0.0), &Point3::new(1.0, 0.0, 0.0)).len(), 1);
    }

    #[test]
    fn test_delete_group_cascades() {
        let mut registry = SegmentRegistry::new(0.001);
        let key = GroupKey::external(-20.0, 0.04);
        registry.add_segment(seg(0.0, 0.0, 1.0, 0.0), key.clone()).unwrap();

        let removed = registry.delete_group("THERM_Te=-20.0_Rse=0.040").unwrap();
        assert_eq!(removed.len(), 1);
        assert!(registry.is_empty());
        assert!(registry.segments_at(&Point3::new(0.0, 0.0, 0.0), &Point3::new(1.0, 0.0, 0.0)).is_empty());

        // The location is free again
        assert!(registry.add_segment(seg(0.0, 0.0, 1.0, 0.0), GroupKey::adiabatic()).is_ok());
        assert_eq!(
            registry.delete_group("THERM_Missing"),
            Err(RegistryError::GroupNotFound("THERM_Missing".to_string()))
        );
    }

    #[test]
    fn test_remove_segment_keeps_group() {
        let mut registry = SegmentRegistry::new(0.001);
        let id = registry
            .add_segment(seg(0.0, 0.0, 1.0, 0.0), GroupKey::adiabatic())
            .unwrap();

        registry.remove_segment(id).unwrap();
        assert_eq!(registry.group_count(), 1);
        assert!(registry.group(&GroupKey::adiabatic()).unwrap().is_empty());
        assert_eq!(registry.remove_segment(id), Err(RegistryError::SegmentNotFound(id.0)));
    }

    #[test]
    fn test_find_by_type() {
        let mut registry = SegmentRegistry::new(0.001);
        registry.add_segment(seg(0.0, 0.0, 1.0, 0.0), GroupKey::internal(20.0, 0.13)).unwrap();
        registry.add_segment(seg(0.0, 1.0, 1.0, 1.0), GroupKey::external(-20.0, 0.04)).unwrap();
        registry.add_segment(seg(0.0, 1.0, 1.0, 1.0), GroupKey::ufactor("U1")).unwrap();

        let ufactors = registry.find_segments_by_type(|t| matches!(t, SegmentType::UFactor(_)));
        assert_eq!(ufactors.len(), 1);
        assert_eq!(registry.find_segments_by_type(SegmentType::is_exclusive).len(), 2);
    }

    #[test]
    fn test_json_roundtrip_rebuilds_index() {
        let mut registry = SegmentRegistry::new(0.001);
        registry.add_segment(seg(0.0, 0.0, 1.0, 0.0), GroupKey::internal(20.0, 0.13)).unwrap();

        let json = serde_json::to_string(&registry).unwrap();
        let mut restored: SegmentRegistry = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.len(), 1);
        assert_eq!(
            restored.add_segment(seg(1.0, 0.0, 0.0, 0.0), GroupKey::adiabatic()),
            Err(RegistryError::TypeCollision(SegmentType::Internal))
        );
        let next = restored.add_segment(seg(5.0, 0.0, 6.0, 0.0), GroupKey::adiabatic()).unwrap();
        assert_eq!(next, SegmentId(2));
    }
}
