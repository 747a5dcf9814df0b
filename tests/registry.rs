// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Segment registry rules exercised through a scene

use anyhow::Result;
use nalgebra::{Point2, Point3};
use thermbridge::boundary::{DirectedSegment, GroupKey, SegmentRegistry, SegmentType};
use thermbridge::error::RegistryError;
use thermbridge::geometry::Primitive;
use thermbridge::{MemoryScene, ThermConfig};

fn segment(x1: f64, y1: f64, x2: f64, y2: f64) -> DirectedSegment {
    DirectedSegment::new(Point3::new(x1, y1, 0.0), Point3::new(x2, y2, 0.0))
}

fn two_squares() -> MemoryScene {
    let mut scene = MemoryScene::new();
    scene.add_solid(
        Primitive::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)).to_solid("wall", Some("Concrete")),
    );
    scene.add_solid(
        Primitive::rectangle(Point2::new(1.0, 0.0), Point2::new(2.0, 1.0)).to_solid("insulation", Some("EPS")),
    );
    scene
}

#[test]
fn test_exclusive_types_collide_at_the_same_location() -> Result<()> {
    let mut registry = SegmentRegistry::default();
    registry.add_segment(segment(0.0, 0.0, 1.0, 0.0), GroupKey::internal(20.0, 0.13))?;

    let result = registry.add_segment(segment(1.0, 0.0, 0.0, 0.0), GroupKey::adiabatic());
    assert_eq!(result, Err(RegistryError::TypeCollision(SegmentType::Internal)));

    let result = registry.add_segment(segment(0.0005, 0.0, 1.0, 0.0), GroupKey::external(-10.0, 0.04));
    assert_eq!(result, Err(RegistryError::TypeCollision(SegmentType::Internal)));

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.group_count(), 1);
    Ok(())
}

#[test]
fn test_same_kind_is_a_duplicate() -> Result<()> {
    let mut registry = SegmentRegistry::default();
    registry.add_segment(segment(0.0, 0.0, 1.0, 0.0), GroupKey::internal(20.0, 0.13))?;

    let result = registry.add_segment(segment(0.0, 0.0, 1.0, 0.0), GroupKey::internal(18.0, 0.25));
    assert_eq!(result, Err(RegistryError::Duplicate));
    Ok(())
}

#[test]
fn test_ufactor_overlays_any_type() -> Result<()> {
    let mut registry = SegmentRegistry::default();
    let location = segment(0.0, 0.0, 1.0, 0.0);
    registry.add_segment(location, GroupKey::adiabatic())?;
    registry.add_segment(location, GroupKey::ufactor("Frame"))?;
    registry.add_segment(location, GroupKey::ufactor("Frame"))?;
    registry.add_segment(location, GroupKey::ufactor("Sill"))?;

    let occupants = registry.segments_at(&location.end, &location.start);
    assert_eq!(occupants.len(), 4);

    let ufactors = registry.find_segments_by_type(|kind| matches!(kind, SegmentType::UFactor(_)));
    assert_eq!(ufactors.len(), 3);

    // A UFactor never blocks an exclusive type elsewhere
    registry.add_segment(segment(5.0, 0.0, 6.0, 0.0), GroupKey::ufactor("Frame"))?;
    registry.add_segment(segment(5.0, 0.0, 6.0, 0.0), GroupKey::internal(20.0, 0.13))?;
    Ok(())
}

#[test]
fn test_scene_assignment_skips_conflicts() -> Result<()> {
    let config = ThermConfig::default();
    let mut scene = two_squares();

    let bottom = [(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0))];
    let report = scene.assign(&bottom, &GroupKey::internal(20.0, 0.13), &config);
    assert_eq!(report.created_count(), 1);

    let report = scene.assign_external(&GroupKey::adiabatic(), &config);
    assert_eq!(report.created_count(), 5);
    assert_eq!(report.collisions, vec![SegmentType::Internal]);

    let report = scene.assign_external(&GroupKey::adiabatic(), &config);
    assert_eq!(report.created_count(), 0);
    assert_eq!(report.duplicates, 5);
    assert_eq!(report.collisions.len(), 1);

    assert_eq!(scene.registry.len(), 6);
    Ok(())
}

#[test]
fn test_groups_follow_export_order() -> Result<()> {
    let mut registry = SegmentRegistry::default();
    registry.add_segment(segment(0.0, 0.0, 1.0, 0.0), GroupKey::ufactor("Frame"))?;
    registry.add_segment(segment(0.0, 1.0, 1.0, 1.0), GroupKey::adiabatic())?;
    registry.add_segment(segment(0.0, 2.0, 1.0, 2.0), GroupKey::external(-20.0, 0.04))?;
    registry.add_segment(segment(0.0, 3.0, 1.0, 3.0), GroupKey::internal(20.0, 0.13))?;

    let names: Vec<&str> = registry.groups().map(|group| group.name()).collect();
    assert_eq!(
        names,
        vec![
            "THERM_Ti=20.0_Rsi=0.130",
            "THERM_Te=-20.0_Rse=0.040",
            "THERM_Adiabatic",
            "THERM_UFactor_Frame",
        ]
    );
    Ok(())
}

#[test]
fn test_deleted_group_frees_its_locations() -> Result<()> {
    let mut registry = SegmentRegistry::default();
    let location = segment(0.0, 0.0, 1.0, 0.0);
    registry.add_segment(location, GroupKey::adiabatic())?;

    let removed = registry.delete_group("THERM_Adiabatic")?;
    assert_eq!(removed.len(), 1);
    assert!(registry.is_empty());
    assert!(registry.segments_at(&location.start, &location.end).is_empty());

    registry.add_segment(location, GroupKey::internal(20.0, 0.13))?;
    assert!(matches!(
        registry.delete_group("THERM_Adiabatic"),
        Err(RegistryError::GroupNotFound(_))
    ));
    Ok(())
}

#[test]
fn test_registry_survives_scene_persistence() -> Result<()> {
    let config = ThermConfig::default();
    let mut scene = two_squares();
    scene.assign_external(&GroupKey::external(-20.0, 0.04), &config);

    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("scene.json");
    scene.save(&path)?;
    let mut loaded = MemoryScene::load(&path)?;

    assert_eq!(loaded.registry.len(), 6);
    let result = loaded
        .registry
        .add_segment(segment(0.0, 0.0, 1.0, 0.0), GroupKey::adiabatic());
    assert_eq!(result, Err(RegistryError::TypeCollision(SegmentType::External)));
    Ok(())
}
