// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Export to THERM-XML, import again and compare

use anyhow::Result;
use nalgebra::{Point2, Point3};
use thermbridge::boundary::{GroupKey, SegmentType};
use thermbridge::geometry::{Primitive, Solid};
use thermbridge::io::{self, ThermSerializer};
use thermbridge::scene::Material;
use thermbridge::{MemoryScene, ThermConfig};

const MM: f64 = 0.001;

fn section() -> MemoryScene {
    let mut scene = MemoryScene::new();
    scene.add_material(Material::new("Concrete").with_conductivity(2.0).with_color([0.6, 0.6, 0.6]));
    scene.add_solid(
        Primitive::rectangle(Point2::new(0.0, 0.0), Point2::new(0.2, 1.0)).to_solid("wall", Some("Concrete")),
    );
    scene.add_solid(
        Primitive::rectangle(Point2::new(0.2, 0.0), Point2::new(0.35, 1.0)).to_solid("insulation", Some("EPS")),
    );
    scene
}

fn tagged_section(config: &ThermConfig) -> MemoryScene {
    let mut scene = section();
    let inside = [(Point3::new(0.0, 1.0, 0.0), Point3::new(0.0, 0.0, 0.0))];
    let outside = [(Point3::new(0.35, 0.0, 0.0), Point3::new(0.35, 1.0, 0.0))];
    scene.assign(&inside, &GroupKey::internal(20.0, 0.13), config);
    scene.assign(&outside, &GroupKey::external(-10.0, 0.04), config);
    scene.assign(&inside, &GroupKey::ufactor("Wall"), config);
    scene.assign_external(&GroupKey::adiabatic(), config);
    scene
}

fn vertices(solids: &[Solid]) -> Vec<Point3<f64>> {
    solids.iter().flat_map(|solid| solid.vertices.iter().copied()).collect()
}

#[test]
fn test_export_counts() -> Result<()> {
    let config = ThermConfig::default();
    let scene = tagged_section(&config);
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("section.thmx");

    let summary = io::export_therm(&path, &scene, &config)?;

    assert_eq!(summary.polygons, 2);
    assert_eq!(summary.materials, 2);
    // Two tagged sides plus four adiabatic edges; the U-factor rides on the interior side
    assert_eq!(summary.boundaries, 6);
    assert_eq!(summary.unmatched_ufactors, 0);
    assert_eq!(summary.boundary_conditions[0], "Adiabatic");
    assert_eq!(summary.boundary_conditions.len(), 3);

    let xml = std::fs::read_to_string(&path)?;
    assert!(xml.contains("<THERM-XML"));
    assert!(xml.contains("UFactorTag=\"Wall\""));
    Ok(())
}

#[test]
fn test_roundtrip_preserves_geometry_and_conditions() -> Result<()> {
    let config = ThermConfig::default();
    let scene = tagged_section(&config);
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("section.thmx");
    io::export_therm(&path, &scene, &config)?;

    let model = io::import_therm(&path)?;

    assert_eq!(model.solids.iter().map(Solid::face_count).sum::<usize>(), 2);
    assert_eq!(model.skipped_boundaries, 0);
    for original in vertices(&scene.solids) {
        assert!(
            vertices(&model.solids).iter().any(|p| (p - original).norm() < MM),
            "vertex {original:?} lost in round trip"
        );
    }

    let registry = &model.registry;
    assert_eq!(registry.find_segments_by_type(|t| *t == SegmentType::Internal).len(), 1);
    assert_eq!(registry.find_segments_by_type(|t| *t == SegmentType::External).len(), 1);
    assert_eq!(registry.find_segments_by_type(|t| *t == SegmentType::Adiabatic).len(), 4);
    assert_eq!(registry.find_segments_by_type(|t| matches!(t, SegmentType::UFactor(_))).len(), 1);
    assert!(registry.group(&GroupKey::internal(20.0, 0.13)).is_some());
    assert!(registry.group(&GroupKey::external(-10.0, 0.04)).is_some());
    Ok(())
}

#[test]
fn test_reexport_matches_first_export() -> Result<()> {
    let config = ThermConfig::default();
    let serializer = ThermSerializer::new(&config).with_save_date("2025-01-01 00:00:00");
    let (first, first_summary) = serializer.serialize(&tagged_section(&config))?;

    let model = io::deserialize(std::str::from_utf8(&first)?)?;
    let mut reimported = MemoryScene::new();
    let report = reimported.absorb(model);
    assert_eq!(report.skipped_count(), 0);

    let (second, second_summary) = serializer.serialize(&reimported)?;
    assert_eq!(second_summary.polygons, first_summary.polygons);
    assert_eq!(second_summary.boundaries, first_summary.boundaries);
    assert_eq!(second_summary.boundary_conditions, first_summary.boundary_conditions);

    let again = io::deserialize(std::str::from_utf8(&second)?)?;
    assert_eq!(again.registry.len(), reimported.registry.len());
    Ok(())
}

#[test]
fn test_unmatched_ufactor_is_written_as_adiabatic() -> Result<()> {
    let config = ThermConfig::default();
    let mut scene = section();
    let edge = [(Point3::new(0.0, 0.0, 0.0), Point3::new(0.2, 0.0, 0.0))];
    scene.assign(&edge, &GroupKey::ufactor("Base"), &config);

    let (_, summary) = ThermSerializer::new(&config).serialize(&scene)?;

    assert_eq!(summary.boundaries, 1);
    assert_eq!(summary.unmatched_ufactors, 1);
    Ok(())
}

#[test]
fn test_failed_export_leaves_no_file() -> Result<()> {
    let config = ThermConfig::default();
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("empty.thmx");

    assert!(io::export_therm(&path, &MemoryScene::new(), &config).is_err());
    assert!(!path.exists());
    Ok(())
}

/// Import `input` and merge it into the scene file, as `thermbridge import --scene` does
fn import_into(scene_path: &std::path::Path, input: &std::path::Path) -> Result<usize> {
    let model = io::import_therm(input)?;
    let mut scene = MemoryScene::load(scene_path)?;
    let report = scene.absorb(model);
    scene.save(scene_path)?;
    Ok(report.created_count())
}

#[test]
fn test_truncated_import_leaves_scene_untouched() -> Result<()> {
    let config = ThermConfig::default();
    let dir = tempfile::TempDir::new()?;
    let scene_path = dir.path().join("scene.json");
    let export_path = dir.path().join("section.thmx");
    let truncated_path = dir.path().join("truncated.thmx");

    let scene = tagged_section(&config);
    scene.save(&scene_path)?;
    io::export_therm(&export_path, &scene, &config)?;

    // Cut the file inside the second polygon, after its third point
    let xml = std::fs::read_to_string(&export_path)?;
    let second = xml.find("<Polygon ID=\"2\"").ok_or_else(|| anyhow::anyhow!("second polygon missing"))?;
    let third_point = xml[second..]
        .match_indices("<Point ")
        .nth(2)
        .map(|(offset, _)| second + offset)
        .ok_or_else(|| anyhow::anyhow!("third point missing"))?;
    let cut = third_point + xml[third_point..].find("/>").unwrap_or(0) + 2;
    std::fs::write(&truncated_path, &xml[..cut])?;

    let before = std::fs::read_to_string(&scene_path)?;
    assert!(io::import_therm(&truncated_path).is_err());
    assert!(import_into(&scene_path, &truncated_path).is_err());
    assert_eq!(std::fs::read_to_string(&scene_path)?, before);

    let reloaded = MemoryScene::load(&scene_path)?;
    assert_eq!(reloaded.solids.len(), scene.solids.len());
    assert_eq!(reloaded.registry.len(), scene.registry.len());

    // The complete file still merges
    let fresh = dir.path().join("fresh.json");
    MemoryScene::new().save(&fresh)?;
    assert_eq!(import_into(&fresh, &export_path)?, scene.registry.len());
    Ok(())
}
