// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene access
//!
//! The core never reaches into global state: solids, materials and the
//! segment registry are handed over through [`SceneRepository`].
//! [`MemoryScene`] is the in-process implementation, persisted as JSON.

mod material;

pub use material::{lookup_conductivity, rgb_hex, Lookup, LookupSource, Material, DEFAULT_COLOR};

use crate::boundary::{assign_edges, assign_external_edges, AssignReport, GroupKey, SegmentRegistry};
use crate::config::ThermConfig;
use crate::geometry::checks::{preflight, PreflightReport};
use crate::geometry::Solid;
use crate::io::ImportedModel;
use anyhow::{Context, Result};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Read access to the host scene
pub trait SceneRepository {
    /// Every solid, in scene order
    fn solids(&self) -> Vec<&Solid>;

    /// The solids an operation should act on
    fn selected_solids(&self) -> Vec<&Solid>;

    fn material(&self, name: &str) -> Option<&Material>;

    fn registry(&self) -> &SegmentRegistry;

    fn solid(&self, name: &str) -> Option<&Solid> {
        self.solids().into_iter().find(|solid| solid.name == name)
    }
}

/// Serde-backed scene held in memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryScene {
    #[serde(default)]
    pub solids: Vec<Solid>,
    #[serde(default)]
    pub materials: Vec<Material>,
    /// Selected solid names; empty selects everything
    #[serde(default)]
    pub selection: Vec<String>,
    #[serde(default)]
    pub registry: SegmentRegistry,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: SegmentRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// Load a scene from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene file: {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse scene file: {:?}", path))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).context("Failed to serialize scene")?;
        std::fs::write(path, content).with_context(|| format!("Failed to write scene file: {:?}", path))
    }

    pub fn add_solid(&mut self, solid: Solid) {
        self.solids.push(solid);
    }

    /// Insert a material, replacing one with the same name
    pub fn add_material(&mut self, material: Material) {
        match self.materials.iter_mut().find(|m| m.name == material.name) {
            Some(existing) => *existing = material,
            None => self.materials.push(material),
        }
    }

    pub fn select<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection = names.into_iter().map(Into::into).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Assign the exterior edges of the selection to `key`
    pub fn assign_external(&mut self, key: &GroupKey, config: &ThermConfig) -> AssignReport {
        let selected = select(&self.solids, &self.selection);
        let all: Vec<&Solid> = self.solids.iter().collect();
        assign_external_edges(&selected, &all, &mut self.registry, key, config)
    }

    /// Assign explicit edges to `key`, probing against every solid
    pub fn assign(
        &mut self,
        edges: &[(Point3<f64>, Point3<f64>)],
        key: &GroupKey,
        config: &ThermConfig,
    ) -> AssignReport {
        let all: Vec<&Solid> = self.solids.iter().collect();
        assign_edges(edges, &all, &mut self.registry, key, config)
    }

    /// Merge an imported model into the scene.
    ///
    /// Solids and unknown materials are appended; segments go through the
    /// registry rules, so duplicates and collisions are skipped and counted.
    pub fn absorb(&mut self, model: ImportedModel) -> AssignReport {
        let mut registry = self.registry.clone();
        let mut report = AssignReport::default();

        for group in model.registry.groups() {
            for segment in group.segments() {
                match registry.add_segment(segment.segment, group.key().clone()) {
                    Ok(id) => report.created.push(id),
                    Err(crate::error::RegistryError::TypeCollision(existing)) => {
                        report.collisions.push(existing)
                    }
                    Err(_) => report.duplicates += 1,
                }
            }
        }

        for material in model.materials {
            if self.material(&material.name).is_none() {
                self.materials.push(material);
            }
        }
        self.solids.extend(model.solids);
        self.registry = registry;

        tracing::info!(
            created = report.created_count(),
            skipped = report.skipped_count(),
            "absorbed imported model"
        );
        report
    }

    /// Read-only mesh checks over the selection
    pub fn preflight(&self, config: &ThermConfig) -> Vec<PreflightReport> {
        self.selected_solids()
            .into_iter()
            .map(|solid| preflight(solid, config.downward_threshold, config.grid_precision))
            .collect()
    }
}

impl SceneRepository for MemoryScene {
    fn solids(&self) -> Vec<&Solid> {
        self.solids.iter().collect()
    }

    fn selected_solids(&self) -> Vec<&Solid> {
        select(&self.solids, &self.selection)
    }

    fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|material| material.name == name)
    }

    fn registry(&self) -> &SegmentRegistry {
        &self.registry
    }
}

fn select<'a>(solids: &'a [Solid], selection: &[String]) -> Vec<&'a Solid> {
    if selection.is_empty() {
        return solids.iter().collect();
    }
    solids
        .iter()
        .filter(|solid| selection.iter().any(|name| *name == solid.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::Point2;

    fn scene() -> MemoryScene {
        let mut scene = MemoryScene::new();
        scene.add_solid(
            Primitive::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)).to_solid("a", Some("Brick")),
        );
        scene.add_solid(
            Primitive::rectangle(Point2::new(1.0, 0.0), Point2::new(2.0, 1.0)).to_solid("b", Some("Wool")),
        );
        scene.add_material(Material::new("Brick").with_conductivity(0.77));
        scene
    }

    #[test]
    fn test_selection() {
        let mut scene = scene();
        assert_eq!(scene.selected_solids().len(), 2);
        scene.select(["b"]);
        assert_eq!(scene.selected_solids()[0].name, "b");
        assert!(scene.solid("a").is_some());
    }

    #[test]
    fn test_material_replaced_by_name() {
        let mut scene = scene();
        scene.add_material(Material::new("Brick").with_conductivity(0.9));
        assert_eq!(scene.materials.len(), 1);
        assert_eq!(scene.material("Brick").and_then(|m| m.conductivity), Some(0.9));
    }

    #[test]
    fn test_assign_selection_probes_all_solids() {
        let mut scene = scene();
        scene.select(["a"]);
        let config = ThermConfig::default();

        let report = scene.assign_external(&GroupKey::adiabatic(), &config);
        // Square "a" alone has four boundary edges, including the seam
        assert_eq!(report.created_count(), 4);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut scene = scene();
        scene.assign_external(&GroupKey::internal(20.0, 0.13), &ThermConfig::default());

        let json = serde_json::to_string(&scene).unwrap();
        let restored: MemoryScene = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.solids.len(), 2);
        assert_eq!(restored.registry.len(), scene.registry.len());
    }
}
