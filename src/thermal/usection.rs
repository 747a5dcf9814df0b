// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! U-sections: a layered U-value taken across an internal boundary segment

use super::{compute, estimate_thickness, MaterialLayer, ResistanceReport};
use crate::boundary::{assign_external_edges, GroupKey, SegmentId, SegmentRegistry};
use crate::config::ThermConfig;
use crate::error::{GeometryError, RegistryError, Result};
use crate::geometry::Solid;
use crate::io::{export_therm, ExportSummary};
use crate::scene::{lookup_conductivity, Lookup, MemoryScene, SceneRepository};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A named cut through a stack of solids, anchored on an internal segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct USection {
    pub name: String,
    pub internal: SegmentId,
    #[serde(default)]
    pub external: Option<SegmentId>,
    /// Solid names, inside to outside
    pub layers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct USectionLayer {
    pub solid: String,
    pub material: Option<String>,
    pub thickness: f64,
    pub conductivity: Lookup<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct USectionReport {
    pub name: String,
    pub layers: Vec<USectionLayer>,
    /// Layer names with no solid in the scene
    pub missing_layers: Vec<String>,
    pub resistance: ResistanceReport,
}

impl USection {
    pub fn new(name: impl Into<String>, internal: SegmentId) -> Self {
        Self {
            name: name.into(),
            internal,
            external: None,
            layers: Vec::new(),
        }
    }

    pub fn with_external(mut self, external: SegmentId) -> Self {
        self.external = Some(external);
        self
    }

    pub fn with_layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layers = layers.into_iter().map(Into::into).collect();
        self
    }

    /// Thickness, conductivity and the resulting U-value of each layer.
    ///
    /// Rsi comes from the internal segment's group, Rse from the chosen
    /// external segment or else the first External group, each falling back
    /// to the configured surface resistance.
    pub fn evaluate<S>(&self, scene: &S, config: &ThermConfig) -> Result<USectionReport>
    where
        S: SceneRepository + ?Sized,
    {
        let registry = scene.registry();
        let internal = registry
            .segment(self.internal)
            .ok_or(RegistryError::SegmentNotFound(self.internal.0))?;

        let rsi = match internal.group.key() {
            GroupKey::Internal(params) => params.resistance(),
            _ => config.internal.resistance,
        };
        let rse = self.external_resistance(registry, config)?;
        let direction = internal.segment.segment.plan_direction();

        let mut layers = Vec::new();
        let mut missing_layers = Vec::new();
        for name in &self.layers {
            let Some(solid) = scene.solid(name) else {
                tracing::warn!(section = %self.name, layer = %name, "layer solid not found");
                missing_layers.push(name.clone());
                continue;
            };
            layers.push(USectionLayer {
                solid: solid.name.clone(),
                material: solid.primary_material().map(str::to_string),
                thickness: estimate_thickness(&solid.extent(), &direction)?,
                conductivity: layer_conductivity(scene, solid, config),
            });
        }

        if layers.is_empty() {
            return Err(GeometryError::EmptySolidSet.into());
        }

        let stack: Vec<MaterialLayer> = layers
            .iter()
            .map(|layer| MaterialLayer::new(layer.thickness, layer.conductivity.value))
            .collect();
        let resistance = compute(&stack, rsi, rse);
        tracing::info!(section = %self.name, u_value = resistance.u_value, "evaluated U-section");

        Ok(USectionReport {
            name: self.name.clone(),
            layers,
            missing_layers,
            resistance,
        })
    }

    fn external_resistance(&self, registry: &SegmentRegistry, config: &ThermConfig) -> Result<f64> {
        if let Some(id) = self.external {
            let external = registry
                .segment(id)
                .ok_or(RegistryError::SegmentNotFound(id.0))?;
            if let GroupKey::External(params) = external.group.key() {
                return Ok(params.resistance());
            }
        }

        Ok(registry
            .groups()
            .find_map(|group| match group.key() {
                GroupKey::External(params) => Some(params.resistance()),
                _ => None,
            })
            .unwrap_or(config.external.resistance))
    }
}

fn layer_conductivity<S>(scene: &S, solid: &Solid, config: &ThermConfig) -> Lookup<f64>
where
    S: SceneRepository + ?Sized,
{
    let material = solid.primary_material();
    match material.and_then(|name| scene.material(name)) {
        Some(material) => material.conductivity(config),
        None => lookup_conductivity(material.unwrap_or(&solid.name), None, config.default_conductivity),
    }
}

/// Write a standalone file for one section.
///
/// The file holds the layer solids, the section's internal (and external)
/// segment, and the remaining exterior edges of the layers as Adiabatic.
pub fn export_usection<S>(
    path: impl AsRef<Path>,
    section: &USection,
    scene: &S,
    config: &ThermConfig,
) -> Result<(USectionReport, ExportSummary)>
where
    S: SceneRepository + ?Sized,
{
    let report = section.evaluate(scene, config)?;
    let registry = scene.registry();

    let mut sub_scene = MemoryScene::with_registry(SegmentRegistry::from_config(config));
    for layer in &report.layers {
        if let Some(solid) = scene.solid(&layer.solid) {
            for material in solid.materials.iter().filter_map(|name| scene.material(name)) {
                sub_scene.add_material(material.clone());
            }
            sub_scene.add_solid(solid.clone());
        }
    }

    for id in std::iter::once(section.internal).chain(section.external) {
        let found = registry.segment(id).ok_or(RegistryError::SegmentNotFound(id.0))?;
        sub_scene
            .registry
            .add_segment(found.segment.segment, found.group.key().clone())?;
    }

    let layer_solids: Vec<&Solid> = sub_scene.solids.iter().collect();
    assign_external_edges(
        &layer_solids,
        &layer_solids,
        &mut sub_scene.registry,
        &GroupKey::adiabatic(),
        config,
    );

    let mut section_config = config.clone();
    section_config.header.title = section.name.clone();
    section_config.header.notes = format!("Auto-generated from {}", section.name);

    let summary = export_therm(path, &sub_scene, &section_config)?;
    Ok((report, summary))
}
