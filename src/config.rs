// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tolerances, default boundary conditions and interchange header settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up by [`ThermConfig::load`]
pub const CONFIG_FILE: &str = "thermbridge.toml";

/// Temperature and surface resistance of an Internal or External condition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceCondition {
    /// Air temperature in °C
    pub temperature: f64,
    /// Surface heat-transfer resistance in m²K/W
    pub resistance: f64,
}

/// Fixed header written at the top of every interchange file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    pub therm_version: String,
    pub file_version: String,
    pub title: String,
    pub created_by: String,
    pub company: String,
    pub client: String,
    pub cross_section_type: String,
    pub notes: String,
    pub units: String,
    pub mesh_level: u32,
    pub error_check_flag: u32,
    pub error_limit: f64,
    pub max_iterations: u32,
    pub cma_flag: u32,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            therm_version: "Version 7.8.74.0".to_string(),
            file_version: "1".to_string(),
            title: String::new(),
            created_by: String::new(),
            company: String::new(),
            client: String::new(),
            cross_section_type: "Sill".to_string(),
            notes: String::new(),
            units: "SI".to_string(),
            mesh_level: 8,
            error_check_flag: 1,
            error_limit: 10.0,
            max_iterations: 10,
            cma_flag: 0,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermConfig {
    /// Endpoint tolerance for edge and segment matching, in world units
    pub edge_tolerance: f64,
    /// Offset of the orientation probe from the edge midpoint
    pub search_distance: f64,
    /// Maximum distance between a probe point and a face plane
    pub plane_tolerance: f64,
    /// Endpoint tolerance when matching segments to polygon edges on export, in mm
    pub export_match_tolerance_mm: f64,
    /// Default Ti/Rsi pair
    pub internal: SurfaceCondition,
    /// Default Te/Rse pair
    pub external: SurfaceCondition,
    /// Conductivity used when a material carries none, in W/mK
    pub default_conductivity: f64,
    pub default_emissivity: f64,
    /// Normal z-component below which a face counts as facing down
    pub downward_threshold: f64,
    /// Vertex grid used by the preflight check, in world units
    pub grid_precision: f64,
    pub header: HeaderConfig,
}

impl Default for ThermConfig {
    fn default() -> Self {
        Self {
            edge_tolerance: 0.001,
            search_distance: 0.1,
            plane_tolerance: 0.1,
            export_match_tolerance_mm: 0.1,
            internal: SurfaceCondition {
                temperature: 20.0,
                resistance: 0.13,
            },
            external: SurfaceCondition {
                temperature: -20.0,
                resistance: 0.04,
            },
            default_conductivity: 0.04,
            default_emissivity: 0.90,
            downward_threshold: -0.01,
            grid_precision: 0.1,
            header: HeaderConfig::default(),
        }
    }
}

impl ThermConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: ThermConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `THERMBRIDGE_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        let read = |name: &str| std::env::var(name).ok().and_then(|v| v.parse::<f64>().ok());

        if let Some(tolerance) = read("THERMBRIDGE_EDGE_TOLERANCE") {
            self.edge_tolerance = tolerance;
        }
        if let Some(distance) = read("THERMBRIDGE_SEARCH_DISTANCE") {
            self.search_distance = distance;
        }
        if let Some(conductivity) = read("THERMBRIDGE_DEFAULT_CONDUCTIVITY") {
            self.default_conductivity = conductivity;
        }
        if let Ok(title) = std::env::var("THERMBRIDGE_TITLE") {
            self.header.title = title;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Endpoint tolerance expressed in millimetres
    pub fn edge_tolerance_mm(&self) -> f64 {
        self.edge_tolerance * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_interchange_conventions() {
        let config = ThermConfig::default();
        assert_eq!(config.internal.temperature, 20.0);
        assert_eq!(config.internal.resistance, 0.13);
        assert_eq!(config.external.temperature, -20.0);
        assert_eq!(config.external.resistance, 0.04);
        assert_eq!(config.default_conductivity, 0.04);
        assert_eq!(config.header.cross_section_type, "Sill");
    }

    #[test]
    fn test_save_and_reload() -> Result<()> {
        let mut config = ThermConfig::default();
        config.search_distance = 0.25;
        config.header.title = "Sill detail".to_string();

        let file = NamedTempFile::new()?;
        config.save(file.path())?;
        let loaded = ThermConfig::from_file(file.path())?;

        assert_eq!(loaded.search_distance, 0.25);
        assert_eq!(loaded.header.title, "Sill detail");
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let config: ThermConfig = toml::from_str("edge_tolerance = 0.002\n")?;
        assert_eq!(config.edge_tolerance, 0.002);
        assert_eq!(config.plane_tolerance, 0.1);
        assert_eq!(config.header.mesh_level, 8);
        Ok(())
    }
}
