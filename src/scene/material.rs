// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Material properties with lookup diagnostics

use crate::config::ThermConfig;
use serde::{Deserialize, Serialize};

/// Name keywords and the conductivity they imply, checked in order.
/// A keyword matches when some word of the name starts with it, ignoring
/// case, so "Stalowy" matches `stal` but "Crystal" and "Installation" do not.
const CONDUCTIVITY_KEYWORDS: &[(&str, f64)] = &[
    ("beton", 1.7),
    ("concrete", 1.7),
    ("cement", 1.7),
    ("cegła", 0.8),
    ("brick", 0.8),
    ("ceramika", 0.8),
    ("drewno", 0.15),
    ("wood", 0.15),
    ("timber", 0.15),
    ("szkło", 1.0),
    ("glass", 1.0),
    ("stal", 50.0),
    ("steel", 50.0),
    ("metal", 50.0),
    ("aluminium", 200.0),
    ("aluminum", 200.0),
    ("izolacja", 0.04),
    ("insulation", 0.04),
    ("wełna", 0.04),
    ("wool", 0.04),
    ("styropian", 0.035),
    ("eps", 0.035),
    ("xps", 0.035),
];

/// Grey used when a material has no display color
pub const DEFAULT_COLOR: &str = "0x808080";

/// A host material, referenced from faces by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// W/mK
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conductivity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissivity: Option<f64>,
    /// Linear RGB components in `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<[f32; 3]>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            conductivity: None,
            emissivity: None,
            color: None,
        }
    }

    pub fn with_conductivity(mut self, conductivity: f64) -> Self {
        self.conductivity = Some(conductivity);
        self
    }

    pub fn with_emissivity(mut self, emissivity: f64) -> Self {
        self.emissivity = Some(emissivity);
        self
    }

    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = Some(color);
        self
    }

    /// The stored conductivity when it is positive
    pub fn explicit_conductivity(&self) -> Option<f64> {
        self.conductivity.filter(|value| *value > 0.0)
    }

    /// Conductivity with the source it came from
    pub fn conductivity(&self, config: &ThermConfig) -> Lookup<f64> {
        lookup_conductivity(&self.name, self.conductivity, config.default_conductivity)
    }

    pub fn emissivity_or(&self, default: f64) -> f64 {
        self.emissivity.filter(|e| *e > 0.0).unwrap_or(default)
    }

    /// `0xRRGGBB`, components scaled by 255 and truncated
    pub fn rgb_hex(&self) -> String {
        match self.color {
            Some(color) => rgb_hex(color),
            None => DEFAULT_COLOR.to_string(),
        }
    }
}

pub fn rgb_hex(color: [f32; 3]) -> String {
    let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0) as u8;
    format!(
        "0x{:02X}{:02X}{:02X}",
        channel(color[0]),
        channel(color[1]),
        channel(color[2])
    )
}

/// Where a looked-up value came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LookupSource {
    Explicit,
    /// Inferred from a keyword in the material name
    NameHeuristic(&'static str),
    Default,
}

/// A value plus its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lookup<T> {
    pub value: T,
    pub source: LookupSource,
}

impl<T> Lookup<T> {
    pub fn is_default(&self) -> bool {
        self.source == LookupSource::Default
    }
}

/// Explicit positive value, else name keyword, else `default`
pub fn lookup_conductivity(name: &str, explicit: Option<f64>, default: f64) -> Lookup<f64> {
    if let Some(value) = explicit.filter(|value| *value > 0.0) {
        return Lookup {
            value,
            source: LookupSource::Explicit,
        };
    }

    let lowered = name.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();
    if let Some((keyword, value)) = CONDUCTIVITY_KEYWORDS
        .iter()
        .find(|(keyword, _)| words.iter().any(|word| word.starts_with(keyword)))
    {
        tracing::debug!(material = name, keyword, value, "conductivity inferred from name");
        return Lookup {
            value: *value,
            source: LookupSource::NameHeuristic(*keyword),
        };
    }

    tracing::warn!(material = name, default, "no conductivity found, using default");
    Lookup {
        value: default,
        source: LookupSource::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_wins() {
        let lookup = lookup_conductivity("Concrete", Some(2.1), 0.04);
        assert_eq!(lookup.value, 2.1);
        assert_eq!(lookup.source, LookupSource::Explicit);
    }

    #[test]
    fn test_name_heuristic() {
        let lookup = lookup_conductivity("Reinforced CONCRETE C30", None, 0.04);
        assert_eq!(lookup.value, 1.7);
        assert_eq!(lookup.source, LookupSource::NameHeuristic("concrete"));

        let lookup = lookup_conductivity("Cegła pełna", Some(0.0), 0.04);
        assert_eq!(lookup.value, 0.8);
    }

    #[test]
    fn test_keywords_match_word_starts() {
        assert_eq!(lookup_conductivity("Stalowy profil", None, 0.04).value, 50.0);
        assert_eq!(lookup_conductivity("Mineral-wool 035", None, 0.04).source, LookupSource::NameHeuristic("wool"));
        assert_eq!(lookup_conductivity("EPS_100", None, 0.04).source, LookupSource::NameHeuristic("eps"));

        let crystal = lookup_conductivity("Crystal", None, 0.04);
        assert!(crystal.is_default());
        let installation = lookup_conductivity("Installation gap", None, 0.04);
        assert!(installation.is_default());
    }

    #[test]
    fn test_explicit_conductivity_ignores_names() {
        assert_eq!(Material::new("Concrete").explicit_conductivity(), None);
        assert_eq!(Material::new("Concrete").with_conductivity(0.0).explicit_conductivity(), None);
        assert_eq!(Material::new("x").with_conductivity(1.2).explicit_conductivity(), Some(1.2));
    }

    #[test]
    fn test_default_is_reported() {
        let lookup = lookup_conductivity("Mystery", None, 0.04);
        assert_eq!(lookup.value, 0.04);
        assert!(lookup.is_default());
    }

    #[test]
    fn test_colors() {
        assert_eq!(Material::new("x").rgb_hex(), "0x808080");
        assert_eq!(Material::new("x").with_color([1.0, 0.5, 0.0]).rgb_hex(), "0xFF7F00");
    }

    #[test]
    fn test_emissivity_fallback() {
        assert_eq!(Material::new("x").emissivity_or(0.9), 0.9);
        assert_eq!(Material::new("x").with_emissivity(0.3).emissivity_or(0.9), 0.3);
    }
}
