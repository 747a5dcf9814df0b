// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Series thermal resistance and U-value

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One homogeneous layer of a construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialLayer {
    /// Thickness in metres
    pub thickness: f64,
    /// Thermal conductivity in W/mK
    pub conductivity: f64,
}

impl MaterialLayer {
    pub fn new(thickness: f64, conductivity: f64) -> Self {
        Self {
            thickness,
            conductivity,
        }
    }

    /// `thickness / conductivity`, or `None` when either is not positive
    pub fn resistance(&self) -> Option<f64> {
        (self.thickness > 0.0 && self.conductivity > 0.0).then(|| self.thickness / self.conductivity)
    }
}

/// Parses `thickness:conductivity`, e.g. `0.1:1.0`
impl FromStr for MaterialLayer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (thickness, conductivity) = s
            .split_once(':')
            .ok_or_else(|| format!("expected THICKNESS:CONDUCTIVITY, got '{s}'"))?;
        let parse = |value: &str| {
            value
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid number '{value}': {e}"))
        };
        Ok(Self::new(parse(thickness)?, parse(conductivity)?))
    }
}

/// Per-layer contribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerResistance {
    pub layer: MaterialLayer,
    /// Zero for flagged layers
    pub resistance: f64,
    /// Set when thickness or conductivity was not positive
    pub flagged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResistanceReport {
    pub layers: Vec<LayerResistance>,
    pub rsi: f64,
    pub rse: f64,
    pub r_materials: f64,
    pub r_total: f64,
    /// W/m²K, zero when `r_total` is not positive
    pub u_value: f64,
    pub valid: bool,
}

impl ResistanceReport {
    pub fn flagged_layers(&self) -> usize {
        self.layers.iter().filter(|layer| layer.flagged).count()
    }
}

/// Layered series resistance: `Rtotal = Rsi + Σ d/λ + Rse`, `U = 1 / Rtotal`.
///
/// Never fails. Bad layers contribute nothing and are flagged; a non-positive
/// total yields `U = 0` with `valid` cleared.
pub fn compute(layers: &[MaterialLayer], rsi: f64, rse: f64) -> ResistanceReport {
    let layers: Vec<LayerResistance> = layers
        .iter()
        .map(|layer| match layer.resistance() {
            Some(resistance) => LayerResistance {
                layer: *layer,
                resistance,
                flagged: false,
            },
            None => {
                tracing::warn!(
                    thickness = layer.thickness,
                    conductivity = layer.conductivity,
                    "layer ignored: thickness and conductivity must be positive"
                );
                LayerResistance {
                    layer: *layer,
                    resistance: 0.0,
                    flagged: true,
                }
            }
        })
        .collect();

    let r_materials: f64 = layers.iter().map(|layer| layer.resistance).sum();
    let r_total = rsi + r_materials + rse;
    let valid = r_total > 0.0;
    let u_value = if valid { 1.0 / r_total } else { 0.0 };

    if !valid {
        tracing::warn!(r_total, "total resistance is not positive, U-value set to 0");
    }

    ResistanceReport {
        layers,
        rsi,
        rse,
        r_materials,
        r_total,
        u_value,
        valid,
    }
}
