// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Argument types shared by the command-line front end

use crate::boundary::GroupKey;
use crate::config::ThermConfig;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use nalgebra::Point3;

/// Boundary condition kind selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BoundaryKind {
    Internal,
    External,
    Adiabatic,
    Ufactor,
}

impl BoundaryKind {
    /// Build the group key, falling back to the configured surface conditions
    pub fn to_key(
        self,
        temperature: Option<f64>,
        resistance: Option<f64>,
        label: Option<&str>,
        config: &ThermConfig,
    ) -> Result<GroupKey> {
        Ok(match self {
            Self::Internal => GroupKey::internal(
                temperature.unwrap_or(config.internal.temperature),
                resistance.unwrap_or(config.internal.resistance),
            ),
            Self::External => GroupKey::external(
                temperature.unwrap_or(config.external.temperature),
                resistance.unwrap_or(config.external.resistance),
            ),
            Self::Adiabatic => GroupKey::adiabatic(),
            Self::Ufactor => match label.map(str::trim) {
                Some(label) if !label.is_empty() => GroupKey::ufactor(label),
                _ => bail!("a U-factor boundary needs a non-empty --label"),
            },
        })
    }
}

/// Parse `x1,y1,x2,y2` into an edge at z = 0
pub fn parse_edge(text: &str) -> Result<(Point3<f64>, Point3<f64>)> {
    let values = text
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("invalid edge coordinates: {text}"))?;

    match values.as_slice() {
        [x1, y1, x2, y2] => Ok((Point3::new(*x1, *y1, 0.0), Point3::new(*x2, *y2, 0.0))),
        _ => bail!("an edge needs four coordinates x1,y1,x2,y2, got {}", values.len()),
    }
}
