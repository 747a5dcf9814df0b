// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boundary segment types, group keys and the collision rule

use crate::config::SurfaceCondition;
use nalgebra::{Point3, Vector2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix shared by every group label
pub const GROUP_PREFIX: &str = "THERM_";

/// Classification of a boundary segment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentType {
    /// Interior surface condition, formerly "Ti"
    Internal,
    /// Exterior surface condition, formerly "Te"
    External,
    Adiabatic,
    /// U-factor tag with its user label
    UFactor(String),
}

impl SegmentType {
    /// Internal, External and Adiabatic exclude one another
    pub fn is_exclusive(&self) -> bool {
        !matches!(self, Self::UFactor(_))
    }

    /// Same variant, ignoring the U-factor label
    pub fn same_kind(&self, other: &SegmentType) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => write!(f, "Internal"),
            Self::External => write!(f, "External"),
            Self::Adiabatic => write!(f, "Adiabatic"),
            Self::UFactor(label) => write!(f, "UFactor({label})"),
        }
    }
}

/// Whether a new segment of type `new` may not share a location with `existing`.
///
/// Internal, External and Adiabatic are pairwise exclusive; UFactor never
/// collides. Two segments of the same kind are duplicates, not collisions.
pub fn types_collide(new: &SegmentType, existing: &SegmentType) -> bool {
    new.is_exclusive() && existing.is_exclusive() && !new.same_kind(existing)
}

/// Temperature and surface resistance, quantized to thousandths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "SurfaceCondition", into = "SurfaceCondition")]
pub struct ConditionParams {
    temperature_milli: i64,
    resistance_milli: i64,
}

impl ConditionParams {
    pub fn new(temperature: f64, resistance: f64) -> Self {
        Self {
            temperature_milli: (temperature * 1000.0).round() as i64,
            resistance_milli: (resistance * 1000.0).round() as i64,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature_milli as f64 / 1000.0
    }

    pub fn resistance(&self) -> f64 {
        self.resistance_milli as f64 / 1000.0
    }
}

impl From<SurfaceCondition> for ConditionParams {
    fn from(condition: SurfaceCondition) -> Self {
        Self::new(condition.temperature, condition.resistance)
    }
}

impl From<ConditionParams> for SurfaceCondition {
    fn from(params: ConditionParams) -> Self {
        Self {
            temperature: params.temperature(),
            resistance: params.resistance(),
        }
    }
}

/// Identity of a segment group: its type plus the parameters that define it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupKey {
    Internal(ConditionParams),
    External(ConditionParams),
    Adiabatic,
    UFactor(String),
}

impl GroupKey {
    pub fn internal(temperature: f64, resistance: f64) -> Self {
        Self::Internal(ConditionParams::new(temperature, resistance))
    }

    pub fn external(temperature: f64, resistance: f64) -> Self {
        Self::External(ConditionParams::new(temperature, resistance))
    }

    pub fn adiabatic() -> Self {
        Self::Adiabatic
    }

    pub fn ufactor(label: impl Into<String>) -> Self {
        Self::UFactor(label.into())
    }

    pub fn segment_type(&self) -> SegmentType {
        match self {
            Self::Internal(_) => SegmentType::Internal,
            Self::External(_) => SegmentType::External,
            Self::Adiabatic => SegmentType::Adiabatic,
            Self::UFactor(label) => SegmentType::UFactor(label.clone()),
        }
    }

    /// Surface condition for Internal and External groups
    pub fn condition(&self) -> Option<ConditionParams> {
        match self {
            Self::Internal(params) | Self::External(params) => Some(*params),
            _ => None,
        }
    }

    /// Display label without the group prefix, e.g. `Ti=20.0_Rsi=0.130`
    pub fn short_label(&self) -> String {
        match self {
            Self::Internal(params) => {
                format!("Ti={:?}_Rsi={:.3}", params.temperature(), params.resistance())
            }
            Self::External(params) => {
                format!("Te={:?}_Rse={:.3}", params.temperature(), params.resistance())
            }
            Self::Adiabatic => "Adiabatic".to_string(),
            Self::UFactor(label) => format!("UFactor_{label}"),
        }
    }

    /// Display label, e.g. `THERM_Ti=20.0_Rsi=0.130`
    pub fn label(&self) -> String {
        format!("{GROUP_PREFIX}{}", self.short_label())
    }

    /// Parse a display label back into a key
    pub fn from_label(label: &str) -> Option<Self> {
        let body = label.strip_prefix(GROUP_PREFIX)?;

        if body == "Adiabatic" {
            return Some(Self::Adiabatic);
        }
        if let Some(tag) = body.strip_prefix("UFactor_") {
            return (!tag.is_empty()).then(|| Self::ufactor(tag));
        }
        if let Some(rest) = body.strip_prefix("Ti=") {
            let (temperature, resistance) = split_pair(rest, "_Rsi=")?;
            return Some(Self::internal(temperature, resistance));
        }
        if let Some(rest) = body.strip_prefix("Te=") {
            let (temperature, resistance) = split_pair(rest, "_Rse=")?;
            return Some(Self::external(temperature, resistance));
        }
        None
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn split_pair(text: &str, separator: &str) -> Option<(f64, f64)> {
    let (first, second) = text.split_once(separator)?;
    Some((first.trim().parse().ok()?, second.trim().parse().ok()?))
}

/// Directed two-point boundary curve.
///
/// Walking from `start` to `end`, the modelled material lies to the left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectedSegment {
    pub start: Point3<f64>,
    pub end: Point3<f64>,
}

impl DirectedSegment {
    pub fn new(start: Point3<f64>, end: Point3<f64>) -> Self {
        Self { start, end }
    }

    pub fn reversed(&self) -> Self {
        Self {
            start: self.end,
            end: self.start,
        }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    pub fn midpoint(&self) -> Point3<f64> {
        nalgebra::center(&self.start, &self.end)
    }

    /// Plan-view direction vector, not normalized
    pub fn plan_direction(&self) -> Vector2<f64> {
        Vector2::new(self.end.x - self.start.x, self.end.y - self.start.y)
    }
}
