// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Thermal module - layered resistance, thickness and U-sections

mod resistance;
mod thickness;
mod usection;

pub use resistance::{compute, LayerResistance, MaterialLayer, ResistanceReport};
pub use thickness::estimate_thickness;
pub use usection::{export_usection, USection, USectionLayer, USectionReport};
