// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Thermbridge
//!
//! Tags the exterior edges of 2D building sections with thermal boundary
//! conditions and exchanges them with THERM as THERM-XML.
//! Also computes layered U-values and exports single-layer U-sections.

pub mod boundary;
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod scene;
pub mod thermal;
pub mod utils;

pub use boundary::{
    AssignReport, DirectedSegment, GroupKey, SegmentId, SegmentRegistry, SegmentType,
};
pub use config::ThermConfig;
pub use error::{Result, ThermError};
pub use geometry::{Primitive, Solid};
pub use io::{export_therm, import_therm, ExportSummary, ImportedModel};
pub use scene::{Material, MemoryScene, SceneRepository};
pub use thermal::{MaterialLayer, ResistanceReport, USection};

/// Export every selected solid of `scene` to `path` with the given config
pub fn export_scene(
    path: impl AsRef<std::path::Path>,
    scene: &MemoryScene,
    config: &ThermConfig,
) -> Result<ExportSummary> {
    Ok(export_therm(path, scene, config)?)
}
