// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - THERM-XML export and import

mod deserializer;
pub mod format;
mod serializer;

pub use deserializer::{
    deserialize, BoundaryConditionRecord, ImportedModel, Projection, UFactorResult,
};
pub use serializer::{
    serialize, ExportSummary, ThermSerializer, DEFAULT_MATERIAL, THERM_NAMESPACE,
};

use crate::config::ThermConfig;
use crate::error::{DeserializationError, SerializationError};
use crate::scene::SceneRepository;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Export the scene's selection to `path`.
///
/// The document is written to a temporary file beside `path` and renamed
/// over it, so a failed export leaves no partial file behind.
pub fn export_therm<S>(
    path: impl AsRef<Path>,
    scene: &S,
    config: &ThermConfig,
) -> Result<ExportSummary, SerializationError>
where
    S: SceneRepository + ?Sized,
{
    let (bytes, summary) = ThermSerializer::new(config).serialize(scene)?;
    write_atomic(path.as_ref(), &bytes)?;
    tracing::info!(path = %path.as_ref().display(), "wrote THERM file");
    Ok(summary)
}

/// Read an interchange file
pub fn import_therm(path: impl AsRef<Path>) -> Result<ImportedModel, DeserializationError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    deserialize(&content)
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SerializationError> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(directory)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.persist(path).map_err(|err| SerializationError::Io(err.error))?;
    Ok(())
}
