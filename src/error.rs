// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error taxonomy
//!
//! Geometry and registry errors are recoverable: callers skip the offending
//! edge or segment and keep going. Serialization and deserialization errors
//! abort the single operation that raised them.

use crate::boundary::SegmentType;
use thiserror::Error;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum ThermError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Deserialization(#[from] DeserializationError),
}

/// Errors raised by geometric computations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    /// Edge whose endpoints coincide in plan view.
    #[error("degenerate edge: endpoints coincide in plan view")]
    DegenerateEdge,

    /// Reference direction of zero length.
    #[error("zero-length reference direction")]
    ZeroDirection,

    #[error("no solids supplied")]
    EmptySolidSet,
}

/// Errors raised when adding or removing boundary segments.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    /// A segment of the same type already occupies this location.
    #[error("a segment of the same type already exists at this location")]
    Duplicate,

    /// A mutually exclusive segment type already occupies this location.
    #[error("location already carries a {0} segment")]
    TypeCollision(SegmentType),

    #[error("segment group not found: {0}")]
    GroupNotFound(String),

    #[error("segment not found: {0}")]
    SegmentNotFound(u64),
}

/// Errors raised while writing an interchange file.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// Nothing to export.
    #[error("no solids selected for export")]
    NoSolids,

    #[error("XML write error: {0}")]
    Xml(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading an interchange file.
#[derive(Debug, Error)]
pub enum DeserializationError {
    /// XML parsing error.
    #[error("XML parse error: {0}")]
    Xml(String),

    /// Root element is not `THERM-XML`.
    #[error("unexpected root element: {0}")]
    UnexpectedRoot(String),

    /// Document contained no root element at all.
    #[error("document has no THERM-XML root")]
    MissingRoot,

    /// Missing required attribute.
    #[error("missing required attribute: {attribute} on {element}")]
    MissingAttribute {
        /// The missing attribute name.
        attribute: &'static str,
        /// The element that should have the attribute.
        element: String,
    },

    /// Invalid attribute value.
    #[error("invalid value for {attribute} on {element}: {value}")]
    InvalidAttribute {
        /// The attribute with the invalid value.
        attribute: &'static str,
        /// The element containing the attribute.
        element: String,
        /// The raw value that failed to parse.
        value: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeserializationError {
    pub(crate) fn missing_attribute(attribute: &'static str, element: &str) -> Self {
        Self::MissingAttribute {
            attribute,
            element: element.to_string(),
        }
    }

    pub(crate) fn invalid_attribute(attribute: &'static str, element: &str, value: &str) -> Self {
        Self::InvalidAttribute {
            attribute,
            element: element.to_string(),
            value: value.to_string(),
        }
    }
}

/// Convenience alias for results using [`ThermError`].
pub type Result<T> = std::result::Result<T, ThermError>;
