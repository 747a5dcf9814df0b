// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI subsystem for Thermbridge

pub mod args;
pub mod reporter;

pub use args::{parse_edge, BoundaryKind};
pub use reporter::Reporter;
