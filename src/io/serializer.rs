// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! THERM-XML writer
//!
//! Polygons come from the selected solids, boundary entries from the segment
//! registry. Every boundary is re-ordered to follow the winding of the polygon
//! edge it lies on, and UFactor segments are folded into the boundary they
//! coincide with.

use super::format::{format_short, format_temperature, format_value};
use crate::boundary::{ConditionParams, GroupKey, SegmentRegistry};
use crate::config::{HeaderConfig, ThermConfig};
use crate::error::SerializationError;
use crate::scene::{SceneRepository, DEFAULT_COLOR};
use crate::utils::math::{plan_mm, points_match_2d, round_to};
use chrono::Local;
use nalgebra::Point2;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;
use std::fmt::Display;
use std::io::Cursor;

/// Root namespace expected by the simulation tool
pub const THERM_NAMESPACE: &str = "http://windows.lbl.gov";

/// Material used for faces without one
pub const DEFAULT_MATERIAL: &str = "DefaultMaterial";

/// Viewport-only materials that never reach the material table
const DISPLAY_MATERIALS: [&str; 4] = ["RED", "BLUE", "GREY", "GREEN"];

const INTERNAL_FALLBACK_H: f64 = 7.69;
const EXTERNAL_FALLBACK_H: f64 = 25.0;

const INTERNAL_COLOR: &str = "0xFF0000";
const EXTERNAL_COLOR: &str = "0x0000FF";
const ADIABATIC_COLOR: &str = "0x000000";

/// Side × range × specularity combinations of the fixed optical properties
const OPTICAL_PROPERTIES: [(&str, &str, &str); 8] = [
    ("Front", "Visible", "Direct"),
    ("Front", "Visible", "Diffuse"),
    ("Front", "Solar", "Direct"),
    ("Front", "Solar", "Diffuse"),
    ("Back", "Visible", "Direct"),
    ("Back", "Visible", "Diffuse"),
    ("Back", "Solar", "Direct"),
    ("Back", "Solar", "Diffuse"),
];

/// What an export wrote
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportSummary {
    pub materials: usize,
    pub polygons: usize,
    pub boundaries: usize,
    pub boundary_conditions: Vec<String>,
    /// UFactor segments written as Adiabatic for lack of a partner
    pub unmatched_ufactors: usize,
}

struct MaterialEntry {
    name: String,
    conductivity: f64,
    emissivity: f64,
    color: String,
}

struct PolygonEntry {
    material: String,
    /// Plan coordinates in millimetres
    points: Vec<Point2<f64>>,
}

#[derive(Clone, Copy)]
enum Condition {
    Internal(ConditionParams),
    External(ConditionParams),
    Adiabatic,
}

impl Condition {
    fn name(&self) -> String {
        match self {
            Self::Internal(params) => format!(
                "Ti={} Rsi={:.2}",
                format_temperature(params.temperature()),
                params.resistance()
            ),
            Self::External(params) => format!(
                "Te={} Rse={:.2}",
                format_temperature(params.temperature()),
                params.resistance()
            ),
            Self::Adiabatic => "Adiabatic".to_string(),
        }
    }
}

struct BoundaryEntry {
    condition: Condition,
    start: Point2<f64>,
    end: Point2<f64>,
    ufactor_tag: Option<String>,
}

struct ConditionEntry {
    name: String,
    h: f64,
    temperature: f64,
    color: &'static str,
}

impl ConditionEntry {
    fn from_condition(condition: &Condition) -> Self {
        // H follows the resistance as printed in the name
        let film = |params: &ConditionParams, fallback: f64| {
            let resistance = round_to(params.resistance(), 2);
            if resistance > 0.0 {
                1.0 / resistance
            } else {
                fallback
            }
        };

        match condition {
            Condition::Internal(params) => Self {
                name: condition.name(),
                h: film(params, INTERNAL_FALLBACK_H),
                temperature: params.temperature(),
                color: INTERNAL_COLOR,
            },
            Condition::External(params) => Self {
                name: condition.name(),
                h: film(params, EXTERNAL_FALLBACK_H),
                temperature: params.temperature(),
                color: EXTERNAL_COLOR,
            },
            Condition::Adiabatic => Self {
                name: condition.name(),
                h: 0.0,
                temperature: 0.0,
                color: ADIABATIC_COLOR,
            },
        }
    }
}

/// Writes a scene as a THERM-XML document
pub struct ThermSerializer<'a> {
    config: &'a ThermConfig,
    save_date: String,
}

impl<'a> ThermSerializer<'a> {
    pub fn new(config: &'a ThermConfig) -> Self {
        Self {
            config,
            save_date: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    /// Fix the `SaveDate` header, mostly for reproducible output
    pub fn with_save_date(mut self, save_date: impl Into<String>) -> Self {
        self.save_date = save_date.into();
        self
    }

    pub fn serialize<S>(&self, scene: &S) -> Result<(Vec<u8>, ExportSummary), SerializationError>
    where
        S: SceneRepository + ?Sized,
    {
        let selected = scene.selected_solids();
        if selected.is_empty() {
            return Err(SerializationError::NoSolids);
        }

        let materials = self.collect_materials(scene);
        let polygons: Vec<PolygonEntry> = selected
            .iter()
            .flat_map(|solid| {
                solid.faces.iter().filter_map(move |face| {
                    let points: Vec<Point2<f64>> = solid.face_points(face).iter().map(plan_mm).collect();
                    (points.len() >= 3).then(|| PolygonEntry {
                        material: solid.face_material(face).unwrap_or(DEFAULT_MATERIAL).to_string(),
                        points,
                    })
                })
            })
            .collect();

        let (boundaries, unmatched_ufactors) =
            collect_boundaries(scene.registry(), &polygons, self.config.export_match_tolerance_mm);

        let mut conditions = vec![ConditionEntry::from_condition(&Condition::Adiabatic)];
        for boundary in &boundaries {
            let name = boundary.condition.name();
            if !conditions.iter().any(|entry| entry.name == name) {
                conditions.push(ConditionEntry::from_condition(&boundary.condition));
            }
        }

        let mut document = Document::new();
        document.decl()?;
        let mut root = BytesStart::new("THERM-XML");
        root.push_attribute(("xmlns", THERM_NAMESPACE));
        document.event(Event::Start(root))?;

        self.write_header(&mut document, &self.config.header)?;
        write_materials(&mut document, &materials)?;
        write_conditions(&mut document, &conditions)?;
        write_polygons(&mut document, &polygons)?;
        write_boundaries(&mut document, &boundaries, polygons.len() + 1, self.config.default_emissivity)?;

        document.event(Event::End(BytesEnd::new("THERM-XML")))?;

        let summary = ExportSummary {
            materials: materials.len(),
            polygons: polygons.len(),
            boundaries: boundaries.len(),
            boundary_conditions: conditions.into_iter().map(|entry| entry.name).collect(),
            unmatched_ufactors,
        };
        tracing::info!(
            polygons = summary.polygons,
            boundaries = summary.boundaries,
            "serialized THERM document"
        );

        Ok((document.finish(), summary))
    }

    fn collect_materials<S>(&self, scene: &S) -> Vec<MaterialEntry>
    where
        S: SceneRepository + ?Sized,
    {
        let mut names: Vec<&str> = scene
            .selected_solids()
            .into_iter()
            .flat_map(|solid| solid.materials.iter().map(String::as_str))
            .filter(|name| !DISPLAY_MATERIALS.contains(name))
            .collect();
        names.sort_unstable();
        names.dedup();
        if names.is_empty() {
            names.push(DEFAULT_MATERIAL);
        }

        names
            .into_iter()
            .map(|name| match scene.material(name) {
                Some(material) => MaterialEntry {
                    name: name.to_string(),
                    conductivity: material.explicit_conductivity().unwrap_or(self.config.default_conductivity),
                    emissivity: material.emissivity_or(self.config.default_emissivity),
                    color: material.rgb_hex(),
                },
                None => MaterialEntry {
                    name: name.to_string(),
                    conductivity: self.config.default_conductivity,
                    emissivity: self.config.default_emissivity,
                    color: DEFAULT_COLOR.to_string(),
                },
            })
            .collect()
    }

    fn write_header(&self, document: &mut Document, header: &HeaderConfig) -> Result<(), SerializationError> {
        document.text("ThermVersion", &header.therm_version)?;
        document.text("FileVersion", &header.file_version)?;
        document.text("SaveDate", &self.save_date)?;
        document.text("Title", &header.title)?;
        document.text("CreatedBy", &header.created_by)?;
        document.text("Company", &header.company)?;
        document.text("Client", &header.client)?;
        document.text("CrossSectionType", &header.cross_section_type)?;
        document.text("Notes", &header.notes)?;
        document.text("Units", &header.units)?;

        document.empty(
            "MeshControl",
            &[
                ("MeshLevel", header.mesh_level.to_string()),
                ("ErrorCheckFlag", header.error_check_flag.to_string()),
                ("ErrorLimit", format_short(header.error_limit)),
                ("MaxIterations", header.max_iterations.to_string()),
                ("CMAflag", header.cma_flag.to_string()),
            ],
        )
    }
}

/// Serialize with a fresh timestamp
pub fn serialize<S>(scene: &S, config: &ThermConfig) -> Result<Vec<u8>, SerializationError>
where
    S: SceneRepository + ?Sized,
{
    ThermSerializer::new(config).serialize(scene).map(|(bytes, _)| bytes)
}

/// Boundary entries in registry order, UFactor segments folded in last
fn collect_boundaries(
    registry: &SegmentRegistry,
    polygons: &[PolygonEntry],
    tolerance: f64,
) -> (Vec<BoundaryEntry>, usize) {
    let mut boundaries = Vec::new();
    let mut ufactors = Vec::new();

    for group in registry.groups() {
        for stored in group.segments() {
            let (start, end) = follow_polygon_winding(
                plan_mm(&stored.segment.start),
                plan_mm(&stored.segment.end),
                polygons,
                tolerance,
            );
            let condition = match group.key() {
                GroupKey::Internal(params) => Condition::Internal(*params),
                GroupKey::External(params) => Condition::External(*params),
                GroupKey::Adiabatic => Condition::Adiabatic,
                GroupKey::UFactor(label) => {
                    ufactors.push((label.clone(), start, end));
                    continue;
                }
            };
            boundaries.push(BoundaryEntry {
                condition,
                start,
                end,
                ufactor_tag: None,
            });
        }
    }

    let mut unmatched = 0;
    for (label, start, end) in ufactors {
        let partner = boundaries.iter_mut().find(|boundary| {
            same_edge(&boundary.start, &boundary.end, &start, &end, tolerance)
        });
        match partner {
            Some(boundary) => boundary.ufactor_tag = Some(label),
            None => {
                tracing::warn!(tag = %label, "UFactor segment matches no boundary, exporting as Adiabatic");
                unmatched += 1;
                boundaries.push(BoundaryEntry {
                    condition: Condition::Adiabatic,
                    start,
                    end,
                    ufactor_tag: Some(label),
                });
            }
        }
    }

    (boundaries, unmatched)
}

/// Order `(start, end)` like the first polygon edge it coincides with
fn follow_polygon_winding(
    start: Point2<f64>,
    end: Point2<f64>,
    polygons: &[PolygonEntry],
    tolerance: f64,
) -> (Point2<f64>, Point2<f64>) {
    for polygon in polygons {
        let n = polygon.points.len();
        for i in 0..n {
            let p1 = &polygon.points[i];
            let p2 = &polygon.points[(i + 1) % n];
            if points_match_2d(&start, p1, tolerance) && points_match_2d(&end, p2, tolerance) {
                return (start, end);
            }
            if points_match_2d(&start, p2, tolerance) && points_match_2d(&end, p1, tolerance) {
                return (end, start);
            }
        }
    }
    tracing::debug!(?start, ?end, "boundary lies on no polygon edge, keeping stored order");
    (start, end)
}

fn same_edge(a1: &Point2<f64>, a2: &Point2<f64>, b1: &Point2<f64>, b2: &Point2<f64>, tolerance: f64) -> bool {
    (points_match_2d(a1, b1, tolerance) && points_match_2d(a2, b2, tolerance))
        || (points_match_2d(a1, b2, tolerance) && points_match_2d(a2, b1, tolerance))
}

fn write_materials(document: &mut Document, materials: &[MaterialEntry]) -> Result<(), SerializationError> {
    document.start("Materials", &[])?;
    for (index, material) in materials.iter().enumerate() {
        let emissivity = format_value(material.emissivity);
        document.start(
            "Material",
            &[
                ("Name", material.name.clone()),
                ("Index", (index + 1).to_string()),
                ("Type", "0".to_string()),
                ("Conductivity", format_value(material.conductivity)),
                ("Tir", "0.00".to_string()),
                ("EmissivityFront", emissivity.clone()),
                ("EmissivityBack", emissivity),
                ("RGBColor", material.color.clone()),
            ],
        )?;
        for (side, range, specularity) in OPTICAL_PROPERTIES {
            document.empty(
                "Property",
                &[
                    ("Side", side.to_string()),
                    ("Range", range.to_string()),
                    ("Specularity", specularity.to_string()),
                    ("T", "0.00".to_string()),
                    ("R", "0.00".to_string()),
                ],
            )?;
        }
        document.end("Material")?;
    }
    document.end("Materials")
}

fn write_conditions(document: &mut Document, conditions: &[ConditionEntry]) -> Result<(), SerializationError> {
    document.start("BoundaryConditions", &[])?;
    for condition in conditions {
        let (h, temperature) = if condition.h == 0.0 {
            ("0.00".to_string(), "0.00".to_string())
        } else {
            (format_value(condition.h), format_value(condition.temperature))
        };
        document.empty(
            "BoundaryCondition",
            &[
                ("Name", condition.name.clone()),
                ("Type", "0".to_string()),
                ("H", h),
                ("HeatFLux", "0.00".to_string()),
                ("Temperature", temperature),
                ("RGBColor", condition.color.to_string()),
            ],
        )?;
    }
    document.end("BoundaryConditions")
}

fn write_polygons(document: &mut Document, polygons: &[PolygonEntry]) -> Result<(), SerializationError> {
    document.start("Polygons", &[])?;
    for (index, polygon) in polygons.iter().enumerate() {
        document.start(
            "Polygon",
            &[
                ("ID", (index + 1).to_string()),
                ("Material", polygon.material.clone()),
                ("NSides", polygon.points.len().to_string()),
                ("Type", "1".to_string()),
                ("units", "mm".to_string()),
            ],
        )?;
        for (point_index, point) in polygon.points.iter().enumerate() {
            write_point(document, point_index, point)?;
        }
        document.end("Polygon")?;
    }
    document.end("Polygons")
}

fn write_boundaries(
    document: &mut Document,
    boundaries: &[BoundaryEntry],
    first_id: usize,
    emissivity: f64,
) -> Result<(), SerializationError> {
    document.start("Boundaries", &[])?;
    for (offset, boundary) in boundaries.iter().enumerate() {
        document.start(
            "BCPolygon",
            &[
                ("ID", (first_id + offset).to_string()),
                ("BC", boundary.condition.name()),
                ("units", "mm".to_string()),
                ("MaterialName", String::new()),
                ("PolygonID", "1".to_string()),
                ("EnclosureID", "0".to_string()),
                ("UFactorTag", boundary.ufactor_tag.clone().unwrap_or_default()),
                ("Emissivity", format_short(emissivity)),
                ("MaterialSide", "Front".to_string()),
                ("IlluminatedSurface", "FALSE".to_string()),
            ],
        )?;
        write_point(document, 0, &boundary.start)?;
        write_point(document, 1, &boundary.end)?;
        document.end("BCPolygon")?;
    }
    document.end("Boundaries")
}

fn write_point(document: &mut Document, index: usize, point: &Point2<f64>) -> Result<(), SerializationError> {
    document.empty(
        "Point",
        &[
            ("index", index.to_string()),
            ("x", format_value(point.x)),
            ("y", format_value(point.y)),
        ],
    )
}

/// Tab-indented quick-xml writer over an in-memory buffer
struct Document {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl Document {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b'\t', 1),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), SerializationError> {
        self.writer.write_event(event).map_err(xml_error)
    }

    fn decl(&mut self) -> Result<(), SerializationError> {
        self.event(Event::Decl(BytesDecl::new("1.0", None, None)))
    }

    fn start(&mut self, name: &str, attributes: &[(&str, String)]) -> Result<(), SerializationError> {
        self.event(Event::Start(element(name, attributes)))
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, String)]) -> Result<(), SerializationError> {
        self.event(Event::Empty(element(name, attributes)))
    }

    fn end(&mut self, name: &str) -> Result<(), SerializationError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    /// `<name>text</name>`, or `<name/>` when empty
    fn text(&mut self, name: &str, text: &str) -> Result<(), SerializationError> {
        if text.is_empty() {
            return self.empty(name, &[]);
        }
        self.start(name, &[])?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }
}

fn element<'n>(name: &'n str, attributes: &[(&str, String)]) -> BytesStart<'n> {
    let mut start = BytesStart::new(name);
    for (key, value) in attributes {
        start.push_attribute((*key, value.as_str()));
    }
    start
}

fn xml_error(err: impl Display) -> SerializationError {
    SerializationError::Xml(err.to_string())
}
