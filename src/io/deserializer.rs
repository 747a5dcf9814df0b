// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! THERM-XML reader
//!
//! Reads both files written by [`super::serialize`] (a `Polygons` section)
//! and files saved by the simulation tool (a `MeshInput` section plus
//! optional `Results`). Coordinates come back in metres.

use super::format::parse_rgb_hex;
use crate::boundary::{DirectedSegment, GroupKey, SegmentRegistry};
use crate::error::{DeserializationError, RegistryError};
use crate::geometry::Solid;
use crate::scene::Material;
use crate::utils::math::from_mm;
use nalgebra::Point3;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use std::collections::BTreeMap;

type Result<T> = std::result::Result<T, DeserializationError>;

/// Vertices closer than this (metres) are shared when rebuilding solids
const WELD_EPSILON: f64 = 1e-6;

/// Display colors for material ids in a mesh section
const MESH_MATERIAL_COLORS: [(&str, [f32; 3]); 5] = [
    ("1", [0.8, 0.8, 0.8]),
    ("2", [0.2, 0.2, 0.8]),
    ("3", [0.8, 0.2, 0.2]),
    ("4", [0.2, 0.8, 0.2]),
    ("5", [0.8, 0.8, 0.2]),
];

/// A `BoundaryCondition` entry as read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryConditionRecord {
    pub name: String,
    pub h: f64,
    pub temperature: f64,
    pub color: Option<String>,
}

/// One projection of a U-factor result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub length_type: String,
    pub length: f64,
    pub length_units: String,
    pub ufactor: f64,
    pub ufactor_units: String,
}

/// A `U-factors` block from the results section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UFactorResult {
    pub tag: String,
    pub projections: Vec<Projection>,
}

/// Everything recovered from an interchange file
#[derive(Debug, Clone, Default)]
pub struct ImportedModel {
    pub title: Option<String>,
    pub solids: Vec<Solid>,
    pub materials: Vec<Material>,
    pub boundary_conditions: Vec<BoundaryConditionRecord>,
    pub registry: SegmentRegistry,
    pub results: Vec<UFactorResult>,
    /// Boundary polygons that could not be placed in the registry
    pub skipped_boundaries: usize,
}

#[derive(Debug)]
struct RawBoundary {
    bc: String,
    ufactor_tag: String,
    points: Vec<Point3<f64>>,
}

#[derive(Default)]
struct RawDocument {
    title: Option<String>,
    materials: Vec<Material>,
    conditions: Vec<BoundaryConditionRecord>,
    /// Material name and loop per polygon
    polygons: Vec<(String, Vec<Point3<f64>>)>,
    nodes: BTreeMap<i64, Point3<f64>>,
    /// Material id and node indices per element
    elements: Vec<(String, Vec<i64>)>,
    boundaries: Vec<RawBoundary>,
    results: Vec<UFactorResult>,
}

/// Parse an interchange document.
///
/// Fails on malformed or truncated XML, a wrong root element or a missing
/// or unparsable required attribute. Nothing is returned on failure, so a
/// caller's scene stays untouched.
pub fn deserialize(xml: &str) -> Result<ImportedModel> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut document: Option<RawDocument> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() != b"THERM-XML" {
                    return Err(DeserializationError::UnexpectedRoot(element_name(e)));
                }
                document = Some(parse_root(&mut reader)?);
                break;
            }
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() != b"THERM-XML" {
                    return Err(DeserializationError::UnexpectedRoot(element_name(e)));
                }
                document = Some(RawDocument::default());
                break;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(DeserializationError::Xml(e.to_string())),
        }
        buf.clear();
    }

    let document = document.ok_or(DeserializationError::MissingRoot)?;
    Ok(build_model(document))
}

fn parse_root(reader: &mut Reader<&[u8]>) -> Result<RawDocument> {
    let mut document = RawDocument::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name().as_ref().to_vec();
                match name.as_slice() {
                    b"Title" => document.title = Some(read_text(reader, b"Title")?),
                    b"Materials" => document.materials = parse_materials(reader)?,
                    b"BoundaryConditions" => document.conditions = parse_conditions(reader)?,
                    b"Polygons" => document.polygons = parse_polygons(reader)?,
                    b"MeshInput" => parse_mesh(reader, &mut document)?,
                    b"Boundaries" => document.boundaries = parse_boundaries(reader)?,
                    b"Results" => document.results.extend(parse_results(reader)?),
                    _ => skip_element(reader, &name)?,
                }
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"THERM-XML" => break,
            Ok(Event::Eof) => return Err(unexpected_eof(b"THERM-XML")),
            Ok(_) => {}
            Err(e) => return Err(DeserializationError::Xml(e.to_string())),
        }
        buf.clear();
    }

    Ok(document)
}

fn parse_materials(reader: &mut Reader<&[u8]>) -> Result<Vec<Material>> {
    let mut materials = Vec::new();
    each_child(reader, b"Materials", |reader, e, is_empty| {
        if e.local_name().as_ref() == b"Material" {
            let name = require_attribute(e, "Name")?;
            let mut material = Material::new(name);
            material.conductivity = parse_float_attr(e, "Conductivity");
            material.emissivity = parse_float_attr(e, "EmissivityFront");
            material.color = get_attribute_opt(e, "RGBColor").and_then(|c| parse_rgb_hex(&c));
            materials.push(material);
        }
        if !is_empty {
            skip_element(reader, e.local_name().as_ref())?;
        }
        Ok(())
    })?;
    Ok(materials)
}

fn parse_conditions(reader: &mut Reader<&[u8]>) -> Result<Vec<BoundaryConditionRecord>> {
    let mut conditions = Vec::new();
    each_child(reader, b"BoundaryConditions", |reader, e, is_empty| {
        if e.local_name().as_ref() == b"BoundaryCondition" {
            conditions.push(BoundaryConditionRecord {
                name: require_attribute(e, "Name")?,
                h: parse_float_attr(e, "H").unwrap_or(0.0),
                temperature: parse_float_attr(e, "Temperature").unwrap_or(0.0),
                color: get_attribute_opt(e, "RGBColor"),
            });
        }
        if !is_empty {
            skip_element(reader, e.local_name().as_ref())?;
        }
        Ok(())
    })?;
    Ok(conditions)
}

fn parse_polygons(reader: &mut Reader<&[u8]>) -> Result<Vec<(String, Vec<Point3<f64>>)>> {
    let mut polygons = Vec::new();
    each_child(reader, b"Polygons", |reader, e, is_empty| {
        if e.local_name().as_ref() != b"Polygon" {
            if !is_empty {
                skip_element(reader, e.local_name().as_ref())?;
            }
            return Ok(());
        }
        let material = get_attribute_opt(e, "Material").unwrap_or_default();
        let points = if is_empty {
            Vec::new()
        } else {
            parse_points(reader, b"Polygon")?
        };
        polygons.push((material, points));
        Ok(())
    })?;
    Ok(polygons)
}

fn parse_mesh(reader: &mut Reader<&[u8]>, document: &mut RawDocument) -> Result<()> {
    each_child(reader, b"MeshInput", |reader, e, is_empty| {
        let name = e.local_name().as_ref().to_vec();
        match name.as_slice() {
            b"Nodes" if !is_empty => each_child(reader, b"Nodes", |reader, node, is_empty| {
                if node.local_name().as_ref() == b"Node" {
                    let index = parse_required::<i64>(node, "index")?;
                    let x = parse_required::<f64>(node, "x")?;
                    let y = parse_required::<f64>(node, "y")?;
                    document.nodes.insert(index, Point3::new(from_mm(x), from_mm(y), 0.0));
                }
                if !is_empty {
                    skip_element(reader, node.local_name().as_ref())?;
                }
                Ok(())
            }),
            b"Elements" if !is_empty => each_child(reader, b"Elements", |reader, element, is_empty| {
                if element.local_name().as_ref() == b"Element" {
                    let material_id = require_attribute(element, "materialID")?;
                    document.elements.push((material_id, element_nodes(element)));
                }
                if !is_empty {
                    skip_element(reader, element.local_name().as_ref())?;
                }
                Ok(())
            }),
            _ if !is_empty => skip_element(reader, &name),
            _ => Ok(()),
        }
    })
}

/// `node1`, `node2`, ... in numeric order
fn element_nodes(element: &BytesStart) -> Vec<i64> {
    let mut numbered: Vec<(u32, i64)> = element
        .attributes()
        .flatten()
        .filter_map(|attr| {
            let key = std::str::from_utf8(attr.key.as_ref()).ok()?;
            let position = key.strip_prefix("node")?.parse::<u32>().ok()?;
            let value = std::str::from_utf8(&attr.value).ok()?.trim().parse::<i64>().ok()?;
            Some((position, value))
        })
        .collect();
    numbered.sort_by_key(|(position, _)| *position);
    numbered.into_iter().map(|(_, node)| node).collect()
}

fn parse_boundaries(reader: &mut Reader<&[u8]>) -> Result<Vec<RawBoundary>> {
    let mut boundaries = Vec::new();
    each_child(reader, b"Boundaries", |reader, e, is_empty| {
        if e.local_name().as_ref() != b"BCPolygon" {
            if !is_empty {
                skip_element(reader, e.local_name().as_ref())?;
            }
            return Ok(());
        }
        let bc = get_attribute_opt(e, "BC").unwrap_or_else(|| "Unknown".to_string());
        let ufactor_tag = get_attribute_opt(e, "UFactorTag").unwrap_or_default();
        let points = if is_empty {
            Vec::new()
        } else {
            parse_points(reader, b"BCPolygon")?
        };
        boundaries.push(RawBoundary {
            bc,
            ufactor_tag,
            points,
        });
        Ok(())
    })?;
    Ok(boundaries)
}

fn parse_results(reader: &mut Reader<&[u8]>) -> Result<Vec<UFactorResult>> {
    let mut results = Vec::new();
    let mut buf = Vec::new();
    let mut depth = 1;

    // U-factors blocks may sit at any depth below Results
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"U-factors" => {
                results.push(parse_ufactors(reader)?);
            }
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => return Err(unexpected_eof(b"Results")),
            Ok(_) => {}
            Err(e) => return Err(DeserializationError::Xml(e.to_string())),
        }
        buf.clear();
    }

    Ok(results)
}

fn parse_ufactors(reader: &mut Reader<&[u8]>) -> Result<UFactorResult> {
    let mut tag = None;
    let mut projections = Vec::new();

    each_child(reader, b"U-factors", |reader, e, is_empty| {
        match e.local_name().as_ref() {
            b"Tag" if !is_empty => tag = Some(read_text(reader, b"Tag")?),
            b"Projection" if !is_empty => {
                if let Some(projection) = parse_projection(reader)? {
                    projections.push(projection);
                }
            }
            name if !is_empty => skip_element(reader, &name.to_vec())?,
            _ => {}
        }
        Ok(())
    })?;

    Ok(UFactorResult {
        tag: tag.unwrap_or_else(|| "Unknown".to_string()),
        projections,
    })
}

/// A projection needs all of Length-type, Length and U-factor
fn parse_projection(reader: &mut Reader<&[u8]>) -> Result<Option<Projection>> {
    let mut length_type = None;
    let mut length = None;
    let mut ufactor = None;

    each_child(reader, b"Projection", |reader, e, is_empty| {
        match e.local_name().as_ref() {
            b"Length-type" if !is_empty => length_type = Some(read_text(reader, b"Length-type")?),
            b"Length" => {
                length = Some((
                    parse_required::<f64>(e, "value")?,
                    get_attribute_opt(e, "units").unwrap_or_else(|| "mm".to_string()),
                ));
                if !is_empty {
                    skip_element(reader, b"Length")?;
                }
            }
            b"U-factor" => {
                ufactor = Some((
                    parse_required::<f64>(e, "value")?,
                    get_attribute_opt(e, "units").unwrap_or_else(|| "W/m2-K".to_string()),
                ));
                if !is_empty {
                    skip_element(reader, b"U-factor")?;
                }
            }
            name if !is_empty => skip_element(reader, &name.to_vec())?,
            _ => {}
        }
        Ok(())
    })?;

    Ok(match (length_type, length, ufactor) {
        (Some(length_type), Some((length, length_units)), Some((ufactor, ufactor_units))) => Some(Projection {
            length_type,
            length,
            length_units,
            ufactor,
            ufactor_units,
        }),
        _ => None,
    })
}

/// `Point index, x, y` children in millimetres, returned in metres by index
fn parse_points(reader: &mut Reader<&[u8]>, parent: &[u8]) -> Result<Vec<Point3<f64>>> {
    let mut points = Vec::new();
    each_child(reader, parent, |reader, e, is_empty| {
        if e.local_name().as_ref() == b"Point" {
            let index = parse_float_attr(e, "index").map_or(points.len() as i64, |i| i as i64);
            let x = parse_required::<f64>(e, "x")?;
            let y = parse_required::<f64>(e, "y")?;
            points.push((index, Point3::new(from_mm(x), from_mm(y), 0.0)));
        }
        if !is_empty {
            skip_element(reader, e.local_name().as_ref())?;
        }
        Ok(())
    })?;
    points.sort_by_key(|(index, _)| *index);
    Ok(points.into_iter().map(|(_, point)| point).collect())
}

fn build_model(document: RawDocument) -> ImportedModel {
    let RawDocument {
        title,
        mut materials,
        conditions,
        polygons,
        nodes,
        elements,
        boundaries,
        results,
    } = document;

    let mut solids = solids_from_polygons(&polygons);
    let (mesh_solids, mesh_materials) = solids_from_mesh(&nodes, &elements);
    solids.extend(mesh_solids);
    for material in mesh_materials {
        if !materials.iter().any(|m| m.name == material.name) {
            materials.push(material);
        }
    }

    let mut registry = SegmentRegistry::default();
    let mut skipped = 0;
    let classifier = ConditionClassifier::new(&conditions);

    for boundary in &boundaries {
        if boundary.points.len() < 2 {
            tracing::warn!(bc = %boundary.bc, "boundary with fewer than two points skipped");
            skipped += 1;
            continue;
        }
        let Some(key) = classifier.classify(&boundary.bc) else {
            tracing::warn!(bc = %boundary.bc, "unknown boundary condition skipped");
            skipped += 1;
            continue;
        };

        for pair in boundary.points.windows(2) {
            let segment = DirectedSegment::new(pair[0], pair[1]);
            if !register(&mut registry, segment, key.clone()) {
                skipped += 1;
            }
            if !boundary.ufactor_tag.is_empty()
                && !register(&mut registry, segment, GroupKey::ufactor(boundary.ufactor_tag.as_str()))
            {
                skipped += 1;
            }
        }
    }

    tracing::info!(
        solids = solids.len(),
        segments = registry.len(),
        results = results.len(),
        "deserialized THERM document"
    );

    ImportedModel {
        title,
        solids,
        materials,
        boundary_conditions: conditions,
        registry,
        results,
        skipped_boundaries: skipped,
    }
}

/// False when the segment was rejected for a reason other than being a repeat
fn register(registry: &mut SegmentRegistry, segment: DirectedSegment, key: GroupKey) -> bool {
    match registry.add_segment(segment, key) {
        Ok(_) => true,
        Err(RegistryError::Duplicate) => {
            tracing::debug!("duplicate boundary segment in file skipped");
            true
        }
        Err(err) => {
            tracing::warn!("boundary segment skipped: {err}");
            false
        }
    }
}

/// One solid per material name, in first-seen order
fn solids_from_polygons(polygons: &[(String, Vec<Point3<f64>>)]) -> Vec<Solid> {
    let mut order: Vec<&str> = Vec::new();
    let mut loops: BTreeMap<&str, Vec<Vec<Point3<f64>>>> = BTreeMap::new();

    for (material, points) in polygons {
        if points.len() < 3 {
            continue;
        }
        if !loops.contains_key(material.as_str()) {
            order.push(material);
        }
        loops.entry(material).or_default().push(points.clone());
    }

    order
        .into_iter()
        .filter_map(|material| {
            let faces = loops.get(material)?;
            Some(Solid::from_loops(material, faces, Some(material), WELD_EPSILON))
        })
        .collect()
}

/// One solid per material id; elements with fewer than three known nodes are dropped
fn solids_from_mesh(nodes: &BTreeMap<i64, Point3<f64>>, elements: &[(String, Vec<i64>)]) -> (Vec<Solid>, Vec<Material>) {
    let mut order: Vec<&str> = Vec::new();
    let mut loops: BTreeMap<&str, Vec<Vec<Point3<f64>>>> = BTreeMap::new();

    for (material_id, node_indices) in elements {
        let points: Vec<Point3<f64>> = node_indices.iter().filter_map(|index| nodes.get(index).copied()).collect();
        if points.len() < 3 {
            continue;
        }
        if !loops.contains_key(material_id.as_str()) {
            order.push(material_id);
        }
        loops.entry(material_id).or_default().push(points);
    }

    let mut solids = Vec::new();
    let mut materials = Vec::new();
    for material_id in order {
        let Some(faces) = loops.get(material_id) else {
            continue;
        };
        let material_name = format!("Material_{material_id}");
        let color = MESH_MATERIAL_COLORS
            .iter()
            .find(|(id, _)| *id == material_id)
            .map_or([0.5, 0.5, 0.5], |(_, color)| *color);

        solids.push(Solid::from_loops(
            format!("THERM_Material_{material_id}"),
            faces,
            Some(material_name.as_str()),
            WELD_EPSILON,
        ));
        materials.push(Material::new(material_name).with_color(color));
    }

    (solids, materials)
}

/// Maps a `BC` name onto a registry group
struct ConditionClassifier<'a> {
    conditions: &'a [BoundaryConditionRecord],
    /// Temperatures at or above this are treated as interior
    interior_threshold: f64,
}

impl<'a> ConditionClassifier<'a> {
    fn new(conditions: &'a [BoundaryConditionRecord]) -> Self {
        let temperatures: Vec<f64> = conditions
            .iter()
            .filter(|condition| condition.h > 0.0)
            .map(|condition| condition.temperature)
            .collect();
        let lowest = temperatures.iter().copied().fold(f64::INFINITY, f64::min);
        let highest = temperatures.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            conditions,
            interior_threshold: (lowest + highest) / 2.0,
        }
    }

    fn classify(&self, name: &str) -> Option<GroupKey> {
        if name == "Adiabatic" {
            return Some(GroupKey::adiabatic());
        }
        if let Some(rest) = name.strip_prefix("Ti=") {
            let (temperature, resistance) = split_condition(rest, "Rsi=")?;
            return Some(GroupKey::internal(temperature, resistance));
        }
        if let Some(rest) = name.strip_prefix("Te=") {
            let (temperature, resistance) = split_condition(rest, "Rse=")?;
            return Some(GroupKey::external(temperature, resistance));
        }

        // Names the tool or a user chose: decide from the condition table
        let condition = self.conditions.iter().find(|condition| condition.name == name)?;
        if condition.h <= 0.0 {
            return Some(GroupKey::adiabatic());
        }
        let resistance = 1.0 / condition.h;
        if condition.temperature >= self.interior_threshold {
            Some(GroupKey::internal(condition.temperature, resistance))
        } else {
            Some(GroupKey::external(condition.temperature, resistance))
        }
    }
}

fn split_condition(text: &str, marker: &str) -> Option<(f64, f64)> {
    let (temperature, resistance) = text.split_once(marker)?;
    Some((temperature.trim().parse().ok()?, resistance.trim().parse().ok()?))
}

/// Visit each direct child of the element `parent` until its end tag.
///
/// The visitor receives the child's start tag and whether it was
/// self-closing; a non-empty child must be consumed by the visitor.
fn each_child<F>(reader: &mut Reader<&[u8]>, parent: &[u8], mut visit: F) -> Result<()>
where
    F: FnMut(&mut Reader<&[u8]>, &BytesStart, bool) -> Result<()>,
{
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let start = e.to_owned();
                visit(reader, &start, false)?;
            }
            Ok(Event::Empty(ref e)) => {
                let start = e.to_owned();
                visit(reader, &start, true)?;
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == parent => break,
            Ok(Event::Eof) => return Err(unexpected_eof(parent)),
            Ok(_) => {}
            Err(e) => return Err(DeserializationError::Xml(e.to_string())),
        }
        buf.clear();
    }

    Ok(())
}

/// Text content up to the end of `name`
fn read_text(reader: &mut Reader<&[u8]>, name: &[u8]) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Text(ref e)) => {
                let chunk = e.unescape().map_err(|err| DeserializationError::Xml(err.to_string()))?;
                text.push_str(&chunk);
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == name => break,
            Ok(Event::Start(ref e)) => {
                let nested = e.local_name().as_ref().to_vec();
                skip_element(reader, &nested)?;
            }
            Ok(Event::Eof) => return Err(unexpected_eof(name)),
            Ok(_) => {}
            Err(e) => return Err(DeserializationError::Xml(e.to_string())),
        }
        buf.clear();
    }

    Ok(text)
}

fn skip_element(reader: &mut Reader<&[u8]>, name: &[u8]) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == name => {
                depth += 1;
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == name => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => return Err(unexpected_eof(name)),
            Ok(_) => {}
            Err(e) => return Err(DeserializationError::Xml(e.to_string())),
        }
        buf.clear();
    }

    Ok(())
}

/// The document ended while `name` was still open
fn unexpected_eof(name: &[u8]) -> DeserializationError {
    DeserializationError::Xml(format!(
        "unexpected end of document inside <{}>",
        String::from_utf8_lossy(name)
    ))
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn get_attribute_opt(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return attr.unescape_value().ok().map(|value| value.into_owned());
        }
    }
    None
}

fn parse_float_attr(e: &BytesStart, name: &str) -> Option<f64> {
    get_attribute_opt(e, name).and_then(|s| s.trim().parse().ok())
}

fn require_attribute(e: &BytesStart, name: &'static str) -> Result<String> {
    get_attribute_opt(e, name).ok_or_else(|| DeserializationError::missing_attribute(name, &element_name(e)))
}

fn parse_required<T: std::str::FromStr>(e: &BytesStart, name: &'static str) -> Result<T> {
    let raw = require_attribute(e, name)?;
    raw.trim()
        .parse()
        .map_err(|_| DeserializationError::invalid_attribute(name, &element_name(e), &raw))
}
