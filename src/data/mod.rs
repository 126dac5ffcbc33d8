//! Loading the boundary and case GeoJSON files into one in-memory dataset.

pub mod join;
pub mod synthetic;

use std::fs;
use std::path::Path;

use geojson::{Feature, GeoJson, Geometry, JsonObject, Value};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use crate::config::Schema;
use crate::dataset::{Dataset, Department, Polygon, Provenance, Ring, DEFAULT_CRS};
use crate::error::{DashboardError, Result};

/// One GeoJSON feature reduced to its attribute table row and polygons
#[derive(Clone, Debug, Default)]
pub struct FeatureRecord {
    pub properties: JsonObject,
    pub polygons: Vec<Polygon>,
}

/// A GeoJSON file as a table of records
#[derive(Clone, Debug, Default)]
pub struct GeoTable {
    pub records: Vec<FeatureRecord>,
    pub crs: Option<String>,
}

impl GeoTable {
    /// Every attribute name that appears in at least one record
    pub fn columns(&self) -> impl Iterator<Item = &String> {
        let mut seen = std::collections::BTreeSet::new();
        self.records
            .iter()
            .flat_map(|r| r.properties.keys())
            .filter(move |k| seen.insert(k.as_str()))
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.records.iter().any(|r| r.properties.contains_key(column))
    }

    pub fn has_geometry(&self) -> bool {
        self.records.iter().any(|r| !r.polygons.is_empty())
    }
}

/// Read a GeoJSON file into a [`GeoTable`]
pub fn read_geo_table(path: &Path) -> Result<GeoTable> {
    let mut bytes = fs::read(path)?;
    let geojson: GeoJson = simd_json::serde::from_slice(&mut bytes)?;
    geo_table_from_geojson(geojson)
}

pub fn geo_table_from_geojson(geojson: GeoJson) -> Result<GeoTable> {
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            let crs = fc.foreign_members.as_ref().and_then(crs_name);
            let records = fc.features.into_iter().map(feature_record).collect();
            Ok(GeoTable { records, crs })
        }
        GeoJson::Feature(feature) => {
            let crs = feature.foreign_members.as_ref().and_then(crs_name);
            Ok(GeoTable {
                records: vec![feature_record(feature)],
                crs,
            })
        }
        GeoJson::Geometry(_) => Err(DashboardError::GeoJson(
            "bare geometry has no attribute table".to_string(),
        )),
    }
}

/// Name from a legacy `"crs": {"type": "name", "properties": {"name": ...}}` member
fn crs_name(members: &JsonObject) -> Option<String> {
    members
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

fn feature_record(feature: Feature) -> FeatureRecord {
    let mut polygons = Vec::new();
    if let Some(ref geometry) = feature.geometry {
        collect_polygons(geometry, &mut polygons);
    }
    FeatureRecord {
        properties: feature.properties.unwrap_or_default(),
        polygons,
    }
}

fn collect_polygons(geometry: &Geometry, out: &mut Vec<Polygon>) {
    match &geometry.value {
        Value::Polygon(rings) => out.push(to_polygon(rings)),
        Value::MultiPolygon(polygons) => {
            out.extend(polygons.iter().map(|rings| to_polygon(rings)));
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Polygon {
    rings
        .iter()
        .map(|ring| -> Ring {
            ring.iter()
                .filter(|c| c.len() >= 2)
                .map(|c| (c[0], c[1]))
                .collect()
        })
        .filter(|ring| !ring.is_empty())
        .collect()
}

/// Load both files and join them, degrading instead of failing.
///
/// Missing case file: synthetic data. Missing boundary file or failed join:
/// the case records with their own geometry, or synthetic data when they have none.
pub fn load_dataset(boundaries: &Path, cases: &Path, schema: &Schema) -> Dataset {
    let case_table = match read_geo_table(cases) {
        Ok(table) => table,
        Err(err) => {
            warn!(path = %cases.display(), "failed to load case data ({err}), using synthetic data");
            return synthetic::generate(schema);
        }
    };

    let boundary_table = match read_geo_table(boundaries) {
        Ok(table) => table,
        Err(err) => {
            warn!(path = %boundaries.display(), "failed to load boundaries ({err}), using case geometry");
            return cases_only(case_table, schema);
        }
    };

    match join::left_join(&boundary_table, &case_table, schema) {
        Ok(departments) => {
            let crs = boundary_table
                .crs
                .clone()
                .unwrap_or_else(|| DEFAULT_CRS.to_string());
            let dataset = Dataset::new(departments, crs, Provenance::Joined)
                .with_columns(boundary_table.columns().cloned())
                .with_columns(case_table.columns().cloned());
            let matched = dataset
                .departments
                .iter()
                .filter(|d| d.attributes.contains_key(&schema.case_key))
                .count();
            info!(
                departments = dataset.len(),
                matched,
                crs = %dataset.crs,
                "joined boundaries with case records"
            );
            dataset
        }
        Err(err) => {
            warn!("merge failed ({err}), using case geometry");
            cases_only(case_table, schema)
        }
    }
}

/// Build the dataset from case records alone
pub fn cases_only(table: GeoTable, schema: &Schema) -> Dataset {
    if !table.has_geometry() {
        warn!("case data carries no geometry, using synthetic data");
        return synthetic::generate(schema);
    }

    let crs = table.crs.clone().unwrap_or_else(|| DEFAULT_CRS.to_string());
    let departments = table
        .records
        .into_iter()
        .map(|record| {
            let mut attributes = record.properties;
            let code = attributes
                .get(&schema.case_key)
                .and_then(join::normalize_key)
                .unwrap_or_default();
            if attributes.contains_key(&schema.case_key) {
                attributes.insert(schema.case_key.clone(), JsonValue::String(code.clone()));
            }
            let name = text(&attributes, &schema.case_name)
                .or_else(|| text(&attributes, &schema.boundary_name))
                .unwrap_or_default();
            Department {
                code,
                name,
                polygons: record.polygons,
                attributes,
            }
        })
        .collect();

    let dataset = Dataset::new(departments, crs, Provenance::CasesOnly);
    info!(departments = dataset.len(), "loaded case records without boundaries");
    dataset
}

/// Attribute rendered as display text (strings as-is, numbers formatted)
pub(crate) fn text(attributes: &JsonObject, column: &str) -> Option<String> {
    match attributes.get(column)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
