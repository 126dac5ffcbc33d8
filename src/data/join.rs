//! Key normalization and the boundary ⟕ cases left join.

use std::collections::HashMap;

use serde_json::Value;

use crate::config::Schema;
use crate::data::{text, GeoTable};
use crate::dataset::Department;
use crate::error::{DashboardError, Result};

/// Width department codes are padded to
pub const KEY_WIDTH: usize = 2;

/// Trim and left-pad a code with zeros to [`KEY_WIDTH`]. Idempotent.
pub fn normalize_code(raw: &str) -> String {
    format!("{:0>width$}", raw.trim(), width = KEY_WIDTH)
}

/// Normalize a JSON cell into a join key. Integral numbers render without a
/// fractional part so `5` and `5.0` both become `"05"`.
pub fn normalize_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(normalize_code(s)),
        Value::Number(n) => {
            let raw = if let Some(i) = n.as_i64() {
                i.to_string()
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    (f as i64).to_string()
                } else {
                    f.to_string()
                }
            };
            Some(normalize_code(&raw))
        }
        Value::Bool(b) => Some(normalize_code(&b.to_string())),
        _ => None,
    }
}

/// Key of one row; object and array cells are a type error
fn row_key(
    properties: &serde_json::Map<String, Value>,
    column: &str,
    dataset: &'static str,
) -> Result<Option<String>> {
    match properties.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(_) | Value::Array(_)) => Err(DashboardError::KeyType {
            dataset,
            column: column.to_string(),
        }),
        Some(v) => Ok(normalize_key(v)),
    }
}

/// Left-join boundary records to case records on normalized department codes.
///
/// Every boundary row appears at least once; a boundary matching several case
/// rows appears once per match, in case-table order. Unmatched boundaries keep
/// no case attributes. Name collisions keep the boundary value and store the
/// case value under `<column>_cases`.
pub fn left_join(boundaries: &GeoTable, cases: &GeoTable, schema: &Schema) -> Result<Vec<Department>> {
    if !boundaries.has_column(&schema.boundary_key) {
        return Err(DashboardError::MissingColumn {
            dataset: "boundary",
            column: schema.boundary_key.clone(),
        });
    }
    if !cases.has_column(&schema.case_key) {
        return Err(DashboardError::MissingColumn {
            dataset: "case",
            column: schema.case_key.clone(),
        });
    }

    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, record) in cases.records.iter().enumerate() {
        if let Some(key) = row_key(&record.properties, &schema.case_key, "case")? {
            index.entry(key).or_default().push(i);
        }
    }

    let mut joined = Vec::with_capacity(boundaries.records.len());
    for record in &boundaries.records {
        let key = row_key(&record.properties, &schema.boundary_key, "boundary")?;

        let mut base = record.properties.clone();
        if let Some(ref key) = key {
            base.insert(schema.boundary_key.clone(), Value::String(key.clone()));
        }

        let matches = key.as_ref().and_then(|k| index.get(k));
        match matches {
            Some(indices) => {
                for &i in indices {
                    let case = &cases.records[i].properties;
                    let mut attributes = base.clone();
                    for (column, value) in case {
                        if *column == schema.boundary_key && *column == schema.case_key {
                            continue;
                        }
                        let value = if *column == schema.case_key {
                            key.clone().map(Value::String).unwrap_or(Value::Null)
                        } else {
                            value.clone()
                        };
                        if attributes.contains_key(column) {
                            attributes.insert(format!("{column}_cases"), value);
                        } else {
                            attributes.insert(column.clone(), value);
                        }
                    }
                    let name = text(&base, &schema.boundary_name)
                        .or_else(|| text(case, &schema.case_name))
                        .unwrap_or_default();
                    joined.push(Department {
                        code: key.clone().unwrap_or_default(),
                        name,
                        polygons: record.polygons.clone(),
                        attributes,
                    });
                }
            }
            None => joined.push(Department {
                code: key.clone().unwrap_or_default(),
                name: text(&base, &schema.boundary_name).unwrap_or_default(),
                polygons: record.polygons.clone(),
                attributes: base,
            }),
        }
    }

    Ok(joined)
}
