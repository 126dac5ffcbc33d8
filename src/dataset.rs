use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};

/// A closed ring of lon/lat coordinates
pub type Ring = Vec<(f64, f64)>;

/// Exterior ring first, holes after
pub type Polygon = Vec<Ring>;

pub const DEFAULT_CRS: &str = "EPSG:4326";

/// One joined row: boundary attributes plus the matched case attributes
#[derive(Clone, Debug, Default)]
pub struct Department {
    /// Normalized department code ("05", "76", ...)
    pub code: String,
    pub name: String,
    pub polygons: Vec<Polygon>,
    pub attributes: Map<String, Value>,
}

impl Department {
    /// Numeric value of an attribute; numeric strings are parsed, anything else is null
    pub fn number(&self, column: &str) -> Option<f64> {
        self.attributes.get(column).and_then(value_as_f64)
    }
}

pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Where the in-memory dataset came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Boundaries left-joined with case records
    Joined,
    /// Case records with their own geometry
    CasesOnly,
    /// Generated placeholder data
    Synthetic,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Joined => "joined",
            Provenance::CasesOnly => "cases_only",
            Provenance::Synthetic => "synthetic",
        }
    }
}

/// The dataset loaded at startup. Row order is significant for tie-breaking.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub departments: Vec<Department>,
    pub columns: BTreeSet<String>,
    pub crs: String,
    pub provenance: Provenance,
}

impl Dataset {
    pub fn new(departments: Vec<Department>, crs: impl Into<String>, provenance: Provenance) -> Self {
        let columns = departments
            .iter()
            .flat_map(|d| d.attributes.keys().cloned())
            .collect();
        Self {
            departments,
            columns,
            crs: crs.into(),
            provenance,
        }
    }

    /// Register columns that exist in a source table even if no row carries them
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = String>) -> Self {
        self.columns.extend(columns);
        self
    }

    pub fn len(&self) -> usize {
        self.departments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    /// Bounding box of all geometry as (min_lon, min_lat, max_lon, max_lat)
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self
            .departments
            .iter()
            .flat_map(|d| d.polygons.iter())
            .flat_map(|p| p.iter())
            .flat_map(|r| r.iter())
            .peekable();
        points.peek()?;
        Some(points.fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(min_lon, min_lat, max_lon, max_lat), &(lon, lat)| {
                (min_lon.min(lon), min_lat.min(lat), max_lon.max(lon), max_lat.max(lat))
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn department(code: &str, attrs: Value) -> Department {
        Department {
            code: code.to_string(),
            name: code.to_string(),
            polygons: Vec::new(),
            attributes: attrs.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_number_parsing() {
        let d = department("05", json!({"a": 10, "b": "12.5", "c": null, "d": "x", "e": true}));
        assert_eq!(d.number("a"), Some(10.0));
        assert_eq!(d.number("b"), Some(12.5));
        assert_eq!(d.number("c"), None);
        assert_eq!(d.number("d"), None);
        assert_eq!(d.number("e"), None);
        assert_eq!(d.number("missing"), None);
    }

    #[test]
    fn test_columns_union() {
        let ds = Dataset::new(
            vec![department("05", json!({"a": 1})), department("08", json!({"b": 2}))],
            DEFAULT_CRS,
            Provenance::Joined,
        )
        .with_columns(["c".to_string()]);
        assert!(ds.has_column("a"));
        assert!(ds.has_column("b"));
        assert!(ds.has_column("c"));
        assert!(!ds.has_column("d"));
    }

    #[test]
    fn test_bounds() {
        let mut d = department("05", json!({}));
        d.polygons = vec![vec![vec![(-75.0, 6.0), (-74.0, 6.0), (-74.0, 7.5), (-75.0, 6.0)]]];
        let ds = Dataset::new(vec![d], DEFAULT_CRS, Provenance::Joined);
        assert_eq!(ds.bounds(), Some((-75.0, 6.0, -74.0, 7.5)));

        let empty = Dataset::new(Vec::new(), DEFAULT_CRS, Provenance::Synthetic);
        assert_eq!(empty.bounds(), None);
    }
}
