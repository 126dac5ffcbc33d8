//! Placeholder dataset used when the case file cannot be loaded.

use serde_json::{Map, Value};
use tracing::info;

use crate::config::Schema;
use crate::dataset::{Dataset, Department, Polygon, Provenance, DEFAULT_CRS};
use crate::hash::{hash2, rand_simple};

/// Half the side of each placeholder square, in degrees
const HALF_SIDE: f64 = 0.35;

/// (DANE code, name, approximate centroid lon, lat)
const DEPARTMENTS: &[(&str, &str, f64, f64)] = &[
    ("05", "Antioquia", -75.5, 7.0),
    ("08", "Atlántico", -74.9, 10.7),
    ("11", "Bogotá, D.C.", -74.1, 4.6),
    ("13", "Bolívar", -74.5, 8.6),
    ("15", "Boyacá", -73.0, 5.8),
    ("17", "Caldas", -75.3, 5.3),
    ("19", "Cauca", -76.8, 2.4),
    ("20", "Cesar", -73.5, 9.5),
    ("23", "Córdoba", -75.8, 8.3),
    ("25", "Cundinamarca", -74.2, 5.2),
    ("68", "Santander", -73.3, 7.0),
    ("76", "Valle del Cauca", -76.5, 3.8),
];

fn square(lon: f64, lat: f64) -> Polygon {
    vec![vec![
        (lon - HALF_SIDE, lat - HALF_SIDE),
        (lon + HALF_SIDE, lat - HALF_SIDE),
        (lon + HALF_SIDE, lat + HALF_SIDE),
        (lon - HALF_SIDE, lat + HALF_SIDE),
        (lon - HALF_SIDE, lat - HALF_SIDE),
    ]]
}

/// Deterministic demonstration data covering every configured year
pub fn generate(schema: &Schema) -> Dataset {
    let departments: Vec<Department> = DEPARTMENTS
        .iter()
        .map(|&(code, name, lon, lat)| {
            let mut attributes = Map::new();
            attributes.insert(schema.boundary_key.clone(), Value::from(code));
            attributes.insert(schema.boundary_name.clone(), Value::from(name));
            attributes.insert(schema.case_key.clone(), Value::from(code));

            let code_seed = code.parse::<u64>().unwrap_or(0);
            let mut total = 0u64;
            for year in schema.years() {
                let cases = 50 + (rand_simple(hash2(code_seed, year as u64)) * 800.0) as u64;
                total += cases;
                attributes.insert(schema.year_column(year), Value::from(cases));
            }
            attributes.insert(schema.total_column.clone(), Value::from(total));

            Department {
                code: code.to_string(),
                name: name.to_string(),
                polygons: vec![square(lon, lat)],
                attributes,
            }
        })
        .collect();

    info!(departments = departments.len(), "generated synthetic dataset");
    Dataset::new(departments, DEFAULT_CRS, Provenance::Synthetic)
}
