//! Colombian HIV cases by department: joins boundary and case GeoJSON,
//! derives a per-department metric for a year or the full range, and
//! presents it as a web dashboard or a braille terminal map.

pub mod app;
pub mod braille;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod dataset;
pub mod error;
pub mod hash;
pub mod map;
pub mod metric;
pub mod ui;
pub mod web;
