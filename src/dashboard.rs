use serde::Serialize;

use crate::config::Schema;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::metric::{compute_metric, fill_zero, top_n, Summary, TableRow, ViewMode, YearSelector, TOP_N};

/// The loaded dataset plus the schema it was loaded with. Read-only after startup.
pub struct Dashboard {
    dataset: Dataset,
    schema: Schema,
}

/// Everything one UI interaction renders
#[derive(Clone, Debug, Serialize)]
pub struct DashboardView {
    pub year: String,
    pub view: ViewMode,
    pub title: String,
    /// Zero-filled metric aligned with the dataset rows
    pub metric: Vec<f64>,
    pub summary: Summary,
    pub table: Vec<TableRow>,
}

impl Dashboard {
    pub fn new(dataset: Dataset, schema: Schema) -> Self {
        Self { dataset, schema }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn year_labels(&self) -> Vec<String> {
        self.schema.year_labels()
    }

    /// The range label is selected until the user picks something else
    pub fn default_year(&self) -> String {
        self.schema.range_label()
    }

    /// Recompute metric, summary and table for one selection
    pub fn view(&self, year: &str, view: ViewMode) -> Result<DashboardView> {
        let selector = YearSelector::parse(year)?;
        let metric = fill_zero(&compute_metric(&self.dataset, selector, &self.schema));
        let summary = Summary::compute(&self.dataset, &metric);
        let table = top_n(&self.dataset, &metric, TOP_N);
        let year = selector.to_string();
        Ok(DashboardView {
            title: title(&year, view),
            year,
            view,
            metric,
            summary,
            table,
        })
    }
}

pub fn title(year: &str, view: ViewMode) -> String {
    format!("Casos VIH - {year} - Vista: {view}")
}
