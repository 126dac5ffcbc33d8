//! Per-department metric for a year or year range, and the statistics derived from it.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Schema;
use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};

/// Rows shown in the ranked table
pub const TOP_N: usize = 10;

/// What the user picked in the year dropdown
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum YearSelector {
    Year(u16),
    /// Inclusive span of years, summed row-wise
    Range { first: u16, last: u16 },
}

impl YearSelector {
    pub fn parse(label: &str) -> Result<Self> {
        let invalid = || DashboardError::InvalidSelector(label.to_string());
        let label = label.trim();
        match label.split_once('-') {
            Some((first, last)) => {
                let first = parse_year(first).ok_or_else(invalid)?;
                let last = parse_year(last).ok_or_else(invalid)?;
                if first > last {
                    return Err(invalid());
                }
                Ok(YearSelector::Range { first, last })
            }
            None => parse_year(label).map(YearSelector::Year).ok_or_else(invalid),
        }
    }

    pub fn years(&self) -> RangeInclusive<u16> {
        match *self {
            YearSelector::Year(year) => year..=year,
            YearSelector::Range { first, last } => first..=last,
        }
    }
}

fn parse_year(s: &str) -> Option<u16> {
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

impl FromStr for YearSelector {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for YearSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearSelector::Year(year) => write!(f, "{year}"),
            YearSelector::Range { first, last } => write!(f, "{first}-{last}"),
        }
    }
}

/// How the metric is drawn. Never affects the metric itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Choropleth,
    #[default]
    Bubbles,
}

impl ViewMode {
    pub const ALL: [ViewMode; 2] = [ViewMode::Choropleth, ViewMode::Bubbles];

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "choropleth" => Ok(ViewMode::Choropleth),
            "bubbles" => Ok(ViewMode::Bubbles),
            other => Err(DashboardError::InvalidView(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Choropleth => "choropleth",
            ViewMode::Bubbles => "bubbles",
        }
    }

    /// Label shown in the view dropdown
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Choropleth => "Mapa choropleth",
            ViewMode::Bubbles => "Mapa de círculos proporcionales",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            ViewMode::Choropleth => ViewMode::Bubbles,
            ViewMode::Bubbles => ViewMode::Choropleth,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per department, in dataset order.
///
/// A single year reads its column; when the column does not exist at all every
/// row is `None`. A range sums the covered year columns row-wise with nulls
/// counted as zero, so every row is `Some`.
pub fn compute_metric(dataset: &Dataset, selector: YearSelector, schema: &Schema) -> Vec<Option<f64>> {
    match selector {
        YearSelector::Year(year) => {
            let column = schema.year_column(year);
            if !dataset.has_column(&column) {
                return vec![None; dataset.len()];
            }
            dataset.departments.iter().map(|d| d.number(&column)).collect()
        }
        YearSelector::Range { .. } => {
            let columns: Vec<String> = selector
                .years()
                .map(|year| schema.year_column(year))
                .filter(|column| dataset.has_column(column))
                .collect();
            dataset
                .departments
                .iter()
                .map(|d| Some(columns.iter().map(|c| d.number(c).unwrap_or(0.0)).sum()))
                .collect()
        }
    }
}

pub fn fill_zero(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().map(|v| v.unwrap_or(0.0)).collect()
}

/// The three headline figures
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub total: u64,
    pub mean: f64,
    /// Name of the first department with the largest metric; empty when no
    /// department has a positive metric
    pub top_department: String,
}

impl Summary {
    /// `metric` must already be zero-filled and aligned with `dataset`
    pub fn compute(dataset: &Dataset, metric: &[f64]) -> Self {
        let sum: f64 = metric.iter().sum();
        let mean = if metric.is_empty() {
            0.0
        } else {
            sum / metric.len() as f64
        };

        let top_department = argmax(metric)
            .filter(|&i| metric[i] > 0.0)
            .and_then(|i| dataset.departments.get(i))
            .map(|d| d.name.clone())
            .unwrap_or_default();

        Self {
            total: sum.max(0.0) as u64,
            mean,
            top_department,
        }
    }
}

/// Index of the first maximum
fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// A row of the ranked table
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableRow {
    pub code: String,
    pub name: String,
    pub cases: f64,
}

/// At most `n` rows by metric descending; ties keep dataset order
pub fn top_n(dataset: &Dataset, metric: &[f64], n: usize) -> Vec<TableRow> {
    let mut order: Vec<usize> = (0..metric.len().min(dataset.len())).collect();
    order.sort_by(|&a, &b| metric[b].total_cmp(&metric[a]));
    order
        .into_iter()
        .take(n)
        .map(|i| {
            let d = &dataset.departments[i];
            TableRow {
                code: d.code.clone(),
                name: d.name.clone(),
                cases: metric[i],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Department, Provenance, DEFAULT_CRS};
    use serde_json::{json, Value};

    fn dataset(rows: Vec<(&str, &str, Value)>) -> Dataset {
        let departments = rows
            .into_iter()
            .map(|(code, name, attrs)| Department {
                code: code.to_string(),
                name: name.to_string(),
                polygons: Vec::new(),
                attributes: attrs.as_object().cloned().unwrap_or_default(),
            })
            .collect();
        Dataset::new(departments, DEFAULT_CRS, Provenance::Joined)
    }

    fn two_departments() -> Dataset {
        dataset(vec![
            ("05", "Antioquia", json!({"Ano2009": 10, "Ano2010": 20})),
            ("08", "Atlántico", json!({"Ano2009": null, "Ano2010": null})),
        ])
    }

    #[test]
    fn test_parse_selector() {
        assert_eq!(YearSelector::parse("2010").unwrap(), YearSelector::Year(2010));
        assert_eq!(
            YearSelector::parse("2009-2012").unwrap(),
            YearSelector::Range { first: 2009, last: 2012 }
        );
        assert_eq!("2011".parse::<YearSelector>().unwrap().to_string(), "2011");
        assert_eq!(YearSelector::Range { first: 2009, last: 2012 }.to_string(), "2009-2012");
        for bad in ["", "abc", "20", "2012-2009", "2009-", "-2009", "2009-2010-2011", "+209"] {
            assert!(YearSelector::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_view() {
        assert_eq!(ViewMode::parse("choropleth").unwrap(), ViewMode::Choropleth);
        assert_eq!(ViewMode::parse("bubbles").unwrap(), ViewMode::Bubbles);
        assert!(ViewMode::parse("pie").is_err());
        assert_eq!(ViewMode::default(), ViewMode::Bubbles);
        assert_eq!(ViewMode::Bubbles.toggle(), ViewMode::Choropleth);
    }

    #[test]
    fn test_single_year_equals_column_with_zero_fill() {
        let ds = two_departments();
        let schema = Schema::default();
        let raw = compute_metric(&ds, YearSelector::Year(2010), &schema);
        assert_eq!(raw, vec![Some(20.0), None]);
        assert_eq!(fill_zero(&raw), vec![20.0, 0.0]);
    }

    #[test]
    fn test_absent_year_column_is_all_null() {
        let ds = two_departments();
        let raw = compute_metric(&ds, YearSelector::Year(2012), &Schema::default());
        assert_eq!(raw, vec![None, None]);
        let metric = fill_zero(&raw);
        let summary = Summary::compute(&ds, &metric);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.top_department, "");
    }

    #[test]
    fn test_range_example() {
        let ds = two_departments();
        let schema = Schema::default();
        let selector = YearSelector::parse(&schema.range_label()).unwrap();
        let metric = fill_zero(&compute_metric(&ds, selector, &schema));
        assert_eq!(metric, vec![30.0, 0.0]);

        let summary = Summary::compute(&ds, &metric);
        assert_eq!(summary.total, 30);
        assert_eq!(summary.mean, 15.0);
        assert_eq!(summary.top_department, "Antioquia");
    }

    #[test]
    fn test_range_sums_numeric_strings() {
        let ds = dataset(vec![("05", "A", json!({"Ano2009": "4", "Ano2011": 6, "Ano2012": "n/a"}))]);
        let metric = compute_metric(&ds, YearSelector::Range { first: 2009, last: 2012 }, &Schema::default());
        assert_eq!(metric, vec![Some(10.0)]);
    }

    #[test]
    fn test_range_ignores_total_column() {
        let ds = dataset(vec![("05", "A", json!({"Ano2009": 1, "Ano2010": 2, "Casos": 999}))]);
        let schema = Schema::default();
        let metric = compute_metric(&ds, YearSelector::Range { first: 2009, last: 2012 }, &schema);
        assert_eq!(metric, vec![Some(3.0)]);
    }

    #[test]
    fn test_empty_dataset() {
        let ds = dataset(Vec::new());
        let metric = fill_zero(&compute_metric(&ds, YearSelector::Year(2009), &Schema::default()));
        assert!(metric.is_empty());
        let summary = Summary::compute(&ds, &metric);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.mean, 0.0);
        assert_eq!(summary.top_department, "");
        assert!(top_n(&ds, &metric, TOP_N).is_empty());
    }

    #[test]
    fn test_argmax_first_wins() {
        let ds = dataset(vec![
            ("05", "A", json!({"Ano2009": 7})),
            ("08", "B", json!({"Ano2009": 9})),
            ("11", "C", json!({"Ano2009": 9})),
        ]);
        let metric = fill_zero(&compute_metric(&ds, YearSelector::Year(2009), &Schema::default()));
        assert_eq!(Summary::compute(&ds, &metric).top_department, "B");
    }

    #[test]
    fn test_top_n_sorted_with_stable_ties() {
        let rows: Vec<(String, Value)> = (0..14)
            .map(|i| (format!("{i:02}"), json!({"Ano2009": (i % 5) as f64})))
            .collect();
        let ds = dataset(rows.iter().map(|(c, v)| (c.as_str(), c.as_str(), v.clone())).collect());
        let metric = fill_zero(&compute_metric(&ds, YearSelector::Year(2009), &Schema::default()));
        let table = top_n(&ds, &metric, TOP_N);
        assert_eq!(table.len(), TOP_N);
        assert!(table.windows(2).all(|w| w[0].cases >= w[1].cases));
        // value 4 appears at rows 4 and 9, value 3 at rows 3, 8 and 13
        let codes: Vec<&str> = table.iter().take(5).map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["04", "09", "03", "08", "13"]);
    }

    #[test]
    fn test_top_n_returns_all_when_fewer() {
        let ds = two_departments();
        let metric = vec![0.0, 5.0];
        let table = top_n(&ds, &metric, TOP_N);
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].code, "08");
        assert_eq!(table[1].code, "05");
    }
}
