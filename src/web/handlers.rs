use axum::extract::{Query, State};
use axum::response::Html;
use axum::Json;
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::html::render_page;
use super::AppState;
use crate::dashboard::{Dashboard, DashboardView};
use crate::dataset::Polygon;
use crate::error::Result;
use crate::metric::{Summary, TableRow, ViewMode};

/// Map size embedded in the page
const MAP_WIDTH: u32 = 900;
const MAP_HEIGHT: u32 = 600;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    year: Option<String>,
    view: Option<String>,
}

impl DashboardQuery {
    fn resolve(&self, dashboard: &Dashboard) -> Result<DashboardView> {
        let view = match self.view.as_deref() {
            Some(v) => ViewMode::parse(v)?,
            None => ViewMode::default(),
        };
        let year = self.year.clone().unwrap_or_else(|| dashboard.default_year());
        dashboard.view(&year, view)
    }
}

pub async fn index(State(state): State<AppState>, Query(query): Query<DashboardQuery>) -> Result<Html<String>> {
    let view = query.resolve(&state.dashboard)?;
    debug!(year = %view.year, view = %view.view, "render page");
    // Path building fans out over rayon; keep it off the async workers
    let renderer = state.renderer.clone();
    let (metric, mode) = (view.metric.clone(), view.view);
    let svg = tokio::task::spawn_blocking(move || {
        renderer.render_svg(MAP_WIDTH, MAP_HEIGHT, &metric, mode)
    })
    .await?;
    Ok(Html(render_page(&state.dashboard, &view, &svg)))
}

#[derive(Debug, Serialize)]
pub struct ViewOption {
    value: ViewMode,
    label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    years: Vec<String>,
    default_year: String,
    views: Vec<ViewOption>,
    default_view: ViewMode,
}

pub async fn options(State(state): State<AppState>) -> Json<OptionsResponse> {
    Json(OptionsResponse {
        years: state.dashboard.year_labels(),
        default_year: state.dashboard.default_year(),
        views: ViewMode::ALL
            .iter()
            .map(|&value| ViewOption {
                value,
                label: value.label(),
            })
            .collect(),
        default_view: ViewMode::default(),
    })
}

#[derive(Debug, Serialize)]
pub struct MetricEntry {
    code: String,
    name: String,
    value: f64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    year: String,
    view: ViewMode,
    title: String,
    summary: Summary,
    table: Vec<TableRow>,
    metric: Vec<MetricEntry>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>> {
    let view = query.resolve(&state.dashboard)?;
    debug!(year = %view.year, view = %view.view, "dashboard api");
    let metric = state
        .dashboard
        .dataset()
        .departments
        .iter()
        .zip(&view.metric)
        .map(|(d, &value)| MetricEntry {
            code: d.code.clone(),
            name: d.name.clone(),
            value,
        })
        .collect();
    Ok(Json(DashboardResponse {
        year: view.year,
        view: view.view,
        title: view.title,
        summary: view.summary,
        table: view.table,
        metric,
    }))
}

fn multipolygon(polygons: &[Polygon]) -> Option<Geometry> {
    if polygons.is_empty() {
        return None;
    }
    let coords: Vec<Vec<Vec<Vec<f64>>>> = polygons
        .iter()
        .map(|polygon| {
            polygon
                .iter()
                .map(|ring| ring.iter().map(|&(lon, lat)| vec![lon, lat]).collect())
                .collect()
        })
        .collect();
    Some(Geometry::new(GeoValue::MultiPolygon(coords)))
}

/// Joined dataset with the current metric as a `metric` property
pub async fn geojson(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<FeatureCollection>> {
    let view = query.resolve(&state.dashboard)?;
    let features = state
        .dashboard
        .dataset()
        .departments
        .iter()
        .zip(&view.metric)
        .map(|(d, &value)| {
            let mut properties = d.attributes.clone();
            properties.insert("metric".to_string(), Value::from(value));
            Feature {
                bbox: None,
                geometry: multipolygon(&d.polygons),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();
    Ok(Json(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }))
}

pub async fn healthz(State(state): State<AppState>) -> String {
    format!("ok {}", state.dashboard.dataset().provenance.as_str())
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::Schema;
    use crate::dashboard::Dashboard;
    use crate::data::synthetic;
    use crate::web::{router, AppState};

    fn app() -> axum::Router {
        let schema = Schema::default();
        router(AppState::new(Dashboard::new(synthetic::generate(&schema), schema)))
    }

    async fn get(uri: &str) -> (StatusCode, String) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_index_defaults() {
        let (status, body) = get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Casos VIH - 2009-2012 - Vista: bubbles"));
        assert!(body.contains("<svg"));
        assert!(body.contains("Tabla de departamentos (Top 10)"));
    }

    #[tokio::test]
    async fn test_index_choropleth() {
        let (status, body) = get("/?year=2010&view=choropleth").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Vista: choropleth"));
        assert!(body.contains(r#"<option value="2010" selected>"#));
    }

    #[tokio::test]
    async fn test_index_keeps_unlisted_range_selected() {
        let (status, body) = get("/?year=2010-2011&view=choropleth").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Casos VIH - 2010-2011 - Vista: choropleth"));
        assert!(body.contains(r#"<option value="2010-2011" selected>"#));
        assert!(!body.contains(r#"<option value="2009" selected>"#));
    }

    #[tokio::test]
    async fn test_bad_selector_is_400() {
        let (status, _) = get("/?year=soon").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, body) = get("/api/dashboard?view=pie").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("pie"));
    }

    #[tokio::test]
    async fn test_dashboard_api() {
        let (status, body) = get("/api/dashboard?year=2011").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["year"], "2011");
        assert_eq!(json["view"], "bubbles");
        assert_eq!(json["table"].as_array().unwrap().len(), 10);
        assert_eq!(json["metric"].as_array().unwrap().len(), 12);
        let total: f64 = json["metric"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["value"].as_f64().unwrap())
            .sum();
        assert_eq!(json["summary"]["total"].as_f64().unwrap(), total);
    }

    #[tokio::test]
    async fn test_absent_year_is_zero_not_error() {
        let (status, body) = get("/api/dashboard?year=2030").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["summary"]["total"], 0);
        assert_eq!(json["summary"]["top_department"], "");
    }

    #[tokio::test]
    async fn test_options() {
        let (_, body) = get("/api/options").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["default_year"], "2009-2012");
        assert_eq!(json["default_view"], "bubbles");
        assert_eq!(json["years"].as_array().unwrap().len(), 5);
        assert_eq!(json["views"][0]["value"], "choropleth");
    }

    #[tokio::test]
    async fn test_geojson_carries_metric() {
        let (status, body) = get("/api/geojson?year=2009").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        let feature = &json["features"][0];
        assert_eq!(feature["geometry"]["type"], "MultiPolygon");
        assert_eq!(feature["properties"]["metric"], feature["properties"]["Ano2009"].as_f64().unwrap());
    }

    #[tokio::test]
    async fn test_healthz() {
        let (status, body) = get("/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok synthetic");
    }
}
