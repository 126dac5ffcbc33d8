//! Server-rendered dashboard page.

use crate::dashboard::{Dashboard, DashboardView};
use crate::map::escape;
use crate::metric::{TableRow, ViewMode};

/// Integer with comma thousands separators: 1234567 -> "1,234,567"
pub fn format_thousands(n: u64) -> String {
    group_digits(&n.to_string())
}

fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Fixed-point number with thousands separators: 12345.67 -> "12,345.7"
pub fn format_decimal(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    let mut out = String::new();
    if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group_digits(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

pub fn render_page(dashboard: &Dashboard, view: &DashboardView, svg: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <h2>Dashboard georreferenciado — Taller: Casos VIH</h2>
    {controls}
    {kpis}
    <div class="row">
        <div class="map">
            <h4>{title}</h4>
            {svg}
        </div>
        <div class="table">
            <h4>Tabla de departamentos (Top 10)</h4>
            {table}
        </div>
    </div>
    <footer>Fuente de datos: {provenance} · CRS {crs}</footer>
</body>
</html>"#,
        title = escape(&view.title),
        css = inline_css(),
        controls = render_controls(dashboard, view),
        kpis = render_kpis(view),
        svg = svg,
        table = render_table(&view.table),
        provenance = dashboard.dataset().provenance.as_str(),
        crs = escape(&dashboard.dataset().crs),
    )
}

fn inline_css() -> &'static str {
    r#"
body { font-family: Arial, sans-serif; margin: 20px; color: #222; }
form.controls { display: flex; gap: 20px; align-items: flex-end; }
form.controls label { display: block; font-weight: bold; margin-bottom: 4px; }
form.controls select { width: 200px; padding: 4px; }
form.controls .view select { width: 260px; }
.kpis { display: flex; gap: 20px; margin-top: 15px; }
.kpi { padding: 10px; border: 1px solid #ddd; border-radius: 6px; min-width: 160px; }
.kpi h5 { margin: 0 0 6px 0; font-size: 13px; color: #555; }
.kpi p { margin: 0; font-size: 20px; }
.row { display: flex; gap: 10px; margin-top: 15px; }
.map { width: 65%; }
.map svg { width: 100%; height: auto; background: #fff; }
.map path.dept:hover { stroke: #222; stroke-width: 1.5; }
.table { width: 32%; padding-left: 10px; overflow-x: auto; }
table { border-collapse: collapse; width: 100%; }
th, td { border-bottom: 1px solid #ddd; padding: 6px 8px; text-align: left; }
td.num, th.num { text-align: right; }
footer { margin-top: 20px; font-size: 12px; color: #888; }
"#
}

fn render_controls(dashboard: &Dashboard, view: &DashboardView) -> String {
    // A well-formed selection outside the offered labels stays selectable
    let mut labels = dashboard.year_labels();
    if !labels.contains(&view.year) {
        labels.push(view.year.clone());
    }
    let years: String = labels
        .iter()
        .map(|label| {
            let selected = if *label == view.year { " selected" } else { "" };
            format!(
                r#"<option value="{value}"{selected}>{value}</option>"#,
                value = escape(label),
            )
        })
        .collect();

    let views: String = ViewMode::ALL
        .iter()
        .map(|mode| {
            let selected = if *mode == view.view { " selected" } else { "" };
            format!(
                r#"<option value="{value}"{selected}>{label}</option>"#,
                value = mode.as_str(),
                label = escape(mode.label()),
            )
        })
        .collect();

    format!(
        r#"<form class="controls" method="get" action="/">
        <div class="year">
            <label for="year-dropdown">Año / rango</label>
            <select id="year-dropdown" name="year" onchange="this.form.submit()">{years}</select>
        </div>
        <div class="view">
            <label for="view-dropdown">Vista</label>
            <select id="view-dropdown" name="view" onchange="this.form.submit()">{views}</select>
        </div>
        <noscript><button type="submit">Actualizar</button></noscript>
    </form>"#
    )
}

fn render_kpis(view: &DashboardView) -> String {
    format!(
        r#"<div class="kpis">
        <div class="kpi"><h5>Total de casos</h5><p>{total}</p></div>
        <div class="kpi"><h5>Promedio por departamento</h5><p>{mean}</p></div>
        <div class="kpi"><h5>Departamento con más casos</h5><p>{top}</p></div>
    </div>"#,
        total = format_thousands(view.summary.total),
        mean = format_decimal(view.summary.mean, 1),
        top = escape(&view.summary.top_department),
    )
}

fn render_table(rows: &[TableRow]) -> String {
    let body: String = rows
        .iter()
        .map(|row| {
            format!(
                r#"<tr><td>{code}</td><td>{name}</td><td class="num">{cases}</td></tr>"#,
                code = escape(&row.code),
                name = escape(&row.name),
                cases = format_decimal(row.cases, 0),
            )
        })
        .collect();
    format!(
        r#"<table>
        <thead><tr><th>DPTO_CCDGO</th><th>Departamento</th><th class="num">Casos</th></tr></thead>
        <tbody>{body}</tbody>
    </table>"#
    )
}
