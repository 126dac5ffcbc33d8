//! Vector rendering of the department map for the web page.

use std::fmt::Write;

use rayon::prelude::*;

use crate::map::color::{hex, normalize, scale};
use crate::map::projection::Viewport;
use crate::map::renderer::MapRenderer;
use crate::metric::ViewMode;

const OUTLINE: &str = "#ffffff";
const LAND: &str = "#e5ecf6";
const BUBBLE_FILL: &str = "#636efa";

/// Escape text for HTML/SVG content and attributes
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

impl MapRenderer {
    /// Standalone `<svg>` element of `width` x `height` pixels.
    /// `metric` is aligned with the dataset rows the renderer was built from.
    pub fn render_svg(&self, width: u32, height: u32, metric: &[f64], view: ViewMode) -> String {
        let viewport = self.home_viewport(width as usize, height as usize);
        let max = metric.iter().copied().fold(0.0, f64::max);

        let paths: Vec<String> = self
            .shapes()
            .par_iter()
            .enumerate()
            .map(|(i, shape)| {
                let value = metric.get(i).copied().unwrap_or(0.0);
                let fill = match view {
                    ViewMode::Choropleth => hex(scale(normalize(value, max))),
                    ViewMode::Bubbles => LAND.to_string(),
                };
                format!(
                    r#"<path class="dept" data-code="{code}" d="{d}" fill="{fill}" stroke="{OUTLINE}" stroke-width="0.8" fill-rule="evenodd"><title>{name}: {value}</title></path>"#,
                    code = escape(&shape.code),
                    d = path_data(&shape.polygons, &viewport),
                    name = escape(&shape.name),
                    value = value,
                )
            })
            .collect();

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" role="img">"#
        );
        for path in &paths {
            svg.push_str(path);
        }

        if view == ViewMode::Bubbles {
            let max_radius = width.min(height) as f64 / 14.0;
            for (i, shape) in self.shapes().iter().enumerate() {
                let value = metric.get(i).copied().unwrap_or(0.0);
                let Some((lon, lat)) = shape.centroid else { continue };
                if value <= 0.0 || max <= 0.0 {
                    continue;
                }
                let (x, y) = viewport.project_f64(lon, lat);
                let r = (value / max).sqrt() * max_radius;
                let _ = write!(
                    svg,
                    r#"<circle class="bubble" data-code="{code}" cx="{x:.2}" cy="{y:.2}" r="{r:.2}" fill="{BUBBLE_FILL}" fill-opacity="0.7" stroke="{OUTLINE}"><title>{name}: {value}</title></circle>"#,
                    code = escape(&shape.code),
                    name = escape(&shape.name),
                );
            }
        }

        if view == ViewMode::Choropleth {
            svg.push_str(&legend(width, height, max));
        }

        svg.push_str("</svg>");
        svg
    }
}

/// SVG path data for a (multi)polygon; one closed subpath per ring
fn path_data(polygons: &[crate::dataset::Polygon], viewport: &Viewport) -> String {
    let mut d = String::new();
    for ring in polygons.iter().flatten() {
        for (j, &(lon, lat)) in ring.iter().enumerate() {
            let (x, y) = viewport.project_f64(lon, lat);
            let _ = write!(d, "{}{x:.2},{y:.2}", if j == 0 { "M" } else { "L" });
        }
        if !ring.is_empty() {
            d.push('Z');
        }
    }
    d
}

/// Vertical color bar in the right margin labelled 0 and max
fn legend(width: u32, height: u32, max: f64) -> String {
    const STEPS: usize = 20;
    let bar_w = 12.0;
    let bar_h = height as f64 * 0.4;
    let x = width as f64 - bar_w - 40.0;
    let y0 = height as f64 * 0.3;
    let step_h = bar_h / STEPS as f64;

    let mut out = String::from(r#"<g class="legend">"#);
    for i in 0..STEPS {
        let t = 1.0 - i as f64 / (STEPS - 1) as f64;
        let _ = write!(
            out,
            r#"<rect x="{x:.1}" y="{y:.1}" width="{bar_w}" height="{h:.1}" fill="{fill}"/>"#,
            y = y0 + i as f64 * step_h,
            h = step_h + 0.5,
            fill = hex(scale(t)),
        );
    }
    let _ = write!(
        out,
        r#"<text x="{tx:.1}" y="{top:.1}" font-size="11">{max}</text><text x="{tx:.1}" y="{bottom:.1}" font-size="11">0</text></g>"#,
        tx = x + bar_w + 4.0,
        top = y0 + 10.0,
        bottom = y0 + bar_h,
    );
    out
}
