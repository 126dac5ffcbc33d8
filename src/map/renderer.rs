use rayon::prelude::*;

use crate::braille::BrailleCanvas;
use crate::dataset::{Dataset, Polygon};
use crate::map::color::{bucket, BUCKETS};
use crate::map::geometry::{centroid, draw_circle, draw_line, fill_rings};
use crate::map::projection::Viewport;
use crate::metric::ViewMode;

/// Department geometry prepared once for repeated drawing
#[derive(Clone, Debug)]
pub struct DepartmentShape {
    pub code: String,
    pub name: String,
    pub polygons: Vec<Polygon>,
    pub centroid: Option<(f64, f64)>,
}

/// Display settings for map layers
#[derive(Clone)]
pub struct DisplaySettings {
    pub show_outlines: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_outlines: true,
            show_labels: false,
        }
    }
}

/// Braille layers, drawn back to front: class fills, then outlines, then labels
pub struct MapLayers {
    /// One canvas per color class
    pub classes: Vec<BrailleCanvas>,
    pub outlines: BrailleCanvas,
    /// (column, row, text) in character coordinates
    pub labels: Vec<(u16, u16, String)>,
}

/// Projects department shapes and rasterizes them for a metric and view mode
pub struct MapRenderer {
    shapes: Vec<DepartmentShape>,
    bounds: Option<(f64, f64, f64, f64)>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let shapes = dataset
            .departments
            .par_iter()
            .map(|d| DepartmentShape {
                code: d.code.clone(),
                name: d.name.clone(),
                polygons: d.polygons.clone(),
                centroid: centroid(&d.polygons),
            })
            .collect();
        Self {
            shapes,
            bounds: dataset.bounds(),
            settings: DisplaySettings::default(),
        }
    }

    pub fn shapes(&self) -> &[DepartmentShape] {
        &self.shapes
    }

    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.bounds
    }

    pub fn has_data(&self) -> bool {
        self.shapes.iter().any(|s| !s.polygons.is_empty())
    }

    /// Viewport showing every department on a canvas of the given pixel size
    pub fn home_viewport(&self, width: usize, height: usize) -> Viewport {
        Viewport::fit_bounds(self.bounds, width, height, 0.04)
    }

    /// Rasterize for a terminal area of `width` x `height` characters.
    /// `metric` is aligned with the dataset rows the renderer was built from.
    pub fn render(&self, width: usize, height: usize, viewport: &Viewport, metric: &[f64], view: ViewMode) -> MapLayers {
        let mut classes: Vec<BrailleCanvas> = (0..BUCKETS).map(|_| BrailleCanvas::new(width, height)).collect();
        let mut outlines = BrailleCanvas::new(width, height);
        let mut labels = Vec::new();

        let max = metric.iter().copied().fold(0.0, f64::max);

        // Projection is independent per department
        let projected: Vec<Vec<Vec<(i32, i32)>>> = self
            .shapes
            .par_iter()
            .map(|shape| {
                shape
                    .polygons
                    .iter()
                    .flatten()
                    .map(|ring| ring.iter().map(|&(lon, lat)| viewport.project(lon, lat)).collect())
                    .collect()
            })
            .collect();

        for (i, shape) in self.shapes.iter().enumerate() {
            let value = metric.get(i).copied().unwrap_or(0.0);
            let class = bucket(value, max);

            match view {
                ViewMode::Choropleth => {
                    // Rings of each polygon are filled together so holes stay empty
                    let mut offset = 0;
                    for polygon in &shape.polygons {
                        let rings = &projected[i][offset..offset + polygon.len()];
                        fill_rings(&mut classes[class], rings);
                        offset += polygon.len();
                    }
                }
                ViewMode::Bubbles => {
                    if let Some((lon, lat)) = shape.centroid {
                        if value > 0.0 {
                            let (px, py) = viewport.project(lon, lat);
                            if viewport.is_visible(px, py) {
                                let radius = bubble_radius(value, max, viewport);
                                draw_circle(&mut classes[class], px, py, radius);
                            }
                        }
                    }
                }
            }

            if self.settings.show_outlines {
                for ring in &projected[i] {
                    draw_ring(&mut outlines, ring, viewport);
                }
            }

            if self.settings.show_labels {
                if let Some((lon, lat)) = shape.centroid {
                    let (px, py) = viewport.project(lon, lat);
                    if px >= 0 && py >= 0 && viewport.is_visible(px, py) {
                        labels.push(((px / 2) as u16, (py / 4) as u16, shape.name.clone()));
                    }
                }
            }
        }

        MapLayers {
            classes,
            outlines,
            labels,
        }
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }

    pub fn toggle_outlines(&mut self) {
        self.settings.show_outlines = !self.settings.show_outlines;
    }
}

/// Circle area proportional to the metric; largest bubble is 1/12 of the short side
pub fn bubble_radius(value: f64, max: f64, viewport: &Viewport) -> i32 {
    if max <= 0.0 || value <= 0.0 {
        return 0;
    }
    let max_radius = (viewport.width.min(viewport.height) as f64 / 12.0).max(2.0);
    ((value / max).sqrt() * max_radius).round().max(1.0) as i32
}

/// Draw a closed ring with viewport culling
fn draw_ring(canvas: &mut BrailleCanvas, ring: &[(i32, i32)], viewport: &Viewport) {
    if ring.len() < 2 {
        return;
    }

    let mut prev = ring[ring.len() - 1];
    for &(px, py) in ring {
        if viewport.line_might_be_visible(prev, (px, py)) {
            draw_line(canvas, prev.0, prev.1, px, py);
        }
        prev = (px, py);
    }
}
