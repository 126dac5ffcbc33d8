use std::sync::Arc;

use tracing::warn;

use crate::dashboard::{Dashboard, DashboardView};
use crate::map::{MapRenderer, Viewport};
use crate::metric::ViewMode;

/// Share of the terminal width given to the map; the table takes the rest
pub const MAP_WIDTH_PERCENT: u16 = 65;
/// Rows above the map (KPI strip) and below it (status bar)
pub const HEADER_ROWS: u16 = 3;
pub const STATUS_ROWS: u16 = 1;

/// Braille pixel size of the map area for a terminal of `width` x `height` cells
pub fn map_pixel_size(width: usize, height: usize) -> (usize, usize) {
    let map_cols = width * MAP_WIDTH_PERCENT as usize / 100;
    // 2 for the border
    let inner_width = map_cols.saturating_sub(2);
    let inner_height = height.saturating_sub((HEADER_ROWS + STATUS_ROWS) as usize + 2);
    (inner_width * 2, inner_height * 4)
}

/// Terminal dashboard state
pub struct App {
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub dashboard: Arc<Dashboard>,
    year_labels: Vec<String>,
    year_index: usize,
    pub view_mode: ViewMode,
    /// Metric, summary and table for the current selection
    pub current: DashboardView,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
}

impl App {
    pub fn new(dashboard: Arc<Dashboard>, width: usize, height: usize) -> crate::error::Result<Self> {
        let map_renderer = MapRenderer::from_dataset(dashboard.dataset());
        let (px, py) = map_pixel_size(width, height);
        let viewport = map_renderer.home_viewport(px, py);

        let year_labels = dashboard.year_labels();
        let default_year = dashboard.default_year();
        let year_index = year_labels
            .iter()
            .position(|label| *label == default_year)
            .unwrap_or(0);
        let view_mode = ViewMode::default();
        let current = dashboard.view(&default_year, view_mode)?;

        Ok(Self {
            viewport,
            map_renderer,
            dashboard,
            year_labels,
            year_index,
            view_mode,
            current,
            should_quit: false,
            last_mouse: None,
        })
    }

    pub fn year_label(&self) -> &str {
        &self.year_labels[self.year_index]
    }

    fn recompute(&mut self) {
        let label = self.year_labels[self.year_index].clone();
        match self.dashboard.view(&label, self.view_mode) {
            Ok(view) => self.current = view,
            Err(err) => warn!("cannot compute {label}: {err}"),
        }
    }

    pub fn next_year(&mut self) {
        self.year_index = (self.year_index + 1) % self.year_labels.len();
        self.recompute();
    }

    pub fn prev_year(&mut self) {
        self.year_index = (self.year_index + self.year_labels.len() - 1) % self.year_labels.len();
        self.recompute();
    }

    pub fn toggle_view(&mut self) {
        self.view_mode = self.view_mode.toggle();
        self.recompute();
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (px, py) = map_pixel_size(width, height);
        self.viewport.width = px;
        self.viewport.height = py;
    }

    /// Fit the map back to all departments
    pub fn reset_view(&mut self) {
        self.viewport = self
            .map_renderer
            .home_viewport(self.viewport.width, self.viewport.height);
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Terminal cell to map pixel, accounting for the KPI strip and border
    fn cell_to_pixel(col: u16, row: u16) -> (i32, i32) {
        let px = (col.saturating_sub(1) as i32) * 2;
        let py = (row.saturating_sub(HEADER_ROWS + 1) as i32) * 4;
        (px, py)
    }

    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = Self::cell_to_pixel(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = Self::cell_to_pixel(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    /// Pan by the mouse movement since the last drag event
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // Terminal cells are 2x4 braille pixels
            self.pan(dx * 2, dy * 4);
        }
        self.last_mouse = Some((x, y));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }
}
