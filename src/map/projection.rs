use std::f64::consts::PI;

const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 400.0;

/// Web Mercator y in [0, 1] (0 = north edge)
#[inline]
pub fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.clamp(-85.0, 85.0) * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

/// Inverse of [`mercator_y`]
#[inline]
pub fn mercator_lat(y: f64) -> f64 {
    (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI
}

/// Visible map area and zoom level, in canvas pixels
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// 1.0 shows the whole world across the canvas width
    pub zoom: f64,
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 20.0, 1.0, width, height)
    }

    /// Center on a lon/lat box and pick the largest zoom that keeps it inside
    /// the canvas with `padding` (fraction of each side) to spare.
    pub fn fit_bounds(bounds: Option<(f64, f64, f64, f64)>, width: usize, height: usize, padding: f64) -> Self {
        let Some((min_lon, min_lat, max_lon, max_lat)) = bounds else {
            return Self::world(width, height);
        };
        if width == 0 || height == 0 {
            return Self::world(width, height);
        }

        let span_x = (max_lon - min_lon) / 360.0;
        let top = mercator_y(max_lat);
        let bottom = mercator_y(min_lat);
        let span_y = bottom - top;
        if span_x <= f64::EPSILON && span_y <= f64::EPSILON {
            return Self::new(min_lon, min_lat, 8.0, width, height);
        }

        let usable = (1.0 - 2.0 * padding).max(0.1);
        let zoom_x = if span_x > f64::EPSILON { usable / span_x } else { f64::MAX };
        let zoom_y = if span_y > f64::EPSILON {
            usable * height as f64 / (span_y * width as f64)
        } else {
            f64::MAX
        };

        Self::new(
            (min_lon + max_lon) / 2.0,
            mercator_lat((top + bottom) / 2.0),
            zoom_x.min(zoom_y).clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        )
    }

    /// Pan by a pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = 1.0 / (self.zoom * self.width.max(1) as f64);
        self.center_lon += dx as f64 * scale * 360.0;
        self.center_lat = mercator_lat(mercator_y(self.center_lat) + dy as f64 * scale);

        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }

        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(MIN_ZOOM);
    }

    /// Zoom in keeping the point under (px, py) fixed
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Pixel coordinates back to (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.zoom * self.width as f64;
        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = mercator_y(self.center_lat);

        let x = (px as f64 - self.width as f64 / 2.0) / scale + center_x;
        let y = (py as f64 - self.height as f64 / 2.0) / scale + center_y;

        (x * 360.0 - 180.0, mercator_lat(y))
    }

    /// Sub-pixel projection, used for vector output
    pub fn project_f64(&self, lon: f64, lat: f64) -> (f64, f64) {
        let x = (lon + 180.0) / 360.0;
        let y = mercator_y(lat);

        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = mercator_y(self.center_lat);
        let scale = self.zoom * self.width as f64;

        (
            (x - center_x) * scale + self.width as f64 / 2.0,
            (y - center_y) * scale + self.height as f64 / 2.0,
        )
    }

    /// Project (lon, lat) to canvas pixels
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let (x, y) = self.project_f64(lon, lat);
        (x as i32, y as i32)
    }

    /// Projected point is on or near the canvas
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Rough bounding box check for a segment
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        let (x, y) = vp.project(0.0, 0.0);
        assert_eq!(x, 50);
        assert_eq!(y, 50);
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
        vp.pan(0, 10);
        assert!(vp.center_lat < 0.0);
    }

    #[test]
    fn test_unproject_roundtrip_at_center() {
        let vp = Viewport::new(-74.0, 4.5, 20.0, 200, 120);
        let (lon, lat) = vp.unproject(100, 60);
        assert!((lon + 74.0).abs() < 1e-9);
        assert!((lat - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_fit_bounds_keeps_box_inside() {
        let bounds = (-79.0, -4.2, -66.8, 12.5);
        let vp = Viewport::fit_bounds(Some(bounds), 400, 600, 0.05);
        for (lon, lat) in [(bounds.0, bounds.1), (bounds.2, bounds.3), (bounds.0, bounds.3), (bounds.2, bounds.1)] {
            let (x, y) = vp.project_f64(lon, lat);
            assert!((0.0..=400.0).contains(&x), "x {x}");
            assert!((0.0..=600.0).contains(&y), "y {y}");
        }
        assert!(vp.zoom > 1.0);
    }

    #[test]
    fn test_fit_bounds_fallbacks() {
        assert_eq!(Viewport::fit_bounds(None, 100, 50, 0.05), Viewport::world(100, 50));
        let point = Viewport::fit_bounds(Some((-74.0, 4.6, -74.0, 4.6)), 100, 50, 0.05);
        assert_eq!(point.project(-74.0, 4.6), (50, 25));
    }
}
