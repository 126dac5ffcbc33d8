use glam::DVec2;

use crate::braille::BrailleCanvas;
use crate::dataset::{Polygon, Ring};

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Filled circle (bubble markers)
pub fn draw_circle(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

/// Even-odd scanline fill of projected rings, clipped to the canvas.
/// Pixel centers (x + 0.5, y + 0.5) decide coverage.
pub fn fill_rings(canvas: &mut BrailleCanvas, rings: &[Vec<(i32, i32)>]) {
    let Some((min_y, max_y)) = rings
        .iter()
        .flatten()
        .fold(None, |acc: Option<(i32, i32)>, &(_, y)| match acc {
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
            None => Some((y, y)),
        })
    else {
        return;
    };

    let min_y = min_y.max(0);
    let max_y = max_y.min(canvas.pixel_height() as i32 - 1);
    let max_x = canvas.pixel_width() as i32 - 1;
    let mut crossings: Vec<f64> = Vec::new();

    for y in min_y..=max_y {
        let scan = y as f64 + 0.5;
        crossings.clear();
        for ring in rings {
            if ring.len() < 3 {
                continue;
            }
            for i in 0..ring.len() {
                let (x0, y0) = ring[i];
                let (x1, y1) = ring[(i + 1) % ring.len()];
                let (y0f, y1f) = (y0 as f64, y1 as f64);
                if (y0f <= scan && scan < y1f) || (y1f <= scan && scan < y0f) {
                    let t = (scan - y0f) / (y1f - y0f);
                    crossings.push(x0 as f64 + t * (x1 - x0) as f64);
                }
            }
        }
        crossings.sort_by(f64::total_cmp);
        for pair in crossings.chunks_exact(2) {
            let start = (pair[0] - 0.5).ceil().max(0.0) as i32;
            let end = ((pair[1] - 0.5).floor() as i32).min(max_x);
            for x in start..=end {
                canvas.set_pixel_signed(x, y);
            }
        }
    }
}

/// Shoelace signed area and area-weighted centroid numerator of a ring
fn ring_moments(ring: &Ring) -> (f64, DVec2) {
    let mut area2 = 0.0;
    let mut moment = DVec2::ZERO;
    for i in 0..ring.len() {
        let a = DVec2::from(ring[i]);
        let b = DVec2::from(ring[(i + 1) % ring.len()]);
        let cross = a.perp_dot(b);
        area2 += cross;
        moment += (a + b) * cross;
    }
    (area2 / 2.0, moment / 6.0)
}

/// Area-weighted centroid of a (multi)polygon with holes subtracted.
/// Degenerate shapes fall back to the mean of their vertices.
pub fn centroid(polygons: &[Polygon]) -> Option<(f64, f64)> {
    let mut area = 0.0;
    let mut moment = DVec2::ZERO;

    for polygon in polygons {
        for (i, ring) in polygon.iter().enumerate() {
            let (a, m) = ring_moments(ring);
            // Orient the exterior positive and holes negative regardless of winding
            let sign = if (i == 0) == (a >= 0.0) { 1.0 } else { -1.0 };
            area += a * sign;
            moment += m * sign;
        }
    }

    if area.abs() > 1e-12 {
        let c = moment / area;
        return Some((c.x, c.y));
    }

    let (sum, count) = polygons
        .iter()
        .flatten()
        .flatten()
        .fold((DVec2::ZERO, 0usize), |(s, n), &p| (s + DVec2::from(p), n + 1));
    (count > 0).then(|| {
        let c = sum / count as f64;
        (c.x, c.y)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, side: f64) -> Ring {
        vec![(x0, y0), (x0 + side, y0), (x0 + side, y0 + side), (x0, y0 + side), (x0, y0)]
    }

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.to_string(), "⡇\n⡇");
    }

    #[test]
    fn test_fill_square() {
        let mut canvas = BrailleCanvas::new(4, 2);
        fill_rings(&mut canvas, &[vec![(0, 0), (4, 0), (4, 8), (0, 8)]]);
        assert_eq!(canvas.to_string(), "⣿⣿⠀⠀\n⣿⣿⠀⠀");
    }

    #[test]
    fn test_fill_respects_hole() {
        let mut canvas = BrailleCanvas::new(3, 3);
        let outer = vec![(0, 0), (6, 0), (6, 12), (0, 12)];
        let hole = vec![(2, 4), (4, 4), (4, 8), (2, 8)];
        fill_rings(&mut canvas, &[outer, hole]);
        assert!(canvas.cell_is_set(0, 1));
        assert!(!canvas.cell_is_set(1, 1));
        assert!(canvas.cell_is_set(1, 0));
    }

    #[test]
    fn test_centroid_square() {
        let c = centroid(&[vec![square(0.0, 0.0, 2.0)]]).unwrap();
        assert!((c.0 - 1.0).abs() < 1e-12 && (c.1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_weights_by_area() {
        // Big square at x in [0, 2], small square at x in [10, 11]
        let c = centroid(&[vec![square(0.0, 0.0, 2.0)], vec![square(10.0, 0.0, 1.0)]]).unwrap();
        let expected_x = (4.0 * 1.0 + 1.0 * 10.5) / 5.0;
        assert!((c.0 - expected_x).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_with_hole_and_reversed_winding() {
        let mut outer = square(0.0, 0.0, 4.0);
        outer.reverse();
        let hole = square(0.0, 0.0, 2.0);
        let c = centroid(&[vec![outer, hole]]).unwrap();
        // 16 area at (2,2) minus 4 area at (1,1) => (32 - 4) / 12
        assert!((c.0 - 28.0 / 12.0).abs() < 1e-9);
        assert!((c.1 - 28.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_degenerate() {
        assert_eq!(centroid(&[]), None);
        let line = vec![vec![vec![(0.0, 0.0), (2.0, 0.0)]]];
        assert_eq!(centroid(&line), Some((1.0, 0.0)));
    }
}
