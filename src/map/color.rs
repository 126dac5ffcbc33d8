//! Sequential color scale shared by the SVG and terminal maps.

/// Stops of the scale, dark (low) to bright (high)
const STOPS: [(u8, u8, u8); 5] = [
    (0x0d, 0x08, 0x87),
    (0x7e, 0x03, 0xa8),
    (0xcc, 0x47, 0x78),
    (0xf8, 0x95, 0x40),
    (0xf0, 0xf9, 0x21),
];

/// Number of discrete color classes used by the terminal map
pub const BUCKETS: usize = 5;

/// Position of `value` on the scale, 0 when `max` is not positive
pub fn normalize(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Linear interpolation between the stops, `t` in [0, 1]
pub fn scale(t: f64) -> (u8, u8, u8) {
    let t = t.clamp(0.0, 1.0) * (STOPS.len() - 1) as f64;
    let i = (t.floor() as usize).min(STOPS.len() - 2);
    let f = t - i as f64;
    let (a, b) = (STOPS[i], STOPS[i + 1]);
    let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round() as u8;
    (lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

pub fn hex(rgb: (u8, u8, u8)) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.0, rgb.1, rgb.2)
}

/// Class of `value` among [`BUCKETS`] equal-width classes of [0, max]
pub fn bucket(value: f64, max: f64) -> usize {
    ((normalize(value, max) * BUCKETS as f64) as usize).min(BUCKETS - 1)
}

/// Representative color of a class (its midpoint on the scale)
pub fn bucket_color(bucket: usize) -> (u8, u8, u8) {
    scale((bucket as f64 + 0.5) / BUCKETS as f64)
}
