pub mod color;
mod geometry;
mod projection;
mod renderer;
mod svg;

pub use geometry::centroid;
pub use projection::Viewport;
pub use renderer::{bubble_radius, DepartmentShape, MapLayers, MapRenderer};
pub use svg::escape;
