pub mod grid;
pub mod spatial;
pub mod transform;

pub use grid::{GridGeometry, ImageGeometry};
pub use spatial::{Direction, Point, Spacing, Vector};
pub use transform::InitialTransform;
