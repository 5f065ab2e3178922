//! Spatial value types shared by image and control-grid geometry.

pub mod direction;
pub mod point;
pub mod vector;

pub use direction::Direction;
pub use point::Point;
pub use vector::Vector;

/// Physical distance between adjacent nodes along each axis.
///
/// A type alias to [`Vector`] for semantic clarity.
pub type Spacing<const D: usize> = Vector<D>;

impl<const D: usize> Spacing<D> {
    /// Create uniform spacing (same value for all dimensions).
    pub fn uniform(value: f64) -> Self {
        Self::from_fn(|_| value)
    }
}
