//! Point type for positions in physical space.

use super::Vector;
use nalgebra::Point as NaPoint;
use serde::{Deserialize, Serialize};

/// A point in D-dimensional physical space.
///
/// Used for image and grid origins and for node positions. Thin wrapper
/// around nalgebra's `Point`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point<const D: usize>(pub NaPoint<f64, D>);

impl<const D: usize> Point<D> {
    /// Create a new point from coordinates.
    pub fn new(coords: [f64; D]) -> Self {
        Self(NaPoint::from(coords))
    }

    /// The origin (all coordinates zero).
    pub fn origin() -> Self {
        Self(NaPoint::origin())
    }

    /// Create a point from a slice; the slice length must equal D.
    pub fn from_slice(coords: &[f64]) -> Self {
        assert!(coords.len() == D, "coordinate slice length must match dimension");
        let mut p = Self::origin();
        for d in 0..D {
            p.0.coords[d] = coords[d];
        }
        p
    }

    /// The point's coordinates as a displacement from the origin.
    pub fn as_vector(&self) -> Vector<D> {
        Vector(self.0.coords)
    }

    /// Convert to a Vec of coordinates.
    pub fn to_vec(&self) -> Vec<f64> {
        (0..D).map(|d| self.0.coords[d]).collect()
    }
}

impl<const D: usize> std::ops::Index<usize> for Point<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0.coords[index]
    }
}

impl<const D: usize> std::ops::Add<Vector<D>> for Point<D> {
    type Output = Self;

    fn add(self, v: Vector<D>) -> Self::Output {
        Self(self.0 + v.0)
    }
}

impl<const D: usize> std::ops::Sub for Point<D> {
    type Output = Vector<D>;

    fn sub(self, other: Self) -> Self::Output {
        Vector(self.0 - other.0)
    }
}
