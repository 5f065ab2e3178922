//! Initial-transform seam for grid placement.
//!
//! When a registration composes the B-spline deformation with an initial
//! transform, the control grid has to cover the image as seen through that
//! transform. Schedule computation only needs point mapping, so that is
//! all the trait asks for.

use crate::spatial::{Point, Vector};

/// A transform applied before the B-spline deformation.
pub trait InitialTransform<const D: usize> {
    /// Map a physical point through the transform.
    fn transform_point(&self, point: &Point<D>) -> Point<D>;
}

/// Pure translation, the simplest composable initial transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Translation<const D: usize> {
    offset: Vector<D>,
}

impl<const D: usize> Translation<D> {
    pub fn new(offset: Vector<D>) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> &Vector<D> {
        &self.offset
    }
}

impl<const D: usize> InitialTransform<D> for Translation<D> {
    fn transform_point(&self, point: &Point<D>) -> Point<D> {
        *point + self.offset
    }
}
