//! Direction matrix representing image and grid orientation.

use super::Vector;
use nalgebra::SMatrix;
use serde::{Deserialize, Serialize};

/// Orientation of image or grid axes in physical space.
///
/// A D×D matrix whose column `i` is the physical direction of the i-th
/// index axis. Expected to be orthonormal, which makes the transpose the
/// inverse and lets grid placement work in the rotated "direction frame".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction<const D: usize>(pub SMatrix<f64, D, D>);

impl<const D: usize> Direction<D> {
    /// Identity direction (axis-aligned).
    pub fn identity() -> Self {
        Self(SMatrix::identity())
    }

    /// Direction of the given index axis (matrix column).
    pub fn axis(&self, axis: usize) -> Vector<D> {
        let mut v = Vector::zeros();
        for j in 0..D {
            v[j] = self.0[(j, axis)];
        }
        v
    }

    /// Map a vector of per-axis frame coordinates into physical space.
    pub fn from_frame(&self, frame: Vector<D>) -> Vector<D> {
        Vector(self.0 * frame.0)
    }

    /// Project a physical vector onto the direction axes.
    ///
    /// For an orthonormal direction this inverts [`Self::from_frame`].
    pub fn to_frame(&self, physical: Vector<D>) -> Vector<D> {
        Vector(self.0.transpose() * physical.0)
    }

    /// Check orthonormality within tolerance.
    pub fn is_orthonormal(&self) -> bool {
        let product = self.0 * self.0.transpose();
        let identity = SMatrix::<f64, D, D>::identity();
        (0..D).all(|i| (0..D).all(|j| (product[(i, j)] - identity[(i, j)]).abs() < 1e-6))
    }
}

impl<const D: usize> std::ops::Index<(usize, usize)> for Direction<D> {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::IndexMut<(usize, usize)> for Direction<D> {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl<const D: usize> std::ops::Mul<Vector<D>> for Direction<D> {
    type Output = Vector<D>;

    fn mul(self, vector: Vector<D>) -> Self::Output {
        Vector(self.0 * vector.0)
    }
}
