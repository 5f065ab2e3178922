//! Vector type for spacings, offsets and displacements.

use nalgebra::SVector;
use serde::{Deserialize, Serialize};

/// A vector in D-dimensional physical space.
///
/// Thin wrapper around nalgebra's `SVector` carrying the domain-specific
/// helpers the grid machinery needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector<const D: usize>(pub SVector<f64, D>);

impl<const D: usize> Vector<D> {
    /// Create a new vector from components.
    pub fn new(components: [f64; D]) -> Self {
        Self(SVector::from(components))
    }

    /// Create a zero vector.
    pub fn zeros() -> Self {
        Self(SVector::zeros())
    }

    /// Create a vector by evaluating `f` per axis.
    pub fn from_fn(f: impl FnMut(usize) -> f64) -> Self {
        let mut f = f;
        let mut v = Self::zeros();
        for d in 0..D {
            v.0[d] = f(d);
        }
        v
    }

    /// Create a vector from a slice; the slice length must equal D.
    pub fn from_slice(components: &[f64]) -> Self {
        assert!(
            components.len() == D,
            "component slice length must match dimension"
        );
        Self::from_fn(|d| components[d])
    }

    /// Component-wise product.
    pub fn component_mul(&self, other: &Self) -> Self {
        Self(self.0.component_mul(&other.0))
    }

    /// Convert to a Vec of components.
    pub fn to_vec(&self) -> Vec<f64> {
        (0..D).map(|d| self.0[d]).collect()
    }

    /// Get the inner nalgebra vector.
    pub fn inner(&self) -> &SVector<f64, D> {
        &self.0
    }
}

impl<const D: usize> std::ops::Index<usize> for Vector<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::IndexMut<usize> for Vector<D> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl<const D: usize> std::ops::Add for Vector<D> {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self(self.0 + other.0)
    }
}

impl<const D: usize> std::ops::Sub for Vector<D> {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self(self.0 - other.0)
    }
}

impl<const D: usize> std::ops::Mul<f64> for Vector<D> {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self(self.0 * scalar)
    }
}

impl<const D: usize> std::ops::Div<f64> for Vector<D> {
    type Output = Self;

    fn div(self, scalar: f64) -> Self::Output {
        Self(self.0 / scalar)
    }
}

impl<const D: usize> std::ops::Neg for Vector<D> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}
