//! Control-grid and image geometry.
//!
//! A [`GridGeometry`] describes the lattice of B-spline control nodes for
//! one resolution level: discrete index and size, physical spacing and
//! origin, and the orientation shared with the fixed image. It carries no
//! coefficients; parameter vectors are plain `Vec<f64>` owned by the
//! resolution orchestrator and validated against the grid's parameter
//! count.

use crate::spatial::{Direction, Point, Spacing, Vector};

/// Geometry of the fixed image, queried once at schedule-precompute time.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageGeometry<const D: usize> {
    origin: Point<D>,
    spacing: Spacing<D>,
    direction: Direction<D>,
    size: [usize; D],
}

impl<const D: usize> ImageGeometry<D> {
    pub fn new(
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
        size: [usize; D],
    ) -> Self {
        assert!(size.iter().all(|&s| s >= 1), "image size must be at least 1 per axis");
        assert!((0..D).all(|d| spacing[d] > 0.0), "image spacing must be positive");
        Self {
            origin,
            spacing,
            direction,
            size,
        }
    }

    pub fn origin(&self) -> &Point<D> {
        &self.origin
    }

    pub fn spacing(&self) -> &Spacing<D> {
        &self.spacing
    }

    pub fn direction(&self) -> &Direction<D> {
        &self.direction
    }

    pub fn size(&self) -> [usize; D] {
        self.size
    }

    /// Map a continuous index to its physical position.
    pub fn index_to_physical(&self, index: [f64; D]) -> Point<D> {
        let scaled = Vector::from_fn(|d| index[d] * self.spacing[d]);
        self.origin + self.direction.from_frame(scaled)
    }
}

/// Immutable description of one control-point grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry<const D: usize> {
    index: [i64; D],
    size: [usize; D],
    spacing: Spacing<D>,
    origin: Point<D>,
    direction: Direction<D>,
}

impl<const D: usize> GridGeometry<D> {
    /// Create a grid geometry.
    ///
    /// Panics if any size is zero or any spacing is non-positive; callers
    /// construct grids from validated inputs only.
    pub fn new(
        index: [i64; D],
        size: [usize; D],
        spacing: Spacing<D>,
        origin: Point<D>,
        direction: Direction<D>,
    ) -> Self {
        assert!(size.iter().all(|&s| s >= 1), "grid size must be at least 1 per axis");
        assert!((0..D).all(|d| spacing[d] > 0.0), "grid spacing must be positive");
        Self {
            index,
            size,
            spacing,
            origin,
            direction,
        }
    }

    /// The size-1-per-dimension placeholder grid installed before the real
    /// level-0 grid exists, so parameter-count preconditions can run.
    pub fn placeholder() -> Self {
        Self::new(
            [0; D],
            [1; D],
            Spacing::uniform(1.0),
            Point::origin(),
            Direction::identity(),
        )
    }

    pub fn index(&self) -> [i64; D] {
        self.index
    }

    pub fn size(&self) -> [usize; D] {
        self.size
    }

    pub fn spacing(&self) -> &Spacing<D> {
        &self.spacing
    }

    pub fn origin(&self) -> &Point<D> {
        &self.origin
    }

    pub fn direction(&self) -> &Direction<D> {
        &self.direction
    }

    /// Total number of control nodes.
    pub fn num_nodes(&self) -> usize {
        self.size.iter().product()
    }

    /// Length of the flat parameter vector: one scalar per node per axis.
    ///
    /// Layout is component-major: the scalar for component `c` of the node
    /// at flat offset `o` lives at `o + c * num_nodes()`.
    pub fn num_parameters(&self) -> usize {
        self.num_nodes() * D
    }

    /// Flat offset of a node, axis 0 fastest.
    pub fn node_offset(&self, index: [usize; D]) -> usize {
        flat_offset(self.size, index)
    }

    /// Physical position of a node.
    pub fn node_position(&self, index: [usize; D]) -> Point<D> {
        let scaled = Vector::from_fn(|d| index[d] as f64 * self.spacing[d]);
        self.origin + self.direction.from_frame(scaled)
    }

    /// Grid origin projected onto the direction axes.
    pub fn origin_frame(&self) -> Vector<D> {
        self.direction.to_frame(self.origin.as_vector())
    }

    /// Physical extent along one axis, node 0 to the last node plus one
    /// spacing (the full period on a periodic axis).
    pub fn period(&self, axis: usize) -> f64 {
        self.size[axis] as f64 * self.spacing[axis]
    }
}

/// Wraparound index mapping for the periodic axis.
///
/// A coefficient index beyond the last node is aliased to the matching
/// node near the first, and vice versa.
pub fn wrap_index(i: i64, n: usize) -> usize {
    let n = n as i64;
    (((i % n) + n) % n) as usize
}

/// Flat offset of a multi-index, axis 0 fastest.
pub fn flat_offset<const D: usize>(size: [usize; D], index: [usize; D]) -> usize {
    let mut offset = 0;
    let mut stride = 1;
    for d in 0..D {
        debug_assert!(index[d] < size[d]);
        offset += index[d] * stride;
        stride *= size[d];
    }
    offset
}

/// Visit every multi-index of a D-dimensional box, axis 0 fastest.
///
/// The traversal order matches [`flat_offset`], so the k-th visited index
/// has flat offset k.
pub fn for_each_index<const D: usize>(size: [usize; D], mut f: impl FnMut([usize; D])) {
    if size.iter().any(|&s| s == 0) {
        return;
    }
    let mut index = [0usize; D];
    loop {
        f(index);
        let mut d = 0;
        loop {
            if d == D {
                return;
            }
            index[d] += 1;
            if index[d] < size[d] {
                break;
            }
            index[d] = 0;
            d += 1;
        }
    }
}
