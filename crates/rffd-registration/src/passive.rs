//! Passive-edge selection.
//!
//! Border control coefficients can be excluded from optimization by giving
//! them an effectively infinite optimizer scale. The selector enumerates
//! the full grid and subtracts an inset box — border cells of a
//! D-dimensional grid are most simply "grid minus inset", not a union of
//! boundary faces.

use crate::error::{GridError, Result};
use rffd_core::grid::{flat_offset, for_each_index, GridGeometry};

/// Scale assigned to coefficients that are optimized normally.
pub const UNIT_SCALE: f64 = 1.0;

/// Scale sentinel that effectively freezes a coefficient.
pub const FROZEN_SCALE: f64 = 10000.0;

/// Computes optimizer scale vectors that freeze edge coefficients.
#[derive(Debug, Clone)]
pub struct PassiveEdgeSelector<const D: usize> {
    periodic_axis: Option<usize>,
}

impl<const D: usize> PassiveEdgeSelector<D> {
    pub fn new() -> Self {
        Self {
            periodic_axis: None,
        }
    }

    /// Mark one axis as periodic; a periodic boundary has no true edge and
    /// is never shrunk.
    pub fn with_periodic_axis(mut self, axis: usize) -> Self {
        assert!(axis < D, "periodic axis out of range");
        self.periodic_axis = Some(axis);
        self
    }

    /// Compute the optimizer scale vector for a grid.
    ///
    /// All nodes within `edge_width` layers of a non-periodic boundary get
    /// [`FROZEN_SCALE`] on every component; the inset interior gets
    /// [`UNIT_SCALE`]. Scales are laid out like the parameter vector
    /// (component-major).
    pub fn compute_scales(&self, grid: &GridGeometry<D>, edge_width: usize) -> Result<Vec<f64>> {
        let num_nodes = grid.num_nodes();
        let mut scales = vec![UNIT_SCALE; grid.num_parameters()];
        if edge_width == 0 {
            return Ok(scales);
        }

        let size = grid.size();
        let mut inset_lo = [0usize; D];
        let mut inset_hi = size;
        for d in 0..D {
            if Some(d) == self.periodic_axis {
                continue;
            }
            if 2 * edge_width >= size[d] {
                return Err(GridError::EdgeWidthTooLarge {
                    axis: d,
                    edge_width,
                    size: size[d],
                });
            }
            inset_lo[d] = edge_width;
            inset_hi[d] = size[d] - edge_width;
        }

        for_each_index(size, |index| {
            let inside = (0..D).all(|d| index[d] >= inset_lo[d] && index[d] < inset_hi[d]);
            if !inside {
                let base = flat_offset(size, index);
                for component in 0..D {
                    scales[base + component * num_nodes] = FROZEN_SCALE;
                }
            }
        });
        Ok(scales)
    }
}

impl<const D: usize> Default for PassiveEdgeSelector<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rffd_core::spatial::{Direction, Point, Spacing};

    fn grid<const D: usize>(size: [usize; D]) -> GridGeometry<D> {
        GridGeometry::new(
            [0; D],
            size,
            Spacing::uniform(1.0),
            Point::origin(),
            Direction::identity(),
        )
    }

    #[test]
    fn test_zero_edge_width_gives_unit_scales() {
        let g = grid([10, 10, 10]);
        let scales = PassiveEdgeSelector::new().compute_scales(&g, 0).unwrap();
        assert_eq!(scales.len(), g.num_parameters());
        assert!(scales.iter().all(|&s| s == UNIT_SCALE));
    }

    #[test]
    fn test_edge_band_freezes_exactly_the_border() {
        let g = grid([10, 10, 10]);
        let w = 2;
        let scales = PassiveEdgeSelector::new().compute_scales(&g, w).unwrap();

        let mut frozen_nodes = 0;
        for z in 0..10 {
            for y in 0..10 {
                for x in 0..10 {
                    let border = [x, y, z]
                        .iter()
                        .any(|&i| i < w || i >= 10 - w);
                    let base = g.node_offset([x, y, z]);
                    for c in 0..3 {
                        let expected = if border { FROZEN_SCALE } else { UNIT_SCALE };
                        assert_eq!(scales[base + c * 1000], expected);
                    }
                    if border {
                        frozen_nodes += 1;
                    }
                }
            }
        }
        // Inset of (10 - 2w)^3 free nodes.
        assert_eq!(1000 - frozen_nodes, 6 * 6 * 6);
    }

    #[test]
    fn test_edge_width_too_large_is_fatal() {
        let g = grid([10, 10, 10]);
        let result = PassiveEdgeSelector::new().compute_scales(&g, 5);
        assert!(matches!(
            result,
            Err(GridError::EdgeWidthTooLarge {
                edge_width: 5,
                size: 10,
                ..
            })
        ));
    }

    #[test]
    fn test_periodic_boundary_is_never_shrunk() {
        let g = grid([8, 6]);
        let scales = PassiveEdgeSelector::new()
            .with_periodic_axis(1)
            .compute_scales(&g, 1)
            .unwrap();
        let nodes = g.num_nodes();

        // Node on the periodic boundary but inside the x-inset: free.
        let free = g.node_offset([3, 0]);
        assert_eq!(scales[free], UNIT_SCALE);
        assert_eq!(scales[free + nodes], UNIT_SCALE);

        // Node on the non-periodic x edge: frozen.
        let frozen = g.node_offset([0, 3]);
        assert_eq!(scales[frozen], FROZEN_SCALE);
        assert_eq!(scales[frozen + nodes], FROZEN_SCALE);
    }

    #[test]
    fn test_periodic_axis_allows_large_edge_width() {
        // Periodic axis is exempt from the inset check.
        let g = grid([10, 4]);
        let result = PassiveEdgeSelector::new()
            .with_periodic_axis(1)
            .compute_scales(&g, 2);
        assert!(result.is_ok());
    }
}
