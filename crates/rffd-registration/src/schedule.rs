//! Per-level control-grid computation.
//!
//! Given the fixed-image geometry, a level count and a final grid spacing,
//! the [`ScheduleComputer`] derives one [`GridGeometry`] per resolution
//! level. Grids at successive levels are nested node lattices (each level
//! anchored the same number of nodes below the image bounding box), which
//! is what makes coefficient refinement between levels exact.

use crate::error::{GridError, Result};
use rffd_core::grid::{GridGeometry, ImageGeometry};
use rffd_core::spatial::{Point, Spacing, Vector};
use rffd_core::transform::InitialTransform;

/// Relative tolerance below which a spacing adjustment is not worth a
/// warning.
const SPACING_TOLERANCE: f64 = 1e-6;

/// Computes the control-grid geometry for every resolution level.
pub struct ScheduleComputer<const D: usize> {
    image: ImageGeometry<D>,
    levels: usize,
    spline_order: usize,
    periodic_axis: Option<usize>,
    final_spacing: Spacing<D>,
    schedule: Vec<[f64; D]>,
    initial_transform: Option<Box<dyn InitialTransform<D>>>,
}

impl<const D: usize> ScheduleComputer<D> {
    /// Create a schedule computer with the default (power-of-two) schedule.
    ///
    /// `final_spacing` is the grid spacing of the finest level, in physical
    /// units.
    pub fn new(image: ImageGeometry<D>, levels: usize, final_spacing: Spacing<D>) -> Self {
        assert!(levels >= 1, "at least one resolution level is required");
        let schedule = default_schedule::<D>(levels);
        Self {
            image,
            levels,
            spline_order: 3,
            periodic_axis: None,
            final_spacing,
            schedule,
            initial_transform: None,
        }
    }

    /// Set the B-spline order (default 3).
    pub fn with_spline_order(mut self, order: usize) -> Self {
        assert!(order >= 1, "spline order must be at least 1");
        self.spline_order = order;
        self
    }

    /// Mark one axis as periodic.
    pub fn with_periodic_axis(mut self, axis: usize) -> Self {
        assert!(axis < D, "periodic axis out of range");
        self.periodic_axis = Some(axis);
        self
    }

    /// Account for an initial transform when placing the grid.
    pub fn with_initial_transform(mut self, transform: Box<dyn InitialTransform<D>>) -> Self {
        self.initial_transform = Some(transform);
        self
    }

    /// Override the default schedule with explicit downsampling factors.
    ///
    /// Accepts one entry per level (applied to every dimension) or one
    /// entry per level per dimension, level-major. Any other count is a
    /// fatal configuration error, raised before any grid is computed.
    pub fn with_schedule_entries(mut self, entries: &[f64]) -> Result<Self> {
        if entries.iter().any(|&f| f <= 0.0) {
            return Err(GridError::invalid_configuration(
                "grid spacing schedule factors must be positive",
            ));
        }
        if entries.len() == self.levels {
            for (level, &factor) in entries.iter().enumerate() {
                self.schedule[level] = [factor; D];
            }
        } else if entries.len() == self.levels * D {
            for level in 0..self.levels {
                for d in 0..D {
                    self.schedule[level][d] = entries[level * D + d];
                }
            }
        } else {
            return Err(GridError::InvalidScheduleLength {
                levels: self.levels,
                dimension: D,
                actual: entries.len(),
            });
        }
        Ok(self)
    }

    /// Number of resolution levels.
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// The downsampling factors currently in effect.
    pub fn schedule(&self) -> &[[f64; D]] {
        &self.schedule
    }

    /// Compute the grid geometry for every level, coarse to fine.
    pub fn compute(&self) -> Result<Vec<GridGeometry<D>>> {
        let (min, max) = self.bounding_box();
        let margin_lo = (self.spline_order - 1) / 2;

        let mut grids = Vec::with_capacity(self.levels);
        // Node count of the previous (coarser) level on the periodic axis;
        // finer levels snap to a multiple of it so refinement divides.
        let mut previous_periodic_nodes: Option<usize> = None;

        for level in 0..self.levels {
            let mut size = [0usize; D];
            let mut spacing = Spacing::zeros();
            let mut origin_frame = [0.0f64; D];

            for d in 0..D {
                let requested = self.final_spacing[d] * self.schedule[level][d];
                if Some(d) == self.periodic_axis {
                    let period = self.image.size()[d] as f64 * self.image.spacing()[d];
                    let raw = (period / requested).round().max(1.0) as usize;
                    let nodes = match previous_periodic_nodes {
                        None => raw,
                        Some(prev) => {
                            let factor = ((raw as f64 / prev as f64).round()).max(1.0) as usize;
                            prev * factor
                        }
                    };
                    let adjusted = period / nodes as f64;
                    if (adjusted - requested).abs() > SPACING_TOLERANCE * requested {
                        tracing::warn!(
                            level,
                            axis = d,
                            requested,
                            adjusted,
                            "grid spacing adjusted to divide the periodic extent"
                        );
                    }
                    size[d] = nodes;
                    spacing[d] = adjusted;
                    origin_frame[d] = min[d];
                    previous_periodic_nodes = Some(nodes);
                } else {
                    let extent = max[d] - min[d];
                    size[d] = (extent / requested).ceil() as usize + self.spline_order + 1;
                    spacing[d] = requested;
                    origin_frame[d] = min[d] - requested * margin_lo as f64;
                }
            }

            let origin_vec = self
                .image
                .direction()
                .from_frame(Vector::from_fn(|d| origin_frame[d]));
            let origin = Point::origin() + origin_vec;

            grids.push(GridGeometry::new(
                [0; D],
                size,
                spacing,
                origin,
                *self.image.direction(),
            ));
        }
        Ok(grids)
    }

    /// Axis-aligned bounding box of the image corners, in the direction
    /// frame, after the initial transform when composition is in use.
    fn bounding_box(&self) -> ([f64; D], [f64; D]) {
        let mut min = [f64::INFINITY; D];
        let mut max = [f64::NEG_INFINITY; D];
        let size = self.image.size();

        for corner in 0..(1usize << D) {
            let mut index = [0.0f64; D];
            for d in 0..D {
                if corner >> d & 1 == 1 {
                    index[d] = (size[d] - 1) as f64;
                }
            }
            let mut point = self.image.index_to_physical(index);
            if let Some(transform) = &self.initial_transform {
                point = transform.transform_point(&point);
            }
            let frame = self.image.direction().to_frame(point.as_vector());
            for d in 0..D {
                min[d] = min[d].min(frame[d]);
                max[d] = max[d].max(frame[d]);
            }
        }
        (min, max)
    }
}

/// The default schedule: factor `2^(levels-1-level)` on every dimension.
fn default_schedule<const D: usize>(levels: usize) -> Vec<[f64; D]> {
    (0..levels)
        .map(|level| [2.0f64.powi((levels - 1 - level) as i32); D])
        .collect()
}
