//! Configuration for the control-grid schedule.
//!
//! Key names follow the abstract configuration keys of the registration
//! parameter interface (`FinalGridSpacingInVoxels`, `GridSpacingSchedule`,
//! ...); how they are parsed from a parameter file is not this crate's
//! concern.

use crate::error::{GridError, Result};
use rffd_core::grid::ImageGeometry;
use rffd_core::spatial::Spacing;
use serde::Deserialize;

/// Default final grid spacing, in voxel units, when nothing is configured.
pub const DEFAULT_FINAL_GRID_SPACING_IN_VOXELS: f64 = 16.0;

/// User-facing configuration of the control-grid schedule.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct GridConfig {
    /// Final (finest-level) grid spacing in voxel units; converted to
    /// physical units with the fixed-image spacing. Ignored when the
    /// physical-units key is present.
    pub final_grid_spacing_in_voxels: Option<Vec<f64>>,

    /// Final grid spacing directly in physical units. Presence of any
    /// entry selects this method.
    pub final_grid_spacing_in_physical_units: Option<Vec<f64>>,

    /// Per-level downsampling factors: either one entry per level or one
    /// entry per level per dimension. Absent means the default schedule
    /// `2^(levels-1-level)`.
    pub grid_spacing_schedule: Option<Vec<f64>>,

    /// Edge widths read per resolution level; missing levels fall back to
    /// the last entry, an empty list means 0 everywhere.
    pub passive_edge_width: Vec<usize>,

    /// The wraparound axis, if the deformation is periodic along one.
    pub periodic_axis: Option<usize>,

    /// B-spline order of the deformation model.
    pub spline_order: usize,

    /// Feed the initial transform into grid placement (composition mode).
    pub use_composition: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            final_grid_spacing_in_voxels: None,
            final_grid_spacing_in_physical_units: None,
            grid_spacing_schedule: None,
            passive_edge_width: Vec::new(),
            periodic_axis: None,
            spline_order: 3,
            use_composition: false,
        }
    }
}

impl GridConfig {
    /// Validate the dimension-independent parts of the configuration.
    pub fn validate<const D: usize>(&self) -> Result<()> {
        if self.spline_order == 0 {
            return Err(GridError::invalid_configuration(
                "spline order must be at least 1",
            ));
        }
        if let Some(axis) = self.periodic_axis {
            if axis >= D {
                return Err(GridError::invalid_configuration(format!(
                    "periodic axis {axis} out of range for {D} dimensions"
                )));
            }
        }
        Ok(())
    }

    /// Resolve the final grid spacing in physical units.
    ///
    /// The physical-units key wins when present; otherwise the voxel-unit
    /// spacing (default 16.0 per dimension) is multiplied by the image
    /// spacing. Spacing lists accept a single entry (applied to every
    /// dimension) or exactly D entries.
    pub fn final_spacing<const D: usize>(&self, image: &ImageGeometry<D>) -> Result<Spacing<D>> {
        if let Some(physical) = &self.final_grid_spacing_in_physical_units {
            broadcast_spacing::<D>("FinalGridSpacingInPhysicalUnits", physical)
        } else {
            let voxels = match &self.final_grid_spacing_in_voxels {
                Some(v) => broadcast_spacing::<D>("FinalGridSpacingInVoxels", v)?,
                None => Spacing::uniform(DEFAULT_FINAL_GRID_SPACING_IN_VOXELS),
            };
            Ok(voxels.component_mul(image.spacing()))
        }
    }

    /// Edge width for one resolution level.
    pub fn edge_width_for_level(&self, level: usize) -> usize {
        match self.passive_edge_width.len() {
            0 => 0,
            n => self.passive_edge_width[level.min(n - 1)],
        }
    }
}

fn broadcast_spacing<const D: usize>(key: &str, values: &[f64]) -> Result<Spacing<D>> {
    if values.iter().any(|&v| v <= 0.0) {
        return Err(GridError::invalid_configuration(format!(
            "{key} entries must be positive"
        )));
    }
    match values.len() {
        1 => Ok(Spacing::uniform(values[0])),
        n if n == D => Ok(Spacing::from_slice(values)),
        n => Err(GridError::invalid_configuration(format!(
            "{key} has {n} entries, expected 1 or {D}"
        ))),
    }
}
