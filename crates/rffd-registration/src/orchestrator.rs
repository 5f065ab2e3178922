//! Resolution-level orchestration.
//!
//! Drives schedule computation, coefficient refinement and passive-edge
//! selection across the coarse-to-fine levels of one registration run.
//! The orchestrator owns the current grid, parameter vector and optimizer
//! scale vector; the external optimizer receives snapshots and hands an
//! updated parameter vector back at level completion.

use crate::config::GridConfig;
use crate::error::{GridError, Result};
use crate::passive::PassiveEdgeSelector;
use crate::schedule::ScheduleComputer;
use crate::upsample::GridUpsampler;
use rffd_core::grid::{GridGeometry, ImageGeometry};
use rffd_core::transform::InitialTransform;

/// Where the orchestrator is in its level progression.
///
/// `Placeholder` is the explicit state between `before_run` and level 0:
/// a size-1-per-dimension grid with zero parameters is installed purely so
/// the external parameter-count precondition check can run before any
/// resolution-level logic. It is discarded on the first `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPhase {
    Uninitialized,
    Placeholder,
    Level(usize),
    Done,
}

/// Owns the per-level grid, parameters and scales of one registration run.
pub struct ResolutionOrchestrator<const D: usize> {
    upsampler: GridUpsampler<D>,
    selector: PassiveEdgeSelector<D>,
    config: GridConfig,
    levels: usize,
    grids: Vec<GridGeometry<D>>,
    schedule: ScheduleComputer<D>,
    phase: ResolutionPhase,
    grid: GridGeometry<D>,
    parameters: Vec<f64>,
    scales: Vec<f64>,
}

impl<const D: usize> ResolutionOrchestrator<D> {
    /// Build an orchestrator from configuration and fixed-image geometry.
    ///
    /// The initial transform is forwarded to grid placement only when the
    /// configuration enables composition.
    pub fn from_config(
        config: GridConfig,
        image: ImageGeometry<D>,
        levels: usize,
        initial_transform: Option<Box<dyn InitialTransform<D>>>,
    ) -> Result<Self> {
        config.validate::<D>()?;
        if levels == 0 {
            return Err(GridError::invalid_configuration(
                "at least one resolution level is required",
            ));
        }

        let final_spacing = config.final_spacing(&image)?;
        let mut schedule = ScheduleComputer::new(image, levels, final_spacing)
            .with_spline_order(config.spline_order);
        let mut upsampler = GridUpsampler::new(config.spline_order);
        let mut selector = PassiveEdgeSelector::new();
        if let Some(axis) = config.periodic_axis {
            schedule = schedule.with_periodic_axis(axis);
            upsampler = upsampler.with_periodic_axis(axis);
            selector = selector.with_periodic_axis(axis);
        }
        if let Some(entries) = &config.grid_spacing_schedule {
            schedule = schedule.with_schedule_entries(entries)?;
        }
        if config.use_composition {
            if let Some(transform) = initial_transform {
                schedule = schedule.with_initial_transform(transform);
            }
        }

        Ok(Self {
            upsampler,
            selector,
            config,
            levels,
            grids: Vec::new(),
            schedule,
            phase: ResolutionPhase::Uninitialized,
            grid: GridGeometry::placeholder(),
            parameters: Vec::new(),
            scales: Vec::new(),
        })
    }

    /// Precompute all per-level grids and install the placeholder.
    pub fn before_run(&mut self) -> Result<()> {
        if self.phase != ResolutionPhase::Uninitialized {
            return Err(GridError::invalid_state(format!(
                "before_run called in phase {:?}",
                self.phase
            )));
        }
        self.grids = self.schedule.compute()?;
        self.grid = GridGeometry::placeholder();
        self.parameters = vec![0.0; self.grid.num_parameters()];
        self.scales = vec![1.0; self.grid.num_parameters()];
        self.phase = ResolutionPhase::Placeholder;
        Ok(())
    }

    /// Move to the next resolution level.
    ///
    /// From `Placeholder` this installs the level-0 grid with zero
    /// parameters; from `Level(l)` it refines the currently held
    /// (externally optimized) parameters onto level `l+1`. Advancing past
    /// the last level enters `Done`; levels are never re-entered.
    pub fn advance(&mut self) -> Result<()> {
        match self.phase {
            ResolutionPhase::Uninitialized => Err(GridError::invalid_state(
                "advance called before before_run".to_string(),
            )),
            ResolutionPhase::Placeholder => {
                self.install_level(0, None)?;
                Ok(())
            }
            ResolutionPhase::Level(level) if level + 1 < self.levels => {
                let previous = std::mem::take(&mut self.parameters);
                self.install_level(level + 1, Some(previous))?;
                Ok(())
            }
            ResolutionPhase::Level(_) => {
                self.phase = ResolutionPhase::Done;
                Ok(())
            }
            ResolutionPhase::Done => Err(GridError::invalid_state(
                "advance called after the final level".to_string(),
            )),
        }
    }

    /// Accept the parameter vector the optimizer produced for the current
    /// level.
    pub fn set_optimized_parameters(&mut self, parameters: Vec<f64>) -> Result<()> {
        match self.phase {
            ResolutionPhase::Level(_) => {
                if parameters.len() != self.grid.num_parameters() {
                    return Err(GridError::ParameterCountMismatch {
                        expected: self.grid.num_parameters(),
                        actual: parameters.len(),
                    });
                }
                self.parameters = parameters;
                Ok(())
            }
            phase => Err(GridError::invalid_state(format!(
                "optimized parameters supplied in phase {phase:?}"
            ))),
        }
    }

    fn install_level(&mut self, level: usize, previous: Option<Vec<f64>>) -> Result<()> {
        let next_grid = self.grids[level].clone();
        self.parameters = match previous {
            None => vec![0.0; next_grid.num_parameters()],
            Some(previous) => {
                // Refine the coarser level's optimized coefficients; the
                // represented field is unchanged.
                self.upsampler.upsample(&self.grid, &next_grid, &previous)?
            }
        };
        let edge_width = self.config.edge_width_for_level(level);
        self.scales = self.selector.compute_scales(&next_grid, edge_width)?;
        tracing::info!(
            level,
            nodes = next_grid.num_nodes(),
            parameters = self.parameters.len(),
            edge_width,
            "installed control grid"
        );
        self.grid = next_grid;
        self.phase = ResolutionPhase::Level(level);
        Ok(())
    }

    pub fn phase(&self) -> ResolutionPhase {
        self.phase
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    /// The currently installed grid.
    pub fn grid(&self) -> &GridGeometry<D> {
        &self.grid
    }

    /// Parameters for the current level (initial values until the
    /// optimizer reports back).
    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    /// Optimizer scales for the current level.
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }
}
