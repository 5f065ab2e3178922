//! Error types for control-grid computation.
//!
//! Everything here is fatal: grid and schedule computation is deterministic
//! and pure, so a failure reflects a configuration defect and is surfaced
//! immediately instead of recovered from. Spacing adjustments forced by the
//! periodic axis are not errors; they are logged as warnings where they
//! happen.

use thiserror::Error;

/// Main error type for grid schedule, refinement and scale computation.
#[derive(Error, Debug)]
pub enum GridError {
    /// The grid spacing schedule has the wrong number of entries.
    #[error(
        "invalid grid spacing schedule: {actual} entries, expected {levels} \
         (one per level) or {} (one per level per dimension)",
        levels * dimension
    )]
    InvalidScheduleLength {
        levels: usize,
        dimension: usize,
        actual: usize,
    },

    /// The passive edge width leaves no inset region on some axis.
    #[error(
        "passive edge width {edge_width} is too large: grid axis {axis} has \
         only {size} nodes"
    )]
    EdgeWidthTooLarge {
        axis: usize,
        edge_width: usize,
        size: usize,
    },

    /// Refinement between two levels is not an integer subdivision.
    #[error(
        "grid refinement along axis {axis} requires an integer spacing \
         subdivision: source spacing {source_spacing}, target spacing {target}"
    )]
    NonIntegerRefinement {
        axis: usize,
        source_spacing: f64,
        target: f64,
    },

    /// Source and target grid lattices do not nest.
    #[error(
        "source and target grids are not nested along axis {axis}: origin \
         offset is {offset} target-spacing units"
    )]
    MisalignedGrids { axis: usize, offset: f64 },

    /// The periodic axis sizes do not match the refinement factor.
    #[error(
        "periodic axis {axis}: target grid has {target} nodes, expected \
         {factor} x {source_size}"
    )]
    PeriodicSizeMismatch {
        axis: usize,
        source_size: usize,
        target: usize,
        factor: usize,
    },

    /// A parameter vector does not match the grid it is validated against.
    #[error("parameter vector has {actual} entries, grid requires {expected}")]
    ParameterCountMismatch { expected: usize, actual: usize },

    /// An orchestrator operation was invoked in the wrong phase.
    #[error("invalid resolution phase: {0}")]
    InvalidState(String),

    /// Any other configuration defect.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A persisted grid record is missing or malformed.
    #[error("malformed {key} record: {reason}")]
    Record { key: String, reason: String },
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

impl GridError {
    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create an invalid state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create a record error.
    pub fn record(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Record {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_error_display() {
        let err = GridError::InvalidScheduleLength {
            levels: 3,
            dimension: 3,
            actual: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("4 entries"));
        assert!(msg.contains('3'));
        assert!(msg.contains('9'));
    }

    #[test]
    fn test_edge_width_error_names_axis() {
        let err = GridError::EdgeWidthTooLarge {
            axis: 1,
            edge_width: 5,
            size: 10,
        };
        assert!(err.to_string().contains("axis 1"));
    }
}
