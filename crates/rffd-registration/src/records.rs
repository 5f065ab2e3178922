//! Persisted grid state, as textual key/value records.
//!
//! Five records fully describe a control grid:
//! `(GridSize ...)`, `(GridIndex ...)`, `(GridSpacing ...)`,
//! `(GridOrigin ...)` and `(GridDirection ...)`. The direction matrix is
//! flattened column by column, i.e. entry `i * D + j` holds
//! `direction(j, i)`. Reading reconstructs the full geometry before any
//! parameter vector is looked at; parameter validation is a separate step
//! because the expected count is derived from the grid size.

use crate::error::{GridError, Result};
use rffd_core::grid::GridGeometry;
use rffd_core::spatial::{Direction, Point, Spacing};
use std::collections::HashMap;
use std::fmt::Write;

const RECORD_KEYS: [&str; 5] = [
    "GridSize",
    "GridIndex",
    "GridSpacing",
    "GridOrigin",
    "GridDirection",
];

/// Write the five grid records.
pub fn write_grid_records<const D: usize>(grid: &GridGeometry<D>) -> String {
    let mut out = String::new();
    write_record(&mut out, "GridSize", (0..D).map(|d| grid.size()[d].to_string()));
    write_record(&mut out, "GridIndex", (0..D).map(|d| grid.index()[d].to_string()));
    write_record(&mut out, "GridSpacing", (0..D).map(|d| grid.spacing()[d].to_string()));
    write_record(&mut out, "GridOrigin", (0..D).map(|d| grid.origin()[d].to_string()));
    write_record(
        &mut out,
        "GridDirection",
        (0..D).flat_map(|i| (0..D).map(move |j| (i, j))).map(|(i, j)| {
            grid.direction()[(j, i)].to_string()
        }),
    );
    out
}

fn write_record(out: &mut String, key: &str, values: impl Iterator<Item = String>) {
    let joined: Vec<String> = values.collect();
    let _ = writeln!(out, "({key} {})", joined.join(" "));
}

/// Reconstruct a grid geometry from its records.
pub fn read_grid_records<const D: usize>(text: &str) -> Result<GridGeometry<D>> {
    let mut fields: HashMap<&str, Vec<&str>> = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if !line.starts_with('(') || !line.ends_with(')') {
            continue;
        }
        let mut tokens = line[1..line.len() - 1].split_whitespace();
        let Some(key) = tokens.next() else { continue };
        if RECORD_KEYS.contains(&key) {
            fields.insert(key, tokens.collect());
        }
    }

    let size = parse_values::<usize>(&fields, "GridSize", D)?;
    let index = parse_values::<i64>(&fields, "GridIndex", D)?;
    let spacing = parse_values::<f64>(&fields, "GridSpacing", D)?;
    let origin = parse_values::<f64>(&fields, "GridOrigin", D)?;
    let direction = parse_values::<f64>(&fields, "GridDirection", D * D)?;

    if size.iter().any(|&s| s < 1) {
        return Err(GridError::record("GridSize", "sizes must be at least 1"));
    }
    if spacing.iter().any(|&s| s <= 0.0) {
        return Err(GridError::record("GridSpacing", "spacings must be positive"));
    }

    let mut size_arr = [0usize; D];
    let mut index_arr = [0i64; D];
    for d in 0..D {
        size_arr[d] = size[d];
        index_arr[d] = index[d];
    }
    let mut dir = Direction::<D>::identity();
    for i in 0..D {
        for j in 0..D {
            dir[(j, i)] = direction[i * D + j];
        }
    }

    Ok(GridGeometry::new(
        index_arr,
        size_arr,
        Spacing::from_slice(&spacing),
        Point::from_slice(&origin),
        dir,
    ))
}

/// Check a parameter vector against a reconstructed grid.
///
/// Deliberately separate from [`read_grid_records`]: the grid must be set
/// before parameters are validated, since the expected count comes from
/// the grid size.
pub fn validate_parameters<const D: usize>(
    grid: &GridGeometry<D>,
    parameters: &[f64],
) -> Result<()> {
    if parameters.len() != grid.num_parameters() {
        return Err(GridError::ParameterCountMismatch {
            expected: grid.num_parameters(),
            actual: parameters.len(),
        });
    }
    Ok(())
}

fn parse_values<T: std::str::FromStr>(
    fields: &HashMap<&str, Vec<&str>>,
    key: &'static str,
    expected: usize,
) -> Result<Vec<T>> {
    let tokens = fields
        .get(key)
        .ok_or_else(|| GridError::record(key, "record is missing"))?;
    if tokens.len() != expected {
        return Err(GridError::record(
            key,
            format!("{} values, expected {expected}", tokens.len()),
        ));
    }
    tokens
        .iter()
        .map(|t| {
            t.parse::<T>()
                .map_err(|_| GridError::record(key, format!("cannot parse value {t:?}")))
        })
        .collect()
}
