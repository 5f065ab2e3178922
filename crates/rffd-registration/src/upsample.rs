//! Control-coefficient refinement between resolution levels.
//!
//! Refinement transfers coefficients from a coarse grid to a finer one
//! while representing the same continuous deformation field. It is done
//! separately per axis with the k-ary subdivision mask of the B-spline
//! basis: the degree-n basis satisfies
//!
//! ```text
//! B(x) = sum_r m[r] * B(k*x - r + c)
//! ```
//!
//! where `m` holds the coefficients of `(1 + z + ... + z^(k-1))^(n+1) / k^n`
//! and `c` centers the mask. For cubic splines and factor 2 this is the
//! familiar `[1, 4, 6, 4, 1] / 8`. On the periodic axis source indices wrap
//! so the refined field keeps its seam continuity; elsewhere coefficients
//! outside the grid contribute zero.

use crate::error::{GridError, Result};
use rffd_core::grid::{flat_offset, for_each_index, wrap_index, GridGeometry};

/// Relative tolerance for spacing-ratio and origin-offset integrality.
const ALIGNMENT_TOLERANCE: f64 = 1e-6;

/// Refines coefficient vectors from a coarse grid onto a finer grid.
#[derive(Debug, Clone)]
pub struct GridUpsampler<const D: usize> {
    spline_order: usize,
    periodic_axis: Option<usize>,
}

/// Per-axis refinement plan derived from the two geometries.
struct AxisPlan {
    factor: usize,
    /// Fine-lattice offset of the target origin relative to the source
    /// origin, in target-spacing units.
    offset: i64,
    identity: bool,
}

impl<const D: usize> GridUpsampler<D> {
    pub fn new(spline_order: usize) -> Self {
        assert!(spline_order >= 1, "spline order must be at least 1");
        Self {
            spline_order,
            periodic_axis: None,
        }
    }

    /// Mark one axis as periodic.
    pub fn with_periodic_axis(mut self, axis: usize) -> Self {
        assert!(axis < D, "periodic axis out of range");
        self.periodic_axis = Some(axis);
        self
    }

    /// Produce a parameter vector for `target` representing the same field
    /// as `parameters` does over `source`.
    pub fn upsample(
        &self,
        source: &GridGeometry<D>,
        target: &GridGeometry<D>,
        parameters: &[f64],
    ) -> Result<Vec<f64>> {
        if parameters.len() != source.num_parameters() {
            return Err(GridError::ParameterCountMismatch {
                expected: source.num_parameters(),
                actual: parameters.len(),
            });
        }
        if source.direction() != target.direction() {
            return Err(GridError::invalid_configuration(
                "source and target grids must share one direction matrix",
            ));
        }

        let plans = self.axis_plans(source, target)?;
        if plans.iter().all(|p| p.identity) {
            return Ok(parameters.to_vec());
        }

        let source_nodes = source.num_nodes();
        let target_nodes = target.num_nodes();
        let mut output = vec![0.0; target.num_parameters()];

        // Components refine independently; the flat layout is
        // component-major, so each component is one contiguous slab.
        for component in 0..D {
            let mut slab = parameters[component * source_nodes..(component + 1) * source_nodes]
                .to_vec();
            let mut dims = source.size();
            for (axis, plan) in plans.iter().enumerate() {
                if plan.identity {
                    continue;
                }
                let mask = refinement_mask(self.spline_order, plan.factor)?;
                slab = refine_axis(
                    &slab,
                    dims,
                    axis,
                    target.size()[axis],
                    plan,
                    &mask,
                    Some(axis) == self.periodic_axis,
                );
                dims[axis] = target.size()[axis];
            }
            output[component * target_nodes..(component + 1) * target_nodes]
                .copy_from_slice(&slab);
        }
        Ok(output)
    }

    fn axis_plans(
        &self,
        source: &GridGeometry<D>,
        target: &GridGeometry<D>,
    ) -> Result<Vec<AxisPlan>> {
        let origin_delta = target
            .direction()
            .to_frame(*target.origin() - *source.origin());

        let mut plans = Vec::with_capacity(D);
        for axis in 0..D {
            let ratio = source.spacing()[axis] / target.spacing()[axis];
            let factor = ratio.round();
            if factor < 1.0 || (ratio - factor).abs() > ALIGNMENT_TOLERANCE * ratio {
                return Err(GridError::NonIntegerRefinement {
                    axis,
                    source_spacing: source.spacing()[axis],
                    target: target.spacing()[axis],
                });
            }
            let factor = factor as usize;

            let raw_offset = origin_delta[axis] / target.spacing()[axis];
            let offset = raw_offset.round();
            if (raw_offset - offset).abs() > ALIGNMENT_TOLERANCE {
                return Err(GridError::MisalignedGrids {
                    axis,
                    offset: raw_offset,
                });
            }
            let offset = offset as i64;

            if Some(axis) == self.periodic_axis {
                if target.size()[axis] != factor * source.size()[axis] {
                    return Err(GridError::PeriodicSizeMismatch {
                        axis,
                        source_size: source.size()[axis],
                        target: target.size()[axis],
                        factor,
                    });
                }
            }

            let identity =
                factor == 1 && offset == 0 && source.size()[axis] == target.size()[axis];
            plans.push(AxisPlan {
                factor,
                offset,
                identity,
            });
        }
        Ok(plans)
    }
}

/// The k-ary subdivision mask of the degree-`order` B-spline, centered.
///
/// Fails when the mask has no integer center, which only happens for even
/// spline orders combined with even factors.
pub fn refinement_mask(order: usize, factor: usize) -> Result<Vec<f64>> {
    let span = (factor - 1) * (order + 1);
    if span % 2 != 0 {
        return Err(GridError::invalid_configuration(format!(
            "no centered refinement stencil for spline order {order} and factor {factor}"
        )));
    }
    // Coefficients of (1 + z + ... + z^(factor-1))^(order+1).
    let mut mask = vec![1.0];
    for _ in 0..=order {
        let mut next = vec![0.0; mask.len() + factor - 1];
        for (i, &m) in mask.iter().enumerate() {
            for j in 0..factor {
                next[i + j] += m;
            }
        }
        mask = next;
    }
    let norm = (factor as f64).powi(order as i32);
    for m in &mut mask {
        *m /= norm;
    }
    Ok(mask)
}

/// Apply the 1-D stencil along `axis` to every line of the buffer.
fn refine_axis<const D: usize>(
    input: &[f64],
    dims_in: [usize; D],
    axis: usize,
    n_out: usize,
    plan: &AxisPlan,
    mask: &[f64],
    wrap: bool,
) -> Vec<f64> {
    let mut dims_out = dims_in;
    dims_out[axis] = n_out;
    let mut output = vec![0.0; dims_out.iter().product()];

    let n_in = dims_in[axis] as i64;
    let k = plan.factor as i64;
    let center = (mask.len() as i64 - 1) / 2;
    let stride_in: usize = dims_in[..axis].iter().product();
    let stride_out: usize = dims_out[..axis].iter().product();

    let mut line_dims = dims_in;
    line_dims[axis] = 1;
    for_each_index(line_dims, |index| {
        let base_in = flat_offset(dims_in, index);
        let base_out = flat_offset(dims_out, index);
        for j in 0..n_out as i64 {
            // Position of the fine node on the fine lattice anchored at
            // the coarse origin; coarse node i sits at k*i.
            let q = j + plan.offset;
            let lo = (q - center).div_euclid(k);
            let hi = (q + center).div_euclid(k);
            let mut value = 0.0;
            for i in lo..=hi {
                let m = q - k * i + center;
                if m < 0 || m >= mask.len() as i64 {
                    continue;
                }
                let src = if wrap {
                    wrap_index(i, n_in as usize)
                } else if i < 0 || i >= n_in {
                    continue;
                } else {
                    i as usize
                };
                value += mask[m as usize] * input[base_in + src * stride_in];
            }
            output[base_out + j as usize * stride_out] = value;
        }
    });
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use rffd_core::spatial::{Direction, Point, Spacing};

    fn line_grid(size: usize, spacing: f64, origin: f64) -> GridGeometry<1> {
        GridGeometry::new(
            [0],
            [size],
            Spacing::new([spacing]),
            Point::new([origin]),
            Direction::identity(),
        )
    }

    #[test]
    fn test_cubic_factor_two_mask() {
        let mask = refinement_mask(3, 2).unwrap();
        let expected = [1.0 / 8.0, 4.0 / 8.0, 6.0 / 8.0, 4.0 / 8.0, 1.0 / 8.0];
        assert_eq!(mask.len(), 5);
        for (m, e) in mask.iter().zip(expected) {
            assert!((m - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_mask_phase_sums_to_one() {
        // Each residue class of the mask sums to 1, so constant coefficient
        // fields are preserved on a periodic axis.
        for factor in [2usize, 3, 4] {
            let mask = refinement_mask(3, factor).unwrap();
            for phase in 0..factor {
                let sum: f64 = mask.iter().skip(phase).step_by(factor).sum();
                assert!((sum - 1.0).abs() < 1e-12, "factor {factor} phase {phase}");
            }
        }
    }

    #[test]
    fn test_identity_refinement_returns_input() {
        let grid = line_grid(9, 2.0, -2.0);
        let params: Vec<f64> = (0..9).map(|i| i as f64 * 0.25).collect();
        let upsampler = GridUpsampler::<1>::new(3);
        let out = upsampler.upsample(&grid, &grid, &params).unwrap();
        assert_eq!(out, params);
    }

    #[test]
    fn test_impulse_response_non_periodic() {
        // Coarse nodes at 0, 2, ..., 16; fine nodes at -1, 0, ..., 15.
        // Anchoring puts the fine origin one coarse-margin node higher:
        // offset = (o_t - o_s)/s_t = 1.
        let source = line_grid(9, 2.0, -2.0);
        let target = line_grid(17, 1.0, -1.0);
        let mut params = vec![0.0; 9];
        params[4] = 1.0; // impulse at position 6.0

        let upsampler = GridUpsampler::<1>::new(3);
        let out = upsampler.upsample(&source, &target, &params).unwrap();

        // Fine node at position 6.0 is j = 7; the cubic factor-2 stencil
        // spreads the impulse as 1/8, 1/2, 3/4, 1/2, 1/8 around it.
        let expected = [1.0 / 8.0, 1.0 / 2.0, 3.0 / 4.0, 1.0 / 2.0, 1.0 / 8.0];
        for (j, e) in (5..=9).zip(expected) {
            assert!((out[j] - e).abs() < 1e-12, "node {j}: {} vs {e}", out[j]);
        }
        for (j, v) in out.iter().enumerate() {
            if !(5..=9).contains(&j) {
                assert!(v.abs() < 1e-12, "node {j} should be zero, got {v}");
            }
        }
    }

    #[test]
    fn test_periodic_impulse_wraps_across_seam() {
        // Period 8: 4 coarse nodes spacing 2, 8 fine nodes spacing 1, same
        // origin. An impulse at node 0 must leak across the wrap boundary.
        let source = line_grid(4, 2.0, 0.0);
        let target = line_grid(8, 1.0, 0.0);
        let mut params = vec![0.0; 4];
        params[0] = 1.0;

        let upsampler = GridUpsampler::<1>::new(3).with_periodic_axis(0);
        let out = upsampler.upsample(&source, &target, &params).unwrap();

        let expected = [0.75, 0.5, 0.125, 0.0, 0.0, 0.0, 0.125, 0.5];
        for (j, e) in expected.into_iter().enumerate() {
            assert!((out[j] - e).abs() < 1e-12, "node {j}: {} vs {e}", out[j]);
        }
    }

    #[test]
    fn test_periodic_constant_field_has_no_seam() {
        let source = line_grid(5, 2.0, 0.0);
        let target = line_grid(10, 1.0, 0.0);
        let params = vec![0.7; 5];

        let upsampler = GridUpsampler::<1>::new(3).with_periodic_axis(0);
        let out = upsampler.upsample(&source, &target, &params).unwrap();
        for (j, v) in out.iter().enumerate() {
            assert!((v - 0.7).abs() < 1e-12, "node {j} drifted to {v}");
        }
    }

    #[test]
    fn test_non_integer_subdivision_is_fatal() {
        let source = line_grid(5, 3.0, 0.0);
        let target = line_grid(8, 2.0, 0.0);
        let upsampler = GridUpsampler::<1>::new(3);
        let result = upsampler.upsample(&source, &target, &vec![0.0; 5]);
        assert!(matches!(
            result,
            Err(GridError::NonIntegerRefinement { axis: 0, .. })
        ));
    }

    #[test]
    fn test_periodic_size_mismatch_is_fatal() {
        let source = line_grid(4, 2.0, 0.0);
        let target = line_grid(9, 1.0, 0.0);
        let upsampler = GridUpsampler::<1>::new(3).with_periodic_axis(0);
        let result = upsampler.upsample(&source, &target, &vec![0.0; 4]);
        assert!(matches!(
            result,
            Err(GridError::PeriodicSizeMismatch { axis: 0, .. })
        ));
    }

    #[test]
    fn test_parameter_count_checked() {
        let grid = line_grid(5, 2.0, 0.0);
        let upsampler = GridUpsampler::<1>::new(3);
        let result = upsampler.upsample(&grid, &grid, &vec![0.0; 4]);
        assert!(matches!(
            result,
            Err(GridError::ParameterCountMismatch {
                expected: 5,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_two_dimensional_components_refine_independently() {
        // 2-D grid, identity on axis 1, factor 2 on axis 0. A field whose
        // x-component is constant and y-component is an impulse stays
        // separated per component.
        let source = GridGeometry::<2>::new(
            [0; 2],
            [4, 3],
            Spacing::new([2.0, 1.0]),
            Point::new([0.0, 0.0]),
            Direction::identity(),
        );
        let target = GridGeometry::<2>::new(
            [0; 2],
            [8, 3],
            Spacing::new([1.0, 1.0]),
            Point::new([0.0, 0.0]),
            Direction::identity(),
        );
        let nodes = 12;
        let mut params = vec![0.0; nodes * 2];
        for v in params.iter_mut().take(nodes) {
            *v = 1.0; // x-component constant
        }
        params[nodes + source.node_offset([1, 1])] = 1.0; // y impulse

        let upsampler = GridUpsampler::<2>::new(3).with_periodic_axis(0);
        let out = upsampler.upsample(&source, &target, &params).unwrap();

        let target_nodes = target.num_nodes();
        // Constant x-component survives on the periodic axis.
        for (o, v) in out.iter().take(target_nodes).enumerate() {
            assert!((v - 1.0).abs() < 1e-12, "x offset {o} drifted to {v}");
        }
        // y-component stays confined to its middle row.
        for idx0 in 0..8usize {
            let off_row0 = target_nodes + target.node_offset([idx0, 0]);
            assert!(out[off_row0].abs() < 1e-12);
        }
        let peak = target_nodes + target.node_offset([2, 1]);
        assert!((out[peak] - 0.75).abs() < 1e-12);
    }
}
