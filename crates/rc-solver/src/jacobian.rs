//! Finite difference Jacobian computation.

use nalgebra::DMatrix;

use crate::error::SolverResult;

/// Forward-difference Jacobian around `x`, whose residual is `f_x`.
///
/// Column j perturbs x[j] by `step·max(|x[j]|, scale[j])`, stepping
/// backwards when the forward point leaves the upper bound or is
/// non-physical (`f` returns `None`). Returns `None` if neither direction
/// gives a usable point.
pub fn forward_difference<F>(
    x: &[f64],
    f_x: &[f64],
    bounds: &[(f64, f64)],
    scales: &[f64],
    step: f64,
    mut f: F,
) -> SolverResult<Option<DMatrix<f64>>>
where
    F: FnMut(&[f64]) -> SolverResult<Option<Vec<f64>>>,
{
    let n = x.len();
    let m = f_x.len();
    let mut jac = DMatrix::zeros(m, n);

    for j in 0..n {
        let h = step * x[j].abs().max(scales[j]);
        let forward_first = x[j] + h <= bounds[j].1;
        let candidates = if forward_first { [h, -h] } else { [-h, h] };

        let mut column = None;
        for dx in candidates {
            let mut x_perturbed = x.to_vec();
            x_perturbed[j] += dx;
            if let Some(f_perturbed) = f(&x_perturbed)? {
                column = Some((f_perturbed, dx));
                break;
            }
        }
        let Some((f_perturbed, dx)) = column else {
            return Ok(None);
        };

        for i in 0..m {
            jac[(i, j)] = (f_perturbed[i] - f_x[i]) / dx;
        }
    }

    Ok(Some(jac))
}
