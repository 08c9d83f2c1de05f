//! start — Poisson starting values for the network optimizers.
//!
//! Purpose
//! -------
//! Produce the initial coefficient vector for a fit by regressing the counts
//! on the linear design `W` with a Poisson log-link GLM, fitted by
//! iteratively reweighted least squares.
//!
//! Key behaviors
//! -------------
//! - Columns of `W` that are (numerically) linear combinations of earlier
//!   columns are detected by Gram–Schmidt and excluded from the fit; their
//!   coefficients are reported as `0`. This covers the dispersion intercept
//!   appended to a design that already has an intercept.
//! - IRLS starts from `μ = Y + 0.1`, stops when the relative deviance change
//!   drops below `1e-8`, and runs at most 25 iterations. Hitting the cap is
//!   not an error: the last iterate is still a usable starting point.
//! - Each weighted least-squares step is solved with a Cholesky
//!   factorization, falling back to LU.
//!
//! Conventions
//! -----------
//! - The returned vector has one entry per column of
//!   [`ModelSpec::linear_design`]; for `rconst` the caller appends the `ρ`
//!   seed.
use crate::model::{
    errors::{ModelError, ModelResult},
    spec::ModelSpec,
};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Relative residual norm below which a column counts as aliased.
pub const ALIAS_TOLERANCE: f64 = 1e-7;

const IRLS_MAX_ITER: usize = 25;
const IRLS_TOLERANCE: f64 = 1e-8;
const MU_FLOOR: f64 = 1e-10;

/// Result of the Poisson starting fit.
///
/// - `coefficients`: one entry per design column, `0` for aliased columns.
/// - `aliased`: indices of the columns excluded from the fit.
/// - `iterations`: IRLS iterations performed.
/// - `converged`: `false` when the iteration cap was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct PoissonStart {
    pub coefficients: Array1<f64>,
    pub aliased: Vec<usize>,
    pub iterations: usize,
    pub converged: bool,
}

/// Poisson regression of the spec's counts on its linear design.
///
/// # Errors
/// - [`ModelError::StartFailed`] when every column is aliased, a
///   least-squares step cannot be solved, or the coefficients become
///   non-finite.
pub fn poisson_start(spec: &ModelSpec) -> ModelResult<PoissonStart> {
    poisson_irls(spec.linear_design(), spec.counts())
}

/// Poisson log-link IRLS on an arbitrary design.
pub fn poisson_irls(design: &Array2<f64>, y: ArrayView1<f64>) -> ModelResult<PoissonStart> {
    let aliased = aliased_columns(design);
    let kept: Vec<usize> = (0..design.ncols()).filter(|k| !aliased.contains(k)).collect();
    if kept.is_empty() {
        return Err(ModelError::StartFailed { reason: "design has no identifiable column".into() });
    }
    let x = design.select(Axis(1), &kept);

    let mut mu = y.mapv(|v| v + 0.1);
    let mut eta = mu.mapv(f64::ln);
    let mut deviance = poisson_deviance(y, &mu);
    let mut beta = Array1::<f64>::zeros(kept.len());
    let mut converged = false;
    let mut iterations = 0;

    while iterations < IRLS_MAX_ITER {
        iterations += 1;
        // Log link: weights μ, working response η + (y − μ)/μ.
        let z: Array1<f64> = eta
            .iter()
            .zip(y.iter())
            .zip(mu.iter())
            .map(|((&e, &yi), &m)| e + (yi - m) / m)
            .collect();
        beta = solve_weighted_least_squares(&x, &z, &mu)?;
        eta = x.dot(&beta);
        mu = eta.mapv(|e| e.exp().max(MU_FLOOR));

        let deviance_old = deviance;
        deviance = poisson_deviance(y, &mu);
        let rel_change = (deviance_old - deviance).abs() / (deviance_old.abs() + 0.1);
        log::debug!("poisson start: iteration {iterations}, deviance = {deviance:.6}");
        if rel_change < IRLS_TOLERANCE {
            converged = true;
            break;
        }
    }

    if let Some(value) = beta.iter().find(|v| !v.is_finite()) {
        return Err(ModelError::StartFailed { reason: format!("non-finite coefficient {value}") });
    }
    let mut coefficients = Array1::<f64>::zeros(design.ncols());
    for (b, &k) in beta.iter().zip(kept.iter()) {
        coefficients[k] = *b;
    }
    Ok(PoissonStart { coefficients, aliased, iterations, converged })
}

// ---- Helper methods ----

/// Columns whose Gram–Schmidt residual against earlier kept columns is
/// negligible relative to their own norm.
fn aliased_columns(design: &Array2<f64>) -> Vec<usize> {
    let mut basis: Vec<Array1<f64>> = Vec::new();
    let mut aliased = Vec::new();
    for (k, column) in design.axis_iter(Axis(1)).enumerate() {
        let norm = column.dot(&column).sqrt();
        let mut resid = column.to_owned();
        for q in &basis {
            let proj = q.dot(&resid);
            resid.scaled_add(-proj, q);
        }
        let resid_norm = resid.dot(&resid).sqrt();
        if norm == 0.0 || resid_norm <= ALIAS_TOLERANCE * norm {
            aliased.push(k);
        } else {
            basis.push(resid / resid_norm);
        }
    }
    aliased
}

fn poisson_deviance(y: ArrayView1<f64>, mu: &Array1<f64>) -> f64 {
    2.0 * y
        .iter()
        .zip(mu.iter())
        .map(|(&yi, &m)| if yi > 0.0 { yi * (yi / m).ln() - (yi - m) } else { m })
        .sum::<f64>()
}

fn solve_weighted_least_squares(
    x: &Array2<f64>, z: &Array1<f64>, w: &Array1<f64>,
) -> ModelResult<Array1<f64>> {
    let (n, p) = x.dim();
    let sqrt_w = w.mapv(f64::sqrt);
    let x_weighted = DMatrix::from_fn(n, p, |i, j| x[[i, j]] * sqrt_w[i]);
    let z_weighted = DVector::from_iterator(n, z.iter().zip(sqrt_w.iter()).map(|(&zi, &s)| zi * s));

    let xtx = x_weighted.transpose() * &x_weighted;
    let xtz = x_weighted.transpose() * z_weighted;
    let solution = match xtx.clone().cholesky() {
        Some(chol) => chol.solve(&xtz),
        None => xtx.lu().solve(&xtz).ok_or_else(|| ModelError::StartFailed {
            reason: "weighted least-squares system is singular".into(),
        })?,
    };
    Ok(solution.iter().copied().collect())
}
