//! hessian — analytic curvature for the intra-group correlation model.
//!
//! Purpose
//! -------
//! Provide the closed-form `M × M` Hessian of `−ℓ(θ)` for
//! [`Parameterization::RhoConst`]. The estimator substitutes it when the
//! finite-difference curvature at the optimum cannot be inverted. The other
//! parameterizations have no analytic Hessian and rely on the numerical
//! curvature only.
//!
//! Key behaviors
//! -------------
//! Per group, with `c = (1−ρ)/ρ`, `p = softmax(X·β)`, `a = c·p`,
//! `x̄ = Σ_j p_j x_j`, `x̃_j = x_j − x̄`, `C = Σ_j p_j x̃_j x̃_jᵀ`,
//! `D_j = ψ(a_j+Y_j) − ψ(a_j)` and `T_j = ψ'(a_j+Y_j) − ψ'(a_j)`:
//!
//! - `∂²ℓ/∂β∂βᵀ = Σ_j (c² T_j p_j² + c D_j p_j) x̃_j x̃_jᵀ − (Σ_j c D_j p_j) C`
//!   (softmax Jacobian plus its own derivative).
//! - `∂²ℓ/∂β∂ρ = −ρ⁻² Σ_j p_j x̃_j (D_j + c p_j T_j)`.
//! - `∂²ℓ/∂ρ² = f''/ρ⁴ + 2f'/ρ³` with
//!   `f' = ψ(c) − ψ(c+n) + Σ_j p_j D_j` and
//!   `f'' = ψ'(c) − ψ'(c+n) + Σ_j p_j² T_j`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `ρ ∈ (0, 1)`; at the boundary the entries are non-finite and the
//!   inference layer reports the curvature as unusable.
//! - The returned matrix is symmetric up to rounding in the matrix products.
//!
//! Testing notes
//! -------------
//! - Agreement with the finite-difference Jacobian of the analytic gradient
//!   at interior points, and the variant guard for non-`rconst` specs.
use crate::{
    model::{
        errors::{ModelError, ModelResult},
        groups::sum_mat_over_groups,
        spec::ModelSpec,
    },
    optimization::numerical_stability::{
        digamma_rising, rho_concentration, softmax, trigamma_rising,
    },
};
use ndarray::{Array1, Array2, ArrayView1, Axis, s};

#[cfg(doc)]
use crate::model::parameterization::Parameterization;

/// Analytic Hessian of the negative log-likelihood (`rconst` only).
///
/// Parameters
/// ----------
/// - `theta`: `[β_1, …, β_K, ρ]`.
/// - `spec`: a spec built with [`Parameterization::RhoConst`].
///
/// Returns
/// -------
/// The `(K+1) × (K+1)` matrix `∇²(−ℓ)(θ)`.
///
/// Errors
/// ------
/// - [`ModelError::AnalyticHessianUnavailable`] for any other
///   parameterization.
/// - [`ModelError::ThetaLengthMismatch`] / [`ModelError::NonFiniteTheta`]
///   from [`ModelSpec::check_theta`].
pub fn neg_hessian(theta: ArrayView1<f64>, spec: &ModelSpec) -> ModelResult<Array2<f64>> {
    let parameterization = spec.parameterization();
    if !parameterization.has_analytic_hessian() {
        return Err(ModelError::AnalyticHessianUnavailable { tag: parameterization.tag() });
    }
    spec.check_theta(theta)?;

    let k = spec.n_rate();
    let dim = k + 1;
    let rho = theta[k];
    let c = rho_concentration(rho);
    let eta = spec.linear_predictor(theta);
    let counts = spec.counts();
    let totals = spec.group_totals();
    let design = spec.rate_design();

    let hess = sum_mat_over_groups(spec.n_groups(), dim, |g| {
        let rows = spec.group_rows(g);
        let p = softmax(eta.slice(s![rows.clone()]));
        let y = counts.slice(s![rows.clone()]);
        let x = design.slice(s![rows, ..]);

        let d: Array1<f64> =
            p.iter().zip(y.iter()).map(|(&pj, &yj)| digamma_rising(c * pj, yj)).collect();
        let t: Array1<f64> =
            p.iter().zip(y.iter()).map(|(&pj, &yj)| trigamma_rising(c * pj, yj)).collect();

        let x_bar = x.t().dot(&p);
        let xc = &x - &x_bar.view().insert_axis(Axis(0));

        // C = Σ_j p_j x̃_j x̃_jᵀ, and the weighted outer-product sum with w_j.
        let weighted_outer = |w: &Array1<f64>| -> Array2<f64> {
            let scaled = &xc * &w.view().insert_axis(Axis(1));
            xc.t().dot(&scaled)
        };
        let cov = weighted_outer(&p);
        let w_bb: Array1<f64> = (0..p.len())
            .map(|j| c * c * t[j] * p[j] * p[j] + c * d[j] * p[j])
            .collect();
        let h_bb = weighted_outer(&w_bb) - cov * (c * d.dot(&p));

        let w_br: Array1<f64> = (0..p.len()).map(|j| p[j] * (d[j] + c * p[j] * t[j])).collect();
        let h_br = xc.t().dot(&w_br) * (-1.0 / (rho * rho));

        let f1 = -digamma_rising(c, totals[g]) + p.dot(&d);
        let f2 = -trigamma_rising(c, totals[g]) + (&p * &p).dot(&t);
        let h_rr = f2 / rho.powi(4) + 2.0 * f1 / rho.powi(3);

        let mut h = Array2::<f64>::zeros((dim, dim));
        h.slice_mut(s![..k, ..k]).assign(&h_bb);
        h.slice_mut(s![..k, k]).assign(&h_br);
        h.slice_mut(s![k, ..k]).assign(&h_br);
        h[[k, k]] = h_rr;
        h
    });

    Ok(-hess)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{gradient::neg_gradient, parameterization::Parameterization};
    use approx::assert_relative_eq;
    use finitediff::FiniteDiff;
    use ndarray::array;

    fn rho_spec() -> ModelSpec {
        let counts = array![3.0, 0.0, 5.0, 2.0, 1.0, 1.0, 0.0, 4.0, 7.0, 2.0, 2.0, 0.0];
        let x = Array2::from_shape_fn((12, 2), |(r, k)| {
            if k == 0 { (0.37 * r as f64).sin() } else { ((r % 4) as f64) * 0.3 - 0.4 }
        });
        ModelSpec::from_design(Parameterization::RhoConst, 3, 4, counts, x, None).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // The analytic Hessian equals the finite-difference Jacobian of the
    // analytic gradient at interior points.
    //
    // Given
    // -----
    // - G = 3, J = 4, K = 2 rconst fixture.
    // - Two interior parameter vectors with ρ = 0.3 and ρ = 0.08.
    //
    // Expect
    // ------
    // - Entry-wise agreement within 1e-4 relative (1e-6 absolute).
    // - Symmetry up to rounding.
    fn analytic_hessian_matches_fd_of_gradient() {
        let spec = rho_spec();
        for theta in [array![0.4, -0.2, 0.3], array![-0.3, 0.6, 0.08]] {
            // Act
            let analytic = neg_hessian(theta.view(), &spec).expect("rconst hessian");
            let numeric =
                theta.central_hessian(&|t: &Array1<f64>| neg_gradient(t.view(), &spec));

            // Assert
            for ((i, j), &a) in analytic.indexed_iter() {
                assert_relative_eq!(a, numeric[[i, j]], max_relative = 1e-4, epsilon = 1e-6);
                assert_relative_eq!(a, analytic[[j, i]], max_relative = 1e-12, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn analytic_hessian_is_rejected_for_other_parameterizations() {
        let spec = ModelSpec::from_design(
            Parameterization::DeltaConst,
            1,
            2,
            array![1.0, 2.0],
            array![[0.0], [1.0]],
            None,
        )
        .unwrap();
        let err = neg_hessian(array![0.1, 0.2].view(), &spec).unwrap_err();
        assert_eq!(err, ModelError::AnalyticHessianUnavailable { tag: "dconst" });
    }
}
