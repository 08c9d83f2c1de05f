//! likelihood — negative log-likelihood of the network models.
//!
//! Purpose
//! -------
//! Evaluate `−ℓ(θ)` for each [`Parameterization`] as a sum of independent
//! per-group terms. This is the objective the estimator minimizes.
//!
//! Key behaviors
//! -------------
//! With `η = W·θ_linear` restricted to the rows of group `g`:
//!
//! - `gcl`: `ℓ_g = Σ_j Y_gj · ln p_gj`, `p = softmax(η)`.
//! - `dconst` / `dfunc`: `e = exp(η)`, `α_g = Σ_j e_gj`,
//!   `ℓ_g = lnΓ(n_g+1) + lnΓ(α_g) − lnΓ(α_g+n_g)
//!          + Σ_j [lnΓ(e_gj+Y_gj) − lnΓ(e_gj) − lnΓ(Y_gj+1)]`.
//! - `rconst`: `c = (1−ρ)/ρ`, `p = softmax(X·β)`,
//!   `ℓ_g = lnΓ(n_g+1) + lnΓ(c) − lnΓ(c+n_g)
//!          + Σ_j [lnΓ(c·p_gj+Y_gj) − lnΓ(c·p_gj) − lnΓ(Y_gj+1)]`.
//!
//! Gamma-function differences are evaluated as rising differences, so zero
//! counts contribute exactly zero and large concentrations do not cancel.
//!
//! Invariants & assumptions
//! ------------------------
//! - `theta` has length `spec.n_params()`; callers validate it with
//!   [`ModelSpec::check_theta`] before entering the optimizer.
//! - The result is never `NaN`: any non-finite total (e.g. `ρ ∉ (0, 1)`,
//!   overflowing rates) is reported as `+∞` so that a minimizer treats the
//!   point as infeasible.
//!
//! Testing notes
//! -------------
//! - Closed-form checks against a single-group multinomial and against a
//!   direct `statrs` evaluation of the DM density.
//! - Boundary behavior of `ρ` at 0 and 1.
use crate::{
    model::{groups::sum_over_groups, parameterization::Parameterization, spec::ModelSpec},
    optimization::numerical_stability::{ln_gamma_rising, log_sum_exp, rho_concentration, softmax},
};
use ndarray::{ArrayView1, s};

/// Negative log-likelihood `−ℓ(θ)`; `+∞` when the value is not finite.
pub fn neg_log_likelihood(theta: ArrayView1<f64>, spec: &ModelSpec) -> f64 {
    let ll = log_likelihood(theta, spec);
    if ll.is_finite() { -ll } else { f64::INFINITY }
}

/// Raw log-likelihood `ℓ(θ)`, possibly non-finite.
pub fn log_likelihood(theta: ArrayView1<f64>, spec: &ModelSpec) -> f64 {
    let eta = spec.linear_predictor(theta);
    let counts = spec.counts();
    let totals = spec.group_totals();
    let log_mult = spec.log_multinomial();

    match spec.parameterization() {
        Parameterization::Gcl => sum_over_groups(spec.n_groups(), |g| {
            let rows = spec.group_rows(g);
            let eta_g = eta.slice(s![rows.clone()]);
            let lse = log_sum_exp(eta_g);
            eta_g
                .iter()
                .zip(counts.slice(s![rows]).iter())
                .filter(|&(_, &y)| y > 0.0)
                .map(|(&v, &y)| y * (v - lse))
                .sum()
        }),
        Parameterization::DeltaConst | Parameterization::DeltaFunc => {
            sum_over_groups(spec.n_groups(), |g| {
                let rows = spec.group_rows(g);
                let e_g = eta.slice(s![rows.clone()]).mapv(f64::exp);
                let alpha = e_g.sum();
                let within: f64 = e_g
                    .iter()
                    .zip(counts.slice(s![rows]).iter())
                    .map(|(&e, &y)| ln_gamma_rising(e, y))
                    .sum();
                log_mult[g] - ln_gamma_rising(alpha, totals[g]) + within
            })
        }
        Parameterization::RhoConst => {
            let c = rho_concentration(theta[theta.len() - 1]);
            sum_over_groups(spec.n_groups(), |g| {
                let rows = spec.group_rows(g);
                let p_g = softmax(eta.slice(s![rows.clone()]));
                let within: f64 = p_g
                    .iter()
                    .zip(counts.slice(s![rows]).iter())
                    .map(|(&p, &y)| ln_gamma_rising(c * p, y))
                    .sum();
                log_mult[g] - ln_gamma_rising(c, totals[g]) + within
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array2, array};
    use statrs::function::gamma::ln_gamma;

    fn rho_fixture() -> ModelSpec {
        // G = 3, J = 4, one covariate.
        let counts = array![3.0, 0.0, 5.0, 2.0, 1.0, 1.0, 0.0, 4.0, 7.0, 2.0, 2.0, 0.0];
        let x = Array2::from_shape_fn((12, 1), |(r, _)| (r % 4) as f64 * 0.5 - 0.7);
        ModelSpec::from_design(Parameterization::RhoConst, 3, 4, counts, x, None).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // gcl reduces to the multinomial kernel Σ Y ln p for a single group.
    //
    // Given
    // -----
    // - G = 1, J = 2, Y = [3, 7], dummy covariate [0, 1], β = ln(7/3).
    //
    // Expect
    // ------
    // - ℓ = 3 ln 0.3 + 7 ln 0.7.
    fn gcl_matches_multinomial_kernel() {
        // Arrange
        let spec = ModelSpec::from_design(
            Parameterization::Gcl,
            1,
            2,
            array![3.0, 7.0],
            array![[0.0], [1.0]],
            None,
        )
        .unwrap();
        let theta = array![(7.0_f64 / 3.0).ln()];

        // Act
        let nll = neg_log_likelihood(theta.view(), &spec);

        // Assert
        let expected = -(3.0 * 0.3_f64.ln() + 7.0 * 0.7_f64.ln());
        assert_relative_eq!(nll, expected, max_relative = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // The dconst objective equals a direct evaluation of the DM density
    // with full log-gamma calls.
    fn delta_const_matches_direct_dm_density() {
        let counts = array![2.0, 4.0, 6.0, 1.0, 3.0, 5.0];
        let x = array![[0.2], [0.0], [-0.4], [1.0], [0.5], [0.3]];
        let spec =
            ModelSpec::from_design(Parameterization::DeltaConst, 2, 3, counts.clone(), x.clone(), None)
                .unwrap();
        let theta = array![0.7, 0.4];

        let mut direct = 0.0;
        for g in 0..2 {
            let e: Array1<f64> = (0..3).map(|j| (0.7 * x[[3 * g + j, 0]] + 0.4_f64).exp()).collect();
            let y = counts.slice(s![3 * g..3 * g + 3]);
            let n = y.sum();
            let alpha = e.sum();
            direct += ln_gamma(n + 1.0) + ln_gamma(alpha) - ln_gamma(alpha + n);
            for j in 0..3 {
                direct += ln_gamma(e[j] + y[j]) - ln_gamma(e[j]) - ln_gamma(y[j] + 1.0);
            }
        }

        assert_relative_eq!(log_likelihood(theta.view(), &spec), direct, max_relative = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // ρ = 0 and ρ = 1 are infeasible (+∞ objective) while an interior ρ gives
    // a finite value.
    //
    // Given
    // -----
    // - The G = 3, J = 4 rconst fixture and β = 0.2.
    //
    // Expect
    // ------
    // - Objective is +∞ at ρ ∈ {0, 1, -0.1} and finite at ρ = 0.3.
    fn rho_boundaries_are_infeasible() {
        let spec = rho_fixture();
        for rho in [0.0, 1.0, -0.1] {
            assert_eq!(neg_log_likelihood(array![0.2, rho].view(), &spec), f64::INFINITY);
        }
        assert!(neg_log_likelihood(array![0.2, 0.3].view(), &spec).is_finite());
    }

    #[test]
    // Purpose
    // -------
    // As ρ → 0⁺ the rconst likelihood approaches the multinomial (gcl) one.
    fn rho_const_tends_to_multinomial_as_rho_vanishes() {
        let spec = rho_fixture();
        let gcl = ModelSpec::from_design(
            Parameterization::Gcl,
            3,
            4,
            spec.counts().to_owned(),
            spec.rate_design().clone(),
            None,
        )
        .unwrap();
        let multinomial = log_likelihood(array![0.2].view(), &gcl)
            + spec.log_multinomial().sum();
        let near = log_likelihood(array![0.2, 1e-9].view(), &spec);
        assert_relative_eq!(near, multinomial, max_relative = 1e-6);
    }
}
