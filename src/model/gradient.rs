//! gradient — analytic score of the network models.
//!
//! Returns `∇(−ℓ)(θ)` in the coefficient order of [`ModelSpec`], built as a
//! group-parallel sum of per-group terms that mirror
//! [`likelihood`](crate::model::likelihood) variant by variant:
//!
//! - `gcl`: `W_gᵀ (Y_g − n_g p_g)` (softmax-Jacobian pattern).
//! - `dconst` / `dfunc`: `W_gᵀ s_g` with
//!   `s_gj = e_gj [ψ(α_g) − ψ(α_g+n_g) + ψ(e_gj+Y_gj) − ψ(e_gj)]`. The
//!   dispersion coefficients are ordinary columns of `W = [X | 1 | Z]`, so
//!   the same expression covers both variants.
//! - `rconst`: with `a = c·p`, `D_j = ψ(a_j+Y_j) − ψ(a_j)` and
//!   `r_j = c·D_j·p_j`, the `β`-block is `X_gᵀ (r − p Σ_j r_j)`; the `ρ`
//!   entry is `−ρ⁻² [ψ(c) − ψ(c+n_g) + Σ_j p_j D_j]`.
//!
//! Non-finite entries are returned as computed; the optimizer adapter
//! rejects them.
use crate::{
    model::{groups::sum_vec_over_groups, parameterization::Parameterization, spec::ModelSpec},
    optimization::numerical_stability::{digamma_rising, rho_concentration, softmax},
};
use ndarray::{Array1, ArrayView1, s};

/// Gradient of the negative log-likelihood.
pub fn neg_gradient(theta: ArrayView1<f64>, spec: &ModelSpec) -> Array1<f64> {
    -score(theta, spec)
}

/// Gradient of the log-likelihood `∇ℓ(θ)`.
pub fn score(theta: ArrayView1<f64>, spec: &ModelSpec) -> Array1<f64> {
    let eta = spec.linear_predictor(theta);
    let counts = spec.counts();
    let totals = spec.group_totals();
    let design = spec.linear_design();
    let n_linear = design.ncols();

    match spec.parameterization() {
        Parameterization::Gcl => sum_vec_over_groups(spec.n_groups(), n_linear, |g| {
            let rows = spec.group_rows(g);
            let p_g = softmax(eta.slice(s![rows.clone()]));
            let resid = &counts.slice(s![rows.clone()]) - &(p_g * totals[g]);
            design.slice(s![rows, ..]).t().dot(&resid)
        }),
        Parameterization::DeltaConst | Parameterization::DeltaFunc => {
            sum_vec_over_groups(spec.n_groups(), n_linear, |g| {
                let rows = spec.group_rows(g);
                let e_g = eta.slice(s![rows.clone()]).mapv(f64::exp);
                let group_term = -digamma_rising(e_g.sum(), totals[g]);
                let y_g = counts.slice(s![rows.clone()]);
                let weights: Array1<f64> = e_g
                    .iter()
                    .zip(y_g.iter())
                    .map(|(&e, &y)| e * (group_term + digamma_rising(e, y)))
                    .collect();
                design.slice(s![rows, ..]).t().dot(&weights)
            })
        }
        Parameterization::RhoConst => {
            let rho = theta[theta.len() - 1];
            let c = rho_concentration(rho);
            sum_vec_over_groups(spec.n_groups(), n_linear + 1, |g| {
                let rows = spec.group_rows(g);
                let p_g = softmax(eta.slice(s![rows.clone()]));
                let y_g = counts.slice(s![rows.clone()]);
                let d: Array1<f64> =
                    p_g.iter().zip(y_g.iter()).map(|(&p, &y)| digamma_rising(c * p, y)).collect();
                let r = &d * &p_g * c;
                let u = &r - &(&p_g * r.sum());

                let mut out = Array1::<f64>::zeros(n_linear + 1);
                out.slice_mut(s![..n_linear]).assign(&design.slice(s![rows, ..]).t().dot(&u));
                let f_prime = -digamma_rising(c, totals[g]) + p_g.dot(&d);
                out[n_linear] = -f_prime / (rho * rho);
                out
            })
        }
    }
}
