//! Numerically stable transforms shared by the network likelihoods.
//!
//! - [`log_sum_exp`] / [`softmax`]: max-shifted evaluation of `ln Σ exp(η)`
//!   and `exp(η) / Σ exp(η)`, so that extreme linear predictors neither
//!   overflow nor lose the composition.
//! - [`logit`] / [`logistic`]: the map between `ρ ∈ (0, 1)` and the real
//!   line used to optimize `ρ` without bounds.
//! - [`rho_concentration`]: maps an intra-group correlation `ρ` to the
//!   Dirichlet concentration `1/e^θ` with `θ = ln(ρ / (1 − ρ))`. Values of
//!   `ρ` outside the open unit interval yield a non-finite concentration,
//!   which the likelihood turns into `+∞`.
use ndarray::{Array1, ArrayView1};

/// Stable `ln Σ_j exp(η_j)`.
///
/// Returns `−∞` for an empty slice and propagates `NaN`.
pub fn log_sum_exp(eta: ArrayView1<f64>) -> f64 {
    let max = eta.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + eta.iter().map(|&v| (v - max).exp()).sum::<f64>().ln()
}

/// Stable softmax `p_j = exp(η_j) / Σ exp(η)`.
pub fn softmax(eta: ArrayView1<f64>) -> Array1<f64> {
    let lse = log_sum_exp(eta);
    eta.mapv(|v| (v - lse).exp())
}

/// Logit link `θ = ln(ρ / (1 − ρ))`.
pub fn logit(rho: f64) -> f64 {
    (rho / (1.0 - rho)).ln()
}

/// Inverse of [`logit`], `ρ = 1 / (1 + e^{−θ})`, evaluated without overflow
/// for large `|θ|`.
pub fn logistic(theta: f64) -> f64 {
    if theta >= 0.0 {
        1.0 / (1.0 + (-theta).exp())
    } else {
        let e = theta.exp();
        e / (1.0 + e)
    }
}

/// Dirichlet concentration `1/e^θ = (1 − ρ)/ρ` for intra-group correlation `ρ`.
///
/// Non-finite (or negative, turned into `NaN`) outside `ρ ∈ (0, 1)`.
pub fn rho_concentration(rho: f64) -> f64 {
    (-logit(rho)).exp()
}
