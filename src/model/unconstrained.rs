//! unconstrained — the optimizer's parameter space for the network models.
//!
//! Purpose
//! -------
//! Let every optimizer (including line-search methods) move freely over
//! `ℝ^M`. For `rconst` the last slot is optimized as `u = logit(ρ)`, so a
//! trial step can never leave `ρ ∈ (0, 1)`. All other coefficients, and all
//! coefficients of the other parameterizations, are used unchanged.
//!
//! Key behaviors
//! -------------
//! - [`to_unconstrained`] / [`to_natural`] convert a parameter vector between
//!   the natural space reported to callers and the optimizer space.
//! - [`UnconstrainedNetworkModel`] evaluates the likelihood in `u` and
//!   applies the chain rule to the analytic score and Hessian, with
//!   `s = dρ/du = ρ(1 − ρ)`:
//!   - `∂ℓ/∂u = s · ∂ℓ/∂ρ`,
//!   - `∂²ℓ/∂u² = s² · ∂²ℓ/∂ρ² + s(1 − 2ρ) · ∂ℓ/∂ρ`,
//!   - `∂²ℓ/∂β_k∂u = s · ∂²ℓ/∂β_k∂ρ`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Mapping back clamps `ρ` to `[RHO_EPS, 1 − RHO_EPS]`, so every finite
//!   `u` gives a finite concentration and a finite score.
//! - Reported estimates and curvature matrices are always in the natural
//!   space; the optimizer space never leaves the estimator.
//!
//! Testing notes
//! -------------
//! - Round trips of the maps, finite-difference checks of the transformed
//!   score and Hessian, and finiteness far out on the logit scale.
use crate::{
    model::{dm_model::NetworkModel, parameterization::Parameterization, spec::ModelSpec},
    optimization::{
        errors::OptResult,
        loglik_optimizer::{
            traits::LogLikelihood,
            types::{Grad, Hessian, Theta},
        },
        numerical_stability::{logistic, logit},
    },
};

/// Distance from the boundary at which `ρ` is clamped when leaving the
/// optimizer space.
pub const RHO_EPS: f64 = 1e-15;

/// Map natural parameters to the optimizer space.
///
/// A `ρ` outside `(0, 1)` maps to a non-finite entry, which
/// [`ModelSpec::check_theta`] rejects.
pub fn to_unconstrained(theta: &Theta, spec: &ModelSpec) -> Theta {
    let mut u = theta.clone();
    if let Some(m) = rho_slot(spec, u.len()) {
        u[m] = logit(theta[m]);
    }
    u
}

/// Map optimizer-space parameters back to the natural space.
pub fn to_natural(u: &Theta, spec: &ModelSpec) -> Theta {
    let mut theta = u.clone();
    if let Some(m) = rho_slot(spec, theta.len()) {
        theta[m] = logistic(u[m]).clamp(RHO_EPS, 1.0 - RHO_EPS);
    }
    theta
}

/// [`NetworkModel`] evaluated in the optimizer space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnconstrainedNetworkModel;

impl LogLikelihood for UnconstrainedNetworkModel {
    type Data = ModelSpec;

    fn value(&self, u: &Theta, spec: &ModelSpec) -> OptResult<f64> {
        NetworkModel.value(&to_natural(u, spec), spec)
    }

    fn check(&self, u: &Theta, spec: &ModelSpec) -> OptResult<()> {
        spec.check_theta(u.view())?;
        Ok(())
    }

    fn grad(&self, u: &Theta, spec: &ModelSpec) -> OptResult<Grad> {
        let theta = to_natural(u, spec);
        let mut grad = NetworkModel.grad(&theta, spec)?;
        if let Some(m) = rho_slot(spec, grad.len()) {
            grad[m] *= rho_jacobian(theta[m]);
        }
        Ok(grad)
    }

    fn hessian(&self, u: &Theta, spec: &ModelSpec) -> OptResult<Hessian> {
        let theta = to_natural(u, spec);
        let mut hess = NetworkModel.hessian(&theta, spec)?;
        if let Some(m) = rho_slot(spec, theta.len()) {
            let rho = theta[m];
            let s = rho_jacobian(rho);
            let score_rho = NetworkModel.grad(&theta, spec)?[m];
            for k in 0..m {
                hess[[k, m]] *= s;
                hess[[m, k]] *= s;
            }
            hess[[m, m]] = s * s * hess[[m, m]] + s * (1.0 - 2.0 * rho) * score_rho;
        }
        Ok(hess)
    }
}

// ---- Helper methods ----

fn rho_slot(spec: &ModelSpec, len: usize) -> Option<usize> {
    (spec.parameterization() == Parameterization::RhoConst && len > 0).then(|| len - 1)
}

fn rho_jacobian(rho: f64) -> f64 {
    rho * (1.0 - rho)
}
