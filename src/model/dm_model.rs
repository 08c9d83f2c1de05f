//! NetworkModel — the network likelihood as an optimizer objective.
//!
//! Purpose
//! -------
//! Connect the per-variant kernels in [`likelihood`](crate::model::likelihood),
//! [`gradient`](crate::model::gradient), and [`hessian`](crate::model::hessian)
//! to the optimizer's [`LogLikelihood`] contract, with a [`ModelSpec`] as
//! the model data.
//!
//! Key behaviors
//! -------------
//! - `value` returns `ℓ(θ)`; infeasible points (e.g. `ρ ∉ (0, 1)`) give
//!   `−∞`, which the optimizer adapter turns into a `+∞` cost.
//! - `grad` returns the analytic score `∇ℓ(θ)` for every parameterization.
//! - `hessian` returns `∇²ℓ(θ)` for `rconst` and
//!   [`OptError::HessianNotImplemented`] otherwise.
//! - `check` validates the parameter length and finiteness.
//!
//! Conventions
//! -----------
//! - The kernels return derivatives of the *negative* log-likelihood; the
//!   sign is flipped here once.
use crate::{
    model::{
        gradient::score, hessian::neg_hessian, likelihood::log_likelihood, spec::ModelSpec,
    },
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{
            traits::LogLikelihood,
            types::{Grad, Hessian, Theta},
        },
    },
};

/// Grouped conditional logit / Dirichlet-multinomial network model.
///
/// Stateless: everything that varies between fits lives in the
/// [`ModelSpec`] passed as data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkModel;

impl NetworkModel {
    pub fn new() -> Self {
        NetworkModel
    }
}

impl LogLikelihood for NetworkModel {
    type Data = ModelSpec;

    fn value(&self, theta: &Theta, spec: &ModelSpec) -> OptResult<f64> {
        Ok(log_likelihood(theta.view(), spec))
    }

    fn check(&self, theta: &Theta, spec: &ModelSpec) -> OptResult<()> {
        spec.check_theta(theta.view())?;
        Ok(())
    }

    fn grad(&self, theta: &Theta, spec: &ModelSpec) -> OptResult<Grad> {
        Ok(score(theta.view(), spec))
    }

    fn hessian(&self, theta: &Theta, spec: &ModelSpec) -> OptResult<Hessian> {
        if !spec.parameterization().has_analytic_hessian() {
            return Err(OptError::HessianNotImplemented);
        }
        Ok(-neg_hessian(theta.view(), spec)?)
    }
}
