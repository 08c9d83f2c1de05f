//! Adapter that exposes a `LogLikelihood` as an `argmin` problem.
//!
//! We convert a *maximization* of `ℓ(θ)` into a *minimization* of
//! `c(θ) = −ℓ(θ)`. Analytic gradients are negated accordingly; without one we
//! finite-difference the **cost** closure, so no sign flip is needed there.
//!
//! Beyond the sign convention the adapter
//! - maps a non-finite `ℓ(θ)` to `c(θ) = +∞`, so infeasible points steer the
//!   solver away instead of aborting the run,
//! - records the lowest finite cost it has evaluated in a borrowed
//!   [`BestPoint`], which survives a solver error, and
//! - optionally provides Gaussian proposals for simulated annealing.
use std::{cell::RefCell, sync::Mutex};

use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        finite_diff::run_fd_diff,
        traits::{AnnealOptions, LogLikelihood},
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::{
    core::{CostFunction, Error, Gradient},
    solver::simulatedannealing::Anneal,
};
use finitediff::FiniteDiff;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;

/// Lowest finite cost seen during a run, with its parameter vector.
#[derive(Debug, Default)]
pub struct BestPoint {
    inner: Mutex<Option<(Theta, Cost)>>,
}

impl BestPoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `(theta, cost)` if it improves on the current best.
    pub fn record(&self, theta: &Theta, cost: Cost) {
        if !cost.is_finite() {
            return;
        }
        if let Ok(mut slot) = self.inner.lock() {
            let improves = slot.as_ref().map_or(true, |(_, best)| cost < *best);
            if improves {
                *slot = Some((theta.clone(), cost));
            }
        }
    }

    /// Move the best point out, leaving the tracker empty.
    pub fn take(&self) -> Option<(Theta, Cost)> {
        self.inner.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Gaussian random-walk proposal for simulated annealing.
#[derive(Debug)]
struct GaussianProposal {
    rng: Mutex<StdRng>,
    step: f64,
    initial_temp: f64,
}

/// Bridges a `LogLikelihood` to `argmin`'s `CostFunction`, `Gradient`, and
/// `Anneal` traits.
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
    best: &'a BestPoint,
    proposal: Option<GaussianProposal>,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    /// Construct a new adapter over a model, its data, and a best-point
    /// tracker owned by the caller.
    pub fn new(f: &'a F, data: &'a F::Data, best: &'a BestPoint) -> Self {
        Self { f, data, best, proposal: None }
    }

    /// Enable annealing proposals with the given settings.
    pub fn with_annealing(mut self, anneal: &AnnealOptions) -> Self {
        self.proposal = Some(GaussianProposal {
            rng: Mutex::new(StdRng::seed_from_u64(anneal.seed)),
            step: anneal.step,
            initial_temp: anneal.initial_temp,
        });
        self
    }
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate `c(θ) = −ℓ(θ)`, or `+∞` when `ℓ(θ)` is not finite.
    ///
    /// # Errors
    /// Propagates any `OptError` from the model's `value`.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let ll = self.f.value(theta, self.data)?;
        let cost = if ll.is_finite() { -ll } else { f64::INFINITY };
        self.best.record(theta, cost);
        Ok(cost)
    }
}

impl<'a, F: LogLikelihood> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate the gradient of the cost at `θ`.
    ///
    /// - With an analytic gradient: validate it and return `−∇ℓ(θ)`.
    /// - Otherwise: central differences of the cost, retried with forward
    ///   differences if an evaluation failed or the result is not finite.
    ///
    /// # Errors
    /// - Model errors from `grad` (other than `GradientNotImplemented`).
    /// - [`OptError::InvalidGradient`] / [`OptError::GradientDimMismatch`].
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_func);
                if closure_err.borrow().is_none() && validate_grad(&fd_grad, dim).is_ok() {
                    return Ok(fd_grad);
                }
                Ok(run_fd_diff(theta, &cost_func, &closure_err)?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<'a, F: LogLikelihood> Anneal for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Theta;
    type Float = f64;

    /// Propose `θ + ε`, `ε_i ~ N(0, (step · T / T₀)²)` at temperature `T`.
    ///
    /// # Errors
    /// [`OptError::AnnealNotConfigured`] unless built with
    /// [`ArgMinAdapter::with_annealing`].
    fn anneal(&self, param: &Theta, extent: f64) -> Result<Theta, Error> {
        let proposal = self.proposal.as_ref().ok_or(OptError::AnnealNotConfigured)?;
        let scale = proposal.step * extent / proposal.initial_temp;
        let mut rng = proposal
            .rng
            .lock()
            .map_err(|e| OptError::BackendError { text: e.to_string() })?;
        Ok(param.mapv(|v| {
            let z: f64 = rng.sample(StandardNormal);
            v + scale * z
        }))
    }
}
