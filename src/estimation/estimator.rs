//! Estimator — drive one maximum-likelihood fit of a network model.
//!
//! Purpose
//! -------
//! Run the optimizer on a [`ModelSpec`] from Poisson starting values, then
//! attach the curvature matrix used for standard errors, producing a
//! [`FitResult`].
//!
//! Key behaviors
//! -------------
//! - Starting values come from [`poisson_start`]; for `rconst` the `ρ` seed
//!   of [`FitOptions::rho_start`] is appended.
//! - The optimizer maximizes `ℓ` with the analytic score as gradient over
//!   the unconstrained space of [`UnconstrainedNetworkModel`] (`ρ` as
//!   `logit(ρ)`), so every method, line searches included, stays inside
//!   `ρ ∈ (0, 1)`. The estimate is mapped back before it is reported.
//!   Optimizer trouble is reported in `convergence`/`message`, never as an
//!   `Err`.
//! - Curvature is the finite-difference Jacobian of the analytic gradient
//!   of `−ℓ` at `θ̂`, in the natural space. For `rconst`, a curvature matrix
//!   that cannot be inverted is replaced by the analytic Hessian.
//!
//! Invariants & assumptions
//! ------------------------
//! - `FitResult::theta_hat` is always length `M` and finite.
//! - `FitResult::curvature` is `M × M`; it holds `NaN` when neither a
//!   numerical nor an analytic matrix could be computed.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the curvature fallback for `rconst` and the
//!   start-vector layout; end-to-end fits live in the integration tests.
use crate::{
    estimation::options::FitOptions,
    inference::{covariance::invert_curvature, report::InferenceReport},
    model::{
        dm_model::NetworkModel,
        likelihood::log_likelihood,
        parameterization::Parameterization,
        spec::ModelSpec,
        start::poisson_start,
        unconstrained::{UnconstrainedNetworkModel, to_natural, to_unconstrained},
    },
    optimization::{
        errors::OptResult,
        loglik_optimizer::{
            Convergence, Hessian, LogLikelihood, Theta, maximize, numerical_curvature,
        },
    },
};
use ndarray::{Array1, Array2};
use std::fmt;

/// Where the reported curvature matrix came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurvatureSource {
    /// Finite differences of the analytic gradient.
    Numerical,
    /// Analytic Hessian (`rconst` fallback).
    Analytic,
    /// Neither could be computed; the matrix is `NaN`.
    Unavailable,
}

impl fmt::Display for CurvatureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CurvatureSource::Numerical => "numerical",
            CurvatureSource::Analytic => "analytic",
            CurvatureSource::Unavailable => "unavailable",
        };
        f.write_str(label)
    }
}

/// Raw result of one fit.
///
/// - `theta_hat`: estimates in coefficient order (`ρ` last for `rconst`).
/// - `curvature`: `∇²(−ℓ)(θ̂)`, see [`CurvatureSource`].
/// - `neg_log_likelihood`: `−ℓ(θ̂)`.
/// - `start_log_likelihood`: `ℓ(θ₀)` at the starting values.
/// - `convergence`, `message`, `iterations`: optimizer diagnostics.
/// - `coef_names`: names matching `theta_hat`.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub parameterization: Parameterization,
    pub theta_hat: Array1<f64>,
    pub curvature: Array2<f64>,
    pub curvature_source: CurvatureSource,
    pub neg_log_likelihood: f64,
    pub start_log_likelihood: f64,
    pub convergence: Convergence,
    pub message: String,
    pub iterations: usize,
    pub coef_names: Vec<String>,
}

impl FitResult {
    /// Log-likelihood at the estimate.
    pub fn log_likelihood(&self) -> f64 {
        -self.neg_log_likelihood
    }

    /// Integer convergence code (0 success, 1 iteration limit, 2 failure).
    pub fn convergence_code(&self) -> i32 {
        self.convergence.code()
    }

    /// Standard errors, Wald statistics, and intervals for this fit.
    pub fn report(&self, confidence_z: f64) -> InferenceReport {
        InferenceReport::from_fit(self, confidence_z)
    }
}

/// Maximum-likelihood driver for [`NetworkModel`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Estimator {
    pub options: FitOptions,
}

impl Estimator {
    pub fn new(options: FitOptions) -> Self {
        Self { options }
    }

    /// Fit from Poisson starting values.
    ///
    /// # Errors
    /// - [`ModelError::StartFailed`](crate::model::errors::ModelError::StartFailed)
    ///   (as `OptError::Model`) when the starting fit fails.
    /// - Optimizer configuration errors (see [`maximize`]).
    pub fn fit(&self, spec: &ModelSpec) -> OptResult<FitResult> {
        let theta0 = self.start_values(spec)?;
        self.fit_from(spec, theta0)
    }

    /// Starting vector: Poisson coefficients, plus the `ρ` seed for `rconst`.
    ///
    /// # Errors
    /// As [`poisson_start`].
    pub fn start_values(&self, spec: &ModelSpec) -> OptResult<Theta> {
        let start = poisson_start(spec)?;
        if !start.aliased.is_empty() {
            log::debug!("aliased start columns set to zero: {:?}", start.aliased);
        }
        let mut theta0 = start.coefficients.to_vec();
        if spec.parameterization() == Parameterization::RhoConst {
            theta0.push(self.options.rho_start);
        }
        Ok(Array1::from(theta0))
    }

    /// Fit from an explicit starting vector.
    ///
    /// # Errors
    /// - `OptError::Model` when `theta0` has the wrong length, is
    ///   non-finite, or has `ρ ∉ (0, 1)`.
    /// - Optimizer configuration errors.
    pub fn fit_from(&self, spec: &ModelSpec, theta0: Theta) -> OptResult<FitResult> {
        let method = self.options.mle.method;
        spec.check_theta(theta0.view())?;
        let start_log_likelihood = log_likelihood(theta0.view(), spec);
        log::info!(
            "fitting {} (M = {}) with {method}; start loglik = {start_log_likelihood:.6}",
            spec.parameterization(),
            spec.n_params()
        );
        log::debug!("start vector: {theta0}");

        let u0 = to_unconstrained(&theta0, spec);
        let outcome = maximize(&UnconstrainedNetworkModel, u0, spec, &self.options.mle)?;
        if !outcome.convergence.is_success() {
            log::warn!("{method} did not converge: {}", outcome.message);
        }
        let theta_hat = to_natural(&outcome.theta_hat, spec);
        let (curvature, curvature_source) = self.curvature(spec, &theta_hat);
        log::debug!("curvature source: {curvature_source}");
        log::info!(
            "fit finished: loglik = {:.6}, convergence = {}",
            outcome.value,
            outcome.convergence
        );

        Ok(FitResult {
            parameterization: spec.parameterization(),
            neg_log_likelihood: -outcome.value,
            theta_hat,
            curvature,
            curvature_source,
            start_log_likelihood,
            convergence: outcome.convergence,
            message: outcome.message,
            iterations: outcome.iterations,
            coef_names: spec.coef_names().to_vec(),
        })
    }

    /// Report for a fit using this estimator's `confidence_z`.
    pub fn report(&self, fit: &FitResult) -> InferenceReport {
        fit.report(self.options.confidence_z)
    }

    fn curvature(&self, spec: &ModelSpec, theta_hat: &Theta) -> (Hessian, CurvatureSource) {
        let numerical = match numerical_curvature(&NetworkModel, theta_hat, spec) {
            Ok(h) => Some(h),
            Err(err) => {
                log::warn!("numerical curvature failed: {err}");
                None
            }
        };
        select_curvature(spec, theta_hat, numerical)
    }
}

// ---- Helper methods ----

/// Keep an invertible numerical curvature; for `rconst`, replace a singular
/// or missing one with the analytic Hessian when that is finite.
fn select_curvature(
    spec: &ModelSpec, theta_hat: &Theta, numerical: Option<Hessian>,
) -> (Hessian, CurvatureSource) {
    let m = theta_hat.len();
    let invertible = numerical.as_ref().is_some_and(|h| invert_curvature(h).is_ok());
    if !invertible && spec.parameterization() == Parameterization::RhoConst {
        log::warn!("numerical curvature is singular; using the analytic Hessian");
        match NetworkModel.hessian(theta_hat, spec).map(|h| -h) {
            Ok(h) if h.iter().all(|v| v.is_finite()) => return (h, CurvatureSource::Analytic),
            Ok(_) => log::warn!("analytic Hessian is not finite"),
            Err(err) => log::warn!("analytic Hessian failed: {err}"),
        }
    }
    match numerical {
        Some(h) => (h, CurvatureSource::Numerical),
        None => (Array2::from_elem((m, m), f64::NAN), CurvatureSource::Unavailable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::loglik_optimizer::{MLEOptions, OptimMethod};
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Layout of the starting vector per parameterization.
    // - Curvature source selection, including the `rconst` fallback.
    // -------------------------------------------------------------------------

    /// Three strongly heterogeneous groups: the `rconst` optimum is interior
    /// (ρ̂ ≈ 0.56).
    fn overdispersed(parameterization: Parameterization) -> ModelSpec {
        let counts = array![20.0, 0.0, 1.0, 0.0, 18.0, 2.0, 1.0, 1.0, 25.0];
        let x = Array2::from_shape_vec((9, 1), vec![0.3, -0.5, 0.8, 0.1, -0.2, 0.6, -0.9, 0.4, 0.0])
            .unwrap();
        ModelSpec::from_design(parameterization, 3, 3, counts, x, None).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // `rconst` starts get the ρ seed appended; `dconst` starts cover the
    // intercept-augmented design.
    fn start_values_follow_parameter_layout() {
        let estimator = Estimator::default();

        let theta0 = estimator.start_values(&overdispersed(Parameterization::RhoConst)).unwrap();
        assert_eq!(theta0.len(), 2);
        assert_eq!(theta0[1], 0.1);

        let theta0 = estimator.start_values(&overdispersed(Parameterization::DeltaConst)).unwrap();
        assert_eq!(theta0.len(), 2);
        assert!(theta0.iter().all(|v| v.is_finite()));
    }

    #[test]
    // Purpose
    // -------
    // A well-identified `rconst` fit converges to the same interior ρ with
    // and without gradients, and reports an invertible numerical curvature
    // matrix in the natural space.
    //
    // Given
    // -----
    // - The 3 × 3 overdispersed fixture, ρ seeded at 0.1.
    //
    // Expect
    // ------
    // - Nelder–Mead, BFGS, and L-BFGS all converge to β̂ ≈ 0.384, ρ̂ ≈ 0.560.
    fn rconst_fit_converges_for_derivative_free_and_gradient_methods() {
        let spec = overdispersed(Parameterization::RhoConst);
        for method in [OptimMethod::NelderMead, OptimMethod::Bfgs, OptimMethod::Lbfgs] {
            // Arrange
            let estimator = Estimator::new(FitOptions::with_mle(MLEOptions::with_method(method)));

            // Act
            let fit = estimator.fit(&spec).unwrap();

            // Assert
            assert!(fit.convergence.is_success(), "{method}: {}", fit.message);
            assert!((fit.theta_hat[0] - 0.384).abs() < 0.01, "{method}: {}", fit.theta_hat);
            assert!((fit.theta_hat[1] - 0.560).abs() < 0.01, "{method}: {}", fit.theta_hat);
            assert_eq!(fit.curvature.dim(), (2, 2));
            assert_eq!(fit.curvature_source, CurvatureSource::Numerical);
            assert!(invert_curvature(&fit.curvature).is_ok());
            assert!(fit.log_likelihood() > fit.start_log_likelihood);
            assert_eq!(fit.coef_names, vec!["x1".to_string(), "rho".to_string()]);
        }
    }

    #[test]
    // Purpose
    // -------
    // Conjugate gradient has no convergence test of its own, but its line
    // searches stay inside ρ ∈ (0, 1) and it improves on the start.
    fn rconst_conjugate_gradient_moves_off_the_start() {
        let spec = overdispersed(Parameterization::RhoConst);
        let mle = MLEOptions::with_method(OptimMethod::ConjugateGradient);

        let fit = Estimator::new(FitOptions::with_mle(mle)).fit(&spec).unwrap();

        assert!(fit.theta_hat[1] > 0.0 && fit.theta_hat[1] < 1.0);
        assert!(fit.log_likelihood() > fit.start_log_likelihood + 1.0, "{}", fit.message);
    }

    #[test]
    // Purpose
    // -------
    // A singular numerical curvature is replaced by the analytic Hessian for
    // `rconst` only; other parameterizations keep the numerical matrix.
    fn singular_curvature_falls_back_for_rconst_only() {
        let theta = array![0.4, 0.56];
        let singular = Some(Array2::zeros((2, 2)));

        let rho = overdispersed(Parameterization::RhoConst);
        let (h, source) = select_curvature(&rho, &theta, singular.clone());
        assert_eq!(source, CurvatureSource::Analytic);
        assert!(invert_curvature(&h).is_ok());

        let dconst = overdispersed(Parameterization::DeltaConst);
        let (h, source) = select_curvature(&dconst, &theta, singular);
        assert_eq!(source, CurvatureSource::Numerical);
        assert_eq!(h, Array2::<f64>::zeros((2, 2)));

        let (h, source) = select_curvature(&dconst, &theta, None);
        assert_eq!(source, CurvatureSource::Unavailable);
        assert!(h.iter().all(|v| v.is_nan()));
    }
}
