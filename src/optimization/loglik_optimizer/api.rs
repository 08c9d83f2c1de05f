//! loglik_optimizer::api — the `maximize` entry point.
//!
//! Purpose
//! -------
//! Maximize a [`LogLikelihood`] from a starting point with the method named
//! in [`MLEOptions`], returning a normalized [`OptimOutcome`].
//!
//! Key behaviors
//! -------------
//! - Validates `(θ₀, data)` through [`LogLikelihood::check`] before any
//!   solver is built.
//! - Dispatches on `(method, line_searcher)` to the builders and the shared
//!   runner.
//! - A solver that errors mid-run does not abort the call: the best point
//!   evaluated so far (or `θ₀`) is returned with
//!   [`Convergence::Failure`](crate::optimization::loglik_optimizer::traits::Convergence::Failure)
//!   and the error text as the message.
//!
//! Invariants & assumptions
//! ------------------------
//! - `OptimOutcome::value` is always the log-likelihood, never the cost.
//! - `grad_norm` is populated when the model provides an analytic gradient.
//!
//! Testing notes
//! -------------
//! - Unit tests drive every method on a smooth concave problem and check
//!   the solver-error fallback.
use argmin::solver::simulatedannealing::{SATempFunc, SimulatedAnnealing};
use ndarray::Array2;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        adapter::{ArgMinAdapter, BestPoint},
        builders::{
            build_bfgs_hager_zhang, build_bfgs_more_thuente, build_cg_hager_zhang,
            build_cg_more_thuente, build_lbfgs_hager_zhang, build_lbfgs_more_thuente,
            build_nelder_mead,
        },
        run::run_solver,
        traits::{LineSearcher, LogLikelihood, MLEOptions, OptimMethod, OptimOutcome},
        types::Theta,
    },
};

/// Maximize `ℓ(θ)` starting from `theta0`.
///
/// # Parameters
/// - `f`: the model.
/// - `theta0`: starting point in the optimizer's parameter space.
/// - `data`: model data passed to every evaluation.
/// - `opts`: method, line search, tolerances, and annealing settings.
///
/// # Returns
/// The [`OptimOutcome`] of the run. Solver errors become a failure outcome
/// rather than an `Err`.
///
/// # Errors
/// - Errors from `f.check(theta0, data)`.
/// - Solver construction errors (invalid tolerances, annealing settings,
///   or starting simplex).
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let method = opts.method;
    let n = theta0.len();
    let best = BestPoint::new();
    let problem = ArgMinAdapter::new(f, data, &best);

    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        crate::optimization::loglik_optimizer::run::log_initial_state(&theta0, &problem)?;
    }

    let start = theta0.clone();
    let run = match (method, opts.line_searcher) {
        (OptimMethod::NelderMead, _) => {
            let solver = build_nelder_mead(&theta0, opts)?;
            run_solver(problem, solver, opts, method, |state| state)
        }
        (OptimMethod::Bfgs, LineSearcher::MoreThuente) => {
            let solver = build_bfgs_more_thuente(opts)?;
            run_solver(problem, solver, opts, method, |state| {
                state.param(start).inv_hessian(Array2::eye(n))
            })
        }
        (OptimMethod::Bfgs, LineSearcher::HagerZhang) => {
            let solver = build_bfgs_hager_zhang(opts)?;
            run_solver(problem, solver, opts, method, |state| {
                state.param(start).inv_hessian(Array2::eye(n))
            })
        }
        (OptimMethod::Lbfgs, LineSearcher::MoreThuente) => {
            let solver = build_lbfgs_more_thuente(opts)?;
            run_solver(problem, solver, opts, method, |state| state.param(start))
        }
        (OptimMethod::Lbfgs, LineSearcher::HagerZhang) => {
            let solver = build_lbfgs_hager_zhang(opts)?;
            run_solver(problem, solver, opts, method, |state| state.param(start))
        }
        (OptimMethod::ConjugateGradient, LineSearcher::MoreThuente) => {
            let solver = build_cg_more_thuente();
            run_solver(problem, solver, opts, method, |state| state.param(start))
        }
        (OptimMethod::ConjugateGradient, LineSearcher::HagerZhang) => {
            let solver = build_cg_hager_zhang();
            run_solver(problem, solver, opts, method, |state| state.param(start))
        }
        (OptimMethod::SimulatedAnnealing, _) => {
            let solver = SimulatedAnnealing::new(opts.anneal.initial_temp)?
                .with_temp_func(SATempFunc::Boltzmann);
            let problem = problem.with_annealing(&opts.anneal);
            run_solver(problem, solver, opts, method, |state| state.param(start))
        }
    };

    let mut outcome = match run {
        Ok(outcome) => outcome,
        Err(err) => {
            log::warn!("{method} stopped with an error: {err}");
            let (theta, value) = match best.take() {
                Some((theta, cost)) => (theta, -cost),
                None => {
                    let value = f.value(&theta0, data).unwrap_or(f64::NEG_INFINITY);
                    (theta0, value)
                }
            };
            OptimOutcome::failure(theta, value, err.to_string())
        }
    };
    outcome.grad_norm = f.grad(&outcome.theta_hat, data).ok().map(|g| g.dot(&g).sqrt());
    log::debug!(
        "{method}: loglik = {:.6}, convergence = {}, iterations = {}",
        outcome.value,
        outcome.convergence,
        outcome.iterations
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{
            traits::{Convergence, Tolerances},
            types::Grad,
        },
    };
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Recovery of a known maximizer by every supported method.
    // - Validation before solving and the solver-error fallback.
    // -------------------------------------------------------------------------

    /// ℓ(θ) = −(θ₀ − 1)² − 2(θ₁ + 0.5)², maximized at (1, −0.5) with ℓ = 0.
    struct Concave;

    impl LogLikelihood for Concave {
        type Data = ();

        fn value(&self, t: &Theta, _: &()) -> OptResult<f64> {
            Ok(-(t[0] - 1.0).powi(2) - 2.0 * (t[1] + 0.5).powi(2))
        }

        fn check(&self, t: &Theta, _: &()) -> OptResult<()> {
            if t.len() != 2 {
                return Err(OptError::GradientDimMismatch { expected: 2, found: t.len() });
            }
            Ok(())
        }

        fn grad(&self, t: &Theta, _: &()) -> OptResult<Grad> {
            Ok(array![-2.0 * (t[0] - 1.0), -4.0 * (t[1] + 0.5)])
        }
    }

    /// A model whose gradient always errors, so gradient solvers fail.
    struct BrokenGradient;

    impl LogLikelihood for BrokenGradient {
        type Data = ();

        fn value(&self, t: &Theta, _: &()) -> OptResult<f64> {
            Ok(-t.dot(t))
        }

        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }

        fn grad(&self, _: &Theta, _: &()) -> OptResult<Grad> {
            Err(OptError::BackendError { text: "gradient unavailable".to_string() })
        }
    }

    #[test]
    // Purpose
    // -------
    // The deterministic methods recover the maximizer of a concave quadratic.
    //
    // Expect
    // ------
    // - BFGS, L-BFGS (both line searches) and Nelder–Mead report success.
    // - θ̂ is within 1e-3 of (1, −0.5) and ℓ(θ̂) ≈ 0.
    fn deterministic_methods_recover_maximizer() {
        let cases = [
            (OptimMethod::Bfgs, LineSearcher::MoreThuente),
            (OptimMethod::Bfgs, LineSearcher::HagerZhang),
            (OptimMethod::Lbfgs, LineSearcher::MoreThuente),
            (OptimMethod::Lbfgs, LineSearcher::HagerZhang),
            (OptimMethod::NelderMead, LineSearcher::MoreThuente),
        ];
        for (method, line_searcher) in cases {
            let mut opts = MLEOptions::with_method(method);
            opts.line_searcher = line_searcher;

            let out = maximize(&Concave, array![3.0, 2.0], &(), &opts).unwrap();

            assert_eq!(out.convergence, Convergence::Success, "{method}: {}", out.message);
            assert_abs_diff_eq!(out.theta_hat[0], 1.0, epsilon = 1e-3);
            assert_abs_diff_eq!(out.theta_hat[1], -0.5, epsilon = 1e-3);
            assert_abs_diff_eq!(out.value, 0.0, epsilon = 1e-5);
            assert!(out.grad_norm.is_some());
        }
    }

    #[test]
    // Purpose
    // -------
    // CG and simulated annealing run to completion and improve on θ₀.
    fn cg_and_annealing_improve_on_start() {
        let theta0 = array![3.0, 2.0];
        let ll0 = Concave.value(&theta0, &()).unwrap();

        let mut opts = MLEOptions::with_method(OptimMethod::ConjugateGradient);
        opts.tols = Tolerances::new(None, None, Some(200)).unwrap();
        let cg = maximize(&Concave, theta0.clone(), &(), &opts).unwrap();
        assert!(cg.value > ll0);

        let mut opts = MLEOptions::with_method(OptimMethod::SimulatedAnnealing);
        opts.tols = Tolerances::new(None, None, Some(2_000)).unwrap();
        let sa = maximize(&Concave, theta0, &(), &opts).unwrap();
        assert_eq!(sa.convergence, Convergence::Success);
        assert!(sa.value > ll0);
    }

    #[test]
    fn check_runs_before_solving() {
        let err = maximize(&Concave, array![1.0], &(), &MLEOptions::default()).unwrap_err();
        assert_eq!(err, OptError::GradientDimMismatch { expected: 2, found: 1 });
    }

    #[test]
    // Purpose
    // -------
    // A solver error yields a failure outcome carrying the error text and a
    // finite point rather than an `Err`.
    fn solver_error_returns_failure_outcome() {
        let opts = MLEOptions::with_method(OptimMethod::Bfgs);
        let out = maximize(&BrokenGradient, array![0.5, 0.5], &(), &opts).unwrap();

        assert_eq!(out.convergence, Convergence::Failure);
        assert_eq!(out.convergence.code(), 2);
        assert!(out.message.contains("gradient unavailable"));
        assert!(out.value.is_finite());
        assert!(out.grad_norm.is_none());
    }
}
