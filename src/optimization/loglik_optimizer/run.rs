//! loglik_optimizer::run — shared Argmin executor.
//!
//! One generic runner serves every solver: the iteration-state shape is a
//! type parameter (`G` for the gradient slot, `H` for the Hessian slot) and
//! the caller seeds the state through `init`, so BFGS can install its
//! inverse-Hessian while Nelder–Mead leaves the parameter unset.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        adapter::ArgMinAdapter,
        traits::{LogLikelihood, MLEOptions, OptimMethod, OptimOutcome},
        types::{Cost, Theta},
    },
};
#[cfg(feature = "obs_slog")]
use argmin::core::{CostFunction, Gradient};
use argmin::core::{Executor, IterState, Solver, State};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

/// Run an Argmin solver on a log-likelihood problem.
///
/// # Parameters
/// - `problem`: the [`ArgMinAdapter`] wrapping model and data.
/// - `solver`: a configured solver (see the `builders` module).
/// - `opts`: used for `max_iter` and `verbose`.
/// - `method`: selects the convergence mapping.
/// - `init`: seeds the initial state (e.g. `state.param(theta0)`).
///
/// # Feature flags
/// With `obs_slog` enabled and `opts.verbose == true`, a terminal slog
/// observer is attached and a pre-iteration line reports ℓ(θ₀).
///
/// # Returns
/// An [`OptimOutcome`] with the best parameter, `ℓ(θ̂) = −c(θ̂)`, the mapped
/// convergence code, iterations, and function counts. `grad_norm` is left
/// for the caller to fill.
///
/// # Errors
/// - Any Argmin runtime error (solver, line search, observer).
/// - Validation errors from [`OptimOutcome::new`].
pub fn run_solver<'a, F, S, G, H>(
    problem: ArgMinAdapter<'a, F>, solver: S, opts: &MLEOptions, method: OptimMethod,
    init: impl FnOnce(IterState<Theta, G, (), H, (), Cost>) -> IterState<Theta, G, (), H, (), Cost>,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    S: Solver<ArgMinAdapter<'a, F>, IterState<Theta, G, (), H, (), Cost>> + Send + 'static,
    IterState<Theta, G, (), H, (), Cost>: State<Param = Theta, Float = Cost>,
{
    let mut optimizer = Executor::new(problem, solver).configure(init);
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let result = optimizer.run()?;
    let state = result.state();
    OptimOutcome::new(
        state.get_best_param().cloned(),
        -state.get_best_cost(),
        state.get_termination_status(),
        method,
        state.get_iter(),
        state.get_func_counts().clone(),
    )
}

/// Print ℓ(θ₀) and, when available, the gradient norm before iterating.
#[cfg(feature = "obs_slog")]
pub fn log_initial_state<F>(theta0: &Theta, problem: &ArgMinAdapter<'_, F>) -> OptResult<()>
where
    F: LogLikelihood,
{
    let ll0 = -problem.cost(theta0)?;
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm());

    eprintln!(
        "init: ell(theta0) = {:.6}{}",
        ll0,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
    Ok(())
}
