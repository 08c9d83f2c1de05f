//! Public API surface for log-likelihood maximization.
//!
//! - [`LogLikelihood`]: trait models implement.
//! - [`OptimMethod`], [`LineSearcher`], [`Tolerances`], [`AnnealOptions`],
//!   [`MLEOptions`]: optimizer configuration.
//! - [`Convergence`] and [`OptimOutcome`]: normalized result returned by
//!   [`maximize`](crate::optimization::loglik_optimizer::maximize).
//!
//! Convention: we *maximize* a log-likelihood `ℓ(θ)` by minimizing the cost
//! `c(θ) = −ℓ(θ)`. Analytic derivatives are those of the log-likelihood;
//! the adapter flips signs as needed.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        types::{Cost, DEFAULT_MAX_ITER, FnEvalMap, Grad, Hessian, Theta},
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use std::{fmt, str::FromStr};

/// User-implemented log-likelihood interface.
///
/// You maximize `ℓ(θ)`; internally we minimize the cost `c(θ) = −ℓ(θ)`.
///
/// - `type Data`: per-model data carried into every call.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate `ℓ(θ)`. A
///   non-finite value marks `θ` as infeasible; the optimizer sees `+∞`.
/// - `check(&Theta, &Data) -> OptResult<()>`: reject malformed `θ`/`data`
///   pairs. Called once before optimization.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic `∇ℓ(θ)`. If not
///   implemented, finite differences of the cost are used.
/// - `hessian(&Theta, &Data) -> OptResult<Hessian>`: analytic `∇²ℓ(θ)`.
///   Defaults to [`OptError::HessianNotImplemented`].
pub trait LogLikelihood {
    type Data: 'static;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }

    fn hessian(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Hessian> {
        Err(OptError::HessianNotImplemented)
    }
}

/// Choice of line search used by the quasi-Newton and CG solvers.
///
/// Parsing is case-insensitive (`"MoreThuente"`, `"HagerZhang"`); unknown
/// names return `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineSearcher {
    #[default]
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Optimization algorithm.
///
/// Variants:
/// - `NelderMead` (default): derivative-free simplex search.
/// - `Bfgs`: quasi-Newton with a dense inverse-Hessian update.
/// - `Lbfgs`: limited-memory BFGS.
/// - `ConjugateGradient`: Polak–Ribière nonlinear conjugate gradient.
/// - `SimulatedAnnealing`: stochastic search with Gaussian proposals.
///
/// Parsing is case-insensitive: `"Nelder-Mead"`, `"BFGS"`, `"L-BFGS-B"` or
/// `"L-BFGS"`, `"CG"`, `"SANN"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimMethod {
    #[default]
    NelderMead,
    Bfgs,
    Lbfgs,
    ConjugateGradient,
    SimulatedAnnealing,
}

impl OptimMethod {
    /// Display name, matching the accepted parse strings.
    pub fn name(&self) -> &'static str {
        match self {
            OptimMethod::NelderMead => "Nelder-Mead",
            OptimMethod::Bfgs => "BFGS",
            OptimMethod::Lbfgs => "L-BFGS",
            OptimMethod::ConjugateGradient => "CG",
            OptimMethod::SimulatedAnnealing => "SANN",
        }
    }
}

impl fmt::Display for OptimMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OptimMethod {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nelder-mead" | "neldermead" => Ok(OptimMethod::NelderMead),
            "bfgs" => Ok(OptimMethod::Bfgs),
            "l-bfgs-b" | "l-bfgs" | "lbfgs" => Ok(OptimMethod::Lbfgs),
            "cg" => Ok(OptimMethod::ConjugateGradient),
            "sann" => Ok(OptimMethod::SimulatedAnnealing),
            _ => Err(OptError::InvalidMethod {
                name: s.to_string(),
                reason: "Valid options are 'Nelder-Mead', 'BFGS', 'L-BFGS-B', 'CG', 'SANN'.",
            }),
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_grad`: stop when the gradient norm falls below this threshold
///   (gradient-based solvers).
/// - `tol_cost`: stop when the change in cost falls below this threshold;
///   for Nelder–Mead it is the standard deviation of the simplex costs.
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** must be provided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

impl Default for Tolerances {
    /// `tol_grad = 1e-6`, `tol_cost = 1e-8`, `max_iter = 10_000`.
    fn default() -> Self {
        Self { tol_grad: Some(1e-6), tol_cost: Some(1e-8), max_iter: Some(DEFAULT_MAX_ITER) }
    }
}

/// Simulated-annealing settings.
///
/// - `initial_temp`: starting temperature (`> 0`).
/// - `step`: proposal scale; a proposal adds `N(0, (step · T / T₀)²)` noise
///   to every coordinate at temperature `T`.
/// - `seed`: seed for the proposal generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealOptions {
    pub initial_temp: f64,
    pub step: f64,
    pub seed: u64,
}

impl AnnealOptions {
    /// # Errors
    /// [`OptError::InvalidAnneal`] for non-finite or non-positive settings.
    pub fn new(initial_temp: f64, step: f64, seed: u64) -> OptResult<Self> {
        for (name, value) in [("initial_temp", initial_temp), ("step", step)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(OptError::InvalidAnneal {
                    name,
                    value,
                    reason: "Must be finite and strictly positive.",
                });
            }
        }
        Ok(Self { initial_temp, step, seed })
    }
}

impl Default for AnnealOptions {
    fn default() -> Self {
        Self { initial_temp: 10.0, step: 0.1, seed: 0x5EED }
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `tols`: numerical tolerances and iteration limits.
/// - `method`: optimization algorithm.
/// - `line_searcher`: line search for BFGS, L-BFGS, and CG.
/// - `lbfgs_mem`: L-BFGS history size (`None` uses the default of 7).
/// - `anneal`: simulated-annealing settings.
/// - `verbose`: if `true`, attaches an observer (behind the `obs_slog`
///   feature) and prints progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub method: OptimMethod,
    pub line_searcher: LineSearcher,
    pub lbfgs_mem: Option<usize>,
    pub anneal: AnnealOptions,
    pub verbose: bool,
}

impl MLEOptions {
    /// Create a new set of optimizer options.
    ///
    /// # Errors
    /// [`OptError::InvalidLBFGSMem`] if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, method: OptimMethod, line_searcher: LineSearcher,
        lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self { tols, method, line_searcher, lbfgs_mem, ..Self::default() })
    }

    /// Default options with another method.
    pub fn with_method(method: OptimMethod) -> Self {
        Self { method, ..Self::default() }
    }
}

/// Normalized convergence code.
///
/// - `Success` (code `0`): the solver met its convergence criterion.
/// - `IterationLimit` (code `1`): the iteration cap was reached first.
/// - `Failure` (code `2`): any other termination, including solver errors.
///
/// Simulated annealing has no convergence criterion and always runs to the
/// cap, so for that method reaching the cap counts as `Success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    Success,
    IterationLimit,
    Failure,
}

impl Convergence {
    /// Map an Argmin termination status for the given method.
    pub fn from_status(status: &TerminationStatus, method: OptimMethod) -> Self {
        match status {
            TerminationStatus::Terminated(
                TerminationReason::SolverConverged | TerminationReason::TargetCostReached,
            ) => Convergence::Success,
            TerminationStatus::Terminated(TerminationReason::MaxItersReached) => match method {
                OptimMethod::SimulatedAnnealing => Convergence::Success,
                _ => Convergence::IterationLimit,
            },
            _ => Convergence::Failure,
        }
    }

    /// Integer code (`0`, `1`, `2`).
    pub fn code(&self) -> i32 {
        match self {
            Convergence::Success => 0,
            Convergence::IterationLimit => 1,
            Convergence::Failure => 2,
        }
    }

    pub fn is_success(&self) -> bool {
        *self == Convergence::Success
    }
}

impl fmt::Display for Convergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Convergence::Success => "success",
            Convergence::IterationLimit => "iteration limit reached",
            Convergence::Failure => "failure",
        };
        write!(f, "{} ({label})", self.code())
    }
}

/// Canonical result returned by `maximize`.
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: best **log-likelihood** `ℓ(θ̂)` (not the cost).
/// - `convergence`: normalized convergence code.
/// - `message`: diagnostic text (termination status or solver error).
/// - `iterations`: optimizer iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`.
/// - `grad_norm`: norm of the analytic gradient at `θ̂`, when available.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub convergence: Convergence,
    pub message: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// # Errors
    /// - Propagates validation errors for `theta_hat` (missing or
    ///   non-finite) or `value` (non-finite).
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, status: &TerminationStatus, method: OptimMethod,
        iterations: u64, fn_evals: FnEvalMap,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        Ok(Self {
            theta_hat,
            value,
            convergence: Convergence::from_status(status, method),
            message: format!("{status:?}"),
            iterations: iterations as usize,
            fn_evals,
            grad_norm: None,
        })
    }

    /// Outcome for a run that ended in a solver error.
    ///
    /// `theta_hat`/`value` are the best point evaluated before the error (or
    /// the starting point) and `message` carries the error text.
    pub fn failure(theta_hat: Theta, value: f64, message: String) -> Self {
        Self {
            theta_hat,
            value,
            convergence: Convergence::Failure,
            message,
            iterations: 0,
            fn_evals: FnEvalMap::new(),
            grad_norm: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Method names parse case-insensitively in the spellings users pass, and
    // unknown names are rejected.
    fn optim_method_parses_user_spellings() {
        assert_eq!("Nelder-Mead".parse::<OptimMethod>().unwrap(), OptimMethod::NelderMead);
        assert_eq!("bfgs".parse::<OptimMethod>().unwrap(), OptimMethod::Bfgs);
        assert_eq!("L-BFGS-B".parse::<OptimMethod>().unwrap(), OptimMethod::Lbfgs);
        assert_eq!("CG".parse::<OptimMethod>().unwrap(), OptimMethod::ConjugateGradient);
        assert_eq!("sann".parse::<OptimMethod>().unwrap(), OptimMethod::SimulatedAnnealing);
        assert!(matches!("Brent".parse::<OptimMethod>(), Err(OptError::InvalidMethod { .. })));
        assert_eq!(OptimMethod::default(), OptimMethod::NelderMead);
    }

    #[test]
    // Purpose
    // -------
    // Termination statuses map onto the 0/1/2 convergence codes, with the
    // iteration cap counting as success for simulated annealing only.
    fn convergence_codes_follow_termination_status() {
        let converged = TerminationStatus::Terminated(TerminationReason::SolverConverged);
        let capped = TerminationStatus::Terminated(TerminationReason::MaxItersReached);
        let running = TerminationStatus::NotTerminated;

        assert_eq!(Convergence::from_status(&converged, OptimMethod::Bfgs).code(), 0);
        assert_eq!(Convergence::from_status(&capped, OptimMethod::Bfgs).code(), 1);
        assert_eq!(Convergence::from_status(&capped, OptimMethod::SimulatedAnnealing).code(), 0);
        assert_eq!(Convergence::from_status(&running, OptimMethod::NelderMead).code(), 2);
    }

    #[test]
    fn tolerances_and_options_are_validated() {
        assert_eq!(Tolerances::new(None, None, None).unwrap_err(), OptError::NoTolerancesProvided);
        assert!(matches!(
            Tolerances::new(Some(-1.0), None, None),
            Err(OptError::InvalidTolGrad { .. })
        ));
        assert!(matches!(
            Tolerances::new(None, None, Some(0)),
            Err(OptError::InvalidMaxIter { .. })
        ));
        let tols = Tolerances::default();
        assert!(matches!(
            MLEOptions::new(tols, OptimMethod::Lbfgs, LineSearcher::HagerZhang, Some(0)),
            Err(OptError::InvalidLBFGSMem { .. })
        ));
        assert!(matches!(
            AnnealOptions::new(0.0, 1.0, 1),
            Err(OptError::InvalidAnneal { name: "initial_temp", .. })
        ));
        assert_eq!(MLEOptions::default().tols.max_iter, Some(10_000));
    }
}
