//! loglik_optimizer::builders — solver construction helpers.
//!
//! Purpose
//! -------
//! Provide small, focused builders for the solvers behind
//! [`OptimMethod`](crate::optimization::loglik_optimizer::traits::OptimMethod).
//! These helpers hide Argmin's generic wiring and apply crate-level options
//! (tolerances, L-BFGS memory, the initial simplex) so that the API layer
//! can request a configured solver without touching Argmin-specific types.
//!
//! Key behaviors
//! -------------
//! - Nelder–Mead: build the initial simplex around `θ₀` and apply the cost
//!   tolerance as the simplex standard-deviation criterion.
//! - BFGS and L-BFGS: pair the solver with Hager–Zhang or More–Thuente line
//!   search and apply optional gradient and cost-change tolerances.
//! - Conjugate gradient: Polak–Ribière updates with periodic restarts.
//!
//! Invariants & assumptions
//! ------------------------
//! - Builders never set `max_iters` or the initial parameter on the solver
//!   state; the runner does that.
//! - Invalid tolerances rejected by Argmin surface as [`OptError`] through
//!   the crate's `From<argmin::core::Error>` conversion.
//!
//! Conventions
//! -----------
//! - The simplex for an `n`-parameter problem has `n + 1` vertices: `θ₀` and
//!   `θ₀ + s·e_i` for each coordinate, with `s = 0.1 · max|θ₀|` (or `0.1`
//!   when `θ₀ = 0`).
//!
//! Testing notes
//! -------------
//! - Unit tests cover the simplex geometry and the propagation of Argmin's
//!   tolerance validation.
use argmin::solver::{
    conjugategradient::{NonlinearConjugateGradient, beta::PolakRibiere},
    neldermead::NelderMead,
    quasinewton::{BFGS, LBFGS},
};

use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        traits::MLEOptions,
        types::{
            BfgsHagerZhang, BfgsMoreThuente, CgHagerZhang, CgMoreThuente, Cost, DEFAULT_LBFGS_MEM,
            Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS, Theta,
        },
    },
};

/// Relative size of the initial simplex.
const SIMPLEX_SCALE: f64 = 0.1;

/// Conjugate-gradient restart interval, in iterations.
const CG_RESTART_ITERS: u64 = 20;

/// Build a Nelder–Mead solver whose initial simplex surrounds `theta0`.
///
/// # Errors
/// - [`OptError::InvalidThetaHat`] if `theta0` is empty or non-finite.
/// - Argmin's rejection of a non-positive `tol_cost`.
pub fn build_nelder_mead(theta0: &Theta, opts: &MLEOptions) -> OptResult<NelderMead<Theta, Cost>> {
    let solver = NelderMead::new(initial_simplex(theta0)?);
    match opts.tols.tol_cost {
        Some(tol) => Ok(solver.with_sd_tolerance(tol)?),
        None => Ok(solver),
    }
}

/// Build BFGS with Hager–Zhang line search.
pub fn build_bfgs_hager_zhang(opts: &MLEOptions) -> OptResult<BfgsHagerZhang> {
    configure_bfgs(BFGS::new(HagerZhangLS::new()), opts)
}

/// Build BFGS with More–Thuente line search.
pub fn build_bfgs_more_thuente(opts: &MLEOptions) -> OptResult<BfgsMoreThuente> {
    configure_bfgs(BFGS::new(MoreThuenteLS::new()), opts)
}

/// Build L-BFGS with Hager–Zhang line search.
///
/// The history size is `opts.lbfgs_mem`, or [`DEFAULT_LBFGS_MEM`] when unset.
pub fn build_lbfgs_hager_zhang(opts: &MLEOptions) -> OptResult<LbfgsHagerZhang> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsHagerZhang::new(HagerZhangLS::new(), mem), opts)
}

/// Build L-BFGS with More–Thuente line search.
pub fn build_lbfgs_more_thuente(opts: &MLEOptions) -> OptResult<LbfgsMoreThuente> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsMoreThuente::new(MoreThuenteLS::new(), mem), opts)
}

/// Build Polak–Ribière CG with Hager–Zhang line search.
///
/// Argmin's CG has no gradient or cost tolerance; runs end at the iteration
/// cap or on a line-search failure.
pub fn build_cg_hager_zhang() -> CgHagerZhang {
    NonlinearConjugateGradient::new(HagerZhangLS::new(), PolakRibiere::new())
        .restart_iters(CG_RESTART_ITERS)
}

/// Build Polak–Ribière CG with More–Thuente line search.
pub fn build_cg_more_thuente() -> CgMoreThuente {
    NonlinearConjugateGradient::new(MoreThuenteLS::new(), PolakRibiere::new())
        .restart_iters(CG_RESTART_ITERS)
}

// ---- Helper methods ----

fn initial_simplex(theta0: &Theta) -> OptResult<Vec<Theta>> {
    if theta0.is_empty() {
        return Err(OptError::InvalidThetaHat {
            index: 0,
            value: f64::NAN,
            reason: "Starting point must have at least one parameter.",
        });
    }
    if let Some((index, &value)) = theta0.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(OptError::InvalidThetaHat {
            index,
            value,
            reason: "Starting point must be finite.",
        });
    }
    let max_abs = theta0.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let step = if max_abs > 0.0 { SIMPLEX_SCALE * max_abs } else { SIMPLEX_SCALE };
    let mut vertices = Vec::with_capacity(theta0.len() + 1);
    vertices.push(theta0.clone());
    for i in 0..theta0.len() {
        let mut vertex = theta0.clone();
        vertex[i] += step;
        vertices.push(vertex);
    }
    Ok(vertices)
}

fn configure_bfgs<L>(mut solver: BFGS<L, Cost>, opts: &MLEOptions) -> OptResult<BFGS<L, Cost>> {
    if let Some(tol) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(tol)?;
    }
    if let Some(tol) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(tol)?;
    }
    Ok(solver)
}

fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MLEOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(tol) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(tol)?;
    }
    if let Some(tol) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(tol)?;
    }
    Ok(solver)
}
