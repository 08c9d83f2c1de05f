//! loglik_optimizer::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the numeric types, iteration-state shapes, and solver aliases
//! used by the log-likelihood optimizer, so the rest of the optimization code
//! stays agnostic to `ndarray` and Argmin generics.
//!
//! Key behaviors
//! -------------
//! - Canonical aliases for parameter vectors, gradients, Hessians, and
//!   scalar costs (`Theta`, `Grad`, `Hessian`, `Cost`).
//! - Iteration-state aliases for the three state shapes the supported
//!   solvers use: derivative-free (`SimplexState`), gradient-based
//!   (`GradState`), and BFGS with an inverse Hessian (`BfgsState`).
//! - Pre-wired solver aliases for every line-search/solver pairing that can
//!   be named. Simulated annealing carries Argmin's internal RNG type and is
//!   built inline by the API layer.
//!
//! Invariants & assumptions
//! ------------------------
//! - All vectors and matrices are `ndarray` containers over `f64`.
//! - `Cost` is the minimized quantity `c(θ) = −ℓ(θ)`.
//!
//! Testing notes
//! -------------
//! - Type aliases only; exercised by the builder and runner tests.
use argmin::{
    core::IterState,
    solver::{
        conjugategradient::{NonlinearConjugateGradient, beta::PolakRibiere},
        linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
        quasinewton::{BFGS, LBFGS},
    },
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Parameter vector `θ`.
pub type Theta = Array1<f64>;

/// Gradient vector, same shape as `Theta`.
pub type Grad = Array1<f64>;

/// Dense `n × n` Hessian.
pub type Hessian = Array2<f64>;

/// Scalar objective value (the cost `c(θ) = −ℓ(θ)`).
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Default cap on optimizer iterations.
pub const DEFAULT_MAX_ITER: usize = 10_000;

// ---- Iteration states ----

/// State of derivative-free solvers (Nelder–Mead, simulated annealing).
pub type SimplexState = IterState<Theta, (), (), (), (), Cost>;

/// State of gradient-based solvers without a Hessian (L-BFGS, CG).
pub type GradState = IterState<Theta, Grad, (), (), (), Cost>;

/// State of BFGS, which carries the inverse-Hessian approximation.
pub type BfgsState = IterState<Theta, Grad, (), Hessian, (), Cost>;

// ---- Line searches and solvers ----

/// Hager–Zhang line search specialized to this crate's numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

/// More–Thuente line search specialized to this crate's numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS solver wired to the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS solver wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;

/// BFGS solver wired to the Hager–Zhang line search.
pub type BfgsHagerZhang = BFGS<HagerZhangLS, Cost>;

/// BFGS solver wired to the More–Thuente line search.
pub type BfgsMoreThuente = BFGS<MoreThuenteLS, Cost>;

/// Polak–Ribière nonlinear conjugate gradient with Hager–Zhang line search.
pub type CgHagerZhang = NonlinearConjugateGradient<Theta, HagerZhangLS, PolakRibiere, Cost>;

/// Polak–Ribière nonlinear conjugate gradient with More–Thuente line search.
pub type CgMoreThuente = NonlinearConjugateGradient<Theta, MoreThuenteLS, PolakRibiere, Cost>;
