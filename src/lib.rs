//! bipartite_dm — count regression for bipartite interaction networks.
//!
//! Purpose
//! -------
//! Fit grouped conditional logit (GCL) and Dirichlet-multinomial (DM)
//! regression models to pollinator–plant visit counts by maximum likelihood,
//! and report Wald inference for the fitted coefficients.
//!
//! Key behaviors
//! -------------
//! - [`model`] ingests a covariate table (or ready-made design matrices) into
//!   a validated [`ModelSpec`] and provides the log-likelihood, score, and
//!   `rconst` Hessian kernels for the four dispersion structures
//!   (`gcl`, `dconst`, `dfunc`, `rconst`).
//! - [`optimization`] hosts the argmin-backed maximizer and the numerically
//!   stable special functions the kernels rely on.
//! - [`estimation`] drives one fit from Poisson starting values and attaches
//!   the curvature matrix; [`inference`] turns it into standard errors,
//!   z-statistics, p-values, and Wald intervals.
//! - [`simulation`] draws synthetic networks with known trait effects.
//!
//! Invariants & assumptions
//! ------------------------
//! - Rows are stacked group by group (`row = g * J + j`) everywhere.
//! - Kernels evaluate `−ℓ`; the public optimizer and reports speak in `ℓ`.
//! - Configuration problems are `Err`s raised before numerical work;
//!   optimizer trouble is reported through convergence codes instead.
//!
//! Conventions
//! -----------
//! - Logging goes through the `log` facade; no logger is installed here.
//! - The `obs_slog` feature attaches argmin's slog observer to verbose runs.
//!
//! Testing notes
//! -------------
//! - Kernels, optimizer plumbing, and reports are unit-tested in their
//!   modules; `tests/` holds end-to-end fits on small hand-checked networks
//!   and simulated data.

pub mod estimation;
pub mod inference;
pub mod model;
pub mod optimization;
pub mod simulation;

pub use crate::{
    estimation::{Estimator, FitOptions, FitResult},
    inference::report::InferenceReport,
    model::{CovariateTable, GroupLayout, ModelSpec, NetworkModel, Parameterization},
};
