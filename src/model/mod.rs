//! model — grouped count data and the network likelihood kernels.
//!
//! Purpose
//! -------
//! Describe one bipartite count network (pollinator groups × plant
//! categories) together with its covariates and dispersion structure, and
//! evaluate the grouped conditional logit / Dirichlet-multinomial
//! log-likelihood, its score, and (for `rconst`) its Hessian.
//!
//! Key behaviors
//! -------------
//! - [`ModelSpec`] is built once from a [`CovariateTable`] or from arrays and
//!   is read-only afterwards.
//! - [`likelihood`], [`gradient`], and [`hessian`] are pure functions of
//!   `(θ, ModelSpec)` that fold over groups in parallel.
//! - [`NetworkModel`] exposes the kernels through the optimizer's
//!   `LogLikelihood` trait; [`UnconstrainedNetworkModel`] does the same on
//!   the optimizer's scale, where `ρ` is optimized as `logit(ρ)`.
//! - [`start`] fits the Poisson GLM used for starting values.
//!
//! Invariants & assumptions
//! ------------------------
//! - Kernels return the *negative* log-likelihood and its derivatives;
//!   non-finite objective values are reported as `+∞`.
//! - Configuration problems surface as [`ModelError`] before any numerical
//!   work begins.
pub mod dm_model;
pub mod errors;
pub mod gradient;
pub mod groups;
pub mod hessian;
pub mod likelihood;
pub mod parameterization;
pub mod spec;
pub mod start;
pub mod table;
pub mod unconstrained;

pub use self::dm_model::NetworkModel;
pub use self::errors::{ModelError, ModelResult};
pub use self::parameterization::Parameterization;
pub use self::spec::ModelSpec;
pub use self::start::{PoissonStart, poisson_start};
pub use self::table::{CovariateTable, GroupLayout};
pub use self::unconstrained::{UnconstrainedNetworkModel, to_natural, to_unconstrained};
