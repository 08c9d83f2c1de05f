//! estimation — fit network models and collect raw results.
//!
//! Purpose
//! -------
//! Drive one maximum-likelihood fit: starting values, optimization, and the
//! curvature matrix handed to [`crate::inference`].
//!
//! Key behaviors
//! -------------
//! - [`Estimator::fit`] runs the whole pipeline for a
//!   [`ModelSpec`](crate::model::ModelSpec) and returns a [`FitResult`].
//! - [`FitOptions`] bundles optimizer options with the `ρ` seed and the
//!   confidence quantile.
//!
//! Conventions
//! -----------
//! - Configuration errors are returned as `Err` before any numerical work;
//!   optimizer and curvature problems are reported inside [`FitResult`].
pub mod estimator;
pub mod options;

pub use self::estimator::{CurvatureSource, Estimator, FitResult};
pub use self::options::{DEFAULT_CONFIDENCE_Z, DEFAULT_RHO_START, FitOptions};
