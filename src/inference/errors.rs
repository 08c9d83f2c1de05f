//! Errors raised while turning a fitted curvature matrix into inference.
//!
//! None of these abort a fit: they are stored in the report's covariance
//! and per-coefficient fields so that point estimates are still returned.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// The curvature matrix is not positive definite or is numerically
    /// singular.
    #[error("Inference Error: curvature matrix is singular or not positive definite")]
    SingularCurvature,

    /// An inverted curvature matrix has a non-positive or non-finite variance.
    #[error("Inference Error: variance of coefficient {index} is {value}, must be positive")]
    NonPositiveVariance { index: usize, value: f64 },

    /// The curvature matrix contains a non-finite entry.
    #[error("Inference Error: curvature entry ({row}, {col}) is {value}, must be finite")]
    NonFiniteCurvature { row: usize, col: usize, value: f64 },

    /// Curvature and estimate dimensions disagree.
    #[error("Inference Error: expected a {expected}×{expected} curvature matrix, found {found:?}")]
    DimensionMismatch { expected: usize, found: (usize, usize) },
}

pub type InferenceResult<T> = Result<T, InferenceError>;
