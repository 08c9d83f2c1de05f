//! Unified error surface for the optimization layer.
//!
//! Configuration mistakes (tolerances, method names, annealing settings),
//! derivative validation failures, and `argmin` backend errors are all
//! normalized into [`OptError`]. Model configuration errors pass through
//! unchanged as [`OptError::Model`].
use crate::model::errors::ModelError;
use argmin::core::{ArgminError, Error as BoxedError};
use thiserror::Error;

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptError {
    // ---- Derivatives ----
    /// Implies that finite differences should be used.
    #[error("Gradient not implemented")]
    GradientNotImplemented,

    /// No analytic Hessian is available for this model.
    #[error("Analytic Hessian not implemented")]
    HessianNotImplemented,

    /// Gradient dimensions do not match parameter dimensions.
    #[error("Gradient dimension mismatch: expected {expected}, found {found}")]
    GradientDimMismatch { expected: usize, found: usize },

    /// Gradient elements need to be finite.
    #[error("Invalid gradient at index {index}: {value}: {reason}")]
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    /// Hessian matrix dimensions do not match parameter dimensions.
    #[error("Hessian dimension mismatch: expected ({expected}, {expected}), found {found:?}")]
    HessianDimMismatch { expected: usize, found: (usize, usize) },

    /// Hessian values need to be finite.
    #[error("Invalid Hessian at ({row}, {col}): {value}, must be finite")]
    InvalidHessian { row: usize, col: usize, value: f64 },

    // ---- MLEOptions ----
    /// Gradient tolerance needs to be positive and finite.
    #[error("Invalid gradient tolerance {tol}: {reason}")]
    InvalidTolGrad { tol: f64, reason: &'static str },

    /// Cost change tolerance needs to be positive and finite.
    #[error("Invalid cost function change tolerance {tol}: {reason}")]
    InvalidTolCost { tol: f64, reason: &'static str },

    /// Maximum iterations needs to be positive.
    #[error("Invalid maximum iterations {max_iter}: {reason}")]
    InvalidMaxIter { max_iter: usize, reason: &'static str },

    /// At least one tolerance must be provided.
    #[error("No tolerances provided")]
    NoTolerancesProvided,

    /// Invalid line searcher name.
    #[error("Invalid line searcher '{name}': {reason}")]
    InvalidLineSearch { name: String, reason: &'static str },

    /// Invalid optimization method name.
    #[error("Invalid optimization method '{name}': {reason}")]
    InvalidMethod { name: String, reason: &'static str },

    /// lbfgs_mem needs to be at least 1.
    #[error("Invalid L-BFGS memory {mem}: {reason}")]
    InvalidLBFGSMem { mem: usize, reason: &'static str },

    /// Simulated-annealing setting out of range.
    #[error("Invalid annealing setting '{name}' = {value}: {reason}")]
    InvalidAnneal { name: &'static str, value: f64, reason: &'static str },

    /// The problem was asked for an annealing proposal without one configured.
    #[error("Annealing proposal requested but not configured")]
    AnnealNotConfigured,

    // ---- Cost function ----
    /// Cost function returned a non-finite value.
    #[error("Non-finite cost value: {value}")]
    NonFiniteCost { value: f64 },

    // ---- Optimizer outcome ----
    /// Estimated parameters must be finite.
    #[error("Invalid estimated parameter at index {index}: {value}: {reason}")]
    InvalidThetaHat { index: usize, value: f64, reason: &'static str },

    /// Theta hat is missing.
    #[error("Missing estimated parameters (theta hat)")]
    MissingThetaHat,

    // ---- Argmin ----
    #[error("Invalid parameter: {text}")]
    InvalidParameter { text: String },
    #[error("Not implemented: {text}")]
    NotImplemented { text: String },
    #[error("Not initialized: {text}")]
    NotInitialized { text: String },
    #[error("Condition violated: {text}")]
    ConditionViolated { text: String },
    #[error("Checkpoint not found: {text}")]
    CheckPointNotFound { text: String },
    #[error("Potential bug: {text}")]
    PotentialBug { text: String },
    #[error("Impossible error: {text}")]
    ImpossibleError { text: String },
    /// Any other error raised inside the backend (e.g. line-search failures).
    #[error("Backend error: {text}")]
    BackendError { text: String },

    // ---- Model ----
    #[error(transparent)]
    Model(#[from] ModelError),

    // ---- Fallback ----
    #[error("Unknown error")]
    UnknownError,
}

impl From<BoxedError> for OptError {
    fn from(original_err: BoxedError) -> Self {
        let original_err = match original_err.downcast::<ArgminError>() {
            Ok(argmin_err) => {
                return match argmin_err {
                    ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                    ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                    ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                    ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                    ArgminError::CheckpointNotFound { text } => {
                        OptError::CheckPointNotFound { text }
                    }
                    ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                    ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                    _ => OptError::UnknownError,
                };
            }
            Err(err) => err,
        };
        match original_err.downcast::<OptError>() {
            Ok(opt_err) => opt_err,
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}
