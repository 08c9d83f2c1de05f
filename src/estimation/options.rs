//! Fit configuration for [`Estimator`](crate::estimation::Estimator).
use crate::{
    model::errors::{ModelError, ModelResult},
    optimization::loglik_optimizer::MLEOptions,
};

/// Default `ρ` seed appended to the Poisson start for `rconst`.
pub const DEFAULT_RHO_START: f64 = 0.1;

/// Two-sided 95% normal quantile used for Wald intervals.
pub const DEFAULT_CONFIDENCE_Z: f64 = 1.96;

/// Options for one network fit.
///
/// - `mle`: optimizer configuration (method, tolerances, iteration cap).
/// - `rho_start`: starting value of `ρ` for `rconst`, in `(0, 1)`.
/// - `confidence_z`: normal quantile for the reported Wald intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub mle: MLEOptions,
    pub rho_start: f64,
    pub confidence_z: f64,
}

impl FitOptions {
    /// Construct validated fit options.
    ///
    /// # Errors
    /// [`ModelError::InvalidFitSetting`] if `rho_start ∉ (0, 1)` or
    /// `confidence_z` is not finite and positive.
    pub fn new(mle: MLEOptions, rho_start: f64, confidence_z: f64) -> ModelResult<Self> {
        if !(rho_start > 0.0 && rho_start < 1.0) {
            return Err(ModelError::InvalidFitSetting {
                name: "rho_start",
                value: rho_start,
                reason: "Must lie strictly between 0 and 1.",
            });
        }
        if !confidence_z.is_finite() || confidence_z <= 0.0 {
            return Err(ModelError::InvalidFitSetting {
                name: "confidence_z",
                value: confidence_z,
                reason: "Must be finite and strictly positive.",
            });
        }
        Ok(Self { mle, rho_start, confidence_z })
    }

    /// Default options with the given optimizer configuration.
    pub fn with_mle(mle: MLEOptions) -> Self {
        Self { mle, ..Self::default() }
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            mle: MLEOptions::default(),
            rho_start: DEFAULT_RHO_START,
            confidence_z: DEFAULT_CONFIDENCE_Z,
        }
    }
}
