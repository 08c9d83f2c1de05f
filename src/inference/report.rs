//! InferenceReport — Wald inference for a fitted network model.
//!
//! Purpose
//! -------
//! Convert a [`FitResult`] into the results table: per coefficient the
//! estimate, standard error, z-statistic, two-sided p-value, and Wald
//! interval, plus the log-likelihood, covariance matrix, and optimizer
//! diagnostics.
//!
//! Key behaviors
//! -------------
//! - The covariance is the inverse of the fit's curvature matrix. When the
//!   inversion fails, every coefficient's Wald statistics are unavailable
//!   and carry the same [`InferenceError`]; estimates are still reported.
//! - Inversion fails for curvature that is not positive definite or is
//!   numerically singular, so a positive variance next to a broken one is
//!   never reported.
//! - `p = 2·(1 − Φ(|z|)) = erfc(|z| / √2)`; interval `estimate ± z_c·SE`.
//! - [`InferenceReport::rounded`] applies presentation rounding (5 decimals
//!   for estimates, errors, bounds, and p-values; 3 for z) to a copy.
//!
//! Invariants & assumptions
//! ------------------------
//! - `coefficients` follows the order of `FitResult::theta_hat`.
//! - Rounding never touches the unrounded report it is derived from.
use crate::{
    estimation::FitResult,
    inference::{
        covariance::{invert_curvature, standard_error},
        errors::{InferenceError, InferenceResult},
    },
    optimization::loglik_optimizer::Convergence,
};
use ndarray::Array2;
use statrs::function::erf::erfc;
use std::{f64::consts::SQRT_2, fmt};

/// Wald statistics of one coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaldStats {
    pub std_error: f64,
    pub z: f64,
    pub p_value: f64,
    pub lower: f64,
    pub upper: f64,
}

impl WaldStats {
    /// Wald statistics for `estimate` with standard error `std_error`.
    pub fn new(estimate: f64, std_error: f64, confidence_z: f64) -> Self {
        let z = estimate / std_error;
        Self {
            std_error,
            z,
            p_value: erfc(z.abs() / SQRT_2),
            lower: estimate - confidence_z * std_error,
            upper: estimate + confidence_z * std_error,
        }
    }

    fn rounded(&self) -> Self {
        Self {
            std_error: round_to(self.std_error, 5),
            z: round_to(self.z, 3),
            p_value: round_to(self.p_value, 5),
            lower: round_to(self.lower, 5),
            upper: round_to(self.upper, 5),
        }
    }
}

/// One row of the results table.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientSummary {
    pub name: String,
    pub estimate: f64,
    pub wald: InferenceResult<WaldStats>,
}

/// Results table and fit-level fields.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceReport {
    pub coefficients: Vec<CoefficientSummary>,
    pub log_likelihood: f64,
    pub covariance: InferenceResult<Array2<f64>>,
    pub convergence: Convergence,
    pub message: String,
    pub confidence_z: f64,
}

impl InferenceReport {
    /// Build the report for a fit.
    ///
    /// Never fails: inversion problems are stored in `covariance` and in
    /// each coefficient's `wald` field.
    pub fn from_fit(fit: &FitResult, confidence_z: f64) -> Self {
        let covariance = if fit.curvature.nrows() == fit.theta_hat.len() {
            invert_curvature(&fit.curvature)
        } else {
            Err(InferenceError::DimensionMismatch {
                expected: fit.theta_hat.len(),
                found: fit.curvature.dim(),
            })
        };
        if let Err(err) = &covariance {
            log::warn!("standard errors unavailable: {err}");
        }

        let coefficients = fit
            .theta_hat
            .iter()
            .enumerate()
            .map(|(i, &estimate)| {
                let name = fit.coef_names.get(i).cloned().unwrap_or_else(|| format!("theta{i}"));
                let wald = match &covariance {
                    Ok(cov) => standard_error(cov, i)
                        .map(|se| WaldStats::new(estimate, se, confidence_z)),
                    Err(err) => Err(err.clone()),
                };
                CoefficientSummary { name, estimate, wald }
            })
            .collect();

        Self {
            coefficients,
            log_likelihood: fit.log_likelihood(),
            covariance,
            convergence: fit.convergence,
            message: fit.message.clone(),
            confidence_z,
        }
    }

    /// Copy with presentation rounding applied to every numeric field.
    pub fn rounded(&self) -> Self {
        let coefficients = self
            .coefficients
            .iter()
            .map(|c| CoefficientSummary {
                name: c.name.clone(),
                estimate: round_to(c.estimate, 5),
                wald: c.wald.as_ref().map(WaldStats::rounded).map_err(Clone::clone),
            })
            .collect();
        Self {
            coefficients,
            log_likelihood: round_to(self.log_likelihood, 5),
            covariance: self
                .covariance
                .as_ref()
                .map(|c| c.mapv(|v| round_to(v, 5)))
                .map_err(Clone::clone),
            convergence: self.convergence,
            message: self.message.clone(),
            confidence_z: self.confidence_z,
        }
    }

    /// `true` when standard errors are available for every coefficient.
    pub fn has_standard_errors(&self) -> bool {
        self.coefficients.iter().all(|c| c.wald.is_ok())
    }

    /// Coefficient row by name.
    pub fn coefficient(&self, name: &str) -> Option<&CoefficientSummary> {
        self.coefficients.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for InferenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.coefficients.iter().map(|c| c.name.len()).max().unwrap_or(0).max(11);
        writeln!(
            f,
            "{:<width$} {:>12} {:>12} {:>9} {:>9} {:>12} {:>12}",
            "coefficient", "estimate", "std.error", "z", "p.value", "lower", "upper"
        )?;
        for c in &self.coefficients {
            match &c.wald {
                Ok(w) => writeln!(
                    f,
                    "{:<width$} {:>12.5} {:>12.5} {:>9.3} {:>9.5} {:>12.5} {:>12.5}",
                    c.name, c.estimate, w.std_error, w.z, w.p_value, w.lower, w.upper
                )?,
                Err(_) => writeln!(
                    f,
                    "{:<width$} {:>12.5} {:>12} {:>9} {:>9} {:>12} {:>12}",
                    c.name, c.estimate, "NA", "NA", "NA", "NA", "NA"
                )?,
            }
        }
        writeln!(f, "log-likelihood: {:.5}", self.log_likelihood)?;
        if let Err(err) = &self.covariance {
            writeln!(f, "covariance: unavailable ({err})")?;
        }
        write!(f, "convergence: {} {}", self.convergence, self.message)
    }
}

// ---- Helper methods ----

fn round_to(value: f64, digits: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}
