//! covariance — invert the curvature of the negative log-likelihood.
//!
//! Purpose
//! -------
//! Turn the curvature matrix `H = ∇²(−ℓ)(θ̂)` reported by the estimator into
//! the covariance matrix `H⁻¹` of the maximum-likelihood estimate.
//!
//! Key behaviors
//! -------------
//! - Shape and finiteness are checked before any factorization.
//! - `H` is symmetrized and scaled to unit diagonal,
//!   `R = D^{−1/2} H D^{−1/2}`, so the conditioning test does not depend on
//!   the units of the covariates.
//! - `H` is accepted only if it is positive definite and the reciprocal
//!   condition number of `R` is at least [`MIN_RECIPROCAL_CONDITION`];
//!   otherwise the result is [`InferenceError::SingularCurvature`].
//! - The inverse is `D^{−1/2} R⁻¹ D^{−1/2}` with `R⁻¹` from a Cholesky
//!   factorization.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every returned covariance is symmetric positive definite, so each
//!   diagonal entry is a valid variance.
use crate::inference::errors::{InferenceError, InferenceResult};
use nalgebra::{Cholesky, DMatrix};
use ndarray::Array2;

/// Smallest accepted `λ_min / λ_max` of the unit-diagonal curvature.
///
/// Finite-difference curvature of an unidentified direction lands around
/// `1e-8`; identified fits sit far above this bound.
pub const MIN_RECIPROCAL_CONDITION: f64 = 1e-6;

/// Invert a square curvature matrix.
///
/// # Errors
/// - [`InferenceError::DimensionMismatch`] if the matrix is not square.
/// - [`InferenceError::NonFiniteCurvature`] for the first non-finite entry.
/// - [`InferenceError::SingularCurvature`] if the matrix is not positive
///   definite or is numerically singular.
pub fn invert_curvature(curvature: &Array2<f64>) -> InferenceResult<Array2<f64>> {
    let n = curvature.nrows();
    if curvature.ncols() != n {
        return Err(InferenceError::DimensionMismatch { expected: n, found: curvature.dim() });
    }
    if let Some(((row, col), &value)) = curvature.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(InferenceError::NonFiniteCurvature { row, col, value });
    }
    if n == 0 {
        return Ok(Array2::zeros((0, 0)));
    }

    let scale: Vec<f64> = (0..n).map(|i| curvature[[i, i]]).collect();
    if scale.iter().any(|&d| d <= 0.0) {
        return Err(InferenceError::SingularCurvature);
    }
    let scale: Vec<f64> = scale.into_iter().map(f64::sqrt).collect();
    let unit = DMatrix::from_fn(n, n, |i, j| {
        0.5 * (curvature[[i, j]] + curvature[[j, i]]) / (scale[i] * scale[j])
    });

    if reciprocal_condition(&unit) < MIN_RECIPROCAL_CONDITION {
        return Err(InferenceError::SingularCurvature);
    }
    let unit_inverse = Cholesky::new(unit).ok_or(InferenceError::SingularCurvature)?.inverse();

    let covariance =
        Array2::from_shape_fn((n, n), |(i, j)| unit_inverse[(i, j)] / (scale[i] * scale[j]));
    if covariance.iter().any(|v| !v.is_finite()) {
        return Err(InferenceError::SingularCurvature);
    }
    Ok(covariance)
}

/// Standard error of coefficient `index` from a covariance matrix.
///
/// # Errors
/// [`InferenceError::NonPositiveVariance`] if the variance is not a finite
/// positive number.
pub fn standard_error(covariance: &Array2<f64>, index: usize) -> InferenceResult<f64> {
    let value = covariance[[index, index]];
    if !value.is_finite() || value <= 0.0 {
        return Err(InferenceError::NonPositiveVariance { index, value });
    }
    Ok(value.sqrt())
}

// ---- Helper methods ----

/// `λ_min / λ_max` of a symmetric matrix; `0` unless every eigenvalue is
/// positive.
fn reciprocal_condition(matrix: &DMatrix<f64>) -> f64 {
    let eigenvalues = matrix.symmetric_eigenvalues();
    let min = eigenvalues.iter().copied().fold(f64::INFINITY, f64::min);
    let max = eigenvalues.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min.is_nan() || min <= 0.0 || !max.is_finite() {
        return 0.0;
    }
    min / max
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Inversion of well-conditioned symmetric matrices.
    // - Each failure mode: shape, non-finite entries, singularity.
    // - Variance validation for standard errors.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A symmetric positive-definite matrix is inverted exactly.
    //
    // Given
    // -----
    // - H = [[4, 1], [1, 2]], det = 7.
    //
    // Expect
    // ------
    // - H⁻¹ = [[2, −1], [−1, 4]] / 7 and H·H⁻¹ = I.
    fn invert_curvature_matches_closed_form() {
        // Arrange
        let h = array![[4.0, 1.0], [1.0, 2.0]];

        // Act
        let cov = invert_curvature(&h).unwrap();

        // Assert
        assert_relative_eq!(cov[[0, 0]], 2.0 / 7.0, max_relative = 1e-12);
        assert_relative_eq!(cov[[0, 1]], -1.0 / 7.0, max_relative = 1e-12);
        assert_relative_eq!(cov[[1, 1]], 4.0 / 7.0, max_relative = 1e-12);
        let identity = h.dot(&cov);
        assert_relative_eq!(identity[[0, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(identity[[1, 0]], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn invert_curvature_rejects_singular_and_malformed_input() {
        assert_eq!(
            invert_curvature(&Array2::zeros((3, 3))).unwrap_err(),
            InferenceError::SingularCurvature
        );
        assert_eq!(
            invert_curvature(&array![[1.0, 2.0], [2.0, 4.0]]).unwrap_err(),
            InferenceError::SingularCurvature
        );
        assert_eq!(
            invert_curvature(&Array2::zeros((2, 3))).unwrap_err(),
            InferenceError::DimensionMismatch { expected: 2, found: (2, 3) }
        );
        assert!(matches!(
            invert_curvature(&array![[1.0, f64::NAN], [0.0, 1.0]]),
            Err(InferenceError::NonFiniteCurvature { row: 0, col: 1, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Indefinite and numerically singular matrices are rejected even though
    // an exact-pivot inverse exists.
    //
    // Given
    // -----
    // - H₁ = diag(2, −1): invertible, not positive definite.
    // - H₂ = [[1, 1], [1, 1 + 1e-15]]: determinant at rounding level.
    //
    // Expect
    // ------
    // - Both yield `SingularCurvature`.
    fn invert_curvature_rejects_indefinite_and_ill_conditioned_input() {
        assert_eq!(
            invert_curvature(&array![[2.0, 0.0], [0.0, -1.0]]).unwrap_err(),
            InferenceError::SingularCurvature
        );
        assert_eq!(
            invert_curvature(&array![[2.0, 3.0], [3.0, 2.0]]).unwrap_err(),
            InferenceError::SingularCurvature
        );
        assert_eq!(
            invert_curvature(&array![[1.0, 1.0], [1.0, 1.0 + 1e-15]]).unwrap_err(),
            InferenceError::SingularCurvature
        );
    }

    #[test]
    // Purpose
    // -------
    // Conditioning is judged on the unit-diagonal matrix, so a well
    // identified fit with very differently scaled coefficients is accepted.
    fn invert_curvature_is_invariant_to_coefficient_units() {
        let h = array![[1e8, 0.5], [0.5, 1e-8]];

        let cov = invert_curvature(&h).unwrap();

        let det = 1.0 - 0.25;
        assert_relative_eq!(cov[[0, 0]], 1e-8 / det, max_relative = 1e-9);
        assert_relative_eq!(cov[[1, 1]], 1e8 / det, max_relative = 1e-9);
        assert_relative_eq!(cov[[0, 1]], -0.5 / det, max_relative = 1e-9);
    }

    #[test]
    fn standard_error_requires_positive_variance() {
        let cov = array![[0.25, 0.0], [0.0, -1.0]];
        assert_relative_eq!(standard_error(&cov, 0).unwrap(), 0.5);
        assert_eq!(
            standard_error(&cov, 1).unwrap_err(),
            InferenceError::NonPositiveVariance { index: 1, value: -1.0 }
        );
    }
}
