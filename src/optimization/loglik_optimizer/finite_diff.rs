//! loglik_optimizer::finite_diff — finite-difference gradient and curvature.
//!
//! Purpose
//! -------
//! Provide the finite-difference derivatives the optimizer layer needs
//! without exposing the `finitediff` API: a guarded forward-difference
//! gradient, a validated and symmetrized Hessian of a gradient function,
//! and the numerical curvature of a [`LogLikelihood`] cost at a point.
//!
//! Key behaviors
//! -------------
//! - [`run_fd_diff`]: forward differences with error capture through a
//!   shared cell, followed by validation.
//! - [`compute_hessian`]: central-difference Jacobian of a gradient
//!   function, falling back to forward differences when the central matrix
//!   fails validation; the accepted matrix is symmetrized.
//! - [`numerical_curvature`]: the Hessian of `c(θ) = −ℓ(θ)`, obtained by
//!   differencing the analytic gradient when the model has one and a
//!   central-difference gradient otherwise.
//!
//! Invariants & assumptions
//! ------------------------
//! - Differences are taken in the optimizer's parameter space.
//! - Matrices returned from this module satisfy [`validate_hessian`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover the error-capture path of the gradient helper, the
//!   central→forward fallback, symmetrization, and curvature of a known
//!   quadratic with and without an analytic gradient.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        traits::LogLikelihood,
        types::{Grad, Hessian, Theta},
        validation::{validate_grad, validate_hessian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Forward-difference gradient of `func` at `theta`, with error capture.
///
/// The closure cannot return `Result`, so it is expected to store its first
/// error in `closure_err` and return `NaN`. The cell is cleared on entry
/// and inspected after differencing.
///
/// # Errors
/// - The captured error (converted into `OptError`).
/// - [`validate_grad`] errors for non-finite or mis-sized gradients.
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

/// Finite-difference Jacobian of a gradient function, validated and
/// symmetrized.
///
/// Central differences are attempted first; any validation failure causes a
/// fallback to forward differences, whose validation result is surfaced.
///
/// # Errors
/// - [`OptError::HessianDimMismatch`](crate::optimization::errors::OptError::HessianDimMismatch)
/// - [`OptError::InvalidHessian`](crate::optimization::errors::OptError::InvalidHessian)
pub fn compute_hessian<F: Fn(&Theta) -> Grad>(f: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let mut hess = theta.central_hessian(f);
    if validate_hessian(&hess, dim).is_err() {
        hess = theta.forward_hessian(f);
        validate_hessian(&hess, dim)?;
    }
    symmetrize_hess(&mut hess);
    Ok(hess)
}

/// Numerical Hessian of the cost `c(θ) = −ℓ(θ)` at `theta`.
///
/// Model errors inside the gradient become `NaN` entries, which then fail
/// validation.
///
/// # Errors
/// As [`compute_hessian`].
pub fn numerical_curvature<F: LogLikelihood>(
    f: &F, theta: &Theta, data: &F::Data,
) -> OptResult<Hessian> {
    let dim = theta.len();
    let cost = |t: &Theta| -> f64 {
        match f.value(t, data) {
            Ok(ll) if ll.is_finite() => -ll,
            _ => f64::NAN,
        }
    };
    let cost_grad = |t: &Theta| -> Grad {
        match f.grad(t, data) {
            Ok(g) => -g,
            Err(_) => t.central_diff(&cost),
        }
    };
    let nan_guard = |t: &Theta| -> Grad {
        let g = cost_grad(t);
        if g.len() == dim { g } else { Grad::from_elem(dim, f64::NAN) }
    };
    compute_hessian(&nan_guard, theta)
}

// ---- Helper methods ----

/// Average each off-diagonal pair in place; the diagonal is untouched.
fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::{OptError, OptResult};
    use approx::assert_relative_eq;
    use argmin::core::ArgminError;
    use ndarray::{Array1, Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Forward-difference gradients with and without closure errors.
    // - Hessian validation, fallback, and symmetrization.
    // - Cost curvature of a quadratic log-likelihood.
    // -------------------------------------------------------------------------

    /// ℓ(θ) = −(θ₀² + 3θ₀θ₁ + 4θ₁²); cost Hessian [[2, 3], [3, 8]].
    struct Quadratic {
        analytic: bool,
    }

    impl LogLikelihood for Quadratic {
        type Data = ();

        fn value(&self, t: &Theta, _: &()) -> OptResult<f64> {
            Ok(-(t[0] * t[0] + 3.0 * t[0] * t[1] + 4.0 * t[1] * t[1]))
        }

        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }

        fn grad(&self, t: &Theta, _: &()) -> OptResult<Grad> {
            if !self.analytic {
                return Err(OptError::GradientNotImplemented);
            }
            Ok(array![-(2.0 * t[0] + 3.0 * t[1]), -(3.0 * t[0] + 8.0 * t[1])])
        }
    }

    #[test]
    // Purpose
    // -------
    // An error stored by the objective closure is surfaced instead of a
    // gradient.
    fn run_fd_diff_propagates_closure_error() {
        // Arrange
        let theta: Theta = Array1::from(vec![1.0_f64]);
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |_: &Theta| {
            let argmin_err = ArgminError::NotImplemented { text: "fd test".to_string() };
            closure_err.replace(Some(argmin_err.into()));
            f64::NAN
        };

        // Act
        let result = run_fd_diff(&theta, &f, &closure_err);

        // Assert
        assert_eq!(result.unwrap_err(), OptError::NotImplemented { text: "fd test".to_string() });
    }

    #[test]
    fn run_fd_diff_rejects_non_finite_gradient() {
        let theta: Theta = array![0.0, 1.0];
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let result = run_fd_diff(&theta, &|_: &Theta| f64::NAN, &closure_err);
        assert!(matches!(result, Err(OptError::InvalidGradient { .. })));
    }

    #[test]
    // Purpose
    // -------
    // A gradient that is NaN everywhere fails both the central and the
    // forward path.
    fn compute_hessian_non_finite_entries_yield_invalidhessian_error() {
        let theta: Theta = array![0.0];
        let result = compute_hessian(&|_: &Theta| array![f64::NAN], &theta);
        assert!(matches!(result, Err(OptError::InvalidHessian { .. })));
    }

    #[test]
    fn symmetrize_hess_averages_off_diagonal_pairs() {
        let mut h: Hessian = Array2::from_shape_vec((2, 2), vec![1.0_f64, 2.0, 0.0, 3.0]).unwrap();
        symmetrize_hess(&mut h);
        assert_eq!(h, array![[1.0, 1.0], [1.0, 3.0]]);
    }

    #[test]
    // Purpose
    // -------
    // The cost curvature of a quadratic is recovered with the analytic
    // gradient and with the finite-difference gradient fallback.
    //
    // Expect
    // ------
    // - [[2, 3], [3, 8]] in both cases (looser tolerance for the nested
    //   differences).
    fn numerical_curvature_recovers_quadratic_form() {
        let theta = array![0.3, -0.7];
        let expected = array![[2.0, 3.0], [3.0, 8.0]];

        let exact = numerical_curvature(&Quadratic { analytic: true }, &theta, &()).unwrap();
        let nested = numerical_curvature(&Quadratic { analytic: false }, &theta, &()).unwrap();

        for ((i, j), &e) in expected.indexed_iter() {
            assert_relative_eq!(exact[[i, j]], e, max_relative = 1e-6);
            assert_relative_eq!(nested[[i, j]], e, max_relative = 1e-2);
        }
    }
}
