//! Integration tests for network model fitting and inference.
//!
//! Purpose
//! -------
//! - Validate the end-to-end pipeline: from a covariate table or design
//!   arrays, through `ModelSpec` construction and maximum-likelihood fitting,
//!   to the Wald inference report.
//! - Exercise closed-form optima on tiny networks and realistic simulated
//!   networks with known trait effects.
//!
//! Coverage
//! --------
//! - `model`:
//!   - `ModelSpec::from_design` / `from_table` for `gcl`, `dconst`, `dfunc`,
//!     and `rconst`.
//!   - Log-likelihood behavior at the `ρ` boundary.
//! - `estimation`:
//!   - `Estimator::fit` with BFGS and Nelder–Mead, including `rconst` fits
//!     through a gradient method.
//!   - The analytic-Hessian fallback on a numerically singular curvature.
//! - `inference`:
//!   - Standard errors for identified fits, "NA" rows for singular ones.
//! - `simulation`:
//!   - Simulated networks feeding the fitting pipeline.
//!
//! Exclusions
//! ----------
//! - Kernel-level derivative checks and optimizer plumbing; those are
//!   covered by unit tests.
use approx::assert_relative_eq;
use bipartite_dm::{
    estimation::{CurvatureSource, Estimator, FitOptions},
    inference::errors::InferenceError,
    model::{
        CovariateTable, GroupLayout, ModelSpec, Parameterization, likelihood::log_likelihood,
    },
    optimization::loglik_optimizer::{MLEOptions, OptimMethod},
    simulation::{
        LOG_ABUNDANCE_COLUMN, SimulationSettings, TRAIT_COLUMN, simulate_network,
    },
};
use ndarray::{Array1, Array2, array};

// ---- Helper methods ----

fn estimator(method: OptimMethod) -> Estimator {
    Estimator::new(FitOptions::with_mle(MLEOptions::with_method(method)))
}

/// G = 3 pollinators × J = 4 plants with a plant-level trait; the `rconst`
/// optimum is interior at β̂ ≈ −0.91, ρ̂ ≈ 0.163.
fn rconst_network(n_copies: usize) -> ModelSpec {
    let counts: Array1<f64> =
        array![4.0, 0.0, 2.0, 1.0, 0.0, 3.0, 3.0, 0.0, 5.0, 1.0, 0.0, 2.0];
    let x = Array2::from_shape_fn((12, n_copies), |(r, _)| (r % 4) as f64 * 0.25 - 0.3);
    ModelSpec::from_design(Parameterization::RhoConst, 3, 4, counts, x, None).unwrap()
}

#[test]
// Purpose
// -------
// A single-group GCL fit reproduces the observed composition.
//
// Given
// -----
// - G = 1, J = 2, Y = [3, 7], x = [0, 1].
//
// Expect
// ------
// - β̂ = ln(7/3) and fitted probabilities [0.3, 0.7].
// - Standard errors are available.
fn gcl_single_group_matches_observed_shares() {
    // Arrange
    let x = Array2::from_shape_vec((2, 1), vec![0.0, 1.0]).unwrap();
    let spec =
        ModelSpec::from_design(Parameterization::Gcl, 1, 2, array![3.0, 7.0], x, None).unwrap();

    // Act
    let fit = estimator(OptimMethod::Bfgs).fit(&spec).unwrap();
    let report = fit.report(1.96);

    // Assert
    assert_eq!(fit.convergence_code(), 0, "{}", fit.message);
    assert_relative_eq!(fit.theta_hat[0], (7.0f64 / 3.0).ln(), epsilon = 1e-4);
    let probs = spec.fitted_probabilities(fit.theta_hat.view());
    assert_relative_eq!(probs[[0, 0]], 0.3, epsilon = 1e-4);
    assert_relative_eq!(probs[[0, 1]], 0.7, epsilon = 1e-4);
    assert!(report.has_standard_errors());
    // Var(β̂) = 1 / (n p (1 − p)) = 1 / 2.1.
    let se = report.coefficients[0].wald.clone().unwrap().std_error;
    assert_relative_eq!(se, (1.0f64 / 2.1).sqrt(), epsilon = 1e-3);
}

#[test]
// Purpose
// -------
// A covariate that is constant within every group is not identified by
// GCL: the curvature is singular and the report degrades gracefully.
fn unidentified_covariate_reports_unavailable_standard_errors() {
    let x = Array2::from_shape_vec((2, 1), vec![1.0, 1.0]).unwrap();
    let spec =
        ModelSpec::from_design(Parameterization::Gcl, 1, 2, array![3.0, 7.0], x, None).unwrap();

    let fit = estimator(OptimMethod::NelderMead).fit(&spec).unwrap();
    let report = fit.report(1.96);

    assert!(fit.theta_hat.iter().all(|v| v.is_finite()));
    assert!(!report.has_standard_errors());
    assert!(matches!(report.coefficients[0].wald, Err(InferenceError::SingularCurvature)));
    assert_relative_eq!(report.log_likelihood, fit.log_likelihood());
    assert!(report.rounded().to_string().contains("NA"));
}

#[test]
// Purpose
// -------
// `ρ` outside the open unit interval is infeasible; interior values are not.
fn rconst_loglik_is_infeasible_outside_unit_interval() {
    // Arrange
    let spec = rconst_network(1);

    // Act / Assert
    for rho in [0.0, 1.0, -0.2, 1.5] {
        let ll = log_likelihood(array![0.2, rho].view(), &spec);
        assert_eq!(ll, f64::NEG_INFINITY, "rho = {rho}");
    }
    assert!(log_likelihood(array![0.2, 0.3].view(), &spec).is_finite());
}

#[test]
// Purpose
// -------
// BFGS fits `rconst` end to end: its line searches never leave ρ ∈ (0, 1),
// and the reported estimate and standard errors are for ρ itself.
//
// Given
// -----
// - The 3 × 4 network, Poisson start with ρ seeded at 0.1.
//
// Expect
// ------
// - Convergence code 0 at β̂ ≈ −0.91, ρ̂ ≈ 0.163 with standard errors.
fn rconst_bfgs_fit_reaches_interior_optimum() {
    // Arrange
    let spec = rconst_network(1);

    // Act
    let fit = estimator(OptimMethod::Bfgs).fit(&spec).unwrap();
    let report = fit.report(1.96);

    // Assert
    assert_eq!(fit.convergence_code(), 0, "{}", fit.message);
    assert!((fit.theta_hat[0] + 0.91).abs() < 0.02, "{}", fit.theta_hat);
    assert!((fit.theta_hat[1] - 0.163).abs() < 0.01, "{}", fit.theta_hat);
    assert_relative_eq!(fit.log_likelihood(), -14.0346, epsilon = 1e-3);
    assert_eq!(fit.curvature_source, CurvatureSource::Numerical);
    assert!(report.has_standard_errors());
    let rho = report.coefficient("rho").unwrap().wald.clone().unwrap();
    assert!(rho.std_error > 0.0 && rho.std_error < 1.0);
}

#[test]
// Purpose
// -------
// A duplicated covariate makes the finite-difference curvature singular up
// to rounding noise. For `rconst` the estimator then switches to the
// analytic Hessian, which is singular as well, so the report degrades to
// "NA" while the identified quantities are still estimated.
//
// Given
// -----
// - The 3 × 4 network with its trait column entered twice.
//
// Expect
// ------
// - Analytic curvature source and no standard errors.
// - β̂₁ + β̂₂ and ρ̂ match the single-column fit.
fn duplicated_covariate_triggers_analytic_hessian_fallback() {
    // Arrange
    let spec = rconst_network(2);

    // Act
    let fit = estimator(OptimMethod::Bfgs).fit(&spec).unwrap();
    let report = fit.report(1.96);

    // Assert
    assert_eq!(fit.convergence_code(), 0, "{}", fit.message);
    assert_eq!(fit.curvature_source, CurvatureSource::Analytic);
    assert!(!report.has_standard_errors());
    assert_eq!(report.covariance, Err(InferenceError::SingularCurvature));
    assert!((fit.theta_hat[0] + fit.theta_hat[1] + 0.91).abs() < 0.02, "{}", fit.theta_hat);
    assert!((fit.theta_hat[2] - 0.163).abs() < 0.01, "{}", fit.theta_hat);
}

#[test]
// Purpose
// -------
// An intercept-only `dconst` fit from Poisson starts converges and improves
// on the starting log-likelihood. The profile in `β + δ` peaks near 3,
// well away from the Poisson start ln(3.5).
fn dconst_fit_improves_on_start() {
    let counts = array![2.0, 4.0, 6.0, 1.0, 3.0, 5.0];
    let x = Array2::ones((6, 1));
    let spec =
        ModelSpec::from_design(Parameterization::DeltaConst, 2, 3, counts, x, None).unwrap();

    let fit = estimator(OptimMethod::Bfgs).fit(&spec).unwrap();

    assert_eq!(fit.convergence_code(), 0, "{}", fit.message);
    assert!(fit.log_likelihood() > fit.start_log_likelihood);
    assert_relative_eq!(fit.theta_hat.sum(), 3.0, epsilon = 0.5);
}

#[test]
// Purpose
// -------
// GCL on a simulated Poisson network recovers the plant-abundance
// coefficient (1) and the trait effect.
//
// Given
// -----
// - 8 pollinators × 6 plants, large sampling effort, trait effect 0.5.
//
// Expect
// ------
// - Estimates within a loose band of the truth; standard errors available.
fn gcl_recovers_simulated_trait_effect() {
    // Arrange
    let settings = SimulationSettings { effort: 20_000.0, ..Default::default() };
    let network = simulate_network(&settings, 2024).unwrap();
    let spec = ModelSpec::from_table(
        &network.table,
        &network.counts,
        &GroupLayout::default(),
        &[LOG_ABUNDANCE_COLUMN, TRAIT_COLUMN],
        Parameterization::Gcl,
        &[],
    )
    .unwrap();

    // Act
    let estimator = estimator(OptimMethod::Bfgs);
    let fit = estimator.fit(&spec).unwrap();
    let report = estimator.report(&fit);

    // Assert
    assert_eq!(fit.convergence_code(), 0, "{}", fit.message);
    let abundance = report.coefficient(LOG_ABUNDANCE_COLUMN).unwrap();
    let trait_row = report.coefficient(TRAIT_COLUMN).unwrap();
    assert!((abundance.estimate - 1.0).abs() < 0.3, "{}", abundance.estimate);
    assert!((trait_row.estimate - 0.5).abs() < 0.2, "{}", trait_row.estimate);
    assert!(report.has_standard_errors());
}

#[test]
// Purpose
// -------
// Overdispersed simulated counts fit under `dconst` and `dfunc` from a
// table, keeping finite estimates and never losing likelihood.
fn dm_variants_fit_simulated_overdispersed_network() {
    let settings = SimulationSettings { gamma_shape: Some(2.0), ..Default::default() };
    let network = simulate_network(&settings, 7).unwrap();
    let layout = GroupLayout::default();
    let covariates = [LOG_ABUNDANCE_COLUMN, TRAIT_COLUMN];

    let dconst = ModelSpec::from_table(
        &network.table,
        &network.counts,
        &layout,
        &covariates,
        Parameterization::DeltaConst,
        &[],
    )
    .unwrap();
    let dfunc = ModelSpec::from_table(
        &network.table,
        &network.counts,
        &layout,
        &[TRAIT_COLUMN],
        Parameterization::DeltaFunc,
        &[LOG_ABUNDANCE_COLUMN],
    )
    .unwrap();

    for spec in [&dconst, &dfunc] {
        let fit = estimator(OptimMethod::Bfgs).fit(spec).unwrap();
        assert_eq!(fit.theta_hat.len(), spec.n_params());
        assert_eq!(fit.coef_names.len(), spec.n_params());
        assert!(fit.theta_hat.iter().all(|v| v.is_finite()));
        assert!(fit.log_likelihood() >= fit.start_log_likelihood - 1e-9);
    }
}

#[test]
// Purpose
// -------
// Table ingestion rejects a table whose groups are split.
fn split_groups_are_rejected() {
    let table = CovariateTable::new()
        .with_labels("pollinator", vec!["a", "b", "a", "b"])
        .unwrap()
        .with_labels("plant", vec!["p", "p", "q", "q"])
        .unwrap()
        .with_numeric("trait", vec![0.1, 0.2, 0.3, 0.4])
        .unwrap();

    let err = ModelSpec::from_table(
        &table,
        &[1.0, 2.0, 3.0, 4.0],
        &GroupLayout::default(),
        &["trait"],
        Parameterization::Gcl,
        &[],
    )
    .unwrap_err();

    assert!(err.to_string().contains("split or unbalanced"), "{err}");
}
