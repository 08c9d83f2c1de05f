//! ModelSpec — immutable description of one network fit.
//!
//! Purpose
//! -------
//! Hold the grouped counts, the rate and dispersion designs, and the chosen
//! [`Parameterization`] for a single fit. A `ModelSpec` is validated once at
//! construction and is read-only afterwards; the likelihood, gradient, and
//! Hessian kernels share it by reference (and across rayon workers).
//!
//! Key behaviors
//! -------------
//! - Build from an ingested [`CovariateTable`] ([`ModelSpec::from_table`]) or
//!   from ready-made arrays ([`ModelSpec::from_design`]).
//! - Derive `G`, `J`, the group totals `n_g`, and the per-group multinomial
//!   constant `lnΓ(n_g + 1) − Σ_j lnΓ(Y_gj + 1)`.
//! - Assemble the *linear design* `W` whose product with the parameter
//!   vector gives the linear predictor:
//!   - `gcl`, `rconst`: `W = X` (`K` columns; `ρ` is not a design column),
//!   - `dconst`: `W = [X | 1]`,
//!   - `dfunc`:  `W = [X | 1 | Z]`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `counts.len() == G * J`; rows are stacked group by group, each group
//!   holding its `J` categories in the same order.
//! - Counts are finite non-negative integers; covariates are finite.
//! - `n_params() == n_rate() + n_dispersion()` and coefficient names follow
//!   the parameter order: rate covariates, then dispersion coefficients.
//!
//! Conventions
//! -----------
//! - Row `r` belongs to group `r / J` and category `r % J`.
//! - For `rconst`, the last parameter is `ρ` on its natural scale.
use crate::{
    model::{
        errors::{ModelError, ModelResult},
        parameterization::Parameterization,
        table::{CovariateTable, GroupLayout},
    },
    optimization::numerical_stability::{ln_factorial, softmax},
};
use ndarray::{Array1, Array2, ArrayView1, Axis, concatenate, s};
use std::ops::Range;

/// Name of the dispersion intercept coefficient.
pub const DISPERSION_INTERCEPT: &str = "(dispersion)";

/// Name of the intra-group correlation coefficient.
pub const RHO_NAME: &str = "rho";

/// Immutable model description shared by every numerical kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    parameterization: Parameterization,
    n_groups: usize,
    n_categories: usize,
    counts: Array1<f64>,
    group_totals: Array1<f64>,
    log_multinomial: Array1<f64>,
    rate_design: Array2<f64>,
    dispersion_design: Option<Array2<f64>>,
    linear_design: Array2<f64>,
    coef_names: Vec<String>,
    group_labels: Vec<String>,
    category_labels: Vec<String>,
}

impl ModelSpec {
    /// Build a spec from an ingested covariate table.
    ///
    /// Parameters
    /// ----------
    /// - `table`: covariates plus group/category identifier columns.
    /// - `counts`: response, one count per table row.
    /// - `layout`: names of the group (pollinator) and category (plant)
    ///   identifier columns.
    /// - `covariates`: numeric columns forming the rate design `X`.
    /// - `parameterization`: dispersion structure.
    /// - `dispersion_covariates`: numeric columns forming `Z`; must be
    ///   non-empty for `dfunc` and empty otherwise.
    ///
    /// Errors
    /// ------
    /// - [`ModelError::MissingColumn`] when an identifier or covariate column
    ///   is absent (checked before anything else).
    /// - [`ModelError::EmptyDispersionCovariates`] for `dfunc` without `Z`.
    /// - [`ModelError::ResponseLengthMismatch`] when `counts.len() != G * J`.
    /// - [`ModelError::UnbalancedGroups`] / [`ModelError::CategoryOrderMismatch`]
    ///   when groups are split or categories are out of order.
    /// - Any error of [`ModelSpec::from_design`].
    pub fn from_table(
        table: &CovariateTable, counts: &[f64], layout: &GroupLayout, covariates: &[&str],
        parameterization: Parameterization, dispersion_covariates: &[&str],
    ) -> ModelResult<Self> {
        let groups = table.labels(&layout.group_column)?;
        let categories = table.labels(&layout.category_column)?;
        for name in covariates.iter().chain(dispersion_covariates.iter()) {
            table.numeric(name)?;
        }
        if parameterization == Parameterization::DeltaFunc && dispersion_covariates.is_empty() {
            return Err(ModelError::EmptyDispersionCovariates);
        }

        let group_labels = distinct_in_order(groups);
        let category_labels = distinct_in_order(categories);
        let (n_groups, n_categories) = (group_labels.len(), category_labels.len());
        let n_obs = n_groups * n_categories;
        if counts.len() != n_obs {
            return Err(ModelError::ResponseLengthMismatch {
                expected: n_obs,
                found: counts.len(),
                groups: n_groups,
                categories: n_categories,
            });
        }
        if table.n_rows() != n_obs {
            return Err(ModelError::UnbalancedGroups {
                group: group_labels.last().cloned().unwrap_or_default(),
                index: table.n_rows().min(n_obs),
            });
        }
        for (index, (group, category)) in groups.iter().zip(categories.iter()).enumerate() {
            if *group != group_labels[index / n_categories] {
                return Err(ModelError::UnbalancedGroups { group: group.clone(), index });
            }
            if *category != category_labels[index % n_categories] {
                return Err(ModelError::CategoryOrderMismatch { category: category.clone(), index });
            }
        }

        let rate_design = stack_columns(table, covariates, n_obs)?;
        let dispersion = if dispersion_covariates.is_empty() {
            None
        } else {
            Some(stack_columns(table, dispersion_covariates, n_obs)?)
        };
        let mut spec = Self::assemble(
            parameterization,
            n_groups,
            n_categories,
            Array1::from(counts.to_vec()),
            rate_design,
            dispersion,
            covariates.iter().map(|s| s.to_string()).collect(),
            dispersion_covariates.iter().map(|s| s.to_string()).collect(),
        )?;
        spec.group_labels = group_labels;
        spec.category_labels = category_labels;
        Ok(spec)
    }

    /// Build a spec from arrays already laid out group by group.
    ///
    /// Rate covariates are named `x1..xK` and dispersion covariates
    /// `z1..z(L-1)`.
    ///
    /// Errors
    /// ------
    /// - [`ModelError::EmptyDimension`] if `G`, `J`, or `K` is zero.
    /// - [`ModelError::ResponseLengthMismatch`], [`ModelError::InvalidCount`].
    /// - [`ModelError::DesignRowMismatch`], [`ModelError::NonFiniteCovariate`].
    /// - [`ModelError::EmptyDispersionCovariates`] /
    ///   [`ModelError::UnusedDispersionCovariates`] when `Z` does not match
    ///   the parameterization.
    pub fn from_design(
        parameterization: Parameterization, n_groups: usize, n_categories: usize,
        counts: Array1<f64>, rate_design: Array2<f64>, dispersion_covariates: Option<Array2<f64>>,
    ) -> ModelResult<Self> {
        let rate_names = (1..=rate_design.ncols()).map(|k| format!("x{k}")).collect();
        let disp_names = dispersion_covariates
            .as_ref()
            .map(|z| (1..=z.ncols()).map(|l| format!("z{l}")).collect())
            .unwrap_or_default();
        Self::assemble(
            parameterization,
            n_groups,
            n_categories,
            counts,
            rate_design,
            dispersion_covariates,
            rate_names,
            disp_names,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        parameterization: Parameterization, n_groups: usize, n_categories: usize,
        counts: Array1<f64>, rate_design: Array2<f64>, dispersion_covariates: Option<Array2<f64>>,
        rate_names: Vec<String>, dispersion_names: Vec<String>,
    ) -> ModelResult<Self> {
        if n_groups == 0 {
            return Err(ModelError::EmptyDimension { what: "G" });
        }
        if n_categories == 0 {
            return Err(ModelError::EmptyDimension { what: "J" });
        }
        if rate_design.ncols() == 0 {
            return Err(ModelError::EmptyDimension { what: "K" });
        }
        let n_obs = n_groups * n_categories;
        if counts.len() != n_obs {
            return Err(ModelError::ResponseLengthMismatch {
                expected: n_obs,
                found: counts.len(),
                groups: n_groups,
                categories: n_categories,
            });
        }
        if let Some((index, &value)) =
            counts.iter().enumerate().find(|(_, y)| !y.is_finite() || **y < 0.0 || y.fract() != 0.0)
        {
            return Err(ModelError::InvalidCount { index, value });
        }
        validate_design(&rate_design, &rate_names, n_obs)?;

        let dispersion_design = match (parameterization, dispersion_covariates) {
            (Parameterization::DeltaFunc, Some(z)) if z.ncols() > 0 => {
                validate_design(&z, &dispersion_names, n_obs)?;
                let ones = Array2::<f64>::ones((n_obs, 1));
                Some(concatenate![Axis(1), ones, z])
            }
            (Parameterization::DeltaFunc, _) => return Err(ModelError::EmptyDispersionCovariates),
            (other, Some(_)) => {
                return Err(ModelError::UnusedDispersionCovariates { tag: other.tag() });
            }
            (Parameterization::DeltaConst, None) => Some(Array2::<f64>::ones((n_obs, 1))),
            (Parameterization::Gcl | Parameterization::RhoConst, None) => None,
        };

        let linear_design = match &dispersion_design {
            Some(d) => concatenate![Axis(1), rate_design.view(), d.view()],
            None => rate_design.clone(),
        };

        let mut coef_names = rate_names;
        match parameterization {
            Parameterization::Gcl => {}
            Parameterization::DeltaConst => coef_names.push(DISPERSION_INTERCEPT.to_string()),
            Parameterization::DeltaFunc => {
                coef_names.push(DISPERSION_INTERCEPT.to_string());
                coef_names.extend(dispersion_names.iter().map(|z| format!("dispersion:{z}")));
            }
            Parameterization::RhoConst => coef_names.push(RHO_NAME.to_string()),
        }

        let group_totals: Array1<f64> = counts
            .exact_chunks(n_categories)
            .into_iter()
            .map(|chunk| chunk.sum())
            .collect();
        let log_multinomial: Array1<f64> = counts
            .exact_chunks(n_categories)
            .into_iter()
            .zip(group_totals.iter())
            .map(|(chunk, &n)| ln_factorial(n) - chunk.iter().map(|&y| ln_factorial(y)).sum::<f64>())
            .collect();

        Ok(Self {
            parameterization,
            n_groups,
            n_categories,
            counts,
            group_totals,
            log_multinomial,
            rate_design,
            dispersion_design,
            linear_design,
            coef_names,
            group_labels: (1..=n_groups).map(|g| format!("group{g}")).collect(),
            category_labels: (1..=n_categories).map(|j| format!("category{j}")).collect(),
        })
    }

    // ---- Accessors ----

    pub fn parameterization(&self) -> Parameterization {
        self.parameterization
    }

    /// Number of row-groups `G`.
    pub fn n_groups(&self) -> usize {
        self.n_groups
    }

    /// Number of categories per group `J`.
    pub fn n_categories(&self) -> usize {
        self.n_categories
    }

    /// Total observations `G * J`.
    pub fn n_obs(&self) -> usize {
        self.n_groups * self.n_categories
    }

    /// Number of rate coefficients `K`.
    pub fn n_rate(&self) -> usize {
        self.rate_design.ncols()
    }

    /// Number of dispersion coefficients `L`.
    pub fn n_dispersion(&self) -> usize {
        match self.parameterization {
            Parameterization::Gcl => 0,
            Parameterization::RhoConst => 1,
            Parameterization::DeltaConst | Parameterization::DeltaFunc => {
                self.dispersion_design.as_ref().map_or(0, |d| d.ncols())
            }
        }
    }

    /// Total free parameters `M = K + L`.
    pub fn n_params(&self) -> usize {
        self.n_rate() + self.n_dispersion()
    }

    pub fn counts(&self) -> ArrayView1<'_, f64> {
        self.counts.view()
    }

    /// Row sums `n_g`.
    pub fn group_totals(&self) -> ArrayView1<'_, f64> {
        self.group_totals.view()
    }

    /// Per-group `lnΓ(n_g + 1) − Σ_j lnΓ(Y_gj + 1)`.
    pub fn log_multinomial(&self) -> ArrayView1<'_, f64> {
        self.log_multinomial.view()
    }

    /// Rate design `X` (`GJ × K`).
    pub fn rate_design(&self) -> &Array2<f64> {
        &self.rate_design
    }

    /// Intercept-augmented dispersion design (`GJ × L`) for `dconst`/`dfunc`.
    pub fn dispersion_design(&self) -> Option<&Array2<f64>> {
        self.dispersion_design.as_ref()
    }

    /// Linear design `W` (see module docs).
    pub fn linear_design(&self) -> &Array2<f64> {
        &self.linear_design
    }

    pub fn coef_names(&self) -> &[String] {
        &self.coef_names
    }

    pub fn group_labels(&self) -> &[String] {
        &self.group_labels
    }

    pub fn category_labels(&self) -> &[String] {
        &self.category_labels
    }

    /// Row range of group `g` in the stacked layout.
    pub fn group_rows(&self, g: usize) -> Range<usize> {
        g * self.n_categories..(g + 1) * self.n_categories
    }

    // ---- Parameter helpers ----

    /// Validate a parameter vector: length `M` and finite entries.
    pub fn check_theta(&self, theta: ArrayView1<f64>) -> ModelResult<()> {
        if theta.len() != self.n_params() {
            return Err(ModelError::ThetaLengthMismatch {
                expected: self.n_params(),
                found: theta.len(),
            });
        }
        match theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            Some((index, &value)) => Err(ModelError::NonFiniteTheta { index, value }),
            None => Ok(()),
        }
    }

    /// Coefficients that multiply the linear design (all but `ρ` for `rconst`).
    pub fn linear_coefficients<'t>(&self, theta: ArrayView1<'t, f64>) -> ArrayView1<'t, f64> {
        let k = self.linear_design.ncols();
        theta.slice_move(s![..k])
    }

    /// Stacked linear predictor `η = W · θ_linear` (length `GJ`).
    pub fn linear_predictor(&self, theta: ArrayView1<f64>) -> Array1<f64> {
        self.linear_design.dot(&self.linear_coefficients(theta))
    }

    /// Fitted category composition `p_gj = e_gj / Σ_j e_gj` (`G × J`).
    pub fn fitted_probabilities(&self, theta: ArrayView1<f64>) -> Array2<f64> {
        let eta = self.linear_predictor(theta);
        let mut probs = Array2::<f64>::zeros((self.n_groups, self.n_categories));
        for (g, mut row) in probs.axis_iter_mut(Axis(0)).enumerate() {
            row.assign(&softmax(eta.slice(s![self.group_rows(g)])));
        }
        probs
    }
}

// ---- Helper methods ----

fn distinct_in_order(labels: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for label in labels {
        if !seen.contains(label) {
            seen.push(label.clone());
        }
    }
    seen
}

fn stack_columns(table: &CovariateTable, names: &[&str], n_obs: usize) -> ModelResult<Array2<f64>> {
    let mut design = Array2::<f64>::zeros((n_obs, names.len()));
    for (k, name) in names.iter().enumerate() {
        design.column_mut(k).assign(&table.numeric(name)?);
    }
    Ok(design)
}

fn validate_design(design: &Array2<f64>, names: &[String], n_obs: usize) -> ModelResult<()> {
    if design.nrows() != n_obs {
        return Err(ModelError::DesignRowMismatch { expected: n_obs, found: design.nrows() });
    }
    for ((index, k), &value) in design.indexed_iter() {
        if !value.is_finite() {
            let name = names.get(k).cloned().unwrap_or_else(|| format!("column {k}"));
            return Err(ModelError::NonFiniteCovariate { name, index, value });
        }
    }
    Ok(())
}
