//! Configuration errors for network models (ingestion, design construction,
//! and parameter-vector shape checks).
//!
//! Every variant here is raised **before** any numerical work begins. None of
//! them is retried: a malformed table or an inconsistent design has to be
//! fixed by the caller.
//!
//! ## Conventions
//! - Indices are 0-based and refer to rows of the stacked `(group, category)`
//!   layout, i.e. row `g * J + j`.
//! - Column names are reported verbatim as they appear in the
//!   [`CovariateTable`](crate::model::table::CovariateTable).
use thiserror::Error;

/// Result alias for model construction and validation paths.
pub type ModelResult<T> = Result<T, ModelError>;

/// Unified configuration error for network models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    // ---- Table / ingestion ----
    /// A requested column is absent from the covariate table.
    #[error("Column '{name}' not found in covariate table")]
    MissingColumn { name: String },

    /// Two columns of the same table disagree on their length.
    #[error("Column '{name}' has {found} rows, expected {expected}")]
    ColumnLengthMismatch { name: String, expected: usize, found: usize },

    /// A column name was inserted twice.
    #[error("Column '{name}' is defined more than once")]
    DuplicateColumn { name: String },

    // ---- Response / grouping ----
    /// Response length does not equal `G * J`.
    #[error("Response has {found} entries, expected G*J = {groups}*{categories} = {expected}")]
    ResponseLengthMismatch { expected: usize, found: usize, groups: usize, categories: usize },

    /// A count is negative, fractional, or non-finite.
    #[error("Invalid count at row {index}: {value}; counts must be finite non-negative integers")]
    InvalidCount { index: usize, value: f64 },

    /// Rows of one group are not contiguous or not every group has `J` rows.
    #[error("Group '{group}' is split or unbalanced at row {index}")]
    UnbalancedGroups { group: String, index: usize },

    /// A category appears in a different position inside some group.
    #[error("Category '{category}' at row {index} breaks the per-group category order")]
    CategoryOrderMismatch { category: String, index: usize },

    /// `G`, `J`, or `K` is zero.
    #[error("Dimension '{what}' must be positive")]
    EmptyDimension { what: &'static str },

    // ---- Design ----
    /// A covariate entry is NaN or infinite.
    #[error("Covariate '{name}' has a non-finite value at row {index}: {value}")]
    NonFiniteCovariate { name: String, index: usize, value: f64 },

    /// Design matrix row count disagrees with `G * J`.
    #[error("Design has {found} rows, expected {expected}")]
    DesignRowMismatch { expected: usize, found: usize },

    /// Covariate-driven dispersion was requested without dispersion covariates.
    #[error("Dispersion covariate list is empty but the covariate-driven dispersion variant was selected")]
    EmptyDispersionCovariates,

    /// Dispersion covariates were supplied for a variant that does not use them.
    #[error("Dispersion covariates are only used by the 'dfunc' parameterization, got '{tag}'")]
    UnusedDispersionCovariates { tag: &'static str },

    /// Unknown dispersion-structure tag.
    #[error("Invalid dispersion structure '{tag}': valid options are 'gcl', 'dconst', 'dfunc', 'rconst'")]
    InvalidParameterization { tag: String },

    /// Unknown covariate kind in the simulation collaborator.
    #[error("Invalid covariate type '{tag}': valid options are 'continuous', 'binary', 'matching'")]
    InvalidCovariateKind { tag: String },

    /// Simulation setting out of range.
    #[error("Invalid simulation setting '{name}' = {value}: {reason}")]
    InvalidSimulationSetting { name: &'static str, value: f64, reason: &'static str },

    /// Fit option out of range.
    #[error("Invalid fit setting '{name}' = {value}: {reason}")]
    InvalidFitSetting { name: &'static str, value: f64, reason: &'static str },

    // ---- Parameter vectors ----
    /// Parameter vector length does not match `M`.
    #[error("Parameter vector length mismatch: expected {expected}, found {found}")]
    ThetaLengthMismatch { expected: usize, found: usize },

    /// Parameter entries must be finite on entry to the optimizer.
    #[error("Parameter at index {index} is non-finite: {value}")]
    NonFiniteTheta { index: usize, value: f64 },

    /// The analytic Hessian exists only for `rconst`.
    #[error("Analytic Hessian is only defined for 'rconst', got '{tag}'")]
    AnalyticHessianUnavailable { tag: &'static str },

    // ---- Initial-estimate collaborator ----
    /// The Poisson starting fit broke down.
    #[error("Poisson starting-value fit failed: {reason}")]
    StartFailed { reason: String },
}
