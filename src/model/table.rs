//! In-memory covariate table used as the ingestion input for [`ModelSpec`].
//!
//! The table holds named numeric columns (covariates) and named label
//! columns (group and category identifiers). All columns share one row
//! count, fixed by the first column inserted.
//!
//! [`ModelSpec`]: crate::model::spec::ModelSpec
use crate::model::errors::{ModelError, ModelResult};
use ndarray::{Array1, ArrayView1};

/// Names of the identifier columns that define the bipartite layout.
///
/// - `group_column`: row-group identifier (pollinator), default `"pollinator"`.
/// - `category_column`: category identifier (plant), default `"plant"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLayout {
    pub group_column: String,
    pub category_column: String,
}

impl GroupLayout {
    pub fn new(group_column: impl Into<String>, category_column: impl Into<String>) -> Self {
        Self { group_column: group_column.into(), category_column: category_column.into() }
    }
}

impl Default for GroupLayout {
    fn default() -> Self {
        Self::new("pollinator", "plant")
    }
}

/// Column-oriented table of numeric covariates and string identifiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CovariateTable {
    n_rows: Option<usize>,
    numeric: Vec<(String, Array1<f64>)>,
    labels: Vec<(String, Vec<String>)>,
}

impl CovariateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a numeric column.
    ///
    /// # Errors
    /// - [`ModelError::DuplicateColumn`] if the name is taken.
    /// - [`ModelError::ColumnLengthMismatch`] if the length disagrees with
    ///   earlier columns.
    pub fn with_numeric(mut self, name: &str, values: Vec<f64>) -> ModelResult<Self> {
        self.register(name, values.len())?;
        self.numeric.push((name.to_string(), Array1::from(values)));
        Ok(self)
    }

    /// Add a label (identifier) column. Same error rules as [`with_numeric`].
    ///
    /// [`with_numeric`]: CovariateTable::with_numeric
    pub fn with_labels<S: Into<String>>(mut self, name: &str, values: Vec<S>) -> ModelResult<Self> {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        self.register(name, values.len())?;
        self.labels.push((name.to_string(), values));
        Ok(self)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows.unwrap_or(0)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.numeric.iter().any(|(n, _)| n == name) || self.labels.iter().any(|(n, _)| n == name)
    }

    /// Borrow a numeric column by name.
    pub fn numeric(&self, name: &str) -> ModelResult<ArrayView1<'_, f64>> {
        self.numeric
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, col)| col.view())
            .ok_or_else(|| ModelError::MissingColumn { name: name.to_string() })
    }

    /// Borrow a label column by name.
    pub fn labels(&self, name: &str) -> ModelResult<&[String]> {
        self.labels
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, col)| col.as_slice())
            .ok_or_else(|| ModelError::MissingColumn { name: name.to_string() })
    }

    fn register(&mut self, name: &str, len: usize) -> ModelResult<()> {
        if self.has_column(name) {
            return Err(ModelError::DuplicateColumn { name: name.to_string() });
        }
        match self.n_rows {
            Some(expected) if expected != len => Err(ModelError::ColumnLengthMismatch {
                name: name.to_string(),
                expected,
                found: len,
            }),
            Some(_) => Ok(()),
            None => {
                self.n_rows = Some(len);
                Ok(())
            }
        }
    }
}
