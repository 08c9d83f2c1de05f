//! Group-wise parallel reductions.
//!
//! Every network kernel has the same shape: slice the stacked rows of one
//! group, compute a per-group term, and add the terms up. Groups are
//! conditionally independent given the parameters, so the fold runs on the
//! rayon pool. Per-group closures only read shared data.
use ndarray::{Array1, Array2};
use rayon::prelude::*;

/// `Σ_g f(g)` for a scalar per-group term.
pub fn sum_over_groups<F>(n_groups: usize, f: F) -> f64
where
    F: Fn(usize) -> f64 + Sync + Send,
{
    (0..n_groups).into_par_iter().map(f).sum()
}

/// `Σ_g f(g)` for a per-group vector term of length `dim`.
pub fn sum_vec_over_groups<F>(n_groups: usize, dim: usize, f: F) -> Array1<f64>
where
    F: Fn(usize) -> Array1<f64> + Sync + Send,
{
    (0..n_groups)
        .into_par_iter()
        .fold(|| Array1::<f64>::zeros(dim), |acc, g| acc + &f(g))
        .reduce(|| Array1::<f64>::zeros(dim), |a, b| a + &b)
}

/// `Σ_g f(g)` for a per-group `dim × dim` matrix term.
pub fn sum_mat_over_groups<F>(n_groups: usize, dim: usize, f: F) -> Array2<f64>
where
    F: Fn(usize) -> Array2<f64> + Sync + Send,
{
    (0..n_groups)
        .into_par_iter()
        .fold(|| Array2::<f64>::zeros((dim, dim)), |acc, g| acc + &f(g))
        .reduce(|| Array2::<f64>::zeros((dim, dim)), |a, b| a + &b)
}
