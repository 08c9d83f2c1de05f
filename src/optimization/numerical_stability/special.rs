//! Special functions for Dirichlet-multinomial kernels.
//!
//! The likelihood, score, and curvature of the network models only ever use
//! log-gamma, digamma, and trigamma through *rising differences* of the form
//! `f(a + y) − f(a)` with a non-negative integer `y` (a count or a group
//! total). For moderate `y` these are evaluated as finite sums,
//!
//! - `lnΓ(a + y) − lnΓ(a) = Σ_{i<y} ln(a + i)`
//! - `ψ(a + y) − ψ(a)     = Σ_{i<y} 1 / (a + i)`
//! - `ψ'(a + y) − ψ'(a)   = −Σ_{i<y} 1 / (a + i)²`
//!
//! which avoids cancellation when `a` is very large (near-multinomial fits)
//! and gives exact zeros for `y = 0`. Above [`RISING_SUM_CUTOFF`] the
//! `statrs` special functions are differenced directly.
//!
//! Non-finite inputs are passed through arithmetically (`a = 0` yields
//! `−∞`, `a = ∞` yields `∞` or `NaN`), so callers can detect infeasible
//! parameter values by checking the final objective for finiteness.
use statrs::function::gamma::{digamma, ln_gamma};
use std::f64::consts::PI;

/// Largest count for which rising differences are summed term by term.
pub const RISING_SUM_CUTOFF: f64 = 128.0;

/// Argument above which the trigamma asymptotic series is used.
const TRIGAMMA_ASYMPTOTIC_CUTOFF: f64 = 10.0;

/// Trigamma function `ψ'(x)`.
///
/// Uses the recurrence `ψ'(x) = ψ'(x + 1) + 1/x²` to shift the argument
/// above a cutoff, followed by the Bernoulli asymptotic series. Negative
/// non-integer arguments go through the reflection formula; poles at
/// non-positive integers return `+∞`.
pub fn trigamma(x: f64) -> f64 {
    if x.is_nan() || x == f64::NEG_INFINITY {
        return f64::NAN;
    }
    if x == f64::INFINITY {
        return 0.0;
    }
    if x <= 0.0 {
        if x == x.floor() {
            return f64::INFINITY;
        }
        let s = (PI * x).sin();
        return PI * PI / (s * s) - trigamma(1.0 - x);
    }
    let mut acc = 0.0;
    let mut z = x;
    while z < TRIGAMMA_ASYMPTOTIC_CUTOFF {
        acc += 1.0 / (z * z);
        z += 1.0;
    }
    let inv = 1.0 / z;
    let inv2 = inv * inv;
    let tail = inv2
        * inv
        * (1.0 / 6.0 - inv2 * (1.0 / 30.0 - inv2 * (1.0 / 42.0 - inv2 * (1.0 / 30.0 - inv2 * 5.0 / 66.0))));
    acc + inv + 0.5 * inv2 + tail
}

/// `lnΓ(a + n) − lnΓ(a)` for a non-negative integer `n`.
pub fn ln_gamma_rising(a: f64, n: f64) -> f64 {
    if n == 0.0 {
        return 0.0;
    }
    if n <= RISING_SUM_CUTOFF {
        (0..n as usize).map(|i| (a + i as f64).ln()).sum()
    } else {
        ln_gamma(a + n) - ln_gamma(a)
    }
}

/// `ψ(a + n) − ψ(a)` for a non-negative integer `n`.
pub fn digamma_rising(a: f64, n: f64) -> f64 {
    if n == 0.0 {
        return 0.0;
    }
    if n <= RISING_SUM_CUTOFF {
        (0..n as usize).map(|i| 1.0 / (a + i as f64)).sum()
    } else {
        digamma(a + n) - digamma(a)
    }
}

/// `ψ'(a + n) − ψ'(a)` for a non-negative integer `n`.
pub fn trigamma_rising(a: f64, n: f64) -> f64 {
    if n == 0.0 {
        return 0.0;
    }
    if n <= RISING_SUM_CUTOFF {
        -(0..n as usize)
            .map(|i| {
                let t = a + i as f64;
                1.0 / (t * t)
            })
            .sum::<f64>()
    } else {
        trigamma(a + n) - trigamma(a)
    }
}

/// `lnΓ(y + 1)` for a count `y`.
pub fn ln_factorial(y: f64) -> f64 {
    ln_gamma(y + 1.0)
}
