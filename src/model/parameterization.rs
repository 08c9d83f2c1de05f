//! Dispersion structures supported by the network model.
//!
//! The parameterization is chosen once when a [`ModelSpec`] is built and is
//! dispatched with a single `match` in every numerical routine.
//!
//! [`ModelSpec`]: crate::model::spec::ModelSpec
use crate::model::errors::ModelError;
use std::{fmt, str::FromStr};

/// Closed set of model variants.
///
/// - `Gcl`: grouped conditional logit, no dispersion parameter.
/// - `DeltaConst`: Dirichlet-multinomial with one constant dispersion
///   coefficient entering the exponent through an intercept column.
/// - `DeltaFunc`: Dirichlet-multinomial whose dispersion is a log-linear
///   function of dispersion covariates (intercept + `Z`).
/// - `RhoConst`: Dirichlet-multinomial in intra-group correlation form with
///   a single `ρ ∈ (0, 1)`.
///
/// Parsing is case-insensitive and accepts the short tags (`"gcl"`,
/// `"dconst"`, `"dfunc"`, `"rconst"`) as well as the long snake-case names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameterization {
    Gcl,
    DeltaConst,
    DeltaFunc,
    RhoConst,
}

impl Parameterization {
    /// Short tag used in names and diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            Parameterization::Gcl => "gcl",
            Parameterization::DeltaConst => "dconst",
            Parameterization::DeltaFunc => "dfunc",
            Parameterization::RhoConst => "rconst",
        }
    }

    /// `true` for the variants whose dispersion enters the linear predictor.
    pub fn has_dispersion_design(&self) -> bool {
        matches!(self, Parameterization::DeltaConst | Parameterization::DeltaFunc)
    }

    /// `true` when an analytic Hessian is available.
    pub fn has_analytic_hessian(&self) -> bool {
        matches!(self, Parameterization::RhoConst)
    }
}

impl fmt::Display for Parameterization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Parameterization {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gcl" => Ok(Parameterization::Gcl),
            "dconst" | "delta_const" => Ok(Parameterization::DeltaConst),
            "dfunc" | "delta_func" => Ok(Parameterization::DeltaFunc),
            "rconst" | "rho_const" => Ok(Parameterization::RhoConst),
            _ => Err(ModelError::InvalidParameterization { tag: s.to_string() }),
        }
    }
}
