//! simulation — synthetic pollinator–plant networks.
//!
//! Purpose
//! -------
//! Generate count networks with known structure for tests and examples:
//! relative abundances on both sides, a trait covariate per interaction,
//! and Poisson (optionally Poisson–Gamma) visit counts.
//!
//! Key behaviors
//! -------------
//! - Abundances are log-normal draws normalized to sum to one per side.
//! - The trait covariate `x_ij` is one of
//!   - `continuous`: `N(0, 1)` per pair,
//!   - `binary`: `Bernoulli(0.5)` per pair, coded `0`/`1`,
//!   - `matching`: `−|u_i − v_j|` for pollinator and plant traits
//!     `u_i, v_j ~ N(0, 1)`.
//! - Expected visits `λ_ij = effort · a_i · b_j · exp(β x_ij)`, multiplied by
//!   a mean-one `Gamma(k, 1/k)` draw when `gamma_shape = Some(k)`.
//! - Counts `Y_ij ~ Poisson(λ_ij)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Output rows are stacked pollinator by pollinator with plants in a fixed
//!   order, so the table feeds [`ModelSpec::from_table`] directly with the
//!   default [`GroupLayout`].
//! - The same settings and seed always give the same network.
//!
//! [`ModelSpec::from_table`]: crate::model::spec::ModelSpec::from_table
//! [`GroupLayout`]: crate::model::table::GroupLayout
use crate::model::{
    errors::{ModelError, ModelResult},
    table::CovariateTable,
};
use ndarray::Array1;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Bernoulli, Distribution, Gamma, LogNormal, Poisson, StandardNormal};
use std::str::FromStr;

/// Column holding `ln b_j`, the log relative abundance of the plant.
pub const LOG_ABUNDANCE_COLUMN: &str = "log_abundance";

/// Column holding the trait covariate `x_ij`.
pub const TRAIT_COLUMN: &str = "trait";

/// How the trait covariate is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CovariateKind {
    #[default]
    Continuous,
    Binary,
    Matching,
}

impl FromStr for CovariateKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "continuous" => Ok(CovariateKind::Continuous),
            "binary" => Ok(CovariateKind::Binary),
            "matching" => Ok(CovariateKind::Matching),
            _ => Err(ModelError::InvalidCovariateKind { tag: s.to_string() }),
        }
    }
}

/// Settings for [`simulate_network`].
///
/// - `n_pollinators`, `n_plants`: network dimensions (`G`, `J`).
/// - `abundance_sd`: log-scale standard deviation of the abundances.
/// - `effort`: expected total visits before trait effects.
/// - `trait_kind`, `trait_effect`: covariate generator and its coefficient.
/// - `gamma_shape`: shape of the mean-one Gamma rate multiplier; `None` for
///   plain Poisson counts.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    pub n_pollinators: usize,
    pub n_plants: usize,
    pub abundance_sd: f64,
    pub effort: f64,
    pub trait_kind: CovariateKind,
    pub trait_effect: f64,
    pub gamma_shape: Option<f64>,
}

impl SimulationSettings {
    /// Construct validated settings.
    ///
    /// # Errors
    /// [`ModelError::InvalidSimulationSetting`] for empty dimensions,
    /// negative or non-finite scales, or a non-positive Gamma shape.
    pub fn new(
        n_pollinators: usize, n_plants: usize, abundance_sd: f64, effort: f64,
        trait_kind: CovariateKind, trait_effect: f64, gamma_shape: Option<f64>,
    ) -> ModelResult<Self> {
        let settings = Self {
            n_pollinators,
            n_plants,
            abundance_sd,
            effort,
            trait_kind,
            trait_effect,
            gamma_shape,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> ModelResult<()> {
        let invalid = |name, value: f64, reason| {
            Err(ModelError::InvalidSimulationSetting { name, value, reason })
        };
        if self.n_pollinators == 0 {
            return invalid("n_pollinators", 0.0, "Must be at least one.");
        }
        if self.n_plants == 0 {
            return invalid("n_plants", 0.0, "Must be at least one.");
        }
        if !self.abundance_sd.is_finite() || self.abundance_sd < 0.0 {
            return invalid("abundance_sd", self.abundance_sd, "Must be finite and non-negative.");
        }
        if !self.effort.is_finite() || self.effort <= 0.0 {
            return invalid("effort", self.effort, "Must be finite and strictly positive.");
        }
        if !self.trait_effect.is_finite() {
            return invalid("trait_effect", self.trait_effect, "Must be finite.");
        }
        if let Some(shape) = self.gamma_shape {
            if !shape.is_finite() || shape <= 0.0 {
                return invalid("gamma_shape", shape, "Must be finite and strictly positive.");
            }
        }
        Ok(())
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            n_pollinators: 8,
            n_plants: 6,
            abundance_sd: 1.0,
            effort: 2_000.0,
            trait_kind: CovariateKind::Continuous,
            trait_effect: 0.5,
            gamma_shape: None,
        }
    }
}

/// A simulated network.
///
/// - `table`: `"pollinator"`, `"plant"`, [`LOG_ABUNDANCE_COLUMN`], and
///   [`TRAIT_COLUMN`] columns, one row per pair.
/// - `counts`: visit counts in the same row order.
/// - `rates`: the expected visits `λ_ij` the counts were drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedNetwork {
    pub table: CovariateTable,
    pub counts: Vec<f64>,
    pub rates: Array1<f64>,
}

/// Draw one network.
///
/// # Errors
/// - [`ModelError::InvalidSimulationSetting`] when `settings` are invalid
///   or a distribution cannot be built from them.
/// - Table construction errors (not expected for valid settings).
pub fn simulate_network(settings: &SimulationSettings, seed: u64) -> ModelResult<SimulatedNetwork> {
    settings.validate()?;
    let mut rng = StdRng::seed_from_u64(seed);
    let (n_pol, n_pl) = (settings.n_pollinators, settings.n_plants);

    let pollinator_abundance = relative_abundances(n_pol, settings.abundance_sd, &mut rng)?;
    let plant_abundance = relative_abundances(n_pl, settings.abundance_sd, &mut rng)?;
    let traits = trait_covariate(settings.trait_kind, n_pol, n_pl, &mut rng)?;
    let multiplier = match settings.gamma_shape {
        Some(shape) => Some(Gamma::new(shape, 1.0 / shape).map_err(|_| {
            ModelError::InvalidSimulationSetting {
                name: "gamma_shape",
                value: shape,
                reason: "Gamma distribution could not be built.",
            }
        })?),
        None => None,
    };

    let n_obs = n_pol * n_pl;
    let mut pollinators = Vec::with_capacity(n_obs);
    let mut plants = Vec::with_capacity(n_obs);
    let mut log_abundance = Vec::with_capacity(n_obs);
    let mut rates = Array1::<f64>::zeros(n_obs);
    let mut counts = Vec::with_capacity(n_obs);
    for i in 0..n_pol {
        for j in 0..n_pl {
            let r = i * n_pl + j;
            let mut rate = settings.effort
                * pollinator_abundance[i]
                * plant_abundance[j]
                * (settings.trait_effect * traits[r]).exp();
            if let Some(gamma) = &multiplier {
                rate *= gamma.sample(&mut rng);
            }
            rates[r] = rate;
            counts.push(poisson_draw(rate, &mut rng)?);
            pollinators.push(format!("pollinator{}", i + 1));
            plants.push(format!("plant{}", j + 1));
            log_abundance.push(plant_abundance[j].ln());
        }
    }

    let table = CovariateTable::new()
        .with_labels("pollinator", pollinators)?
        .with_labels("plant", plants)?
        .with_numeric(LOG_ABUNDANCE_COLUMN, log_abundance)?
        .with_numeric(TRAIT_COLUMN, traits)?;
    Ok(SimulatedNetwork { table, counts, rates })
}

// ---- Helper methods ----

fn relative_abundances(n: usize, sd: f64, rng: &mut StdRng) -> ModelResult<Vec<f64>> {
    let dist = LogNormal::new(0.0, sd).map_err(|_| ModelError::InvalidSimulationSetting {
        name: "abundance_sd",
        value: sd,
        reason: "Log-normal distribution could not be built.",
    })?;
    let draws: Vec<f64> = (0..n).map(|_| dist.sample(rng)).collect();
    let total: f64 = draws.iter().sum();
    Ok(draws.into_iter().map(|d| d / total).collect())
}

fn trait_covariate(
    kind: CovariateKind, n_pol: usize, n_pl: usize, rng: &mut StdRng,
) -> ModelResult<Vec<f64>> {
    let n_obs = n_pol * n_pl;
    match kind {
        CovariateKind::Continuous => Ok((0..n_obs).map(|_| rng.sample(StandardNormal)).collect()),
        CovariateKind::Binary => {
            let coin = Bernoulli::new(0.5).map_err(|_| ModelError::InvalidSimulationSetting {
                name: "binary_probability",
                value: 0.5,
                reason: "Bernoulli distribution could not be built.",
            })?;
            Ok((0..n_obs).map(|_| if coin.sample(rng) { 1.0 } else { 0.0 }).collect())
        }
        CovariateKind::Matching => {
            let u: Vec<f64> = (0..n_pol).map(|_| rng.sample(StandardNormal)).collect();
            let v: Vec<f64> = (0..n_pl).map(|_| rng.sample(StandardNormal)).collect();
            Ok(u.iter().flat_map(|ui| v.iter().map(move |vj| -(ui - vj).abs())).collect())
        }
    }
}

fn poisson_draw(rate: f64, rng: &mut StdRng) -> ModelResult<f64> {
    if rate <= 0.0 {
        return Ok(0.0);
    }
    let dist = Poisson::new(rate).map_err(|_| ModelError::InvalidSimulationSetting {
        name: "rate",
        value: rate,
        reason: "Expected visits must be finite and positive.",
    })?;
    Ok(dist.sample(rng))
}
