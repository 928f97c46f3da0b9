//! S(alpha,beta) thermal scattering law.
//!
//! Grounded the same way `multipole.rs` is: plain structs, `Vec` fields,
//! colocated tests, and the binary-search/interpolation helpers from
//! `utilities.rs` reused directly rather than reinvented.

use crate::cache::MicroCacheEntry;
use crate::config::{Config, TemperatureMethod};
use crate::rng::RandomStream;
use crate::utilities::{find_interval_bitwise_f64, stochastic_temperature_index};

/// Elastic-scattering branch a S(a,b) sub-table was evaluated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SabElasticMode {
    /// Bragg-edge coherent elastic: `P` is a cumulative step function,
    /// divided by `E` rather than interpolated.
    CoherentExact,
    /// Incoherent elastic: `P` is linearly interpolated in `E` like any
    /// other tabulated cross section.
    Incoherent,
}

/// One temperature's worth of S(a,b) data.
#[derive(Debug, Clone)]
pub struct SabTemperature {
    pub inelastic_energy: Vec<f64>,
    pub inelastic_xs: Vec<f64>,
    pub elastic_energy: Vec<f64>,
    pub elastic_p: Vec<f64>,
    pub elastic_mode: SabElasticMode,
    pub threshold_inelastic: f64,
    pub threshold_elastic: f64,
}

/// Thermal scattering law table for one bound-scatterer nuclide.
#[derive(Debug, Clone)]
pub struct SabTable {
    pub kts: Vec<f64>,
    pub temperatures: Vec<SabTemperature>,
}

impl SabTable {
    /// Validate ascending `kTs` and matching `temperatures` length.
    pub fn new(kts: Vec<f64>, temperatures: Vec<SabTemperature>) -> Result<Self, String> {
        if kts.len() != temperatures.len() {
            return Err(format!(
                "SabTable: {} kTs but {} temperature tables",
                kts.len(),
                temperatures.len()
            ));
        }
        if kts.windows(2).any(|w| w[0] >= w[1]) {
            return Err("SabTable: kTs must be strictly ascending".to_string());
        }
        Ok(SabTable { kts, temperatures })
    }
}

fn select_nearest(kts: &[f64], kt: f64, tolerance_kt: f64) -> usize {
    for (i, &kt_i) in kts.iter().enumerate() {
        if (kt_i - kt).abs() < tolerance_kt {
            return i;
        }
    }
    crate::utilities::nearest_temperature_index(kts, kt)
}

/// Result of evaluating a S(a,b) table, before it is folded into the host
/// nuclide's cache entry.
#[derive(Debug, Clone, Copy, Default)]
struct SabXs {
    inelastic: f64,
    elastic: f64,
}

fn evaluate_sab_temperature(sub: &SabTemperature, e: f64) -> SabXs {
    let inelastic = if sub.inelastic_energy.len() < 2 {
        sub.inelastic_xs.first().copied().unwrap_or(0.0)
    } else if e < sub.inelastic_energy[0] {
        sub.inelastic_xs[0]
    } else if e >= *sub.inelastic_energy.last().unwrap() {
        *sub.inelastic_xs.last().unwrap()
    } else {
        let i = find_interval_bitwise_f64(&sub.inelastic_energy, e);
        let f = (e - sub.inelastic_energy[i]) / (sub.inelastic_energy[i + 1] - sub.inelastic_energy[i]);
        (1.0 - f) * sub.inelastic_xs[i] + f * sub.inelastic_xs[i + 1]
    };

    let elastic = if e >= sub.threshold_elastic || sub.elastic_energy.is_empty() {
        0.0
    } else {
        match sub.elastic_mode {
            SabElasticMode::CoherentExact => {
                if e < sub.elastic_energy[0] {
                    0.0
                } else {
                    let i = if sub.elastic_energy.len() < 2 {
                        0
                    } else if e >= *sub.elastic_energy.last().unwrap() {
                        sub.elastic_energy.len() - 1
                    } else {
                        find_interval_bitwise_f64(&sub.elastic_energy, e)
                    };
                    sub.elastic_p[i] / e
                }
            }
            SabElasticMode::Incoherent => {
                if sub.elastic_energy.len() < 2 {
                    sub.elastic_p.first().copied().unwrap_or(0.0)
                } else if e < sub.elastic_energy[0] {
                    sub.elastic_p[0]
                } else if e >= *sub.elastic_energy.last().unwrap() {
                    *sub.elastic_p.last().unwrap()
                } else {
                    let i = find_interval_bitwise_f64(&sub.elastic_energy, e);
                    let f = (e - sub.elastic_energy[i])
                        / (sub.elastic_energy[i + 1] - sub.elastic_energy[i]);
                    (1.0 - f) * sub.elastic_p[i] + f * sub.elastic_p[i + 1]
                }
            }
        }
    };

    SabXs { inelastic, elastic }
}

/// `SabEval`: rewrites the host nuclide's `total`/`elastic`
/// cache fields in place given the already-recomputed free-atom elastic
/// cross section at `(e, sqrt_kt)`.
pub fn calculate_sab_xs<R: RandomStream + ?Sized>(
    table: &SabTable,
    cache: &mut MicroCacheEntry,
    index_sab: usize,
    sab_frac: f64,
    e: f64,
    sqrt_kt: f64,
    elastic_free: f64,
    config: &Config,
    rng: &mut R,
) {
    cache.index_sab = Some(index_sab);
    cache.sab_frac = sab_frac;
    let kt = sqrt_kt * sqrt_kt;

    let i_temp = match config.temperature_method {
        TemperatureMethod::Nearest => {
            select_nearest(&table.kts, kt, crate::config::K_BOLTZMANN * config.temperature_tolerance)
        }
        TemperatureMethod::Interpolated => stochastic_temperature_index(&table.kts, kt, rng),
    };
    cache.index_temp_sab = Some(i_temp);

    let sub = &table.temperatures[i_temp];
    let xs = evaluate_sab_temperature(sub, e);

    let thermal = sab_frac * (xs.elastic + xs.inelastic);
    let thermal_elastic = sab_frac * xs.elastic;

    cache.total = cache.total + thermal - sab_frac * elastic_free;
    cache.elastic = Some(thermal + (1.0 - sab_frac) * elastic_free);
    cache.thermal = thermal;
    cache.thermal_elastic = thermal_elastic;
}
