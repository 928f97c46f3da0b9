//! Unresolved-resonance probability tables.
//!
//! Same grounding approach as `sab.rs`: the shapes follow the underlying
//! data model directly while the surrounding code (plain structs,
//! `Result<T, String>` construction, colocated tests) keeps the rest of
//! the crate's idiom.

use crate::cache::MicroCacheEntry;
use crate::nu::{Nu, NuMode};
use crate::reaction::DepletionReaction;
use crate::rng::{urr_prn, RandomStream};

/// How a URR table's bands interpolate between two energy rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrrInterp {
    LinearLinear,
    LogLog,
}

/// One band of a cumulative probability table row: its upper cumulative
/// probability and the three sampled channel values at that band.
#[derive(Debug, Clone, Copy)]
pub struct UrrBand {
    pub cum_prob: f64,
    pub elastic: f64,
    pub fission: f64,
    pub capture: f64,
}

/// One temperature's URR probability table.
#[derive(Debug, Clone)]
pub struct UrrTemperature {
    /// Ascending incident-energy grid the bands are rowed by.
    pub energy: Vec<f64>,
    /// `bands[i]` are this temperature's bands at `energy[i]`, sorted by
    /// ascending `cum_prob` (the last band's `cum_prob` is 1.0).
    pub bands: Vec<Vec<UrrBand>>,
    pub interp: UrrInterp,
    /// MT of the nuclide's own tabulated inelastic reaction this table
    /// designates, if any. `None` means the URR range has no competing
    /// inelastic channel.
    pub inelastic_mt: Option<i32>,
    /// Whether sampled channels multiply a smooth background rather than
    /// standing alone.
    pub multiply_smooth: bool,
    /// Smooth-background absorption/fission per energy row, consulted only
    /// when `multiply_smooth` is set.
    pub smooth_absorption: Vec<f64>,
    pub smooth_fission: Vec<f64>,
}

/// Unresolved-resonance probability table data for one nuclide.
#[derive(Debug, Clone)]
pub struct UrrTable {
    pub kts: Vec<f64>,
    pub temperatures: Vec<UrrTemperature>,
}

impl UrrTable {
    pub fn new(kts: Vec<f64>, temperatures: Vec<UrrTemperature>) -> Result<Self, String> {
        if kts.len() != temperatures.len() {
            return Err(format!(
                "UrrTable: {} kTs but {} temperature tables",
                kts.len(),
                temperatures.len()
            ));
        }
        for (i, t) in temperatures.iter().enumerate() {
            if t.energy.len() < 2 {
                return Err(format!("UrrTable: temperature {} needs >= 2 energy rows", i));
            }
            if t.bands.len() != t.energy.len() {
                return Err(format!(
                    "UrrTable: temperature {} has {} energy rows but {} band rows",
                    i,
                    t.energy.len(),
                    t.bands.len()
                ));
            }
        }
        Ok(UrrTable { kts, temperatures })
    }

    /// Energy range `[min, max]` covered by temperature `i_temp`'s bands,
    /// used by `NuclideXS` to decide whether `UrrEval` applies at all.
    pub fn energy_range(&self, i_temp: usize) -> (f64, f64) {
        let e = &self.temperatures[i_temp].energy;
        (e[0], *e.last().unwrap())
    }
}

fn smallest_band_above(bands: &[UrrBand], r: f64) -> usize {
    for (i, b) in bands.iter().enumerate() {
        if b.cum_prob > r {
            return i;
        }
    }
    bands.len() - 1
}

struct SampledChannels {
    elastic: f64,
    fission: f64,
    capture: f64,
}

fn interpolate_channels(
    interp: UrrInterp,
    lo: &UrrBand,
    hi: &UrrBand,
    f_linear: f64,
    f_loglog: f64,
) -> SampledChannels {
    match interp {
        UrrInterp::LinearLinear => SampledChannels {
            elastic: (1.0 - f_linear) * lo.elastic + f_linear * hi.elastic,
            fission: (1.0 - f_linear) * lo.fission + f_linear * hi.fission,
            capture: (1.0 - f_linear) * lo.capture + f_linear * hi.capture,
        },
        UrrInterp::LogLog => {
            let loglog = |a: f64, b: f64| -> f64 {
                if a <= 0.0 || b <= 0.0 {
                    0.0
                } else {
                    ((1.0 - f_loglog) * a.ln() + f_loglog * b.ln()).exp()
                }
            };
            SampledChannels {
                elastic: loglog(lo.elastic, hi.elastic),
                fission: loglog(lo.fission, hi.fission),
                capture: loglog(lo.capture, hi.capture),
            }
        }
    }
}

/// `UrrEval`. `elastic_free`, when `Some`, is the already
/// materialized free-atom elastic cross section at `(e, sqrt_kt)`, needed
/// only when `table.multiply_smooth` is set.
#[allow(clippy::too_many_arguments)]
pub fn calculate_urr_xs<R: RandomStream + ?Sized>(
    table: &UrrTemperature,
    nuclide_id: i64,
    inelastic_reaction: Option<&DepletionReaction>,
    fissionable: bool,
    nu: Option<&Nu>,
    elastic_free: Option<f64>,
    e: f64,
    cache: &mut MicroCacheEntry,
    rng: &mut R,
) {
    cache.use_ptable = true;

    let n = table.energy.len();
    let mut i_energy = 0usize;
    while i_energy + 1 < n && !(table.energy[i_energy] <= e && e < table.energy[i_energy + 1]) {
        i_energy += 1;
    }
    let i_energy = i_energy.min(n - 2);
    let f_linear = (e - table.energy[i_energy]) / (table.energy[i_energy + 1] - table.energy[i_energy]);
    let f_loglog = (e / table.energy[i_energy]).ln()
        / (table.energy[i_energy + 1] / table.energy[i_energy]).ln();

    let r = urr_prn(rng, nuclide_id);

    let bands_lo = &table.bands[i_energy];
    let bands_hi = &table.bands[i_energy + 1];
    let i_low = smallest_band_above(bands_lo, r);
    let i_up = smallest_band_above(bands_hi, r);

    let mut sampled = interpolate_channels(
        table.interp,
        &bands_lo[i_low],
        &bands_hi[i_up],
        f_linear,
        f_loglog,
    );

    let inelastic = match (table.inelastic_mt, inelastic_reaction) {
        (Some(_), Some(rx)) => rx
            .cross_section_at(cache.index_grid, cache.interp_factor)
            .unwrap_or(0.0),
        _ => 0.0,
    };

    if table.multiply_smooth {
        let smooth_absorption = (1.0 - f_linear) * table.smooth_absorption[i_energy]
            + f_linear * table.smooth_absorption[i_energy + 1];
        let smooth_fission = (1.0 - f_linear) * table.smooth_fission[i_energy]
            + f_linear * table.smooth_fission[i_energy + 1];
        if let Some(free) = elastic_free {
            sampled.elastic *= free;
        }
        sampled.capture *= smooth_absorption - smooth_fission;
        sampled.fission *= smooth_fission;
    }

    sampled.elastic = sampled.elastic.max(0.0);
    sampled.fission = sampled.fission.max(0.0);
    sampled.capture = sampled.capture.max(0.0);

    cache.elastic = Some(sampled.elastic);
    cache.fission = sampled.fission;
    cache.absorption = sampled.capture + sampled.fission;
    cache.total = sampled.elastic + inelastic + sampled.capture + sampled.fission;
    cache.nu_fission = if fissionable {
        nu.map(|n| n.evaluate(e, NuMode::TotalEmission)).unwrap_or(0.0) * sampled.fission
    } else {
        0.0
    };
}
