//! Per-nuclide cross section data and the `NuclideXS` dispatcher.
//!
//! The construction idiom — fallible `Result<T, String>` constructors with
//! a `println!` load diagnostic on success — is used consistently across
//! the crate's entity types.

use crate::cache::{MicroCacheEntry, TempIndex};
use crate::config::{Config, TemperatureMethod};
use crate::constants::DEPLETION_RX;
use crate::multipole::{multipole_eval, MultipoleArray, PolynomialBroadener};
use crate::nu::{Nu, NuMode};
use crate::reaction::DepletionReaction;
use crate::rng::RandomStream;
use crate::sab::{calculate_sab_xs, SabTable};
use crate::urr::{calculate_urr_xs, UrrTable};
use crate::utilities::{
    find_interval_bitwise_f64, nearest_temperature_index, stochastic_temperature_index, GridIndexTable,
};

/// One temperature's worth of tabulated point-wise data for a nuclide.
#[derive(Debug, Clone)]
pub struct TabulatedTemperature {
    pub energy: Vec<f64>,
    pub grid_index: GridIndexTable,
    pub total: Vec<f64>,
    pub absorption: Vec<f64>,
    pub fission: Vec<f64>,
    pub nu_fission: Vec<f64>,
    /// Free-atom elastic reaction (MT 2), stored with the same
    /// locally-thresholded shape as the depletion reactions so `Elastic0K`
    /// and `SabEval` can share `DepletionReaction::cross_section_at`.
    pub elastic: DepletionReaction,
    /// The six depletion reactions tracked per `DEPLETION_RX`, in order.
    pub depletion: [Option<DepletionReaction>; 6],
}

impl TabulatedTemperature {
    pub fn depletion_by_mt(&self, mt: i32) -> Option<&DepletionReaction> {
        self.depletion
            .iter()
            .filter_map(|o| o.as_ref())
            .find(|rx| rx.mt == mt)
    }
}

/// Core data model for a single nuclide's cross section data.
#[derive(Debug, Clone)]
pub struct Nuclide {
    pub name: String,
    /// Ascending temperatures, in kT (eV).
    pub kts: Vec<f64>,
    pub temperatures: Vec<TabulatedTemperature>,
    pub multipole: Option<MultipoleArray>,
    pub urr: Option<UrrTable>,
    pub elastic_0k_energy: Vec<f64>,
    pub elastic_0k_value: Vec<f64>,
    pub fissionable: bool,
    pub nu: Option<Nu>,
}

impl Nuclide {
    /// Build and validate a `Nuclide`. Checks the invariants listed above
    /// (ascending `kTs`, matching temperature-table counts, ascending
    /// per-temperature energy grids) and returns a descriptive `Err` rather
    /// than panicking. Emits a one-line load diagnostic on success.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        kts: Vec<f64>,
        temperatures: Vec<TabulatedTemperature>,
        multipole: Option<MultipoleArray>,
        urr: Option<UrrTable>,
        elastic_0k_energy: Vec<f64>,
        elastic_0k_value: Vec<f64>,
        fissionable: bool,
        nu: Option<Nu>,
    ) -> Result<Self, String> {
        if kts.len() != temperatures.len() {
            return Err(format!(
                "Nuclide {}: {} kTs but {} temperature tables",
                name,
                kts.len(),
                temperatures.len()
            ));
        }
        if kts.windows(2).any(|w| w[0] >= w[1]) {
            return Err(format!("Nuclide {}: kTs must be strictly ascending", name));
        }
        for (i, t) in temperatures.iter().enumerate() {
            if t.energy.windows(2).any(|w| w[0] > w[1]) {
                return Err(format!(
                    "Nuclide {} temperature index {}: energy grid must be ascending",
                    name, i
                ));
            }
            if t.energy.len() < 2 {
                return Err(format!(
                    "Nuclide {} temperature index {}: energy grid needs >= 2 points",
                    name, i
                ));
            }
        }
        if elastic_0k_energy.len() != elastic_0k_value.len() {
            return Err(format!(
                "Nuclide {}: elastic_0K energy/value length mismatch",
                name
            ));
        }

        println!(
            "Reading {}: {} temperatures, {} energy points at first temperature",
            name,
            temperatures.len(),
            temperatures.first().map(|t| t.energy.len()).unwrap_or(0)
        );

        Ok(Nuclide {
            name,
            kts,
            temperatures,
            multipole,
            urr,
            elastic_0k_energy,
            elastic_0k_value,
            fissionable,
            nu,
        })
    }

    /// ENDF MT numbers present at temperature index `i_temp`: the free-atom
    /// elastic channel plus whichever depletion reactions are loaded.
    /// Read-only introspection over already-loaded data.
    pub fn reaction_mts(&self, i_temp: usize) -> Vec<i32> {
        let mut mts = vec![crate::constants::MT_ELASTIC];
        if let Some(t) = self.temperatures.get(i_temp) {
            mts.extend(t.depletion.iter().filter_map(|rx| rx.as_ref().map(|r| r.mt)));
        }
        mts
    }

    /// Tabulated temperatures (kT, eV) this nuclide carries data for.
    pub fn temperatures_kt(&self) -> &[f64] {
        &self.kts
    }
}

/// Grid search within the shared logarithmic lattice's window.
/// Clamps to the terminal interval outside the grid's range; bumps past a
/// tied pair of grid points.
fn grid_search_windowed(energy: &[f64], grid_index: &GridIndexTable, e: f64) -> (usize, f64) {
    let n = energy.len();
    if e < energy[0] {
        return (0, 0.0);
    }
    if e >= energy[n - 1] {
        return (n - 2, 1.0);
    }
    let (lo, hi) = grid_index.window(e);
    let hi = hi.min(n);
    let mut i_grid = find_interval_bitwise_f64(&energy[lo..hi], e) + lo;
    if i_grid + 1 < n && energy[i_grid] == energy[i_grid + 1] {
        i_grid += 1;
    }
    let f = (e - energy[i_grid]) / (energy[i_grid + 1] - energy[i_grid]);
    (i_grid, f)
}

/// Unwindowed grid search used by `Elastic0K`, which has no shared
/// logarithmic lattice of its own.
fn grid_search_full(energy: &[f64], e: f64) -> (usize, f64) {
    let n = energy.len();
    if n < 2 {
        return (0, 0.0);
    }
    if e < energy[0] {
        return (0, 0.0);
    }
    if e >= energy[n - 1] {
        return (n - 2, 1.0);
    }
    let mut i_grid = find_interval_bitwise_f64(energy, e);
    if i_grid + 1 < n && energy[i_grid] == energy[i_grid + 1] {
        i_grid += 1;
    }
    let f = (e - energy[i_grid]) / (energy[i_grid + 1] - energy[i_grid]);
    (i_grid, f)
}

/// `Elastic0K`: pure 0 K elastic lookup, used by resonance
/// scattering sampling (out of this core's scope) and exposed for testing.
pub fn elastic_xs_0k(nuclide: &Nuclide, e: f64) -> f64 {
    if nuclide.elastic_0k_energy.is_empty() {
        return 0.0;
    }
    let (i, f) = grid_search_full(&nuclide.elastic_0k_energy, e);
    let v = &nuclide.elastic_0k_value;
    (1.0 - f) * v[i] + f * v[i + 1]
}

/// The cached free-atom-or-multipole elastic cross section at the energy
/// and temperature the cache entry was just populated for:
/// the interpolated MT-2 reaction on the tabulated path, or `total -
/// absorption` on the multipole path.
fn elastic_free_cached(nuclide: &Nuclide, cache: &MicroCacheEntry) -> f64 {
    match cache.index_temp {
        TempIndex::Multipole => cache.total - cache.absorption,
        TempIndex::Tabulated(i_temp) => nuclide.temperatures[i_temp]
            .elastic
            .cross_section_at(cache.index_grid, cache.interp_factor)
            .unwrap_or(0.0),
    }
}

/// `NuclideXS` / `calculate_nuclide_xs`: the per-nuclide
/// dispatcher selecting multipole vs tabulated evaluation, invoking
/// `SabEval`/`UrrEval` as applicable, and filling `cache` in place.
///
/// `sab` is `Some((index_sab, table, frac))` when `MaterialXS` determined
/// this nuclide currently falls under a S(a,b) table;
/// `index_sab` is the table's index, recorded into the cache entry so a
/// later call can detect a reassignment.
#[allow(clippy::too_many_arguments)]
pub fn calculate_nuclide_xs<R: RandomStream + ?Sized>(
    nuclide: &Nuclide,
    nuclide_id: i64,
    e: f64,
    sqrt_kt: f64,
    sab: Option<(usize, &SabTable, f64)>,
    config: &Config,
    cache: &mut MicroCacheEntry,
    rng: &mut R,
) {
    cache.elastic = None;
    cache.thermal = 0.0;
    cache.thermal_elastic = 0.0;

    let kt = sqrt_kt * sqrt_kt;
    let in_multipole_window = nuclide
        .multipole
        .as_ref()
        .map(|mp| e >= mp.start_e && e <= mp.end_e)
        .unwrap_or(false);

    if in_multipole_window {
        let mp = nuclide.multipole.as_ref().unwrap();
        let xs = multipole_eval(mp, &PolynomialBroadener, e, sqrt_kt);
        cache.total = xs.total;
        cache.absorption = xs.absorption;
        cache.fission = if nuclide.fissionable { xs.fission } else { 0.0 };
        cache.nu_fission = if nuclide.fissionable {
            nuclide
                .nu
                .as_ref()
                .map(|n| n.evaluate(e, NuMode::TotalEmission))
                .unwrap_or(0.0)
                * xs.fission
        } else {
            0.0
        };
        cache.depletion = [0.0; 6];
        if config.need_depletion_rx {
            cache.depletion[crate::constants::DEPLETION_RX_NGAMMA] = xs.absorption - xs.fission;
        }
        cache.index_temp = TempIndex::Multipole;
        cache.index_grid = 0;
        cache.interp_factor = 0.0;
    } else {
        let i_temp = match config.temperature_method {
            TemperatureMethod::Nearest => nearest_temperature_index(&nuclide.kts, kt),
            TemperatureMethod::Interpolated => stochastic_temperature_index(&nuclide.kts, kt, rng),
        };
        let temp = &nuclide.temperatures[i_temp];
        let (i_grid, f) = grid_search_windowed(&temp.energy, &temp.grid_index, e);

        cache.total = (1.0 - f) * temp.total[i_grid] + f * temp.total[i_grid + 1];
        cache.absorption =
            (1.0 - f) * temp.absorption[i_grid] + f * temp.absorption[i_grid + 1];
        if nuclide.fissionable {
            cache.fission = (1.0 - f) * temp.fission[i_grid] + f * temp.fission[i_grid + 1];
            cache.nu_fission =
                (1.0 - f) * temp.nu_fission[i_grid] + f * temp.nu_fission[i_grid + 1];
        } else {
            cache.fission = 0.0;
            cache.nu_fission = 0.0;
        }

        cache.depletion = [0.0; 6];
        if config.need_depletion_rx {
            for (k, rx) in temp.depletion.iter().enumerate() {
                cache.depletion[k] = rx
                    .as_ref()
                    .and_then(|r| r.cross_section_at(i_grid, f))
                    .unwrap_or(0.0);
            }
        }

        cache.index_temp = TempIndex::Tabulated(i_temp);
        cache.index_grid = i_grid;
        cache.interp_factor = f;
    }

    cache.index_sab = None;
    cache.sab_frac = 0.0;
    cache.use_ptable = false;

    if let Some((index_sab, sab_table, sab_frac)) = sab {
        let elastic_free = elastic_free_cached(nuclide, cache);
        calculate_sab_xs(
            sab_table,
            cache,
            index_sab,
            sab_frac,
            e,
            sqrt_kt,
            elastic_free,
            config,
            rng,
        );
    }

    if config.urr_ptables_on {
        if let (Some(urr), TempIndex::Tabulated(i_temp)) = (&nuclide.urr, cache.index_temp) {
            if i_temp < urr.temperatures.len() {
                let (lo, hi) = urr.energy_range(i_temp);
                if e > lo && e < hi {
                    let sub = &urr.temperatures[i_temp];
                    let temp = &nuclide.temperatures[i_temp];
                    let inelastic_rx = sub.inelastic_mt.and_then(|mt| temp.depletion_by_mt(mt));
                    let elastic_free = if sub.multiply_smooth {
                        Some(elastic_free_cached(nuclide, cache))
                    } else {
                        None
                    };
                    calculate_urr_xs(
                        sub,
                        nuclide_id,
                        inelastic_rx,
                        nuclide.fissionable,
                        nuclide.nu.as_ref(),
                        elastic_free,
                        e,
                        cache,
                        rng,
                    );
                }
            }
        }
    }

    cache.last_e = e;
    cache.last_sqrt_kt = sqrt_kt;
    cache.populated = true;
}

/// ENDF MT numbers expected for the depletion channel list, re-exported
/// for constructors that assemble `TabulatedTemperature::depletion`.
pub fn depletion_mts() -> [i32; 6] {
    DEPLETION_RX
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::rng::ParticleRng;

    fn flat_reaction(mt: i32, value: f64, len: usize) -> DepletionReaction {
        DepletionReaction::new(mt, 0, vec![value; len])
    }

    fn simple_nuclide(fissionable: bool) -> Nuclide {
        let energy = vec![1.0, 10.0, 100.0, 1000.0];
        let grid_index = GridIndexTable::build(&energy, energy[0], (energy[3] / energy[0]).ln() / 4.0, 4);
        let temp = TabulatedTemperature {
            energy: energy.clone(),
            grid_index,
            total: vec![10.0, 8.0, 6.0, 4.0],
            absorption: vec![4.0, 3.0, 2.0, 1.0],
            fission: vec![2.0, 1.5, 1.0, 0.5],
            nu_fission: vec![5.0, 3.75, 2.5, 1.25],
            elastic: flat_reaction(2, 6.0, 4),
            depletion: [
                Some(flat_reaction(16, 0.1, 4)),
                None,
                None,
                None,
                None,
                None,
            ],
        };
        Nuclide::new(
            "Test".to_string(),
            vec![294.0],
            vec![temp],
            None,
            None,
            energy.clone(),
            vec![6.0, 4.8, 3.6, 2.4],
            fissionable,
            Some(Nu::Polynomial(vec![2.5])),
        )
        .unwrap()
    }

    #[test]
    fn test_exact_grid_point_has_zero_f_and_exact_value() {
        let nuclide = simple_nuclide(true);
        let cfg = Config::new();
        let mut cache = MicroCacheEntry::new();
        let mut rng = ParticleRng::from_seed(1);
        calculate_nuclide_xs(&nuclide, 1, 10.0, 0.0, None, &cfg, &mut cache, &mut rng);
        assert_eq!(cache.interp_factor, 0.0);
        assert_eq!(cache.total, 8.0);
        assert_eq!(cache.absorption, 3.0);
    }

    #[test]
    fn test_non_fissionable_has_zero_fission_everywhere() {
        let nuclide = simple_nuclide(false);
        let cfg = Config::new();
        let mut cache = MicroCacheEntry::new();
        let mut rng = ParticleRng::from_seed(1);
        calculate_nuclide_xs(&nuclide, 1, 50.0, 0.0, None, &cfg, &mut cache, &mut rng);
        assert_eq!(cache.fission, 0.0);
        assert_eq!(cache.nu_fission, 0.0);
    }

    #[test]
    fn test_depletion_reaction_present_and_absent() {
        let nuclide = simple_nuclide(true);
        let cfg = Config::new();
        let mut cache = MicroCacheEntry::new();
        let mut rng = ParticleRng::from_seed(1);
        calculate_nuclide_xs(&nuclide, 1, 50.0, 0.0, None, &cfg, &mut cache, &mut rng);
        assert!((cache.depletion[0] - 0.1).abs() < 1e-9);
        assert_eq!(cache.depletion[1], 0.0);
    }

    #[test]
    fn test_depletion_reactions_skipped_when_not_needed() {
        let nuclide = simple_nuclide(true);
        let mut cfg = Config::new();
        cfg.need_depletion_rx = false;
        let mut cache = MicroCacheEntry::new();
        let mut rng = ParticleRng::from_seed(1);
        calculate_nuclide_xs(&nuclide, 1, 50.0, 0.0, None, &cfg, &mut cache, &mut rng);
        assert_eq!(cache.depletion, [0.0; 6]);
        // unaffected channels still compute normally
        assert!(cache.total > 0.0);
    }

    #[test]
    fn test_elastic_xs_0k_interpolates() {
        let nuclide = simple_nuclide(true);
        let v = elastic_xs_0k(&nuclide, 55.0);
        assert!(v > 2.4 && v < 3.6);
    }

    #[test]
    fn test_below_grid_clamps_f_zero() {
        let nuclide = simple_nuclide(true);
        let cfg = Config::new();
        let mut cache = MicroCacheEntry::new();
        let mut rng = ParticleRng::from_seed(1);
        calculate_nuclide_xs(&nuclide, 1, 0.1, 0.0, None, &cfg, &mut cache, &mut rng);
        assert_eq!(cache.interp_factor, 0.0);
        assert_eq!(cache.index_grid, 0);
    }
}
