//! `Material` entity and `MaterialXS`.
//!
//! Composition is index-based rather than name-keyed: nuclides, atom
//! densities, and the sorted S(a,b) companion arrays are all addressed
//! by slot, matching how `calculate_xs` walks them.

use crate::cache::{MaterialCacheEntry, MicroXsCacheArena};
use crate::config::Config;
use crate::nuclide::{calculate_nuclide_xs, Nuclide};
use crate::rng::RandomStream;
use crate::sab::SabTable;

/// Composition and thermal-scattering assignment for one material.
#[derive(Debug, Clone)]
pub struct Material {
    pub nuclides: Vec<Nuclide>,
    pub atom_density: Vec<f64>,
    /// Strictly ascending nuclide-slot indices that carry a S(a,b) table,
    /// with `i_sab_tables`/`sab_fracs` giving the matching table index and
    /// weight fraction for each entry.
    pub i_sab_nuclides: Vec<usize>,
    pub i_sab_tables: Vec<usize>,
    pub sab_fracs: Vec<f64>,
    pub sab_tables: Vec<SabTable>,
}

impl Material {
    /// Validate and build a `Material`. Checks that array lengths line up,
    /// and that the sorted S(a,b) companion arrays are genuinely ascending
    /// and in range.
    pub fn new(
        nuclides: Vec<Nuclide>,
        atom_density: Vec<f64>,
        i_sab_nuclides: Vec<usize>,
        i_sab_tables: Vec<usize>,
        sab_fracs: Vec<f64>,
        sab_tables: Vec<SabTable>,
    ) -> Result<Self, String> {
        if nuclides.len() != atom_density.len() {
            return Err(format!(
                "Material: {} nuclides but {} atom densities",
                nuclides.len(),
                atom_density.len()
            ));
        }
        if atom_density.iter().any(|&d| d < 0.0) {
            return Err("Material: atom densities must be non-negative".to_string());
        }
        if i_sab_nuclides.len() != i_sab_tables.len() || i_sab_nuclides.len() != sab_fracs.len() {
            return Err("Material: S(a,b) companion arrays must have equal length".to_string());
        }
        if i_sab_nuclides.windows(2).any(|w| w[0] >= w[1]) {
            return Err("Material: i_sab_nuclides must be strictly ascending".to_string());
        }
        for (&slot, &table) in i_sab_nuclides.iter().zip(i_sab_tables.iter()) {
            if slot >= nuclides.len() {
                return Err(format!("Material: i_sab_nuclides slot {} out of range", slot));
            }
            if table >= sab_tables.len() {
                return Err(format!("Material: i_sab_tables entry {} out of range", table));
            }
        }

        println!(
            "Building material: {} nuclides, {} S(a,b) assignments",
            nuclides.len(),
            i_sab_nuclides.len()
        );

        Ok(Material {
            nuclides,
            atom_density,
            i_sab_nuclides,
            i_sab_tables,
            sab_fracs,
            sab_tables,
        })
    }

    pub fn n_nuclides(&self) -> usize {
        self.nuclides.len()
    }

    /// A material with no nuclides, or whose atom densities are all zero,
    /// contributes no cross section.
    pub fn is_void(&self) -> bool {
        self.nuclides.is_empty() || self.atom_density.iter().all(|&d| d == 0.0)
    }

    /// Build a fresh per-worker cache arena sized for this material's
    /// nuclide count.
    pub fn new_cache_arena(&self) -> MicroXsCacheArena {
        MicroXsCacheArena::new(self.nuclides.len())
    }
}

/// `MaterialXS` / `calculate_xs`: walks the material's
/// nuclides, re-invoking `NuclideXS` only where the per-nuclide cache is
/// stale, and accumulates atom-density-weighted macroscopic totals.
pub fn calculate_xs<R: RandomStream + ?Sized>(
    material: &Material,
    e: f64,
    sqrt_kt: f64,
    arena: &mut MicroXsCacheArena,
    material_cache: &mut MaterialCacheEntry,
    config: &Config,
    rng: &mut R,
) {
    material_cache.zero();
    if material.is_void() {
        return;
    }

    let mut j = 0usize;
    for slot in 0..material.nuclides.len() {
        let mut i_sab = 0usize;
        let mut sab_frac = 0.0;
        if j < material.i_sab_nuclides.len() && material.i_sab_nuclides[j] == slot {
            let table_idx = material.i_sab_tables[j];
            let frac = material.sab_fracs[j];
            let table = &material.sab_tables[table_idx];
            let exceeds_threshold = table
                .temperatures
                .first()
                .map(|t| e > t.threshold_inelastic)
                .unwrap_or(false);
            if !exceeds_threshold {
                i_sab = table_idx + 1; // reserve 0 to mean "no table"
                sab_frac = frac;
            }
            j += 1;
        }

        let nuclide = &material.nuclides[slot];
        let index_sab = if i_sab > 0 { Some(i_sab - 1) } else { None };

        let cache = arena.get_mut(slot);
        if !cache.is_valid_for(e, sqrt_kt, index_sab, sab_frac) {
            let sab_input = index_sab.map(|table_idx| (table_idx, &material.sab_tables[table_idx], sab_frac));
            calculate_nuclide_xs(nuclide, slot as i64, e, sqrt_kt, sab_input, config, cache, rng);
        }

        let cache = arena.get(slot);
        let w = material.atom_density[slot];
        material_cache.total += w * cache.total;
        material_cache.absorption += w * cache.absorption;
        material_cache.fission += w * cache.fission;
        material_cache.nu_fission += w * cache.nu_fission;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemperatureMethod;
    use crate::nu::Nu;
    use crate::reaction::DepletionReaction;
    use crate::rng::{ParticleRng, RandomStream};
    use crate::urr::{UrrBand, UrrInterp, UrrTable, UrrTemperature};
    use crate::utilities::GridIndexTable;

    /// Spy `RandomStream` counting draws per call kind, used to verify §8's
    /// cache-idempotence property: a repeated call with identical inputs
    /// must draw zero further samples of either kind.
    struct CountingRng {
        inner: ParticleRng,
        sample_calls: usize,
        future_prn_calls: usize,
    }

    impl CountingRng {
        fn from_seed(seed: u64) -> Self {
            CountingRng {
                inner: ParticleRng::from_seed(seed),
                sample_calls: 0,
                future_prn_calls: 0,
            }
        }
    }

    impl RandomStream for CountingRng {
        fn sample(&mut self) -> f64 {
            self.sample_calls += 1;
            self.inner.sample()
        }

        fn future_prn(&mut self, stream: u64, key: i64) -> f64 {
            self.future_prn_calls += 1;
            self.inner.future_prn(stream, key)
        }
    }

    fn flat_nuclide(name: &str, fissionable: bool) -> Nuclide {
        let energy = vec![1.0, 10.0, 100.0, 1000.0];
        let grid_index = GridIndexTable::build(&energy, energy[0], (energy[3] / energy[0]).ln() / 4.0, 4);
        let temp = crate::nuclide::TabulatedTemperature {
            energy: energy.clone(),
            grid_index,
            total: vec![10.0, 8.0, 6.0, 4.0],
            absorption: vec![4.0, 3.0, 2.0, 1.0],
            fission: vec![2.0, 1.5, 1.0, 0.5],
            nu_fission: vec![5.0, 3.75, 2.5, 1.25],
            elastic: DepletionReaction::new(2, 0, vec![6.0, 5.0, 4.0, 3.0]),
            depletion: [None, None, None, None, None, None],
        };
        Nuclide::new(
            name.to_string(),
            vec![294.0],
            vec![temp],
            None,
            None,
            energy.clone(),
            vec![6.0, 5.0, 4.0, 3.0],
            fissionable,
            Some(Nu::Polynomial(vec![2.5])),
        )
        .unwrap()
    }

    /// A nuclide with two tabulated temperatures (so interpolated
    /// temperature selection actually draws a sample) and URR data covering
    /// both temperatures (so a tabulated-branch hit also draws a band
    /// sample), used by the cache-idempotence test below.
    fn nuclide_with_urr_and_two_temperatures() -> Nuclide {
        let energy = vec![1.0, 10.0, 100.0, 1000.0];
        let make_temp = || {
            let grid_index =
                GridIndexTable::build(&energy, energy[0], (energy[3] / energy[0]).ln() / 4.0, 4);
            crate::nuclide::TabulatedTemperature {
                energy: energy.clone(),
                grid_index,
                total: vec![10.0, 8.0, 6.0, 4.0],
                absorption: vec![4.0, 3.0, 2.0, 1.0],
                fission: vec![2.0, 1.5, 1.0, 0.5],
                nu_fission: vec![5.0, 3.75, 2.5, 1.25],
                elastic: DepletionReaction::new(2, 0, vec![6.0, 5.0, 4.0, 3.0]),
                depletion: [None, None, None, None, None, None],
            }
        };
        let make_urr_temp = || UrrTemperature {
            energy: vec![1.0, 1000.0],
            bands: vec![
                vec![UrrBand {
                    cum_prob: 1.0,
                    elastic: 1.0,
                    fission: 0.1,
                    capture: 0.2,
                }],
                vec![UrrBand {
                    cum_prob: 1.0,
                    elastic: 1.5,
                    fission: 0.15,
                    capture: 0.25,
                }],
            ],
            interp: UrrInterp::LinearLinear,
            inelastic_mt: None,
            multiply_smooth: false,
            smooth_absorption: vec![0.0, 0.0],
            smooth_fission: vec![0.0, 0.0],
        };
        let urr = UrrTable::new(vec![250.0, 600.0], vec![make_urr_temp(), make_urr_temp()]).unwrap();
        Nuclide::new(
            "U238".to_string(),
            vec![250.0, 600.0],
            vec![make_temp(), make_temp()],
            None,
            Some(urr),
            energy.clone(),
            vec![6.0, 5.0, 4.0, 3.0],
            true,
            Some(Nu::Polynomial(vec![2.5])),
        )
        .unwrap()
    }

    #[test]
    fn test_void_material_has_zero_xs() {
        let material = Material::new(vec![], vec![], vec![], vec![], vec![], vec![]).unwrap();
        let mut arena = material.new_cache_arena();
        let mut mat_cache = MaterialCacheEntry::default();
        let cfg = Config::new();
        let mut rng = ParticleRng::from_seed(1);
        calculate_xs(&material, 10.0, 0.0, &mut arena, &mut mat_cache, &cfg, &mut rng);
        assert_eq!(mat_cache.total, 0.0);
    }

    #[test]
    fn test_two_nuclide_material_accumulates_weighted_totals() {
        let material = Material::new(
            vec![flat_nuclide("A", true), flat_nuclide("B", false)],
            vec![0.5, 0.5],
            vec![],
            vec![],
            vec![],
            vec![],
        )
        .unwrap();
        let mut arena = material.new_cache_arena();
        let mut mat_cache = MaterialCacheEntry::default();
        let cfg = Config::new();
        let mut rng = ParticleRng::from_seed(1);
        calculate_xs(&material, 10.0, 0.0, &mut arena, &mut mat_cache, &cfg, &mut rng);
        assert!((mat_cache.total - 8.0).abs() < 1e-9);
        assert!((mat_cache.fission - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_cache_reused_on_repeated_call_same_key() {
        let material = Material::new(vec![flat_nuclide("A", true)], vec![1.0], vec![], vec![], vec![], vec![])
            .unwrap();
        let mut arena = material.new_cache_arena();
        let mut mat_cache = MaterialCacheEntry::default();
        let cfg = Config::new();
        let mut rng = ParticleRng::from_seed(1);
        calculate_xs(&material, 10.0, 0.0, &mut arena, &mut mat_cache, &cfg, &mut rng);
        let first_total = arena.get(0).total;
        calculate_xs(&material, 10.0, 0.0, &mut arena, &mut mat_cache, &cfg, &mut rng);
        assert_eq!(arena.get(0).total, first_total);
    }

    #[test]
    fn test_cache_idempotence_draws_no_further_rng_samples() {
        // kT = 425 eV sits strictly between the nuclide's two tabulated
        // temperatures (250, 600), forcing a stochastic-temperature draw;
        // E = 10 sits inside the URR table's range for either temperature,
        // forcing a band-sample draw too.
        let nuclide = nuclide_with_urr_and_two_temperatures();
        let material = Material::new(vec![nuclide], vec![1.0], vec![], vec![], vec![], vec![]).unwrap();
        let mut arena = material.new_cache_arena();
        let mut mat_cache = MaterialCacheEntry::default();
        let mut cfg = Config::new();
        cfg.temperature_method = TemperatureMethod::Interpolated;
        let mut rng = CountingRng::from_seed(7);
        let sqrt_kt = 425.0_f64.sqrt();

        calculate_xs(&material, 10.0, sqrt_kt, &mut arena, &mut mat_cache, &cfg, &mut rng);
        let sample_calls_after_first = rng.sample_calls;
        let future_prn_calls_after_first = rng.future_prn_calls;
        assert!(sample_calls_after_first > 0, "expected a stochastic-temperature draw");
        assert!(future_prn_calls_after_first > 0, "expected a URR band-sample draw");

        calculate_xs(&material, 10.0, sqrt_kt, &mut arena, &mut mat_cache, &cfg, &mut rng);
        assert_eq!(rng.sample_calls, sample_calls_after_first);
        assert_eq!(rng.future_prn_calls, future_prn_calls_after_first);
    }
}
