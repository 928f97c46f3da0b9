// Global configuration for the cross section evaluation core.
use once_cell::sync::Lazy;
use std::sync::Mutex;

/// Global configuration instance, using the `Lazy<Mutex<_>>` pattern for
/// lazily-initialized, thread-safe shared state.
pub static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::new()));

/// How a nuclide's temperature-indexed tables are selected for a given
/// material temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureMethod {
    /// Pick the tabulated temperature closest to the material's kT.
    Nearest,
    /// Stochastically interpolate between the two bracketing temperatures,
    /// weighted by a uniform random draw (see `Nuclide::calculate_nuclide_xs`).
    Interpolated,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Temperature selection strategy for tabulated data and S(a,b) tables.
    pub temperature_method: TemperatureMethod,
    /// Tolerance (K) used by the nearest-temperature S(a,b) scan.
    pub temperature_tolerance: f64,
    /// Whether unresolved-resonance probability tables are consulted at all.
    pub urr_ptables_on: bool,
    /// Whether per-nuclide depletion reaction channels are evaluated.
    pub need_depletion_rx: bool,
    /// Minimum neutron energy (eV) defining the shared logarithmic lattice.
    pub energy_min_neutron: f64,
    /// Bucket width (natural-log units) of the shared logarithmic lattice.
    pub log_spacing: f64,
}

/// Boltzmann constant in eV/K.
pub const K_BOLTZMANN: f64 = 8.617_333_262e-5;

/// sqrt(pi), used throughout the multipole kernel.
pub const SQRT_PI: f64 = 1.772_453_850_905_516;

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Config {
            temperature_method: TemperatureMethod::Nearest,
            temperature_tolerance: 10.0,
            urr_ptables_on: true,
            need_depletion_rx: true,
            energy_min_neutron: 1.0e-5,
            log_spacing: 1.0 / 8000.0 * (20.0e6_f64 / 1.0e-5).ln(),
        }
    }

    /// Get the global configuration instance.
    pub fn global() -> std::sync::MutexGuard<'static, Self> {
        CONFIG.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
