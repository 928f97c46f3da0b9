// File: src/lib.rs

mod cache;
mod config;
mod constants;
mod material;
mod multipole;
mod nu;
mod nuclide;
mod reaction;
mod rng;
mod sab;
mod urr;
mod utilities;

pub use cache::{MaterialCacheEntry, MicroCacheEntry, MicroXsCacheArena, TempIndex};
pub use config::{Config, TemperatureMethod, K_BOLTZMANN, SQRT_PI};
pub use material::{calculate_xs, Material};
pub use multipole::{
    multipole_deriv_eval, multipole_eval, sig_t_factor, Curvefit, Formalism, MultipoleArray,
    MultipoleXs, Pole, PoleResidues,
};
pub use nu::{Nu, NuMode};
pub use nuclide::{calculate_nuclide_xs, elastic_xs_0k, depletion_mts, Nuclide, TabulatedTemperature};
pub use reaction::DepletionReaction;
pub use rng::{urr_prn, ParticleRng, RandomStream};
pub use sab::{calculate_sab_xs, SabElasticMode, SabTable, SabTemperature};
pub use urr::{calculate_urr_xs, UrrBand, UrrInterp, UrrTable, UrrTemperature};
pub use utilities::GridIndexTable;
