//! Random-number stream interface consumed by the core.
//!
//! The engine's RNG implementation is an external collaborator; the core
//! only ever touches it through this trait, generic over `R: RandomStream`.
//! The concrete `ParticleRng` below wraps `StdRng` to give the test suite
//! something deterministic to drive.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::constants::STREAM_URR_PTABLE;

/// The RNG capability the core needs: a sequential tracking stream for
/// ordinary uniform draws (stochastic temperature interpolation), and a
/// keyed, history-independent draw for unresolved-resonance band sampling
/// that must correlate across temperatures for the same nuclide.
pub trait RandomStream {
    /// Draw a uniform sample in [0, 1) from the tracking stream, advancing it.
    fn sample(&mut self) -> f64;

    /// Draw a uniform sample in [0, 1) that depends only on `(stream, key)`
    /// and the generator's fixed base seed, not on prior draws. Used by
    /// `UrrEval` so that two collisions of the same nuclide at different
    /// temperatures see the same `r`.
    fn future_prn(&mut self, stream: u64, key: i64) -> f64;
}

/// A concrete, deterministic `RandomStream` built on `rand::rngs::StdRng`.
#[derive(Debug, Clone)]
pub struct ParticleRng {
    tracking: StdRng,
    base_seed: u64,
}

impl ParticleRng {
    pub fn from_seed(seed: u64) -> Self {
        ParticleRng {
            tracking: StdRng::seed_from_u64(seed),
            base_seed: seed,
        }
    }
}

impl RandomStream for ParticleRng {
    fn sample(&mut self) -> f64 {
        self.tracking.gen_range(0.0..1.0)
    }

    fn future_prn(&mut self, stream: u64, key: i64) -> f64 {
        let mut hasher = DefaultHasher::new();
        self.base_seed.hash(&mut hasher);
        stream.hash(&mut hasher);
        key.hash(&mut hasher);
        let mut side = StdRng::seed_from_u64(hasher.finish());
        side.gen_range(0.0..1.0)
    }
}

/// Dedicated URR-band-sampling stream draw, keyed by nuclide id so two
/// collisions of the same nuclide at different temperatures see the same
/// draw. `calculate_urr_xs` calls this rather than `future_prn` directly.
pub fn urr_prn<R: RandomStream + ?Sized>(rng: &mut R, nuclide_id: i64) -> f64 {
    rng.future_prn(STREAM_URR_PTABLE, nuclide_id)
}
