//! Fixed identifiers shared by several modules.
//!
//! Kept as a single small module: ENDF MT numbers and RNG stream tags that
//! would otherwise be inlined as magic numbers at each call site are named
//! here once, since several modules need the same values.

/// ENDF MT numbers for the six depletion reactions tracked per nuclide,
/// in the fixed order the cache stores them. Position 4 (index 3) is the
/// (n,gamma) radiative capture channel, which `NuclideXS` fills in directly
/// from `absorption - fission` on the multipole branch.
pub const DEPLETION_RX: [i32; 6] = [16, 17, 103, 102, 107, 28];

/// Index of (n,gamma) within `DEPLETION_RX` / the per-reaction cache arrays.
pub const DEPLETION_RX_NGAMMA: usize = 3;

/// RNG stream identifier for URR band sampling. Only meaningful as a key
/// into `RandomStream::future_prn`; the core never assumes anything about
/// its numeric value beyond distinctness from other stream tags a caller
/// might use.
pub const STREAM_URR_PTABLE: u64 = 1;

/// ENDF MT for elastic scattering, used to find a nuclide's free-atom
/// elastic reaction both in the 0 K lookup and tabulated branch.
pub const MT_ELASTIC: i32 = 2;
