// Utility functions for the cross section evaluation core.
//
// `log_bucket_index` and `GridIndexTable` build on the bitwise binary
// search helpers below to implement the shared logarithmic lattice the
// per-nuclide grid search is built on.

/// Linear interpolation on a linear scale.
///
/// Given arrays of x and y values, interpolate to find the y value at x_new.
/// If x_new is outside the range of x, returns the first or last y value.
pub fn interpolate_linear(x: &[f64], y: &[f64], x_new: f64) -> f64 {
    debug_assert_eq!(x.len(), y.len(), "x and y must be same length");
    if x.is_empty() {
        return f64::NAN;
    }
    if x.len() == 1 {
        return y[0];
    }
    if x_new <= x[0] {
        return y[0];
    }
    if x_new >= x[x.len() - 1] {
        return y[y.len() - 1];
    }
    let idx = find_interval_bitwise_f64(x, x_new);
    let (x1, x2, y1, y2) = (x[idx], x[idx + 1], y[idx], y[idx + 1]);
    y1 + (x_new - x1) * (y2 - y1) / (x2 - x1)
}

/// Log-log interpolation.
///
/// Given arrays of x and y values, interpolate on a log-log scale to find
/// the y value at x_new. If x_new is outside the range of x, returns the
/// first or last y value. All x and y values must be positive.
pub fn interpolate_log_log(x: &[f64], y: &[f64], x_new: f64) -> f64 {
    debug_assert_eq!(x.len(), y.len(), "x and y must be same length");
    if x.is_empty() {
        return f64::NAN;
    }
    if x.len() == 1 {
        return y[0];
    }
    if x_new <= x[0] {
        return y[0];
    }
    if x_new >= x[x.len() - 1] {
        return y[y.len() - 1];
    }
    let idx = find_interval_bitwise_f64(x, x_new);
    let (x1, x2, y1, y2) = (x[idx], x[idx + 1], y[idx], y[idx + 1]);
    let log_x_new = x_new.ln();
    let log_y_new =
        y1.ln() + (log_x_new - x1.ln()) * (y2.ln() - y1.ln()) / (x2.ln() - x1.ln());
    log_y_new.exp()
}

/// Bitwise binary search interval finder for f64 arrays.
/// Returns i such that x[i] <= x_new < x[i+1]. Assumes:
///  * x sorted ascending
///  * all values finite and non-negative (so IEEE-754 bit ordering matches numeric ordering)
pub fn find_interval_bitwise_f64(x: &[f64], x_new: f64) -> usize {
    debug_assert!(x.len() >= 2);
    let target = x_new.to_bits();
    let mut low: isize = 0;
    let mut high: isize = (x.len() as isize) - 2; // last valid start index
    while low <= high {
        let mid = (low + high) >> 1;
        let m = mid as usize;
        if x[m + 1].to_bits() <= target {
            low = mid + 1;
        } else if x[m].to_bits() > target {
            high = mid - 1;
        } else {
            return m;
        }
    }
    (low.saturating_sub(1)) as usize
}

/// Binary search restricted to the half-open index window `[lo, hi)`,
/// returning an index relative to the full slice `x`. Used by the grid
/// search once the shared logarithmic lattice has narrowed the window.
pub fn find_interval_in_window(x: &[f64], lo: usize, hi: usize, x_new: f64) -> usize {
    debug_assert!(hi > lo && hi <= x.len());
    find_interval_bitwise_f64(&x[lo..hi], x_new) + lo
}

/// Precompute slopes ( (y[i+1]-y[i]) / (x[i+1]-x[i]) ) for linear interpolation.
pub fn precompute_slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    debug_assert_eq!(x.len(), y.len());
    if x.len() < 2 {
        return Vec::new();
    }
    (0..x.len() - 1)
        .map(|i| (y[i + 1] - y[i]) / (x[i + 1] - x[i]))
        .collect()
}

/// Map an energy to its bucket on the shared logarithmic lattice:
/// `floor(ln(E / E_min) / log_spacing)`, clamped to a valid bucket.
pub fn log_bucket_index(e: f64, e_min: f64, log_spacing: f64, n_buckets: usize) -> usize {
    if e <= e_min {
        return 0;
    }
    let bucket = ((e / e_min).ln() / log_spacing).floor();
    if bucket < 0.0 {
        0
    } else {
        (bucket as usize).min(n_buckets.saturating_sub(1))
    }
}

/// Unionized energy-grid acceleration structure: for each bucket on the
/// shared logarithmic lattice, the index of the last grid point at or
/// below that bucket's energy. Narrows a nuclide-specific binary search
/// to `[grid_index[i], grid_index[i+1] + 1)`.
#[derive(Debug, Clone)]
pub struct GridIndexTable {
    pub log_spacing: f64,
    pub e_min: f64,
    pub grid_index: Vec<usize>,
}

impl GridIndexTable {
    /// Build the lattice for a single ascending energy grid.
    pub fn build(grid: &[f64], e_min: f64, log_spacing: f64, n_buckets: usize) -> Self {
        let mut grid_index = Vec::with_capacity(n_buckets + 1);
        let mut j = 0usize;
        for bucket in 0..=n_buckets {
            let e_bucket = e_min * (bucket as f64 * log_spacing).exp();
            while j + 1 < grid.len() && grid[j + 1] <= e_bucket {
                j += 1;
            }
            grid_index.push(j);
        }
        GridIndexTable {
            log_spacing,
            e_min,
            grid_index,
        }
    }

    /// Return the `[lo, hi)` search window (in grid coordinates, `hi`
    /// exclusive) for the bucket containing `e`.
    pub fn window(&self, e: f64) -> (usize, usize) {
        let n_buckets = self.grid_index.len().saturating_sub(1);
        let bucket = log_bucket_index(e, self.e_min, self.log_spacing, n_buckets.max(1));
        let lo = self.grid_index[bucket];
        let hi = (self.grid_index[(bucket + 1).min(self.grid_index.len() - 1)] + 2)
            .min(usize::MAX);
        (lo, hi)
    }
}

/// Stochastic temperature-interpolation index shared by the tabulated
/// branch and `SabEval`: locate the bracketing
/// pair `kts[i] <= kt < kts[i+1]`, compute `f`, draw a uniform sample, and
/// advance to `i+1` iff `f` exceeds it. No physical averaging happens at
/// runtime; this is a pure sampling decision.
pub fn stochastic_temperature_index<R: crate::rng::RandomStream + ?Sized>(
    kts: &[f64],
    kt: f64,
    rng: &mut R,
) -> usize {
    if kts.len() <= 1 {
        return 0;
    }
    if kt <= kts[0] {
        return 0;
    }
    if kt >= *kts.last().unwrap() {
        return kts.len() - 1;
    }
    let i = find_interval_bitwise_f64(kts, kt);
    let f = (kt - kts[i]) / (kts[i + 1] - kts[i]);
    let u = rng.sample();
    if f > u {
        i + 1
    } else {
        i
    }
}

/// Nearest tabulated temperature index by plain argmin (/// tabulated-branch "nearest" rule).
pub fn nearest_temperature_index(kts: &[f64], kt: f64) -> usize {
    kts.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - kt).abs().partial_cmp(&(*b - kt).abs()).unwrap())
        .map(|(i, _)| i)
        .unwrap_or(0)
}
