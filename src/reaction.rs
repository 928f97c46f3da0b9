//! Depletion reaction records.
//!
//! A locally-thresholded value array: `value[0]` corresponds to the
//! nuclide's own grid point `threshold_idx`, not to the start of the
//! nuclide's energy grid, so lookups must offset by the threshold before
//! indexing.

/// One depletion reaction's per-temperature table: the grid index at which
/// the reaction turns on, and the cross-section values from that index
/// onward.
#[derive(Debug, Clone)]
pub struct DepletionReaction {
    pub mt: i32,
    pub threshold_idx: usize,
    pub value: Vec<f64>,
}

impl DepletionReaction {
    pub fn new(mt: i32, threshold_idx: usize, value: Vec<f64>) -> Self {
        DepletionReaction {
            mt,
            threshold_idx,
            value,
        }
    }

    /// Interpolate the reaction's cross section given the nuclide's grid
    /// index `i_grid` and interpolation factor `f`, as already computed by
    /// the tabulated branch's energy-grid search. Returns `None` if
    /// `i_grid` falls below this reaction's threshold.
    pub fn cross_section_at(&self, i_grid: usize, f: f64) -> Option<f64> {
        if i_grid < self.threshold_idx || self.value.is_empty() {
            return None;
        }
        let local = i_grid - self.threshold_idx;
        if local + 1 >= self.value.len() {
            return self.value.last().copied();
        }
        Some(self.value[local] + f * (self.value[local + 1] - self.value[local]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_threshold_is_none() {
        let rx = DepletionReaction::new(102, 5, vec![1.0, 2.0, 3.0]);
        assert_eq!(rx.cross_section_at(3, 0.5), None);
    }

    #[test]
    fn test_at_threshold_interpolates() {
        let rx = DepletionReaction::new(102, 5, vec![1.0, 2.0, 3.0]);
        assert_eq!(rx.cross_section_at(5, 0.0), Some(1.0));
        assert_eq!(rx.cross_section_at(5, 0.5), Some(1.5));
        assert_eq!(rx.cross_section_at(6, 0.0), Some(2.0));
    }

    #[test]
    fn test_past_end_clamps_to_last_value() {
        let rx = DepletionReaction::new(16, 0, vec![1.0, 2.0]);
        assert_eq!(rx.cross_section_at(1, 0.9), Some(2.0));
    }
}
