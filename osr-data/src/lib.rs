//! Baselines, lag alignment, peak extraction and sighting aggregation over
//! per-year series.
//!
//! Every function here is a pure transformation of loaded series into new
//! tables; nothing reads files or keeps state between calls.
//!
//! ```
//! use osr_calendar::CalendarDay;
//! use osr_data::baseline::{with_baseline, BaselineWindow};
//! use osr_series::site::Site;
//! use osr_series::year_series::{SeriesPoint, YearArena, YearSeries};
//!
//! let arena: YearArena = [(2018, 1.0), (2019, 2.0), (2021, 4.0)]
//!     .into_iter()
//!     .map(|(year, v)| {
//!         let point = SeriesPoint { day: CalendarDay::new(4, 15), value: Some(v) };
//!         YearSeries::new(Site::AlbionCpue, year, vec![point], Vec::new())
//!     })
//!     .collect();
//! let view = with_baseline(Site::AlbionCpue, &arena, 2021, BaselineWindow::excluding(1));
//! assert_eq!(view.baseline_on(CalendarDay::new(4, 15)), Some(1.5));
//! ```

pub mod aggregate;
pub mod baseline;
pub mod error;
pub mod lagged;
pub mod peaks;

pub use error::{EngineError, Result};

/// Numeric helpers shared by the baseline and peak engines.
pub mod stats {
    /// Percentile by linear interpolation between closest ranks.
    ///
    /// The rank of `p` is `p / 100 * (n - 1)` over the sorted values, the
    /// same definition spreadsheet and dataframe tools use by default.
    /// Returns `None` for an empty slice.
    pub fn percentile_linear(values: &[f64], p: f64) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let rank = p / 100.0 * (sorted.len() - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = rank.ceil() as usize;
        let fraction = rank - lower as f64;
        Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
    }

    /// Round half to even at `places` decimals.
    pub fn round_to(value: f64, places: u32) -> f64 {
        let scale = 10f64.powi(places as i32);
        (value * scale).round_ties_even() / scale
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_percentile_linear() {
            let values = [15.0, 20.0, 35.0, 40.0, 50.0];
            assert_eq!(percentile_linear(&values, 0.0), Some(15.0));
            assert_eq!(percentile_linear(&values, 100.0), Some(50.0));
            assert_eq!(percentile_linear(&values, 50.0), Some(35.0));
            // rank 0.4 * 4 = 1.6, between 20 and 35
            let p40 = percentile_linear(&values, 40.0).unwrap();
            assert!((p40 - 29.0).abs() < 1e-9);
        }

        #[test]
        fn test_percentile_ignores_input_order() {
            let values = [50.0, 15.0, 40.0, 20.0, 35.0];
            assert_eq!(percentile_linear(&values, 50.0), Some(35.0));
            assert_eq!(percentile_linear(&[7.0], 95.0), Some(7.0));
            assert_eq!(percentile_linear(&[], 95.0), None);
        }

        #[test]
        fn test_round_to() {
            assert_eq!(round_to(1.333333, 2), 1.33);
            assert_eq!(round_to(2.25, 1), 2.2);
            assert_eq!(round_to(2.35, 1), 2.4);
            assert_eq!(round_to(1234.56, 1), 1234.6);
        }
    }
}
