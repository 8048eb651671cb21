//! Histogram equalization
//!
//! Remaps a field so that its values follow their own cumulative
//! distribution. Bins are sized with the Freedman-Diaconis rule from Tukey
//! quartiles, and the cumulative counts are scaled into
//! `[OUTPUT_MIN, OUTPUT_MAX]`, the range the ramp sampler expects.

use crate::error::ViewerError;
use crate::field::{is_missing, ScalarField};

/// Lowest equalized output level
pub const OUTPUT_MIN: f32 = 0.00001;

/// Highest equalized output level
pub const OUTPUT_MAX: f32 = 0.75;

/// Upper bound on the histogram size. Heavy-tailed fields with a tiny IQR
/// would otherwise ask for billions of bins.
pub const MAX_BINS: usize = 1 << 20;

/// Intermediate statistics of one equalization pass.
#[derive(Clone, Debug, PartialEq)]
pub struct HistogramStats {
    /// Number of non-missing samples
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub bin_width: f64,
    pub counts: Vec<u64>,
    pub cumulative: Vec<u64>,
    /// Output level of each bin, within `[OUTPUT_MIN, OUTPUT_MAX]`
    pub levels: Vec<f32>,
}

impl HistogramStats {
    /// Gather statistics over the non-missing samples.
    pub fn compute(values: &[f32]) -> Result<Self, ViewerError> {
        let mut sorted: Vec<f32> = values.iter().copied().filter(|v| !is_missing(*v)).collect();
        if sorted.is_empty() {
            return Err(ViewerError::EmptyField);
        }
        sorted.sort_unstable_by(f32::total_cmp);

        let n = sorted.len();
        let min = sorted[0] as f64;
        let max = sorted[n - 1] as f64;
        if !min.is_finite() || !max.is_finite() {
            return Err(ViewerError::NonFiniteSample);
        }

        let (q1, q3) = quartiles(&sorted).ok_or(ViewerError::ZeroBinWidth { iqr: 0.0 })?;
        let iqr = q3 - q1;

        let mut bin_width = 2.0 * iqr / (n as f64).cbrt();
        if !bin_width.is_finite() || bin_width <= 0.0 {
            return Err(ViewerError::ZeroBinWidth { iqr: iqr as f32 });
        }

        let mut bins = (((max - min) / bin_width).ceil() as usize).max(1);
        if bins > MAX_BINS {
            log::warn!(
                "Freedman-Diaconis asked for {} bins, widening to {}",
                bins,
                MAX_BINS
            );
            bins = MAX_BINS;
            bin_width = (max - min) / MAX_BINS as f64;
        }

        let mut counts = vec![0u64; bins];
        for &v in &sorted {
            counts[bin_index(v as f64, min, bin_width, bins)] += 1;
        }

        let cumulative: Vec<u64> = counts
            .iter()
            .scan(0u64, |acc, &c| {
                *acc += c;
                Some(*acc)
            })
            .collect();

        let cum_min = cumulative[0];
        let cum_max = cumulative[bins - 1];
        let levels = cumulative
            .iter()
            .map(|&c| scale_cumulative(c, cum_min, cum_max))
            .collect();

        log::debug!(
            "Histogram: n={} q1={} q3={} width={} bins={}",
            n,
            q1,
            q3,
            bin_width,
            bins
        );

        Ok(Self {
            count: n,
            min,
            max,
            q1,
            q3,
            iqr,
            bin_width,
            counts,
            cumulative,
            levels,
        })
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Equalized level for a sample; missing samples pass through.
    pub fn level(&self, v: f32) -> f32 {
        if is_missing(v) {
            return v;
        }
        self.levels[bin_index(v as f64, self.min, self.bin_width, self.bins())]
    }
}

/// Equalize a whole field, producing a new one of the same shape.
pub fn equalize(field: &ScalarField) -> Result<ScalarField, ViewerError> {
    let stats = HistogramStats::compute(field.values())?;
    let values = field.values().iter().map(|&v| stats.level(v)).collect();
    field.with_values(values)
}

/// Bin of `v`, clamped so the maximum lands in the last bin.
fn bin_index(v: f64, min: f64, width: f64, bins: usize) -> usize {
    let id = ((v - min) / width).floor();
    if id <= 0.0 {
        0
    } else {
        (id as usize).min(bins - 1)
    }
}

/// Map a cumulative count into the output range.
fn scale_cumulative(c: u64, cum_min: u64, cum_max: u64) -> f32 {
    if cum_max == cum_min {
        return OUTPUT_MIN;
    }
    let lo = OUTPUT_MIN as f64;
    let hi = OUTPUT_MAX as f64;
    let t = (c - cum_min) as f64 / (cum_max - cum_min) as f64;
    (((hi - lo) * t + lo) as f32).clamp(OUTPUT_MIN, OUTPUT_MAX)
}

/// Median of a sorted slice, averaging the two middles for even lengths.
fn median(sorted: &[f32]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2] as f64),
        _ => Some((sorted[n / 2 - 1] as f64 + sorted[n / 2] as f64) / 2.0),
    }
}

/// Tukey quartiles: medians of the lower and upper halves, excluding the
/// overall median element when the count is odd.
fn quartiles(sorted: &[f32]) -> Option<(f64, f64)> {
    let n = sorted.len();
    let lower = &sorted[..n / 2];
    let upper = &sorted[(n + 1) / 2..];
    Some((median(lower)?, median(upper)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(values: Vec<f32>, w: u32, h: u32) -> ScalarField {
        ScalarField::new(values, w, h).unwrap()
    }

    #[test]
    fn test_quartiles_even_and_odd() {
        assert_eq!(quartiles(&[1.0, 2.0, 3.0, 4.0, 6.0, 7.0, 8.0, 9.0]), Some((2.5, 7.5)));
        // Odd count: median 4 is excluded from both halves
        assert_eq!(quartiles(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]), Some((2.0, 6.0)));
        assert_eq!(quartiles(&[1.0, 2.0, 3.0, 4.0, 5.0]), Some((1.5, 4.5)));
        assert_eq!(quartiles(&[1.0]), None);
    }

    #[test]
    fn test_scenario_with_missing_center() {
        let f = field(vec![1.0, 2.0, 3.0, 4.0, f32::NAN, 6.0, 7.0, 8.0, 9.0], 3, 3);
        let eq = equalize(&f).unwrap();

        assert_eq!(eq.len(), f.len());
        assert_eq!(eq.dimensions(), (3, 3));
        assert!(eq.get(4).unwrap().is_nan());

        let finite: Vec<f32> = eq.values().iter().copied().filter(|v| !v.is_nan()).collect();
        assert_eq!(finite.len(), 8);
        assert!(finite.iter().all(|v| (OUTPUT_MIN..=OUTPUT_MAX).contains(v)));
    }

    #[test]
    fn test_scenario_stats() {
        let stats =
            HistogramStats::compute(&[1.0, 2.0, 3.0, 4.0, f32::NAN, 6.0, 7.0, 8.0, 9.0]).unwrap();
        assert_eq!(stats.count, 8);
        assert_eq!(stats.iqr, 5.0);
        assert!((stats.bin_width - 5.0).abs() < 1e-9);
        assert_eq!(stats.bins(), 2);
        assert_eq!(stats.counts, vec![4, 4]);
        assert_eq!(stats.cumulative, vec![4, 8]);
        assert_eq!(stats.levels, vec![OUTPUT_MIN, OUTPUT_MAX]);
    }

    #[test]
    fn test_maximum_lands_in_last_bin() {
        // q1 = 1, q3 = 3, width = 2, range 8: max / width == bins exactly
        let values = [0.0, 1.0, 1.0, 1.0, 3.0, 3.0, 3.0, 8.0];
        let stats = HistogramStats::compute(&values).unwrap();
        assert_eq!(stats.bins(), 4);
        assert_eq!(stats.counts, vec![4, 3, 0, 1]);
        assert_eq!(stats.cumulative, vec![4, 7, 7, 8]);
        assert_eq!(stats.level(8.0), OUTPUT_MAX);
    }

    #[test]
    fn test_output_is_monotonic() {
        let values: Vec<f32> = (0..200).map(|i| ((i * 37) % 101) as f32 * 0.5).collect();
        let f = field(values.clone(), 20, 10);
        let eq = equalize(&f).unwrap();

        let mut pairs: Vec<(f32, f32)> = values.into_iter().zip(eq.values().iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        assert!(pairs.windows(2).all(|w| w[0].1 <= w[1].1));
        assert!(eq.values().iter().all(|v| (OUTPUT_MIN..=OUTPUT_MAX).contains(v)));
    }

    #[test]
    fn test_all_missing_is_rejected() {
        let f = field(vec![f32::NAN; 4], 2, 2);
        assert_eq!(equalize(&f), Err(ViewerError::EmptyField));
        let empty = field(vec![], 0, 0);
        assert_eq!(equalize(&empty), Err(ViewerError::EmptyField));
    }

    #[test]
    fn test_zero_iqr_is_rejected() {
        let f = field(vec![2.0; 9], 3, 3);
        assert!(matches!(equalize(&f), Err(ViewerError::ZeroBinWidth { .. })));

        // Quartiles equal even though the extremes differ
        let f = field(vec![0.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 10.0], 3, 3);
        assert!(matches!(equalize(&f), Err(ViewerError::ZeroBinWidth { .. })));

        let single = field(vec![1.0], 1, 1);
        assert!(matches!(equalize(&single), Err(ViewerError::ZeroBinWidth { .. })));
    }

    #[test]
    fn test_infinite_sample_is_rejected() {
        let f = field(vec![1.0, 2.0, f32::INFINITY, 4.0], 2, 2);
        assert_eq!(equalize(&f), Err(ViewerError::NonFiniteSample));
    }

    #[test]
    fn test_bin_count_is_capped() {
        // Tight cluster plus one far outlier
        let mut values: Vec<f32> = (0..1000).map(|i| 1.0 + i as f32 * 1e-6).collect();
        values.push(1.0e6);
        let stats = HistogramStats::compute(&values).unwrap();
        assert_eq!(stats.bins(), MAX_BINS);
        assert_eq!(stats.level(1.0e6), OUTPUT_MAX);
    }
}
