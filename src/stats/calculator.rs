//! Statistics Calculator Module
//! Numeric primitives: percentiles, Pearson correlation, histograms, box
//! summaries, quantile bands and weighted composite scores.

use serde::Serialize;
use statrs::statistics::Statistics;

/// Correlation matrix over a fixed column list.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Row-major, NaN where undefined
    pub values: Vec<Vec<f64>>,
}

/// Equal-width histogram.
#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Box plot figures for one group.
#[derive(Debug, Clone, Serialize)]
pub struct BoxSummary {
    pub label: String,
    pub count: usize,
    pub whisker_low: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_high: f64,
}

/// Normalization applied to one composite component before weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalization {
    /// Already in [0, 1]; clamped.
    Unit,
    /// Scaled by the column's own min and max.
    MinMax,
    /// Divided by a constant, then clamped to [0, 1].
    DivideBy(f64),
    /// Mapped from a fixed [lo, hi] scale, then clamped.
    Range(f64, f64),
}

/// One weighted input of a composite score.
pub struct Component<'a> {
    pub values: &'a [Option<f64>],
    pub weight: f64,
    pub normalization: Normalization,
}

impl<'a> Component<'a> {
    pub fn new(values: &'a [Option<f64>], weight: f64, normalization: Normalization) -> Self {
        Self {
            values,
            weight,
            normalization,
        }
    }
}

/// Data-dependent cut points splitting a score into `k` ordinal bands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantileBands {
    /// k + 1 edges: the 0th, 100/k-th, ..., 100th percentiles
    pub edges: Vec<f64>,
}

impl QuantileBands {
    /// Fit band edges on the non-null values. `None` when there is no data.
    pub fn fit(values: &[Option<f64>], k: usize) -> Option<Self> {
        let k = k.max(1);
        let sorted = StatsCalculator::sorted_finite(values);
        if sorted.is_empty() {
            return None;
        }

        let edges = (0..=k)
            .map(|i| StatsCalculator::percentile(&sorted, 100.0 * i as f64 / k as f64))
            .collect();
        Some(Self { edges })
    }

    pub fn quartiles(values: &[Option<f64>]) -> Option<Self> {
        Self::fit(values, 4)
    }

    pub fn band_count(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    /// 1-based band for a value: band i holds `edges[i-1] < v <= edges[i]`,
    /// the minimum itself goes to band 1 and values past the top edge to the
    /// last band.
    pub fn assign(&self, value: f64) -> Option<usize> {
        if !value.is_finite() || self.edges.len() < 2 {
            return None;
        }
        let k = self.band_count();
        let band = self.edges[1..]
            .iter()
            .position(|&edge| value <= edge)
            .map(|i| i + 1)
            .unwrap_or(k);
        Some(band)
    }

    pub fn assign_all(&self, values: &[Option<f64>]) -> Vec<Option<usize>> {
        values
            .iter()
            .map(|v| v.and_then(|x| self.assign(x)))
            .collect()
    }

    /// Assign band labels; `labels` must hold one entry per band.
    pub fn label_all(&self, values: &[Option<f64>], labels: &[&str]) -> Vec<Option<String>> {
        self.assign_all(values)
            .into_iter()
            .map(|band| {
                band.and_then(|b| labels.get(b - 1))
                    .map(|label| label.to_string())
            })
            .collect()
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    pub fn sorted_finite(values: &[Option<f64>]) -> Vec<f64> {
        let mut sorted: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        sorted
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    pub fn mean(values: &[Option<f64>]) -> Option<f64> {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            None
        } else {
            Some(present.iter().mean())
        }
    }

    pub fn sum(values: &[Option<f64>]) -> f64 {
        values.iter().flatten().sum()
    }

    pub fn min_max(values: &[Option<f64>]) -> Option<(f64, f64)> {
        values.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Pearson correlation over rows where both values are present.
    pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
        let (xs, ys): (Vec<f64>, Vec<f64>) = x
            .iter()
            .zip(y.iter())
            .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
            .unzip();

        if xs.len() < 2 {
            return f64::NAN;
        }

        let sx = xs.iter().std_dev();
        let sy = ys.iter().std_dev();
        if sx == 0.0 || sy == 0.0 || !sx.is_finite() || !sy.is_finite() {
            return f64::NAN;
        }

        let cov = xs.iter().covariance(ys.iter());
        (cov / (sx * sy)).clamp(-1.0, 1.0)
    }

    /// Pairwise correlation matrix for named columns.
    pub fn correlation_matrix(columns: &[(String, Vec<Option<f64>>)]) -> CorrelationMatrix {
        let n = columns.len();
        let mut values = vec![vec![f64::NAN; n]; n];

        for i in 0..n {
            for j in i..n {
                let r = Self::pearson(&columns[i].1, &columns[j].1);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        CorrelationMatrix {
            labels: columns.iter().map(|(label, _)| label.clone()).collect(),
            values,
        }
    }

    /// Equal-width histogram over [min, max]; the max lands in the last bin.
    pub fn histogram(values: &[Option<f64>], bins: usize) -> Histogram {
        let bins = bins.max(1);
        let Some((lo, hi)) = Self::min_max(values) else {
            return Histogram {
                edges: Vec::new(),
                counts: Vec::new(),
            };
        };

        let width = if hi > lo { (hi - lo) / bins as f64 } else { 1.0 };
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0usize; bins];

        for &v in values.iter().flatten() {
            let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Histogram { edges, counts }
    }

    /// Quartiles and 1.5 IQR whiskers clipped to the observed range.
    pub fn box_summary(label: &str, values: &[Option<f64>]) -> Option<BoxSummary> {
        let sorted = Self::sorted_finite(values);
        if sorted.is_empty() {
            return None;
        }

        let q1 = Self::percentile(&sorted, 25.0);
        let median = Self::percentile(&sorted, 50.0);
        let q3 = Self::percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let whisker_low = sorted
            .iter()
            .copied()
            .find(|&v| v >= q1 - 1.5 * iqr)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= q3 + 1.5 * iqr)
            .unwrap_or(q3);

        Some(BoxSummary {
            label: label.to_string(),
            count: sorted.len(),
            whisker_low,
            q1,
            median,
            q3,
            whisker_high,
        })
    }

    fn normalize(values: &[Option<f64>], normalization: Normalization) -> Vec<Option<f64>> {
        match normalization {
            Normalization::Unit => values.iter().map(|v| v.map(|x| x.clamp(0.0, 1.0))).collect(),
            Normalization::DivideBy(c) => values
                .iter()
                .map(|v| v.map(|x| if c != 0.0 { (x / c).clamp(0.0, 1.0) } else { 0.0 }))
                .collect(),
            Normalization::Range(lo, hi) => values
                .iter()
                .map(|v| {
                    v.map(|x| {
                        if hi > lo {
                            ((x - lo) / (hi - lo)).clamp(0.0, 1.0)
                        } else {
                            0.0
                        }
                    })
                })
                .collect(),
            Normalization::MinMax => match Self::min_max(values) {
                Some((lo, hi)) if hi > lo => values
                    .iter()
                    .map(|v| v.map(|x| (x - lo) / (hi - lo)))
                    .collect(),
                Some(_) => values.iter().map(|v| v.map(|_| 0.0)).collect(),
                None => values.to_vec(),
            },
        }
    }

    /// Weighted sum of normalized components, row by row. A row missing any
    /// component yields `None`.
    pub fn composite_score(components: &[Component<'_>]) -> Vec<Option<f64>> {
        let rows = components.iter().map(|c| c.values.len()).max().unwrap_or(0);
        let normalized: Vec<(f64, Vec<Option<f64>>)> = components
            .iter()
            .map(|c| (c.weight, Self::normalize(c.values, c.normalization)))
            .collect();

        (0..rows)
            .map(|i| {
                normalized.iter().try_fold(0.0, |acc, (weight, values)| {
                    values.get(i).copied().flatten().map(|v| acc + weight * v)
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_matches_numpy_linear() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(StatsCalculator::percentile(&sorted, 0.0), 1.0);
        assert!((StatsCalculator::percentile(&sorted, 25.0) - 1.75).abs() < 1e-12);
        assert!((StatsCalculator::percentile(&sorted, 50.0) - 2.5).abs() < 1e-12);
        assert_eq!(StatsCalculator::percentile(&sorted, 100.0), 4.0);
    }

    #[test]
    fn histogram_counts_every_value() {
        let values: Vec<Option<f64>> = (0..=10).map(|v| Some(v as f64)).collect();
        let hist = StatsCalculator::histogram(&values, 5);
        assert_eq!(hist.counts.len(), 5);
        assert_eq!(hist.total(), 11);
        assert_eq!(*hist.counts.last().unwrap(), 3);
    }

    #[test]
    fn box_summary_whiskers_exclude_outliers() {
        let mut values: Vec<Option<f64>> = (1..=9).map(|v| Some(v as f64)).collect();
        values.push(Some(100.0));
        let summary = StatsCalculator::box_summary("g", &values).unwrap();
        assert_eq!(summary.count, 10);
        assert_eq!(summary.whisker_high, 9.0);
        assert_eq!(summary.whisker_low, 1.0);
    }
}
