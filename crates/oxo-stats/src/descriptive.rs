use serde::{Deserialize, Serialize};

/// Descriptive statistics summarizing a dataset.
///
/// The standard deviation is the sample standard deviation (Bessel-corrected).
/// It is reported as `0.0` for fewer than two values or when every value is
/// the same.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    /// Number of values in the dataset.
    pub count: usize,
    /// The minimum value in the dataset.
    pub min: f64,
    /// The maximum value in the dataset.
    pub max: f64,
    /// The arithmetic mean of the dataset.
    pub mean: f64,
    /// The median value of the dataset (upper median for even counts).
    pub median: f64,
    /// The sample standard deviation of the dataset.
    pub std_dev: f64,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from unsorted values.
    ///
    /// Returns `None` if the dataset is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// # use oxo_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::new([5.0, 2.0, 4.0, 1.0, 3.0]).unwrap();
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.median, 3.0);
    /// assert!((stats.std_dev - 2.5_f64.sqrt()).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes descriptive statistics from pre-sorted values.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[expect(clippy::cast_precision_loss, clippy::float_cmp)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let count = sorted_values.len();
        let n = count as f64;
        let mean = sorted_values.iter().sum::<f64>() / n;
        let median = sorted_values[count / 2];
        // exactly zero for constant data
        let std_dev = if count < 2 || min == max {
            0.0
        } else {
            let variance = sorted_values
                .iter()
                .map(|v| (v - mean).powi(2))
                .sum::<f64>()
                / (n - 1.0);
            variance.sqrt()
        };

        Some(Self {
            count,
            min,
            max,
            mean,
            median,
            std_dev,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_dataset() {
        assert!(DescriptiveStats::new([]).is_none());
    }

    #[test]
    fn test_single_value_has_zero_deviation() {
        let stats = DescriptiveStats::new([0.75]).unwrap();
        assert_eq!(stats.count, 1);
        assert!(stats.std_dev.abs() < f64::EPSILON);
        assert!((stats.mean - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_identical_values_have_zero_deviation() {
        let stats = DescriptiveStats::new([0.1; 7]).unwrap();
        assert!(stats.std_dev.abs() < f64::EPSILON);
        assert!((stats.min - stats.max).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sample_deviation() {
        let stats = DescriptiveStats::new([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((stats.mean - 5.0).abs() < 1e-12);
        // population variance is 4, sample variance 32 / 7
        assert!((stats.std_dev - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert!((stats.median - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_json_round_trip() {
        let stats = DescriptiveStats::new([4.0, 0.0, 2.0]).unwrap();
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["count"], 3);
        assert_eq!(json["median"], 2.0);
        assert_eq!(json["std_dev"], 2.0);
        let restored: DescriptiveStats = serde_json::from_value(json).unwrap();
        assert_eq!(restored, stats);
    }

    #[test]
    #[should_panic(expected = "values must be sorted")]
    fn test_from_sorted_rejects_unsorted() {
        let _ = DescriptiveStats::from_sorted(&[2.0, 1.0]);
    }
}
