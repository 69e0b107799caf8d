//! Descriptive statistics for a single column.

use crate::utils::{mean, numeric_values, quantile_linear, sorted_non_null, std_dev, value_frequency};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// `describe()`-style summary of a numeric column.
///
/// Every statistic except `count` is `None` when it is undefined for the
/// data (no values at all, or a single value for `std`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub median: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl NumericSummary {
    /// Statistic labels in display order.
    pub const LABELS: [&'static str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

    /// Statistics in the order of [`Self::LABELS`].
    pub fn values(&self) -> [Option<f64>; 8] {
        [
            Some(self.count as f64),
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max,
        ]
    }
}

/// `describe()`-style summary of a non-numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

/// Summarize a numeric column. Sample standard deviation (ddof = 1).
pub(crate) fn summarize_numeric(series: &Series) -> PolarsResult<NumericSummary> {
    let values = numeric_values(series)?;
    let sorted = sorted_non_null(&values);

    Ok(NumericSummary {
        column: series.name().to_string(),
        count: sorted.len(),
        mean: mean(&values),
        std: std_dev(&values, 1),
        min: sorted.first().copied(),
        q25: quantile_linear(&sorted, 0.25),
        median: quantile_linear(&sorted, 0.5),
        q75: quantile_linear(&sorted, 0.75),
        max: sorted.last().copied(),
    })
}

/// Summarize a non-numeric column by value frequency.
pub(crate) fn summarize_categorical(series: &Series) -> PolarsResult<CategoricalSummary> {
    let (unique, top, freq) = value_frequency(series)?;
    Ok(CategoricalSummary {
        column: series.name().to_string(),
        count: series.len() - series.null_count(),
        unique,
        top,
        freq,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== summarize_numeric tests ====================

    #[test]
    fn test_summarize_numeric_basic() {
        let series = Series::new("val".into(), &[1.0f64, 2.0, 3.0, 4.0, 5.0]);
        let summary = summarize_numeric(&series).unwrap();

        assert_eq!(summary.count, 5);
        assert_eq!(summary.mean, Some(3.0));
        // Variance = 10 / 4 = 2.5
        assert!((summary.std.unwrap() - 2.5f64.sqrt()).abs() < 1e-12);
        assert_eq!(summary.min, Some(1.0));
        assert_eq!(summary.q25, Some(2.0));
        assert_eq!(summary.median, Some(3.0));
        assert_eq!(summary.q75, Some(4.0));
        assert_eq!(summary.max, Some(5.0));
    }

    #[test]
    fn test_summarize_numeric_ignores_missing() {
        let series = Series::new("val".into(), &[Some(10i64), None, Some(20)]);
        let summary = summarize_numeric(&series).unwrap();

        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean, Some(15.0));
        assert_eq!(summary.median, Some(15.0));
    }

    #[test]
    fn test_summarize_numeric_single_value_has_no_std() {
        let series = Series::new("val".into(), &[5.0f64]);
        let summary = summarize_numeric(&series).unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.std, None);
        assert_eq!(summary.min, Some(5.0));
    }

    #[test]
    fn test_summarize_numeric_all_missing() {
        let series = Series::new("val".into(), &[None::<f64>, None]);
        let summary = summarize_numeric(&series).unwrap();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.mean, None);
        assert_eq!(summary.max, None);
    }

    // ==================== summarize_categorical tests ====================

    #[test]
    fn test_summarize_categorical() {
        let series = Series::new("sex".into(), &[Some("male"), Some("female"), None, Some("male")]);
        let summary = summarize_categorical(&series).unwrap();

        assert_eq!(summary.count, 3);
        assert_eq!(summary.unique, 2);
        assert_eq!(summary.top.as_deref(), Some("male"));
        assert_eq!(summary.freq, 2);
    }

    #[test]
    fn test_summarize_boolean_as_categorical() {
        let series = Series::new("flag".into(), &[true, false, true]);
        let summary = summarize_categorical(&series).unwrap();
        assert_eq!(summary.unique, 2);
        assert_eq!(summary.top.as_deref(), Some("true"));
    }
}
