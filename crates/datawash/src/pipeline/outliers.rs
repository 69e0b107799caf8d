//! Outlier handling module.
//!
//! Removes rows whose numeric values fall outside IQR bounds or above a
//! z-score cutoff.

use crate::config::OutlierMethod;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::utils::{filter_rows, mean, numeric_values, quantile_linear, sorted_non_null, std_dev};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Statistics computed for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OutlierBounds {
    /// Rows outside `[lower, upper]` are outliers.
    Iqr {
        q1: f64,
        q3: f64,
        lower: f64,
        upper: f64,
    },
    /// Rows with `(x - mean) / std >= threshold` are outliers.
    ZScore { mean: f64, std: f64, threshold: f64 },
}

/// Per-column result of outlier detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnOutliers {
    pub column: String,
    pub bounds: OutlierBounds,
    /// Rows flagged by this column alone.
    pub flagged: usize,
}

/// Handles outlier detection and treatment.
pub struct OutlierHandler;

impl OutlierHandler {
    /// Remove the rows flagged as outliers in any numeric column.
    ///
    /// `threshold` is the IQR multiplier for [`OutlierMethod::Iqr`] and the
    /// z-score cutoff for [`OutlierMethod::ZScore`]. Missing values never
    /// flag a row.
    pub fn apply(
        dataset: &Dataset,
        method: Option<OutlierMethod>,
        threshold: f64,
        processing_steps: &mut Vec<String>,
    ) -> Result<(Dataset, Vec<ColumnOutliers>)> {
        let Some(method) = method else {
            debug!("No outlier method selected");
            return Ok((dataset.clone(), Vec::new()));
        };

        let numeric_columns = dataset.numeric_columns();
        if numeric_columns.is_empty() {
            processing_steps.push(format!(
                "No numeric columns available for outlier detection ({})",
                method
            ));
            info!("No numeric columns, skipping outlier detection");
            return Ok((dataset.clone(), Vec::new()));
        }

        info!("Detecting outliers with {} (threshold {})", method, threshold);
        let mut keep = vec![true; dataset.height()];
        let mut stats = Vec::with_capacity(numeric_columns.len());

        for col_name in numeric_columns {
            let values = numeric_values(dataset.series(col_name)?)?;
            let bounds = match method {
                OutlierMethod::Iqr => Self::iqr_bounds(&values, threshold),
                OutlierMethod::ZScore => Self::zscore_bounds(&values, threshold),
            };
            let Some(bounds) = bounds else {
                warn!("'{}' has no values, skipped for outlier detection", col_name);
                continue;
            };

            let mut flagged = 0;
            for (row, value) in values.iter().enumerate() {
                if let Some(v) = value
                    && !Self::is_within(&bounds, *v)
                {
                    flagged += 1;
                    keep[row] = false;
                }
            }

            debug!("'{}': {:?}, {} rows flagged", col_name, bounds, flagged);
            stats.push(ColumnOutliers {
                column: col_name.to_string(),
                bounds,
                flagged,
            });
        }

        let rows_removed = keep.iter().filter(|k| !**k).count();
        processing_steps.push(format!(
            "Removed {} rows containing outliers ({})",
            rows_removed, method
        ));
        if rows_removed == 0 {
            return Ok((dataset.clone(), stats));
        }

        let filtered = filter_rows(dataset.frame(), &keep)?;
        debug!("Removed {} outlier rows", rows_removed);
        Ok((dataset.derive(filtered)?, stats))
    }

    /// Q1/Q3 with linear interpolation and `k * IQR` bounds.
    fn iqr_bounds(values: &[Option<f64>], k: f64) -> Option<OutlierBounds> {
        let sorted = sorted_non_null(values);
        let q1 = quantile_linear(&sorted, 0.25)?;
        let q3 = quantile_linear(&sorted, 0.75)?;
        let iqr = q3 - q1;
        Some(OutlierBounds::Iqr {
            q1,
            q3,
            lower: q1 - k * iqr,
            upper: q3 + k * iqr,
        })
    }

    /// Mean and population standard deviation.
    fn zscore_bounds(values: &[Option<f64>], threshold: f64) -> Option<OutlierBounds> {
        let mean = mean(values)?;
        let std = std_dev(values, 0)?;
        Some(OutlierBounds::ZScore {
            mean,
            std,
            threshold,
        })
    }

    fn is_within(bounds: &OutlierBounds, value: f64) -> bool {
        match *bounds {
            OutlierBounds::Iqr { lower, upper, .. } => value >= lower && value <= upper,
            OutlierBounds::ZScore {
                mean,
                std,
                threshold,
            } => {
                // Only the upper tail is checked.
                let z = if std > 0.0 { (value - mean) / std } else { 0.0 };
                z < threshold
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn dataset(values: &[f64]) -> Dataset {
        Dataset::new(
            df![
                "x" => values,
                "id" => (0..values.len() as i64).collect::<Vec<_>>(),
            ]
            .unwrap(),
        )
    }

    fn ids(dataset: &Dataset) -> Vec<i64> {
        dataset
            .series("id")
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect()
    }

    // ========================================================================
    // IQR tests
    // ========================================================================

    #[test]
    fn test_iqr_bounds_keep_value_inside() {
        // Q1 = 10, Q3 = 20, bounds [-5, 35]
        let data = dataset(&[10.0, 10.0, 10.0, 15.0, 20.0, 20.0, 20.0, 30.0]);
        let mut steps = Vec::new();

        let (out, stats) =
            OutlierHandler::apply(&data, Some(OutlierMethod::Iqr), 1.5, &mut steps).unwrap();

        assert_eq!(out.height(), 8);
        let x_stats = stats.iter().find(|s| s.column == "x").unwrap();
        assert_eq!(
            x_stats.bounds,
            OutlierBounds::Iqr {
                q1: 10.0,
                q3: 20.0,
                lower: -5.0,
                upper: 35.0
            }
        );
        assert_eq!(x_stats.flagged, 0);
        assert_eq!(steps, vec!["Removed 0 rows containing outliers (IQR)".to_string()]);
    }

    #[test]
    fn test_iqr_drops_value_above_upper_bound() {
        let data = dataset(&[10.0, 10.0, 10.0, 15.0, 20.0, 20.0, 20.0, 40.0]);
        let mut steps = Vec::new();

        let (out, _) =
            OutlierHandler::apply(&data, Some(OutlierMethod::Iqr), 1.5, &mut steps).unwrap();

        assert_eq!(out.height(), 7);
        assert!(!ids(&out).contains(&7));
        assert_eq!(steps[0], "Removed 1 rows containing outliers (IQR)");
    }

    #[test]
    fn test_iqr_missing_values_never_disqualify() {
        let data = Dataset::new(
            df![
                "x" => [Some(10.0), Some(10.0), None, Some(20.0), Some(20.0)],
            ]
            .unwrap(),
        );
        let mut steps = Vec::new();

        let (out, _) =
            OutlierHandler::apply(&data, Some(OutlierMethod::Iqr), 1.5, &mut steps).unwrap();
        assert_eq!(out.height(), 5);
        assert_eq!(out.series("x").unwrap().null_count(), 1);
    }

    #[test]
    fn test_row_must_pass_every_column() {
        let data = Dataset::new(
            df![
                "a" => [1.0, 2.0, 3.0, 4.0, 5.0, 100.0],
                "b" => [100.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            ]
            .unwrap(),
        );
        let mut steps = Vec::new();

        let (out, stats) =
            OutlierHandler::apply(&data, Some(OutlierMethod::Iqr), 1.5, &mut steps).unwrap();
        assert_eq!(out.height(), 4);
        assert_eq!(stats.iter().map(|s| s.flagged).sum::<usize>(), 2);
    }

    // ========================================================================
    // z-score tests
    // ========================================================================

    #[test]
    fn test_zscore_at_threshold_is_dropped() {
        // mean 1, population std 3, z(10) = 3
        let mut values = vec![0.0; 9];
        values.push(10.0);
        let data = dataset(&values);
        let mut steps = Vec::new();

        let (out, stats) =
            OutlierHandler::apply(&data, Some(OutlierMethod::ZScore), 3.0, &mut steps).unwrap();

        assert_eq!(out.height(), 9);
        assert!(!ids(&out).contains(&9));
        let x_stats = stats.iter().find(|s| s.column == "x").unwrap();
        assert_eq!(
            x_stats.bounds,
            OutlierBounds::ZScore {
                mean: 1.0,
                std: 3.0,
                threshold: 3.0
            }
        );
        assert_eq!(steps[0], "Removed 1 rows containing outliers (zscore)");
    }

    #[test]
    fn test_zscore_just_below_threshold_is_kept() {
        let mut values = vec![0.0; 9];
        values.push(10.0);
        let data = dataset(&values);
        let mut steps = Vec::new();

        // z(10) = 3 < 3.1
        let (out, _) =
            OutlierHandler::apply(&data, Some(OutlierMethod::ZScore), 3.1, &mut steps).unwrap();
        assert_eq!(out.height(), 10);
    }

    #[test]
    fn test_zscore_large_negative_is_kept() {
        let mut values = vec![0.0; 9];
        values.push(-10.0);
        let data = dataset(&values);
        let mut steps = Vec::new();

        let (out, _) =
            OutlierHandler::apply(&data, Some(OutlierMethod::ZScore), 3.0, &mut steps).unwrap();
        assert_eq!(out.height(), 10);
    }

    #[test]
    fn test_zscore_constant_column_keeps_everything() {
        let data = Dataset::new(df!["c" => [5.0, 5.0, 5.0]].unwrap());
        let mut steps = Vec::new();

        let (out, _) =
            OutlierHandler::apply(&data, Some(OutlierMethod::ZScore), 1.5, &mut steps).unwrap();
        assert_eq!(out.height(), 3);
    }

    // ========================================================================
    // Degenerate inputs
    // ========================================================================

    #[test]
    fn test_no_numeric_columns_is_a_no_op() {
        let data = Dataset::new(df!["name" => ["a", "b"], "flag" => [true, false]].unwrap());
        let mut steps = Vec::new();

        let (out, stats) =
            OutlierHandler::apply(&data, Some(OutlierMethod::Iqr), 1.5, &mut steps).unwrap();
        assert_eq!(out.height(), 2);
        assert!(stats.is_empty());
        assert_eq!(steps.len(), 1);
        assert!(steps[0].starts_with("No numeric columns"));
    }

    #[test]
    fn test_no_method_is_a_no_op() {
        let data = dataset(&[1.0, 1000.0]);
        let mut steps = Vec::new();

        let (out, stats) = OutlierHandler::apply(&data, None, 1.5, &mut steps).unwrap();
        assert_eq!(out.height(), 2);
        assert!(stats.is_empty());
        assert!(steps.is_empty());
    }
}
