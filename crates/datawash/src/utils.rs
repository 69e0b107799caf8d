//! Shared utilities for the cleaning workflow.
//!
//! This module contains the dtype helpers and Series helpers used across
//! the imputers, the outlier filter and the profiler.

use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Datetime(_, _) | DataType::Date | DataType::Time
    )
}

/// Check if a DataType is boolean.
#[inline]
pub fn is_boolean_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Boolean)
}

/// Check if a DataType is categorical.
#[inline]
pub fn is_categorical_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Categorical(_, _))
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Materialize a numeric Series as `f64` values, keeping positions.
///
/// `NaN` is reported as missing so that it never leaks into the statistics.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let float_series = series.cast(&DataType::Float64)?;
    let values = float_series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}

/// Non-missing values of a numeric Series, sorted ascending.
pub fn sorted_non_null(values: &[Option<f64>]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Quantile with linear interpolation between closest ranks.
///
/// `sorted` must be ascending and free of missing values.
pub fn quantile_linear(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Mean of the non-missing values.
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, n) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { None } else { Some(sum / n as f64) }
}

/// Standard deviation of the non-missing values with `ddof` degrees of
/// freedom removed (0 = population, 1 = sample).
pub fn std_dev(values: &[Option<f64>], ddof: usize) -> Option<f64> {
    let mean = mean(values)?;
    let n = values.iter().flatten().count();
    if n <= ddof {
        return None;
    }
    let variance = values
        .iter()
        .flatten()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / (n - ddof) as f64;
    Some(variance.sqrt())
}

/// Row index of the most frequent non-missing value of a Series.
///
/// Ties resolve to the value that appears first. Returns `None` when
/// every value is missing.
pub fn modal_index(series: &Series) -> PolarsResult<Option<usize>> {
    let str_series = series.cast(&DataType::String)?;
    let str_chunked = str_series.str()?;

    // value -> (count, first row index)
    let mut value_counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (idx, val) in str_chunked.into_iter().enumerate() {
        if let Some(val) = val {
            value_counts.entry(val).or_insert((0, idx)).0 += 1;
        }
    }

    Ok(value_counts
        .into_values()
        .max_by(|(count_a, first_a), (count_b, first_b)| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(_, first)| first))
}

/// Count the distinct non-missing values of a Series and find its mode.
///
/// Returns `(unique, top, freq)`; `top` is `None` when every value is missing.
pub fn value_frequency(series: &Series) -> PolarsResult<(usize, Option<String>, usize)> {
    let str_series = series.cast(&DataType::String)?;
    let str_chunked = str_series.str()?;

    let mut value_counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (idx, val) in str_chunked.into_iter().enumerate() {
        if let Some(val) = val {
            value_counts.entry(val).or_insert((0, idx)).0 += 1;
        }
    }

    let unique = value_counts.len();
    let top = value_counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(val, (count, _))| (val.to_string(), count));

    Ok(match top {
        Some((val, count)) => (unique, Some(val), count),
        None => (unique, None, 0),
    })
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let float_series = series.cast(&DataType::Float64)?;
    let filled: Vec<Option<f64>> = float_series
        .f64()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();

    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values with the value found at `source_idx`, keeping the dtype.
pub fn fill_nulls_from_index(series: &Series, source_idx: usize) -> PolarsResult<Series> {
    let mask = series.is_null();
    let indices: Vec<IdxSize> = mask
        .into_iter()
        .enumerate()
        .map(|(i, is_null)| {
            if is_null.unwrap_or(false) {
                source_idx as IdxSize
            } else {
                i as IdxSize
            }
        })
        .collect();

    let idx = IdxCa::from_vec("idx".into(), indices);
    series.take(&idx)
}

/// Keep the rows of `df` whose entry in `keep` is true.
pub fn filter_rows(df: &DataFrame, keep: &[bool]) -> PolarsResult<DataFrame> {
    let mask = BooleanChunked::from_slice("mask".into(), keep);
    df.filter(&mask)
}

/// Render up to `max_rows` values of a Series as display strings.
pub fn display_values(series: &Series, max_rows: usize) -> PolarsResult<Vec<Option<String>>> {
    let head = series.head(Some(max_rows));
    let str_series = head.cast(&DataType::String)?;
    Ok(str_series
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_is_datetime_dtype() {
        assert!(is_datetime_dtype(&DataType::Date));
        assert!(is_datetime_dtype(&DataType::Datetime(
            TimeUnit::Milliseconds,
            None
        )));
        assert!(!is_datetime_dtype(&DataType::String));
    }

    #[test]
    fn test_quantile_linear() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_linear(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile_linear(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile_linear(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile_linear(&sorted, 1.0), Some(4.0));
        assert_eq!(quantile_linear(&[], 0.5), None);
    }

    #[test]
    fn test_std_dev() {
        let values = [Some(1.0), Some(2.0), None, Some(3.0), Some(4.0), Some(5.0)];
        let sample = std_dev(&values, 1).unwrap();
        assert!((sample - 2.5f64.sqrt()).abs() < 1e-12);
        let population = std_dev(&values, 0).unwrap();
        assert!((population - 2.0f64.sqrt()).abs() < 1e-12);
        assert_eq!(std_dev(&[Some(5.0)], 1), None);
        assert_eq!(mean(&[None, None]), None);
    }

    #[test]
    fn test_numeric_values_treats_nan_as_missing() {
        let series = Series::new("x".into(), &[Some(1.0), Some(f64::NAN), None]);
        let values = numeric_values(&series).unwrap();
        assert_eq!(values, vec![Some(1.0), None, None]);
    }

    #[test]
    fn test_modal_index_first_encountered_wins_ties() {
        let series = Series::new("s".into(), &[Some("b"), None, Some("a"), Some("a"), Some("b")]);
        // "b" and "a" both appear twice, "b" is seen first
        assert_eq!(modal_index(&series).unwrap(), Some(0));

        let series = Series::new("s".into(), &[Some(3i64), Some(1), Some(1)]);
        assert_eq!(modal_index(&series).unwrap(), Some(1));

        let series = Series::new("s".into(), &[None::<i64>, None]);
        assert_eq!(modal_index(&series).unwrap(), None);
    }

    #[test]
    fn test_value_frequency() {
        let series = Series::new("s".into(), &[Some("x"), Some("y"), Some("x"), None]);
        let (unique, top, freq) = value_frequency(&series).unwrap();
        assert_eq!(unique, 2);
        assert_eq!(top.as_deref(), Some("x"));
        assert_eq!(freq, 2);
    }

    #[test]
    fn test_fill_numeric_nulls() {
        let series = Series::new("test".into(), &[Some(1.0), None, Some(3.0)]);
        let filled = fill_numeric_nulls(&series, 0.0).unwrap();

        assert_eq!(filled.null_count(), 0);
        assert_eq!(filled.get(1).unwrap().try_extract::<f64>().unwrap(), 0.0);
        assert_eq!(filled.get(2).unwrap().try_extract::<f64>().unwrap(), 3.0);
    }

    #[test]
    fn test_fill_nulls_from_index_keeps_dtype() {
        let series = Series::new("n".into(), &[Some(7i64), None, Some(9)]);
        let filled = fill_nulls_from_index(&series, 2).unwrap();
        assert_eq!(filled.dtype(), &DataType::Int64);
        assert_eq!(filled.null_count(), 0);
        assert_eq!(filled.get(1).unwrap().try_extract::<i64>().unwrap(), 9);
        assert_eq!(filled.get(0).unwrap().try_extract::<i64>().unwrap(), 7);
    }

    #[test]
    fn test_filter_rows() {
        let df = df!["a" => [1, 2, 3]].unwrap();
        let filtered = filter_rows(&df, &[true, false, true]).unwrap();
        assert_eq!(filtered.height(), 2);
    }
}
