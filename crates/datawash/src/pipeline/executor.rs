//! Cleaning executor module.
//!
//! Runs the missing-value handler and the outlier filter in order.

use crate::config::{CleaningConfig, MissingStrategy, OutlierMethod};
use crate::dataset::Dataset;
use crate::error::{Result, ResultExt};
use crate::imputers::MissingValueHandler;
use crate::pipeline::outliers::{ColumnOutliers, OutlierHandler};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// What a cleaning run did to the data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    pub rows_before: usize,
    pub rows_after: usize,
    pub rows_removed: usize,

    pub columns_before: usize,
    pub columns_after: usize,

    /// Missing cells before and after cleaning.
    pub missing_before: usize,
    pub missing_after: usize,

    pub missing_strategy: Option<MissingStrategy>,
    pub outlier_method: Option<OutlierMethod>,
}

impl ProcessingSummary {
    /// Percentage of input rows that were removed.
    pub fn rows_removed_percentage(&self) -> f64 {
        if self.rows_before == 0 {
            0.0
        } else {
            self.rows_removed as f64 / self.rows_before as f64 * 100.0
        }
    }
}

/// Output of [`CleaningPipeline::run`].
#[derive(Debug, Clone)]
pub struct CleaningResult {
    pub dataset: Dataset,
    pub processing_steps: Vec<String>,
    pub outliers: Vec<ColumnOutliers>,
    pub summary: ProcessingSummary,
}

/// Missing values first, outliers second.
#[derive(Debug, Clone)]
pub struct CleaningPipeline {
    config: CleaningConfig,
}

impl CleaningPipeline {
    pub fn new(config: CleaningConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Threshold handed to the outlier filter for the configured method.
    fn outlier_threshold(&self) -> f64 {
        match self.config.outlier_method {
            Some(OutlierMethod::ZScore) => self.config.zscore_threshold,
            _ => self.config.iqr_multiplier,
        }
    }

    /// Clean a dataset. The input is left untouched; any failure aborts
    /// the whole run.
    pub fn run(&self, dataset: &Dataset) -> Result<CleaningResult> {
        let start_time = Instant::now();
        let mut processing_steps = Vec::new();

        info!("Starting cleaning run...");
        let mut summary = ProcessingSummary {
            rows_before: dataset.height(),
            columns_before: dataset.width(),
            missing_before: dataset.missing_cells(),
            missing_strategy: self.config.missing_strategy,
            outlier_method: self.config.outlier_method,
            ..Default::default()
        };

        info!("Step 1: Handling missing values...");
        let imputed =
            MissingValueHandler::apply(dataset, self.config.missing_strategy, &mut processing_steps)
                .context("Missing-value handling failed")?;

        info!("Step 2: Handling outliers...");
        let (cleaned, outliers) = OutlierHandler::apply(
            &imputed,
            self.config.outlier_method,
            self.outlier_threshold(),
            &mut processing_steps,
        )
        .context("Outlier filtering failed")?;

        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        summary.rows_after = cleaned.height();
        summary.columns_after = cleaned.width();
        summary.rows_removed = summary.rows_before.saturating_sub(summary.rows_after);
        summary.missing_after = cleaned.missing_cells();

        info!(
            "Cleaning completed: {:?} -> {:?} in {}ms",
            dataset.shape(),
            cleaned.shape(),
            summary.duration_ms
        );
        debug!("Missing values remaining: {}", summary.missing_after);

        Ok(CleaningResult {
            dataset: cleaned,
            processing_steps,
            outliers,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn sample() -> Dataset {
        Dataset::new(
            df![
                "age" => [Some(22.0), None, Some(26.0), Some(35.0), Some(24.0), Some(90.0)],
                "city" => [Some("Paris"), Some("Lyon"), None, Some("Paris"), Some("Nice"), Some("Lyon")],
            ]
            .unwrap(),
        )
    }

    #[test]
    fn test_default_config_is_a_no_op() {
        let pipeline = CleaningPipeline::new(CleaningConfig::default());
        let result = pipeline.run(&sample()).unwrap();

        assert_eq!(result.dataset.height(), 6);
        assert!(result.processing_steps.is_empty());
        assert_eq!(result.summary.missing_before, 2);
        assert_eq!(result.summary.missing_after, 2);
        assert_eq!(result.summary.rows_removed, 0);
    }

    #[test]
    fn test_missing_then_outliers() {
        let config = CleaningConfig::builder()
            .missing_strategy(Some(MissingStrategy::Median))
            .outlier_method(Some(OutlierMethod::Iqr))
            .build()
            .unwrap();
        let result = CleaningPipeline::new(config).run(&sample()).unwrap();

        // median(22, 26, 35, 24, 90) = 26 fills row 1; 90 is above the IQR bound
        assert_eq!(result.dataset.height(), 5);
        assert_eq!(result.summary.rows_removed, 1);
        assert_eq!(result.summary.missing_after, 1);
        assert_eq!(result.processing_steps.len(), 2);
        assert!(result.processing_steps[0].starts_with("Filled 'age' with median"));
        assert_eq!(
            result.processing_steps[1],
            "Removed 1 rows containing outliers (IQR)"
        );
        assert_eq!(result.summary.outlier_method, Some(OutlierMethod::Iqr));
    }

    #[test]
    fn test_zscore_uses_its_own_threshold() {
        let config = CleaningConfig::builder()
            .outlier_method(Some(OutlierMethod::ZScore))
            .iqr_multiplier(100.0)
            .zscore_threshold(1.8)
            .build()
            .unwrap();
        let pipeline = CleaningPipeline::new(config);
        assert_eq!(pipeline.outlier_threshold(), 1.8);

        let result = pipeline.run(&sample()).unwrap();
        assert_eq!(result.dataset.height(), 5);
    }

    #[test]
    fn test_failure_is_reported_with_context() {
        let dataset = Dataset::new(
            df![
                "empty" => [Option::<&str>::None, None],
            ]
            .unwrap(),
        );
        let config = CleaningConfig::builder()
            .missing_strategy(Some(MissingStrategy::Mode))
            .build()
            .unwrap();

        let err = CleaningPipeline::new(config).run(&dataset).unwrap_err();
        assert_eq!(err.error_code(), "NO_MODAL_VALUE");
        assert!(err.to_string().starts_with("Missing-value handling failed"));
    }
}
