//! Imputation module for handling missing values.
//!
//! [`MissingValueHandler`] applies one [`MissingStrategy`] to a whole
//! dataset:
//! - drop every row that has a missing cell
//! - statistical imputation (mean, median, mode) per column

mod statistical;

pub use statistical::StatisticalImputer;

use crate::config::MissingStrategy;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::utils::filter_rows;
use tracing::{debug, info};

/// Applies a missing-value strategy to a dataset.
pub struct MissingValueHandler;

impl MissingValueHandler {
    /// Produce a new dataset with missing values handled.
    ///
    /// `None` returns the input unchanged. `Mean` and `Median` only touch
    /// numeric columns; `Mode` touches every column with a gap. The input
    /// is never modified, so a failure leaves the caller's data intact.
    pub fn apply(
        dataset: &Dataset,
        strategy: Option<MissingStrategy>,
        processing_steps: &mut Vec<String>,
    ) -> Result<Dataset> {
        let Some(strategy) = strategy else {
            debug!("No missing-value strategy selected");
            return Ok(dataset.clone());
        };

        info!("Handling missing values with strategy: {}", strategy);
        match strategy {
            MissingStrategy::Drop => Self::drop_rows(dataset, processing_steps),
            MissingStrategy::Mean | MissingStrategy::Median => {
                Self::fill_numeric(dataset, strategy, processing_steps)
            }
            MissingStrategy::Mode => Self::fill_mode(dataset, processing_steps),
        }
    }

    /// Remove every row that contains at least one missing cell.
    fn drop_rows(dataset: &Dataset, processing_steps: &mut Vec<String>) -> Result<Dataset> {
        let frame = dataset.frame();
        let mut keep = vec![true; frame.height()];
        for column in frame.get_columns() {
            if column.null_count() == 0 {
                continue;
            }
            let nulls = column.as_materialized_series().is_null();
            for (row, is_null) in nulls.into_iter().enumerate() {
                if is_null.unwrap_or(false) {
                    keep[row] = false;
                }
            }
        }

        let dropped = keep.iter().filter(|k| !**k).count();
        if dropped == 0 {
            return Ok(dataset.clone());
        }

        let filtered = filter_rows(frame, &keep)?;
        processing_steps.push(format!(
            "Dropped {} rows containing missing values",
            dropped
        ));
        dataset.derive(filtered)
    }

    fn fill_numeric(
        dataset: &Dataset,
        strategy: MissingStrategy,
        processing_steps: &mut Vec<String>,
    ) -> Result<Dataset> {
        let mut frame = dataset.frame().clone();
        for col_name in dataset.numeric_columns() {
            match strategy {
                MissingStrategy::Median => {
                    StatisticalImputer::apply_numeric_median(&mut frame, col_name, processing_steps)?
                }
                _ => StatisticalImputer::apply_numeric_mean(&mut frame, col_name, processing_steps)?,
            }
        }
        dataset.derive(frame)
    }

    fn fill_mode(dataset: &Dataset, processing_steps: &mut Vec<String>) -> Result<Dataset> {
        let mut frame = dataset.frame().clone();
        for col_name in dataset.schema().names() {
            StatisticalImputer::apply_mode_imputation(&mut frame, col_name, processing_steps)?;
        }
        dataset.derive(frame)
    }
}
