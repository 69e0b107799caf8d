//! Pipeline module.
//!
//! This module provides the cleaning pipeline and the outlier filter.

mod executor;
pub mod outliers;

pub use executor::{CleaningPipeline, CleaningResult, ProcessingSummary};
pub use outliers::{ColumnOutliers, OutlierBounds, OutlierHandler};
