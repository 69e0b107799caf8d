//! Data Cleaning and EDA Library
//!
//! Loads a tabular file into memory, handles its missing values and
//! outliers, describes it and exports the result as CSV. Built on Polars.
//!
//! # Overview
//!
//! - **Loading**: `.csv` through the Polars CSV reader, `.xlsx`/`.xls`
//!   through calamine (`excel` feature, on by default)
//! - **Missing values**: drop rows, or fill with mean, median or mode
//! - **Outliers**: IQR bounds or an upper z-score cutoff
//! - **EDA**: descriptive statistics, preview, missing counts, column types
//!   and a Pearson correlation heatmap (text, SVG and JSON)
//! - **Session**: a state object shared by the batch CLI and the
//!   interactive shell
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use datawash::{CleaningConfig, MissingStrategy, OutlierMethod, Session};
//! use std::path::Path;
//!
//! let config = CleaningConfig::builder()
//!     .missing_strategy(Some(MissingStrategy::Median))
//!     .outlier_method(Some(OutlierMethod::Iqr))
//!     .build()?;
//!
//! let mut session = Session::new(config);
//! session.load(Path::new("data/titanic.csv"))?;
//!
//! println!("{}", session.run_eda()?.render_text());
//! let path = session.export(None)?;
//! println!("Saved {}", path.display());
//! ```
//!
//! # Lower-level API
//!
//! Every step is also usable on its own:
//!
//! ```rust,ignore
//! use datawash::{CleaningPipeline, EdaReporter, load_dataset};
//!
//! let dataset = load_dataset(Path::new("data.csv"), None)?;
//! let result = CleaningPipeline::new(config).run(&dataset)?;
//! for step in &result.processing_steps {
//!     println!("{}", step);
//! }
//! let report = EdaReporter::new(5).build(&result.dataset)?;
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod imputers;
pub mod pipeline;
pub mod profiler;
pub mod reporting;
pub mod session;
pub mod shell;
pub mod utils;

// Re-exports for convenience
pub use config::{
    CleaningConfig, CleaningConfigBuilder, ConfigValidationError, MissingStrategy, OutlierMethod,
};
pub use dataset::{
    ColumnKind, ColumnSchema, Dataset, EXPORT_MIME_TYPE, FileFormat, MissingCount, Schema,
    export_csv, load_dataset,
};
pub use error::{CleaningError, ResultExt};
pub use imputers::{MissingValueHandler, StatisticalImputer};
pub use pipeline::{
    CleaningPipeline, CleaningResult, ColumnOutliers, OutlierBounds, OutlierHandler,
    ProcessingSummary,
};
pub use profiler::{CategoricalSummary, DataProfiler, DatasetDescription, NumericSummary};
pub use reporting::{EdaReport, EdaReporter, HeatmapMatrix, PreviewTable, correlation_matrix};
pub use session::{Session, SessionStage, SessionStatus};
pub use shell::{Command, Shell};
