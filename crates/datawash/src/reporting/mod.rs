//! Report generation module.
//!
//! Builds the exploratory data analysis of a dataset: descriptive
//! statistics, a preview, missing-value counts, column types and a
//! correlation heatmap.
//!
//! # Example
//!
//! ```rust,ignore
//! use datawash::reporting::EdaReporter;
//!
//! let report = EdaReporter::new(5).build(&dataset)?;
//! println!("{}", report.render_text());
//!
//! // Or as JSON
//! report.write_to_file(Path::new("outputs"), "titanic")?;
//! ```

mod generator;
mod heatmap;

pub use generator::{EdaReport, EdaReporter, PreviewTable};
pub use heatmap::{HeatmapMatrix, NO_NUMERIC_COLUMNS_NOTE, correlation_matrix};
