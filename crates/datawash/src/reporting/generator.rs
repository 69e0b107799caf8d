use super::heatmap::{HeatmapMatrix, NO_NUMERIC_COLUMNS_NOTE, correlation_matrix};
use crate::dataset::{ColumnSchema, Dataset, MissingCount};
use crate::error::{CleaningError, Result};
use crate::pipeline::ProcessingSummary;
use crate::profiler::{DataProfiler, DatasetDescription, NumericSummary};
use crate::utils::display_values;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ============================================================================
// Report Types
// ============================================================================

/// First rows of a dataset rendered as strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewTable {
    pub columns: Vec<String>,
    /// Row-major cells; `None` is a missing value.
    pub rows: Vec<Vec<Option<String>>>,
    /// Polars rendering of the same rows, with dtypes.
    #[serde(skip)]
    rendered: String,
}

impl PreviewTable {
    /// Take the first `max_rows` rows of every column.
    pub fn from_dataset(dataset: &Dataset, max_rows: usize) -> Result<Self> {
        let columns: Vec<String> = dataset.schema().names().map(str::to_string).collect();
        let cells = columns
            .iter()
            .map(|name| Ok(display_values(dataset.series(name)?, max_rows)?))
            .collect::<Result<Vec<_>>>()?;

        let height = dataset.height().min(max_rows);
        let rows = (0..height)
            .map(|row| {
                cells
                    .iter()
                    .map(|col| col.get(row).cloned().flatten())
                    .collect()
            })
            .collect();

        Ok(Self {
            columns,
            rows,
            rendered: dataset.head(max_rows).to_string(),
        })
    }

    /// The polars table when built from a dataset; a plain table for a
    /// deserialized preview.
    pub fn render_text(&self) -> String {
        if !self.rendered.is_empty() {
            return format!("{}\n", self.rendered.trim_end());
        }
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.clone().unwrap_or_else(|| "null".to_string()))
                    .collect()
            })
            .collect();
        format_table(&self.columns, &rows)
    }
}

/// Exploratory data analysis of one dataset.
///
/// Serialized as-is for `--json` and `--emit-report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdaReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path of the loaded file, when known
    pub input_file: Option<String>,
    /// (rows, columns)
    pub shape: (usize, usize),
    pub preview: PreviewTable,
    pub description: DatasetDescription,
    /// Columns with at least one missing value
    pub missing_values: Vec<MissingCount>,
    pub dtypes: Vec<ColumnSchema>,
    /// Pearson correlation over numeric columns
    pub correlation: Option<HeatmapMatrix>,
    /// Informational notes (never errors)
    pub notes: Vec<String>,
    /// Cleaning applied before the report, if any
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub processing_steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub processing_summary: Option<ProcessingSummary>,
}

/// Builds [`EdaReport`]s.
pub struct EdaReporter {
    preview_rows: usize,
}

impl EdaReporter {
    pub fn new(preview_rows: usize) -> Self {
        Self { preview_rows }
    }

    /// Compute the full report. Read-only with respect to the dataset.
    pub fn build(&self, dataset: &Dataset) -> Result<EdaReport> {
        info!("Generating EDA report for {:?} dataset", dataset.shape());

        let description = DataProfiler::describe(dataset)
            .map_err(|e| CleaningError::ReportGenerationFailed(e.to_string()))?;
        let preview = PreviewTable::from_dataset(dataset, self.preview_rows)?;
        let correlation = correlation_matrix(dataset)?;

        let mut notes = Vec::new();
        if correlation.is_none() {
            notes.push(NO_NUMERIC_COLUMNS_NOTE.to_string());
        }

        debug!(
            "Report: {} numeric summaries, {} columns with missing values",
            description.numeric.len(),
            dataset.missing_counts().len()
        );

        Ok(EdaReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: None,
            shape: dataset.shape(),
            preview,
            description,
            missing_values: dataset.missing_counts(),
            dtypes: dataset.schema().columns().to_vec(),
            correlation,
            notes,
            processing_steps: Vec::new(),
            processing_summary: None,
        })
    }
}

impl EdaReport {
    pub fn with_input_file(mut self, path: &Path) -> Self {
        self.input_file = Some(path.display().to_string());
        self
    }

    pub fn with_processing(
        mut self,
        steps: &[String],
        summary: Option<&ProcessingSummary>,
    ) -> Self {
        self.processing_steps = steps.to_vec();
        self.processing_summary = summary.cloned();
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as `<dir>/<base_name>_eda_report.json`.
    pub fn write_to_file(&self, dir: &Path, base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let report_path = dir.join(format!("{}_eda_report.json", base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(self.to_json()?.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }

    /// Plain-text rendering for the terminal.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        section(&mut out, "Dataset Overview");
        let _ = writeln!(out, "Shape: {} rows x {} columns", self.shape.0, self.shape.1);
        if let Some(input) = &self.input_file {
            let _ = writeln!(out, "Source: {}", input);
        }
        if !self.processing_steps.is_empty() {
            let _ = writeln!(out, "Cleaning steps:");
            for step in &self.processing_steps {
                let _ = writeln!(out, "  - {}", step);
            }
        }

        section(
            &mut out,
            &format!("Preview (first {} rows)", self.preview.rows.len()),
        );
        out.push_str(&self.preview.render_text());

        section(&mut out, "Descriptive Statistics");
        if self.description.numeric.is_empty() {
            out.push_str("No numeric columns.\n");
        } else {
            out.push_str(&render_numeric(&self.description.numeric));
        }
        if !self.description.categorical.is_empty() {
            out.push('\n');
            let headers: Vec<String> = ["column", "count", "unique", "top", "freq"]
                .iter()
                .map(|h| h.to_string())
                .collect();
            let rows: Vec<Vec<String>> = self
                .description
                .categorical
                .iter()
                .map(|s| {
                    vec![
                        s.column.clone(),
                        s.count.to_string(),
                        s.unique.to_string(),
                        s.top.clone().unwrap_or_else(|| "null".to_string()),
                        s.freq.to_string(),
                    ]
                })
                .collect();
            out.push_str(&format_table(&headers, &rows));
        }

        section(&mut out, "Missing Values");
        if self.missing_values.is_empty() {
            out.push_str("No missing values.\n");
        } else {
            for missing in &self.missing_values {
                let _ = writeln!(
                    out,
                    "{}: {} ({:.1}%)",
                    missing.column, missing.count, missing.percentage
                );
            }
        }

        section(&mut out, "Data Types");
        for column in &self.dtypes {
            let _ = writeln!(out, "{}: {} ({})", column.name, column.dtype, column.kind);
        }

        section(&mut out, "Correlation Heatmap");
        if let Some(matrix) = &self.correlation {
            out.push_str(&matrix.render_text());
        }
        for note in &self.notes {
            let _ = writeln!(out, "{}", note);
        }

        out
    }
}

// ============================================================================
// Text Helpers
// ============================================================================

fn section(out: &mut String, title: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    let _ = writeln!(out, "=== {} ===", title);
}

/// Statistics as rows, columns as columns, like `describe()`.
fn render_numeric(summaries: &[NumericSummary]) -> String {
    let mut headers = vec![String::new()];
    headers.extend(summaries.iter().map(|s| s.column.clone()));

    let values: Vec<[Option<f64>; 8]> = summaries.iter().map(NumericSummary::values).collect();
    let rows: Vec<Vec<String>> = NumericSummary::LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let mut row = vec![label.to_string()];
            row.extend(values.iter().map(|v| match v[i] {
                Some(x) => format!("{:.2}", x),
                None => "NaN".to_string(),
            }));
            row
        })
        .collect();

    format_table(&headers, &rows)
}

/// Right-aligned fixed-width table.
fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    let line = |out: &mut String, cells: &[String]| {
        let rendered: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:>width$}", cell, width = *width))
            .collect();
        let _ = writeln!(out, "{}", rendered.join("  ").trim_end());
    };
    line(&mut out, headers);
    for row in rows {
        line(&mut out, row);
    }
    out
}
