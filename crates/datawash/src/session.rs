//! Session state shared by the batch CLI and the interactive shell.
//!
//! ```text
//! Idle ──load──▶ Loaded ──missing/outliers──▶ Cleaned ──eda──▶ Reported
//!                  │                             │                 │
//!                  └──────────────export─────────┴────────────────▶ Exported
//! ```
//!
//! The session keeps the dataset as loaded and the current cleaned dataset.
//! Every selection change recomputes the cleaned dataset from the loaded
//! one. A failing operation returns its error and leaves the session as it
//! was before the call.

use crate::config::{CleaningConfig, MissingStrategy, OutlierMethod};
use crate::dataset::{Dataset, export_csv, load_dataset};
use crate::error::{CleaningError, Result};
use crate::pipeline::{CleaningPipeline, ColumnOutliers, ProcessingSummary};
use crate::reporting::{EdaReport, EdaReporter, PreviewTable, correlation_matrix};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    Idle,
    Loaded,
    Cleaned,
    Reported,
    Exported,
}

impl fmt::Display for SessionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loaded => "loaded",
            Self::Cleaned => "cleaned",
            Self::Reported => "reported",
            Self::Exported => "exported",
        };
        f.write_str(name)
    }
}

/// Output of the last cleaning run.
#[derive(Debug, Clone, Default)]
struct CleaningState {
    processing_steps: Vec<String>,
    outliers: Vec<ColumnOutliers>,
    summary: Option<ProcessingSummary>,
}

/// Everything `status` shows.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub stage: SessionStage,
    pub source: Option<String>,
    pub original_shape: Option<(usize, usize)>,
    pub current_shape: Option<(usize, usize)>,
    pub missing_strategy: Option<MissingStrategy>,
    pub outlier_method: Option<OutlierMethod>,
    pub iqr_multiplier: f64,
    pub zscore_threshold: f64,
    pub processing_steps: Vec<String>,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_none = |v: Option<String>| v.unwrap_or_else(|| "none".to_string());
        let shape = |s: Option<(usize, usize)>| {
            s.map(|(r, c)| format!("{} rows x {} columns", r, c))
                .unwrap_or_else(|| "-".to_string())
        };

        writeln!(f, "Stage: {}", self.stage)?;
        writeln!(f, "Source: {}", or_none(self.source.clone()))?;
        writeln!(f, "Loaded: {}", shape(self.original_shape))?;
        writeln!(f, "Current: {}", shape(self.current_shape))?;
        writeln!(
            f,
            "Missing strategy: {}",
            or_none(self.missing_strategy.map(|s| s.to_string()))
        )?;
        writeln!(
            f,
            "Outlier method: {} (IQR multiplier {}, z-score threshold {})",
            or_none(self.outlier_method.map(|m| m.to_string())),
            self.iqr_multiplier,
            self.zscore_threshold
        )?;
        for step in &self.processing_steps {
            writeln!(f, "  - {}", step)?;
        }
        Ok(())
    }
}

/// A loaded dataset and the selections applied to it.
#[derive(Debug, Clone)]
pub struct Session {
    config: CleaningConfig,
    source: Option<PathBuf>,
    original: Option<Dataset>,
    current: Option<Dataset>,
    cleaning: CleaningState,
    report: Option<EdaReport>,
    stage: SessionStage,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(CleaningConfig::default())
    }
}

impl Session {
    /// Start an idle session. The selections in `config` apply to every
    /// dataset loaded later.
    pub fn new(config: CleaningConfig) -> Self {
        Self {
            config,
            source: None,
            original: None,
            current: None,
            cleaning: CleaningState::default(),
            report: None,
            stage: SessionStage::Idle,
        }
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The dataset as loaded.
    pub fn original(&self) -> Option<&Dataset> {
        self.original.as_ref()
    }

    /// The dataset with the current selections applied.
    pub fn current(&self) -> Option<&Dataset> {
        self.current.as_ref()
    }

    pub fn processing_steps(&self) -> &[String] {
        &self.cleaning.processing_steps
    }

    pub fn outliers(&self) -> &[ColumnOutliers] {
        &self.cleaning.outliers
    }

    pub fn summary(&self) -> Option<&ProcessingSummary> {
        self.cleaning.summary.as_ref()
    }

    pub fn report(&self) -> Option<&EdaReport> {
        self.report.as_ref()
    }

    fn require_current(&self) -> Result<&Dataset> {
        self.current.as_ref().ok_or(CleaningError::NoDataLoaded)
    }

    fn has_selection(config: &CleaningConfig) -> bool {
        config.missing_strategy.is_some() || config.outlier_method.is_some()
    }

    /// Load a `.csv`, `.xlsx` or `.xls` file and apply the current
    /// selections to it.
    pub fn load(&mut self, path: &Path) -> Result<&Dataset> {
        let original = load_dataset(path, self.config.infer_schema_length)?;
        let (current, cleaning) = Self::clean(&original, &self.config)?;

        self.stage = if Self::has_selection(&self.config) {
            SessionStage::Cleaned
        } else {
            SessionStage::Loaded
        };
        self.source = Some(path.to_path_buf());
        self.original = Some(original);
        self.cleaning = cleaning;
        self.report = None;
        Ok(&*self.current.insert(current))
    }

    pub fn set_missing_strategy(&mut self, strategy: Option<MissingStrategy>) -> Result<()> {
        let mut config = self.config.clone();
        config.missing_strategy = strategy;
        self.apply_config(config)
    }

    pub fn set_outlier_method(&mut self, method: Option<OutlierMethod>) -> Result<()> {
        let mut config = self.config.clone();
        config.outlier_method = method;
        self.apply_config(config)
    }

    pub fn set_iqr_multiplier(&mut self, k: f64) -> Result<()> {
        let mut config = self.config.clone();
        config.iqr_multiplier = k;
        self.apply_config(config)
    }

    pub fn set_zscore_threshold(&mut self, threshold: f64) -> Result<()> {
        let mut config = self.config.clone();
        config.zscore_threshold = threshold;
        self.apply_config(config)
    }

    /// Validate a new configuration and recompute from the loaded dataset.
    ///
    /// While idle the selection is only stored.
    fn apply_config(&mut self, config: CleaningConfig) -> Result<()> {
        config.validate()?;

        let Some(original) = &self.original else {
            self.config = config;
            return Ok(());
        };

        let (current, cleaning) = Self::clean(original, &config)?;
        self.stage = if Self::has_selection(&config) {
            SessionStage::Cleaned
        } else {
            SessionStage::Loaded
        };
        self.config = config;
        self.current = Some(current);
        self.cleaning = cleaning;
        self.report = None;
        Ok(())
    }

    fn clean(original: &Dataset, config: &CleaningConfig) -> Result<(Dataset, CleaningState)> {
        if !Self::has_selection(config) {
            return Ok((original.clone(), CleaningState::default()));
        }

        let result = CleaningPipeline::new(config.clone()).run(original)?;
        let state = CleaningState {
            processing_steps: result.processing_steps,
            outliers: result.outliers,
            summary: Some(result.summary),
        };
        Ok((result.dataset, state))
    }

    /// Build the EDA report of the current dataset.
    pub fn run_eda(&mut self) -> Result<&EdaReport> {
        let current = self.require_current()?;
        let mut report = EdaReporter::new(self.config.preview_rows)
            .build(current)?
            .with_processing(&self.cleaning.processing_steps, self.cleaning.summary.as_ref());
        if let Some(source) = &self.source {
            report = report.with_input_file(source);
        }

        self.stage = SessionStage::Reported;
        Ok(&*self.report.insert(report))
    }

    /// Write the correlation heatmap of the current dataset as SVG.
    ///
    /// Returns `Ok(None)` when there is no numeric column to correlate.
    pub fn write_heatmap(&self, path: &Path) -> Result<Option<PathBuf>> {
        let current = self.require_current()?;
        match correlation_matrix(current)? {
            Some(matrix) => Ok(Some(matrix.write_svg(path)?)),
            None => Ok(None),
        }
    }

    /// Export the current dataset as CSV into `dir` (the configured output
    /// directory when `None`).
    pub fn export(&mut self, dir: Option<&Path>) -> Result<PathBuf> {
        let current = self.require_current()?;
        let dir = dir.unwrap_or(&self.config.output_dir);
        let path = export_csv(current, dir, &self.config.export_file_name())?;

        info!("Exported {} rows to {}", current.height(), path.display());
        self.stage = SessionStage::Exported;
        Ok(path)
    }

    /// First rows of the current dataset.
    pub fn preview(&self) -> Result<PreviewTable> {
        PreviewTable::from_dataset(self.require_current()?, self.config.preview_rows)
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            stage: self.stage,
            source: self.source.as_ref().map(|p| p.display().to_string()),
            original_shape: self.original.as_ref().map(Dataset::shape),
            current_shape: self.current.as_ref().map(Dataset::shape),
            missing_strategy: self.config.missing_strategy,
            outlier_method: self.config.outlier_method,
            iqr_multiplier: self.config.iqr_multiplier,
            zscore_threshold: self.config.zscore_threshold,
            processing_steps: self.cleaning.processing_steps.clone(),
        }
    }
}
