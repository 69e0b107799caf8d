//! Configuration types for the cleaning workflow.
//!
//! This module provides the strategy enums and a [`CleaningConfig`] built
//! with the builder pattern.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default IQR multiplier for outlier bounds.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Default z-score cutoff. Kept equal to the IQR multiplier so a plain
/// `zscore` run behaves like the historical shared-threshold tool.
pub const DEFAULT_ZSCORE_THRESHOLD: f64 = 1.5;

/// Default number of rows shown in dataset previews.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Default exported file name (without extension).
pub const DEFAULT_OUTPUT_NAME: &str = "cleaned_data";

/// Strategy for handling missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    /// Drop every row containing a missing value
    Drop,
    /// Fill numeric columns with their mean
    Mean,
    /// Fill numeric columns with their median
    Median,
    /// Fill every column with its most frequent value
    Mode,
}

impl MissingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drop => "drop",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
        }
    }
}

impl fmt::Display for MissingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "mode" => Ok(Self::Mode),
            other => Err(format!(
                "unknown missing-value strategy '{}' (expected none, drop, mean, median or mode)",
                other
            )),
        }
    }
}

/// Method for detecting outlier rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutlierMethod {
    /// Interquartile range bounds
    #[serde(rename = "IQR")]
    Iqr,
    /// Upper z-score cutoff
    #[serde(rename = "zscore")]
    ZScore,
}

impl OutlierMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iqr => "IQR",
            Self::ZScore => "zscore",
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutlierMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iqr" => Ok(Self::Iqr),
            "zscore" | "z-score" | "z" => Ok(Self::ZScore),
            other => Err(format!(
                "unknown outlier method '{}' (expected none, iqr or zscore)",
                other
            )),
        }
    }
}

/// Parse a user selection where `none` means "skip this step".
pub fn parse_optional<T: FromStr<Err = String>>(s: &str) -> Result<Option<T>, String> {
    if s.trim().eq_ignore_ascii_case("none") {
        Ok(None)
    } else {
        s.parse::<T>().map(Some)
    }
}

/// Configuration for a cleaning session.
///
/// Use [`CleaningConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use datawash::config::{CleaningConfig, MissingStrategy, OutlierMethod};
///
/// let config = CleaningConfig::builder()
///     .missing_strategy(Some(MissingStrategy::Median))
///     .outlier_method(Some(OutlierMethod::Iqr))
///     .iqr_multiplier(3.0)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Missing-value strategy. `None` skips the step.
    /// Default: None
    pub missing_strategy: Option<MissingStrategy>,

    /// Outlier method. `None` skips the step.
    /// Default: None
    pub outlier_method: Option<OutlierMethod>,

    /// Multiplier `k` for the IQR bounds `[Q1 - k*IQR, Q3 + k*IQR]`.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Rows with a z-score at or above this value are removed.
    /// Default: 1.5
    pub zscore_threshold: f64,

    /// Rows shown in previews and in the EDA report.
    /// Default: 5
    pub preview_rows: usize,

    /// Rows scanned for CSV schema inference. `None` scans the whole file.
    /// Default: None
    pub infer_schema_length: Option<usize>,

    /// Output directory for exported data and reports.
    /// Default: "outputs"
    pub output_dir: PathBuf,

    /// Exported file name (without extension).
    /// Default: "cleaned_data"
    pub output_name: String,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            missing_strategy: None,
            outlier_method: None,
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            zscore_threshold: DEFAULT_ZSCORE_THRESHOLD,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            infer_schema_length: None,
            output_dir: PathBuf::from("outputs"),
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
        }
    }
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "iqr_multiplier".to_string(),
                value: self.iqr_multiplier,
            });
        }

        if !self.zscore_threshold.is_finite() || self.zscore_threshold <= 0.0 {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "zscore_threshold".to_string(),
                value: self.zscore_threshold,
            });
        }

        if self.preview_rows == 0 {
            return Err(ConfigValidationError::InvalidPreviewRows(self.preview_rows));
        }

        if self.output_name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyOutputName);
        }

        Ok(())
    }

    /// File name of the exported CSV.
    pub fn export_file_name(&self) -> String {
        format!("{}.csv", self.output_name)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be a finite positive number)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid preview rows: {0} (must be at least 1)")]
    InvalidPreviewRows(usize),

    #[error("Output name must not be empty")]
    EmptyOutputName,
}

impl From<ConfigValidationError> for crate::error::CleaningError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::CleaningError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    missing_strategy: Option<MissingStrategy>,
    outlier_method: Option<OutlierMethod>,
    iqr_multiplier: Option<f64>,
    zscore_threshold: Option<f64>,
    preview_rows: Option<usize>,
    infer_schema_length: Option<usize>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
}

impl CleaningConfigBuilder {
    /// Set the missing-value strategy (`None` skips imputation).
    pub fn missing_strategy(mut self, strategy: Option<MissingStrategy>) -> Self {
        self.missing_strategy = strategy;
        self
    }

    /// Set the outlier method (`None` skips outlier filtering).
    pub fn outlier_method(mut self, method: Option<OutlierMethod>) -> Self {
        self.outlier_method = method;
        self
    }

    /// Set the IQR multiplier.
    pub fn iqr_multiplier(mut self, k: f64) -> Self {
        self.iqr_multiplier = Some(k);
        self
    }

    /// Set the z-score cutoff.
    pub fn zscore_threshold(mut self, threshold: f64) -> Self {
        self.zscore_threshold = Some(threshold);
        self
    }

    /// Set the number of preview rows.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Limit CSV schema inference to the first `rows` rows.
    pub fn infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Set the output directory for exports and reports.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the exported file name (without extension).
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleaningConfig` or an error if validation fails.
    pub fn build(self) -> Result<CleaningConfig, ConfigValidationError> {
        let config = CleaningConfig {
            missing_strategy: self.missing_strategy,
            outlier_method: self.outlier_method,
            iqr_multiplier: self.iqr_multiplier.unwrap_or(DEFAULT_IQR_MULTIPLIER),
            zscore_threshold: self.zscore_threshold.unwrap_or(DEFAULT_ZSCORE_THRESHOLD),
            preview_rows: self.preview_rows.unwrap_or(DEFAULT_PREVIEW_ROWS),
            infer_schema_length: self.infer_schema_length,
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("outputs")),
            output_name: self
                .output_name
                .unwrap_or_else(|| DEFAULT_OUTPUT_NAME.to_string()),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CleaningConfig::default();
        assert_eq!(config.missing_strategy, None);
        assert_eq!(config.outlier_method, None);
        assert_eq!(config.iqr_multiplier, 1.5);
        assert_eq!(config.zscore_threshold, 1.5);
        assert_eq!(config.preview_rows, 5);
        assert_eq!(config.export_file_name(), "cleaned_data.csv");
    }

    #[test]
    fn test_builder_custom_values() {
        let config = CleaningConfig::builder()
            .missing_strategy(Some(MissingStrategy::Mode))
            .outlier_method(Some(OutlierMethod::ZScore))
            .zscore_threshold(3.0)
            .iqr_multiplier(2.0)
            .preview_rows(10)
            .output_name("titanic_clean")
            .build()
            .unwrap();

        assert_eq!(config.missing_strategy, Some(MissingStrategy::Mode));
        assert_eq!(config.outlier_method, Some(OutlierMethod::ZScore));
        assert_eq!(config.zscore_threshold, 3.0);
        assert_eq!(config.iqr_multiplier, 2.0);
        assert_eq!(config.preview_rows, 10);
        assert_eq!(config.export_file_name(), "titanic_clean.csv");
    }

    #[test]
    fn test_validation_rejects_bad_thresholds() {
        let result = CleaningConfig::builder().zscore_threshold(0.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidThreshold { .. }
        ));

        let result = CleaningConfig::builder().iqr_multiplier(f64::NAN).build();
        assert!(result.is_err());

        let result = CleaningConfig::builder().preview_rows(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidPreviewRows(0)
        ));
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("MEAN".parse::<MissingStrategy>(), Ok(MissingStrategy::Mean));
        assert_eq!("IQR".parse::<OutlierMethod>(), Ok(OutlierMethod::Iqr));
        assert_eq!("zscore".parse::<OutlierMethod>(), Ok(OutlierMethod::ZScore));
        assert!("knn".parse::<MissingStrategy>().is_err());

        assert_eq!(parse_optional::<MissingStrategy>("None"), Ok(None));
        assert_eq!(
            parse_optional::<MissingStrategy>("drop"),
            Ok(Some(MissingStrategy::Drop))
        );
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "missing_strategy": "median",
            "outlier_method": "IQR",
            "iqr_multiplier": 3.0,
            "zscore_threshold": 2.5,
            "preview_rows": 8,
            "infer_schema_length": 1000,
            "output_dir": "custom_output",
            "output_name": "clean"
        }"#;

        let config: CleaningConfig = serde_json::from_str(json).expect("valid config JSON");

        assert_eq!(config.missing_strategy, Some(MissingStrategy::Median));
        assert_eq!(config.outlier_method, Some(OutlierMethod::Iqr));
        assert_eq!(config.iqr_multiplier, 3.0);
        assert_eq!(config.zscore_threshold, 2.5);
        assert_eq!(config.infer_schema_length, Some(1000));
        assert_eq!(config.output_dir.to_str().unwrap(), "custom_output");
        assert!(config.validate().is_ok());
    }
}
