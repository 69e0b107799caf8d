//! CSV export of a [`Dataset`].

use super::Dataset;
use crate::error::Result;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Media type of the exported file.
pub const EXPORT_MIME_TYPE: &str = "text/csv";

fn write_csv<W: std::io::Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut df = dataset.frame().clone();
    CsvWriter::new(writer)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(&mut df)?;
    Ok(())
}

/// Serialize the dataset as CSV bytes, in the in-memory row/column order.
pub fn to_csv_bytes(dataset: &Dataset) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_csv(dataset, &mut buffer)?;
    Ok(buffer)
}

/// Write the dataset as `<dir>/<file_name>`, creating `dir` if needed.
pub fn export_csv(dataset: &Dataset, dir: &Path, file_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let output_path = dir.join(file_name);
    let file = File::create(&output_path)?;
    write_csv(dataset, file)?;

    info!(
        "Dataset saved: {} ({} rows x {} columns)",
        output_path.display(),
        dataset.height(),
        dataset.width()
    );
    Ok(output_path)
}
