//! Loading CSV and spreadsheet files into a [`Dataset`].

use super::Dataset;
use crate::error::{CleaningError, Result};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Cell contents that count as missing when reading CSV text.
const NA_VALUES: [&str; 12] = [
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>", "#NA",
];

/// Accepted input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Spreadsheet,
}

impl FileFormat {
    /// Detect the format from the file extension (case-insensitive).
    ///
    /// Anything other than `.csv`, `.xlsx` or `.xls` is rejected before
    /// the file is opened.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "xls" => Ok(Self::Spreadsheet),
            _ => Err(CleaningError::UnsupportedFileType(
                path.display().to_string(),
            )),
        }
    }
}

/// Load a dataset from a file. Dispatch by extension.
pub fn load_dataset(path: &Path, infer_schema_length: Option<usize>) -> Result<Dataset> {
    let format = FileFormat::from_path(path)?;
    if !path.exists() {
        return Err(CleaningError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input file not found: {}", path.display()),
        )));
    }

    info!("Loading dataset from: {}", path.display());
    let frame = match format {
        FileFormat::Csv => load_csv(path, infer_schema_length)?,
        FileFormat::Spreadsheet => load_spreadsheet_frame(path)?,
    };

    let dataset = Dataset::new(frame);
    info!("Dataset loaded successfully: {:?}", dataset.shape());
    for column in dataset.schema().columns() {
        debug!("  {} -> {} ({})", column.name, column.dtype, column.kind);
    }
    Ok(dataset)
}

fn csv_options(infer_schema_length: Option<usize>) -> CsvReadOptions {
    let null_values = NullValues::AllColumns(NA_VALUES.iter().map(|v| (*v).into()).collect());
    CsvReadOptions::default()
        .with_infer_schema_length(infer_schema_length)
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(Some(b'"'))
                .with_try_parse_dates(true)
                .with_null_values(Some(null_values)),
        )
}

/// Load a CSV file, retrying once on pre-cleaned content.
pub fn load_csv(path: &Path, infer_schema_length: Option<usize>) -> Result<DataFrame> {
    // Strategy 1: Standard loading
    let first_error = match csv_options(infer_schema_length)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
            e
        }
    };

    // Strategy 2: Drop blank lines and stray whitespace-only rows
    let content = std::fs::read_to_string(path).map_err(|e| CleaningError::ParseFailed {
        path: path.display().to_string(),
        reason: format!("{} (first attempt: {})", e, first_error),
    })?;
    let cleaned = clean_csv_content(&content);
    csv_options(infer_schema_length)
        .into_reader_with_file_handle(Cursor::new(cleaned.into_bytes()))
        .finish()
        .map_err(|e| CleaningError::ParseFailed {
            path: path.display().to_string(),
            reason: format!("{} (first attempt: {})", e, first_error),
        })
}

/// Remove blank lines from CSV content.
fn clean_csv_content(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(feature = "excel")]
fn load_spreadsheet_frame(path: &Path) -> Result<DataFrame> {
    load_spreadsheet(path)
}

#[cfg(not(feature = "excel"))]
fn load_spreadsheet_frame(path: &Path) -> Result<DataFrame> {
    Err(CleaningError::UnsupportedFileType(format!(
        "{} (spreadsheet support not compiled in, enable the \"excel\" feature)",
        path.display()
    )))
}

/// Load the first worksheet of an `.xlsx`/`.xls` workbook.
///
/// The first row is the header; each column gets the narrowest type that
/// holds all of its non-empty cells.
#[cfg(feature = "excel")]
pub fn load_spreadsheet(path: &Path) -> Result<DataFrame> {
    use calamine::{Reader, open_workbook_auto};

    let parse_failed = |reason: String| CleaningError::ParseFailed {
        path: path.display().to_string(),
        reason,
    };

    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| parse_failed("workbook has no worksheets".to_string()))?;
    debug!("Reading worksheet '{}'", sheet_name);

    let range = workbook.worksheet_range(&sheet_name)?;
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };

    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = cell.to_string();
            if name.trim().is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name
            }
        })
        .collect();

    let body: Vec<&[calamine::Data]> = rows.collect();
    let columns = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let cells: Vec<Option<&calamine::Data>> = body.iter().map(|row| row.get(i)).collect();
            Column::from(spreadsheet::column_to_series(name, &cells))
        })
        .collect::<Vec<_>>();

    DataFrame::new(columns).map_err(|e| parse_failed(e.to_string()))
}

#[cfg(feature = "excel")]
mod spreadsheet {
    use calamine::{Data, DataType as _};
    use polars::prelude::*;

    fn is_missing(cell: Option<&Data>) -> bool {
        matches!(cell, None | Some(Data::Empty) | Some(Data::Error(_)))
    }

    fn as_number(cell: &Data) -> Option<f64> {
        match cell {
            Data::Int(v) => Some(*v as f64),
            Data::Float(v) => Some(*v),
            _ => None,
        }
    }

    fn as_millis(cell: &Data) -> Option<i64> {
        match cell {
            Data::DateTime(_) | Data::DateTimeIso(_) => {
                cell.as_datetime().map(|dt| dt.and_utc().timestamp_millis())
            }
            _ => None,
        }
    }

    fn as_text(cell: &Data) -> String {
        match cell {
            Data::DateTime(_) | Data::DateTimeIso(_) => cell
                .as_datetime()
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| cell.to_string()),
            _ => cell.to_string(),
        }
    }

    /// Build a typed Series from one spreadsheet column.
    pub(super) fn column_to_series(name: &str, cells: &[Option<&Data>]) -> Series {
        let present: Vec<&Data> = cells
            .iter()
            .copied()
            .filter(|c| !is_missing(*c))
            .flatten()
            .collect();

        let all_numeric = !present.is_empty() && present.iter().all(|c| as_number(c).is_some());
        let all_bool = !present.is_empty() && present.iter().all(|c| matches!(c, Data::Bool(_)));
        let all_datetime = !present.is_empty() && present.iter().all(|c| as_millis(c).is_some());

        if all_numeric {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|c| if is_missing(*c) { None } else { c.and_then(as_number) })
                .collect();
            let integral = values.iter().flatten().all(|v| v.fract() == 0.0 && v.abs() < 9.0e15);
            if integral {
                let ints: Vec<Option<i64>> = values.iter().map(|v| v.map(|x| x as i64)).collect();
                Series::new(name.into(), ints)
            } else {
                Series::new(name.into(), values)
            }
        } else if all_datetime {
            let millis: Int64Chunked = cells
                .iter()
                .map(|c| if is_missing(*c) { None } else { c.and_then(as_millis) })
                .collect();
            millis
                .with_name(name.into())
                .into_datetime(TimeUnit::Milliseconds, None)
                .into_series()
        } else if all_bool {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|c| match c {
                    Some(Data::Bool(b)) => Some(*b),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        } else {
            let values: Vec<Option<String>> = cells
                .iter()
                .map(|c| if is_missing(*c) { None } else { c.map(as_text) })
                .collect();
            Series::new(name.into(), values)
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            FileFormat::from_path(Path::new("data.CSV")).unwrap(),
            FileFormat::Csv
        );
        assert_eq!(
            FileFormat::from_path(Path::new("book.xlsx")).unwrap(),
            FileFormat::Spreadsheet
        );
        assert_eq!(
            FileFormat::from_path(Path::new("old.xls")).unwrap(),
            FileFormat::Spreadsheet
        );
    }

    #[test]
    fn test_unsupported_extension_rejected_before_reading() {
        // The file does not exist; the extension check must fail first.
        let err = load_dataset(Path::new("does/not/exist.json"), None).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FILE_TYPE");

        let err = load_dataset(Path::new("no_extension"), None).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FILE_TYPE");
    }

    #[test]
    fn test_clean_csv_content_drops_blank_lines() {
        let content = "a,b\n1,2\n\n   \n3,4\n";
        assert_eq!(clean_csv_content(content), "a,b\n1,2\n3,4");
    }

    #[test]
    fn test_load_csv_recognises_na_markers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("na.csv");
        std::fs::write(&path, "x,label\n1.5,a\nNA,b\n,N/A\n4.0,c\n").unwrap();

        let df = load_csv(&path, None).unwrap();
        assert_eq!(df.height(), 4);
        assert_eq!(df.column("x").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("x").unwrap().null_count(), 2);
        assert_eq!(df.column("label").unwrap().null_count(), 1);
    }

    #[test]
    fn test_invalid_utf8_reports_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.csv");
        std::fs::write(&path, b"name,n\ncaf\xe9,1\n\xff\xfe,2\n").unwrap();

        let err = load_csv(&path, None).unwrap_err();
        assert_eq!(err.error_code(), "PARSE_FAILED");
        assert!(err.to_string().contains("first attempt"));
    }
}
