//! Pearson correlation matrix and its heatmap renderings.

use crate::dataset::Dataset;
use crate::error::{Result, ResultExt};
use crate::utils::numeric_values;
use palette::{Hsl, IntoColor, Srgb};
use polars::lazy::dsl;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Shown instead of a heatmap when nothing can be correlated.
pub const NO_NUMERIC_COLUMNS_NOTE: &str = "No numeric columns available for correlation heatmap.";

const CELL_SIZE: usize = 64;
const CHAR_WIDTH: usize = 8;

/// Square labelled matrix of correlation coefficients.
///
/// `values[i][j]` is the coefficient between `y_labels[i]` and
/// `x_labels[j]`; `None` where it is undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapMatrix {
    pub x_labels: Vec<String>,
    pub y_labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

/// Pearson correlation of every pair of numeric columns.
///
/// Each pair uses the rows where both values are present. Returns `None`
/// when the dataset has no numeric column.
pub fn correlation_matrix(dataset: &Dataset) -> Result<Option<HeatmapMatrix>> {
    let labels: Vec<String> = dataset
        .numeric_columns()
        .into_iter()
        .map(str::to_string)
        .collect();
    if labels.is_empty() {
        debug!("No numeric columns to correlate");
        return Ok(None);
    }

    let columns = labels
        .iter()
        .map(|name| Ok(numeric_values(dataset.series(name)?)?))
        .collect::<Result<Vec<_>>>()?;

    let size = labels.len();
    let mut values = vec![vec![None; size]; size];
    for i in 0..size {
        values[i][i] = Some(1.0);
        for j in (i + 1)..size {
            let r = pearson(&columns[i], &columns[j])?;
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(Some(HeatmapMatrix {
        x_labels: labels.clone(),
        y_labels: labels,
        values,
    }))
}

/// Pearson coefficient over pairwise-complete observations.
///
/// `None` when fewer than two pairs remain or either side is constant.
fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Result<Option<f64>> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip();
    if xs.len() < 2 || is_constant(&xs) || is_constant(&ys) {
        return Ok(None);
    }

    let out = df!("x" => xs, "y" => ys)
        .and_then(|pairs| {
            pairs
                .lazy()
                .select([dsl::pearson_corr(col("x"), col("y")).alias("r")])
                .collect()
        })
        .context("Failed to correlate numeric columns")?;
    let r = out.column("r")?.as_materialized_series().f64()?.get(0);
    Ok(r.filter(|r| r.is_finite()).map(|r| r.clamp(-1.0, 1.0)))
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Shade glyph for the strength of a coefficient.
fn shade(r: f64) -> char {
    match r.abs() {
        a if a >= 0.8 => '█',
        a if a >= 0.6 => '▓',
        a if a >= 0.4 => '▒',
        a if a >= 0.2 => '░',
        _ => ' ',
    }
}

/// Diverging blue-white-red color for a coefficient in [-1, 1].
fn cell_color(r: f64) -> String {
    let strength = r.abs().min(1.0) as f32;
    let hue = if r < 0.0 { 225.0 } else { 5.0 };
    let hsl = Hsl::new(hue, 0.75, 0.97 - 0.47 * strength);
    let rgb: Srgb = hsl.into_color();
    format!(
        "#{:02x}{:02x}{:02x}",
        (rgb.red * 255.0).round() as u8,
        (rgb.green * 255.0).round() as u8,
        (rgb.blue * 255.0).round() as u8,
    )
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl HeatmapMatrix {
    pub fn size(&self) -> usize {
        self.x_labels.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row)?.get(col).copied().flatten()
    }

    /// Annotated text grid, two decimals per cell.
    pub fn render_text(&self) -> String {
        let label_width = self
            .y_labels
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        let cell_width = self
            .x_labels
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .max(7);

        let mut out = String::new();
        let _ = write!(out, "{:label_width$}", "");
        for label in &self.x_labels {
            let _ = write!(out, " {:>cell_width$}", label);
        }
        out.push('\n');

        for (i, label) in self.y_labels.iter().enumerate() {
            let _ = write!(out, "{:<label_width$}", label);
            for j in 0..self.x_labels.len() {
                let cell = match self.get(i, j) {
                    Some(r) => format!("{:.2} {}", r, shade(r)),
                    None => "n/a".to_string(),
                };
                let _ = write!(out, " {:>cell_width$}", cell);
            }
            out.push('\n');
        }
        out
    }

    /// Standalone SVG document of the heatmap.
    pub fn to_svg(&self) -> String {
        let n = self.size();
        let longest = self
            .x_labels
            .iter()
            .chain(&self.y_labels)
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        let margin = longest * CHAR_WIDTH + 16;
        let side = margin + n * CELL_SIZE + 16;

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{side}" height="{side}" viewBox="0 0 {side} {side}" font-family="sans-serif" font-size="12">"#
        );
        let _ = writeln!(svg, r#"<rect width="{side}" height="{side}" fill="white"/>"#);

        for (j, label) in self.x_labels.iter().enumerate() {
            let x = margin + j * CELL_SIZE + CELL_SIZE / 2;
            let y = margin - 8;
            let _ = writeln!(
                svg,
                r#"<text x="{x}" y="{y}" transform="rotate(-45 {x} {y})">{}</text>"#,
                escape_xml(label)
            );
        }

        for (i, label) in self.y_labels.iter().enumerate() {
            let y = margin + i * CELL_SIZE + CELL_SIZE / 2 + 4;
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{y}" text-anchor="end">{}</text>"#,
                margin - 8,
                escape_xml(label)
            );

            for j in 0..self.x_labels.len() {
                let x = margin + j * CELL_SIZE;
                let y = margin + i * CELL_SIZE;
                let (fill, text, ink) = match self.get(i, j) {
                    Some(r) => (
                        cell_color(r),
                        format!("{:.2}", r),
                        if r.abs() >= 0.6 { "white" } else { "black" },
                    ),
                    None => ("#dddddd".to_string(), "n/a".to_string(), "black"),
                };
                let _ = writeln!(
                    svg,
                    r#"<rect x="{x}" y="{y}" width="{CELL_SIZE}" height="{CELL_SIZE}" fill="{fill}" stroke="white"/>"#
                );
                let _ = writeln!(
                    svg,
                    r#"<text x="{}" y="{}" text-anchor="middle" fill="{ink}">{text}</text>"#,
                    x + CELL_SIZE / 2,
                    y + CELL_SIZE / 2 + 4
                );
            }
        }

        svg.push_str("</svg>\n");
        svg
    }

    /// Write [`Self::to_svg`] to `path`, creating parent directories.
    pub fn write_svg(&self, path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_svg())?;
        info!("Heatmap saved: {}", path.display());
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn numeric_dataset() -> Dataset {
        Dataset::new(
            df![
                "a" => [1.0, 2.0, 3.0, 4.0],
                "b" => [2.0, 4.0, 6.0, 8.0],
                "c" => [4.0, 3.0, 2.0, 1.0],
                "label" => ["w", "x", "y", "z"],
            ]
            .unwrap(),
        )
    }

    #[test]
    fn test_matrix_is_square_symmetric_with_unit_diagonal() {
        let matrix = correlation_matrix(&numeric_dataset()).unwrap().unwrap();

        assert_eq!(matrix.x_labels, vec!["a", "b", "c"]);
        assert_eq!(matrix.x_labels, matrix.y_labels);
        assert_eq!(matrix.values.len(), 3);
        for i in 0..3 {
            assert_eq!(matrix.values[i].len(), 3);
            assert_eq!(matrix.get(i, i), Some(1.0));
            for j in 0..3 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
        assert!((matrix.get(0, 1).unwrap() - 1.0).abs() < 1e-12);
        assert!((matrix.get(0, 2).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_numeric_columns_gives_no_matrix() {
        let dataset = Dataset::new(df!["s" => ["a", "b"]].unwrap());
        assert!(correlation_matrix(&dataset).unwrap().is_none());
    }

    #[test]
    fn test_constant_column_is_undefined() {
        let dataset = Dataset::new(
            df![
                "x" => [1.0, 2.0, 3.0],
                "k" => [5.0, 5.0, 5.0],
            ]
            .unwrap(),
        );
        let matrix = correlation_matrix(&dataset).unwrap().unwrap();
        assert_eq!(matrix.get(0, 1), None);
        assert_eq!(matrix.get(1, 1), Some(1.0));
    }

    #[test]
    fn test_pearson_uses_pairwise_complete_rows() {
        let x = [Some(1.0), Some(2.0), None, Some(3.0)];
        let y = [Some(2.0), Some(4.0), Some(100.0), Some(6.0)];
        assert!((pearson(&x, &y).unwrap().unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(pearson(&[Some(1.0), None], &[None, Some(2.0)]).unwrap(), None);
    }

    #[test]
    fn test_pearson_partial_correlation() {
        let x = [Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)];
        let y = [Some(2.0), Some(1.0), Some(4.0), Some(3.0), Some(5.0)];
        // cov = 8 / 4, var_x = var_y = 10 / 4
        assert!((pearson(&x, &y).unwrap().unwrap() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_render_text_annotates_cells() {
        let matrix = correlation_matrix(&numeric_dataset()).unwrap().unwrap();
        let text = matrix.render_text();

        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("1.00 █"));
        assert!(text.contains("-1.00 █"));
    }

    #[test]
    fn test_svg_has_a_cell_per_coefficient() {
        let matrix = correlation_matrix(&numeric_dataset()).unwrap().unwrap();
        let svg = matrix.to_svg();

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches(r#"width="64""#).count(), 9);
    }

    #[test]
    fn test_cell_color_is_diverging() {
        assert_eq!(cell_color(0.0), cell_color(-0.0));
        let (neg, pos) = (cell_color(-1.0), cell_color(1.0));
        // blue dominates negative, red dominates positive
        let channel = |hex: &str, i: usize| u8::from_str_radix(&hex[1 + 2 * i..3 + 2 * i], 16).unwrap();
        assert!(channel(&neg, 2) > channel(&neg, 0));
        assert!(channel(&pos, 0) > channel(&pos, 2));
    }

    #[test]
    fn test_write_svg_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots/heatmap.svg");
        let matrix = correlation_matrix(&numeric_dataset()).unwrap().unwrap();

        matrix.write_svg(&path).unwrap();
        assert!(path.exists());
    }
}
