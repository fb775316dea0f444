//! Annotated correlation heatmap rendered as a standalone SVG document.
//!
//! Cells use a diverging red/blue scale pinned to [-1, 1] (blue negative,
//! red positive) and carry the coefficient to two decimals.

use std::path::{Path, PathBuf};

use marketlens_core::CorrelationMatrix;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::export::ExportError;

/// Rendering parameters for [`render_heatmap_svg`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeatmapStyle {
    pub title: String,
    /// Side length of one square cell, in SVG user units.
    pub cell_size: f64,
    /// Font size of the cell annotations.
    pub font_size: f64,
    /// Font size of the axis labels.
    pub label_font_size: f64,
    pub show_colorbar: bool,
}

impl Default for HeatmapStyle {
    fn default() -> Self {
        Self {
            title: "Stocks Correlation Matrix".to_string(),
            cell_size: 56.0,
            font_size: 11.0,
            label_font_size: 11.0,
            show_colorbar: true,
        }
    }
}

/// What [`export_heatmap`] did on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeatmapOutcome {
    /// No file existed at the path.
    Saved(PathBuf),
    /// A file existed and was overwritten.
    Replaced(PathBuf),
}

impl HeatmapOutcome {
    pub fn path(&self) -> &Path {
        match self {
            HeatmapOutcome::Saved(p) | HeatmapOutcome::Replaced(p) => p,
        }
    }

    /// User-facing notice for the console.
    pub fn notice(&self) -> String {
        match self {
            HeatmapOutcome::Saved(p) => {
                format!("Correlation matrix image saved to {}", p.display())
            }
            HeatmapOutcome::Replaced(_) => {
                "An image for correlation matrix already exists and was replaced".to_string()
            }
        }
    }
}

// RdBu_r anchors from -1 to +1.
const DIVERGING: [(u8, u8, u8); 11] = [
    (0x05, 0x30, 0x61),
    (0x21, 0x66, 0xac),
    (0x43, 0x93, 0xc3),
    (0x92, 0xc5, 0xde),
    (0xd1, 0xe5, 0xf0),
    (0xf7, 0xf7, 0xf7),
    (0xfd, 0xdb, 0xc7),
    (0xf4, 0xa5, 0x82),
    (0xd6, 0x60, 0x4d),
    (0xb2, 0x18, 0x2b),
    (0x67, 0x00, 0x1f),
];

const MISSING_FILL: &str = "#d9d9d9";

/// Map a coefficient onto the diverging scale. Values outside [-1, 1] are
/// clamped; `NaN` gets a neutral grey.
pub fn diverging_color(value: f64) -> String {
    if value.is_nan() {
        return MISSING_FILL.to_string();
    }
    let t = (value.clamp(-1.0, 1.0) + 1.0) / 2.0 * (DIVERGING.len() - 1) as f64;
    let lo = (t.floor() as usize).min(DIVERGING.len() - 2);
    let frac = t - lo as f64;
    let (a, b) = (DIVERGING[lo], DIVERGING[lo + 1]);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        mix(a.0, b.0),
        mix(a.1, b.1),
        mix(a.2, b.2)
    )
}

fn annotation_color(value: f64) -> &'static str {
    if value.abs() > 0.6 {
        "#ffffff"
    } else {
        "#262626"
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn svg_header(width: f64, height: f64) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width:.0}" height="{height:.0}" viewBox="0 0 {width:.0} {height:.0}"><style>text{{font-family:Arial,sans-serif;fill:#333}}</style>"#
    )
}

/// Render the matrix as an SVG document.
pub fn render_heatmap_svg(matrix: &CorrelationMatrix, style: &HeatmapStyle) -> String {
    let n = matrix.len();
    let cell = style.cell_size;
    let longest = matrix
        .symbols
        .iter()
        .map(|s| s.chars().count())
        .max()
        .unwrap_or(0) as f64;
    let label_space = longest * style.label_font_size * 0.62 + 12.0;

    let title_space = 40.0;
    let left = label_space + 10.0;
    let top = title_space;
    let grid = cell * n as f64;
    let colorbar_space = if style.show_colorbar { 80.0 } else { 20.0 };
    let width = left + grid + colorbar_space;
    let height = top + grid + label_space + 10.0;

    let mut svg = svg_header(width, height);
    svg.push_str(r##"<rect width="100%" height="100%" fill="#ffffff"/>"##);

    svg.push_str(&format!(
        r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle" font-size="{fs:.1}" font-weight="bold">{title}</text>"#,
        x = width / 2.0,
        y = title_space / 2.0 + 6.0,
        fs = style.label_font_size + 4.0,
        title = escape_xml(&style.title),
    ));

    for (i, row) in matrix.values.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            let x = left + cell * j as f64;
            let y = top + cell * i as f64;
            svg.push_str(&format!(
                r#"<rect x="{x:.2}" y="{y:.2}" width="{cell:.2}" height="{cell:.2}" fill="{fill}"/>"#,
                fill = diverging_color(value),
            ));
            if !value.is_nan() {
                svg.push_str(&format!(
                    r#"<text x="{cx:.2}" y="{cy:.2}" text-anchor="middle" dominant-baseline="central" font-size="{fs:.1}" style="fill:{color}">{value:.2}</text>"#,
                    cx = x + cell / 2.0,
                    cy = y + cell / 2.0,
                    fs = style.font_size,
                    color = annotation_color(value),
                ));
            }
        }
    }

    for (i, symbol) in matrix.symbols.iter().enumerate() {
        let label = escape_xml(symbol);
        let center = cell * i as f64 + cell / 2.0;
        // Row label, right-aligned against the grid.
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end" dominant-baseline="central" font-size="{fs:.1}">{label}</text>"#,
            x = left - 6.0,
            y = top + center,
            fs = style.label_font_size,
        ));
        // Column label, rotated under the grid.
        let (x, y) = (left + center, top + grid + 8.0);
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end" font-size="{fs:.1}" transform="rotate(-45 {x:.2} {y:.2})">{label}</text>"#,
            fs = style.label_font_size,
        ));
    }

    if style.show_colorbar && n > 0 {
        draw_colorbar(&mut svg, left + grid + 20.0, top, grid, style.label_font_size);
    }

    svg.push_str("</svg>");
    svg
}

fn draw_colorbar(svg: &mut String, x: f64, y: f64, height: f64, font_size: f64) {
    let bar_width = 14.0;
    svg.push_str(r#"<defs><linearGradient id="corr-scale" x1="0" y1="1" x2="0" y2="0">"#);
    for (k, _) in DIVERGING.iter().enumerate() {
        let offset = k as f64 / (DIVERGING.len() - 1) as f64;
        let value = offset * 2.0 - 1.0;
        svg.push_str(&format!(
            r#"<stop offset="{pct:.1}%" stop-color="{color}"/>"#,
            pct = offset * 100.0,
            color = diverging_color(value),
        ));
    }
    svg.push_str("</linearGradient></defs>");
    svg.push_str(&format!(
        r##"<rect x="{x:.2}" y="{y:.2}" width="{bar_width:.2}" height="{height:.2}" fill="url(#corr-scale)" stroke="#999" stroke-width="0.5"/>"##
    ));
    for tick in [-1.0_f64, -0.5, 0.0, 0.5, 1.0] {
        let ty = y + height * (1.0 - (tick + 1.0) / 2.0);
        svg.push_str(&format!(
            r#"<text x="{tx:.2}" y="{ty:.2}" dominant-baseline="central" font-size="{font_size:.1}">{tick:.1}</text>"#,
            tx = x + bar_width + 4.0,
        ));
    }
}

/// Render `matrix` and write it to `folder/file_name`, creating `folder` if
/// needed. An existing file is overwritten.
pub fn export_heatmap(
    matrix: &CorrelationMatrix,
    folder: &Path,
    file_name: &str,
    style: &HeatmapStyle,
) -> Result<HeatmapOutcome, ExportError> {
    std::fs::create_dir_all(folder).map_err(|e| ExportError::io(folder, e))?;
    let path = folder.join(file_name);
    let existed = path.exists();

    let svg = render_heatmap_svg(matrix, style);
    std::fs::write(&path, svg).map_err(|e| ExportError::io(&path, e))?;

    let outcome = if existed {
        HeatmapOutcome::Replaced(path)
    } else {
        HeatmapOutcome::Saved(path)
    };
    info!(path = %outcome.path().display(), replaced = existed, "heatmap written");
    Ok(outcome)
}
