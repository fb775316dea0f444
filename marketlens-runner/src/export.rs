//! Table persistence: CSV files and an Excel workbook.
//!
//! CSVs are written first. A workbook failure is reported back in the
//! [`WriteReport`] and leaves the CSVs in place.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::Datelike;
use marketlens_core::stats::SUMMARY_COLUMNS;
use marketlens_core::{SeriesTable, SummaryTable};
use polars::prelude::{CsvWriter, DataType, PolarsError, SerWriter, TimeUnit};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet, XlsxError};
use thiserror::Error;
use tracing::{info, warn};

pub const PRICES_CSV: &str = "prices.csv";
pub const RETURNS_CSV: &str = "returns.csv";
pub const VOLUME_CSV: &str = "volume.csv";
pub const SUMMARY_CSV: &str = "summary_stats.csv";
pub const WORKBOOK_FILE: &str = "data_excel.xlsx";

/// Header of the date column in exported tables.
pub const DATE_COLUMN: &str = "Date";
/// Header of the symbol column in the exported summary.
pub const SYMBOL_COLUMN: &str = "symbol";

const FALLBACK_EXCEL_DATE: &str = "yyyy-mm-dd";

/// Errors from writing output artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid date format '{0}'")]
    InvalidDateFormat(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("table conversion failed: {0}")]
    Polars(#[from] PolarsError),
    #[error("workbook error: {0}")]
    Workbook(#[from] XlsxError),
}

impl ExportError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of [`write_tables`].
#[derive(Debug)]
pub struct WriteReport {
    pub folder: PathBuf,
    /// The four CSV files, in write order.
    pub csv_paths: Vec<PathBuf>,
    /// Path of the workbook, or why it could not be written.
    pub workbook: Result<PathBuf, ExportError>,
}

impl WriteReport {
    pub fn workbook_written(&self) -> bool {
        self.workbook.is_ok()
    }

    /// Console notices, CSVs first.
    pub fn notices(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Dataframes saved to {} as .csv files",
            self.folder.display()
        )];
        match &self.workbook {
            Ok(_) => lines.push(format!(
                "Dataframes saved to {} as an excel file",
                self.folder.display()
            )),
            Err(e) => lines.push(format!(
                "An error occurred while writing data frames to an excel file: {e}"
            )),
        }
        lines
    }
}

/// Write the three daily tables and the summary as CSV, then as a workbook.
///
/// `date_format` is a strftime pattern applied to the `Date` column.
pub fn write_tables(
    prices: &SeriesTable,
    returns: &SeriesTable,
    volume: &SeriesTable,
    summary: &SummaryTable,
    folder: &Path,
    date_format: &str,
) -> Result<WriteReport, ExportError> {
    check_date_format(date_format)?;
    std::fs::create_dir_all(folder).map_err(|e| ExportError::io(folder, e))?;

    let mut csv_paths = Vec::with_capacity(4);
    for (table, name) in [
        (prices, PRICES_CSV),
        (returns, RETURNS_CSV),
        (volume, VOLUME_CSV),
    ] {
        let path = folder.join(name);
        write_series_csv(table, &path, date_format)?;
        csv_paths.push(path);
    }
    let summary_path = folder.join(SUMMARY_CSV);
    write_summary_csv(summary, &summary_path)?;
    csv_paths.push(summary_path);
    info!(folder = %folder.display(), files = csv_paths.len(), "CSV tables written");

    let workbook_path = folder.join(WORKBOOK_FILE);
    let workbook = match write_workbook(prices, returns, volume, summary, &workbook_path, date_format)
    {
        Ok(()) => {
            info!(path = %workbook_path.display(), "workbook written");
            Ok(workbook_path)
        }
        Err(e) => {
            warn!(path = %workbook_path.display(), error = %e, "workbook not written");
            Err(e)
        }
    };

    Ok(WriteReport {
        folder: folder.to_path_buf(),
        csv_paths,
        workbook,
    })
}

fn check_date_format(date_format: &str) -> Result<(), ExportError> {
    if date_format.is_empty()
        || StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error))
    {
        return Err(ExportError::InvalidDateFormat(date_format.to_string()));
    }
    Ok(())
}

// ─── CSV ────────────────────────────────────────────────────────────

/// One table as CSV with a leading date column. Missing cells are empty.
///
/// Dates are written as midnight timestamps so patterns with time
/// specifiers (`%H:%M`) format as `00:00`.
pub fn write_series_csv(
    table: &SeriesTable,
    path: &Path,
    date_format: &str,
) -> Result<(), ExportError> {
    let mut df = table.to_dataframe(DATE_COLUMN)?;
    let midnight = df
        .column(DATE_COLUMN)?
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    df.with_column(midnight)?;

    let mut file = File::create(path).map_err(|e| ExportError::io(path, e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_datetime_format(Some(date_format.to_string()))
        .finish(&mut df)?;
    Ok(())
}

/// The formatted summary keyed by symbol.
pub fn write_summary_csv(summary: &SummaryTable, path: &Path) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = Vec::with_capacity(SUMMARY_COLUMNS.len() + 1);
    header.push(SYMBOL_COLUMN);
    header.extend(SUMMARY_COLUMNS);
    wtr.write_record(&header)?;

    for row in &summary.rows {
        let mut record = Vec::with_capacity(SUMMARY_COLUMNS.len() + 1);
        record.push(row.symbol.as_str());
        record.extend(row.cells());
        wtr.write_record(&record)?;
    }
    wtr.flush().map_err(|e| ExportError::io(path, e))?;
    Ok(())
}

// ─── Workbook ───────────────────────────────────────────────────────

fn write_workbook(
    prices: &SeriesTable,
    returns: &SeriesTable,
    volume: &SeriesTable,
    summary: &SummaryTable,
    path: &Path,
    date_format: &str,
) -> Result<(), ExportError> {
    let excel_format = excel_date_format(date_format).unwrap_or_else(|| {
        warn!(date_format, "no Excel equivalent for date format, using {FALLBACK_EXCEL_DATE}");
        FALLBACK_EXCEL_DATE.to_string()
    });
    let date_cell = Format::new().set_num_format(&excel_format);
    let header = Format::new().set_bold();

    let mut workbook = Workbook::new();
    for (table, sheet) in [
        (prices, "Daily Prices"),
        (returns, "Daily Returns"),
        (volume, "Daily Volumes"),
    ] {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet)?;
        write_series_sheet(worksheet, table, &date_cell, &header)?;
    }

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Summary Stats")?;
    write_summary_sheet(worksheet, summary, &header)?;

    workbook.save(path)?;
    Ok(())
}

fn write_series_sheet(
    sheet: &mut Worksheet,
    table: &SeriesTable,
    date_cell: &Format,
    header: &Format,
) -> Result<(), ExportError> {
    sheet.write_string_with_format(0, 0, DATE_COLUMN, header)?;
    for (c, name) in table.column_names().iter().enumerate() {
        sheet.write_string_with_format(0, sheet_col(c + 1), name, header)?;
    }
    sheet.set_column_width(0, 14)?;

    for (r, date) in table.dates().iter().enumerate() {
        let row = sheet_row(r + 1);
        let cell = ExcelDateTime::from_ymd(
            u16::try_from(date.year()).unwrap_or(1900),
            date.month() as u8,
            date.day() as u8,
        )?;
        sheet.write_datetime_with_format(row, 0, &cell, date_cell)?;
    }

    for (c, (_, values)) in table.iter_columns().enumerate() {
        let col = sheet_col(c + 1);
        for (r, &v) in values.iter().enumerate() {
            // Missing cells stay blank.
            if v.is_finite() {
                sheet.write_number(sheet_row(r + 1), col, v)?;
            }
        }
    }
    Ok(())
}

fn write_summary_sheet(
    sheet: &mut Worksheet,
    summary: &SummaryTable,
    header: &Format,
) -> Result<(), ExportError> {
    sheet.write_string_with_format(0, 0, SYMBOL_COLUMN, header)?;
    for (c, name) in SUMMARY_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, sheet_col(c + 1), *name, header)?;
    }
    for (r, row) in summary.rows.iter().enumerate() {
        let xr = sheet_row(r + 1);
        sheet.write_string(xr, 0, &row.symbol)?;
        for (c, cell) in row.cells().iter().enumerate() {
            sheet.write_string(xr, sheet_col(c + 1), *cell)?;
        }
    }
    Ok(())
}

// Excel caps sheets at 1_048_576 rows and 16_384 columns; indices past
// that saturate and the writer rejects them.
fn sheet_row(i: usize) -> u32 {
    u32::try_from(i).unwrap_or(u32::MAX)
}

fn sheet_col(i: usize) -> u16 {
    u16::try_from(i).unwrap_or(u16::MAX)
}

/// Translate a strftime date pattern into an Excel number format.
///
/// Returns `None` for specifiers with no Excel counterpart.
pub fn excel_date_format(strftime: &str) -> Option<String> {
    let mut out = String::new();
    let mut literal = String::new();
    let mut chars = strftime.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }
        let code = match chars.next()? {
            '%' => {
                literal.push('%');
                continue;
            }
            'Y' => "yyyy",
            'y' => "yy",
            'm' => "mm",
            'd' => "dd",
            'e' => "d",
            'b' | 'h' => "mmm",
            'B' => "mmmm",
            'a' => "ddd",
            'A' => "dddd",
            'F' => "yyyy-mm-dd",
            'D' => "mm/dd/yy",
            'H' => "hh",
            'M' => "mm",
            'S' => "ss",
            _ => return None,
        };
        flush_literal(&mut out, &mut literal);
        out.push_str(code);
    }
    flush_literal(&mut out, &mut literal);
    Some(out)
}

// Letters and a few symbols are format codes in Excel, so literal runs
// containing them are quoted.
fn flush_literal(out: &mut String, literal: &mut String) {
    if literal.is_empty() {
        return;
    }
    let plain = literal
        .chars()
        .all(|c| matches!(c, '-' | '/' | ' ' | '.' | ':' | ',' | '(' | ')'));
    if plain {
        out.push_str(literal);
    } else {
        out.push('"');
        out.push_str(&literal.replace('"', ""));
        out.push('"');
    }
    literal.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_common_patterns() {
        assert_eq!(excel_date_format("%Y-%m-%d").as_deref(), Some("yyyy-mm-dd"));
        assert_eq!(excel_date_format("%d/%m/%Y").as_deref(), Some("dd/mm/yyyy"));
        assert_eq!(excel_date_format("%b %d, %Y").as_deref(), Some("mmm dd, yyyy"));
        assert_eq!(excel_date_format("%F").as_deref(), Some("yyyy-mm-dd"));
        assert_eq!(
            excel_date_format("%Y-%m-%d %H:%M").as_deref(),
            Some("yyyy-mm-dd hh:mm")
        );
    }

    #[test]
    fn quotes_literal_letters() {
        assert_eq!(
            excel_date_format("%Y week %d").as_deref(),
            Some("yyyy\" week \"dd")
        );
        assert_eq!(excel_date_format("100%%").as_deref(), Some("\"100%\""));
    }

    #[test]
    fn unsupported_specifier_has_no_translation() {
        assert_eq!(excel_date_format("%j"), None);
        assert_eq!(excel_date_format("%Y-%"), None);
    }

    #[test]
    fn rejects_malformed_strftime() {
        assert!(check_date_format("%Y-%m-%d").is_ok());
        assert!(matches!(
            check_date_format(""),
            Err(ExportError::InvalidDateFormat(_))
        ));
        assert!(matches!(
            check_date_format("%Q"),
            Err(ExportError::InvalidDateFormat(_))
        ));
    }

    #[test]
    fn notices_report_workbook_failure() {
        let report = WriteReport {
            folder: PathBuf::from("out"),
            csv_paths: vec![],
            workbook: Err(ExportError::InvalidDateFormat("%Q".into())),
        };
        let lines = report.notices();
        assert_eq!(lines[0], "Dataframes saved to out as .csv files");
        assert!(lines[1].starts_with("An error occurred while writing data frames"));
        assert!(!report.workbook_written());
    }
}
