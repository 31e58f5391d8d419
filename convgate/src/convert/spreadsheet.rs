//! CSV to `.xlsx` conversion.
//!
//! Every CSV field becomes a string cell at the same row and column. The first row is styled as a
//! header (thin black border plus an optional solid fill); the remaining rows get the border only.
//! Both regions span every column present in the CSV.

use std::fmt;

use rust_xlsxwriter::{Color, Format, FormatBorder, FormatPattern, Workbook};

use crate::crypto;
use crate::errors::{Error, Result};

/// Worksheet limits of the xlsx format
pub const MAX_ROWS: usize = 1_048_576;
pub const MAX_COLUMNS: usize = 16_384;

/// Bijective base-26 column name: 0 -> `A`, 25 -> `Z`, 26 -> `AA`, 16383 -> `XFD`.
pub fn column_name(index: u16) -> String {
    let mut n = index as u32 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Zero-based cell position, displayed in A1 notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: u32,
    pub col: u16,
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.col), self.row + 1)
    }
}

/// Inclusive rectangle of cells, displayed as `A1:C1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub first: CellRef,
    pub last: CellRef,
}

impl Region {
    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first.row..=self.last.row).contains(&row) && (self.first.col..=self.last.col).contains(&col)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.first, self.last)
    }
}

/// Header and content regions of a `rows` x `columns` sheet. Either is `None` when empty.
pub fn regions(rows: u32, columns: u16) -> (Option<Region>, Option<Region>) {
    if rows == 0 || columns == 0 {
        return (None, None);
    }
    let last_col = columns - 1;
    let header = Region {
        first: CellRef { row: 0, col: 0 },
        last: CellRef { row: 0, col: last_col },
    };
    let content = (rows > 1).then(|| Region {
        first: CellRef { row: 1, col: 0 },
        last: CellRef {
            row: rows - 1,
            col: last_col,
        },
    });
    (Some(header), content)
}

/// Parse a `RRGGBB` / `#RRGGBB` fill colour. Empty input means no fill.
pub fn parse_color(code: &str) -> Result<Option<u32>> {
    let hex = code.trim().trim_start_matches('#');
    if hex.is_empty() {
        return Ok(None);
    }
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::bad_request(format!(
            "colorcode {code:?} is not a hex colour like #RRGGBB"
        )));
    }
    u32::from_str_radix(hex, 16)
        .map(Some)
        .map_err(|e| Error::bad_request(format!("colorcode {code:?}: {e}")))
}

/// Read every CSV record. All records must have the same number of fields.
pub fn read_csv(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(false).from_reader(bytes);
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

#[derive(Debug, Clone)]
pub struct WorkbookOptions<'a> {
    pub sheet_name: &'a str,
    /// Header fill colour as `0xRRGGBB`
    pub header_fill: Option<u32>,
    /// Password required to open the workbook; empty leaves it unencrypted
    pub password: &'a str,
}

/// Write `rows` into a single styled worksheet and serialise it.
pub fn build_workbook(rows: &[Vec<String>], options: &WorkbookOptions<'_>) -> Result<Vec<u8>> {
    let row_count = rows.len();
    let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    if row_count > MAX_ROWS || column_count > MAX_COLUMNS {
        return Err(Error::bad_request(format!(
            "CSV is {row_count} x {column_count}, a worksheet holds at most {MAX_ROWS} x {MAX_COLUMNS}"
        )));
    }

    let content_format = Format::new()
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::Black);
    let header_format = match options.header_fill {
        Some(rgb) => content_format
            .clone()
            .set_pattern(FormatPattern::Solid)
            .set_background_color(Color::RGB(rgb)),
        None => content_format.clone(),
    };

    let (header, content) = regions(row_count as u32, column_count as u16);
    tracing::debug!(
        header = %header.map(|r| r.to_string()).unwrap_or_default(),
        content = %content.map(|r| r.to_string()).unwrap_or_default(),
        "styling worksheet regions"
    );

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(options.sheet_name)?;

    for (row, fields) in rows.iter().enumerate() {
        let row = row as u32;
        for (col, value) in fields.iter().enumerate() {
            let col = col as u16;
            let format = match header {
                Some(region) if region.contains(row, col) => &header_format,
                _ => &content_format,
            };
            worksheet.write_string_with_format(row, col, value, format)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Full CSV upload to workbook conversion, encrypting when a password is given.
pub fn csv_to_xlsx(csv: &[u8], options: &WorkbookOptions<'_>) -> Result<Vec<u8>> {
    let rows = read_csv(csv)?;
    let package = build_workbook(&rows, options)?;
    if options.password.is_empty() {
        return Ok(package);
    }
    crypto::encrypt_package(&package, options.password)
}
