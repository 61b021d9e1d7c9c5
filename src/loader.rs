use crate::error::LoadError;
use crate::types::{Cell, RawTable};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Xls, Xlsx};
use csv::{ReaderBuilder, Trim};
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    Xlsx,
    Xls,
}

impl Format {
    fn from_name(name: &str) -> Option<Format> {
        let lower = name.trim().to_lowercase();
        if lower.ends_with(".csv") {
            Some(Format::Csv)
        } else if lower.ends_with(".xlsx") {
            Some(Format::Xlsx)
        } else if lower.ends_with(".xls") {
            Some(Format::Xls)
        } else {
            None
        }
    }
}

/// Parse an uploaded file into a [`RawTable`].
///
/// The parser is chosen by extension. When it fails, one alternate
/// spreadsheet parser is tried before giving up: CSV falls back to format
/// auto-detection, `.xlsx` to the legacy `.xls` reader and vice versa.
pub fn load_table(bytes: &[u8], name: &str) -> Result<RawTable, LoadError> {
    let format =
        Format::from_name(name).ok_or_else(|| LoadError::UnsupportedExtension(name.to_string()))?;

    let primary = match format {
        Format::Csv => read_csv(bytes),
        Format::Xlsx => read_workbook::<Xlsx<Cursor<&[u8]>>>(bytes),
        Format::Xls => read_workbook::<Xls<Cursor<&[u8]>>>(bytes),
    };
    let first_err = match primary {
        Ok(table) => {
            tracing::debug!(
                file = name,
                rows = table.row_count(),
                columns = table.headers.len(),
                "loaded table"
            );
            return Ok(table);
        }
        Err(e) => e,
    };

    tracing::warn!(file = name, error = %first_err, "primary parser failed, trying fallback");
    let fallback = match format {
        Format::Csv => read_auto(bytes),
        Format::Xlsx => read_workbook::<Xls<Cursor<&[u8]>>>(bytes),
        Format::Xls => read_workbook::<Xlsx<Cursor<&[u8]>>>(bytes),
    };
    fallback.map_err(|second_err| LoadError::Unreadable {
        name: name.to_string(),
        reason: format!("{}; fallback: {}", first_err, second_err),
    })
}

fn read_csv(bytes: &[u8]) -> Result<RawTable, String> {
    let bytes = bytes.strip_prefix("\u{feff}".as_bytes()).unwrap_or(bytes);
    let mut rdr = ReaderBuilder::new()
        .delimiter(sniff_delimiter(bytes))
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err("no header row".to_string());
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| e.to_string())?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }
    Ok(RawTable::new(headers, rows))
}

/// Pick `;` when the header line uses it more than `,` (common in
/// spreadsheet exports with a decimal comma), otherwise `,`.
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let header = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let semis = header.iter().filter(|b| **b == b';').count();
    let commas = header.iter().filter(|b| **b == b',').count();
    if semis > commas {
        b';'
    } else {
        b','
    }
}

fn read_workbook<'a, W>(bytes: &'a [u8]) -> Result<RawTable, String>
where
    W: Reader<Cursor<&'a [u8]>>,
    W::Error: std::fmt::Display,
{
    let mut workbook = W::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "workbook has no sheets".to_string())?
        .map_err(|e| e.to_string())?;
    range_to_table(&range)
}

fn read_auto(bytes: &[u8]) -> Result<RawTable, String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "workbook has no sheets".to_string())?
        .map_err(|e| e.to_string())?;
    range_to_table(&range)
}

fn range_to_table(range: &Range<Data>) -> Result<RawTable, String> {
    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| "sheet is empty".to_string())?
        .iter()
        .map(|cell| match cell {
            Data::Empty => String::new(),
            Data::String(s) => s.trim().to_string(),
            other => other.to_string(),
        })
        .collect();
    let rows = rows.map(|r| r.iter().map(cell_from_data).collect()).collect();
    Ok(RawTable::new(headers, rows))
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from_text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => dt.as_datetime().map(Cell::DateTime).unwrap_or(Cell::Empty),
    }
}
