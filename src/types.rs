use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// A single cell as read from an uploaded file.
///
/// CSV input only ever produces `Text` and `Empty`; spreadsheets keep their
/// native numeric and date cells so the normalizer does not have to re-parse
/// them.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Build a cell from raw text, treating whitespace-only input as empty.
    pub fn from_text(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

/// Untyped table straight out of the loader.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        RawTable { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell at `(row, col)`. Ragged rows read as `Empty` past their end.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    pub quantity: f64,
    pub amount: f64,
    pub counterparty: String,
    pub product: String,
    pub timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleRecord {
    pub quantity: f64,
    pub sale_amount: f64,
    pub return_amount: f64,
    pub return_quantity: f64,
    pub cost_amount: f64,
    pub counterparty: String,
    pub product: String,
    pub timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub product: String,
    #[serde(rename = "Zakaz")]
    pub ordered_qty: f64,
    #[serde(rename = "Sotuv_soni")]
    pub sold_qty: f64,
    #[serde(rename = "Sotuv")]
    pub sold_amount: f64,
    #[serde(rename = "Qaytish")]
    pub returned_amount: f64,
    #[serde(rename = "Return_%")]
    pub return_pct: f64,
    #[serde(rename = "Bajarilish_%")]
    pub fulfillment_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientSummary {
    pub counterparty: String,
    #[serde(rename = "Zakaz_soni")]
    pub ordered_qty: f64,
    #[serde(rename = "Sotuv_summa")]
    pub sold_amount: f64,
    #[serde(rename = "Qaytish_summa")]
    pub returned_amount: f64,
    #[serde(rename = "Qaytish_%")]
    pub return_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayRow {
    pub weekday: &'static str,
    pub ordered_qty: f64,
    pub returned_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayProductRow {
    pub weekday: &'static str,
    pub product: String,
    pub ordered_qty: f64,
    pub returned_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LossRow {
    pub product: String,
    pub sold_amount: f64,
    pub returned_amount: f64,
    pub cost_amount: f64,
    pub return_pct: f64,
    /// `sold - returned - cost`; informational, not part of the loss rule.
    pub margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub ordered_qty: f64,
    pub forecast: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_ordered_qty: f64,
    pub total_sold_qty: f64,
    pub total_sale_amount: f64,
    pub total_return_amount: f64,
    pub return_pct: f64,
    pub fulfillment_pct: f64,
}
