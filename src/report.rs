//! Display rows for the presentation layer.
//!
//! Numbers are pre-formatted with thousands separators so the same rows can
//! be exported to CSV and previewed as markdown tables.
use crate::pipeline::PipelineResult;
use crate::types::{ClientSummary, DailyPoint, LossRow, ProductSummary, WeekdayRow};
use crate::util::format_number;
use serde::Serialize;
use tabled::Tabled;

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ProductReportRow {
    #[serde(rename = "Mahsulot")]
    #[tabled(rename = "Mahsulot")]
    pub product: String,
    #[serde(rename = "Zakaz")]
    #[tabled(rename = "Zakaz")]
    pub ordered_qty: String,
    #[serde(rename = "Sotuv")]
    #[tabled(rename = "Sotuv")]
    pub sold_amount: String,
    #[serde(rename = "Qaytish")]
    #[tabled(rename = "Qaytish")]
    pub returned_amount: String,
    #[serde(rename = "Return_%")]
    #[tabled(rename = "Return_%")]
    pub return_pct: String,
    #[serde(rename = "Bajarilish_%")]
    #[tabled(rename = "Bajarilish_%")]
    pub fulfillment_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ClientReportRow {
    #[serde(rename = "Klient")]
    #[tabled(rename = "Klient")]
    pub counterparty: String,
    #[serde(rename = "Zakaz_soni")]
    #[tabled(rename = "Zakaz_soni")]
    pub ordered_qty: String,
    #[serde(rename = "Sotuv_summa")]
    #[tabled(rename = "Sotuv_summa")]
    pub sold_amount: String,
    #[serde(rename = "Qaytish_summa")]
    #[tabled(rename = "Qaytish_summa")]
    pub returned_amount: String,
    #[serde(rename = "Qaytish_%")]
    #[tabled(rename = "Qaytish_%")]
    pub return_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct WeekdayReportRow {
    #[serde(rename = "Weekday")]
    #[tabled(rename = "Weekday")]
    pub weekday: String,
    #[serde(rename = "Zakaz")]
    #[tabled(rename = "Zakaz")]
    pub ordered_qty: String,
    #[serde(rename = "Qaytish")]
    #[tabled(rename = "Qaytish")]
    pub returned_amount: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct LossReportRow {
    #[serde(rename = "Mahsulot")]
    #[tabled(rename = "Mahsulot")]
    pub product: String,
    #[serde(rename = "Sotuv")]
    #[tabled(rename = "Sotuv")]
    pub sold_amount: String,
    #[serde(rename = "Qaytish")]
    #[tabled(rename = "Qaytish")]
    pub returned_amount: String,
    #[serde(rename = "Tannarx")]
    #[tabled(rename = "Tannarx")]
    pub cost_amount: String,
    #[serde(rename = "Return_%")]
    #[tabled(rename = "Return_%")]
    pub return_pct: String,
    #[serde(rename = "Margin")]
    #[tabled(rename = "Margin")]
    pub margin: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ForecastReportRow {
    #[serde(rename = "Sana")]
    #[tabled(rename = "Sana")]
    pub date: String,
    #[serde(rename = "Zakaz")]
    #[tabled(rename = "Zakaz")]
    pub ordered_qty: String,
    #[serde(rename = "Prognoz")]
    #[tabled(rename = "Prognoz")]
    pub forecast: String,
}

/// Headline numbers, written as `summary.json`.
#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub total_ordered_qty: f64,
    pub total_sale_amount: f64,
    pub total_return_amount: f64,
    pub return_pct: f64,
    pub fulfillment_pct: f64,
    pub loss_products: usize,
}

pub fn product_rows(rows: &[ProductSummary]) -> Vec<ProductReportRow> {
    rows.iter()
        .map(|p| ProductReportRow {
            product: p.product.clone(),
            ordered_qty: format_number(p.ordered_qty, 0),
            sold_amount: format_number(p.sold_amount, 2),
            returned_amount: format_number(p.returned_amount, 2),
            return_pct: format!("{:.2}", p.return_pct),
            fulfillment_pct: format!("{:.2}", p.fulfillment_pct),
        })
        .collect()
}

pub fn client_rows(rows: &[ClientSummary]) -> Vec<ClientReportRow> {
    rows.iter()
        .map(|c| ClientReportRow {
            counterparty: c.counterparty.clone(),
            ordered_qty: format_number(c.ordered_qty, 0),
            sold_amount: format_number(c.sold_amount, 2),
            returned_amount: format_number(c.returned_amount, 2),
            return_pct: format!("{:.2}", c.return_pct),
        })
        .collect()
}

pub fn weekday_rows(rows: &[WeekdayRow]) -> Vec<WeekdayReportRow> {
    rows.iter()
        .map(|w| WeekdayReportRow {
            weekday: w.weekday.to_string(),
            ordered_qty: format_number(w.ordered_qty, 0),
            returned_amount: format_number(w.returned_amount, 2),
        })
        .collect()
}

pub fn loss_rows(rows: &[LossRow]) -> Vec<LossReportRow> {
    rows.iter()
        .map(|l| LossReportRow {
            product: l.product.clone(),
            sold_amount: format_number(l.sold_amount, 2),
            returned_amount: format_number(l.returned_amount, 2),
            cost_amount: format_number(l.cost_amount, 2),
            return_pct: format!("{:.2}", l.return_pct),
            margin: format_number(l.margin, 2),
        })
        .collect()
}

pub fn forecast_rows(rows: &[DailyPoint]) -> Vec<ForecastReportRow> {
    rows.iter()
        .map(|d| ForecastReportRow {
            date: d.date.format("%Y-%m-%d").to_string(),
            ordered_qty: format_number(d.ordered_qty, 0),
            forecast: d
                .forecast
                .map(|f| format_number(f, 2))
                .unwrap_or_else(|| "NA".to_string()),
        })
        .collect()
}

pub fn summary(result: &PipelineResult) -> SummaryStats {
    let k = &result.kpis;
    SummaryStats {
        date_from: result.range.map(|r| r.from.to_string()),
        date_to: result.range.map(|r| r.to.to_string()),
        total_ordered_qty: k.total_ordered_qty,
        total_sale_amount: k.total_sale_amount,
        total_return_amount: k.total_return_amount,
        return_pct: k.return_pct,
        fulfillment_pct: k.fulfillment_pct,
        loss_products: result.losses.len(),
    }
}
