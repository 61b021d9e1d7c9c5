//! Turns a [`RawTable`] into typed records.
//!
//! Row count is always preserved: cells that fail to parse fall back to the
//! field default (numbers) or `None` (timestamps), rows are never dropped.
use crate::error::SchemaError;
use crate::schema::{ColumnMap, Field, Schema};
use crate::types::{Cell, OrderRecord, RawTable, SaleRecord};
use crate::util::{parse_datetime_safe, parse_f64_safe};
use chrono::NaiveDateTime;

/// Read access to one row through a resolved [`ColumnMap`].
struct RowView<'a> {
    table: &'a RawTable,
    schema: &'a Schema,
    columns: &'a ColumnMap,
    row: usize,
}

impl RowView<'_> {
    fn cell(&self, field: Field) -> Option<&Cell> {
        self.columns
            .index(field)
            .map(|col| self.table.cell(self.row, col))
    }

    /// Non-negative number; absent columns, blanks and junk give the default.
    fn number(&self, field: Field) -> f64 {
        let default = self.schema.spec(field).map(|s| s.default).unwrap_or(0.0);
        let value = match self.cell(field) {
            Some(Cell::Number(n)) => Some(*n),
            Some(Cell::Text(s)) => parse_f64_safe(Some(s)),
            _ => None,
        };
        match value {
            Some(v) if v.is_finite() && v >= 0.0 => v,
            Some(_) => 0.0,
            None => default,
        }
    }

    fn text(&self, field: Field) -> String {
        match self.cell(field) {
            Some(Cell::Text(s)) => s.trim().to_string(),
            // Numeric ids from spreadsheets come through as floats.
            Some(Cell::Number(n)) if n.fract() == 0.0 => format!("{}", *n as i64),
            Some(Cell::Number(n)) => n.to_string(),
            Some(Cell::DateTime(dt)) => dt.to_string(),
            Some(Cell::Empty) | None => String::new(),
        }
    }

    fn timestamp(&self, field: Field) -> Option<NaiveDateTime> {
        match self.cell(field)? {
            Cell::DateTime(dt) => Some(*dt),
            Cell::Text(s) => parse_datetime_safe(Some(s)),
            Cell::Number(_) | Cell::Empty => None,
        }
    }
}

fn rows<'a>(
    table: &'a RawTable,
    schema: &'a Schema,
    columns: &'a ColumnMap,
) -> impl Iterator<Item = RowView<'a>> + 'a {
    (0..table.row_count()).map(move |row| RowView {
        table,
        schema,
        columns,
        row,
    })
}

fn log_missing_timestamps(table: &'static str, total: usize, missing: usize) {
    if missing > 0 {
        tracing::warn!(
            table,
            missing,
            total,
            "rows with unparseable timestamp will be excluded from date ranges"
        );
    }
}

pub fn normalize_orders(table: &RawTable, schema: &Schema) -> Result<Vec<OrderRecord>, SchemaError> {
    let columns = schema.resolve(table)?;
    let records: Vec<OrderRecord> = rows(table, schema, &columns)
        .map(|r| OrderRecord {
            quantity: r.number(Field::Quantity),
            amount: r.number(Field::OrderAmount),
            counterparty: r.text(Field::Counterparty),
            product: r.text(Field::Product),
            timestamp: r.timestamp(Field::Timestamp),
        })
        .collect();
    let missing = records.iter().filter(|r| r.timestamp.is_none()).count();
    log_missing_timestamps(schema.table, records.len(), missing);
    tracing::debug!(rows = records.len(), "normalized orders");
    Ok(records)
}

pub fn normalize_sales(table: &RawTable, schema: &Schema) -> Result<Vec<SaleRecord>, SchemaError> {
    let columns = schema.resolve(table)?;
    let records: Vec<SaleRecord> = rows(table, schema, &columns)
        .map(|r| SaleRecord {
            quantity: r.number(Field::Quantity),
            sale_amount: r.number(Field::SaleAmount),
            return_amount: r.number(Field::ReturnAmount),
            return_quantity: r.number(Field::ReturnQuantity),
            cost_amount: r.number(Field::CostAmount),
            counterparty: r.text(Field::Counterparty),
            product: r.text(Field::Product),
            timestamp: r.timestamp(Field::Timestamp),
        })
        .collect();
    let missing = records.iter().filter(|r| r.timestamp.is_none()).count();
    log_missing_timestamps(schema.table, records.len(), missing);
    tracing::debug!(rows = records.len(), "normalized sales");
    Ok(records)
}
