//! Grouped sums and the joined per-key summaries built on them.
//!
//! A [`Grouped`] table is a set of named measure columns indexed by an
//! ordered key. Summaries over orders and sales are built separately and
//! then combined with [`outer_union`], so a key seen in only one input still
//! gets a row with zeros for the other side's measures.
use crate::metrics::safe_pct;
use crate::types::{
    ClientSummary, OrderRecord, ProductSummary, SaleRecord, WeekdayProductRow, WeekdayRow,
};
use chrono::{Datelike, Weekday};
use std::collections::BTreeMap;

/// A measure: column name plus how to read it from a record.
pub type Measure<T> = (&'static str, fn(&T) -> f64);

#[derive(Debug, Clone, PartialEq)]
pub struct Grouped<K: Ord> {
    pub columns: Vec<&'static str>,
    pub rows: BTreeMap<K, Vec<f64>>,
}

impl<K: Ord> Grouped<K> {
    /// Value of `column` for `key`; 0 when either is absent.
    pub fn get(&self, key: &K, column: &str) -> f64 {
        let Some(idx) = self.columns.iter().position(|c| *c == column) else {
            return 0.0;
        };
        self.rows.get(key).map(|vals| vals[idx]).unwrap_or(0.0)
    }
}

/// Sum each measure per key. Rows whose key is `None` are skipped.
pub fn group_sum<T, K, F>(rows: &[T], key: F, measures: &[Measure<T>]) -> Grouped<K>
where
    K: Ord,
    F: Fn(&T) -> Option<K>,
{
    let mut out: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for row in rows {
        let Some(k) = key(row) else { continue };
        let sums = out.entry(k).or_insert_with(|| vec![0.0; measures.len()]);
        for (sum, (_, read)) in sums.iter_mut().zip(measures) {
            *sum += read(row);
        }
    }
    Grouped {
        columns: measures.iter().map(|(name, _)| *name).collect(),
        rows: out,
    }
}

/// Concatenate the measure columns of several grouped tables.
///
/// Works like a full outer join on the key: every key from every part is
/// present and measures a part has no row for are filled with 0.
pub fn outer_union<K: Ord + Clone>(parts: Vec<Grouped<K>>) -> Grouped<K> {
    let columns: Vec<&'static str> = parts.iter().flat_map(|p| p.columns.clone()).collect();
    let mut rows: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    let mut offset = 0;
    for part in parts {
        let width = part.columns.len();
        for (key, vals) in part.rows {
            let slot = rows
                .entry(key)
                .or_insert_with(|| vec![0.0; columns.len()]);
            slot[offset..offset + width].copy_from_slice(&vals);
        }
        offset += width;
    }
    Grouped { columns, rows }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

pub fn product_summary(orders: &[OrderRecord], sales: &[SaleRecord]) -> Vec<ProductSummary> {
    let ordered = group_sum(orders, |r| non_blank(&r.product), &[("ordered_qty", |r| r.quantity)]);
    let sold = group_sum(
        sales,
        |r| non_blank(&r.product),
        &[
            ("sold_qty", |r| r.quantity),
            ("sold_amount", |r| r.sale_amount),
            ("returned_amount", |r| r.return_amount),
        ],
    );
    outer_union(vec![ordered, sold])
        .rows
        .into_iter()
        .map(|(product, v)| ProductSummary {
            product,
            ordered_qty: v[0],
            sold_qty: v[1],
            sold_amount: v[2],
            returned_amount: v[3],
            return_pct: safe_pct(v[3], v[2]),
            fulfillment_pct: safe_pct(v[1], v[0]),
        })
        .collect()
}

pub fn client_summary(orders: &[OrderRecord], sales: &[SaleRecord]) -> Vec<ClientSummary> {
    let ordered = group_sum(
        orders,
        |r| non_blank(&r.counterparty),
        &[("ordered_qty", |r| r.quantity)],
    );
    let sold = group_sum(
        sales,
        |r| non_blank(&r.counterparty),
        &[
            ("sold_amount", |r| r.sale_amount),
            ("returned_amount", |r| r.return_amount),
        ],
    );
    outer_union(vec![ordered, sold])
        .rows
        .into_iter()
        .map(|(counterparty, v)| ClientSummary {
            counterparty,
            ordered_qty: v[0],
            sold_amount: v[1],
            returned_amount: v[2],
            return_pct: safe_pct(v[2], v[1]),
        })
        .collect()
}

pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// English weekday name; independent of any locale setting.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

// `Weekday` is not `Ord`; Monday = 0 keeps BTreeMap order Monday..Sunday.
fn order_day(r: &OrderRecord) -> Option<u32> {
    r.timestamp.map(|ts| ts.weekday().num_days_from_monday())
}

fn sale_day(r: &SaleRecord) -> Option<u32> {
    r.timestamp.map(|ts| ts.weekday().num_days_from_monday())
}

/// Always seven rows, Monday first, idle days as zeros.
pub fn weekday_rollup(orders: &[OrderRecord], sales: &[SaleRecord]) -> Vec<WeekdayRow> {
    let combined = outer_union(vec![
        group_sum(orders, order_day, &[("ordered_qty", |r| r.quantity)]),
        group_sum(sales, sale_day, &[("returned_amount", |r| r.return_amount)]),
    ]);
    WEEKDAYS
        .iter()
        .map(|day| {
            let key = day.num_days_from_monday();
            WeekdayRow {
                weekday: weekday_name(*day),
                ordered_qty: combined.get(&key, "ordered_qty"),
                returned_amount: combined.get(&key, "returned_amount"),
            }
        })
        .collect()
}

/// Weekday x product breakdown. Only combinations with data appear.
pub fn weekday_product_rollup(
    orders: &[OrderRecord],
    sales: &[SaleRecord],
) -> Vec<WeekdayProductRow> {
    let combined = outer_union(vec![
        group_sum(
            orders,
            |r| Some((order_day(r)?, non_blank(&r.product)?)),
            &[("ordered_qty", |r| r.quantity)],
        ),
        group_sum(
            sales,
            |r| Some((sale_day(r)?, non_blank(&r.product)?)),
            &[("returned_amount", |r| r.return_amount)],
        ),
    ]);
    combined
        .rows
        .into_iter()
        .map(|((day, product), v)| WeekdayProductRow {
            weekday: weekday_name(WEEKDAYS[day as usize]),
            product,
            ordered_qty: v[0],
            returned_amount: v[1],
        })
        .collect()
}
