//! Daily order volume and its trailing moving average.
//!
//! This is a smoothing baseline only: no trend, no seasonality, no gap
//! filling between dates that have no orders.
use crate::aggregate::group_sum;
use crate::types::{DailyPoint, OrderRecord};
use crate::util::average;
use chrono::NaiveDate;

pub const DEFAULT_WINDOW: usize = 3;

/// Ordered quantity per calendar date, ascending. Untimestamped rows are
/// skipped.
pub fn daily_series(orders: &[OrderRecord]) -> Vec<(NaiveDate, f64)> {
    group_sum(
        orders,
        |r| r.timestamp.map(|ts| ts.date()),
        &[("ordered_qty", |r| r.quantity)],
    )
    .rows
    .into_iter()
    .map(|(date, v)| (date, v[0]))
    .collect()
}

/// Trailing simple moving average. The first `window - 1` entries have no
/// value; a zero window yields no values at all.
pub fn moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                None
            } else {
                Some(average(&values[i + 1 - window..=i]))
            }
        })
        .collect()
}

pub fn forecast(orders: &[OrderRecord], window: usize) -> Vec<DailyPoint> {
    let series = daily_series(orders);
    let values: Vec<f64> = series.iter().map(|(_, qty)| *qty).collect();
    let smoothed = moving_average(&values, window);
    series
        .into_iter()
        .zip(smoothed)
        .map(|((date, ordered_qty), forecast)| DailyPoint {
            date,
            ordered_qty,
            forecast,
        })
        .collect()
}
