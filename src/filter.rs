use crate::config::FixedRange;
use crate::error::DateRangeError;
use crate::types::{OrderRecord, SaleRecord};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeWindow {
    pub from: NaiveTime,
    pub to: NaiveTime,
}

/// Closed date interval, optionally narrowed to a time-of-day window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub time: Option<TimeWindow>,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, DateRangeError> {
        if from > to {
            return Err(DateRangeError::Inverted { from, to });
        }
        Ok(DateRange {
            from,
            to,
            time: None,
        })
    }

    pub fn with_time(self, time: Option<TimeWindow>) -> Self {
        DateRange { time, ..self }
    }

    /// Smallest range covering every valid timestamp in both tables, or
    /// `None` when neither table has one.
    pub fn spanning(orders: &[OrderRecord], sales: &[SaleRecord]) -> Option<DateRange> {
        let dates = orders
            .iter()
            .filter_map(|r| r.timestamp)
            .chain(sales.iter().filter_map(|r| r.timestamp))
            .map(|ts| ts.date());
        let (min, max) = dates.fold(None, |acc: Option<(NaiveDate, NaiveDate)>, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })?;
        Some(DateRange {
            from: min,
            to: max,
            time: None,
        })
    }

    /// Both bounds inclusive. A missing timestamp is never in range.
    pub fn contains(&self, ts: Option<NaiveDateTime>) -> bool {
        let Some(ts) = ts else {
            return false;
        };
        let date = ts.date();
        if date < self.from || date > self.to {
            return false;
        }
        match self.time {
            Some(w) => w.from <= ts.time() && ts.time() <= w.to,
            None => true,
        }
    }
}

/// What the caller asked for. Each pair of bounds is all-or-nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RangeRequest {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub time_from: Option<NaiveTime>,
    pub time_to: Option<NaiveTime>,
}

impl RangeRequest {
    pub fn dates(date_from: Option<NaiveDate>, date_to: Option<NaiveDate>) -> Self {
        RangeRequest {
            date_from,
            date_to,
            ..Default::default()
        }
    }

    /// Settle the effective range.
    ///
    /// Caller bounds win over the configured fixed range, which wins over
    /// the span of the data. `Ok(None)` means no row has a valid timestamp,
    /// so nothing can be in range.
    pub fn resolve(
        &self,
        fixed: Option<FixedRange>,
        orders: &[OrderRecord],
        sales: &[SaleRecord],
    ) -> Result<Option<DateRange>, DateRangeError> {
        let time = match (self.time_from, self.time_to) {
            (Some(from), Some(to)) if from > to => {
                return Err(DateRangeError::InvertedTimes { from, to })
            }
            (Some(from), Some(to)) => Some(TimeWindow { from, to }),
            (None, None) => None,
            _ => return Err(DateRangeError::IncompleteTimes),
        };
        let range = match (self.date_from, self.date_to) {
            (Some(from), Some(to)) => Some(DateRange::new(from, to)?),
            (None, None) => match fixed {
                Some(f) => Some(DateRange::new(f.from, f.to)?),
                None => DateRange::spanning(orders, sales),
            },
            _ => return Err(DateRangeError::IncompleteDates),
        };
        Ok(range.map(|r| r.with_time(time)))
    }
}

pub fn filter_orders(orders: &[OrderRecord], range: Option<&DateRange>) -> Vec<OrderRecord> {
    match range {
        Some(range) => orders
            .iter()
            .filter(|r| range.contains(r.timestamp))
            .cloned()
            .collect(),
        None => Vec::new(),
    }
}

pub fn filter_sales(sales: &[SaleRecord], range: Option<&DateRange>) -> Vec<SaleRecord> {
    match range {
        Some(range) => sales
            .iter()
            .filter(|r| range.contains(r.timestamp))
            .cloned()
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ts(y: i32, m: u32, day: u32, h: u32) -> Option<NaiveDateTime> {
        d(y, m, day).and_hms_opt(h, 0, 0)
    }

    fn order(timestamp: Option<NaiveDateTime>) -> OrderRecord {
        OrderRecord {
            quantity: 1.0,
            amount: 0.0,
            counterparty: "C".to_string(),
            product: "P".to_string(),
            timestamp,
        }
    }

    #[test]
    fn bounds_are_inclusive_at_day_granularity() {
        let range = DateRange::new(d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        assert!(range.contains(ts(2024, 1, 1, 0)));
        assert!(range.contains(ts(2024, 1, 31, 23)));
        assert!(!range.contains(ts(2024, 2, 1, 0)));
        assert!(!range.contains(ts(2023, 12, 31, 23)));
        assert!(!range.contains(None));
    }

    #[test]
    fn time_window_composes_with_dates() {
        let window = TimeWindow {
            from: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            to: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        };
        let range = DateRange::new(d(2024, 1, 1), d(2024, 1, 2))
            .unwrap()
            .with_time(Some(window));
        assert!(range.contains(ts(2024, 1, 1, 9)));
        assert!(range.contains(ts(2024, 1, 2, 18)));
        assert!(!range.contains(ts(2024, 1, 1, 8)));
        assert!(!range.contains(ts(2024, 1, 3, 12)));
    }

    #[test]
    fn missing_timestamps_excluded_even_for_full_span() {
        let orders = vec![
            order(ts(2024, 1, 1, 0)),
            order(None),
            order(ts(2024, 3, 1, 0)),
        ];
        let range = RangeRequest::default()
            .resolve(None, &orders, &[])
            .unwrap()
            .unwrap();
        assert_eq!((range.from, range.to), (d(2024, 1, 1), d(2024, 3, 1)));
        let kept = filter_orders(&orders, Some(&range));
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| r.timestamp.is_some()));
    }

    #[test]
    fn no_valid_timestamps_means_nothing_in_range() {
        let orders = vec![order(None), order(None)];
        let range = RangeRequest::default().resolve(None, &orders, &[]).unwrap();
        assert_eq!(range, None);
        assert!(filter_orders(&orders, range.as_ref()).is_empty());
    }

    #[test]
    fn incomplete_or_inverted_requests_fail() {
        let half = RangeRequest::dates(Some(d(2024, 1, 1)), None);
        assert_eq!(
            half.resolve(None, &[], &[]),
            Err(DateRangeError::IncompleteDates)
        );

        let half_time = RangeRequest {
            time_from: NaiveTime::from_hms_opt(9, 0, 0),
            ..Default::default()
        };
        assert_eq!(
            half_time.resolve(None, &[], &[]),
            Err(DateRangeError::IncompleteTimes)
        );

        let inverted = RangeRequest::dates(Some(d(2024, 2, 1)), Some(d(2024, 1, 1)));
        assert!(matches!(
            inverted.resolve(None, &[], &[]),
            Err(DateRangeError::Inverted { .. })
        ));

        // A window wrapping midnight is not a valid inclusive interval.
        let late = NaiveTime::from_hms_opt(22, 0, 0).unwrap();
        let early = NaiveTime::from_hms_opt(2, 0, 0).unwrap();
        let overnight = RangeRequest {
            date_from: Some(d(2024, 1, 1)),
            date_to: Some(d(2024, 1, 2)),
            time_from: Some(late),
            time_to: Some(early),
        };
        let orders = vec![order(ts(2024, 1, 1, 23))];
        assert_eq!(
            overnight.resolve(None, &orders, &[]),
            Err(DateRangeError::InvertedTimes {
                from: late,
                to: early
            })
        );
    }

    #[test]
    fn caller_bounds_override_fixed_range() {
        let fixed = FixedRange {
            from: d(2023, 1, 1),
            to: d(2023, 12, 31),
        };
        let from_config = RangeRequest::default()
            .resolve(Some(fixed), &[], &[])
            .unwrap()
            .unwrap();
        assert_eq!(from_config.from, d(2023, 1, 1));

        let explicit = RangeRequest::dates(Some(d(2024, 1, 1)), Some(d(2024, 1, 5)))
            .resolve(Some(fixed), &[], &[])
            .unwrap()
            .unwrap();
        assert_eq!(explicit.to, d(2024, 1, 5));
    }
}
