//! One full run: load, normalize, filter, aggregate, derive, forecast.
//!
//! Each stage takes the previous stage's output by reference and returns a
//! new value; nothing is kept between runs.
use crate::aggregate::{client_summary, product_summary, weekday_product_rollup, weekday_rollup};
use crate::config::Config;
use crate::error::Result;
use crate::filter::{filter_orders, filter_sales, DateRange, RangeRequest};
use crate::forecast::forecast;
use crate::loader::load_table;
use crate::metrics::{kpis, loss_products, top_clients};
use crate::normalize::{normalize_orders, normalize_sales};
use crate::types::{
    ClientSummary, DailyPoint, Kpis, LossRow, ProductSummary, WeekdayProductRow, WeekdayRow,
};
use chrono::NaiveDate;
use serde::Serialize;

/// An uploaded file: raw bytes plus the name used to pick a parser.
#[derive(Debug, Clone, Copy)]
pub struct Upload<'a> {
    pub bytes: &'a [u8],
    pub name: &'a str,
}

impl<'a> Upload<'a> {
    pub fn new(bytes: &'a [u8], name: &'a str) -> Self {
        Upload { bytes, name }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    /// Range actually applied; `None` when no row had a usable timestamp.
    pub range: Option<DateRange>,
    pub products: Vec<ProductSummary>,
    pub clients: Vec<ClientSummary>,
    pub top_clients: Vec<ClientSummary>,
    pub weekdays: Vec<WeekdayRow>,
    pub weekday_products: Vec<WeekdayProductRow>,
    pub losses: Vec<LossRow>,
    pub daily: Vec<DailyPoint>,
    pub kpis: Kpis,
}

pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Pipeline { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(
        &self,
        orders: Upload<'_>,
        sales: Upload<'_>,
        request: RangeRequest,
    ) -> Result<PipelineResult> {
        let orders_raw = load_table(orders.bytes, orders.name)?;
        let sales_raw = load_table(sales.bytes, sales.name)?;

        let orders = normalize_orders(&orders_raw, &self.config.order_schema())?;
        let sales = normalize_sales(&sales_raw, &self.config.sale_schema())?;

        let range = request.resolve(self.config.fixed_range, &orders, &sales)?;
        let orders = filter_orders(&orders, range.as_ref());
        let sales = filter_sales(&sales, range.as_ref());
        tracing::debug!(
            orders = orders.len(),
            sales = sales.len(),
            ?range,
            "rows in range"
        );

        let products = product_summary(&orders, &sales);
        let clients = client_summary(&orders, &sales);
        let losses = loss_products(&products, &sales, self.config.loss_threshold_pct);
        let result = PipelineResult {
            range,
            top_clients: top_clients(&clients, self.config.top_n),
            weekdays: weekday_rollup(&orders, &sales),
            weekday_products: weekday_product_rollup(&orders, &sales),
            daily: forecast(&orders, self.config.forecast_window),
            kpis: kpis(&orders, &sales),
            products,
            clients,
            losses,
        };
        tracing::info!(
            products = result.products.len(),
            clients = result.clients.len(),
            losses = result.losses.len(),
            days = result.daily.len(),
            "pipeline finished"
        );
        Ok(result)
    }
}

/// Run with the default configuration over `[date_from, date_to]`.
///
/// Passing neither bound uses the span of the data; passing only one is a
/// date range error.
pub fn run_pipeline(
    orders_bytes: &[u8],
    orders_name: &str,
    sales_bytes: &[u8],
    sales_name: &str,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
) -> Result<PipelineResult> {
    Pipeline::new(Config::default())?.run(
        Upload::new(orders_bytes, orders_name),
        Upload::new(sales_bytes, sales_name),
        RangeRequest::dates(date_from, date_to),
    )
}
