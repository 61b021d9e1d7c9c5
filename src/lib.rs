//! Order, sales and returns analytics.
//!
//! Two uploaded tables go in (purchase orders, sales with returns), and a
//! [`PipelineResult`] comes out: per-product and per-client return shares,
//! a Monday..Sunday activity rollup, loss-making products, daily order
//! volume with a moving-average forecast, and headline KPIs.
pub mod aggregate;
pub mod config;
pub mod error;
pub mod filter;
pub mod forecast;
pub mod loader;
pub mod metrics;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod types;
pub mod util;

pub use config::Config;
pub use error::{DateRangeError, LoadError, PipelineError, SchemaError};
pub use filter::{DateRange, RangeRequest};
pub use pipeline::{run_pipeline, Pipeline, PipelineResult, Upload};
