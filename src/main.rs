// Command-line presenter for the analytics pipeline.
//
// Usage: order_analytics <orders-file> <sales-file> [from to]
//
// - Both files are required (.csv, .xlsx or .xls).
// - Dates are `YYYY-MM-DD`; with no dates the whole span of the data is used.
// - An `order_analytics.yaml` in the working directory overrides defaults.
//
// The run prints markdown previews of each report and exports the full
// tables to CSV plus a JSON summary.
use order_analytics::output;
use order_analytics::report;
use order_analytics::util::{format_int, format_number, parse_date_safe};
use order_analytics::{Config, Pipeline, PipelineResult, RangeRequest, Upload};
use std::env;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = "order_analytics.yaml";
const USAGE: &str = "usage: order_analytics <orders-file> <sales-file> [from to]";

/// Everything one invocation works on. Nothing here outlives the run.
struct Session {
    config: Config,
    orders_path: String,
    sales_path: String,
    request: RangeRequest,
}

impl Session {
    fn from_args(args: &[String]) -> Result<Self, Box<dyn Error>> {
        let parse = |s: &String| {
            parse_date_safe(Some(s.as_str())).ok_or_else(|| format!("invalid date '{}'", s))
        };
        let (orders_path, sales_path, request) = match args {
            [orders, sales] => (orders, sales, RangeRequest::default()),
            [orders, sales, from] => (
                orders,
                sales,
                RangeRequest::dates(Some(parse(from)?), None),
            ),
            [orders, sales, from, to] => (
                orders,
                sales,
                RangeRequest::dates(Some(parse(from)?), Some(parse(to)?)),
            ),
            _ => return Err(USAGE.into()),
        };
        let (orders_path, sales_path) = (orders_path.clone(), sales_path.clone());
        let config = if Path::new(CONFIG_FILE).exists() {
            tracing::info!(path = CONFIG_FILE, "loading config");
            Config::load(CONFIG_FILE)?
        } else {
            Config::default()
        };
        Ok(Session {
            config,
            orders_path,
            sales_path,
            request,
        })
    }

    fn run(self) -> Result<PipelineResult, Box<dyn Error>> {
        let orders_bytes = fs::read(&self.orders_path)?;
        let sales_bytes = fs::read(&self.sales_path)?;
        let pipeline = Pipeline::new(self.config)?;
        let result = pipeline.run(
            Upload::new(&orders_bytes, &self.orders_path),
            Upload::new(&sales_bytes, &self.sales_path),
            self.request,
        )?;
        Ok(result)
    }
}

/// Print previews and write every export. A failed write is reported but
/// does not stop the remaining exports.
fn present(result: &PipelineResult) {
    match result.range {
        Some(r) => println!("Period: {} .. {}\n", r.from, r.to),
        None => println!("Period: no rows with a valid date\n"),
    }

    let products = report::product_rows(&result.products);
    export("report_products.csv", &products);
    output::preview_table("Mahsulotlar kesimida", Some("Return_% = Qaytish / Sotuv"), &products, 5);

    let clients = report::client_rows(&result.clients);
    export("report_clients.csv", &clients);
    let top = report::client_rows(&result.top_clients);
    output::preview_table(
        "Klientlar kesimida QAYTISH ANALIZI",
        Some("Top by Qaytish_%"),
        &top,
        top.len(),
    );

    let weekdays = report::weekday_rows(&result.weekdays);
    export("report_weekdays.csv", &weekdays);
    output::preview_table("Hafta kunlari", None, &weekdays, 7);

    let losses = report::loss_rows(&result.losses);
    export("report_losses.csv", &losses);
    output::preview_table("Zarar mahsulotlar", None, &losses, 10);

    let daily = report::forecast_rows(&result.daily);
    export("report_forecast.csv", &daily);
    output::preview_table("Kunlik zakaz va prognoz", Some("3-day moving average"), &daily, 10);

    let summary = report::summary(result);
    if let Err(e) = output::write_json("summary.json", &summary) {
        tracing::error!(error = %e, "failed to write summary.json");
    }
    println!("Summary Stats (summary.json):");
    println!(
        "Zakaz: {}, Sotuv: {}, Qaytish: {} ({}%), loss products: {}\n",
        format_number(summary.total_ordered_qty, 0),
        format_number(summary.total_sale_amount, 2),
        format_number(summary.total_return_amount, 2),
        format_number(summary.return_pct, 2),
        format_int(summary.loss_products),
    );
}

fn export<T: serde::Serialize>(path: &str, rows: &[T]) {
    match output::write_csv(path, rows) {
        Ok(()) => tracing::debug!(path, rows = rows.len(), "exported"),
        Err(e) => tracing::error!(path, error = %e, "write error"),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let outcome = Session::from_args(&args).and_then(Session::run);
    match outcome {
        Ok(result) => {
            present(&result);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn accepts_two_files_and_optional_dates() {
        let session = Session::from_args(&args(&["o.csv", "s.xlsx"])).unwrap();
        assert_eq!(session.orders_path, "o.csv");
        assert_eq!(session.request, RangeRequest::default());

        let session =
            Session::from_args(&args(&["o.csv", "s.xlsx", "2024-01-01", "2024-01-31"])).unwrap();
        assert_eq!(session.request.date_from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(session.request.date_to, NaiveDate::from_ymd_opt(2024, 1, 31));
    }

    #[test]
    fn rejects_wrong_argument_counts() {
        for list in [
            &["o.csv"][..],
            &["o.csv", "s.csv", "2024-01-01", "2024-01-31", "extra"][..],
        ] {
            let err = Session::from_args(&args(list)).err().unwrap();
            assert_eq!(err.to_string(), USAGE);
        }
    }

    #[test]
    fn rejects_bad_dates() {
        let err = Session::from_args(&args(&["o.csv", "s.csv", "soon", "2024-01-31"]))
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "invalid date 'soon'");
    }
}
