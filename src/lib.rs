//! # BD Report Builder
//!
//! A library for turning per-BD monthly registration rows (as produced by the
//! reporting query) into aligned, time-bucketed summaries for the sales dashboard.
//!
//! ## Core Concepts
//!
//! - **Packed summaries**: each row carries `"Name: <n> regs / <value>, ..."` strings
//!   for verticals and clients, parsed by [`parse_summary`]
//! - **Month labels**: the dashboard's columns, latest first, from [`generate_labels`]
//! - **Date range**: the backend query window for the same selection, from [`compute_range`]
//! - **Aggregates**: one [`BdAggregate`] per BD with monthly data aligned to the labels
//!   and a zero-filled per-entity breakdown, from [`group_and_map`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use bd_report_builder::*;
//!
//! let config = ReportConfig {
//!     time_range: TimeRangeSelection::relative(2),
//!     bd_filter: BdFilter::exclude(["House Account"]),
//! };
//!
//! let builder = ReportBuilder::new(SystemClock);
//! let window = builder.window(&config)?;
//! // fetch rows from the backend with window.range.query_params()
//! let rows = rows_from_json(&response_body)?;
//! let report = builder.build_for_window(&config, window, &rows);
//! ```

pub mod engine;
pub mod error;
pub mod filter;
pub mod ingestion;
pub mod labels;
pub mod range;
pub mod schema;
pub mod summary;
pub mod utils;

pub use engine::{group_and_map, BdGrouper};
pub use error::{ReportError, Result};
pub use filter::{MonthlyTotal, ReportTotals};
pub use ingestion::{row_schema_as_json, rows_from_json, rows_from_reader};
pub use labels::{generate_labels, month_options, trailing_months};
pub use range::{compute_range, Clock, DateRange, FixedClock, SystemClock, TimeRange};
pub use schema::*;
pub use summary::parse_summary;
pub use utils::YearMonth;

use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Labels and query range derived from one reading of the clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportWindow {
    pub labels: Vec<String>,
    pub range: DateRange,
}

/// Everything the presentation layer needs to render the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub labels: Vec<String>,
    pub date_range: DateRange,
    pub bds: Vec<BdAggregate>,
    pub totals: ReportTotals,
}

pub struct ReportBuilder<C: Clock> {
    clock: C,
}

impl<C: Clock> ReportBuilder<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Computes the month labels and backend query range for a configuration.
    pub fn window(&self, config: &ReportConfig) -> Result<ReportWindow> {
        let now = self.clock.now();
        let range = compute_range(&config.time_range, &now)?;
        let labels = generate_labels(&config.time_range, now.date_naive());

        debug!(
            "Report window: {} labels, {} .. {}",
            labels.len(),
            range.from_iso(),
            range.to_iso()
        );

        Ok(ReportWindow { labels, range })
    }

    /// Builds the report from rows fetched for `window`.
    pub fn build_for_window(
        &self,
        config: &ReportConfig,
        window: ReportWindow,
        rows: &[RawMonthlyRow],
    ) -> DashboardReport {
        let aggregates = group_and_map(rows, &window.labels);
        let bds = config.bd_filter.apply(aggregates);
        let totals = ReportTotals::from_aggregates(&bds, &window.labels);

        info!(
            "Built report for {} BDs over {} months ({} registrations)",
            bds.len(),
            window.labels.len(),
            totals.total_registrations
        );

        DashboardReport {
            labels: window.labels,
            date_range: window.range,
            bds,
            totals,
        }
    }

    /// Computes a fresh window and builds the report from `rows` in one step.
    pub fn build(&self, config: &ReportConfig, rows: &[RawMonthlyRow]) -> Result<DashboardReport> {
        let window = self.window(config)?;
        Ok(self.build_for_window(config, window, rows))
    }
}

pub fn build_report<C: Clock>(
    clock: C,
    config: &ReportConfig,
    rows: &[RawMonthlyRow],
) -> Result<DashboardReport> {
    ReportBuilder::new(clock).build(config, rows)
}
