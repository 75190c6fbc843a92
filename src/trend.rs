use crate::config::GoodsValuation;
use crate::error::Result;
use crate::record::{DisbursementKind, UnifiedDisbursement};
use crate::utils::{calendar_year_bounds, month_label, months_in_range, year_month, YearMonth};
use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrendPoint {
    pub year: i32,
    pub month: u32,
    /// e.g. "Mar 2024"
    pub label: String,
    pub monetary: f64,
    pub goods: f64,
    pub total: f64,
    pub transaction_count: usize,
}

#[derive(Default)]
struct MonthBucket {
    monetary: f64,
    goods: f64,
    count: usize,
}

/// Works out the inclusive date range the trend must cover.
///
/// Supplied bounds win; a missing bound comes from the records, then from the
/// other supplied bound. With nothing to go on, the calendar year of `today`.
pub fn resolve_range(
    records: &[UnifiedDisbursement],
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate)> {
    let earliest = records.iter().map(|r| r.date).min();
    let latest = records.iter().map(|r| r.date).max();

    let start = date_from.or(earliest).or(date_to);
    let end = date_to.or(latest).or(date_from);

    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => calendar_year_bounds(today.year()),
    }
}

/// One point per calendar month of the resolved range, ascending, including
/// months with no activity. Operational spend is not part of the trend.
pub fn monthly_trend(
    records: &[UnifiedDisbursement],
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    today: NaiveDate,
    valuation: GoodsValuation,
) -> Result<Vec<MonthlyTrendPoint>> {
    let (start, end) = resolve_range(records, date_from, date_to, today)?;

    let mut grid: BTreeMap<YearMonth, MonthBucket> = months_in_range(start, end)
        .into_iter()
        .map(|ym| (ym, MonthBucket::default()))
        .collect();

    for record in records {
        let Some(bucket) = grid.get_mut(&year_month(record.date)) else {
            continue;
        };
        let value = record.monetary_value(valuation);
        match record.kind {
            DisbursementKind::Monetary => bucket.monetary += value,
            DisbursementKind::Goods => bucket.goods += value,
            DisbursementKind::Operational => continue,
        }
        bucket.count += 1;
    }

    debug!(
        "Monthly trend covers {} months from {} to {}",
        grid.len(),
        start,
        end
    );

    Ok(grid
        .into_iter()
        .map(|((year, month), bucket)| MonthlyTrendPoint {
            year,
            month,
            label: month_label(year, month),
            monetary: bucket.monetary,
            goods: bucket.goods,
            total: bucket.monetary + bucket.goods,
            transaction_count: bucket.count,
        })
        .collect())
}
