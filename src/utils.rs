use crate::error::{LedgerError, Result};
use chrono::{Datelike, NaiveDate};

/// A calendar month as (year, month), month 1-based.
pub type YearMonth = (i32, u32);

pub fn year_month(date: NaiveDate) -> YearMonth {
    (date.year(), date.month())
}

pub fn next_month((year, month): YearMonth) -> YearMonth {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

pub fn first_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| LedgerError::DateError(format!("Invalid month {:04}-{:02}", year, month)))
}

pub fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let (next_year, next_month) = next_month((year, month));
    first_day_of_month(next_year, next_month)?
        .pred_opt()
        .ok_or_else(|| LedgerError::DateError(format!("No last day for {:04}-{:02}", year, month)))
}

pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}

/// Every calendar month touched by `[start, end]`, ascending. Empty when
/// `end` falls in a month before `start`.
pub fn months_in_range(start: NaiveDate, end: NaiveDate) -> Vec<YearMonth> {
    let count = months_between(start, end) + 1;
    if count <= 0 {
        return Vec::new();
    }

    let mut months = Vec::with_capacity(count as usize);
    let mut current = year_month(start);
    for _ in 0..count {
        months.push(current);
        current = next_month(current);
    }
    months
}

/// Short display label, e.g. "Mar 2024".
pub fn month_label(year: i32, month: u32) -> String {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(date) => date.format("%b %Y").to_string(),
        None => format!("{:04}-{:02}", year, month),
    }
}

pub fn calendar_year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    Ok((first_day_of_month(year, 1)?, last_day_of_month(year, 12)?))
}

/// Parses a period string in the format "YYYY-MM" or "YYYY-MM:YYYY-MM"
/// Returns (first day of the first month, last day of the last month)
pub fn parse_period_string(period: &str) -> Result<(NaiveDate, NaiveDate)> {
    let parts: Vec<&str> = period.split(':').collect();

    match parts.as_slice() {
        [single] => {
            let start = parse_month(single)?;
            let end = last_day_of_month(start.year(), start.month())?;
            Ok((start, end))
        }
        [from, to] => {
            let start = parse_month(from)?;
            let end_month = parse_month(to)?;
            let end = last_day_of_month(end_month.year(), end_month.month())?;
            Ok((start, end))
        }
        _ => Err(LedgerError::DateError(format!(
            "Invalid period format: {}. Expected 'YYYY-MM' or 'YYYY-MM:YYYY-MM'",
            period
        ))),
    }
}

fn parse_month(value: &str) -> Result<NaiveDate> {
    let with_day = format!("{}-01", value.trim());
    NaiveDate::parse_from_str(&with_day, "%Y-%m-%d").map_err(|_| {
        LedgerError::DateError(format!(
            "Invalid date format in period: {}. Expected YYYY-MM",
            value
        ))
    })
}
