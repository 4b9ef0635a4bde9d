use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::{ReportError, ReportResult};

/// Inclusive date range a report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting an end date before the start date
    pub fn new(from: NaiveDate, to: NaiveDate) -> ReportResult<Self> {
        if to < from {
            return Err(ReportError::ValidationError(format!(
                "end date {} is before start date {}",
                to, from
            )));
        }
        Ok(Self { from, to })
    }

    /// January 1st through December 31st of a calendar year
    pub fn calendar_year(year: i32) -> ReportResult<Self> {
        if year < 0 {
            return Err(ReportError::ValidationError(format!(
                "year must not be negative (got {})",
                year
            )));
        }
        let from = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| ReportError::ValidationError(format!("invalid year: {}", year)))?;
        let to = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| ReportError::ValidationError(format!("invalid year: {}", year)))?;
        Ok(Self { from, to })
    }

    /// First through last day of a calendar month
    pub fn calendar_month(year: i32, month: u32) -> ReportResult<Self> {
        let from = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            ReportError::ValidationError(format!("invalid month: {}-{:02}", year, month))
        })?;
        Ok(Self {
            from,
            to: last_day_of_month(year, month).unwrap_or(from),
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    /// Every (year, month) the range touches, partial months included
    pub fn months(&self) -> Vec<(i32, u32)> {
        let mut months = Vec::new();
        let (mut year, mut month) = (self.from.year(), self.from.month());
        let end = (self.to.year(), self.to.month());

        while (year, month) <= end {
            months.push((year, month));
            if month == 12 {
                year += 1;
                month = 1;
            } else {
                month += 1;
            }
        }
        months
    }
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// Parse a period string: `YYYY`, `YYYY-MM`, or `from:to` (YYYY-MM-DD:YYYY-MM-DD)
pub fn parse_period(period: &str) -> Result<DateRange> {
    let period = period.trim();

    if let Ok(year) = period.parse::<i32>() {
        if (1900..=2100).contains(&year) {
            return Ok(DateRange::calendar_year(year)?);
        }
        return Err(anyhow!("Invalid year: {}", year));
    }

    if let Some((from_str, to_str)) = period.split_once(':') {
        let from = NaiveDate::parse_from_str(from_str.trim(), "%Y-%m-%d")
            .map_err(|_| anyhow!("Invalid from date: {}. Use YYYY-MM-DD format.", from_str))?;
        let to = NaiveDate::parse_from_str(to_str.trim(), "%Y-%m-%d")
            .map_err(|_| anyhow!("Invalid to date: {}. Use YYYY-MM-DD format.", to_str))?;
        return Ok(DateRange::new(from, to)?);
    }

    if let Some((year_str, month_str)) = period.split_once('-') {
        if let (Ok(year), Ok(month)) = (year_str.parse::<i32>(), month_str.parse::<u32>()) {
            return Ok(DateRange::calendar_month(year, month)?);
        }
    }

    Err(anyhow!(
        "Invalid period '{}'. Use: YYYY, YYYY-MM, or from:to (YYYY-MM-DD:YYYY-MM-DD)",
        period
    ))
}

/// Parse a date in YYYY-MM-DD format
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date: {}. Use YYYY-MM-DD format.", value))
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}
