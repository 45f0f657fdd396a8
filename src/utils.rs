use crate::error::{ReportError, Result};
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

const SHORT_MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A calendar month, used as the alignment key between monthly rows and labels.
///
/// Ordering is chronological (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ReportError::DateError(format!(
                "Invalid month {}: must be between 1 and 12",
                month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn year(self) -> i32 {
        self.year
    }

    /// 1-based month (1 = January)
    pub fn month(self) -> u32 {
        self.month
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Moves the month by `delta` calendar months, rolling over year boundaries.
    pub fn shift(self, delta: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + delta;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn first_day(self) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).ok_or_else(|| {
            ReportError::DateError(format!("{}-{:02} is out of range", self.year, self.month))
        })
    }

    pub fn last_day(self) -> Result<NaiveDate> {
        last_day_of_month(self.year, self.month)
    }

    /// Display label in the `"Oct 2025"` form.
    pub fn label(self) -> String {
        format!("{} {}", SHORT_MONTH_NAMES[(self.month - 1) as usize], self.year)
    }

    /// Parses a `"<MonthName> <Year>"` label. Short and full month names are
    /// both accepted, case-insensitively.
    pub fn parse_label(label: &str) -> Result<Self> {
        let trimmed = label.trim();
        NaiveDate::parse_from_str(&format!("1 {}", trimmed), "%d %B %Y")
            .map(Self::from_date)
            .map_err(|_| ReportError::InvalidMonthLabel(label.to_string()))
    }

    /// Best-effort parse of a month key as emitted by the reporting query:
    /// `YYYY-MM`, `YYYY-MM-DD`, an ISO timestamp, or a display label.
    pub fn parse_key(key: &str) -> Option<Self> {
        let trimmed = key.trim();
        if let Some(prefix) = trimmed.get(..7) {
            let followed_by_digit = trimmed
                .as_bytes()
                .get(7)
                .is_some_and(|b| b.is_ascii_digit());
            if !followed_by_digit {
                if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", prefix), "%Y-%m-%d")
                {
                    return Some(Self::from_date(date));
                }
            }
        }
        Self::parse_label(trimmed).ok()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

pub fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .ok_or_else(|| ReportError::DateError(format!("No last day for {}-{:02}", year, month)))
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// 23:59:59.999 on the given day.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    let last_milli = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    date.and_time(last_milli)
}

/// Number of calendar months from `start` to `end` (0 when both are in the same month).
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}
