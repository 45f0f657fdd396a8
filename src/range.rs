use crate::error::{ReportError, Result};
use crate::schema::TimeRangeSelection;
use crate::utils::{end_of_day, months_between, start_of_day, YearMonth};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use log::debug;
use serde::{Deserialize, Serialize, Serializer};

/// Upper bound on "last N months", one century.
pub const MAX_RELATIVE_MONTHS: u32 = 1200;

/// Source of "now" for label and range computation.
pub trait Clock {
    type Tz: TimeZone;

    fn now(&self) -> DateTime<Self::Tz>;
}

/// Wall clock in the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Tz = Local;

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone)]
pub struct FixedClock<Tz: TimeZone>(pub DateTime<Tz>);

impl<Tz: TimeZone> Clock for FixedClock<Tz> {
    type Tz = Tz;

    fn now(&self) -> DateTime<Tz> {
        self.0.clone()
    }
}

/// A validated time-range selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    /// The current month plus `months_back` full months before it.
    Relative { months_back: u32 },
    /// A single calendar month.
    Month(YearMonth),
}

impl TimeRange {
    pub fn parse(selection: &TimeRangeSelection) -> Result<Self> {
        match selection.mode.as_str() {
            "relative" => Ok(TimeRange::Relative {
                months_back: parse_months_back(&selection.value)?,
            }),
            "month" => Ok(TimeRange::Month(YearMonth::parse_label(&selection.value)?)),
            other => Err(ReportError::InvalidTimeRangeMode(other.to_string())),
        }
    }

    /// Number of calendar months the range spans.
    pub fn month_count(&self) -> usize {
        match self {
            TimeRange::Relative { months_back } => *months_back as usize + 1,
            TimeRange::Month(_) => 1,
        }
    }
}

pub(crate) fn parse_months_back(value: &str) -> Result<u32> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|&n| n <= MAX_RELATIVE_MONTHS)
        .ok_or_else(|| ReportError::InvalidRelativeValue(value.to_string()))
}

/// Query window sent to the backend. Boundaries keep the offset they were
/// computed in and serialize as UTC ISO-8601 instants with milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(serialize_with = "serialize_iso_millis")]
    pub from_date: DateTime<FixedOffset>,
    #[serde(serialize_with = "serialize_iso_millis")]
    pub to_date: DateTime<FixedOffset>,
}

impl DateRange {
    pub fn from_iso(&self) -> String {
        to_iso_millis(&self.from_date)
    }

    pub fn to_iso(&self) -> String {
        to_iso_millis(&self.to_date)
    }

    /// Calendar months touched by the range, in the zone it was computed in.
    pub fn months_covered(&self) -> usize {
        let from = self.from_date.naive_local().date();
        let to = self.to_date.naive_local().date();
        (months_between(from, to) + 1).max(0) as usize
    }

    /// `fromDate`/`toDate` pairs for the registrations endpoint.
    pub fn query_params(&self) -> [(&'static str, String); 2] {
        [("fromDate", self.from_iso()), ("toDate", self.to_iso())]
    }
}

fn to_iso_millis(instant: &DateTime<FixedOffset>) -> String {
    instant
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_iso_millis<S: Serializer>(
    instant: &DateTime<FixedOffset>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_iso_millis(instant))
}

/// Computes the backend query window for a selection.
///
/// Relative ranges run from the first day of the month `N` months back up to
/// the end of today; a month selection covers exactly that calendar month.
/// Boundaries are wall-clock times in the time zone of `now`.
pub fn compute_range<Tz: TimeZone>(
    selection: &TimeRangeSelection,
    now: &DateTime<Tz>,
) -> Result<DateRange> {
    let range = TimeRange::parse(selection)?;
    let today = now.date_naive();

    let (from, to) = match range {
        TimeRange::Relative { months_back } => {
            let first_month = YearMonth::from_date(today).shift(-(months_back as i32));
            (start_of_day(first_month.first_day()?), end_of_day(today))
        }
        TimeRange::Month(month) => (
            start_of_day(month.first_day()?),
            end_of_day(month.last_day()?),
        ),
    };

    let tz = now.timezone();
    let date_range = DateRange {
        from_date: localize(&tz, from)?,
        to_date: localize(&tz, to)?,
    };

    debug!(
        "Computed range {:?} for {}={}: {} .. {}",
        range,
        selection.mode,
        selection.value,
        date_range.from_iso(),
        date_range.to_iso()
    );

    Ok(date_range)
}

fn localize<Tz: TimeZone>(tz: &Tz, wall_clock: NaiveDateTime) -> Result<DateTime<FixedOffset>> {
    tz.from_local_datetime(&wall_clock)
        .earliest()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| {
            ReportError::DateError(format!("{} does not exist in the local time zone", wall_clock))
        })
}
