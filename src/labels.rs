use crate::range::parse_months_back;
use crate::schema::TimeRangeSelection;
use crate::utils::YearMonth;
use chrono::NaiveDate;
use log::debug;

/// Month column labels for a selection, most recent first.
///
/// - `relative` with `N`: `N + 1` labels such as `"Oct 2025"`, starting at the
///   month of `today` and walking backwards.
/// - `month`: the selected value, verbatim.
/// - anything else, or a relative value that is not a month count: no labels.
pub fn generate_labels(selection: &TimeRangeSelection, today: NaiveDate) -> Vec<String> {
    match selection.mode.as_str() {
        "month" => vec![selection.value.clone()],
        "relative" => match parse_months_back(&selection.value) {
            Ok(months_back) => trailing_months(today, months_back as usize + 1)
                .into_iter()
                .map(YearMonth::label)
                .collect(),
            Err(e) => {
                debug!("No labels generated: {}", e);
                Vec::new()
            }
        },
        other => {
            debug!("No labels generated for unsupported mode '{}'", other);
            Vec::new()
        }
    }
}

/// The `count` months ending with the month of `today`, latest first.
pub fn trailing_months(today: NaiveDate, count: usize) -> Vec<YearMonth> {
    let current = YearMonth::from_date(today);
    (0..count as i32).map(|offset| current.shift(-offset)).collect()
}

/// Choices for the single-month picker: the current month and the `count - 1`
/// months before it, as labels.
pub fn month_options(today: NaiveDate, count: usize) -> Vec<String> {
    trailing_months(today, count)
        .into_iter()
        .map(YearMonth::label)
        .collect()
}
