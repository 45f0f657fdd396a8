use crate::schema::{
    BdAggregate, EntityBreakdown, MonthlySummary, MonthlyValue, RawMonthlyRow, SummaryMap,
};
use crate::summary::parse_summary;
use crate::utils::YearMonth;
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};

/// Groups raw monthly rows per BD and aligns them to a fixed set of month labels.
pub struct BdGrouper<'a> {
    labels: &'a [String],
    /// Year-month of every label, when all of them parse.
    label_keys: Option<Vec<YearMonth>>,
}

// Internal struct holding one parsed row before it is assigned a label
struct ParsedMonth {
    key: Option<YearMonth>,
    registrations: u64,
    value: f64,
    verticals: SummaryMap,
    clients: SummaryMap,
}

impl ParsedMonth {
    fn from_row(row: &RawMonthlyRow) -> Self {
        Self {
            key: row.month.as_deref().and_then(YearMonth::parse_key),
            registrations: row.total_registrations,
            value: row.total_regis_value,
            verticals: parse_summary(row.vertical_summary.as_deref()),
            clients: parse_summary(row.client_summary.as_deref()),
        }
    }

    fn into_summary(self, label: &str) -> MonthlySummary {
        MonthlySummary {
            month: label.to_string(),
            registrations: self.registrations,
            value: self.value,
            verticals: self.verticals,
            clients: self.clients,
        }
    }
}

struct BdGroup<'r> {
    bd_name: &'r str,
    total_registrations: u64,
    total_regis_value: f64,
    /// Oldest first, in arrival order.
    months: Vec<ParsedMonth>,
}

impl<'a> BdGrouper<'a> {
    /// `labels` must be ordered latest first.
    pub fn new(labels: &'a [String]) -> Self {
        let label_keys = labels
            .iter()
            .map(|label| YearMonth::parse_label(label).ok())
            .collect::<Option<Vec<_>>>();

        Self { labels, label_keys }
    }

    pub fn group(&self, rows: &[RawMonthlyRow]) -> Vec<BdAggregate> {
        let groups = group_rows(rows);
        debug!(
            "Grouped {} rows into {} BDs against {} month labels",
            rows.len(),
            groups.len(),
            self.labels.len()
        );

        groups
            .into_iter()
            .map(|group| self.build_aggregate(group))
            .collect()
    }

    fn build_aggregate(&self, group: BdGroup<'_>) -> BdAggregate {
        let monthly_summary = self.align(group.bd_name, group.months);

        let detailed_vertical_summary = detailed_breakdown(&monthly_summary, |m| &m.verticals);
        let detailed_client_summary = detailed_breakdown(&monthly_summary, |m| &m.clients);

        // Raw per-month unique counts are ignored; these span every aligned month.
        let unique_verticals = detailed_vertical_summary.len();
        let unique_clients = detailed_client_summary.len();

        BdAggregate {
            bd_name: group.bd_name.to_string(),
            total_registrations: group.total_registrations,
            total_regis_value: group.total_regis_value,
            monthly_summary,
            detailed_vertical_summary,
            detailed_client_summary,
            unique_verticals,
            unique_clients,
        }
    }

    /// Assigns labels to a BD's months, latest first.
    ///
    /// Months are matched to labels by year-month when every row carries a month
    /// key and every label parses; otherwise the oldest-first rows are reversed
    /// and paired with the labels by position. Labels without data are skipped
    /// and data without a label is left out.
    fn align(&self, bd_name: &str, months: Vec<ParsedMonth>) -> Vec<MonthlySummary> {
        match &self.label_keys {
            Some(keys) if months.iter().all(|m| m.key.is_some()) => {
                self.align_by_key(bd_name, keys, months)
            }
            _ => self.align_by_position(bd_name, months),
        }
    }

    fn align_by_key(
        &self,
        bd_name: &str,
        keys: &[YearMonth],
        months: Vec<ParsedMonth>,
    ) -> Vec<MonthlySummary> {
        let mut by_key: HashMap<YearMonth, ParsedMonth> = HashMap::with_capacity(months.len());
        for month in months {
            let Some(key) = month.key else { continue };
            if by_key.insert(key, month).is_some() {
                warn!(
                    "BD '{}' has more than one row for {}, keeping the last one",
                    bd_name, key
                );
            }
        }

        let aligned: Vec<MonthlySummary> = self
            .labels
            .iter()
            .zip(keys)
            .filter_map(|(label, key)| by_key.remove(key).map(|m| m.into_summary(label)))
            .collect();

        if !by_key.is_empty() {
            debug!(
                "BD '{}': {} month(s) outside the selected labels were not aligned",
                bd_name,
                by_key.len()
            );
        }

        aligned
    }

    fn align_by_position(&self, bd_name: &str, months: Vec<ParsedMonth>) -> Vec<MonthlySummary> {
        if months.len() > self.labels.len() {
            debug!(
                "BD '{}' has {} months for {} labels, truncating to the most recent",
                bd_name,
                months.len(),
                self.labels.len()
            );
        }

        months
            .into_iter()
            .rev()
            .zip(self.labels)
            .map(|(month, label)| month.into_summary(label))
            .collect()
    }
}

fn group_rows(rows: &[RawMonthlyRow]) -> Vec<BdGroup<'_>> {
    let mut groups: Vec<BdGroup<'_>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        let slot = *index.entry(row.bd_name.as_str()).or_insert_with(|| {
            groups.push(BdGroup {
                bd_name: row.bd_name.as_str(),
                total_registrations: 0,
                total_regis_value: 0.0,
                months: Vec::new(),
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.total_registrations += row.total_registrations;
        group.total_regis_value += row.total_regis_value;
        group.months.push(ParsedMonth::from_row(row));
    }

    groups
}

/// One entry per entity seen in any month, sorted by name, with a value for
/// every month of `monthly` (zero where the entity is absent).
fn detailed_breakdown<F>(monthly: &[MonthlySummary], entities_of: F) -> Vec<EntityBreakdown>
where
    F: Fn(&MonthlySummary) -> &SummaryMap,
{
    let names: BTreeSet<&str> = monthly
        .iter()
        .flat_map(|m| entities_of(m).keys().map(String::as_str))
        .collect();

    names
        .into_iter()
        .map(|name| EntityBreakdown {
            name: name.to_string(),
            monthly_values: monthly
                .iter()
                .map(|m| {
                    let contribution = entities_of(m).get(name).copied().unwrap_or_default();
                    MonthlyValue {
                        month: m.month.clone(),
                        count: contribution.count,
                        value: contribution.value,
                    }
                })
                .collect(),
        })
        .collect()
}

/// Groups `rows` by BD and aligns each BD's months to `labels` (latest first).
pub fn group_and_map(rows: &[RawMonthlyRow], labels: &[String]) -> Vec<BdAggregate> {
    BdGrouper::new(labels).group(rows)
}
