use crate::schema::{BdAggregate, BdFilter, BdFilterMode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

impl BdFilter {
    pub fn include<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: BdFilterMode::Include,
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn exclude<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: BdFilterMode::Exclude,
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, bd_name: &str) -> bool {
        match self.mode {
            BdFilterMode::All => true,
            BdFilterMode::Include => self.names.iter().any(|n| n == bd_name),
            BdFilterMode::Exclude => !self.names.iter().any(|n| n == bd_name),
        }
    }

    /// Keeps the aggregates selected by this filter, preserving their order.
    pub fn apply(&self, aggregates: Vec<BdAggregate>) -> Vec<BdAggregate> {
        if self.mode == BdFilterMode::All {
            return aggregates;
        }
        let names: HashSet<&str> = self.names.iter().map(String::as_str).collect();
        let include = self.mode == BdFilterMode::Include;

        aggregates
            .into_iter()
            .filter(|bd| names.contains(bd.bd_name.as_str()) == include)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotal {
    pub month: String,
    pub registrations: u64,
    pub value: f64,
}

/// Roll-up across every BD shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    pub total_registrations: u64,
    pub total_regis_value: f64,
    /// One entry per label, in label order; zero where no BD has data.
    pub monthly: Vec<MonthlyTotal>,
}

impl ReportTotals {
    pub fn from_aggregates(aggregates: &[BdAggregate], labels: &[String]) -> Self {
        let mut monthly: Vec<MonthlyTotal> = labels
            .iter()
            .map(|label| MonthlyTotal {
                month: label.clone(),
                registrations: 0,
                value: 0.0,
            })
            .collect();

        for bd in aggregates {
            for summary in &bd.monthly_summary {
                if let Some(total) = monthly.iter_mut().find(|t| t.month == summary.month) {
                    total.registrations += summary.registrations;
                    total.value += summary.value;
                }
            }
        }

        Self {
            total_registrations: aggregates.iter().map(|bd| bd.total_registrations).sum(),
            total_regis_value: aggregates.iter().map(|bd| bd.total_regis_value).sum(),
            monthly,
        }
    }
}
