use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One row of the per-BD monthly aggregation query.
///
/// Rows for a single BD are expected oldest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawMonthlyRow {
    #[schemars(description = "Business developer the row is aggregated for")]
    pub bd_name: String,

    #[schemars(
        description = "Optional month key for the row ('YYYY-MM', 'YYYY-MM-DD', ISO timestamp or 'Oct 2025'). Enables key-based alignment against the month labels."
    )]
    #[serde(default)]
    pub month: Option<String>,

    #[serde(default, deserialize_with = "lenient_u64")]
    #[schemars(with = "u64", description = "Registrations confirmed in the month")]
    pub total_registrations: u64,

    #[serde(default, deserialize_with = "lenient_f64")]
    #[schemars(with = "f64", description = "Monetary value of the month's registrations")]
    pub total_regis_value: f64,

    #[serde(default)]
    #[schemars(description = "Packed 'Name: <n> regs / <value>' pairs per vertical")]
    pub vertical_summary: Option<String>,

    #[serde(default)]
    #[schemars(description = "Packed 'Name: <n> regs / <value>' pairs per client")]
    pub client_summary: Option<String>,

    /// Per-month distinct count from the query. Not used: unique counts are
    /// recomputed across months from the packed summaries.
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    #[schemars(with = "Option<u64>")]
    pub unique_verticals: Option<u64>,

    /// See `unique_verticals`.
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    #[schemars(with = "Option<u64>")]
    pub unique_clients: Option<u64>,
}

impl RawMonthlyRow {
    pub fn new(
        bd_name: impl Into<String>,
        total_registrations: u64,
        total_regis_value: f64,
    ) -> Self {
        Self {
            bd_name: bd_name.into(),
            month: None,
            total_registrations,
            total_regis_value,
            vertical_summary: None,
            client_summary: None,
            unique_verticals: None,
            unique_clients: None,
        }
    }

    pub fn with_month(mut self, month: impl Into<String>) -> Self {
        self.month = Some(month.into());
        self
    }

    pub fn with_verticals(mut self, summary: impl Into<String>) -> Self {
        self.vertical_summary = Some(summary.into());
        self
    }

    pub fn with_clients(mut self, summary: impl Into<String>) -> Self {
        self.client_summary = Some(summary.into());
        self
    }
}

/// The user's time-range selector, as sent by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TimeRangeSelection {
    #[schemars(description = "'relative' (last N months plus the current one) or 'month' (one calendar month)")]
    pub mode: String,

    #[schemars(
        description = "For 'relative': number of full months before the current one, e.g. '2'. For 'month': the month label, e.g. 'Oct 2025'."
    )]
    pub value: String,
}

impl TimeRangeSelection {
    pub fn relative(months_back: u32) -> Self {
        Self {
            mode: "relative".to_string(),
            value: months_back.to_string(),
        }
    }

    pub fn month(label: impl Into<String>) -> Self {
        Self {
            mode: "month".to_string(),
            value: label.into(),
        }
    }
}

impl Default for TimeRangeSelection {
    fn default() -> Self {
        Self::relative(0)
    }
}

/// Parsed count/value for one entity inside a packed summary string.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityContribution {
    pub count: u64,
    pub value: f64,
}

/// Entity name to its contribution, as parsed from one packed summary.
pub type SummaryMap = BTreeMap<String, EntityContribution>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub month: String,
    pub registrations: u64,
    pub value: f64,
    pub verticals: SummaryMap,
    pub clients: SummaryMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyValue {
    pub month: String,
    pub count: u64,
    pub value: f64,
}

/// One entity's values across every aligned month of a BD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityBreakdown {
    pub name: String,
    pub monthly_values: Vec<MonthlyValue>,
}

impl EntityBreakdown {
    pub fn total_count(&self) -> u64 {
        self.monthly_values.iter().map(|m| m.count).sum()
    }

    pub fn total_value(&self) -> f64 {
        self.monthly_values.iter().map(|m| m.value).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BdAggregate {
    pub bd_name: String,
    pub total_registrations: u64,
    pub total_regis_value: f64,
    /// Latest month first, one entry per label that has data.
    pub monthly_summary: Vec<MonthlySummary>,
    pub detailed_vertical_summary: Vec<EntityBreakdown>,
    pub detailed_client_summary: Vec<EntityBreakdown>,
    pub unique_verticals: usize,
    pub unique_clients: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum BdFilterMode {
    #[default]
    All,
    Include,
    Exclude,
}

/// Selection of BDs shown on the dashboard, applied to the aggregated output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct BdFilter {
    #[serde(default)]
    pub mode: BdFilterMode,

    #[serde(default)]
    #[schemars(description = "BD names the mode applies to. Ignored for 'all'.")]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    #[serde(default)]
    pub time_range: TimeRangeSelection,

    #[serde(default)]
    pub bd_filter: BdFilter,
}

impl ReportConfig {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReportConfig)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Unsigned(u64),
    Float(f64),
    Text(String),
}

impl NumberOrText {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            NumberOrText::Unsigned(n) => Ok(n as f64),
            NumberOrText::Float(f) => Ok(f),
            NumberOrText::Text(s) if s.trim().is_empty() => Ok(0.0),
            NumberOrText::Text(s) => s
                .trim()
                .replace(',', "")
                .parse::<f64>()
                .map_err(|_| E::custom(format!("expected a number, got '{}'", s))),
        }
    }

    fn into_u64<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            NumberOrText::Unsigned(n) => Ok(n),
            NumberOrText::Float(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
            NumberOrText::Float(f) => Err(E::custom(format!(
                "expected a non-negative integer, got {}",
                f
            ))),
            NumberOrText::Text(s) if s.trim().is_empty() => Ok(0),
            NumberOrText::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| E::custom(format!("expected a non-negative integer, got '{}'", s))),
        }
    }
}

// Postgres bigint/numeric columns commonly reach us as JSON strings.
fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    NumberOrText::deserialize(deserializer)?.into_u64()
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    NumberOrText::deserialize(deserializer)?.into_f64()
}

fn lenient_opt_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Option::<NumberOrText>::deserialize(deserializer)?
        .map(NumberOrText::into_u64)
        .transpose()
}
