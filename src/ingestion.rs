use crate::error::Result;
use crate::schema::RawMonthlyRow;
use log::debug;
use serde::Deserialize;
use std::io::Read;

#[derive(Deserialize)]
#[serde(untagged)]
enum RowsPayload {
    Rows(Vec<RawMonthlyRow>),
    Envelope { data: Vec<RawMonthlyRow> },
}

impl RowsPayload {
    fn into_rows(self) -> Vec<RawMonthlyRow> {
        match self {
            RowsPayload::Rows(rows) | RowsPayload::Envelope { data: rows } => rows,
        }
    }
}

/// Decodes the registrations endpoint response: either a bare JSON array of
/// rows or an object with the rows under `data`.
pub fn rows_from_json(json: &str) -> Result<Vec<RawMonthlyRow>> {
    let rows = serde_json::from_str::<RowsPayload>(json)?.into_rows();
    debug!("Decoded {} monthly rows", rows.len());
    Ok(rows)
}

pub fn rows_from_reader<R: Read>(reader: R) -> Result<Vec<RawMonthlyRow>> {
    let rows = serde_json::from_reader::<_, RowsPayload>(reader)?.into_rows();
    debug!("Decoded {} monthly rows", rows.len());
    Ok(rows)
}

pub fn row_schema_as_json() -> std::result::Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&schemars::schema_for!(RawMonthlyRow))
}
