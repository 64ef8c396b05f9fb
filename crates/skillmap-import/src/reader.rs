//! Roster file parsing.
//!
//! Header-mapped CSV deserialization in flexible mode: column order is free,
//! header spellings have aliases, and short records leave trailing fields
//! empty. A file that cannot be parsed at all is an infrastructure failure;
//! malformed values inside a parsed row are handled row-locally downstream.

use serde::Deserialize;
use tracing::debug;

use skillmap_core::{Error, Result};

/// One roster row as it appears in the source file. All fields arrive as
/// raw strings; interpretation happens in the sanitizer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportRow {
    #[serde(alias = "employee_ref", alias = "employee_id", alias = "ref")]
    pub external_ref: Option<String>,
    #[serde(alias = "full_name", alias = "name", alias = "employee_name")]
    pub full_name: Option<String>,
    #[serde(alias = "email", alias = "e_mail")]
    pub email: Option<String>,
    #[serde(alias = "hired_on", alias = "hire_date", alias = "start_date")]
    pub hired_on: Option<String>,
    #[serde(alias = "allocation", alias = "allocation_pct", alias = "fte")]
    pub allocation: Option<String>,
    #[serde(alias = "sub_unit", alias = "subunit", alias = "department")]
    pub sub_unit: Option<String>,
    #[serde(alias = "project")]
    pub project: Option<String>,
    #[serde(alias = "team")]
    pub team: Option<String>,
    #[serde(alias = "role", alias = "position")]
    pub role: Option<String>,
    #[serde(alias = "skills", alias = "skill_list")]
    pub skills: Option<String>,
}

/// Parse roster CSV content into rows, preserving file order.
///
/// Returns [`Error::Parse`] when the content is not valid CSV or a record
/// cannot be mapped onto [`ImportRow`] at all.
pub fn parse_roster(content: &str) -> Result<Vec<ImportRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: ImportRow =
            result.map_err(|e| Error::Parse(format!("roster file unreadable: {}", e)))?;
        rows.push(row);
    }
    debug!(rows = rows.len(), "roster parsed");
    Ok(rows)
}
