//! CSV export of flat record sets.
//!
//! Records go through serde first, so field order is the struct's declaration
//! order and the header is taken from the first record. Fields holding nested
//! objects or arrays are left out.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportDataset {
    Candidates,
    Cohorts,
    Exams,
    Surveys,
    Events,
    Certificates,
}

impl ExportDataset {
    pub const ALL: [ExportDataset; 6] = [
        ExportDataset::Candidates,
        ExportDataset::Cohorts,
        ExportDataset::Exams,
        ExportDataset::Surveys,
        ExportDataset::Events,
        ExportDataset::Certificates,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ExportDataset::Candidates => "candidates",
            ExportDataset::Cohorts => "cohorts",
            ExportDataset::Exams => "exams",
            ExportDataset::Surveys => "surveys",
            ExportDataset::Events => "events",
            ExportDataset::Certificates => "certificates",
        }
    }

    /// `{dataset}_{YYYY-MM-DD}.csv`
    pub fn filename(self, today: NaiveDate) -> String {
        format!("{}_{}.csv", self.as_str(), today.format("%Y-%m-%d"))
    }
}

impl fmt::Display for ExportDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown export dataset '{0}'")]
pub struct UnknownExportDataset(pub String);

impl FromStr for ExportDataset {
    type Err = UnknownExportDataset;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        ExportDataset::ALL
            .into_iter()
            .find(|dataset| dataset.as_str() == normalized)
            .ok_or_else(|| UnknownExportDataset(value.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("record could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("record {index} is not a flat object")]
    NotARecord { index: usize },
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush CSV output: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Export payload ready to be handed to a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvExport {
    pub csv: String,
    pub filename: String,
}

pub fn export<T: Serialize>(
    dataset: ExportDataset,
    records: &[T],
    today: NaiveDate,
) -> Result<CsvExport, ExportError> {
    let values = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CsvExport {
        csv: to_csv(&values)?,
        filename: dataset.filename(today),
    })
}

/// Renders records as CSV with `\n` line endings. An empty slice renders as
/// the empty string.
pub fn to_csv(records: &[Value]) -> Result<String, ExportError> {
    let Some(first) = records.first() else {
        return Ok(String::new());
    };
    let headers = flat_keys(as_object(first, 0)?);

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(&headers)?;

    for (index, record) in records.iter().enumerate() {
        let object = as_object(record, index)?;
        writer.write_record(headers.iter().map(|key| cell(object.get(*key))))?;
    }

    let bytes = writer.into_inner().map_err(|error| error.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn as_object(record: &Value, index: usize) -> Result<&Map<String, Value>, ExportError> {
    record.as_object().ok_or(ExportError::NotARecord { index })
}

fn flat_keys(object: &Map<String, Value>) -> Vec<&str> {
    object
        .iter()
        .filter(|(_, value)| !value.is_object() && !value.is_array())
        .map(|(key, _)| key.as_str())
        .collect()
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Number(number)) => number.to_string(),
        Some(nested) => nested.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid")
    }

    #[test]
    fn header_skips_nested_fields_and_keeps_order() {
        let records = vec![
            json!({"name": "Ada", "tags": ["a"], "score": 90, "meta": {"k": 1}, "active": false}),
            json!({"name": "Grace", "tags": [], "score": 0, "meta": null, "active": true}),
        ];
        let csv = to_csv(&records).expect("csv");
        assert_eq!(csv, "name,score,active\nAda,90,false\nGrace,0,true\n");
    }

    #[test]
    fn nulls_and_missing_keys_render_empty() {
        let records = vec![
            json!({"name": "Ada", "phone": null}),
            json!({"name": "Grace"}),
        ];
        assert_eq!(to_csv(&records).expect("csv"), "name,phone\nAda,\nGrace,\n");
    }

    #[test]
    fn values_with_commas_quotes_and_newlines_are_quoted() {
        let records = vec![json!({"note": "He said, \"hi\"", "bio": "line one\nline two"})];
        assert_eq!(
            to_csv(&records).expect("csv"),
            "note,bio\n\"He said, \"\"hi\"\"\",\"line one\nline two\"\n"
        );
    }

    #[test]
    fn empty_dataset_still_gets_a_filename() {
        let export = export::<Value>(ExportDataset::Cohorts, &[], today()).expect("export");
        assert_eq!(export.csv, "");
        assert_eq!(export.filename, "cohorts_2025-03-01.csv");
    }

    #[test]
    fn non_object_records_are_rejected() {
        let error = to_csv(&[json!({"a": 1}), json!(3)]).expect_err("scalar record");
        assert!(matches!(error, ExportError::NotARecord { index: 1 }));
    }

    #[test]
    fn datasets_parse_by_name() {
        assert_eq!("Exams".parse::<ExportDataset>(), Ok(ExportDataset::Exams));
        assert!("widgets".parse::<ExportDataset>().is_err());
    }
}
