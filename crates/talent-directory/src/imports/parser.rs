use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("file is empty")]
    Empty,
    #[error("file has no header row")]
    MissingHeader,
    #[error("unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: u64 },
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// One data row keyed by the header names of its file.
///
/// Values are kept exactly as written (quotes removed, whitespace preserved);
/// importers trim when they read a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    number: usize,
    line: u64,
    headers: Arc<[String]>,
    values: Vec<String>,
}

impl CsvRow {
    /// 1-based position among data rows; the header is not counted.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Line the CSV reader reported for the start of the row, header included.
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// `None` when the file has no such column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|header| header == column)
            .map(|index| self.values[index].as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}

impl Serialize for CsvRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Header names plus the first rows of a file, for showing an upload before it
/// is imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvPreview {
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
}

/// Parses CSV text into rows. The first non-blank line is the header; its width
/// fixes the width of every row (short rows are padded with empty strings, extra
/// trailing fields are dropped).
pub fn parse_rows(text: &str) -> Result<Vec<CsvRow>, ParseError> {
    parse_limited(text, None).map(|(_, rows)| rows)
}

/// Same as [`parse_rows`] but stops after `limit` data rows. The header is
/// returned even when the file has no data rows.
pub fn preview(text: &str, limit: usize) -> Result<CsvPreview, ParseError> {
    let (headers, rows) = parse_limited(text, Some(limit))?;
    Ok(CsvPreview {
        headers: headers.to_vec(),
        rows,
    })
}

fn parse_limited(
    text: &str,
    limit: Option<usize>,
) -> Result<(Arc<[String]>, Vec<CsvRow>), ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    if let Some(line) = unterminated_quote_line(text) {
        return Err(ParseError::UnterminatedQuote { line });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut headers: Option<Arc<[String]>> = None;
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        if is_blank(&record, text) {
            continue;
        }

        let Some(columns) = headers.clone() else {
            let parsed: Vec<String> = record.iter().map(|name| name.trim().to_string()).collect();
            if parsed.iter().all(String::is_empty) {
                return Err(ParseError::MissingHeader);
            }
            headers = Some(parsed.into());
            continue;
        };
        if limit.is_some_and(|limit| rows.len() >= limit) {
            break;
        }

        let mut values: Vec<String> = record
            .iter()
            .take(columns.len())
            .map(str::to_string)
            .collect();
        values.resize(columns.len(), String::new());

        rows.push(CsvRow {
            number: rows.len() + 1,
            line: record.position().map_or(0, csv::Position::line),
            headers: columns,
            values,
        });
    }

    let headers = headers.ok_or(ParseError::MissingHeader)?;
    Ok((headers, rows))
}

/// A lone whitespace field is a blank line, unless the source line quotes it
/// (`""` is how a single empty value is written).
fn is_blank(record: &csv::StringRecord, text: &str) -> bool {
    if record.len() > 1 || !record.iter().all(|field| field.trim().is_empty()) {
        return false;
    }
    let start = record
        .position()
        .and_then(|position| usize::try_from(position.byte()).ok())
        .unwrap_or(0);
    let source = text
        .get(start..)
        .unwrap_or_default()
        .lines()
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    !source.contains('"')
}

/// Returns the line on which a quoted field opens without ever closing.
fn unterminated_quote_line(text: &str) -> Option<u64> {
    let mut line = 1;
    let mut opened_on = 0;
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                }
                '"' => in_quotes = false,
                '\n' => line += 1,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if at_field_start => {
                in_quotes = true;
                opened_on = line;
                at_field_start = false;
            }
            ',' | '\r' => at_field_start = true,
            '\n' => {
                line += 1;
                at_field_start = true;
            }
            _ => at_field_start = false,
        }
    }

    in_quotes.then_some(opened_on)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_commas_and_escaped_quotes() {
        let rows = parse_rows("full_name,note\n\"Doe, Jane\",\"She said \"\"hi\"\"\"\n")
            .expect("parse");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("full_name"), Some("Doe, Jane"));
        assert_eq!(rows[0].get("note"), Some("She said \"hi\""));
    }

    #[test]
    fn handles_crlf_and_skips_blank_lines() {
        let text = "\r\n  \r\nname,email\r\n\r\nAda,ada@example.com\r\n   \r\nGrace,grace@example.com\r\n";
        let rows = parse_rows(text).expect("parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("email"), Some("ada@example.com"));
        assert_eq!(rows[1].get("name"), Some("Grace"));
        assert_eq!(rows[1].number(), 2);
    }

    #[test]
    fn quoted_empty_value_is_a_row() {
        let rows = parse_rows("note\n\"\"\nx\n").expect("parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("note"), Some(""));
        assert_eq!(rows[1].get("note"), Some("x"));
    }

    #[test]
    fn preview_of_zero_rows_keeps_the_header() {
        let preview = preview("full_name,email\nAda,ada@example.com\n", 0).expect("preview");
        assert_eq!(preview.headers, ["full_name", "email"]);
        assert!(preview.rows.is_empty());
    }

    #[test]
    fn pads_missing_trailing_fields_and_drops_extras() {
        let rows = parse_rows("a,b,c\n1\n1,2,3,4\n").expect("parse");
        assert_eq!(rows[0].get("b"), Some(""));
        assert_eq!(rows[0].get("c"), Some(""));
        assert_eq!(rows[1].iter().count(), 3);
        assert_eq!(rows[1].get("c"), Some("3"));
    }

    #[test]
    fn trims_header_names_but_not_values() {
        let rows = parse_rows(" full_name , email \n  Ada  ,ada@example.com\n").expect("parse");
        assert_eq!(rows[0].headers(), ["full_name", "email"]);
        assert_eq!(rows[0].get("full_name"), Some("  Ada  "));
    }

    #[test]
    fn strips_byte_order_mark() {
        let rows = parse_rows("\u{feff}email\nada@example.com\n").expect("parse");
        assert_eq!(rows[0].get("email"), Some("ada@example.com"));
    }

    #[test]
    fn reports_physical_line_numbers() {
        let rows = parse_rows("name\nAda\n\"Grace\nHopper\"\nLin\n").expect("parse");
        assert_eq!(rows[0].line(), 2);
        assert_eq!(rows[1].line(), 3);
        assert_eq!(rows[1].get("name"), Some("Grace\nHopper"));
        assert_eq!(rows[2].line(), 5);
    }

    #[test]
    fn empty_text_is_rejected() {
        assert!(matches!(parse_rows(""), Err(ParseError::Empty)));
        assert!(matches!(parse_rows(" \n\r\n "), Err(ParseError::Empty)));
    }

    #[test]
    fn header_without_names_is_rejected() {
        assert!(matches!(parse_rows(",,\n1,2,3\n"), Err(ParseError::MissingHeader)));
    }

    #[test]
    fn unterminated_quote_reports_opening_line() {
        match parse_rows("name,note\nAda,fine\nGrace,\"never closed\nLin,x\n") {
            Err(ParseError::UnterminatedQuote { line }) => assert_eq!(line, 3),
            other => panic!("expected unterminated quote, got {other:?}"),
        }
    }

    #[test]
    fn quotes_inside_unquoted_fields_are_literal() {
        let rows = parse_rows("note\n5\" display\n").expect("parse");
        assert_eq!(rows[0].get("note"), Some("5\" display"));
    }

    #[test]
    fn header_only_file_has_no_rows() {
        assert!(parse_rows("full_name,email\n").expect("parse").is_empty());
    }

    #[test]
    fn preview_stops_at_limit() {
        let preview = preview("n\n1\n2\n3\n4\n", 2).expect("preview");
        assert_eq!(preview.rows.len(), 2);
        assert_eq!(preview.rows[1].get("n"), Some("2"));

        let empty = super::preview("a,b\n", 5).expect("header only");
        assert_eq!(empty.headers, ["a", "b"]);
        assert!(empty.rows.is_empty());
    }

    #[test]
    fn rows_serialize_as_ordered_objects() {
        let rows = parse_rows("b,a\n2,1\n").expect("parse");
        let json = serde_json::to_string(&rows[0]).expect("serialize");
        assert_eq!(json, r#"{"b":"2","a":"1"}"#);
    }
}
