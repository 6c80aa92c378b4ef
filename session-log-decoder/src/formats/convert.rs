//! Container conversion to tab-delimited text
//!
//! Session exports arrive as plain text, CSV or JSON. Before scanning, every
//! input is rendered as tab-delimited text with the same rows and columns.
//! Files that are not tabular containers are copied as text.

use super::csv::{escape_field, split_record};
use crate::types::{DecoderError, Result};
use serde_json::{Map, Value};
use std::path::Path;

/// Input container kinds, detected from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    Csv,
    Json,
    Spreadsheet,
    Text,
}

impl ContainerFormat {
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        match extension.as_deref() {
            Some("csv") => ContainerFormat::Csv,
            Some("json") => ContainerFormat::Json,
            Some("xlsx") | Some("xls") => ContainerFormat::Spreadsheet,
            _ => ContainerFormat::Text,
        }
    }
}

/// Read a file and render it as tab-delimited text
pub fn convert_file(path: &Path) -> Result<String> {
    let format = ContainerFormat::from_path(path);
    log::debug!("Converting {:?} as {:?}", path, format);

    match format {
        ContainerFormat::Csv => Ok(csv_to_tab_delimited(&read_text(path)?)),
        ContainerFormat::Json => json_to_tab_delimited(&read_text(path)?),
        ContainerFormat::Spreadsheet => Err(DecoderError::UnsupportedFormat(format!(
            "{:?}: spreadsheet workbooks cannot be read; export the sheet as CSV or text",
            path
        ))),
        ContainerFormat::Text => read_text(path),
    }
}

/// Read a file as text, dropping invalid UTF-8 sequences
fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("{:?} is not valid UTF-8; dropping undecodable bytes", path);
            String::from_utf8_lossy(e.as_bytes()).replace('\u{FFFD}', "")
        }
    })
}

fn join_row<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f.as_ref(), '\t'))
        .collect::<Vec<_>>()
        .join("\t")
}

/// Re-delimit comma-separated text with tabs
pub fn csv_to_tab_delimited(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        out.push_str(&join_row(&split_record(line, ',')));
        out.push('\n');
    }
    out
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}

fn push_unique(keys: &mut Vec<String>, key: &str) {
    if !keys.iter().any(|k| k == key) {
        keys.push(key.to_string());
    }
}

/// Render a JSON table as tab-delimited text
///
/// Accepted shapes: an array of records (`[{"col": v}, ...]`), an array of
/// arrays, or an object of columns whose values are either arrays or objects
/// keyed by row index.
pub fn json_to_tab_delimited(text: &str) -> Result<String> {
    let value: Value = serde_json::from_str(text)?;

    let (header, rows) = match &value {
        Value::Array(items) => array_table(items)?,
        Value::Object(columns) => column_table(columns)?,
        _ => {
            return Err(DecoderError::ConversionError(
                "JSON document is not a table".to_string(),
            ))
        }
    };

    let mut out = join_row(&header);
    out.push('\n');
    for row in rows {
        out.push_str(&join_row(&row));
        out.push('\n');
    }
    Ok(out)
}

type RenderedTable = (Vec<String>, Vec<Vec<String>>);

fn array_table(items: &[Value]) -> Result<RenderedTable> {
    if items.iter().all(Value::is_object) {
        let mut header = Vec::new();
        for item in items.iter().filter_map(Value::as_object) {
            for key in item.keys() {
                push_unique(&mut header, key);
            }
        }
        let rows = items
            .iter()
            .filter_map(Value::as_object)
            .map(|record| {
                header
                    .iter()
                    .map(|key| record.get(key).map(render_value).unwrap_or_default())
                    .collect()
            })
            .collect();
        return Ok((header, rows));
    }

    if items.iter().all(Value::is_array) {
        let width = items
            .iter()
            .filter_map(Value::as_array)
            .map(Vec::len)
            .max()
            .unwrap_or(0);
        let header = (0..width).map(|i| i.to_string()).collect();
        let rows = items
            .iter()
            .filter_map(Value::as_array)
            .map(|row| {
                (0..width)
                    .map(|i| row.get(i).map(render_value).unwrap_or_default())
                    .collect()
            })
            .collect();
        return Ok((header, rows));
    }

    Err(DecoderError::ConversionError(
        "JSON array mixes records and scalars".to_string(),
    ))
}

fn column_table(columns: &Map<String, Value>) -> Result<RenderedTable> {
    let header: Vec<String> = columns.keys().cloned().collect();

    // Row labels in first-seen order across all columns
    let mut index: Vec<String> = Vec::new();
    for column in columns.values() {
        match column {
            Value::Object(cells) => {
                for key in cells.keys() {
                    push_unique(&mut index, key);
                }
            }
            Value::Array(cells) => {
                for i in 0..cells.len() {
                    push_unique(&mut index, &i.to_string());
                }
            }
            _ => {
                return Err(DecoderError::ConversionError(
                    "JSON object columns must be arrays or objects".to_string(),
                ))
            }
        }
    }

    let rows = index
        .iter()
        .map(|label| {
            columns
                .values()
                .map(|column| {
                    let cell = match column {
                        Value::Object(cells) => cells.get(label),
                        Value::Array(cells) => {
                            label.parse::<usize>().ok().and_then(|i| cells.get(i))
                        }
                        _ => None,
                    };
                    cell.map(render_value).unwrap_or_default()
                })
                .collect()
        })
        .collect();

    Ok((header, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_format_detection() {
        assert_eq!(ContainerFormat::from_path(Path::new("a.CSV")), ContainerFormat::Csv);
        assert_eq!(ContainerFormat::from_path(Path::new("a.json")), ContainerFormat::Json);
        assert_eq!(ContainerFormat::from_path(Path::new("a.xlsx")), ContainerFormat::Spreadsheet);
        assert_eq!(ContainerFormat::from_path(Path::new("a")), ContainerFormat::Text);
        assert_eq!(ContainerFormat::from_path(Path::new("a.txt")), ContainerFormat::Text);
    }

    #[test]
    fn test_csv_to_tabs() {
        let text = "C:,,\n0:,6000.0100,\"3000.0600\"\n";
        assert_eq!(csv_to_tab_delimited(text), "C:\t\t\n0:\t6000.0100\t3000.0600\n");
    }

    #[test]
    fn test_json_records() {
        let text = r#"[{"a": "C:", "b": null}, {"a": "0:", "b": "6000.0100", "c": true}]"#;
        let converted = json_to_tab_delimited(text).unwrap();
        assert_eq!(converted, "a\tb\tc\nC:\t\t\n0:\t6000.0100\tTrue\n");
    }

    #[test]
    fn test_json_columns() {
        let text = r#"{"x": {"0": "C:", "1": "0:"}, "y": [null, "12.0100"]}"#;
        let converted = json_to_tab_delimited(text).unwrap();
        assert_eq!(converted, "x\ty\nC:\t\n0:\t12.0100\n");
    }

    #[test]
    fn test_json_rejects_scalars() {
        assert!(json_to_tab_delimited("42").is_err());
        assert!(json_to_tab_delimited("[1, {\"a\": 2}]").is_err());
        assert!(json_to_tab_delimited("{not json").is_err());
    }

    #[test]
    fn test_convert_text_file_copies() {
        let mut file = Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"C:\n 0: 6000.0100\xff\n").unwrap();

        let converted = convert_file(file.path()).unwrap();
        assert_eq!(converted, "C:\n 0: 6000.0100\n");
    }

    #[test]
    fn test_spreadsheet_is_unsupported() {
        let file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        assert!(matches!(
            convert_file(file.path()),
            Err(DecoderError::UnsupportedFormat(_))
        ));
    }
}
