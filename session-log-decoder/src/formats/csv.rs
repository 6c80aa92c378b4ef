//! CSV rendering and parsing of session tables
//!
//! Output tables are plain comma-separated text with a header row. Fields are
//! quoted only when they contain a delimiter, a quote or a line break.

use crate::merger::AlignedTable;
use crate::table::{IndicatorColumn, IndicatorRow, IndicatorTable};
use crate::types::{AbsoluteTime, DecoderError, Result};
use std::io::{BufRead, Write};

/// Header of the time column in every table
pub const TIME_HEADER: &str = "Absolute Time (minutes)";

/// Header of the name column in the count summary
pub const FILE_NAME_HEADER: &str = "File Name";

/// Quote a field if it would otherwise break the record
pub fn escape_field(field: &str, delimiter: char) -> String {
    if field.contains(delimiter)
        || field.contains('"')
        || field.contains('\n')
        || field.contains('\r')
    {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split one record into fields, honouring double-quoted fields
pub fn split_record(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            c if c == delimiter && !in_quotes => fields.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }
    fields.push(field);

    fields
}

fn write_record<W: Write, S: AsRef<str>>(out: &mut W, fields: &[S]) -> Result<()> {
    let line: Vec<String> = fields.iter().map(|f| escape_field(f.as_ref(), ',')).collect();
    writeln!(out, "{}", line.join(","))?;
    Ok(())
}

fn format_time(time: Option<AbsoluteTime>) -> String {
    time.map(|t| t.to_string()).unwrap_or_default()
}

fn format_cell(cell: Option<f64>) -> String {
    cell.map(|v| v.to_string()).unwrap_or_default()
}

/// Write the wide raw+fraction table (`Box N Raw Data`, `Box N Fraction`)
pub fn write_aligned<W: Write>(table: &AlignedTable, out: &mut W) -> Result<()> {
    let mut header = vec![TIME_HEADER.to_string()];
    for channel in 1..=table.channel_count {
        header.push(format!("Box {} Raw Data", channel));
        header.push(format!("Box {} Fraction", channel));
    }
    write_record(out, &header)?;

    for row in &table.rows {
        let mut record = vec![row.time.to_string()];
        for event in &row.events {
            match event {
                Some(event) => {
                    record.push(event.raw.clone());
                    record.push(event.tag.to_string());
                }
                None => record.extend([String::new(), String::new()]),
            }
        }
        write_record(out, &record)?;
    }

    Ok(())
}

/// Write an indicator table (`Absolute Time (minutes)` + channel columns)
pub fn write_indicator<W: Write>(table: &IndicatorTable, out: &mut W) -> Result<()> {
    let mut header = vec![TIME_HEADER.to_string()];
    header.extend(table.column_names());
    write_record(out, &header)?;

    for row in &table.rows {
        let mut record = vec![format_time(row.time)];
        record.extend(row.cells.iter().map(|c| format_cell(*c)));
        write_record(out, &record)?;
    }

    Ok(())
}

/// Write the count summary: one row per base name, one column per channel
pub fn write_counts<W: Write>(
    rows: &[(String, Vec<usize>)],
    channel_count: usize,
    out: &mut W,
) -> Result<()> {
    let mut header = vec![FILE_NAME_HEADER.to_string()];
    header.extend((1..=channel_count).map(|c| IndicatorColumn::channel(c).name()));
    write_record(out, &header)?;

    for (name, counts) in rows {
        let mut record = vec![name.clone()];
        record.extend(counts.iter().map(|c| c.to_string()));
        write_record(out, &record)?;
    }

    Ok(())
}

/// Recover a column identity from its header label
///
/// `Box N-T` and `Box N` are recognized; anything else is numbered by
/// position.
fn parse_column(label: &str, position: usize) -> IndicatorColumn {
    let parsed = label
        .trim()
        .strip_prefix("Box ")
        .and_then(|rest| match rest.split_once('-') {
            Some((channel, tag)) => Some(IndicatorColumn::tagged(
                channel.parse().ok()?,
                tag.parse().ok()?,
            )),
            None => Some(IndicatorColumn::channel(rest.parse().ok()?)),
        });
    parsed.unwrap_or_else(|| IndicatorColumn::channel(position))
}

/// Read an indicator table written by [`write_indicator`] or an equivalent tool
///
/// The first column is the time; a time that is not numeric becomes a
/// missing time. Channel cells must be empty or numeric.
pub fn read_indicator<R: BufRead>(reader: R) -> Result<IndicatorTable> {
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => split_record(line?.trim_end_matches('\r'), ','),
        None => return Err(DecoderError::TableError("file is empty".to_string())),
    };
    let columns: Vec<IndicatorColumn> = header
        .iter()
        .skip(1)
        .enumerate()
        .map(|(i, label)| parse_column(label, i + 1))
        .collect();

    let mut table = IndicatorTable::new(columns);
    for (line_no, line) in lines.enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        let fields = split_record(line, ',');
        if fields.len() > header.len() {
            return Err(DecoderError::TableError(format!(
                "line {}: expected {} fields, found {}",
                line_no + 2,
                header.len(),
                fields.len()
            )));
        }

        let time = fields[0]
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|t| !t.is_nan())
            .map(AbsoluteTime::from_minutes);

        let mut cells = Vec::with_capacity(table.columns.len());
        for i in 0..table.columns.len() {
            let text = fields.get(i + 1).map(|f| f.trim()).unwrap_or("");
            if text.is_empty() {
                cells.push(None);
                continue;
            }
            let value = text.parse::<f64>().map_err(|_| {
                DecoderError::TableError(format!(
                    "line {}: non-numeric cell {:?}",
                    line_no + 2,
                    text
                ))
            })?;
            cells.push(if value.is_nan() { None } else { Some(value) });
        }

        table.rows.push(IndicatorRow { time, cells });
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChannelEvent, EventRecord};

    fn render<F: FnOnce(&mut Vec<u8>) -> Result<()>>(f: F) -> String {
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_split_record_quotes() {
        assert_eq!(split_record("a,b,,c", ','), vec!["a", "b", "", "c"]);
        assert_eq!(split_record("\"x,y\",\"say \"\"hi\"\"\"", ','), vec!["x,y", "say \"hi\""]);
        assert_eq!(split_record("1\t2", '\t'), vec!["1", "2"]);
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain", ','), "plain");
        assert_eq!(escape_field("a,b", ','), "\"a,b\"");
        assert_eq!(escape_field("a\tb", '\t'), "\"a\tb\"");
    }

    #[test]
    fn test_write_aligned() {
        let event = ChannelEvent::new("6000.0100", 1);
        let channel: EventRecord = [(AbsoluteTime::from_minutes(1.0), event)]
            .into_iter()
            .collect();
        let table = AlignedTable::merge(&[EventRecord::new(), channel], 2);

        let text = render(|out| write_aligned(&table, out));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Absolute Time (minutes),Box 1 Raw Data,Box 1 Fraction,Box 2 Raw Data,Box 2 Fraction"
        );
        assert_eq!(lines[1], "1.0,,,6000.0100,1");
    }

    #[test]
    fn test_indicator_roundtrip_keeps_column_identity() {
        let text = "Absolute Time (minutes),Box 1-1,Box 2-6,Other\n0.5,1,,\n1.0,,1,2\n";
        let table = read_indicator(text.as_bytes()).unwrap();

        assert_eq!(table.column_names(), vec!["Box 1-1", "Box 2-6", "Box 3"]);
        assert_eq!(table.rows[1].cells, vec![None, Some(1.0), Some(2.0)]);

        let written = render(|out| write_indicator(&table, out));
        assert_eq!(written, "Absolute Time (minutes),Box 1-1,Box 2-6,Box 3\n0.5,1,,\n1.0,,1,2\n");
    }

    #[test]
    fn test_read_indicator_errors() {
        assert!(read_indicator("".as_bytes()).is_err());
        assert!(read_indicator("t,Box 1\n1.0,abc\n".as_bytes()).is_err());
        assert!(read_indicator("t,Box 1\n1.0,1,1\n".as_bytes()).is_err());
    }

    #[test]
    fn test_read_indicator_missing_time() {
        let table = read_indicator("t,Box 1\nn/a,1\n2.0\n".as_bytes()).unwrap();
        assert_eq!(table.rows[0].time, None);
        assert_eq!(table.rows[1].cells, vec![None]);
    }

    #[test]
    fn test_write_counts() {
        let rows = vec![("rat, 7".to_string(), vec![2, 0, 1])];
        let text = render(|out| write_counts(&rows, 3, out));
        assert_eq!(text, "File Name,Box 1,Box 2,Box 3\n\"rat, 7\",2,0,1\n");
    }
}
