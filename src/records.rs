//! Record files consumed and produced by the command-line driver.
//!
//! Input is either a JSON array of objects or JSON Lines (one object per
//! line). Output is always JSON Lines: each input object with one result
//! field added, so downstream tooling keeps every original column.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// One usable input row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 1-based position in the input file.
    pub line: usize,
    pub text: String,
    /// Raw label token, if the label field was requested and present.
    pub label: Option<String>,
    /// The full input object, echoed back on output.
    pub fields: Map<String, Value>,
}

/// Which fields to read from each input object.
#[derive(Debug, Clone, Copy)]
pub struct FieldNames<'a> {
    pub text: &'a str,
    pub label: Option<&'a str>,
}

/// Read records from `path`. Rows whose text field is missing, null or
/// blank are skipped with a warning.
pub fn read_records(path: &Path, fields: FieldNames<'_>) -> Result<Vec<Record>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let rows = parse_rows(&content).with_context(|| format!("parsing {}", path.display()))?;

    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for (line, row) in rows {
        let Value::Object(object) = row else {
            bail!("{}: row {} is not a JSON object", path.display(), line);
        };
        let Some(text) = text_field(&object, fields.text) else {
            warn!(line, field = fields.text, "skipping record without text");
            skipped += 1;
            continue;
        };
        let label = fields.label.and_then(|name| label_token(object.get(name)?));
        records.push(Record {
            line,
            text,
            label,
            fields: object,
        });
    }

    debug!(path = %path.display(), records = records.len(), skipped, "read records");
    Ok(records)
}

/// Label tokens of every record, failing on the first record without one.
pub fn require_labels(records: &[Record], field: &str) -> Result<Vec<String>> {
    records
        .iter()
        .map(|r| {
            r.label
                .clone()
                .with_context(|| format!("record {} has no {:?} label", r.line, field))
        })
        .collect()
}

/// Write `records` as JSON Lines, adding `field = value` to each object.
pub fn write_annotated<W, I>(mut out: W, records: &[Record], field: &str, values: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = Value>,
{
    for (record, value) in records.iter().zip(values) {
        let mut object = record.fields.clone();
        object.insert(field.to_string(), value);
        serde_json::to_writer(&mut out, &Value::Object(object))?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Write to `path`, or to stdout when no path is given.
pub fn with_output<F>(path: Option<&Path>, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let file = fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            let mut out = BufWriter::new(file);
            write(&mut out).with_context(|| format!("writing {}", path.display()))
        }
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            write(&mut out)
        }
    }
}

/// `(1-based line, value)` pairs from a JSON array or JSON Lines document.
fn parse_rows(content: &str) -> Result<Vec<(usize, Value)>> {
    if content.trim_start().starts_with('[') {
        let rows: Vec<Value> = serde_json::from_str(content).context("invalid JSON array")?;
        return Ok(rows.into_iter().enumerate().map(|(i, v)| (i + 1, v)).collect());
    }

    let mut rows = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value =
            serde_json::from_str(line).with_context(|| format!("invalid JSON on line {}", i + 1))?;
        rows.push((i + 1, value));
    }
    Ok(rows)
}

fn text_field(object: &Map<String, Value>, name: &str) -> Option<String> {
    match object.get(name)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Strings pass through; booleans and numbers become their JSON spelling.
fn label_token(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    const LABELLED: FieldNames<'static> = FieldNames {
        text: "copyright",
        label: Some("falsePositive"),
    };

    fn file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_read_json_lines() {
        let f = file(concat!(
            r#"{"copyright": "Copyright 2001 Foo", "falsePositive": "f"}"#,
            "\n\n",
            r#"{"copyright": "the above copyright notice", "falsePositive": true}"#,
            "\n",
            r#"{"copyright": "x", "falsePositive": 0}"#,
            "\n",
        ));
        let records = read_records(f.path(), LABELLED).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].text, "Copyright 2001 Foo");
        assert_eq!(records[0].line, 1);
        assert_eq!(records[1].line, 3);
        let labels: Vec<_> = records.iter().map(|r| r.label.clone().unwrap()).collect();
        assert_eq!(labels, vec!["f", "true", "0"]);
    }

    #[test]
    fn test_read_json_array_skips_blank_text() {
        let f = file(
            r#"[
                {"original_content": "© 2010 Jane Doe", "id": 7},
                {"original_content": null},
                {"original_content": "   "},
                {"other": "missing"}
            ]"#,
        );
        let fields = FieldNames {
            text: "original_content",
            label: None,
        };
        let records = read_records(f.path(), fields).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields["id"], json!(7));
        assert_eq!(records[0].label, None);
    }

    #[test]
    fn test_invalid_input() {
        let f = file("{\"copyright\": \"a\"}\nnot json\n");
        let err = read_records(f.path(), LABELLED).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));

        let f = file("[1, 2]");
        assert!(read_records(f.path(), LABELLED).is_err());
    }

    #[test]
    fn test_require_labels() {
        let f = file("{\"copyright\": \"a\", \"falsePositive\": \"t\"}\n{\"copyright\": \"b\"}\n");
        let records = read_records(f.path(), LABELLED).unwrap();
        let err = require_labels(&records, "falsePositive").unwrap_err();
        assert!(err.to_string().contains("record 2"));
        assert_eq!(require_labels(&records[..1], "falsePositive").unwrap(), vec!["t"]);
    }

    #[test]
    fn test_write_annotated_keeps_fields() {
        let f = file("{\"copyright\": \"a\", \"id\": 1}\n{\"copyright\": \"b\", \"id\": 2}\n");
        let records = read_records(f.path(), LABELLED).unwrap();
        let mut out = Vec::new();
        write_annotated(&mut out, &records, "prediction", vec![json!("t"), json!("f")]).unwrap();

        let lines: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(
            lines,
            vec![
                json!({"copyright": "a", "id": 1, "prediction": "t"}),
                json!({"copyright": "b", "id": 2, "prediction": "f"}),
            ]
        );
    }
}
