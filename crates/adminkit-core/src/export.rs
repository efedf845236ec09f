// ── CSV export ──
//
// Flattens records into CSV and writes it to disk. `id` is always the
// first column; nested objects become dotted columns (`author.name`).
// Columns follow first-seen order across records, sorted within one.

use std::fs;
use std::path::{Path, PathBuf};

use adminkit_api::Record;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::CoreError;

/// Separator for arrays of scalars inside one cell.
const ARRAY_SEPARATOR: &str = ";";

/// Render `records` as CSV with a header row.
///
/// Columns are the union of every record's (flattened) fields, in first
/// seen order. Missing fields and `null` become empty cells.
pub fn to_csv(records: &[Record]) -> Result<String, CoreError> {
    let rows: Vec<Vec<(String, String)>> = records.iter().map(flatten_record).collect();

    let mut headers: Vec<String> = vec!["id".into()];
    for row in &rows {
        for (key, _) in row {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&headers)?;
    for row in &rows {
        let cells = headers.iter().map(|header| {
            row.iter()
                .find(|(key, _)| key == header)
                .map_or("", |(_, cell)| cell.as_str())
        });
        writer.write_record(cells)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Export {
            message: e.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|e| CoreError::Export {
        message: e.to_string(),
    })
}

/// Write `csv` to `<dir>/<filename>.csv` and return the path.
pub fn download_csv(csv: &str, dir: &Path, filename: &str) -> Result<PathBuf, CoreError> {
    if filename.trim().is_empty() {
        return Err(CoreError::ValidationFailed {
            message: "export filename must not be empty".into(),
        });
    }
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{filename}.csv"));
    fs::write(&path, csv)?;
    info!(path = %path.display(), bytes = csv.len(), "csv written");
    Ok(path)
}

// ── Flattening ───────────────────────────────────────────────────────

fn flatten_record(record: &Record) -> Vec<(String, String)> {
    let mut cells = vec![("id".to_owned(), record.id.to_string())];
    flatten_into(&mut cells, "", &record.fields);
    cells
}

/// Keys are visited in sorted order so columns do not depend on how the
/// map was built.
fn flatten_into(cells: &mut Vec<(String, String)>, prefix: &str, object: &Map<String, Value>) {
    let mut keys: Vec<&String> = object.keys().collect();
    keys.sort();
    for key in keys {
        let value = &object[key.as_str()];
        let column = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(nested) => flatten_into(cells, &column, nested),
            other => cells.push((column, cell(other))),
        }
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(is_scalar) => items
            .iter()
            .map(cell)
            .collect::<Vec<_>>()
            .join(ARRAY_SEPARATOR),
        other => other.to_string(),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}
