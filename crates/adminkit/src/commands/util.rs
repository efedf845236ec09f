//! Shared helpers for command handlers.

use std::path::Path;

use adminkit_api::{FilterPayload, Identifier, SortOrder, SortPayload};
use serde_json::Value;

use crate::cli::{PayloadArgs, QueryArgs};
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Record data from `--data` or `--from-file`. Must be a JSON object.
pub fn payload_value(payload: &PayloadArgs) -> Result<Value, CliError> {
    let value = match (&payload.data, &payload.from_file) {
        (Some(data), _) => serde_json::from_str(data).map_err(|e| CliError::Validation {
            field: "data".into(),
            reason: format!("invalid JSON: {e}"),
        })?,
        (None, Some(path)) => read_json_file(path)?,
        (None, None) => {
            return Err(CliError::Validation {
                field: "data".into(),
                reason: "provide --data '<json>' or --from-file <path>".into(),
            });
        }
    };
    if !value.is_object() {
        return Err(CliError::Validation {
            field: "data".into(),
            reason: "record data must be a JSON object".into(),
        });
    }
    Ok(value)
}

/// Parse `field`, `field:asc` or `field:desc`. Defaults to `id` ascending.
pub fn parse_sort(sort: Option<&str>) -> Result<SortPayload, CliError> {
    let Some(sort) = sort else {
        return Ok(SortPayload::default());
    };
    let (field, order) = match sort.split_once(':') {
        Some((field, order)) => {
            let order: SortOrder = order.parse().map_err(|_| CliError::Validation {
                field: "sort".into(),
                reason: format!("order must be 'asc' or 'desc', got '{order}'"),
            })?;
            (field, order)
        }
        None => (sort, SortOrder::Asc),
    };
    if field.is_empty() {
        return Err(CliError::Validation {
            field: "sort".into(),
            reason: "sort field must not be empty".into(),
        });
    }
    Ok(SortPayload::new(field, order))
}

/// Build a filter object from `field=value` pairs and `--q`.
///
/// Values that parse as JSON (`3`, `true`, `[1,2]`) keep their type;
/// anything else is a string.
pub fn parse_filter(query: &QueryArgs) -> Result<FilterPayload, CliError> {
    let mut filter = FilterPayload::new();
    for pair in &query.filter {
        let (key, raw) = pair.split_once('=').ok_or_else(|| CliError::Validation {
            field: "filter".into(),
            reason: format!("expected field=value, got '{pair}'"),
        })?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::from(raw));
        filter.insert(key.trim().to_owned(), value);
    }
    if let Some(q) = &query.q {
        filter.insert("q".into(), Value::from(q.as_str()));
    }
    Ok(filter)
}

pub fn parse_ids(ids: &[String]) -> Vec<Identifier> {
    ids.iter()
        .map(|id| Identifier::from(id.trim()))
        .collect()
}
