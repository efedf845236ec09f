//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders records in the format selected by `--output`. Tables are built
//! with `tabled`, structured formats use serde, plain emits one id per
//! line. Notifications go to stderr, colored by level.

use std::io::{self, IsTerminal, Write};

use adminkit_api::Record;
use adminkit_core::action::auth::{AUTH_CHECK_ERROR, AUTH_SIGN_IN_ERROR, NOTIFICATION_LOGGED_OUT};
use adminkit_core::action::crud::{
    NOTIFICATION_CREATED, NOTIFICATION_DELETED, NOTIFICATION_HTTP_ERROR, NOTIFICATION_UPDATED,
};
use adminkit_core::{Notification, NotificationLevel};
use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::{builder::Builder, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled on stderr.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render records in the chosen format.
///
/// Table columns are `id` followed by the union of top-level fields.
pub fn render_records(format: &OutputFormat, records: &[Record]) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_table(records)),
        OutputFormat::Json => render_json(records, false),
        OutputFormat::JsonCompact => render_json(records, true),
        OutputFormat::Yaml => render_yaml(records),
        OutputFormat::Plain => Ok(records
            .iter()
            .map(|r| r.id.to_string())
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Render a single record; tables become a key/value listing.
pub fn render_record(format: &OutputFormat, record: &Record) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_detail(record)),
        OutputFormat::Json => render_json(record, false),
        OutputFormat::JsonCompact => render_json(record, true),
        OutputFormat::Yaml => render_yaml(record),
        OutputFormat::Plain => Ok(record.id.to_string()),
    }
}

/// Render any serializable value; `Table` and `Plain` use `detail_fn`.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table | OutputFormat::Plain => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Notifications ────────────────────────────────────────────────────

/// Human text for a notification message key.
pub fn notification_text(notification: &Notification) -> String {
    let count = notification.message_args.smart_count.unwrap_or(1);
    let elements = |verb: &str| {
        if count == 1 {
            format!("Element {verb}")
        } else {
            format!("{count} elements {verb}")
        }
    };
    match notification.body.as_str() {
        NOTIFICATION_CREATED => elements("created"),
        NOTIFICATION_UPDATED => elements("updated"),
        NOTIFICATION_DELETED => elements("deleted"),
        NOTIFICATION_HTTP_ERROR => "Server communication error".into(),
        AUTH_SIGN_IN_ERROR => "Authentication failed, please retry".into(),
        AUTH_CHECK_ERROR => "Please login to continue".into(),
        NOTIFICATION_LOGGED_OUT => "Your session has ended, please reconnect".into(),
        other => other.to_owned(),
    }
}

/// Print a notification to stderr.
pub fn print_notification(notification: &Notification, color: bool, quiet: bool) {
    if quiet {
        return;
    }
    let mut text = notification_text(notification);
    if notification.undoable {
        text.push_str(" (press Ctrl-C to undo)");
    }
    let mut stderr = io::stderr().lock();
    let _ = match (notification.level, color) {
        (_, false) => writeln!(stderr, "{text}"),
        (NotificationLevel::Info, true) => writeln!(stderr, "{}", text.green()),
        (NotificationLevel::Warning, true) => writeln!(stderr, "{}", text.yellow()),
        (NotificationLevel::Error, true) => writeln!(stderr, "{}", text.red().bold()),
    };
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table(records: &[Record]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for record in records {
        for key in record.fields.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }
    columns.sort_unstable();

    let mut builder = Builder::default();
    builder.push_record(std::iter::once("id").chain(columns.iter().copied()));
    for record in records {
        let cells = columns
            .iter()
            .map(|column| record.fields.get(*column).map(cell).unwrap_or_default());
        builder.push_record(std::iter::once(record.id.to_string()).chain(cells));
    }
    builder.build().with(Style::rounded()).to_string()
}

fn render_detail(record: &Record) -> String {
    use std::fmt::Write;

    let width = record.fields.keys().map(String::len).max().unwrap_or(0).max(2);
    let mut out = format!("{:<width$}  {}", "id", record.id);
    for (key, value) in &record.fields {
        let _ = write!(out, "\n{key:<width$}  {}", cell(value));
    }
    out
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(rendered)
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Internal {
        message: format!("YAML serialization failed: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<Record> {
        vec![
            Record::new(1).with("title", "Hello"),
            Record::new(2).with("views", 3),
        ]
    }

    #[test]
    fn plain_lists_ids() {
        let out = render_records(&OutputFormat::Plain, &records());
        assert_eq!(out.ok().as_deref(), Some("1\n2"));
    }

    #[test]
    fn table_has_union_of_columns() {
        let out = render_records(&OutputFormat::Table, &records()).unwrap_or_default();
        assert!(out.contains("title"));
        assert!(out.contains("views"));
        assert!(out.contains("Hello"));
    }

    #[test]
    fn bulk_notifications_use_the_count() {
        let notification = Notification::info(NOTIFICATION_DELETED);
        assert_eq!(notification_text(&notification), "Element deleted");
        let notification = notification.with_count(3);
        assert_eq!(notification_text(&notification), "3 elements deleted");
        assert_eq!(
            notification_text(&Notification::warning("custom.key")),
            "custom.key"
        );
    }
}
