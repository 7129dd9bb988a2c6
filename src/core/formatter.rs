//! Formatters that render an entry into the text targets write
//!
//! A formatter receives the logger view that issued the entry alongside the
//! entry itself. Formatters run on the dispatcher thread.

use super::entry::Entry;
use super::logger::Logger;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Function rendering an entry to its final text
pub type Formatter = Arc<dyn Fn(&Logger, &Entry) -> String + Send + Sync>;

/// Timestamp format used by the built-in formatters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// ISO 8601 with microseconds: `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,

    /// RFC 3339 format: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Custom strftime format
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Iso8601Micros => datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }
}

/// The formatter every logger starts with
///
/// Example: `2025-01-08T10:30:45.123Z [Info][app] Request processed user=42`
pub fn default_formatter() -> Formatter {
    text_formatter(TimestampFormat::default())
}

/// Text formatter with a custom timestamp format
pub fn text_formatter(timestamp_format: TimestampFormat) -> Formatter {
    Arc::new(move |_: &Logger, entry: &Entry| format_text(entry, &timestamp_format))
}

/// One JSON object per entry, fields flattened into the object
pub fn json_formatter() -> Formatter {
    Arc::new(|_: &Logger, entry: &Entry| format_json(entry, &TimestampFormat::default()))
}

fn format_text(entry: &Entry, timestamp_format: &TimestampFormat) -> String {
    let mut out = format!(
        "{} [{}][{}] {}",
        timestamp_format.format(&entry.time),
        entry.level,
        entry.category,
        entry.message
    );

    if let Some(ref fields) = entry.fields {
        if !fields.is_empty() {
            out.push(' ');
            out.push_str(&fields.format_fields());
        }
    }

    if let Some(ref call_stack) = entry.call_stack {
        out.push_str(call_stack);
    }

    out
}

fn format_json(entry: &Entry, timestamp_format: &TimestampFormat) -> String {
    let mut json_obj = serde_json::Map::new();

    json_obj.insert(
        "time".to_string(),
        serde_json::Value::String(timestamp_format.format(&entry.time)),
    );
    json_obj.insert(
        "level".to_string(),
        serde_json::Value::String(entry.level.to_str().to_string()),
    );
    json_obj.insert(
        "category".to_string(),
        serde_json::Value::String(entry.category.clone()),
    );
    json_obj.insert(
        "message".to_string(),
        serde_json::Value::String(entry.message.clone()),
    );

    if let Some(ref call_stack) = entry.call_stack {
        json_obj.insert(
            "call_stack".to_string(),
            serde_json::Value::String(call_stack.clone()),
        );
    }

    if let Some(ref fields) = entry.fields {
        for (key, value) in fields.iter() {
            // Reserved keys win over fields of the same name
            json_obj
                .entry(key.clone())
                .or_insert_with(|| value.to_json_value());
        }
    }

    serde_json::to_string(&serde_json::Value::Object(json_obj)).unwrap_or_default()
}
