//! Log entry structure

use super::call_stack;
use super::fields::Fields;
use super::level::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

/// One log record
///
/// `message` holds the caller's rendered text. `formatted` is filled in by the
/// dispatcher with the output of the issuing logger's formatter, once, before
/// any target sees the entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub category: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub formatted: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Fields>,
}

impl Entry {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// to prevent attackers from injecting fake log entries.
    fn sanitize_message(message: &str) -> String {
        if !message.contains(&['\n', '\r', '\t'][..]) {
            return message.to_string();
        }
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: Level, category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            level,
            category: category.into(),
            message: Self::sanitize_message(&message.into()),
            formatted: String::new(),
            call_stack: None,
            fields: None,
        }
    }

    /// Build an entry from anything displayable
    ///
    /// A `Display` implementation that reports an error leaves whatever it
    /// wrote so far as the message.
    pub fn render(level: Level, category: impl Into<String>, message: impl fmt::Display) -> Self {
        let mut rendered = String::new();
        let _ = write!(rendered, "{}", message);
        Self::new(level, category, rendered)
    }

    /// Attach up to `depth` caller frames; a zero depth leaves the entry untouched
    #[must_use]
    pub fn with_call_stack(mut self, depth: usize) -> Self {
        if depth > 0 {
            self.call_stack = Some(call_stack::capture(depth));
        }
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = Some(fields);
        self
    }

    /// The formatter output, or the raw message if the entry was never dispatched
    pub fn output(&self) -> &str {
        if self.formatted.is_empty() {
            &self.message
        } else {
            &self.formatted
        }
    }
}
