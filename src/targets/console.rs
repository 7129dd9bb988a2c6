//! Console target
//!
//! Writes formatted entries to the terminal, optionally coloured by level.

use super::worker::{Sink, Worker, DEFAULT_QUEUE_CAPACITY};
use crate::core::{Entry, ErrorWriter, Filter, Level, Record, Result, Target};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Which standard stream receives the output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleStream {
    Stdout,
    #[default]
    Stderr,
    /// Error and more severe levels to stderr, the rest to stdout
    Split,
}

impl ConsoleStream {
    fn is_stderr(self, level: Level) -> bool {
        match self {
            ConsoleStream::Stdout => false,
            ConsoleStream::Stderr => true,
            ConsoleStream::Split => level <= Level::Error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleTarget {
    pub stream: ConsoleStream,
    pub colored: bool,
    pub filter: Filter,
    pub queue_capacity: usize,
    #[serde(skip)]
    worker: Option<Worker>,
}

impl Default for ConsoleTarget {
    fn default() -> Self {
        Self {
            stream: ConsoleStream::default(),
            colored: true,
            filter: Filter::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker: None,
        }
    }
}

impl ConsoleTarget {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_stream(mut self, stream: ConsoleStream) -> Self {
        self.stream = stream;
        self
    }

    #[must_use]
    pub fn with_colors(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }
}

impl Target for ConsoleTarget {
    fn name(&self) -> &str {
        "console"
    }

    fn open(&mut self, errors: ErrorWriter) -> Result<()> {
        let sink = ConsoleSink {
            stream: self.stream,
            colored: self.colored,
        };
        self.worker = Some(Worker::spawn("console", self.queue_capacity, sink, errors)?);
        Ok(())
    }

    fn process(&mut self, record: Record) {
        let Some(worker) = self.worker.as_mut() else {
            return;
        };
        match record {
            Record::Entry(entry) => {
                if self.filter.allows(&entry) {
                    worker.submit(entry);
                }
            }
            Record::Flush => worker.drain(),
        }
    }

    fn close(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.join();
        }
    }
}

struct ConsoleSink {
    stream: ConsoleStream,
    colored: bool,
}

fn render_line(entry: &Entry, colored: bool) -> String {
    if colored {
        entry.output().color(entry.level.color_code()).to_string()
    } else {
        entry.output().to_string()
    }
}

impl Sink for ConsoleSink {
    fn write(&mut self, entry: &Entry) -> Result<()> {
        let line = render_line(entry, self.colored);
        if self.stream.is_stderr(entry.level) {
            writeln!(std::io::stderr().lock(), "{}", line)?;
        } else {
            writeln!(std::io::stdout().lock(), "{}", line)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }
}
