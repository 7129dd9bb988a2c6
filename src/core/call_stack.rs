//! Call stack capture for log entries
//!
//! Frames inside this crate and inside the backtrace machinery are skipped so
//! the rendered stack starts at the application code that issued the call.

use std::backtrace::Backtrace;

const CRATE_NAME: &str = env!("CARGO_CRATE_NAME");

struct Frame {
    symbol: String,
    location: Option<String>,
}

/// Capture at most `depth` caller frames, rendered one per line
///
/// Every rendered frame starts with a newline so the result can be appended
/// to a message as-is. Returns an empty string when no symbols are available.
pub(crate) fn capture(depth: usize) -> String {
    if depth == 0 {
        return String::new();
    }

    let rendered = Backtrace::force_capture().to_string();
    let frames = parse_frames(&rendered, depth);

    let mut out = String::new();
    for frame in frames {
        out.push('\n');
        out.push_str(&frame.symbol);
        if let Some(location) = frame.location {
            out.push_str(" (");
            out.push_str(&location);
            out.push(')');
        }
    }
    out
}

fn parse_frames(rendered: &str, depth: usize) -> Vec<Frame> {
    let mut frames = Vec::with_capacity(depth);
    let mut lines = rendered.lines().peekable();

    while let Some(line) = lines.next() {
        let Some((index, symbol)) = line.trim_start().split_once(": ") else {
            continue;
        };
        if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let location = match lines.peek() {
            Some(next) if next.trim_start().starts_with("at ") => lines
                .next()
                .map(|l| l.trim_start().trim_start_matches("at ").to_string()),
            _ => None,
        };

        if is_internal(symbol) {
            continue;
        }

        frames.push(Frame {
            symbol: symbol.to_string(),
            location,
        });
        if frames.len() == depth {
            break;
        }
    }

    frames
}

fn is_internal(symbol: &str) -> bool {
    symbol.contains(CRATE_NAME)
        || symbol.contains("std::backtrace")
        || symbol.contains("std::backtrace_rs")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "   0: std::backtrace_rs::backtrace::libunwind::trace
             at /rustc/library/std/src/../../backtrace/src/backtrace/libunwind.rs:116:5
   1: std::backtrace::Backtrace::create
             at /rustc/library/std/src/backtrace.rs:331:13
   2: rust_log_dispatcher::core::call_stack::capture
             at ./src/core/call_stack.rs:20:20
   3: my_app::handlers::login
             at ./src/handlers.rs:42:9
   4: my_app::main
             at ./src/main.rs:7:5
   5: core::ops::function::FnOnce::call_once
";

    #[test]
    fn test_parse_skips_internal_frames() {
        let frames = parse_frames(SAMPLE, 10);
        let symbols: Vec<&str> = frames.iter().map(|f| f.symbol.as_str()).collect();
        assert_eq!(
            symbols,
            ["my_app::handlers::login", "my_app::main", "core::ops::function::FnOnce::call_once"]
        );
        assert_eq!(frames[0].location.as_deref(), Some("./src/handlers.rs:42:9"));
        assert!(frames[2].location.is_none());
    }

    #[test]
    fn test_parse_respects_depth() {
        let frames = parse_frames(SAMPLE, 1);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].symbol, "my_app::handlers::login");
    }

    #[test]
    fn test_zero_depth_captures_nothing() {
        assert!(capture(0).is_empty());
    }
}
