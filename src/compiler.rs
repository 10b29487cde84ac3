//! Parsing of external compiler output into structured diagnostics.
//!
//! The core never launches the compiler itself; the host runs it and hands
//! the combined stdout/stderr text here. Reports look like:
//!
//! ```text
//! In lib/clock.jmc:12:5
//!    12 | say hi
//!         ^^^
//! Expected semicolon
//! ```
//!
//! A location line opens a pending diagnostic, a caret line widens its
//! range, numbered code-context lines are skipped, and everything else
//! accumulates into the message. Compiler crashes (a Python stack trace
//! instead of a report) collapse into one diagnostic on the entry file's
//! last line.

use crate::diagnostics::{
    sort_diagnostics, Diagnostic, DiagnosticsMap, Severity, COMPILER_SOURCE,
};
use crate::document::{normalize_path, Document, Position, Range};
use std::path::Path;

const SUCCESS_BANNER: &str = "Compiled successfully";
const CRASH_BANNERS: &[&str] = &["Unexpected error causes program to crash", "AssertionError"];
const CRASH_MESSAGE: &str = "Compiler crash: an unexpected error occurred in the compiler.\n\
    Check your syntax closely, specifically macros, variables, or recently added code.";

/// The parsed result of one compiler run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilerOutcome {
    pub success: bool,
    pub diagnostics: DiagnosticsMap,
}

/// Removes ANSI escape sequences so location and caret lines match.
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\u{1b}' && c != '\u{9b}' {
            out.push(c);
            continue;
        }
        // Parameter bytes, then one terminator.
        while let Some(&next) = chars.peek() {
            if matches!(next, '[' | '(' | ')' | '#' | ';' | '?' | '0'..='9') {
                chars.next();
            } else {
                chars.next();
                break;
            }
        }
    }
    out
}

/// Parses raw compiler output. `entry` anchors the crash diagnostic; file
/// paths in the report resolve against `root`.
pub fn parse_report(output: &str, root: &Path, entry: &Document) -> CompilerOutcome {
    let clean = strip_ansi(output);
    let mut outcome = CompilerOutcome {
        success: clean.contains(SUCCESS_BANNER),
        diagnostics: DiagnosticsMap::new(),
    };

    if CRASH_BANNERS.iter().any(|banner| clean.contains(banner)) {
        let last_line = entry.line_count().saturating_sub(1);
        outcome
            .diagnostics
            .entry(normalize_path(entry.path()))
            .or_default()
            .push(
                Diagnostic::new(entry.line_range(last_line), CRASH_MESSAGE, Severity::Error)
                    .with_source(COMPILER_SOURCE),
            );
    }

    let mut pending: Option<PendingReport> = None;
    for line in clean.lines() {
        if let Some(location) = parse_location_line(line) {
            flush(&mut pending, &mut outcome.diagnostics, root);
            pending = Some(location);
            continue;
        }
        let Some(report) = pending.as_mut() else {
            continue;
        };
        if let Some(width) = caret_width(line) {
            report.range.end = report.range.start.shifted(width);
            continue;
        }
        if is_code_context(line) || line.trim().is_empty() || line.contains("Compiling...") {
            continue;
        }
        report.message.push(line.trim().to_string());
    }
    flush(&mut pending, &mut outcome.diagnostics, root);

    for diagnostics in outcome.diagnostics.values_mut() {
        sort_diagnostics(diagnostics);
    }
    outcome
}

/// Per-line compiler precedence: on any line the compiler reported about,
/// the linter's own findings for that file are dropped, then the compiler's
/// are appended.
pub fn merge_with_lint(lint: DiagnosticsMap, compiler: &CompilerOutcome) -> DiagnosticsMap {
    let mut merged = lint;
    for (path, reported) in &compiler.diagnostics {
        let entry = merged.entry(path.clone()).or_default();
        entry.retain(|diagnostic| {
            !reported
                .iter()
                .any(|c| c.range.start.line == diagnostic.range.start.line)
        });
        entry.extend(reported.iter().cloned());
        sort_diagnostics(entry);
    }
    merged
}

struct PendingReport {
    file: String,
    range: Range,
    message: Vec<String>,
}

/// `In <file>:<line>[:<col>]`, one-based positions.
fn parse_location_line(line: &str) -> Option<PendingReport> {
    let rest = line.trim_start().strip_prefix("In")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim();

    // Split numeric suffixes off the right so paths may contain colons.
    let mut parts = rest.rsplitn(3, ':');
    let first = parts.next()?;
    let second = parts.next();
    let third = parts.next();

    let (file, line_number, column) = match (third, second) {
        (Some(file), Some(line_text)) => match (line_text.parse::<usize>(), first.parse::<usize>())
        {
            (Ok(l), Ok(c)) => (file, l, c),
            // Only one trailing number; fold the middle back into the path.
            _ => (
                &rest[..rest.len() - first.len() - 1],
                first.parse::<usize>().ok()?,
                1,
            ),
        },
        (None, Some(file)) => (file, first.parse::<usize>().ok()?, 1),
        _ => return None,
    };

    let start = Position::new(line_number.saturating_sub(1), column.saturating_sub(1));
    Some(PendingReport {
        file: file.trim().to_string(),
        range: Range::new(start, start.shifted(1)),
        message: Vec::new(),
    })
}

fn caret_width(line: &str) -> Option<usize> {
    if is_code_context(line) {
        return None;
    }
    let trimmed = line.trim_start();
    let width = trimmed.bytes().take_while(|&b| b == b'^').count();
    (width > 0 && trimmed[width..].trim().is_empty()).then_some(width)
}

/// Context lines of the form `  12 | say hi`.
fn is_code_context(line: &str) -> bool {
    let trimmed = line.trim_start();
    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0 && trimmed[digits..].trim_start().starts_with('|')
}

fn flush(pending: &mut Option<PendingReport>, map: &mut DiagnosticsMap, root: &Path) {
    let Some(report) = pending.take() else {
        return;
    };
    let message = report.message.join("\n").trim().to_string();
    if message.is_empty() {
        return;
    }
    map.entry(normalize_path(&root.join(&report.file)))
        .or_default()
        .push(
            Diagnostic::new(report.range, message, Severity::Error).with_source(COMPILER_SOURCE),
        );
}
