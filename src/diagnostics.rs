use crate::document::{Document, Range};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Diagnostic source tag for the crate's own checks.
pub const LINT_SOURCE: &str = "jmc-lint";
/// Source tag for diagnostics parsed out of an external compiler run.
pub const COMPILER_SOURCE: &str = "jmc-compiler";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

/// One reported problem, anchored in a single file. The owning file is the
/// key of the surrounding [`DiagnosticsMap`], not part of the diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub range: Range,
    pub message: String,
    pub severity: Severity,
    pub source: &'static str,
}

impl Diagnostic {
    pub fn new(range: Range, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            range,
            message: message.into(),
            severity,
            source: LINT_SOURCE,
        }
    }

    pub fn error(range: Range, message: impl Into<String>) -> Self {
        Self::new(range, message, Severity::Error)
    }

    pub fn warning(range: Range, message: impl Into<String>) -> Self {
        Self::new(range, message, Severity::Warning)
    }

    pub fn with_source(mut self, source: &'static str) -> Self {
        self.source = source;
        self
    }
}

/// Absolute file path -> diagnostics for that file. A `BTreeMap` keeps
/// cross-file iteration deterministic for consumers and tests.
pub type DiagnosticsMap = BTreeMap<PathBuf, Vec<Diagnostic>>;

pub const IGNORE_START: &str = "// @ignore(start)";
pub const IGNORE_END: &str = "// @ignore(end)";

/// Marked source ranges excluded from diagnostics and decorations, plus the
/// marker-line ranges themselves (the host renders those in bold).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IgnoredZones {
    pub zones: Vec<Range>,
    pub marker_ranges: Vec<Range>,
}

impl IgnoredZones {
    pub fn contains(&self, range: &Range) -> bool {
        self.zones.iter().any(|zone| zone.intersects(range))
    }
}

/// Scans for `// @ignore(start)` ... `// @ignore(end)` pairs. Zones are
/// inclusive of both marker lines. An unclosed start marker aborts further
/// scanning, so the rest of the file stays fully linted (fail-open).
pub fn find_ignored_zones(document: &Document) -> IgnoredZones {
    let text = document.text();
    let mut result = IgnoredZones::default();
    let mut search = 0;

    while let Some(found) = text[search..].find(IGNORE_START) {
        let start_offset = search + found;
        let Some(end_found) = text[start_offset..].find(IGNORE_END) else {
            break;
        };
        let end_offset = start_offset + end_found;

        let start_position = document.position_at(start_offset);
        let end_position = document.position_at(end_offset).shifted(IGNORE_END.len());
        result.zones.push(Range::new(start_position, end_position));
        result
            .marker_ranges
            .push(document.line_range(start_position.line));
        result
            .marker_ranges
            .push(document.line_range(end_position.line));

        search = end_offset + IGNORE_END.len();
    }
    result
}

/// Drops every diagnostic whose range intersects an ignored zone.
pub fn filter_ignored(diagnostics: Vec<Diagnostic>, zones: &IgnoredZones) -> Vec<Diagnostic> {
    diagnostics
        .into_iter()
        .filter(|diagnostic| !zones.contains(&diagnostic.range))
        .collect()
}

/// Position order, then severity. Discovery order is scan order; sorting
/// makes per-file output deterministic regardless of which check fired
/// first.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        (a.range.start, a.range.end, a.severity).cmp(&(b.range.start, b.range.end, b.severity))
    });
}
