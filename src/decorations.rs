//! Decoration range projections for the host editor.
//!
//! The core computes plain ranges; the host decides how they look (bold
//! decorators, faded undefined calls, italic ignored content). Nothing here
//! is a diagnostic.

use crate::catalog::{is_allowed_decorator, Catalog};
use crate::diagnostics::find_ignored_zones;
use crate::document::{Document, Range};
use crate::symbols::GlobalScope;
use crate::xref::{analyze_usage, UsageHint};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecorationSet {
    /// `@add`, `@lazy`, ... occurrences. Unknown decorator words are left
    /// unstyled rather than flagged.
    pub decorator: Vec<Range>,
    /// Call sites of functions never defined anywhere in the import graph.
    pub fade: Vec<UsageHint>,
    /// Definitions never called anywhere in the import graph.
    pub unused: Vec<UsageHint>,
    /// The `// @ignore(...)` marker lines themselves.
    pub ignore_marker: Vec<Range>,
    /// Full ignored zones, marker lines included.
    pub ignore_content: Vec<Range>,
}

pub fn build_decorations(
    document: &Document,
    scope: &GlobalScope,
    catalog: &Catalog,
) -> DecorationSet {
    let zones = find_ignored_zones(document);
    let report = analyze_usage(document, scope, catalog);

    DecorationSet {
        decorator: decorator_ranges(document),
        fade: report.undefined_calls,
        unused: report.unused_functions,
        ignore_marker: zones.marker_ranges,
        ignore_content: zones.zones,
    }
}

/// `@word` occurrences for known decorator words, over the raw text so the
/// markers inside ignored zones still render.
fn decorator_ranges(document: &Document) -> Vec<Range> {
    let text = document.text();
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'@' {
            i += 1;
            continue;
        }
        let start = i + 1;
        let mut end = start;
        while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
            end += 1;
        }
        if end > start && is_allowed_decorator(&text[start..end]) {
            ranges.push(Range::new(
                document.position_at(i),
                document.position_at(end),
            ));
        }
        i = end.max(i + 1);
    }
    ranges
}
