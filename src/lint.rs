//! The structural validator.
//!
//! Five independent checks over one document: statement terminators (block
//! level and line level), unknown leading identifiers, redundant semicolons,
//! storage-variable brace wrapping, and unresolvable single-file imports.
//! A failure in one check never blocks the others; the result is always the
//! best-effort diagnostic set, filtered through ignored zones and sorted by
//! position.

use crate::blocks::{self, BlockKind, BlockSpan};
use crate::catalog::{is_command, is_keyword, Catalog};
use crate::diagnostics::{
    filter_ignored, find_ignored_zones, sort_diagnostics, Diagnostic,
};
use crate::document::{Document, Range};
use crate::imports::{import_edges, ImportKind};
use crate::scrub::scrub;
use crate::symbols::{extract_local, simple_name, GlobalScope, SymbolKind};
use std::collections::BTreeSet;
use std::path::Path;

/// Read-only inputs shared by every check: the static catalogs and the
/// project-wide symbol scope the document belongs to.
pub struct LintContext<'a> {
    pub catalog: &'a Catalog,
    pub scope: &'a GlobalScope,
    pub root: &'a Path,
}

pub fn lint_document(document: &Document, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
    let scrubbed = scrub(document.text());
    // Structure/array interiors are data, not statements; blank them before
    // the line-oriented checks so NBT keys are not read as commands.
    let statement_view = mask_structures(&scrubbed);

    let mut diagnostics = blocks::check_terminators(document, &scrubbed);
    check_unknown_identifiers(document, &scrubbed, &statement_view, ctx, &mut diagnostics);
    check_instruction_terminators(&statement_view, document, &mut diagnostics);
    check_redundant_semicolons(document, &scrubbed, &mut diagnostics);
    check_storage_wrapping(document, &scrubbed, &mut diagnostics);
    check_import_targets(document, ctx.root, &mut diagnostics);

    let zones = find_ignored_zones(document);
    let mut diagnostics = filter_ignored(diagnostics, &zones);
    sort_diagnostics(&mut diagnostics);
    diagnostics
}

/// Blanks the interior of every structure/array block, newlines kept.
fn mask_structures(scrubbed: &str) -> String {
    let mut ranges = Vec::new();
    fn collect(spans: &[BlockSpan], ranges: &mut Vec<(usize, usize)>) {
        for span in spans {
            if matches!(span.kind, BlockKind::Structure | BlockKind::Array) {
                ranges.push((span.start(), span.end()));
            } else {
                collect(&span.children, ranges);
            }
        }
    }
    collect(&blocks::decompose(scrubbed), &mut ranges);
    ranges.sort_unstable();

    let mut out = String::with_capacity(scrubbed.len());
    let mut next = 0;
    for (index, c) in scrubbed.char_indices() {
        while next < ranges.len() && index >= ranges[next].1 {
            next += 1;
        }
        let masked = next < ranges.len() && index >= ranges[next].0 && c != '\n';
        if masked {
            for _ in 0..c.len_utf8() {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Check (a): the first bare word of each statement must be something the
/// language knows about. Catalog matches are case-insensitive; dotted call
/// names also resolve through their last segment.
fn check_unknown_identifiers(
    document: &Document,
    scrubbed: &str,
    statement_view: &str,
    ctx: &LintContext<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let local = extract_local(document, scrubbed);

    let mut defined: BTreeSet<String> = local
        .functions
        .iter()
        .map(|f| f.simple_name().to_lowercase())
        .collect();
    defined.extend(
        ctx.scope
            .table
            .of_kind(SymbolKind::Function)
            .map(|f| f.simple_name().to_lowercase()),
    );

    for (line, text) in statement_view.lines().enumerate() {
        let mut column = 0;
        for segment in text.split(';') {
            let trimmed = segment.trim_start();
            let word_start = column + (segment.len() - trimmed.len());
            column += segment.len() + 1;

            let Some(word) = leading_word(trimmed) else {
                continue;
            };
            if is_known(word, &defined, ctx) {
                continue;
            }
            diagnostics.push(Diagnostic::error(
                Range::on_line(line, word_start, word_start + word.len()),
                format!("Unknown command or function '{word}'"),
            ));
        }
    }
}

/// The identifier a statement starts with, or `None` when the segment opens
/// with a sigil, decorator, closing delimiter, or anything non-word.
fn leading_word(segment: &str) -> Option<&str> {
    let first = *segment.as_bytes().first()?;
    if !(first.is_ascii_alphanumeric() || first == b'_') {
        return None;
    }
    let end = segment
        .bytes()
        .position(|b| !(b.is_ascii_alphanumeric() || b == b'_' || b == b'.'))
        .unwrap_or(segment.len());
    Some(&segment[..end])
}

fn is_known(word: &str, defined: &BTreeSet<String>, ctx: &LintContext<'_>) -> bool {
    if is_keyword(word) || is_command(word) {
        return true;
    }
    if ctx.catalog.snippets.contains_ignore_case(word) {
        return true;
    }
    let lower = word.to_lowercase();
    defined.contains(&lower) || defined.contains(&simple_name(&lower).to_string())
}

const TERMINATOR_CHARS: &[char] = &[';', '{', '}', '[', ']', ','];

/// Check (b): line-level fallback for simple statements. Assignments and
/// lowercase command lines must end in a terminator character.
fn check_instruction_terminators(
    statement_view: &str,
    document: &Document,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (line, text) in statement_view.lines().enumerate() {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.starts_with('@') {
            continue;
        }

        let sigiled =
            (trimmed.starts_with('$') || trimmed.starts_with("::")) && trimmed.contains('=');
        let command_like = trimmed.starts_with(|c: char| c.is_ascii_lowercase())
            && !leading_word(trimmed).is_some_and(is_keyword);
        if !(sigiled || command_like) {
            continue;
        }

        if trimmed.ends_with(TERMINATOR_CHARS) {
            continue;
        }
        let end = document.end_of_line(line);
        diagnostics.push(Diagnostic::error(
            Range::new(end, end),
            "Missing semicolon ';' at end of instruction.",
        ));
    }
}

/// Check (c): `;;` outside parentheses. The `for (;;)` header is the one
/// place doubled semicolons are legitimate.
fn check_redundant_semicolons(
    document: &Document,
    scrubbed: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut paren_depth = 0usize;
    let bytes = scrubbed.as_bytes();
    for (index, &byte) in bytes.iter().enumerate() {
        match byte {
            b'(' => paren_depth += 1,
            b')' => paren_depth = paren_depth.saturating_sub(1),
            b';' if paren_depth == 0 && bytes.get(index + 1) == Some(&b';') => {
                let position = document.position_at(index + 1);
                diagnostics.push(Diagnostic::error(
                    Range::new(position, position.shifted(1)),
                    "Redundant semicolon ';'.",
                ));
            }
            _ => {}
        }
    }
}

/// Check (d): a storage reference on the right-hand side of a storage
/// assignment operator must sit directly inside `{ }`.
fn check_storage_wrapping(
    document: &Document,
    scrubbed: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for line in 0..document.line_count() {
        let text = line_of(scrubbed, document, line);
        let Some(rhs_start) = storage_operator_end(text) else {
            continue;
        };
        for (start, end) in storage_references(text, rhs_start) {
            let before = text[..start].trim_end();
            let after = text[end..].trim_start();
            if before.ends_with('{') && after.starts_with('}') {
                continue;
            }
            diagnostics.push(Diagnostic::error(
                Range::on_line(line, start, end),
                format!("Storage variable '{}' must be wrapped in {{ }}.", &text[start..end]),
            ));
        }
    }
}

fn line_of<'a>(scrubbed: &'a str, document: &Document, line: usize) -> &'a str {
    let start = document.offset_at(crate::document::Position::new(line, 0));
    let rest = &scrubbed[start..];
    rest.split(['\n', '\r']).next().unwrap_or(rest)
}

/// Finds the first storage assignment operator on a line and returns the
/// offset just past it. Two spellings exist: colon-first (`:=`, `:+=`, ...)
/// and `=:` not directly followed by another colon.
fn storage_operator_end(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    for i in 0..bytes.len() {
        if bytes[i] == b':' {
            match bytes.get(i + 1) {
                Some(b'=') => return Some(i + 2),
                Some(b'+' | b'-' | b'*' | b'/' | b'%') if bytes.get(i + 2) == Some(&b'=') => {
                    return Some(i + 3);
                }
                _ => {}
            }
        }
        if bytes[i] == b'=' && bytes.get(i + 1) == Some(&b':') && bytes.get(i + 2) != Some(&b':') {
            return Some(i + 2);
        }
    }
    None
}

/// Storage references (`prefix::path`) at or after `from`, as byte spans.
fn storage_references(text: &str, from: usize) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let dotted = |b: u8| b.is_ascii_alphanumeric() || b == b'_' || b == b'.';
    let mut out = Vec::new();
    let mut i = from;
    while i + 1 < bytes.len() {
        if bytes[i] != b':' || bytes[i + 1] != b':' {
            i += 1;
            continue;
        }
        let mut start = i;
        while start > from && dotted(bytes[start - 1]) {
            start -= 1;
        }
        let mut end = i + 2;
        while end < bytes.len() && dotted(bytes[end]) {
            end += 1;
        }
        if end > i + 2 {
            out.push((start, end));
        }
        i = end.max(i + 2);
    }
    out
}

/// Check (e): a single-file import whose target does not exist on disk.
/// Wildcard imports stay silent; an empty directory is not an error.
fn check_import_targets(document: &Document, root: &Path, diagnostics: &mut Vec<Diagnostic>) {
    for edge in import_edges(document, root) {
        if edge.kind == ImportKind::Single && edge.targets.is_empty() {
            diagnostics.push(Diagnostic::error(
                edge.range,
                format!("Import target '{}' not found.", edge.specifier),
            ));
        }
    }
}
