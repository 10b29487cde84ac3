//! Block decomposition.
//!
//! A single left-to-right scan over scrubbed text matches `{}`/`[]` pairs
//! with an explicit pushdown stack and classifies every block by the token
//! run that precedes its opening delimiter. There is no grammar here: the
//! classification is a bounded-lookback heuristic, which is why the scanner
//! must degrade quietly on unbalanced input instead of failing.

use crate::diagnostics::{Diagnostic, Severity};
use crate::document::Document;

/// How far back before an opening `{` the classifier looks for a header.
/// Headers (`function name(...)`, `::path =`, `execute ... run`) are short,
/// so a fixed window is enough.
const LOOKBACK_WINDOW: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `class`/`function`/control-flow body. Must NOT be followed by `;`.
    Definition,
    /// NBT compound assigned to a storage variable, or any brace nested in
    /// a structure/array. Needs a trailing `;` when not nested.
    Structure,
    /// `[...]` list. Needs a trailing `;` when not nested.
    Array,
    /// Anything else (`execute ... run { }` and friends). Needs `;`.
    Command,
}

/// One matched delimiter pair. `open` and `close` are the delimiter byte
/// offsets; `[start, end)` is the inner content. Spans form a strict tree by
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSpan {
    pub kind: BlockKind,
    pub open: usize,
    pub close: usize,
    pub children: Vec<BlockSpan>,
}

impl BlockSpan {
    pub fn start(&self) -> usize {
        self.open + 1
    }

    pub fn end(&self) -> usize {
        self.close
    }

    pub fn content<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start()..self.end()]
    }
}

struct Frame {
    kind: BlockKind,
    open: usize,
    bracket: bool,
    children: Vec<BlockSpan>,
}

/// Decomposes scrubbed text into a forest of block spans.
///
/// Unmatched closing delimiters are ignored; frames still open at EOF are
/// dropped, but any blocks completed inside them are kept so nested
/// diagnostics survive partially invalid syntax.
pub fn decompose(scrubbed: &str) -> Vec<BlockSpan> {
    let mut top_level: Vec<BlockSpan> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for (index, byte) in scrubbed.bytes().enumerate() {
        match byte {
            b'{' => {
                let parent = stack.last().map(|frame| frame.kind);
                let kind = classify_brace(scrubbed, index, parent);
                stack.push(Frame {
                    kind,
                    open: index,
                    bracket: false,
                    children: Vec::new(),
                });
            }
            b'[' => {
                stack.push(Frame {
                    kind: BlockKind::Array,
                    open: index,
                    bracket: true,
                    children: Vec::new(),
                });
            }
            b'}' | b']' => {
                let Some(frame) = stack.pop() else {
                    continue;
                };
                let closes_bracket = byte == b']';
                if frame.bracket != closes_bracket {
                    // Mismatched pair: drop the frame, keep its children.
                    adopt(&mut stack, &mut top_level, frame.children);
                    continue;
                }
                let span = BlockSpan {
                    kind: frame.kind,
                    open: frame.open,
                    close: index,
                    children: frame.children,
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(span),
                    None => top_level.push(span),
                }
            }
            _ => {}
        }
    }

    // Unclosed frames at EOF: salvage completed children.
    while let Some(frame) = stack.pop() {
        adopt(&mut stack, &mut top_level, frame.children);
    }
    top_level
}

fn adopt(stack: &mut [Frame], top_level: &mut Vec<BlockSpan>, orphans: Vec<BlockSpan>) {
    match stack.last_mut() {
        Some(parent) => parent.children.extend(orphans),
        None => top_level.extend(orphans),
    }
}

/// Statement-terminator checks over the span tree: command/structure/array
/// blocks not nested in another structure/array must be followed by `;`, and
/// a `;` directly after a definition block is itself an error.
pub fn check_terminators(document: &Document, scrubbed: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut work: Vec<(&BlockSpan, Option<BlockKind>)> = Vec::new();
    let spans = decompose(scrubbed);
    for span in &spans {
        work.push((span, None));
    }

    while let Some((span, parent)) = work.pop() {
        let next = next_content_char(scrubbed, span.close + 1);
        match span.kind {
            BlockKind::Definition => {
                if let Some((offset, b';')) = next {
                    let position = document.position_at(offset);
                    diagnostics.push(Diagnostic::new(
                        crate::document::Range::new(position, position.shifted(1)),
                        "Unnecessary semicolon ';' after definition block.",
                        Severity::Error,
                    ));
                }
            }
            BlockKind::Structure | BlockKind::Array | BlockKind::Command => {
                let nested = matches!(parent, Some(BlockKind::Structure | BlockKind::Array));
                if !nested && !matches!(next, Some((_, b';'))) {
                    let position = document.position_at(span.close + 1);
                    diagnostics.push(Diagnostic::new(
                        crate::document::Range::new(position, position.shifted(1)),
                        "Missing semicolon ';' after block or list.",
                        Severity::Error,
                    ));
                }
            }
        }
        for child in &span.children {
            work.push((child, Some(span.kind)));
        }
    }
    diagnostics
}

fn next_content_char(text: &str, from: usize) -> Option<(usize, u8)> {
    text.bytes()
        .enumerate()
        .skip(from)
        .find(|(_, b)| !b.is_ascii_whitespace())
}

fn classify_brace(scrubbed: &str, open: usize, parent: Option<BlockKind>) -> BlockKind {
    if matches!(parent, Some(BlockKind::Structure | BlockKind::Array)) {
        return BlockKind::Structure;
    }

    let mut window_start = open.saturating_sub(LOOKBACK_WINDOW);
    while !scrubbed.is_char_boundary(window_start) {
        window_start -= 1;
    }
    let lookback = scrubbed[window_start..open].trim_end();

    if lookback.ends_with("=>") {
        // Arrow callback bodies behave like command blocks.
        return BlockKind::Command;
    }
    if let Some(lhs) = strip_assignment_operator(lookback) {
        if trailing_reference(lhs).contains("::") {
            return BlockKind::Structure;
        }
        return BlockKind::Command;
    }
    if is_definition_header(lookback) {
        return BlockKind::Definition;
    }
    BlockKind::Command
}

/// If `lookback` ends with an assignment operator (`=`, `:=`, `:+=`, ...),
/// returns the text before it.
fn strip_assignment_operator(lookback: &str) -> Option<&str> {
    let rest = lookback.strip_suffix('=')?;
    let rest = rest
        .strip_suffix([':', '+', '-', '*', '/', '%'])
        .unwrap_or(rest);
    Some(rest.trim_end())
}

fn trailing_reference(text: &str) -> &str {
    let tail_start = text
        .rfind(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '.' | ':')))
        .map_or(0, |i| i + 1);
    &text[tail_start..]
}

const HEADER_KEYWORDS: &[&str] = &[
    "class", "function", "if", "else", "for", "while", "switch", "case", "default", "do",
];

/// Best-effort header detection: walks backward over an optional `(...)`
/// group and an optional name, then checks the preceding word. Known
/// misclassification: headers longer than the lookback window, or ones with
/// line breaks between condition and brace beyond it, fall through to
/// `Command`.
fn is_definition_header(lookback: &str) -> bool {
    let mut text = lookback.trim_end();

    // `case 1:` / `default:` labels.
    if let Some(rest) = text.strip_suffix(':') {
        if !rest.ends_with(':') {
            text = rest.trim_end();
            let (word, rest) = word_backward(text);
            if word == "default" {
                return true;
            }
            let (previous, _) = word_backward(rest.trim_end());
            if previous == "case" {
                return true;
            }
            return false;
        }
    }

    // Condition or parameter list.
    if text.ends_with(')') {
        let Some(before) = skip_paren_group_backward(text) else {
            return false;
        };
        text = before.trim_end();
    }

    let (word, rest) = word_backward(text);
    if word.is_empty() {
        return false;
    }
    if HEADER_KEYWORDS.contains(&word) {
        return true;
    }
    // A name after `function`/`class`.
    let (previous, _) = word_backward(rest.trim_end());
    matches!(previous, "function" | "class")
}

/// Splits off the trailing identifier-ish word: (`word`, remainder).
fn word_backward(text: &str) -> (&str, &str) {
    let start = text
        .rfind(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '.')))
        .map_or(0, |i| i + 1);
    (&text[start..], &text[..start])
}

/// Given text ending in `)`, returns the text before the matching `(`.
fn skip_paren_group_backward(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    for (index, byte) in text.bytes().enumerate().rev() {
        match byte {
            b')' => depth += 1,
            b'(' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..index]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrub::scrub;

    /// Rebuilds the original text from the span forest: gaps copied
    /// verbatim, spans re-emitted as delimiter + content + delimiter.
    fn reconstruct(text: &str, spans: &[BlockSpan]) -> String {
        fn emit(text: &str, spans: &[BlockSpan], from: usize, to: usize, out: &mut String) {
            let mut cursor = from;
            for span in spans {
                out.push_str(&text[cursor..span.open]);
                out.push(text.as_bytes()[span.open] as char);
                emit(text, &span.children, span.start(), span.end(), out);
                out.push(text.as_bytes()[span.close] as char);
                cursor = span.close + 1;
            }
            out.push_str(&text[cursor..to]);
        }
        let mut out = String::new();
        emit(text, spans, 0, text.len(), &mut out);
        out
    }

    #[test]
    fn test_balanced_round_trip() {
        let text = "function a() { execute run { say hi; }; ::x = { a: [1, 2] }; }";
        let spans = decompose(text);
        assert_eq!(reconstruct(text, &spans), text);
    }

    #[test]
    fn test_definition_classification() {
        let text = scrub("function foo.bar() { say hi; }");
        let spans = decompose(&text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, BlockKind::Definition);
    }

    #[test]
    fn test_condition_header_classification() {
        for source in [
            "if ($x == 5) { }",
            "while ($count > 0) { }",
            "for ($i = 0; $i < 10; $i++) { }",
            "switch($mode) { }",
            "} else { }",
        ] {
            let spans = decompose(source);
            let span = spans.last().unwrap();
            assert_eq!(span.kind, BlockKind::Definition, "in {source:?}");
        }
    }

    #[test]
    fn test_storage_assignment_is_structure() {
        let spans = decompose("::config = { a: 1 }");
        assert_eq!(spans[0].kind, BlockKind::Structure);
        let spans = decompose("::config := { a: 1 }");
        assert_eq!(spans[0].kind, BlockKind::Structure);
    }

    #[test]
    fn test_execute_run_is_command() {
        let spans = decompose("execute as @a run { say hi; }");
        assert_eq!(spans[0].kind, BlockKind::Command);
    }

    #[test]
    fn test_nested_brace_in_structure_is_structure() {
        let spans = decompose("::x = { inner: { a: 1 } }");
        assert_eq!(spans[0].kind, BlockKind::Structure);
        assert_eq!(spans[0].children[0].kind, BlockKind::Structure);
    }

    #[test]
    fn test_unmatched_closers_ignored() {
        let spans = decompose("} ] function f() { say hi; }");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, BlockKind::Definition);
    }

    #[test]
    fn test_unclosed_frame_keeps_children() {
        let spans = decompose("function f() { execute run { say hi; };");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, BlockKind::Command);
    }

    #[test]
    fn test_missing_terminator_after_structure() {
        let doc = Document::live("a.jmc", "::x = { a: 1 }\n");
        let diags = check_terminators(&doc, doc.text());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].range.start.column, 14);
        assert!(diags[0].message.contains("Missing semicolon"));
    }

    #[test]
    fn test_terminated_structure_is_clean() {
        let doc = Document::live("a.jmc", "::x = { a: 1 };\n");
        assert!(check_terminators(&doc, doc.text()).is_empty());
    }

    #[test]
    fn test_nested_list_needs_no_terminator() {
        let doc = Document::live("a.jmc", "::x = { tags: [1, 2] };\n");
        assert!(check_terminators(&doc, doc.text()).is_empty());
    }

    #[test]
    fn test_semicolon_after_definition_flagged() {
        let doc = Document::live("a.jmc", "function f() { say hi; };\n");
        let diags = check_terminators(&doc, doc.text());
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("Unnecessary semicolon"));
    }

    #[test]
    fn test_command_block_inside_function_checked() {
        let doc = Document::live("a.jmc", "function f() {\n    execute run { say hi; }\n}\n");
        let diags = check_terminators(&doc, doc.text());
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("Missing semicolon"));
        assert_eq!(diags[0].range.start.line, 1);
    }
}
