//! Symbol extraction over scrubbed text.
//!
//! Definitions are recognized lexically: a `function <dotted-name>(` header,
//! a `class <name>` header, a `scoreboard objectives add <name>` command.
//! Variable references are recognized by sigil, `$name` for scoreboard
//! scalars and `::name` for storage paths. There is no grammar behind any of
//! this; the language is scanned, not parsed.
//!
//! Call sites frequently drop the namespace prefix (`tick()` for
//! `Clock.tick()`), so aggregated tables keep both the fully-qualified name
//! and a simple-name index.

use crate::document::{Document, Range};
use crate::imports::resolve_files;
use crate::scrub::scrub;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    Class,
    Scoreboard,
}

/// A definition found in one file. `name` is the fully-qualified dotted name
/// as written at the definition site.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub path: PathBuf,
    pub range: Range,
}

impl Symbol {
    /// Last dotted segment, the name call sites usually use.
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn line(&self) -> usize {
        self.range.start.line
    }
}

pub fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// A call-shaped occurrence, `name(` with the usual exclusions applied.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSite {
    pub name: String,
    pub path: PathBuf,
    pub range: Range,
}

impl CallSite {
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }
}

/// Variable references, split by sigil. Sets, not occurrence lists; the
/// consumers (completion, hover) only need the names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableSet {
    pub scoreboard: BTreeSet<String>,
    pub storage: BTreeSet<String>,
}

impl VariableSet {
    pub fn merge(&mut self, other: VariableSet) {
        self.scoreboard.extend(other.scoreboard);
        self.storage.extend(other.storage);
    }
}

/// Everything extracted from one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalSymbols {
    pub functions: Vec<Symbol>,
    pub classes: Vec<Symbol>,
    pub scoreboards: Vec<Symbol>,
    pub variables: VariableSet,
    pub call_sites: Vec<CallSite>,
    /// Simple names of functions carrying the `@add` decorator.
    pub force_kept: BTreeSet<String>,
}

/// Aggregated definitions across an import graph, dual-keyed: the map is by
/// fully-qualified name, with a side index from simple name to the full
/// names sharing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    by_name: BTreeMap<String, Symbol>,
    by_simple: BTreeMap<String, Vec<String>>,
}

impl SymbolTable {
    /// First definition of a name wins; later files do not shadow it.
    pub fn insert(&mut self, symbol: Symbol) {
        if self.by_name.contains_key(&symbol.name) {
            return;
        }
        self.by_simple
            .entry(symbol.simple_name().to_string())
            .or_default()
            .push(symbol.name.clone());
        self.by_name.insert(symbol.name.clone(), symbol);
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.by_name.get(name)
    }

    /// Resolves a simple name to its first-seen definition.
    pub fn get_by_simple_name(&self, simple: &str) -> Option<&Symbol> {
        let full = self.by_simple.get(simple)?.first()?;
        self.by_name.get(full)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn contains_simple(&self, simple: &str) -> bool {
        self.by_simple.contains_key(simple)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.by_name.values()
    }

    pub fn of_kind(&self, kind: SymbolKind) -> impl Iterator<Item = &Symbol> {
        self.by_name.values().filter(move |s| s.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// The whole project's symbols and call sites, aggregated over the entry
/// file's transitive imports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalScope {
    pub table: SymbolTable,
    pub variables: VariableSet,
    pub call_sites: Vec<CallSite>,
    pub force_kept: BTreeSet<String>,
}

impl GlobalScope {
    /// True when `name` (full or simple) resolves to a defined function.
    pub fn defines_function(&self, name: &str) -> bool {
        let lookup = |n: &Symbol| n.kind == SymbolKind::Function;
        self.table.get(name).map_or(false, lookup)
            || self.table.get_by_simple_name(simple_name(name)).map_or(false, lookup)
    }
}

/// Scans one scrubbed file. `document` supplies positions; `scrubbed` must
/// be the scrub of its text.
pub fn extract_local(document: &Document, scrubbed: &str) -> LocalSymbols {
    let mut out = LocalSymbols::default();
    let bytes = scrubbed.as_bytes();
    let path = document.path().to_path_buf();

    let mut i = 0;
    while i < bytes.len() {
        if !is_word_start(bytes, i) {
            i += 1;
            continue;
        }
        let word_end = dotted_end(bytes, i);
        let word = &scrubbed[i..word_end];

        match word {
            "function" => {
                if let Some((name_start, name_end)) = header_name(bytes, word_end, true) {
                    let name = &scrubbed[name_start..name_end];
                    let range = word_range(document, name_start, name_end);
                    if preceded_by_force_keep(scrubbed, i) {
                        out.force_kept.insert(simple_name(name).to_string());
                    }
                    out.functions.push(Symbol {
                        name: name.to_string(),
                        kind: SymbolKind::Function,
                        path: path.clone(),
                        range,
                    });
                    i = name_end;
                    continue;
                }
            }
            "class" => {
                if let Some((name_start, name_end)) = header_name(bytes, word_end, false) {
                    out.classes.push(Symbol {
                        name: scrubbed[name_start..name_end].to_string(),
                        kind: SymbolKind::Class,
                        path: path.clone(),
                        range: word_range(document, name_start, name_end),
                    });
                    i = name_end;
                    continue;
                }
            }
            "scoreboard" => {
                if let Some((name_start, name_end)) = objective_name(bytes, scrubbed, word_end) {
                    out.scoreboards.push(Symbol {
                        name: scrubbed[name_start..name_end].to_string(),
                        kind: SymbolKind::Scoreboard,
                        path: path.clone(),
                        range: word_range(document, name_start, name_end),
                    });
                    i = name_end;
                    continue;
                }
            }
            _ => {
                if is_call_site(bytes, scrubbed, i, word_end) {
                    out.call_sites.push(CallSite {
                        name: word.to_string(),
                        path: path.clone(),
                        range: word_range(document, i, word_end),
                    });
                }
            }
        }
        i = word_end;
    }

    collect_variables(scrubbed, &mut out.variables);
    out
}

/// Aggregates symbols over the entry file's transitive import closure.
pub fn extract_global(entry: &Document, root: &Path) -> GlobalScope {
    aggregate_scope(&resolve_files(entry, root))
}

/// Aggregates symbols over an already-resolved document list.
pub fn aggregate_scope(documents: &[Document]) -> GlobalScope {
    let mut scope = GlobalScope::default();
    for document in documents {
        let scrubbed = scrub(document.text());
        let local = extract_local(document, &scrubbed);
        for symbol in local
            .functions
            .into_iter()
            .chain(local.classes)
            .chain(local.scoreboards)
        {
            scope.table.insert(symbol);
        }
        scope.variables.merge(local.variables);
        scope.call_sites.extend(local.call_sites);
        scope.force_kept.extend(local.force_kept);
    }
    scope
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_dotted_byte(b: u8) -> bool {
    is_ident_byte(b) || b == b'.'
}

fn is_word_start(bytes: &[u8], i: usize) -> bool {
    is_ident_start(bytes[i]) && (i == 0 || !is_dotted_byte(bytes[i - 1]))
}

fn dotted_end(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && is_dotted_byte(bytes[end]) {
        end += 1;
    }
    end
}

fn skip_spaces(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && (bytes[i] as char).is_whitespace() {
        i += 1;
    }
    i
}

/// The identifier following a `function`/`class` keyword. For functions the
/// name may be dotted and must be followed by `(`.
fn header_name(bytes: &[u8], after_keyword: usize, expect_paren: bool) -> Option<(usize, usize)> {
    // The keyword must be followed by whitespace, not an identifier tail.
    if after_keyword >= bytes.len() || !(bytes[after_keyword] as char).is_whitespace() {
        return None;
    }
    let name_start = skip_spaces(bytes, after_keyword);
    if name_start >= bytes.len() || !is_ident_start(bytes[name_start]) {
        return None;
    }
    let name_end = if expect_paren {
        dotted_end(bytes, name_start)
    } else {
        let mut end = name_start;
        while end < bytes.len() && is_ident_byte(bytes[end]) {
            end += 1;
        }
        end
    };
    if expect_paren {
        let next = skip_spaces(bytes, name_end);
        if next >= bytes.len() || bytes[next] != b'(' {
            return None;
        }
    }
    Some((name_start, name_end))
}

/// Matches the tail of `scoreboard objectives add <name>`.
fn objective_name(bytes: &[u8], text: &str, after_keyword: usize) -> Option<(usize, usize)> {
    let mut i = after_keyword;
    for expected in ["objectives", "add"] {
        i = skip_spaces(bytes, i);
        let end = dotted_end(bytes, i);
        if &text[i..end] != expected {
            return None;
        }
        i = end;
    }
    let name_start = skip_spaces(bytes, i);
    if name_start >= bytes.len() || !is_ident_start(bytes[name_start]) {
        return None;
    }
    Some((name_start, dotted_end(bytes, name_start)))
}

/// A word is a call site when followed by `(`, unless it is a definition
/// header, a constructor call, a decorator, or a sigiled reference.
fn is_call_site(bytes: &[u8], text: &str, start: usize, end: usize) -> bool {
    let next = skip_spaces(bytes, end);
    if next >= bytes.len() || bytes[next] != b'(' {
        return false;
    }
    if start > 0 {
        let before = bytes[start - 1];
        if before == b'@' || before == b'$' || before == b':' {
            return false;
        }
    }
    let preceding = text[..start].trim_end();
    !(preceding.ends_with("function") || preceding.ends_with("new"))
}

fn word_range(document: &Document, start: usize, end: usize) -> Range {
    Range::new(document.position_at(start), document.position_at(end))
}

/// True when the text before a `function` keyword ends with an `@add`
/// decorator, with or without an argument list.
fn preceded_by_force_keep(text: &str, keyword_start: usize) -> bool {
    let mut before = text[..keyword_start].trim_end();
    if before.ends_with(')') {
        let Some(open) = before.rfind('(') else {
            return false;
        };
        before = before[..open].trim_end();
    }
    before.ends_with("@add")
}

fn collect_variables(scrubbed: &str, variables: &mut VariableSet) {
    let bytes = scrubbed.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'$' => {
                let start = i + 1;
                let end = dotted_end(bytes, start);
                if end > start && is_ident_start(bytes[start]) {
                    variables.scoreboard.insert(scrubbed[start..end].to_string());
                }
                i = end.max(i + 1);
            }
            b':' if bytes.get(i + 1) == Some(&b':') => {
                let start = i + 2;
                let end = dotted_end(bytes, start);
                if end > start && is_ident_start(bytes[start]) {
                    variables.storage.insert(scrubbed[start..end].to_string());
                }
                i = end.max(i + 2);
            }
            _ => i += 1,
        }
    }
}
