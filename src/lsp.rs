//! Editor query projections: hover, go-to-definition, signature help, and
//! completion sources. Everything here is a read-only view over the symbol
//! extractor's output and the static catalogs; no state is held between
//! queries.

use crate::catalog::{command_doc, Catalog, NbtType, MC_COMMANDS};
use crate::document::{Document, Position, Range};
use crate::imports::import_edges;
use crate::symbols::{GlobalScope, SymbolKind};
use std::path::{Path, PathBuf};

/// Characters that may appear in a hover word: identifiers, sigils, and
/// selector/position prefixes.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '@' | '~' | '^' | '_' | '.' | ':' | '$')
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoverInfo {
    /// Rendered as a code block by the host.
    pub code: String,
    /// Prose shown under the code block.
    pub detail: Option<String>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub path: PathBuf,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignatureInfo {
    pub label: String,
    pub parameters: Vec<String>,
    pub description: String,
    pub active_parameter: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Builtin,
    Command,
    Function,
    Class,
    Variable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionKind,
    pub detail: String,
}

/// The hover word at `position` and its range on the line. Host columns may
/// land mid-character (UTF-16-derived offsets); the column is clamped back
/// to the nearest char boundary rather than panicking.
pub fn word_at(document: &Document, position: Position) -> Option<(String, Range)> {
    let line = document.line_at(position.line);
    if position.column > line.len() {
        return None;
    }
    let mut column = position.column;
    while column > 0 && !line.is_char_boundary(column) {
        column -= 1;
    }
    let start = line[..column]
        .rfind(|c| !is_word_char(c))
        .map_or(0, |i| i + 1);
    let mut end = line[column..]
        .find(|c| !is_word_char(c))
        .map_or(line.len(), |i| column + i);
    // Keep the colons of `::storage` words, but a trailing key colon
    // (`speed:`) is punctuation, not part of the word.
    while end > start && line[..end].ends_with(':') && !line[start..end].contains("::") {
        end -= 1;
    }
    if start >= end {
        return None;
    }
    Some((
        line[start..end].to_string(),
        Range::on_line(position.line, start, end),
    ))
}

/// Hover resolution order: NBT key, variable, command, built-in snippet,
/// user function or class. First hit wins.
pub fn hover(
    document: &Document,
    position: Position,
    scope: &GlobalScope,
    catalog: &Catalog,
) -> Option<HoverInfo> {
    let (word, range) = word_at(document, position)?;

    if let Some(info) = nbt_key_hover(document, position.line, &word, range) {
        return Some(info);
    }

    if word.starts_with('$') {
        return Some(HoverInfo {
            code: format!("score {word}: Int"),
            detail: Some("Scoreboard variable".to_string()),
            range,
        });
    }
    if word.contains("::") {
        let inferred = storage_assignment_type(document, &word);
        return Some(HoverInfo {
            code: format!("storage {word}: {inferred}"),
            detail: Some("Storage variable".to_string()),
            range,
        });
    }

    if let Some(doc) = command_doc(&word) {
        return Some(HoverInfo {
            code: doc.syntax.to_string(),
            detail: Some(doc.description.to_string()),
            range,
        });
    }

    if let Some(snippet) = catalog.snippets.get(&word) {
        return Some(HoverInfo {
            code: signature_from_snippet(&snippet.body),
            detail: (!snippet.description.is_empty()).then(|| snippet.description.clone()),
            range,
        });
    }

    if let Some(symbol) = scope.table.get(&word) {
        let file = symbol.path.display();
        return Some(match symbol.kind {
            SymbolKind::Class => HoverInfo {
                code: format!("class {word}"),
                detail: Some(format!("User class defined in {file}")),
                range,
            },
            _ => HoverInfo {
                code: format!("function {word}()"),
                detail: Some(format!(
                    "User function defined in {file} at line {}",
                    symbol.line() + 1
                )),
                range,
            },
        });
    }
    None
}

/// `word: value` on the hover line, with the value's NBT family inferred.
/// Sigiled words are variables, not keys.
fn nbt_key_hover(document: &Document, line: usize, word: &str, range: Range) -> Option<HoverInfo> {
    if word.starts_with('$') || word.contains("::") {
        return None;
    }
    let text = document.line_at(line);
    let after_word = &text[range.end.column.min(text.len())..];
    let value = after_word.trim_start().strip_prefix(':')?;
    if value.starts_with(':') {
        return None;
    }
    let mut value = value.trim().trim_end_matches(',').to_string();
    if value.is_empty() {
        // Key at end of line; the value opens on the next one.
        let next = document.line_at(line + 1).trim_start();
        if next.starts_with('{') {
            value = "{".to_string();
        } else if next.starts_with('[') {
            value = "[".to_string();
        }
    }
    Some(HoverInfo {
        code: format!("{word}: {}", NbtType::infer(&value)),
        detail: None,
        range,
    })
}

/// Finds the first `word = value` assignment in the document and infers the
/// value's type, for storage-variable hovers. `Any` when never assigned.
fn storage_assignment_type(document: &Document, word: &str) -> NbtType {
    let text = document.text();
    let mut search = 0;
    while let Some(found) = text[search..].find(word) {
        let start = search + found;
        let after = &text[start + word.len()..];
        search = start + word.len();

        let Some(rest) = after.trim_start().strip_prefix('=') else {
            continue;
        };
        if rest.starts_with('=') {
            continue;
        }
        let value = rest.split(';').next().unwrap_or(rest).trim();
        let token = match value.chars().next() {
            Some('{') => "{",
            Some('[') => "[",
            _ => value.split([',', ' ', '\t']).next().unwrap_or(value),
        };
        return NbtType::infer(token);
    }
    NbtType::Any
}

/// Go-to-definition: an import specifier jumps to the imported file, any
/// other word resolves through the symbol table.
pub fn definition(
    document: &Document,
    position: Position,
    scope: &GlobalScope,
    root: &Path,
) -> Option<Location> {
    for edge in import_edges(document, root) {
        if edge.range.contains(position) {
            let target = edge.targets.first()?;
            return Some(Location {
                path: target.clone(),
                position: Position::new(0, 0),
            });
        }
    }

    let (word, _) = word_at(document, position)?;
    let symbol = scope
        .table
        .get(&word)
        .or_else(|| scope.table.get_by_simple_name(&word))?;
    Some(Location {
        path: symbol.path.clone(),
        position: Position::new(symbol.line(), 0),
    })
}

/// Signature help for a built-in call in progress: the line up to the cursor
/// must end inside `name(...`.
pub fn signature_help(
    document: &Document,
    position: Position,
    catalog: &Catalog,
) -> Option<SignatureInfo> {
    let line = document.line_at(position.line);
    let mut column = position.column.min(line.len());
    while column > 0 && !line.is_char_boundary(column) {
        column -= 1;
    }
    let prefix = &line[..column];

    let open = prefix.rfind('(')?;
    if prefix[open..].contains(')') {
        return None;
    }
    let name_part = prefix[..open].trim_end();
    let name_start = name_part
        .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .map_or(0, |i| i + 1);
    let name = &name_part[name_start..];
    let snippet = catalog.snippets.get(name)?;

    let label = signature_from_snippet(&snippet.body);
    let parameters = params_from_signature(&label);
    let entered_commas = prefix[open..].matches(',').count();
    let active_parameter = entered_commas.min(parameters.len().saturating_sub(1));

    Some(SignatureInfo {
        label,
        parameters,
        description: snippet.description.clone(),
        active_parameter,
    })
}

/// Flattens a snippet body into a readable signature: `${1:name}` becomes
/// `name`, bare `$1` tab stops disappear.
pub fn signature_from_snippet(body: &[String]) -> String {
    let joined = body.join("\n");
    let mut out = String::with_capacity(joined.len());
    let mut chars = joined.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('{') => {
                chars.next();
                let mut inner = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    inner.push(c);
                }
                if let Some((_, placeholder)) = inner.split_once(':') {
                    out.push_str(placeholder);
                }
            }
            Some(d) if d.is_ascii_digit() => {
                while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Parameter names out of a `name(a, b, c)` signature.
pub fn params_from_signature(signature: &str) -> Vec<String> {
    let Some(open) = signature.find('(') else {
        return Vec::new();
    };
    let Some(close) = signature[open..].find(')') else {
        return Vec::new();
    };
    signature[open + 1..open + close]
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// The general completion list: built-in snippets, vanilla commands, then
/// every user function and class in scope.
pub fn completions(scope: &GlobalScope, catalog: &Catalog) -> Vec<CompletionItem> {
    let mut items = Vec::new();
    for (name, _) in catalog.snippets.iter() {
        items.push(CompletionItem {
            label: name.to_string(),
            kind: CompletionKind::Builtin,
            detail: "Built-in function".to_string(),
        });
    }
    for command in MC_COMMANDS {
        items.push(CompletionItem {
            label: command.name.to_string(),
            kind: CompletionKind::Command,
            detail: "Minecraft command".to_string(),
        });
    }
    for symbol in scope.table.symbols() {
        let (kind, noun) = match symbol.kind {
            SymbolKind::Class => (CompletionKind::Class, "User class"),
            _ => (CompletionKind::Function, "User function"),
        };
        items.push(CompletionItem {
            label: symbol.name.clone(),
            kind,
            detail: format!("{noun} ({})", symbol.path.display()),
        });
    }
    items
}

/// Scoreboard variable names for `$` completion.
pub fn scoreboard_completions(scope: &GlobalScope) -> Vec<CompletionItem> {
    scope
        .variables
        .scoreboard
        .iter()
        .map(|name| CompletionItem {
            label: name.clone(),
            kind: CompletionKind::Variable,
            detail: "Scoreboard variable".to_string(),
        })
        .collect()
}

/// Storage path names for `::` completion.
pub fn storage_completions(scope: &GlobalScope) -> Vec<CompletionItem> {
    scope
        .variables
        .storage
        .iter()
        .map(|name| CompletionItem {
            label: name.clone(),
            kind: CompletionKind::Variable,
            detail: "Storage variable".to_string(),
        })
        .collect()
}

/// Relative paths of importable source files under `dir`, for completion
/// inside an import specifier. Skips hidden directories.
pub fn import_path_completions(dir: &Path) -> Vec<String> {
    let mut paths = Vec::new();
    collect_source_paths(dir, Path::new(""), &mut paths);
    paths.sort();
    paths
}

fn collect_source_paths(dir: &Path, prefix: &Path, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let path = entry.path();
        if path.is_dir() {
            if !name.starts_with('.') {
                collect_source_paths(&path, &prefix.join(name), out);
            }
        } else if let Some(stem) = name.strip_suffix(crate::imports::SOURCE_EXTENSION) {
            out.push(prefix.join(stem).to_string_lossy().replace('\\', "/"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SnippetCatalog;
    use crate::symbols::extract_global;

    fn catalog() -> Catalog {
        Catalog::new(
            SnippetCatalog::from_json(
                r#"{ "Timer.add": {
                    "body": ["Timer.add(${1:objective}, ${2:ticks}, ${3:function});"],
                    "description": "Starts a repeating timer."
                } }"#,
            )
            .unwrap(),
        )
    }

    fn scope_of(doc: &Document) -> GlobalScope {
        extract_global(doc, Path::new("/p"))
    }

    #[test]
    fn test_signature_from_snippet() {
        let body = vec!["Timer.add(${1:objective}, ${2:ticks});$0".to_string()];
        assert_eq!(signature_from_snippet(&body), "Timer.add(objective, ticks);");
    }

    #[test]
    fn test_params_from_signature() {
        assert_eq!(
            params_from_signature("Timer.add(objective, ticks)"),
            ["objective", "ticks"]
        );
        assert!(params_from_signature("reload()").is_empty());
    }

    #[test]
    fn test_word_at_includes_sigils() {
        let doc = Document::live("/p/main.jmc", "say ::data.count;\n");
        let (word, range) = word_at(&doc, Position::new(0, 6)).unwrap();
        assert_eq!(word, "::data.count");
        assert_eq!(range, Range::on_line(0, 4, 16));
    }

    #[test]
    fn test_word_at_clamps_mid_character_column() {
        let doc = Document::live("/p/main.jmc", "say über;\n");
        // Column 5 lands on the second byte of the two-byte 'ü'; hosts
        // sending UTF-16-derived columns produce such positions.
        assert!(word_at(&doc, Position::new(0, 5)).is_none());
        assert!(hover(&doc, Position::new(0, 5), &scope_of(&doc), &catalog()).is_none());
        // A clamped column still resolves the word to its left.
        let (word, _) = word_at(&doc, Position::new(0, 3)).unwrap();
        assert_eq!(word, "say");
    }

    #[test]
    fn test_signature_help_mid_character_column() {
        let doc = Document::live("/p/main.jmc", "Timer.add(café, \n");
        // Column 14 is inside the 'é' of the first argument.
        let info = signature_help(&doc, Position::new(0, 14), &catalog()).unwrap();
        assert_eq!(info.active_parameter, 0);
    }

    #[test]
    fn test_hover_command() {
        let doc = Document::live("/p/main.jmc", "say hi;\n");
        let info = hover(&doc, Position::new(0, 1), &scope_of(&doc), &catalog()).unwrap();
        assert!(info.code.contains("say"));
    }

    #[test]
    fn test_hover_scoreboard_variable() {
        let doc = Document::live("/p/main.jmc", "$count += 1;\n");
        let info = hover(&doc, Position::new(0, 2), &scope_of(&doc), &catalog()).unwrap();
        assert_eq!(info.code, "score $count: Int");
    }

    #[test]
    fn test_hover_storage_variable_infers_assignment() {
        let doc = Document::live("/p/main.jmc", "::cfg = {debug: true};\nsay ::cfg;\n");
        let info = hover(&doc, Position::new(1, 6), &scope_of(&doc), &catalog()).unwrap();
        assert_eq!(info.code, format!("storage ::cfg: {}", NbtType::Compound));
    }

    #[test]
    fn test_hover_nbt_key() {
        let doc = Document::live("/p/main.jmc", "::cfg = {\n    speed: 1.5f,\n};\n");
        let info = hover(&doc, Position::new(1, 5), &scope_of(&doc), &catalog()).unwrap();
        assert_eq!(info.code, format!("speed: {}", NbtType::Float));
    }

    #[test]
    fn test_hover_user_function() {
        let doc = Document::live("/p/main.jmc", "function Clock.tick() {}\nClock.tick();\n");
        let info = hover(&doc, Position::new(1, 3), &scope_of(&doc), &catalog()).unwrap();
        assert_eq!(info.code, "function Clock.tick()");
    }

    #[test]
    fn test_definition_by_simple_name() {
        let doc = Document::live("/p/main.jmc", "function Clock.tick() {}\ntick();\n");
        let location =
            definition(&doc, Position::new(1, 1), &scope_of(&doc), Path::new("/p")).unwrap();
        assert_eq!(location.path, PathBuf::from("/p/main.jmc"));
        assert_eq!(location.position.line, 0);
    }

    #[test]
    fn test_signature_help_tracks_active_parameter() {
        let doc = Document::live("/p/main.jmc", "Timer.add(deaths, 20, \n");
        let info = signature_help(&doc, Position::new(0, 22), &catalog()).unwrap();
        assert_eq!(info.parameters.len(), 3);
        assert_eq!(info.active_parameter, 2);
        assert_eq!(info.description, "Starts a repeating timer.");
    }

    #[test]
    fn test_signature_help_ends_after_close() {
        let doc = Document::live("/p/main.jmc", "Timer.add(a, b, c);\n");
        assert!(signature_help(&doc, Position::new(0, 19), &catalog()).is_none());
    }

    #[test]
    fn test_completions_cover_all_sources() {
        let doc = Document::live("/p/main.jmc", "function f() { f(); }\nclass C {}\n$x = 1;\n");
        let scope = scope_of(&doc);
        let items = completions(&scope, &catalog());
        assert!(items.iter().any(|i| i.kind == CompletionKind::Builtin));
        assert!(items.iter().any(|i| i.label == "execute"));
        assert!(items
            .iter()
            .any(|i| i.label == "f" && i.kind == CompletionKind::Function));
        assert!(items
            .iter()
            .any(|i| i.label == "C" && i.kind == CompletionKind::Class));
        assert_eq!(scoreboard_completions(&scope).len(), 1);
    }
}
