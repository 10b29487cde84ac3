//! Import statement parsing and multi-file graph traversal.
//!
//! An import is a line of the form `import "specifier";`. Three specifier
//! shapes exist:
//!
//! * `"lib/math"` pulls in a single file, with `.jmc` appended when missing.
//! * `"lib/*"` pulls in every `.jmc` file directly inside that directory,
//!   resolved against the importing file.
//! * `"*"` pulls in every `.jmc` file directly inside the workspace root.
//!
//! Traversal is depth-first from the entry file. The visited set is keyed by
//! the lowercased normalized path so that cyclic imports terminate on
//! case-insensitive filesystems too. Broken imports are silently skipped;
//! missing files are not this scanner's diagnostic to raise.

use crate::document::{visited_key, Document, Range};
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const SOURCE_EXTENSION: &str = ".jmc";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import "lib/math";`
    Single,
    /// `import "lib/*";`
    DirWildcard,
    /// `import "*";`
    RootWildcard,
}

/// One parsed import statement and the files it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportEdge {
    /// The raw specifier between the quotes.
    pub specifier: String,
    pub kind: ImportKind,
    /// Span of the whole statement on its line.
    pub range: Range,
    /// Files the specifier resolved to, in listing order. Empty when the
    /// target does not exist.
    pub targets: Vec<PathBuf>,
}

/// Parses every import statement of `document` and resolves each specifier
/// against the importing file's directory (or `root` for `"*"`).
pub fn import_edges(document: &Document, root: &Path) -> Vec<ImportEdge> {
    let file_dir = document
        .path()
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut edges = Vec::new();
    for line in 0..document.line_count() {
        let text = document.line_at(line);
        let Some((specifier, range)) = parse_import_line(text, line) else {
            continue;
        };

        let (kind, targets) = if let Some(dir) = specifier.strip_suffix("/*") {
            (ImportKind::DirWildcard, list_sources(&file_dir.join(dir)))
        } else if specifier == "*" {
            (ImportKind::RootWildcard, list_sources(root))
        } else {
            let mut target = specifier.clone();
            if !target.ends_with(SOURCE_EXTENSION) {
                target.push_str(SOURCE_EXTENSION);
            }
            let path = file_dir.join(target);
            let targets = if path.is_file() { vec![path] } else { Vec::new() };
            (ImportKind::Single, targets)
        };

        edges.push(ImportEdge {
            specifier,
            kind,
            range,
            targets,
        });
    }
    edges
}

/// Matches `import "specifier"` at the start of a line, leading whitespace
/// allowed. Returns the specifier and the span from the keyword through the
/// closing quote.
fn parse_import_line(text: &str, line: usize) -> Option<(String, Range)> {
    let indent = text.len() - text.trim_start().len();
    let rest = &text[indent..];
    let rest = rest.strip_prefix("import")?;
    // Keyword must be followed by whitespace, not an identifier tail.
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let after_keyword = rest.trim_start();
    let quoted = after_keyword.strip_prefix('"')?;
    let close = quoted.find('"')?;
    let specifier = quoted[..close].to_string();

    let end_column = indent + (text[indent..].len() - after_keyword.len()) + close + 2;
    Some((specifier, Range::on_line(line, indent, end_column)))
}

/// The `.jmc` files directly inside `dir`, sorted by name so traversal order
/// does not depend on directory iteration order. Unreadable directories
/// resolve to nothing.
fn list_sources(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.ends_with(SOURCE_EXTENSION))
        })
        .collect();
    files.sort();
    files
}

/// Snapshots the transitive import closure of `entry`, depth-first, entry
/// first. The entry document is used as given (it may hold unsaved editor
/// text); every other file is read from disk. Cycles and case-variant
/// respellings of an already-visited path are skipped.
pub fn resolve_files(entry: &Document, root: &Path) -> Vec<Document> {
    let mut visited = HashSet::new();
    let mut ordered = Vec::new();
    visited.insert(visited_key(entry.path()));
    traverse(entry, root, &mut visited, &mut ordered);

    let mut documents = vec![entry.clone()];
    documents.extend(ordered);
    documents
}

fn traverse(
    document: &Document,
    root: &Path,
    visited: &mut HashSet<String>,
    ordered: &mut Vec<Document>,
) {
    for edge in import_edges(document, root) {
        for target in &edge.targets {
            if !visited.insert(visited_key(target)) {
                continue;
            }
            match Document::read(target) {
                Ok(imported) => {
                    traverse(&imported, root, visited, ordered);
                    ordered.push(imported);
                }
                Err(error) => {
                    debug!("skipping unreadable import '{}': {error}", target.display());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_import() {
        let doc = Document::live("/p/main.jmc", "  import \"lib/math\";\nsay hi;\n");
        let edges = import_edges(&doc, Path::new("/p"));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].specifier, "lib/math");
        assert_eq!(edges[0].kind, ImportKind::Single);
        // Span runs from the keyword through the closing quote, exclusive.
        assert_eq!(edges[0].range, Range::on_line(0, 2, 19));
        // Nothing on disk, so the edge resolves to no targets.
        assert!(edges[0].targets.is_empty());
    }

    #[test]
    fn test_wildcard_kinds() {
        let doc = Document::live(
            "/p/main.jmc",
            "import \"lib/*\";\nimport \"*\";\n",
        );
        let edges = import_edges(&doc, Path::new("/p"));
        assert_eq!(edges[0].kind, ImportKind::DirWildcard);
        assert_eq!(edges[1].kind, ImportKind::RootWildcard);
    }

    #[test]
    fn test_non_import_lines_are_skipped() {
        let doc = Document::live(
            "/p/main.jmc",
            "importantvar = 1;\nsay \"import \\\"x\\\"\";\nfunction importer() {}\n",
        );
        assert!(import_edges(&doc, Path::new("/p")).is_empty());
    }

    #[test]
    fn test_resolve_starts_with_entry() {
        let doc = Document::live("/nowhere/main.jmc", "say hi;\n");
        let files = resolve_files(&doc, Path::new("/nowhere"));
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path(), Path::new("/nowhere/main.jmc"));
    }
}
