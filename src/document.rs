use crate::error::JmcError;
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// A zero-based line/column location in a document. Columns are byte offsets
/// within the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Same line, column moved right by `columns`.
    pub fn shifted(self, columns: usize) -> Self {
        Self {
            line: self.line,
            column: self.column + columns,
        }
    }
}

/// A closed line/column span inside a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A span within one line.
    pub fn on_line(line: usize, start_column: usize, end_column: usize) -> Self {
        Self {
            start: Position::new(line, start_column),
            end: Position::new(line, end_column),
        }
    }

    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }

    pub fn intersects(&self, other: &Range) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Where a document's text came from. The entry file under analysis is
/// usually a `LiveBuffer` (possibly unsaved editor state); every other file
/// in the import graph is a `FileSnapshot` read from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOrigin {
    LiveBuffer,
    FileSnapshot,
}

/// A source file plus its line-offset index. Materialized per analysis pass;
/// nothing here is cached across passes.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    origin: DocumentOrigin,
    text: String,
    line_offsets: Vec<usize>,
}

impl Document {
    /// Wraps the host's in-memory buffer for the file currently open.
    pub fn live(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self::build(path.into(), DocumentOrigin::LiveBuffer, text.into())
    }

    /// Snapshots a file from disk.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, JmcError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| JmcError::Io {
            path: path.to_string_lossy().into_owned(),
            source,
        })?;
        Ok(Self::build(
            path.to_path_buf(),
            DocumentOrigin::FileSnapshot,
            text,
        ))
    }

    fn build(path: PathBuf, origin: DocumentOrigin, text: String) -> Self {
        let mut line_offsets = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_offsets.push(i + 1);
            }
        }
        Self {
            path,
            origin,
            text,
            line_offsets,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn origin(&self) -> DocumentOrigin {
        self.origin
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_offsets.len()
    }

    /// The text of line `line` without its trailing line break. Out-of-range
    /// lines are empty rather than a panic.
    pub fn line_at(&self, line: usize) -> &str {
        let Some(&start) = self.line_offsets.get(line) else {
            return "";
        };
        let end = self
            .line_offsets
            .get(line + 1)
            .map_or(self.text.len(), |&next| next);
        self.text[start..end].trim_end_matches(['\n', '\r'])
    }

    /// Maps a byte offset to a line/column position via binary search over
    /// the line-offset index.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = self
            .line_offsets
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        Position::new(line, offset - self.line_offsets[line])
    }

    pub fn offset_at(&self, position: Position) -> usize {
        let line_start = self
            .line_offsets
            .get(position.line)
            .copied()
            .unwrap_or(self.text.len());
        (line_start + position.column).min(self.text.len())
    }

    /// Position just past the last character of line `line`.
    pub fn end_of_line(&self, line: usize) -> Position {
        Position::new(line, self.line_at(line).len())
    }

    /// The full span of line `line`.
    pub fn line_range(&self, line: usize) -> Range {
        Range::new(Position::new(line, 0), self.end_of_line(line))
    }
}

/// Lexically normalizes a path: makes it absolute against the current
/// directory and folds `.`/`..` components. Unlike `canonicalize`, this does
/// not require the file to exist.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// The visited-set key for import traversal: lowercased so that cyclic
/// imports terminate even on case-insensitive filesystems.
pub fn visited_key(path: &Path) -> String {
    normalize_path(path).to_string_lossy().to_lowercase()
}
