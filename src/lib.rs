//! Static analysis for JMC datapack sources: import resolution, structural
//! linting, symbol extraction, usage analysis, and compiler-report parsing.

pub mod api;
pub mod blocks;
pub mod catalog;
pub mod compiler;
pub mod decorations;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod imports;
pub mod lint;
#[cfg(feature = "lsp")]
pub mod lsp;
pub mod scrub;
pub mod symbols;
pub mod xref;

pub use api::{analyze_document, analyze_workspace, WorkspaceAnalysis};
pub use catalog::Catalog;
pub use diagnostics::{Diagnostic, DiagnosticsMap, Severity};
pub use document::{Document, Position, Range};
pub use error::JmcError;
