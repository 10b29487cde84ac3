//! The high-level analysis entry points.
//!
//! Hosts call [`analyze_workspace`] with the entry document, usually a live
//! editor buffer, and a project root. The result bundles everything an
//! editor session needs: diagnostics per file, the aggregated symbol scope,
//! and decoration ranges for the entry file. Compiler output, when the host
//! has run the external compiler, is folded in afterwards with
//! [`WorkspaceAnalysis::apply_compiler_output`].

use crate::catalog::Catalog;
use crate::compiler::{self, CompilerOutcome};
use crate::decorations::{build_decorations, DecorationSet};
use crate::diagnostics::{Diagnostic, DiagnosticsMap};
use crate::document::{normalize_path, Document};
use crate::imports::resolve_files;
use crate::lint::{lint_document, LintContext};
use crate::symbols::{aggregate_scope, GlobalScope};
use std::path::{Path, PathBuf};

/// Everything derived from one pass over the entry file's import closure.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceAnalysis {
    /// Files in resolution order, entry first.
    pub files: Vec<PathBuf>,
    /// Symbols, variables, and call sites aggregated over all files.
    pub scope: GlobalScope,
    /// Lint diagnostics keyed by normalized file path.
    pub diagnostics: DiagnosticsMap,
    /// Decoration ranges for the entry document.
    pub decorations: DecorationSet,
}

impl WorkspaceAnalysis {
    /// Diagnostics for one file, empty when the file is clean or unknown.
    pub fn diagnostics_for(&self, path: &Path) -> &[Diagnostic] {
        self.diagnostics
            .get(&normalize_path(path))
            .map_or(&[], Vec::as_slice)
    }

    pub fn diagnostic_count(&self) -> usize {
        self.diagnostics.values().map(Vec::len).sum()
    }

    /// Folds one compiler run into the diagnostics. On any line the
    /// compiler reported, its finding replaces the linter's.
    pub fn apply_compiler_output(&mut self, outcome: &CompilerOutcome) {
        let lint = std::mem::take(&mut self.diagnostics);
        self.diagnostics = compiler::merge_with_lint(lint, outcome);
    }
}

/// Analyzes the workspace reachable from `entry`. The entry document's own
/// text takes precedence over whatever is on disk at its path; every other
/// file is read fresh.
pub fn analyze_workspace(entry: &Document, root: &Path, catalog: &Catalog) -> WorkspaceAnalysis {
    let documents = resolve_files(entry, root);
    let scope = aggregate_scope(&documents);

    let ctx = LintContext {
        catalog,
        scope: &scope,
        root,
    };
    let mut diagnostics = DiagnosticsMap::new();
    for document in &documents {
        let found = lint_document(document, &ctx);
        if !found.is_empty() {
            diagnostics.insert(normalize_path(document.path()), found);
        }
    }

    let decorations = build_decorations(entry, &scope, catalog);

    WorkspaceAnalysis {
        files: documents
            .iter()
            .map(|d| normalize_path(d.path()))
            .collect(),
        scope,
        diagnostics,
        decorations,
    }
}

/// Lints a single document against an existing scope, without re-resolving
/// imports. Used for fast re-lint on keystroke when the import graph is
/// unchanged.
pub fn analyze_document(
    document: &Document,
    scope: &GlobalScope,
    root: &Path,
    catalog: &Catalog,
) -> Vec<Diagnostic> {
    let ctx = LintContext {
        catalog,
        scope,
        root,
    };
    lint_document(document, &ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_file_workspace() {
        let doc = Document::live("/p/main.jmc", "function f() { f(); }\nsay hi;\n");
        let analysis = analyze_workspace(&doc, Path::new("/p"), &Catalog::default());
        assert_eq!(analysis.files, [PathBuf::from("/p/main.jmc")]);
        assert_eq!(analysis.diagnostic_count(), 0);
        assert!(analysis.scope.defines_function("f"));
    }

    #[test]
    fn test_diagnostics_keyed_by_file() {
        let doc = Document::live("/p/main.jmc", "nonsense stuff here\n");
        let analysis = analyze_workspace(&doc, Path::new("/p"), &Catalog::default());
        assert!(!analysis.diagnostics_for(Path::new("/p/main.jmc")).is_empty());
        assert!(analysis.diagnostics_for(Path::new("/p/other.jmc")).is_empty());
    }

    #[test]
    fn test_compiler_output_overrides_lint_lines() {
        let doc = Document::live("/p/main.jmc", "nonsense stuff here\n");
        let mut analysis = analyze_workspace(&doc, Path::new("/p"), &Catalog::default());
        assert!(analysis.diagnostic_count() > 0);

        let output = "In main.jmc:1:1\nCompiler disagrees\n";
        let outcome = compiler::parse_report(output, Path::new("/p"), &doc);
        analysis.apply_compiler_output(&outcome);

        let diags = analysis.diagnostics_for(Path::new("/p/main.jmc"));
        assert!(diags.iter().all(|d| d.range.start.line != 0 || d.source == "jmc-compiler"));
        assert!(diags.iter().any(|d| d.message == "Compiler disagrees"));
    }
}
