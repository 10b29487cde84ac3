use jmc_core::catalog::Catalog;
use jmc_core::compiler;
use jmc_core::decorations::build_decorations;
use jmc_core::document::Document;
use jmc_core::symbols::extract_global;
use jmc_core::xref::analyze_usage;
use jmc_core::{analyze_workspace, Severity};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

#[test]
fn test_imported_function_resolves_call() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "main.jmc", "import \"lib/clock\";\nfunction boot() { tick(); }\n@add function load() { boot(); }\n");
    write(root, "lib/clock.jmc", "@add function Clock.tick() {}\n");

    let entry = Document::read(root.join("main.jmc")).unwrap();
    let analysis = analyze_workspace(&entry, root, &Catalog::default());

    assert_eq!(analysis.files.len(), 2);
    assert!(analysis.scope.defines_function("Clock.tick"));
    assert_eq!(
        analysis.diagnostic_count(),
        0,
        "{:?}",
        analysis.diagnostics
    );
}

#[test]
fn test_diagnostics_span_multiple_files() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "main.jmc", "import \"lib/bad\";\nsay hi;\n");
    write(root, "lib/bad.jmc", "frobnicate the thing\n");

    let entry = Document::read(root.join("main.jmc")).unwrap();
    let analysis = analyze_workspace(&entry, root, &Catalog::default());

    assert!(analysis.diagnostics_for(&root.join("main.jmc")).is_empty());
    let bad = analysis.diagnostics_for(&root.join("lib/bad.jmc"));
    assert!(!bad.is_empty());
    assert!(bad.iter().all(|d| d.severity == Severity::Error));
}

#[test]
fn test_unused_function_across_files() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "main.jmc", "import \"lib/util\";\n@add function load() { helper(); }\n");
    write(root, "lib/util.jmc", "function Util.helper() {}\nfunction Util.lonely() {}\n");

    let entry = Document::read(root.join("main.jmc")).unwrap();
    let scope = extract_global(&entry, root);

    // Hints attach to the file holding the definition, with call sites from
    // the whole graph taken into account.
    let lib = Document::read(root.join("lib/util.jmc")).unwrap();
    let report = analyze_usage(&lib, &scope, &Catalog::default());
    let names: Vec<_> = report
        .unused_functions
        .iter()
        .map(|h| h.name.as_str())
        .collect();
    assert_eq!(names, ["Util.lonely"]);
}

#[test]
fn test_undefined_call_fades_in_decorations() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "main.jmc", "@add function load() { ghost(); }\n");

    let entry = Document::read(root.join("main.jmc")).unwrap();
    let scope = extract_global(&entry, root);
    let set = build_decorations(&entry, &scope, &Catalog::default());

    assert_eq!(set.fade.len(), 1);
    assert_eq!(set.fade[0].name, "ghost");
    assert!(set.unused.is_empty());
}

#[test]
fn test_compiler_report_overrides_lint() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "main.jmc", "frobnicate now\nsay hi;\n");

    let entry = Document::read(root.join("main.jmc")).unwrap();
    let mut analysis = analyze_workspace(&entry, root, &Catalog::default());
    let lint_count = analysis.diagnostic_count();
    assert!(lint_count > 0);

    let output = "Compiling...\nIn main.jmc:1:1\n    1 | frobnicate now\n    ^^^^^^^^^^\nUnknown token\n";
    let outcome = compiler::parse_report(output, root, &entry);
    analysis.apply_compiler_output(&outcome);

    let diags = analysis.diagnostics_for(&root.join("main.jmc"));
    let on_first_line: Vec<_> = diags.iter().filter(|d| d.range.start.line == 0).collect();
    assert_eq!(on_first_line.len(), 1);
    assert_eq!(on_first_line[0].message, "Unknown token");
    assert_eq!(on_first_line[0].source, "jmc-compiler");
}

#[test]
fn test_live_buffer_shadows_saved_file() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "main.jmc", "frobnicate now\n");

    let entry = Document::live(root.join("main.jmc"), "say hi;\n");
    let analysis = analyze_workspace(&entry, root, &Catalog::default());
    assert_eq!(analysis.diagnostic_count(), 0);
}

#[test]
fn test_ignored_zone_spans_survive_workspace_pass() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "main.jmc",
        "// @ignore(start)\nfrobnicate now\n// @ignore(end)\nsay hi;\n",
    );

    let entry = Document::read(root.join("main.jmc")).unwrap();
    let analysis = analyze_workspace(&entry, root, &Catalog::default());
    assert_eq!(analysis.diagnostic_count(), 0);
    assert_eq!(analysis.decorations.ignore_content.len(), 1);
}
