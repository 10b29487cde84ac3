use jmc_core::document::Document;
use jmc_core::imports::{import_edges, resolve_files, ImportKind};
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
fn test_single_import_appends_extension() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "main.jmc", "import \"lib/math\";\nsay hi;\n");
    write(root, "lib/math.jmc", "function Math.abs() {}\n");

    let entry = Document::read(root.join("main.jmc")).unwrap();
    let edges = import_edges(&entry, root);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].kind, ImportKind::Single);
    assert_eq!(edges[0].targets, [root.join("lib/math.jmc")]);

    let files = resolve_files(&entry, root);
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].path(), root.join("main.jmc"));
    assert_eq!(files[1].path(), root.join("lib/math.jmc"));
}

#[test]
fn test_explicit_extension_is_not_doubled() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "main.jmc", "import \"util.jmc\";\n");
    write(root, "util.jmc", "say hi;\n");

    let entry = Document::read(root.join("main.jmc")).unwrap();
    let edges = import_edges(&entry, root);
    assert_eq!(edges[0].targets, [root.join("util.jmc")]);
}

#[test]
fn test_directory_wildcard_is_not_recursive() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "main.jmc", "import \"lib/*\";\n");
    write(root, "lib/a.jmc", "say a;\n");
    write(root, "lib/b.jmc", "say b;\n");
    write(root, "lib/notes.txt", "not a source file\n");
    write(root, "lib/deep/c.jmc", "say c;\n");

    let entry = Document::read(root.join("main.jmc")).unwrap();
    let files = resolve_files(&entry, root);
    let names: Vec<_> = files
        .iter()
        .map(|d| d.path().file_name().unwrap().to_str().unwrap().to_string())
        .collect();
    // Sorted listing order, no recursion into lib/deep, no non-source files.
    assert_eq!(names, ["main.jmc", "a.jmc", "b.jmc"]);
}

#[test]
fn test_root_wildcard_lists_project_root() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "main.jmc", "import \"*\";\n");
    write(root, "extra.jmc", "say extra;\n");
    write(root, "lib/hidden.jmc", "say hidden;\n");

    let entry = Document::read(root.join("main.jmc")).unwrap();
    let files = resolve_files(&entry, root);
    let names: Vec<_> = files
        .iter()
        .map(|d| d.path().file_name().unwrap().to_str().unwrap().to_string())
        .collect();
    // The entry is never duplicated even though "*" matches it.
    assert_eq!(names, ["main.jmc", "extra.jmc"]);
}

#[test]
fn test_cyclic_imports_terminate() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "a.jmc", "import \"b\";\nfunction A.run() {}\n");
    write(root, "b.jmc", "import \"a\";\nfunction B.run() {}\n");

    let entry = Document::read(root.join("a.jmc")).unwrap();
    let files = resolve_files(&entry, root);
    assert_eq!(files.len(), 2);
}

#[test]
fn test_self_import_is_skipped() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "main.jmc", "import \"main\";\nsay hi;\n");

    let entry = Document::read(root.join("main.jmc")).unwrap();
    let files = resolve_files(&entry, root);
    assert_eq!(files.len(), 1);
}

#[test]
fn test_broken_import_is_skipped_silently() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "main.jmc", "import \"missing\";\nsay hi;\n");

    let entry = Document::read(root.join("main.jmc")).unwrap();
    let files = resolve_files(&entry, root);
    assert_eq!(files.len(), 1);
}

#[test]
fn test_live_entry_text_takes_precedence() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "main.jmc", "say stale;\n");
    write(root, "fresh.jmc", "say fresh;\n");

    // Unsaved editor text imports a file the on-disk version does not.
    let entry = Document::live(root.join("main.jmc"), "import \"fresh\";\n");
    let files = resolve_files(&entry, root);
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].text(), "import \"fresh\";\n");
}
