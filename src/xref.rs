//! Cross-reference analysis: defined-vs-used function names across the
//! whole import graph.
//!
//! Both signals here are advisory. Call-site matching is lexical, so a
//! function invoked through a composed name looks unused, and a call into a
//! file outside the import graph looks undefined. The host renders these as
//! faded text, not as errors.

use crate::catalog::{Catalog, FUNCTION_EXCEPTIONS};
use crate::diagnostics::find_ignored_zones;
use crate::document::{Document, Range};
use crate::scrub::scrub;
use crate::symbols::{extract_local, GlobalScope, SymbolKind};
use std::collections::BTreeSet;

/// One advisory range plus its hover message.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageHint {
    pub name: String,
    pub range: Range,
    pub message: String,
}

/// Usage signals for a single document, ranges local to that document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageReport {
    pub undefined_calls: Vec<UsageHint>,
    pub unused_functions: Vec<UsageHint>,
}

/// Compares `document`'s call sites and definitions against the aggregated
/// scope. Hints inside ignored zones are dropped.
pub fn analyze_usage(document: &Document, scope: &GlobalScope, catalog: &Catalog) -> UsageReport {
    let scrubbed = scrub(document.text());
    let local = extract_local(document, &scrubbed);
    let zones = find_ignored_zones(document);

    let defined_simple: BTreeSet<&str> = scope
        .table
        .of_kind(SymbolKind::Function)
        .map(|s| s.simple_name())
        .chain(local.functions.iter().map(|s| s.simple_name()))
        .collect();
    let used_simple: BTreeSet<&str> = scope
        .call_sites
        .iter()
        .map(|c| c.simple_name())
        .chain(local.call_sites.iter().map(|c| c.simple_name()))
        .collect();

    let mut report = UsageReport::default();

    for call in &local.call_sites {
        // Deletion helpers are dispatched dynamically; do not second-guess
        // them.
        if call.name.contains("del") {
            continue;
        }
        let simple = call.simple_name();
        if defined_simple.contains(simple)
            || catalog.snippets.contains(&call.name)
            || FUNCTION_EXCEPTIONS
                .iter()
                .any(|k| k.eq_ignore_ascii_case(simple))
        {
            continue;
        }
        if zones.contains(&call.range) {
            continue;
        }
        report.undefined_calls.push(UsageHint {
            name: call.name.clone(),
            range: call.range,
            message: format!("Function '{}' is used but never defined.", call.name),
        });
    }

    for symbol in scope
        .table
        .of_kind(SymbolKind::Function)
        .filter(|s| s.path == document.path())
    {
        let simple = symbol.simple_name();
        if scope.force_kept.contains(simple) || used_simple.contains(simple) {
            continue;
        }
        if zones.contains(&symbol.range) {
            continue;
        }
        report.unused_functions.push(UsageHint {
            name: symbol.name.clone(),
            range: symbol.range,
            message: format!("Function '{}' is declared but never used.", symbol.name),
        });
    }

    report
}
