use std::sync::OnceLock;

use tree_sitter::{Node, Query, QueryCursor, StreamingIterator, Tree};

use super::languages::Grammar;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// How a module pulls in another module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// ESM static import: `import { X } from './module'` or `import './module'`
    Esm,
    /// CommonJS require: `const X = require('./module')`
    Require,
    /// Dynamic import: `import('./module')`
    Dynamic,
    /// Re-export: `export { X } from './module'` or `export * from './module'`
    ReExport,
}

/// A module specifier found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInfo {
    pub kind: ImportKind,
    /// The raw specifier string, e.g. `"react"` or `"./utils"`.
    pub specifier: String,
    /// Byte offset of the specifier, used to keep source order across query kinds.
    pub offset: usize,
}

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

/// Matches `import X from 'm'`, `import { X } from 'm'`, `import * as X from 'm'`, `import 'm'`.
const ESM_QUERY: &str = r#"
    (import_statement
      source: (string (string_fragment) @module_path))
"#;

/// Note: no #eq? predicate here because tree-sitter 0.26 StreamingIterator does not
/// auto-filter custom predicates. We filter for "require" in code instead.
const REQUIRE_QUERY: &str = r#"
    (call_expression
      function: (identifier) @fn
      arguments: (arguments . (string (string_fragment) @module_path)))
"#;

const DYNAMIC_IMPORT_QUERY: &str = r#"
    (call_expression
      function: (import)
      arguments: (arguments . (string (string_fragment) @module_path)))
"#;

const REEXPORT_QUERY: &str = r#"
    (export_statement
      source: (string (string_fragment) @module_path))
"#;

// ---------------------------------------------------------------------------
// Query cache
// ---------------------------------------------------------------------------

/// Compiled queries for one grammar. A query is bound to the language it was
/// compiled against, so each grammar gets its own set.
struct ImportQueries {
    esm: Query,
    require: Query,
    dynamic: Query,
    reexport: Query,
}

static QUERY_CACHE: [OnceLock<ImportQueries>; 3] = [OnceLock::new(), OnceLock::new(), OnceLock::new()];

fn queries(grammar: Grammar) -> &'static ImportQueries {
    QUERY_CACHE[grammar.index()].get_or_init(|| {
        let language = grammar.language();
        ImportQueries {
            esm: Query::new(&language, ESM_QUERY).expect("invalid import query"),
            require: Query::new(&language, REQUIRE_QUERY).expect("invalid require query"),
            dynamic: Query::new(&language, DYNAMIC_IMPORT_QUERY)
                .expect("invalid dynamic import query"),
            reexport: Query::new(&language, REEXPORT_QUERY).expect("invalid re-export query"),
        }
    })
}

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract every module specifier from a parsed syntax tree, in source order.
pub fn extract_imports(tree: &Tree, source: &[u8], grammar: Grammar) -> Vec<ImportInfo> {
    let queries = queries(grammar);
    let mut imports = Vec::new();

    collect_specifiers(&queries.esm, tree, source, ImportKind::Esm, None, &mut imports);
    collect_specifiers(
        &queries.require,
        tree,
        source,
        ImportKind::Require,
        Some("require"),
        &mut imports,
    );
    collect_specifiers(&queries.dynamic, tree, source, ImportKind::Dynamic, None, &mut imports);
    collect_specifiers(&queries.reexport, tree, source, ImportKind::ReExport, None, &mut imports);

    imports.sort_by_key(|imp| imp.offset);
    imports
}

/// Run one query and push an [`ImportInfo`] per `@module_path` capture.
///
/// When `callee` is set, matches whose `@fn` capture has a different name are dropped.
fn collect_specifiers(
    query: &Query,
    tree: &Tree,
    source: &[u8],
    kind: ImportKind,
    callee: Option<&str>,
    out: &mut Vec<ImportInfo>,
) {
    let Some(module_path_idx) = query.capture_index_for_name("module_path") else {
        return;
    };
    let fn_idx = query.capture_index_for_name("fn");

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source);

    while let Some(m) = matches.next() {
        let mut specifier: Option<Node> = None;
        let mut fn_name: Option<&str> = None;

        for capture in m.captures {
            if capture.index == module_path_idx {
                specifier = Some(capture.node);
            } else if fn_idx == Some(capture.index) {
                fn_name = Some(node_text(capture.node, source));
            }
        }

        if callee.is_some() && fn_name != callee {
            continue;
        }

        if let Some(node) = specifier {
            let text = node_text(node, source);
            if text.is_empty() {
                continue;
            }
            out.push(ImportInfo {
                kind,
                specifier: text.to_owned(),
                offset: node.start_byte(),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
