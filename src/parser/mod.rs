pub mod imports;
pub mod languages;

use std::cell::RefCell;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tree_sitter::Parser;

use imports::{ImportInfo, extract_imports};
use languages::Grammar;

// Thread-local Parser instances, one per grammar per thread. Dependency walks run on
// tokio's blocking pool, so each worker keeps its own parsers without locking.
thread_local! {
    static PARSERS: RefCell<[Option<Parser>; 3]> = const { RefCell::new([None, None, None]) };
}

/// Parse a module and return the specifiers it imports, in source order.
///
/// # Errors
/// Returns an error if:
/// - The file extension has no grammar (see [`Grammar::for_extension`])
/// - `tree-sitter` returns `None` (malformed / truncated source)
pub fn parse_imports(path: &Path, source: &[u8]) -> Result<Vec<ImportInfo>> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let grammar = Grammar::for_extension(ext)
        .ok_or_else(|| anyhow!("unsupported file extension: {:?}", ext))?;

    let tree = PARSERS.with(|cell| -> Result<_> {
        let mut parsers = cell.borrow_mut();
        let slot = &mut parsers[grammar.index()];
        if slot.is_none() {
            let mut parser = Parser::new();
            parser
                .set_language(&grammar.language())
                .with_context(|| format!("failed to set tree-sitter language for {:?}", grammar))?;
            *slot = Some(parser);
        }
        let parser = slot.as_mut().ok_or_else(|| anyhow!("parser slot empty"))?;
        Ok(parser.parse(source, None))
    })?;
    let tree = tree.ok_or_else(|| anyhow!("tree-sitter returned None for {:?}", path))?;

    Ok(extract_imports(&tree, source, grammar))
}
