use tree_sitter::Language;

/// The tree-sitter grammars module sources are parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    TypeScript,
    Tsx,
    JavaScript,
}

impl Grammar {
    /// Every grammar, in the order used to index per-grammar caches.
    pub const ALL: [Grammar; 3] = [Grammar::TypeScript, Grammar::Tsx, Grammar::JavaScript];

    /// Grammar for a file extension, or `None` when the file is not a module we can parse
    /// (`.json`, `.node`, stylesheets...).
    ///
    /// - `.ts`/`.mts`/`.cts` -> TypeScript grammar
    /// - `.tsx` -> TSX grammar. The TypeScript grammar cannot parse JSX and the TSX grammar
    ///   breaks angle-bracket type assertions (`<T>expr`), so the two must not be mixed.
    /// - `.js`/`.jsx`/`.mjs`/`.cjs` -> JavaScript grammar
    pub fn for_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" | "mts" | "cts" => Some(Grammar::TypeScript),
            "tsx" => Some(Grammar::Tsx),
            "js" | "jsx" | "mjs" | "cjs" => Some(Grammar::JavaScript),
            _ => None,
        }
    }

    pub fn language(self) -> Language {
        match self {
            Grammar::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Grammar::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Grammar::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Grammar::TypeScript => 0,
            Grammar::Tsx => 1,
            Grammar::JavaScript => 2,
        }
    }
}
