use std::path::{Path, PathBuf};

/// Grammar flavour used to parse a source file
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JsLanguageVariant {
    /// Plain TypeScript (`.ts`, `.mts`, `.cts`)
    TypeScript,
    /// TSX grammar, also used for JS and JSX inputs
    Tsx,
}

impl JsLanguageVariant {
    /// Map a file extension to the grammar that can read it after migration
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" | "js" | "jsx" | "mjs" | "cjs" => Some(Self::Tsx),
            _ => None,
        }
    }
}

/// A parsed source file, the read-only input every transform works on
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub tree: tree_sitter::Tree,
    pub source: String,
    pub path: PathBuf,
    pub variant: JsLanguageVariant,
}

impl SourceFile {
    pub fn root(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
