//! Tree-sitter parser integration
//!
//! Every input is parsed with a `tree-sitter-typescript` grammar. JS and JSX
//! go through the TSX grammar so that a file this tool already annotated
//! parses the same way on the next run.

use crate::core::{Error, JsLanguageVariant, Result, SourceFile};
use std::path::Path;
use tree_sitter::{Language as TsLanguage, Node, Parser, Tree};

/// Get the tree-sitter language for a variant
fn get_language(variant: JsLanguageVariant) -> TsLanguage {
    match variant {
        JsLanguageVariant::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        JsLanguageVariant::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
    }
}

/// Parse source code into a tree-sitter AST
pub fn parse_source(content: &str, path: &Path, variant: JsLanguageVariant) -> Result<SourceFile> {
    let tree = parse_tree(content, variant).ok_or_else(|| {
        Error::parse(path, "tree-sitter returned no tree")
    })?;

    Ok(SourceFile {
        tree,
        path: path.to_path_buf(),
        source: content.to_string(),
        variant,
    })
}

/// Parse a detached snippet, used for raw type/shape expressions
pub(crate) fn parse_tree(content: &str, variant: JsLanguageVariant) -> Option<Tree> {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&get_language(variant)) {
        log::warn!("Failed to set tree-sitter language: {}", e);
        return None;
    }
    parser.parse(content, None)
}

/// Determine language variant from file path
pub fn detect_variant(path: &Path) -> JsLanguageVariant {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(JsLanguageVariant::from_extension)
        .unwrap_or(JsLanguageVariant::Tsx)
}

/// Check if a parse tree has errors
pub fn has_parse_errors(tree: &Tree) -> bool {
    tree.root_node().has_error()
}

/// Get text for a tree-sitter node
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// Get the line number for a tree-sitter node (1-indexed)
pub fn node_line(node: &Node) -> usize {
    node.start_position().row + 1
}

/// Named children of a node, collected so callers can index and iterate freely
pub fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Whether any direct child (named or not) has the given kind
pub fn has_child_kind(node: &Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == kind);
    found
}

/// Strip the quotes from a string literal node's text
pub fn string_value(node: &Node, source: &str) -> String {
    node_text(node, source)
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_detect_variant() {
        assert_eq!(
            detect_variant(Path::new("test.js")),
            JsLanguageVariant::Tsx
        );
        assert_eq!(
            detect_variant(Path::new("test.ts")),
            JsLanguageVariant::TypeScript
        );
        assert_eq!(
            detect_variant(Path::new("test.tsx")),
            JsLanguageVariant::Tsx
        );
        assert_eq!(detect_variant(Path::new("Makefile")), JsLanguageVariant::Tsx);
    }

    #[test]
    fn test_parse_javascript_with_jsx() {
        let source = "const App = () => <div>Hello</div>;";
        let path = PathBuf::from("test.jsx");
        let file = parse_source(source, &path, JsLanguageVariant::Tsx).unwrap();
        assert!(!has_parse_errors(&file.tree));
    }

    #[test]
    fn test_parse_annotated_output() {
        let source = "function hello(name: string): string { return name; }";
        let path = PathBuf::from("test.js");
        let file = parse_source(source, &path, detect_variant(&path)).unwrap();
        assert!(!has_parse_errors(&file.tree));
    }

    #[test]
    fn test_node_text() {
        let source = "const x = 42;";
        let path = PathBuf::from("test.js");
        let file = parse_source(source, &path, JsLanguageVariant::Tsx).unwrap();

        let root = file.tree.root_node();
        assert_eq!(node_text(&root, &file.source), source);
        assert_eq!(node_line(&root), 1);
    }

    #[test]
    fn test_string_value() {
        let source = "import x from 'prop-types';";
        let path = PathBuf::from("test.js");
        let file = parse_source(source, &path, JsLanguageVariant::Tsx).unwrap();
        let import = file.root().named_child(0).unwrap();
        let src = import.child_by_field_name("source").unwrap();
        assert_eq!(string_value(&src, source), "prop-types");
    }
}
