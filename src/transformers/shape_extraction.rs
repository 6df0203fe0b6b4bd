//! Shape extraction
//!
//! Turns top-level `PropTypes.shape({...})` bindings into a named type alias
//! plus a typed binding:
//!
//! ```text
//! const user = PropTypes.shape({ id: PropTypes.number });
//! ```
//!
//! becomes
//!
//! ```text
//! type User = {
//!   id?: number;
//! };
//!
//! const user: PropTypes.Requireable<User> | PropTypes.Validator<User> = PropTypes.shape({ id: PropTypes.number });
//! ```
//!
//! Directly exported bindings are re-exported by a separate `export { user };`
//! and a default-exported shape gets a named constant derived from the file
//! name.

use std::collections::HashSet;
use std::path::Path;

use tree_sitter::Node;

use super::Transform;
use crate::config::MigrateConfig;
use crate::core::{Result, SourceFile};
use crate::parser::{has_child_kind, named_children, node_line, node_text};
use crate::patch::Edit;
use crate::types::prop_types::{
    PropTypesReader, PropTypesScope, ShapePattern, DEFAULT_NAMESPACE, PROP_TYPES_MODULE,
};
use crate::types::{TypeDescriptor, TypeRenderer};

pub struct ShapeExtraction;

/// One top-level site that may receive an alias
struct Candidate<'t> {
    statement: Node<'t>,
    kind: SiteKind<'t>,
    pattern: ShapePattern<'t>,
    binding: String,
    alias: String,
}

enum SiteKind<'t> {
    /// `const x = shape(...)`, possibly exported via `export const`
    Variable {
        declaration: Node<'t>,
        declarator: Node<'t>,
        exported: bool,
    },
    /// `export default shape(...)`
    DefaultExport { value: Node<'t> },
}

impl Transform for ShapeExtraction {
    fn name(&self) -> &'static str {
        "shape-extraction"
    }

    fn run(&self, file: &SourceFile, config: &MigrateConfig) -> Result<Vec<Edit>> {
        let root = file.root();
        let source = file.source.as_str();

        let mut scope = PropTypesScope::from_program(root, source);
        if !scope.is_present() {
            log::debug!("{}: no prop-types binding", file.path().display());
            return Ok(Vec::new());
        }

        let candidates = collect_candidates(root, source, &scope, file.path());
        for candidate in &candidates {
            scope
                .shape_aliases
                .insert(candidate.binding.clone(), candidate.alias.clone());
        }

        let mut declared_types = declared_type_names(root, source);
        let declared_values = declared_value_names(root, source);
        let namespace = scope.namespace().unwrap_or(DEFAULT_NAMESPACE).to_string();
        let reader = PropTypesReader::new(&scope, source, config);
        let renderer = TypeRenderer::new(config);

        let mut edits = Vec::new();
        let mut import_injected = scope.namespace().is_some();

        for candidate in &candidates {
            if let SiteKind::Variable { declarator, .. } = &candidate.kind {
                if declarator.child_by_field_name("type").is_some() {
                    log::debug!("{}: already typed", candidate.binding);
                    continue;
                }
            }
            if matches!(candidate.kind, SiteKind::DefaultExport { .. })
                && declared_values.contains(&candidate.binding)
            {
                log::debug!(
                    "{} is already bound; leaving the default export alone",
                    candidate.binding
                );
                continue;
            }
            if !declared_types.insert(candidate.alias.clone()) {
                log::debug!(
                    "Type {} already exists; leaving {} alone",
                    candidate.alias,
                    candidate.binding
                );
                continue;
            }

            let shape = reader.shape_literal(candidate.pattern.object());
            let ty = if candidate.pattern.is_array() {
                TypeDescriptor::array(shape)
            } else {
                shape
            };
            let alias_text = renderer.render_type_alias(&candidate.alias, &ty);
            let annotation = validator_annotation(&namespace, &candidate.alias);

            if !import_injected {
                if let Some(index) = import_insertion_point(root, source) {
                    edits.push(Edit::insert(
                        index,
                        format!("import {} from '{}';\n", DEFAULT_NAMESPACE, PROP_TYPES_MODULE),
                    ));
                }
                import_injected = true;
            }

            log::debug!(
                "Extracting {} from line {}",
                candidate.alias,
                node_line(&candidate.statement)
            );
            match candidate.kind {
                SiteKind::Variable {
                    declaration,
                    declarator,
                    exported,
                } => {
                    edits.push(Edit::insert(
                        attached_comment_start(candidate.statement),
                        format!("{}\n\n", alias_text),
                    ));
                    if exported {
                        edits.push(Edit::delete(
                            candidate.statement.start_byte()..declaration.start_byte(),
                        ));
                    }
                    if let Some(name) = declarator.child_by_field_name("name") {
                        edits.push(Edit::insert(name.end_byte(), format!(": {}", annotation)));
                    }
                    if exported {
                        edits.push(Edit::insert(
                            candidate.statement.end_byte(),
                            format!("\nexport {{ {} }};", candidate.binding),
                        ));
                    }
                }
                SiteKind::DefaultExport { value } => {
                    let statement = candidate.statement;
                    edits.push(Edit::insert(
                        attached_comment_start(statement),
                        format!("{}\n\n", alias_text),
                    ));
                    edits.push(Edit::replace(
                        statement.start_byte()..value.start_byte(),
                        format!("const {}: {} = ", candidate.binding, annotation),
                    ));
                    let terminator = if has_child_kind(&statement, ";") { "" } else { ";" };
                    edits.push(Edit::insert(
                        value.end_byte(),
                        format!(";\nexport default {}{}", candidate.binding, terminator),
                    ));
                }
            }
        }

        Ok(edits)
    }
}

fn validator_annotation(namespace: &str, alias: &str) -> String {
    format!(
        "{ns}.Requireable<{alias}> | {ns}.Validator<{alias}>",
        ns = namespace,
        alias = alias
    )
}

fn collect_candidates<'t>(
    root: Node<'t>,
    source: &str,
    scope: &PropTypesScope,
    path: &Path,
) -> Vec<Candidate<'t>> {
    let mut candidates = Vec::new();

    for statement in named_children(&root) {
        let (declaration, exported) = match statement.kind() {
            "lexical_declaration" | "variable_declaration" => (statement, false),
            "export_statement" => {
                if let Some(declaration) = statement.child_by_field_name("declaration") {
                    (declaration, true)
                } else {
                    if let Some(candidate) = default_export_candidate(statement, source, scope, path)
                    {
                        candidates.push(candidate);
                    }
                    continue;
                }
            }
            _ => continue,
        };
        if !matches!(declaration.kind(), "lexical_declaration" | "variable_declaration") {
            continue;
        }

        let declarators: Vec<_> = named_children(&declaration)
            .into_iter()
            .filter(|n| n.kind() == "variable_declarator")
            .collect();
        let [declarator] = declarators.as_slice() else {
            continue;
        };
        let (Some(name), Some(value)) = (
            declarator.child_by_field_name("name"),
            declarator.child_by_field_name("value"),
        ) else {
            continue;
        };
        if name.kind() != "identifier" {
            continue;
        }
        let Some(pattern) = scope.match_shape_pattern(value, source) else {
            continue;
        };

        let binding = node_text(&name, source).to_string();
        candidates.push(Candidate {
            statement,
            kind: SiteKind::Variable {
                declaration,
                declarator: *declarator,
                exported,
            },
            pattern,
            alias: upper_first(&binding),
            binding,
        });
    }

    candidates
}

fn default_export_candidate<'t>(
    statement: Node<'t>,
    source: &str,
    scope: &PropTypesScope,
    path: &Path,
) -> Option<Candidate<'t>> {
    if !has_child_kind(&statement, "default") {
        return None;
    }
    let value = statement.child_by_field_name("value")?;
    let pattern = scope.match_shape_pattern(value, source)?;
    let base = file_base_name(path);
    Some(Candidate {
        statement,
        kind: SiteKind::DefaultExport { value },
        pattern,
        binding: camel_case(&base),
        alias: pascal_case(&base),
    })
}

/// Names of top-level declarations that occupy a type name, exported or not
fn declared_type_names(root: Node, source: &str) -> HashSet<String> {
    let mut names = HashSet::new();
    for statement in named_children(&root) {
        let declaration = if statement.kind() == "export_statement" {
            statement.child_by_field_name("declaration")
        } else {
            Some(statement)
        };
        if let Some(declaration) = declaration {
            if matches!(
                declaration.kind(),
                "type_alias_declaration"
                    | "interface_declaration"
                    | "class_declaration"
                    | "abstract_class_declaration"
                    | "enum_declaration"
            ) {
                if let Some(name) = declaration.child_by_field_name("name") {
                    names.insert(node_text(&name, source).to_string());
                }
            }
        }
    }
    names
}

/// Names bound as values at the top level: variables, functions, classes,
/// enums and imports
fn declared_value_names(root: Node, source: &str) -> HashSet<String> {
    let mut names = HashSet::new();
    let mut add = |node: Option<Node>| {
        let node = node.filter(|n| matches!(n.kind(), "identifier" | "type_identifier"));
        if let Some(node) = node {
            names.insert(node_text(&node, source).to_string());
        }
    };

    for statement in named_children(&root) {
        let declaration = match statement.kind() {
            "export_statement" => match statement.child_by_field_name("declaration") {
                Some(declaration) => declaration,
                None => continue,
            },
            _ => statement,
        };
        match declaration.kind() {
            "lexical_declaration" | "variable_declaration" => {
                for declarator in named_children(&declaration) {
                    add(declarator.child_by_field_name("name"));
                }
            }
            "function_declaration"
            | "generator_function_declaration"
            | "class_declaration"
            | "abstract_class_declaration"
            | "enum_declaration" => add(declaration.child_by_field_name("name")),
            "import_statement" => {
                for clause in named_children(&declaration)
                    .into_iter()
                    .filter(|n| n.kind() == "import_clause")
                {
                    for part in named_children(&clause) {
                        match part.kind() {
                            "identifier" => add(Some(part)),
                            "namespace_import" => {
                                add(named_children(&part).into_iter().next())
                            }
                            "named_imports" => {
                                for specifier in named_children(&part) {
                                    add(specifier
                                        .child_by_field_name("alias")
                                        .or_else(|| specifier.child_by_field_name("name")));
                                }
                            }
                            _ => {}
                        }
                    }
                }
            }
            _ => {}
        }
    }
    names
}

/// Before the first import or require, after any header comments
fn import_insertion_point(root: Node, source: &str) -> Option<usize> {
    named_children(&root)
        .into_iter()
        .find(|statement| match statement.kind() {
            "import_statement" => true,
            "lexical_declaration" | "variable_declaration" => named_children(statement)
                .iter()
                .filter_map(|d| d.child_by_field_name("value"))
                .any(|value| {
                    value.kind() == "call_expression"
                        && value
                            .child_by_field_name("function")
                            .is_some_and(|f| node_text(&f, source) == "require")
                }),
            _ => false,
        })
        .map(|statement| statement.start_byte())
}

/// Start of the comments sitting directly above `statement`
fn attached_comment_start(statement: Node) -> usize {
    let mut first = statement;
    while let Some(previous) = first.prev_sibling() {
        let adjacent = previous.end_position().row + 1 >= first.start_position().row;
        if previous.kind() != "comment" || !adjacent || !starts_line(previous) {
            break;
        }
        first = previous;
    }
    first.start_byte()
}

/// Not a trailing comment of the node before it
fn starts_line(node: Node) -> bool {
    node.prev_sibling()
        .map_or(true, |p| p.end_position().row < node.start_position().row)
}

fn file_base_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    if stem == "index" {
        if let Some(dir) = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
        {
            return dir.to_string();
        }
    }
    stem.to_string()
}

fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn pascal_case(name: &str) -> String {
    let words: String = name
        .split(|c: char| !c.is_alphanumeric() && c != '$')
        .filter(|word| !word.is_empty())
        .map(upper_first)
        .collect();
    match words.chars().next() {
        None => "Shape".to_string(),
        Some(c) if c.is_ascii_digit() => format!("Shape{}", words),
        Some(_) => words,
    }
}

fn camel_case(name: &str) -> String {
    let pascal = pascal_case(name);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::JsLanguageVariant;
    use crate::parser::parse_source;
    use crate::patch::apply_edits;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn extract_at(path: &str, source: &str) -> String {
        let file =
            parse_source(source, Path::new(path), JsLanguageVariant::Tsx).unwrap();
        let edits = ShapeExtraction
            .run(&file, &MigrateConfig::default())
            .unwrap();
        apply_edits(source, &edits).unwrap()
    }

    fn extract(source: &str) -> String {
        extract_at("shapes.js", source)
    }

    #[test]
    fn test_names() {
        assert_eq!(upper_first("userShape"), "UserShape");
        assert_eq!(pascal_case("user-profile_shape"), "UserProfileShape");
        assert_eq!(camel_case("user-profile"), "userProfile");
        assert_eq!(pascal_case("404"), "Shape404");
        assert_eq!(file_base_name(Path::new("src/card/index.js")), "card");
        assert_eq!(file_base_name(Path::new("src/card-shape.jsx")), "card-shape");
    }

    #[test]
    fn test_basic_shape() {
        let output = extract(indoc! {"
            import PropTypes from 'prop-types';

            const Foo = PropTypes.shape({ a: PropTypes.string, b: PropTypes.number });
        "});
        assert_eq!(
            output,
            indoc! {"
                import PropTypes from 'prop-types';

                type Foo = {
                  a?: string;
                  b?: number;
                };

                const Foo: PropTypes.Requireable<Foo> | PropTypes.Validator<Foo> = PropTypes.shape({ a: PropTypes.string, b: PropTypes.number });
            "}
        );
    }

    #[test]
    fn test_export_is_split() {
        let output = extract(indoc! {"
            import PropTypes from 'prop-types';
            export const bar = PropTypes.shape({ id: PropTypes.number.isRequired });
        "});
        assert_eq!(
            output,
            indoc! {"
                import PropTypes from 'prop-types';
                type Bar = {
                  id: number;
                };

                const bar: PropTypes.Requireable<Bar> | PropTypes.Validator<Bar> = PropTypes.shape({ id: PropTypes.number.isRequired });
                export { bar };
            "}
        );
    }

    #[test]
    fn test_array_of_shape_and_references() {
        let output = extract(indoc! {"
            import PropTypes from 'prop-types';
            const item = PropTypes.shape({ id: PropTypes.string });
            const items = PropTypes.arrayOf(PropTypes.shape({ first: item.isRequired }));
        "});
        assert!(output.contains("type Items = {\n  first: Item;\n}[];"));
        assert!(output.contains(
            "const items: PropTypes.Requireable<Items> | PropTypes.Validator<Items> = PropTypes.arrayOf("
        ));
    }

    #[test]
    fn test_default_export_uses_file_name() {
        let output = extract_at(
            "src/user-card.js",
            indoc! {"
                import PropTypes from 'prop-types';

                export default PropTypes.shape({ name: PropTypes.string });
            "},
        );
        assert_eq!(
            output,
            indoc! {"
                import PropTypes from 'prop-types';

                type UserCard = {
                  name?: string;
                };

                const userCard: PropTypes.Requireable<UserCard> | PropTypes.Validator<UserCard> = PropTypes.shape({ name: PropTypes.string });
                export default userCard;
            "}
        );
    }

    #[test]
    fn test_import_injected_once_for_named_imports() {
        let output = extract(indoc! {"
            // header
            import { shape, string } from 'prop-types';
            const a = shape({ s: string });
            const b = shape({ t: string });
        "});
        assert_eq!(output.matches("import PropTypes from 'prop-types';").count(), 1);
        assert!(output.starts_with("// header\nimport PropTypes from 'prop-types';\nimport { shape"));
        assert!(output.contains("const b: PropTypes.Requireable<B> | PropTypes.Validator<B>"));
    }

    #[test]
    fn test_namespace_alias_is_used() {
        let output = extract(indoc! {"
            const PT = require('prop-types');
            const a = PT.shape({ s: PT.string });
        "});
        assert!(output.contains("const a: PT.Requireable<A> | PT.Validator<A> ="));
        assert!(!output.contains("import PropTypes"));
    }

    #[test]
    fn test_existing_alias_or_annotation_is_left_alone() {
        let source = indoc! {"
            import PropTypes from 'prop-types';
            type Foo = { a?: string };
            const foo = PropTypes.shape({ a: PropTypes.string });
            const bar: PropTypes.Requireable<Bar> = PropTypes.shape({ a: PropTypes.string });
        "};
        assert_eq!(extract(source), source);
    }

    #[test]
    fn test_trailing_comment_stays_on_its_line() {
        let output = extract(indoc! {"
            import PropTypes from 'prop-types';
            const x = 1; // keep me here
            const foo = PropTypes.shape({ a: PropTypes.string });
        "});
        assert_eq!(
            output,
            indoc! {"
                import PropTypes from 'prop-types';
                const x = 1; // keep me here
                type Foo = {
                  a?: string;
                };

                const foo: PropTypes.Requireable<Foo> | PropTypes.Validator<Foo> = PropTypes.shape({ a: PropTypes.string });
            "}
        );
    }

    #[test]
    fn test_class_or_enum_with_alias_name_is_left_alone() {
        let source = indoc! {"
            import PropTypes from 'prop-types';
            class User {}
            export enum Role { Admin }
            const user = PropTypes.shape({ a: PropTypes.string });
            const role = PropTypes.shape({ a: PropTypes.string });
        "};
        assert_eq!(extract(source), source);
    }

    #[test]
    fn test_default_export_name_clash_is_left_alone() {
        let source = indoc! {"
            import PropTypes from 'prop-types';
            const userCard = 1;
            export default PropTypes.shape({ name: PropTypes.string });
        "};
        assert_eq!(extract_at("src/user-card.js", source), source);
    }

    #[test]
    fn test_declared_value_names() {
        let source = indoc! {"
            import React, { useState as useLocal } from 'react';
            import * as utils from './utils';
            export function load() {}
            class Store {}
            let a = 1, b = 2;
        "};
        let file = parse_source(source, Path::new("x.js"), JsLanguageVariant::Tsx).unwrap();
        let names = declared_value_names(file.root(), source);
        for name in ["React", "useLocal", "utils", "load", "Store", "a", "b"] {
            assert!(names.contains(name), "missing {}", name);
        }
        assert!(!names.contains("useState"));
    }

    #[test]
    fn test_without_prop_types_nothing_happens() {
        let source = "const shape = (x) => x;\nconst a = shape({ b: 1 });\n";
        assert_eq!(extract(source), source);
    }

    #[test]
    fn test_doc_comment_stays_with_binding_group() {
        let output = extract(indoc! {"
            import PropTypes from 'prop-types';

            /** A user. */
            const user = PropTypes.shape({ id: PropTypes.number });
        "});
        assert!(output.contains("\n\ntype User = {\n  id?: number;\n};\n\n/** A user. */\nconst user:"));
    }
}
