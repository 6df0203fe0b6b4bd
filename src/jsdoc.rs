//! Documentary comment tags
//!
//! Reads the `/** ... */` block attached to a declaration and extracts the
//! tags the signature transform consumes: `@param` (and its `@arg`/`@argument`
//! synonyms), `@returns`/`@return`, and the access tags.

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::Node;

use crate::parser::node_text;

static TAG_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@([A-Za-z]+)\b\s*(.*)$").expect("valid tag regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessibility {
    Private,
    Protected,
    Public,
}

impl Accessibility {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "private" => Some(Self::Private),
            "protected" => Some(Self::Protected),
            "public" => Some(Self::Public),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Protected => "protected",
            Self::Public => "public",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamTag {
    /// Possibly dotted: `opts.name`, `users[].id`
    pub name: String,
    pub type_expr: Option<String>,
    /// Written as `[name]` or `[name=default]`
    pub optional: bool,
    pub default: Option<String>,
}

impl ParamTag {
    pub fn is_dotted(&self) -> bool {
        self.name.contains('.')
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocComment {
    pub params: Vec<ParamTag>,
    pub returns: Option<String>,
    pub access: Option<Accessibility>,
}

impl DocComment {
    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.returns.is_none() && self.access.is_none()
    }

    /// Tags that name a whole parameter rather than one of its members
    pub fn top_level_params(&self) -> impl Iterator<Item = &ParamTag> {
        self.params.iter().filter(|tag| !tag.is_dotted())
    }
}

/// Parse the text of one `/** ... */` comment
pub fn parse_doc_comment(text: &str) -> DocComment {
    let body = text
        .trim()
        .trim_start_matches("/**")
        .trim_end_matches("*/");

    // Tag bodies may wrap onto continuation lines
    let mut tags: Vec<(String, String)> = Vec::new();
    for line in body.lines() {
        let line = line.trim().trim_start_matches('*').trim();
        if let Some(caps) = TAG_LINE.captures(line) {
            tags.push((caps[1].to_string(), caps[2].to_string()));
        } else if let Some((_, content)) = tags.last_mut() {
            if !line.is_empty() {
                content.push(' ');
                content.push_str(line);
            }
        }
    }

    let mut doc = DocComment::default();
    for (tag, content) in tags {
        match tag.as_str() {
            "param" | "arg" | "argument" => {
                if let Some(param) = parse_param_tag(&content) {
                    doc.params.push(param);
                }
            }
            "returns" | "return" => {
                if doc.returns.is_none() {
                    doc.returns = take_braced(content.trim()).map(|(ty, _)| ty.to_string());
                }
            }
            "access" => {
                let level = content.split_whitespace().next().unwrap_or_default();
                doc.access = Accessibility::from_tag(level).or(doc.access);
            }
            other => {
                if let Some(access) = Accessibility::from_tag(other) {
                    doc.access = Some(access);
                }
            }
        }
    }
    doc
}

/// Split `{type} rest` into the brace contents and the rest
fn take_braced(text: &str) -> Option<(&str, &str)> {
    let inner = text.strip_prefix('{')?;
    let mut depth = 1usize;
    for (i, c) in inner.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((inner[..i].trim(), &inner[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_param_tag(content: &str) -> Option<ParamTag> {
    let content = content.trim();
    let (type_expr, rest) = match take_braced(content) {
        Some((ty, rest)) => (Some(ty.to_string()), rest.trim_start()),
        None => (None, content),
    };

    let (name, optional, default) = if let Some(bracketed) = rest.strip_prefix('[') {
        let end = bracketed.find(']')?;
        let inner = &bracketed[..end];
        match inner.split_once('=') {
            Some((name, default)) => (name.trim(), true, Some(default.trim().to_string())),
            None => (inner.trim(), true, None),
        }
    } else {
        let name = rest.split_whitespace().next()?;
        (name, false, None)
    };

    let name = name.trim_end_matches([',', ':']);
    if name.is_empty() {
        return None;
    }

    Some(ParamTag {
        name: name.to_string(),
        type_expr,
        optional,
        default,
    })
}

/// Node kinds a doc comment may sit in front of on behalf of a function
const WRAPPER_KINDS: &[&str] = &[
    "variable_declarator",
    "lexical_declaration",
    "variable_declaration",
    "export_statement",
    "pair",
    "assignment_expression",
    "expression_statement",
    "public_field_definition",
];

/// The doc comment directly preceding `node` or the declaration wrapping it
pub fn leading_doc_comment(node: Node, source: &str) -> Option<DocComment> {
    let mut current = node;
    loop {
        let mut previous = current.prev_sibling();
        while let Some(sibling) = previous.filter(|s| s.kind() == "decorator") {
            previous = sibling.prev_sibling();
        }

        if let Some(comment) = previous.filter(|p| p.kind() == "comment") {
            let text = node_text(&comment, source);
            return text.starts_with("/**").then(|| parse_doc_comment(text));
        }

        // only the first declarator of `const a = ..., b = ...` owns the comment
        let later_declarator = current.kind() == "variable_declarator"
            && std::iter::successors(current.prev_named_sibling(), |n| n.prev_named_sibling())
                .any(|n| n.kind() == "variable_declarator");
        if later_declarator {
            return None;
        }

        let parent = current.parent()?;
        if !WRAPPER_KINDS.contains(&parent.kind()) {
            return None;
        }
        current = parent;
    }
}
