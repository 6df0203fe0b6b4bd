//! Documentary type expression parser
//!
//! Recursive descent over the informal JSDoc/Closure type grammar:
//!
//! ```text
//! binding  := '...'? union
//! union    := '|'? postfix ('|' postfix)*
//! postfix  := prefix ('[]' | '?' | '!' | '=')*
//! prefix   := '?' postfix | '!' prefix | '...' postfix | primary
//! primary  := '*' | '(' union ')' | arrow | record | literal
//!           | 'function' '(' params ')' (':' union)?
//!           | name ('.'? '<' union (',' union)* '>')?
//! ```
//!
//! Anything the grammar does not cover is passed through verbatim as
//! [`TypeDescriptor::Opaque`] when its brackets balance, and becomes
//! [`TypeDescriptor::Unknown`] otherwise.

use indexmap::IndexMap;

use super::descriptor::{IndexKey, Member, Param, Primitive, TypeDescriptor};
use crate::config::MigrateConfig;

/// A type as written at a declaration site, with binding-level markers split off
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBinding {
    pub ty: TypeDescriptor,
    /// Trailing `=` marker
    pub optional: bool,
    /// Leading `...` marker; `ty` is already the collected array type
    pub rest: bool,
}

/// Parse a type expression; `T=` comes back wrapped in `Optional`
pub fn parse_type(raw: &str, config: &MigrateConfig) -> TypeDescriptor {
    let binding = parse_binding_type(raw, config);
    if binding.optional {
        TypeDescriptor::optional(binding.ty)
    } else {
        binding.ty
    }
}

/// Parse a type expression found on a parameter or member
pub fn parse_binding_type(raw: &str, config: &MigrateConfig) -> ParsedBinding {
    let trimmed = raw.trim();
    let fallback = |ty| ParsedBinding {
        ty,
        optional: false,
        rest: false,
    };

    if trimmed.is_empty() {
        return fallback(TypeDescriptor::Unknown);
    }

    let Some(tokens) = tokenize(trimmed) else {
        log::debug!("Unreadable type expression {:?}", trimmed);
        return fallback(TypeDescriptor::Unknown);
    };

    let mut parser = GrammarParser {
        tokens,
        pos: 0,
        config,
    };
    match parser.parse_binding() {
        Some(binding) if parser.at_end() => binding,
        _ if brackets_balance(trimmed) => {
            log::debug!("Passing through untranslated type {:?}", trimmed);
            fallback(TypeDescriptor::Opaque(trimmed.to_string()))
        }
        _ => fallback(TypeDescriptor::Unknown),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(String),
    Punct(&'static str),
}

const PUNCTUATION: &[&str] = &[
    "...", "=>", "?", "!", "=", "*", "|", "(", ")", "[", "]", "<", ">", "{", "}", ",", ":", ";",
    ".",
];

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn tokenize(input: &str) -> Option<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if is_ident_start(c) {
            let start = i;
            while i < chars.len() {
                if is_ident_char(chars[i]) {
                    i += 1;
                } else if chars[i] == '.' && chars.get(i + 1).copied().is_some_and(is_ident_start)
                {
                    // qualified name: `ns.Type`
                    i += 1;
                } else {
                    break;
                }
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
        } else if c.is_ascii_digit()
            || (c == '-' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()))
        {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                i += 1;
            }
            tokens.push(Token::Num(chars[start..i].iter().collect()));
        } else if c == '\'' || c == '"' {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i] != c {
                if chars[i] == '\\' {
                    i += 1;
                }
                i += 1;
            }
            if i >= chars.len() {
                return None;
            }
            i += 1;
            tokens.push(Token::Str(chars[start..i].iter().collect()));
        } else {
            let rest: String = chars[i..chars.len().min(i + 3)].iter().collect();
            let punct = PUNCTUATION.iter().find(|p| rest.starts_with(**p))?;
            i += punct.chars().count();
            tokens.push(Token::Punct(*punct));
        }
    }

    Some(tokens)
}

fn brackets_balance(input: &str) -> bool {
    let mut stack = Vec::new();
    for c in input.chars() {
        match c {
            '(' | '[' | '{' | '<' => stack.push(c),
            ')' | ']' | '}' | '>' => {
                let open = match c {
                    ')' => '(',
                    ']' => '[',
                    '}' => '{',
                    _ => '<',
                };
                if stack.pop() != Some(open) {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty()
}

struct GrammarParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    config: &'a MigrateConfig,
}

impl GrammarParser<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_is(&self, punct: &str) -> bool {
        self.peek_nth_is(0, punct)
    }

    fn peek_nth_is(&self, n: usize, punct: &str) -> bool {
        matches!(self.tokens.get(self.pos + n), Some(Token::Punct(p)) if *p == punct)
    }

    fn eat(&mut self, punct: &str) -> bool {
        if self.peek_is(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) -> Option<()> {
        self.eat(punct).then_some(())
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    /// Whether the next token ends the current type (used for bare `?`)
    fn at_type_end(&self) -> bool {
        match self.peek() {
            None => true,
            Some(Token::Punct(p)) => matches!(*p, "," | ")" | "|" | ">" | "]" | "}" | "=" | ";"),
            _ => false,
        }
    }

    fn parse_binding(&mut self) -> Option<ParsedBinding> {
        let rest = self.eat("...");
        let (ty, optional) = self.parse_union()?.split_optional();
        let ty = if rest { TypeDescriptor::array(ty) } else { ty };
        Some(ParsedBinding { ty, optional, rest })
    }

    fn parse_union(&mut self) -> Option<TypeDescriptor> {
        self.eat("|");
        let mut variants = vec![self.parse_postfix()?];
        while self.eat("|") {
            variants.push(self.parse_postfix()?);
        }
        if variants.len() == 1 {
            variants.pop()
        } else {
            Some(TypeDescriptor::Union(variants))
        }
    }

    fn parse_postfix(&mut self) -> Option<TypeDescriptor> {
        let mut ty = self.parse_prefix()?;
        loop {
            if self.peek_is("[") && self.peek_nth_is(1, "]") {
                self.pos += 2;
                ty = TypeDescriptor::array(ty);
            } else if self.eat("?") {
                ty = TypeDescriptor::nullable(ty);
            } else if self.eat("!") {
                // non-null marker: the type itself is unchanged
            } else if self.eat("=") {
                ty = TypeDescriptor::optional(ty);
            } else {
                return Some(ty);
            }
        }
    }

    fn parse_prefix(&mut self) -> Option<TypeDescriptor> {
        if self.eat("?") {
            if self.at_type_end() {
                return Some(TypeDescriptor::Unknown);
            }
            // `?T=` is an optional nullable, not a nullable optional
            return Some(match self.parse_postfix()?.split_optional() {
                (inner, true) => TypeDescriptor::optional(TypeDescriptor::nullable(inner)),
                (inner, false) => TypeDescriptor::nullable(inner),
            });
        }
        if self.eat("!") {
            return self.parse_prefix();
        }
        if self.eat("...") {
            return Some(TypeDescriptor::array(self.parse_postfix()?));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Option<TypeDescriptor> {
        match self.next()? {
            Token::Punct("*") => Some(TypeDescriptor::Unknown),
            Token::Punct("(") => {
                if self.is_arrow_function() {
                    return self.parse_arrow_function();
                }
                let inner = self.parse_union()?;
                self.expect(")")?;
                Some(inner)
            }
            Token::Punct("{") => self.parse_record(),
            Token::Str(text) | Token::Num(text) => Some(TypeDescriptor::Literal(text)),
            Token::Ident(name) if name == "function" && self.peek_is("(") => {
                self.parse_closure_function()
            }
            Token::Ident(name) => self.parse_named(name),
            Token::Punct(_) => None,
        }
    }

    /// Having consumed `(`, check whether the matching `)` is followed by `=>`
    fn is_arrow_function(&self) -> bool {
        let mut depth = 1usize;
        let mut i = self.pos;
        while let Some(token) = self.tokens.get(i) {
            match token {
                Token::Punct("(") => depth += 1,
                Token::Punct(")") => {
                    depth -= 1;
                    if depth == 0 {
                        return matches!(self.tokens.get(i + 1), Some(Token::Punct("=>")));
                    }
                }
                _ => {}
            }
            i += 1;
        }
        false
    }

    fn parse_arrow_function(&mut self) -> Option<TypeDescriptor> {
        let mut params = Vec::new();
        if !self.peek_is(")") {
            loop {
                let rest = self.eat("...");
                let name = match self.next()? {
                    Token::Ident(name) => name,
                    _ => return None,
                };
                let optional = self.eat("?");
                let ty = if self.eat(":") {
                    self.parse_union()?
                } else {
                    TypeDescriptor::Unknown
                };
                params.push(Param {
                    name: Some(name),
                    ty,
                    optional,
                    rest,
                });
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect(")")?;
        self.expect("=>")?;
        let ret = self.parse_union()?;
        Some(function_type(params, ret))
    }

    fn parse_closure_function(&mut self) -> Option<TypeDescriptor> {
        self.expect("(")?;
        let mut params = Vec::new();
        if !self.peek_is(")") {
            loop {
                let is_context = matches!(self.peek(), Some(Token::Ident(n)) if n == "this" || n == "new")
                    && self.peek_nth_is(1, ":");
                if is_context {
                    // `this:` and `new:` describe the receiver, not a parameter
                    self.pos += 2;
                    self.parse_union()?;
                } else {
                    let rest = self.eat("...");
                    let (ty, optional) = self.parse_union()?.split_optional();
                    params.push(Param {
                        name: None,
                        ty: if rest { TypeDescriptor::array(ty) } else { ty },
                        optional,
                        rest,
                    });
                }
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect(")")?;
        let ret = if self.eat(":") {
            self.parse_union()?
        } else {
            TypeDescriptor::Unknown
        };
        Some(function_type(params, ret))
    }

    fn parse_record(&mut self) -> Option<TypeDescriptor> {
        let mut members = IndexMap::new();
        while !self.peek_is("}") {
            let key = match self.next()? {
                Token::Ident(name) | Token::Num(name) => name,
                Token::Str(quoted) => quoted[1..quoted.len() - 1].to_string(),
                Token::Punct(_) => return None,
            };
            let optional_key = self.eat("?");
            let ty = if self.eat(":") {
                self.parse_union()?
            } else {
                TypeDescriptor::Unknown
            };
            let (ty, optional) = ty.split_optional();
            members.insert(key, Member::new(ty, optional || optional_key));
            if !self.eat(",") && !self.eat(";") {
                break;
            }
        }
        self.expect("}")?;
        Some(TypeDescriptor::Object(members))
    }

    fn parse_named(&mut self, name: String) -> Option<TypeDescriptor> {
        let args = if self.peek_is(".") && self.peek_nth_is(1, "<") {
            self.pos += 2;
            Some(self.parse_type_arguments()?)
        } else if self.eat("<") {
            Some(self.parse_type_arguments()?)
        } else {
            None
        };
        Some(self.resolve_named(&name, args))
    }

    fn parse_type_arguments(&mut self) -> Option<Vec<TypeDescriptor>> {
        let mut args = Vec::new();
        if !self.peek_is(">") {
            loop {
                args.push(self.parse_union()?);
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect(">")?;
        Some(args)
    }

    fn resolve_named(&self, name: &str, args: Option<Vec<TypeDescriptor>>) -> TypeDescriptor {
        let mut args = args.unwrap_or_default();

        if matches!(name, "any" | "mixed") {
            return TypeDescriptor::Unknown;
        }

        // `Object<string, T>` is a map regardless of what `Object` is aliased to
        if name.eq_ignore_ascii_case("object") && args.len() == 2 {
            if let Some(key) = index_key(&args[0]) {
                return TypeDescriptor::IndexSignature {
                    key,
                    value: Box::new(args.remove(1)),
                };
            }
        }

        let mut name = name.to_string();
        if let Some(mapping) = self.config.lookup_type(&name) {
            if !mapping.accepts_type_arguments() {
                args.clear();
            }
            name = mapping.target().to_string();
        }

        if let Some(primitive) = Primitive::from_keyword(&name) {
            return TypeDescriptor::Primitive(primitive);
        }

        if name == "Array" {
            return TypeDescriptor::array(args.into_iter().next().unwrap_or(TypeDescriptor::Unknown));
        }
        if name == "Promise" && args.is_empty() {
            args.push(TypeDescriptor::Unknown);
        }
        TypeDescriptor::named(name, args)
    }
}

fn index_key(ty: &TypeDescriptor) -> Option<IndexKey> {
    match ty {
        TypeDescriptor::Primitive(Primitive::String) => Some(IndexKey::String),
        TypeDescriptor::Primitive(Primitive::Number) => Some(IndexKey::Number),
        _ => None,
    }
}

/// Only the last parameter may collect the rest
fn function_type(mut params: Vec<Param>, ret: TypeDescriptor) -> TypeDescriptor {
    let last = params.len().saturating_sub(1);
    for (i, param) in params.iter_mut().enumerate() {
        if i != last {
            param.rest = false;
        }
    }
    TypeDescriptor::Function {
        params,
        ret: Box::new(ret),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(raw: &str) -> TypeDescriptor {
        parse_type(raw, &MigrateConfig::default())
    }

    fn prim(p: Primitive) -> TypeDescriptor {
        TypeDescriptor::Primitive(p)
    }

    #[test]
    fn test_primitives_and_aliases() {
        assert_eq!(parse("string"), prim(Primitive::String));
        assert_eq!(parse("String"), prim(Primitive::String));
        assert_eq!(parse("Object"), prim(Primitive::Object));
        assert_eq!(parse("date"), prim(Primitive::Date));
        assert_eq!(parse("Function"), prim(Primitive::Function));
    }

    #[test]
    fn test_unknown_markers() {
        assert_eq!(parse("*"), TypeDescriptor::Unknown);
        assert_eq!(parse("?"), TypeDescriptor::Unknown);
        assert_eq!(parse("any"), TypeDescriptor::Unknown);
        assert_eq!(parse("mixed"), TypeDescriptor::Unknown);
        assert_eq!(parse("   "), TypeDescriptor::Unknown);
    }

    #[test]
    fn test_nullable_forms() {
        let expected = TypeDescriptor::nullable(prim(Primitive::Number));
        assert_eq!(parse("?number"), expected);
        assert_eq!(parse("number?"), expected);
        assert_eq!(parse("!number"), prim(Primitive::Number));
    }

    #[test]
    fn test_optional_binding() {
        let binding = parse_binding_type("number=", &MigrateConfig::default());
        assert!(binding.optional);
        assert!(!binding.rest);
        assert_eq!(binding.ty, prim(Primitive::Number));

        let binding = parse_binding_type("?string=", &MigrateConfig::default());
        assert!(binding.optional);
        assert_eq!(binding.ty, TypeDescriptor::nullable(prim(Primitive::String)));
    }

    #[test]
    fn test_variadic_binding() {
        let binding = parse_binding_type("...number", &MigrateConfig::default());
        assert!(binding.rest);
        assert_eq!(binding.ty, TypeDescriptor::array(prim(Primitive::Number)));
    }

    #[test]
    fn test_array_forms() {
        let expected = TypeDescriptor::array(prim(Primitive::String));
        assert_eq!(parse("string[]"), expected);
        assert_eq!(parse("Array<string>"), expected);
        assert_eq!(parse("Array.<string>"), expected);
        assert_eq!(parse("Array"), TypeDescriptor::array(TypeDescriptor::Unknown));
        assert_eq!(parse("array"), TypeDescriptor::array(TypeDescriptor::Unknown));
    }

    #[test]
    fn test_promise_defaults_argument() {
        assert_eq!(
            parse("Promise"),
            TypeDescriptor::named("Promise", vec![TypeDescriptor::Unknown])
        );
        assert_eq!(
            parse("promise<number>"),
            TypeDescriptor::named("Promise", vec![prim(Primitive::Number)])
        );
    }

    #[test]
    fn test_index_signature_override() {
        let expected = TypeDescriptor::IndexSignature {
            key: IndexKey::String,
            value: Box::new(TypeDescriptor::named("Foo", vec![])),
        };
        assert_eq!(parse("Object<string, Foo>"), expected);
        assert_eq!(parse("Object.<String, Foo>"), expected);
        assert!(matches!(
            parse("Object<number, string>"),
            TypeDescriptor::IndexSignature {
                key: IndexKey::Number,
                ..
            }
        ));
        // unsupported key kinds fall back to the alias table, which drops the args
        assert_eq!(parse("Object<Foo, Bar>"), prim(Primitive::Object));
    }

    #[test]
    fn test_keyword_drops_type_arguments() {
        assert_eq!(parse("string<Foo>"), prim(Primitive::String));
    }

    #[test]
    fn test_named_with_arguments() {
        assert_eq!(
            parse("Map<String, ns.Widget>"),
            TypeDescriptor::named(
                "Map",
                vec![prim(Primitive::String), TypeDescriptor::named("ns.Widget", vec![])]
            )
        );
    }

    #[test]
    fn test_union_with_group() {
        assert_eq!(
            parse("(string|number)[]"),
            TypeDescriptor::array(TypeDescriptor::Union(vec![
                prim(Primitive::String),
                prim(Primitive::Number)
            ]))
        );
    }

    #[test]
    fn test_closure_function() {
        let parsed = parse("function(this:Foo, string, number=, ...boolean): string");
        let TypeDescriptor::Function { params, ret } = parsed else {
            panic!("expected function, got {:?}", parsed);
        };
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].ty, prim(Primitive::String));
        assert!(params[1].optional);
        assert!(params[2].rest);
        assert_eq!(params[2].ty, TypeDescriptor::array(prim(Primitive::Boolean)));
        assert_eq!(*ret, prim(Primitive::String));
    }

    #[test]
    fn test_rest_only_in_last_position() {
        let TypeDescriptor::Function { params, .. } = parse("function(...string, number)") else {
            panic!("expected function");
        };
        assert!(!params[0].rest);
    }

    #[test]
    fn test_arrow_function() {
        let TypeDescriptor::Function { params, ret } = parse("(a: string, b?: number) => void")
        else {
            panic!("expected function");
        };
        assert_eq!(params[0].name.as_deref(), Some("a"));
        assert!(params[1].optional);
        assert_eq!(*ret, prim(Primitive::Void));
    }

    #[test]
    fn test_record_type() {
        let TypeDescriptor::Object(members) = parse("{name: string, age: number=, 'x-y': *}")
        else {
            panic!("expected object");
        };
        let keys: Vec<_> = members.keys().cloned().collect();
        assert_eq!(keys, vec!["name", "age", "x-y"]);
        assert!(!members["name"].optional);
        assert!(members["age"].optional);
        assert!(members["x-y"].ty.is_unknown());
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            parse("'a'|'b'"),
            TypeDescriptor::Union(vec![
                TypeDescriptor::Literal("'a'".into()),
                TypeDescriptor::Literal("'b'".into())
            ])
        );
        assert_eq!(parse("-1"), TypeDescriptor::Literal("-1".into()));
    }

    #[test]
    fn test_custom_mapping() {
        let config = MigrateConfig::default().with_type_mapping(
            "Immutable.List",
            crate::config::TypeMapping::record("ReadonlyArray", false),
        );
        assert_eq!(
            parse_type("Immutable.List<string>", &config),
            TypeDescriptor::named("ReadonlyArray", vec![])
        );
    }

    #[test]
    fn test_unrecognized_passes_through() {
        assert_eq!(
            parse("typeof foo"),
            TypeDescriptor::Opaque("typeof foo".into())
        );
        assert_eq!(parse("Array<string"), TypeDescriptor::Unknown);
        assert_eq!(parse("'unterminated"), TypeDescriptor::Unknown);
    }
}
