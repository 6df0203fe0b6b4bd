//! Canonical type descriptor model
//!
//! Every annotation dialect (PropTypes validators, JSDoc type expressions,
//! dotted `@param` groups) is parsed into a [`TypeDescriptor`] tree, and all
//! TypeScript output is rendered from that tree. Trees are built bottom-up
//! from immutable parts so they cannot contain cycles.

use indexmap::IndexMap;

/// Built-in keyword and global types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Number,
    Boolean,
    Symbol,
    BigInt,
    /// The lowercase `object` keyword
    Object,
    Date,
    Function,
    Null,
    Undefined,
    Void,
}

impl Primitive {
    /// Keywords that take no type arguments
    pub fn from_keyword(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "symbol" => Some(Self::Symbol),
            "bigint" => Some(Self::BigInt),
            "object" => Some(Self::Object),
            "null" => Some(Self::Null),
            "undefined" => Some(Self::Undefined),
            "void" => Some(Self::Void),
            "Date" => Some(Self::Date),
            "Function" => Some(Self::Function),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Symbol => "symbol",
            Self::BigInt => "bigint",
            Self::Object => "object",
            Self::Date => "Date",
            Self::Function => "Function",
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Void => "void",
        }
    }
}

/// Key kind of an index signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKey {
    String,
    Number,
}

impl IndexKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
        }
    }
}

/// One parameter of a function type
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// `None` for positional-only slots such as `function(string)`
    pub name: Option<String>,
    pub ty: TypeDescriptor,
    pub optional: bool,
    pub rest: bool,
}

impl Param {
    pub fn positional(ty: TypeDescriptor) -> Self {
        Self {
            name: None,
            ty,
            optional: false,
            rest: false,
        }
    }
}

/// One property of an object literal type
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub ty: TypeDescriptor,
    pub optional: bool,
}

impl Member {
    pub fn new(ty: TypeDescriptor, optional: bool) -> Self {
        Self { ty, optional }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Primitive(Primitive),
    /// A named type, always with a non-empty name (see [`TypeDescriptor::named`])
    Named {
        name: String,
        args: Vec<TypeDescriptor>,
    },
    Array(Box<TypeDescriptor>),
    Function {
        params: Vec<Param>,
        ret: Box<TypeDescriptor>,
    },
    /// Members in declaration order
    Object(IndexMap<String, Member>),
    IndexSignature {
        key: IndexKey,
        value: Box<TypeDescriptor>,
    },
    Union(Vec<TypeDescriptor>),
    Nullable(Box<TypeDescriptor>),
    /// Optionality belongs to the binding; only meaningful at declaration sites
    Optional(Box<TypeDescriptor>),
    /// A literal type such as `'primary'` or `42`, kept as written
    Literal(String),
    /// Text passed through untranslated
    Opaque(String),
    Unknown,
}

impl TypeDescriptor {
    /// Named reference; an empty name degrades to [`TypeDescriptor::Unknown`]
    pub fn named(name: impl Into<String>, args: Vec<TypeDescriptor>) -> Self {
        let name = name.into();
        if name.trim().is_empty() {
            return Self::Unknown;
        }
        Self::Named { name, args }
    }

    pub fn array(element: TypeDescriptor) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn nullable(inner: TypeDescriptor) -> Self {
        Self::Nullable(Box::new(inner))
    }

    pub fn optional(inner: TypeDescriptor) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// `(...args: any[]) => any`, the shape of an untyped callback
    pub fn any_function() -> Self {
        Self::Function {
            params: vec![Param {
                name: Some("args".to_string()),
                ty: Self::array(Self::Unknown),
                optional: false,
                rest: true,
            }],
            ret: Box::new(Self::Unknown),
        }
    }

    /// Strip a top-level `Optional` wrapper, reporting whether one was present
    pub fn split_optional(self) -> (TypeDescriptor, bool) {
        match self {
            Self::Optional(inner) => {
                let (inner, _) = (*inner).split_optional();
                (inner, true)
            }
            other => (other, false),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Whether this already names a `Promise`
    pub fn is_promise(&self) -> bool {
        matches!(self, Self::Named { name, .. } if name == "Promise")
    }

    /// A type a generator function may declare as its return type
    pub fn is_iterator_like(&self) -> bool {
        matches!(self, Self::Named { name, .. } if ITERATOR_NAMES.contains(&name.as_str()))
    }
}

const ITERATOR_NAMES: &[&str] = &[
    "Generator",
    "Iterator",
    "Iterable",
    "IterableIterator",
    "AsyncGenerator",
    "AsyncIterator",
    "AsyncIterable",
    "AsyncIterableIterator",
];
