//! Defines the chunk tree that a template is compiled into.
//!
//! A chunk is either something that renders output (literal text, a control
//! directive) or an expression that is evaluated against the context stack.
//! Every chunk owns its children and remembers where in the template it came
//! from.

use std::sync::Arc;

use crate::compile::CompiledTemplate;
use crate::error::Location;
use crate::Value;

#[derive(Debug, Clone)]
pub struct Chunk {
    pub kind: ChunkKind,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub enum ChunkKind {
    /// Raw template text, emitted verbatim.
    Literal(String),

    /// `<% base_tag %>`
    BaseTag,

    /// `<% include NAME %>`, resolved when the template is compiled.
    Include(Arc<CompiledTemplate>),

    /// An ordered sequence of chunks.
    Block(Vec<Chunk>),

    /// `<% loop EXPR %> ... <% end_loop %>`
    Loop { context: Box<Chunk>, body: Box<Chunk> },

    /// `<% with EXPR %> ... <% end_with %>`
    With { context: Box<Chunk>, body: Box<Chunk> },

    /// `<% if EXPR %> ... <% else %> ... <% end_if %>`
    If {
        condition: Box<Chunk>,
        then_part: Box<Chunk>,
        else_part: Option<Box<Chunk>>,
    },

    /// `<% require KIND("path") %>`
    Require { kind: RequireKind, path: String },

    /// `$Layout` in a main template.
    Layout,

    /// A variable or function reference, e.g. `$Name`, `$Name(1, 2)` or
    /// `$Name.Chained`.
    VarFunc {
        name: String,
        /// `None` for a bare property, `Some` for a call even when empty.
        args: Option<Vec<Chunk>>,
        chained: Option<Box<Chunk>>,
    },

    /// An integer or float literal.
    Number(Value),

    /// A string literal.
    String(String),

    Not(Box<Chunk>),

    Or(Vec<Chunk>),

    And(Vec<Chunk>),

    Compare {
        op: CompareOp,
        lhs: Box<Chunk>,
        rhs: Box<Chunk>,
    },
}

/// The sub-kind of a `require` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequireKind {
    Css,
    ThemedCss,
    Javascript,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl Chunk {
    pub fn new(kind: ChunkKind, location: Location) -> Self {
        Self { kind, location }
    }
}

impl RequireKind {
    pub fn from_ident(s: &str) -> Option<Self> {
        match s {
            "css" => Some(Self::Css),
            "themedCSS" => Some(Self::ThemedCss),
            "javascript" => Some(Self::Javascript),
            _ => None,
        }
    }
}

impl CompareOp {
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "==" | "=" => Some(Self::Equal),
            "!=" => Some(Self::NotEqual),
            "<" => Some(Self::Less),
            "<=" => Some(Self::LessEqual),
            ">" => Some(Self::Greater),
            ">=" => Some(Self::GreaterEqual),
            _ => None,
        }
    }
}
