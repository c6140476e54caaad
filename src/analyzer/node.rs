// Typed AST produced by the analyzer and consumed by the code emitter.
// Nodes own their children; the tree is immutable once built.

use serde::{Deserialize, Serialize};

use crate::analyzer::env::NodeEnvironment;
use crate::error_reporting::SourceSpan;
use crate::form::{Form, Symbol};

/// One analyzed node. Every node keeps the environment it was analyzed in
/// (the emitter needs the execution context and active frames) and the span
/// of the form it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub env: NodeEnvironment,
    pub span: Option<SourceSpan>,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(kind: NodeKind, env: NodeEnvironment, span: Option<SourceSpan>) -> Self {
        Self { env, span, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Literal(Form),
    LocalVar(Symbol),
    /// Fully qualified by the resolver.
    GlobalVar(Symbol),
    /// Host-interop reference; carries the host-side name only.
    HostVar(String),
    Def {
        name: Symbol,
        meta: Option<Form>,
        init: Box<Node>,
    },
    Defstruct {
        name: Symbol,
        fields: Vec<Symbol>,
    },
    Ns {
        name: Symbol,
        requires: Vec<Symbol>,
    },
    Fn {
        params: Vec<Symbol>,
        rest_param: Option<Symbol>,
        body: Vec<Node>,
        frame_id: u64,
    },
    Do {
        stmts: Vec<Node>,
        ret: Box<Node>,
    },
    If {
        test: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Box<Node>,
    },
    Let {
        bindings: Vec<(Symbol, Node)>,
        body: Vec<Node>,
        is_loop: bool,
        frame_id: Option<u64>,
    },
    Recur {
        frame_id: u64,
        args: Vec<Node>,
    },
    Try {
        body: Vec<Node>,
        catches: Vec<CatchClause>,
        finally: Option<Vec<Node>>,
    },
    Throw {
        expr: Box<Node>,
    },
    Foreach {
        key: Option<Symbol>,
        value: Symbol,
        iterable: Box<Node>,
        body: Vec<Node>,
    },
    Apply {
        callee: Box<Node>,
        args: Vec<Node>,
        spread: Box<Node>,
    },
    Invoke {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    /// The quoted form is kept unanalyzed; the emitter serializes it.
    Quote(Form),
    Vector(Vec<Node>),
    Map(Vec<(Node, Node)>),
    IndexedArray(Vec<Node>),
    HostArrayGet {
        target: Box<Node>,
        index: Box<Node>,
    },
    HostArraySet {
        target: Box<Node>,
        index: Box<Node>,
        value: Box<Node>,
    },
    HostArrayPush {
        target: Box<Node>,
        value: Box<Node>,
    },
    HostArrayUnset {
        target: Box<Node>,
        index: Box<Node>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    /// The exception type expression, resolved like any other symbol.
    pub ty: Node,
    /// Bound as a local over the clause body.
    pub binding: Symbol,
    pub body: Vec<Node>,
}
