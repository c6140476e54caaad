// Semantic analysis: turns reader forms into the typed AST.
//
// `Analyzer::analyze` is the single entry point. Literals and symbols route
// to leaf analyzers, collections recurse in expression context, and lists
// dispatch on their head symbol through the special-form table, falling back
// to invocation analysis.

pub mod env;
pub mod errors;
pub mod node;

mod destructure;
mod quasiquote;
mod resolver;
mod special_forms;

pub use env::{ExecutionContext, NodeEnvironment, RecurFrame};
pub use errors::{AnalyzerError, AnalyzerResult};
pub use node::{CatchClause, Node, NodeKind};

use crate::form::{Form, FormKind, Symbol};
use crate::registry::{NamespaceRegistry, CORE_NAMESPACE};

/// Head symbols with compiler-defined semantics. Anything else in head
/// position is an invocation. Also fed to suggestion collection so a typo'd
/// head like `lopp` suggests `loop`.
pub const SPECIAL_FORM_NAMES: &[&str] = &[
    "def",
    "ns",
    "fn",
    "do",
    "if",
    "let",
    "loop",
    "recur",
    "try",
    "throw",
    "foreach",
    "apply",
    "quote",
    "quasiquote",
    "unquote",
    "unquote-splicing",
    "defstruct",
    "host/aget",
    "host/aset",
    "host/apush",
    "host/aunset",
];

/// One analysis session. Owns the freshness counters, so fresh symbol and
/// frame ids are deterministic per session and need no global state.
pub struct Analyzer<'a> {
    registry: &'a NamespaceRegistry,
    next_symbol_id: u64,
    next_frame_id: u64,
}

impl<'a> Analyzer<'a> {
    pub fn new(registry: &'a NamespaceRegistry) -> Self {
        Self {
            registry,
            next_symbol_id: 0,
            next_frame_id: 0,
        }
    }

    pub fn registry(&self) -> &NamespaceRegistry {
        self.registry
    }

    /// Analyzes one top-level form against a fresh environment.
    pub fn analyze_top_level(&mut self, form: &Form) -> AnalyzerResult<Node> {
        self.analyze(form, &NodeEnvironment::empty())
    }

    /// Analyzes a whole program, one fresh environment per top-level form.
    /// Stops at the first error; the driver decides whether to resume.
    pub fn analyze_program(&mut self, forms: &[Form]) -> AnalyzerResult<Vec<Node>> {
        forms.iter().map(|form| self.analyze_top_level(form)).collect()
    }

    pub fn analyze(&mut self, form: &Form, env: &NodeEnvironment) -> AnalyzerResult<Node> {
        match &form.kind {
            FormKind::Nil
            | FormKind::Bool(_)
            | FormKind::Number(_)
            | FormKind::String(_)
            | FormKind::Keyword(_) => Ok(self.literal_node(form, env)),
            FormKind::Symbol(symbol) => self.resolve_symbol(symbol, &form.span, env),
            FormKind::Vector(items) => self.analyze_vector(form, items, env),
            FormKind::Map(pairs) => self.analyze_map(form, pairs, env),
            FormKind::IndexedArray(items) => self.analyze_indexed_array(form, items, env),
            FormKind::List(items) if items.is_empty() => Ok(self.literal_node(form, env)),
            FormKind::List(items) => self.analyze_list(form, items, env),
        }
    }

    fn analyze_list(&mut self, form: &Form, items: &[Form], env: &NodeEnvironment) -> AnalyzerResult<Node> {
        let args = &items[1..];

        if let FormKind::Symbol(head) = &items[0].kind {
            match (head.namespace.as_deref(), head.name.as_str()) {
                (None, "def") => return self.analyze_def(form, args, env),
                (None, "ns") => return self.analyze_ns(form, args, env),
                (None, "fn") => return self.analyze_fn(form, args, env),
                (None, "do") => return self.analyze_do(form, args, env),
                (None, "if") => return self.analyze_if(form, args, env),
                (None, "let") => return self.analyze_let(form, args, env, false),
                (None, "loop") => return self.analyze_let(form, args, env, true),
                (None, "recur") => return self.analyze_recur(form, args, env),
                (None, "try") => return self.analyze_try(form, args, env),
                (None, "throw") => return self.analyze_throw(form, args, env),
                (None, "foreach") => return self.analyze_foreach(form, args, env),
                (None, "apply") => return self.analyze_apply(form, args, env),
                (None, "quote") => return self.analyze_quote(form, args, env),
                (None, "quasiquote") => return self.analyze_quasiquote(form, args, env),
                (None, "unquote") => {
                    return Err(AnalyzerError::MalformedSpecialForm {
                        form: "unquote".to_string(),
                        message: "unquote is only valid inside a quasiquote template".to_string(),
                        span: form.span.clone(),
                    })
                }
                (None, "unquote-splicing") => {
                    return Err(AnalyzerError::SpliceNotInSequence {
                        span: form.span.clone(),
                    })
                }
                (None, "defstruct") => return self.analyze_defstruct(form, args, env),
                (Some("host"), "aget") => return self.analyze_host_array_get(form, args, env),
                (Some("host"), "aset") => return self.analyze_host_array_set(form, args, env),
                (Some("host"), "apush") => return self.analyze_host_array_push(form, args, env),
                (Some("host"), "aunset") => return self.analyze_host_array_unset(form, args, env),
                _ => {}
            }
        }

        self.analyze_invoke(form, items, env)
    }

    fn analyze_invoke(&mut self, form: &Form, items: &[Form], env: &NodeEnvironment) -> AnalyzerResult<Node> {
        let arg_env = env.with_context(ExecutionContext::Expression);

        let callee = self.analyze(&items[0], &arg_env)?;
        let args = items[1..]
            .iter()
            .map(|item| self.analyze(item, &arg_env))
            .collect::<AnalyzerResult<Vec<_>>>()?;

        Ok(Node::new(
            NodeKind::Invoke {
                callee: Box::new(callee),
                args,
            },
            env.clone(),
            form.span.clone(),
        ))
    }

    fn analyze_vector(&mut self, form: &Form, items: &[Form], env: &NodeEnvironment) -> AnalyzerResult<Node> {
        let elems = self.analyze_collection_items(items, env)?;
        Ok(Node::new(NodeKind::Vector(elems), env.clone(), form.span.clone()))
    }

    fn analyze_indexed_array(&mut self, form: &Form, items: &[Form], env: &NodeEnvironment) -> AnalyzerResult<Node> {
        let elems = self.analyze_collection_items(items, env)?;
        Ok(Node::new(NodeKind::IndexedArray(elems), env.clone(), form.span.clone()))
    }

    fn analyze_map(&mut self, form: &Form, pairs: &[(Form, Form)], env: &NodeEnvironment) -> AnalyzerResult<Node> {
        // Collection literals are never tail-recursive positions.
        let elem_env = env
            .with_context(ExecutionContext::Expression)
            .with_disallow_recur();

        let analyzed = pairs
            .iter()
            .map(|(key, value)| {
                let key = self.analyze(key, &elem_env)?;
                let value = self.analyze(value, &elem_env)?;
                Ok((key, value))
            })
            .collect::<AnalyzerResult<Vec<_>>>()?;

        Ok(Node::new(NodeKind::Map(analyzed), env.clone(), form.span.clone()))
    }

    fn analyze_collection_items(&mut self, items: &[Form], env: &NodeEnvironment) -> AnalyzerResult<Vec<Node>> {
        // Collection literals are never tail-recursive positions.
        let elem_env = env
            .with_context(ExecutionContext::Expression)
            .with_disallow_recur();

        items
            .iter()
            .map(|item| self.analyze(item, &elem_env))
            .collect()
    }

    pub(crate) fn literal_node(&self, form: &Form, env: &NodeEnvironment) -> Node {
        Node::new(NodeKind::Literal(form.clone()), env.clone(), form.span.clone())
    }

    pub(crate) fn nil_literal(&self, env: &NodeEnvironment, span: &Option<crate::error_reporting::SourceSpan>) -> Node {
        Node::new(
            NodeKind::Literal(Form::nil().with_span(span.clone())),
            env.clone(),
            span.clone(),
        )
    }

    /// A fresh, never-user-visible symbol. Deterministic within a session.
    pub(crate) fn fresh_symbol(&mut self, prefix: &str) -> Symbol {
        let id = self.next_symbol_id;
        self.next_symbol_id += 1;
        Symbol::new(&format!("__{}_{}", prefix, id))
    }

    pub(crate) fn next_frame_id(&mut self) -> u64 {
        let id = self.next_frame_id;
        self.next_frame_id += 1;
        id
    }

    /// Binds `symbol` in `env`, renaming it to a fresh shadow symbol when it
    /// would hide an existing local. Returns the extended environment and
    /// the binding symbol subsequent references resolve to.
    pub(crate) fn bind_local(&mut self, env: &NodeEnvironment, symbol: &Symbol) -> (NodeEnvironment, Symbol) {
        let bound = if env.has_local(symbol) {
            let id = self.next_symbol_id;
            self.next_symbol_id += 1;
            Symbol::new(&format!("{}__{}", symbol.name, id))
        } else {
            symbol.clone()
        };
        (env.with_local(symbol, bound.clone()), bound)
    }
}

/// Symbols emitted into generated forms are core-qualified so they resolve
/// regardless of the caller's aliases.
pub(crate) fn core_symbol(name: &str) -> Symbol {
    Symbol::qualified(CORE_NAMESPACE, name)
}

/// `&` marks the rest position in parameter vectors and vector patterns.
pub(crate) fn is_rest_marker(form: &Form) -> bool {
    matches!(&form.kind, FormKind::Symbol(symbol) if !symbol.is_qualified() && symbol.name == "&")
}
