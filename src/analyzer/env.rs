// Immutable lexical environment threaded through every analysis call.
// Every transition returns a fresh value; a child analysis can never leak
// bindings or flags back into its parent.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::form::Symbol;

/// What the enclosing form does with this sub-form's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionContext {
    /// Value is discarded.
    Statement,
    /// Value is consumed as an expression.
    Expression,
    /// Value is the enclosing function's result.
    Return,
}

/// The loop/function target a `recur` form jumps to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurFrame {
    pub id: u64,
    pub params: Vec<Symbol>,
}

impl RecurFrame {
    pub fn new(id: u64, params: Vec<Symbol>) -> Self {
        Self { id, params }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEnvironment {
    /// Symbol name -> binding symbol. The binding symbol differs from the
    /// name when a `let` shadows an outer binding.
    locals: IndexMap<String, Symbol>,
    context: ExecutionContext,
    recur_frames: Vec<RecurFrame>,
    disallow_recur: bool,
    def_allowed: bool,
}

impl NodeEnvironment {
    /// The sole top-level constructor: no locals, statement context, no
    /// active frames, recursion and definitions allowed.
    pub fn empty() -> Self {
        Self {
            locals: IndexMap::new(),
            context: ExecutionContext::Statement,
            recur_frames: Vec::new(),
            disallow_recur: false,
            def_allowed: true,
        }
    }

    pub fn with_context(&self, context: ExecutionContext) -> Self {
        let mut env = self.clone();
        env.context = context;
        env
    }

    /// Adds a binding for `original`, recording `bound` as the symbol every
    /// later reference resolves to. Shadow renames are decided by the
    /// analyzer session, which owns the freshness counter.
    pub fn with_local(&self, original: &Symbol, bound: Symbol) -> Self {
        let mut env = self.clone();
        env.locals.insert(original.name.clone(), bound);
        env
    }

    pub fn with_disallow_recur(&self) -> Self {
        let mut env = self.clone();
        env.disallow_recur = true;
        env
    }

    pub fn with_def_allowed(&self, allowed: bool) -> Self {
        let mut env = self.clone();
        env.def_allowed = allowed;
        env
    }

    /// Pushes a fresh recur target. Recursion is re-allowed because a
    /// subsequent `recur` jumps to this new frame, not across the position
    /// that disallowed it.
    pub fn push_recur_frame(&self, frame: RecurFrame) -> Self {
        let mut env = self.clone();
        env.recur_frames.push(frame);
        env.disallow_recur = false;
        env
    }

    /// Qualified symbols never name locals.
    pub fn has_local(&self, symbol: &Symbol) -> bool {
        symbol.namespace.is_none() && self.locals.contains_key(&symbol.name)
    }

    /// The binding symbol a reference to `symbol` resolves to, if it is a
    /// local. Identical to the symbol itself unless shadowed.
    pub fn get_shadowed(&self, symbol: &Symbol) -> Option<&Symbol> {
        if symbol.namespace.is_some() {
            return None;
        }
        self.locals.get(&symbol.name)
    }

    pub fn current_recur_frame(&self) -> Option<&RecurFrame> {
        self.recur_frames.last()
    }

    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    pub fn recur_allowed(&self) -> bool {
        !self.disallow_recur
    }

    pub fn def_allowed(&self) -> bool {
        self.def_allowed
    }

    /// Local names in binding order, for suggestion collection.
    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        self.locals.keys().map(|name| name.as_str())
    }
}

impl Default for NodeEnvironment {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_defaults() {
        let env = NodeEnvironment::empty();
        assert_eq!(env.context(), ExecutionContext::Statement);
        assert!(env.recur_allowed());
        assert!(env.def_allowed());
        assert!(env.current_recur_frame().is_none());
    }

    #[test]
    fn test_with_local_does_not_mutate_parent() {
        let parent = NodeEnvironment::empty();
        let x = Symbol::new("x");

        let child = parent.with_local(&x, x.clone());

        assert!(child.has_local(&x));
        assert!(!parent.has_local(&x));
    }

    #[test]
    fn test_shadowed_binding_is_returned_for_lookups() {
        let x = Symbol::new("x");
        let shadow = Symbol::new("x__1");

        let env = NodeEnvironment::empty()
            .with_local(&x, x.clone())
            .with_local(&x, shadow.clone());

        assert_eq!(env.get_shadowed(&x), Some(&shadow));
    }

    #[test]
    fn test_qualified_symbols_are_never_local() {
        let x = Symbol::new("x");
        let env = NodeEnvironment::empty().with_local(&x, x.clone());

        assert!(!env.has_local(&Symbol::qualified("other", "x")));
        assert_eq!(env.get_shadowed(&Symbol::qualified("other", "x")), None);
    }

    #[test]
    fn test_push_recur_frame_restores_recursion() {
        let env = NodeEnvironment::empty().with_disallow_recur();
        assert!(!env.recur_allowed());

        let inner = env.push_recur_frame(RecurFrame::new(7, vec![Symbol::new("x")]));
        assert!(inner.recur_allowed());
        assert_eq!(inner.current_recur_frame().unwrap().id, 7);
        assert_eq!(inner.current_recur_frame().unwrap().arity(), 1);

        // The outer environment still disallows recursion.
        assert!(!env.recur_allowed());
        assert!(env.current_recur_frame().is_none());
    }

    #[test]
    fn test_innermost_frame_wins() {
        let env = NodeEnvironment::empty()
            .push_recur_frame(RecurFrame::new(1, vec![]))
            .push_recur_frame(RecurFrame::new(2, vec![Symbol::new("a")]));

        assert_eq!(env.current_recur_frame().unwrap().id, 2);
    }

    #[test]
    fn test_context_transition() {
        let env = NodeEnvironment::empty();
        let expr = env.with_context(ExecutionContext::Expression);

        assert_eq!(expr.context(), ExecutionContext::Expression);
        assert_eq!(env.context(), ExecutionContext::Statement);
    }
}
