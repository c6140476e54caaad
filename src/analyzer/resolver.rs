//! Symbol resolution: host interop, then lexical locals, then the
//! namespace registry. Unresolved symbols come back with "did you mean"
//! candidates attached.

use indexmap::IndexSet;

use super::{Analyzer, AnalyzerError, AnalyzerResult, Node, NodeEnvironment, NodeKind, SPECIAL_FORM_NAMES};
use crate::error_reporting::{find_similar_symbols, SourceSpan};
use crate::form::Symbol;
use crate::registry::{CORE_NAMESPACE, HOST_NAMESPACE};

impl<'a> Analyzer<'a> {
    pub(crate) fn resolve_symbol(
        &self,
        symbol: &Symbol,
        span: &Option<SourceSpan>,
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        if symbol.namespace.as_deref() == Some(HOST_NAMESPACE) {
            // Host names are opaque to the analyzer; the emitter validates them.
            return Ok(Node::new(
                NodeKind::HostVar(symbol.name.clone()),
                env.clone(),
                span.clone(),
            ));
        }

        if let Some(bound) = env.get_shadowed(symbol) {
            return Ok(Node::new(
                NodeKind::LocalVar(bound.clone()),
                env.clone(),
                span.clone(),
            ));
        }

        if let Some(qualified) = self.registry().resolve(symbol) {
            return Ok(Node::new(
                NodeKind::GlobalVar(qualified),
                env.clone(),
                span.clone(),
            ));
        }

        Err(AnalyzerError::UnresolvedSymbol {
            symbol: symbol.to_string(),
            similar: self.similar_symbols(&symbol.name, env),
            span: span.clone(),
        })
    }

    /// Everything a bare symbol could have legally resolved to, ranked by
    /// edit distance against `name`.
    fn similar_symbols(&self, name: &str, env: &NodeEnvironment) -> Vec<String> {
        let mut candidates: IndexSet<String> = IndexSet::new();

        for local in env.local_names() {
            candidates.insert(local.to_string());
        }
        for form in SPECIAL_FORM_NAMES {
            candidates.insert((*form).to_string());
        }
        let registry = self.registry();
        for defined in registry.defined_symbols(&registry.current_namespace()) {
            candidates.insert(defined);
        }
        for defined in registry.defined_symbols(CORE_NAMESPACE) {
            candidates.insert(defined);
        }

        let candidates: Vec<String> = candidates.into_iter().collect();
        find_similar_symbols(name, &candidates)
    }
}
