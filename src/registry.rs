// Namespace registry shared between the analyzer and the surrounding driver.
// Tracks which symbols exist in which namespace, per-namespace import
// aliases, and the namespace currently being compiled. Definitions recorded
// by `def` forms are applied downstream by the evaluator; the registry is
// only written here by `ns` analysis and by the driver.

use std::cell::RefCell;

use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::form::Symbol;

pub const CORE_NAMESPACE: &str = "vesper.core";
pub const DEFAULT_NAMESPACE: &str = "user";
pub const HOST_NAMESPACE: &str = "host";

/// Names seeded into `vesper.core` at construction. The destructuring and
/// quasiquote expansions reference a subset of these, so a fresh registry
/// must already resolve them.
const CORE_BUILTINS: &[&str] = &[
    "first", "next", "rest", "get", "concat", "list", "vector", "hash-map",
    "indexed-array", "apply", "cons", "count", "empty?", "map", "filter",
    "reduce", "str", "print", "println", "not", "inc", "dec", "+", "-", "*",
    "/", "=", "<", ">", "<=", ">=",
];

#[derive(Debug)]
pub struct NamespaceRegistry {
    /// Namespace name -> set of symbols defined in it.
    definitions: RefCell<IndexMap<String, IndexSet<String>>>,
    /// Requiring namespace -> (alias -> target namespace).
    aliases: RefCell<IndexMap<String, IndexMap<String, String>>>,
    /// Namespaces recorded as required, in first-seen order.
    required: RefCell<IndexSet<String>>,
    current: RefCell<String>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        let registry = Self {
            definitions: RefCell::new(IndexMap::new()),
            aliases: RefCell::new(IndexMap::new()),
            required: RefCell::new(IndexSet::new()),
            current: RefCell::new(DEFAULT_NAMESPACE.to_string()),
        };
        for name in CORE_BUILTINS {
            registry.define(CORE_NAMESPACE, name);
        }
        registry
    }

    pub fn current_namespace(&self) -> String {
        self.current.borrow().clone()
    }

    pub fn set_current_namespace(&self, name: &str) {
        debug!("switching current namespace to '{}'", name);
        *self.current.borrow_mut() = name.to_string();
    }

    /// Records `name` as defined in `namespace`. Creates the namespace entry
    /// on first use.
    pub fn define(&self, namespace: &str, name: &str) {
        self.definitions
            .borrow_mut()
            .entry(namespace.to_string())
            .or_default()
            .insert(name.to_string());
    }

    /// Registers `alias` for `target` under the current namespace.
    pub fn define_alias(&self, alias: &str, target: &str) {
        let current = self.current_namespace();
        debug!("aliasing '{}' to '{}' in namespace '{}'", alias, target, current);
        self.aliases
            .borrow_mut()
            .entry(current)
            .or_default()
            .insert(alias.to_string(), target.to_string());
    }

    pub fn require_namespace(&self, name: &str) {
        debug!("requiring namespace '{}'", name);
        self.required.borrow_mut().insert(name.to_string());
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.borrow().contains(name)
    }

    /// Resolves a symbol against the current namespace: a qualified symbol
    /// has its namespace expanded through the alias table and must be
    /// defined there; an unqualified symbol is looked up in the current
    /// namespace and then in `vesper.core`.
    pub fn resolve(&self, symbol: &Symbol) -> Option<Symbol> {
        match &symbol.namespace {
            Some(ns) if ns == HOST_NAMESPACE => None,
            Some(ns) => {
                let target = self.expand_alias(ns);
                if self.is_defined(&target, &symbol.name) {
                    Some(Symbol::qualified(&target, &symbol.name))
                } else {
                    None
                }
            }
            None => {
                let current = self.current_namespace();
                if self.is_defined(&current, &symbol.name) {
                    Some(Symbol::qualified(&current, &symbol.name))
                } else if self.is_defined(CORE_NAMESPACE, &symbol.name) {
                    Some(Symbol::qualified(CORE_NAMESPACE, &symbol.name))
                } else {
                    None
                }
            }
        }
    }

    /// Symbols defined in `namespace`, in definition order.
    pub fn defined_symbols(&self, namespace: &str) -> Vec<String> {
        self.definitions
            .borrow()
            .get(namespace)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn expand_alias(&self, namespace: &str) -> String {
        let current = self.current_namespace();
        self.aliases
            .borrow()
            .get(&current)
            .and_then(|table| table.get(namespace))
            .cloned()
            .unwrap_or_else(|| namespace.to_string())
    }

    fn is_defined(&self, namespace: &str, name: &str) -> bool {
        self.definitions
            .borrow()
            .get(namespace)
            .map(|names| names.contains(name))
            .unwrap_or(false)
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
