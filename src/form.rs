// Form model consumed by the analyzer.
// The reader produces these values; the analyzer never sees raw source text.

use crate::error_reporting::SourceSpan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A symbol, optionally qualified with a namespace (`ns/name`).
///
/// The namespace `host` is the interop escape: `host/strlen` refers to the
/// target platform's `strlen` and is never looked up in any scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub namespace: Option<String>,
    pub name: String,
}

impl Symbol {
    pub fn new(name: &str) -> Self {
        Self {
            namespace: None,
            name: name.to_string(),
        }
    }

    pub fn qualified(namespace: &str, name: &str) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            name: name.to_string(),
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.namespace.is_some()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Keyword(pub String);

impl Keyword {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

/// A reader-produced data value, with the source span it was read from.
///
/// Spans are optional because generated forms (destructuring accessors,
/// quasiquote construction code) have no surface syntax of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub kind: FormKind,
    pub span: Option<SourceSpan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FormKind {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Keyword(Keyword),
    Symbol(Symbol),
    List(Vec<Form>),
    Vector(Vec<Form>),
    /// Ordered key/value pairs; the reader preserves source order.
    Map(Vec<(Form, Form)>),
    /// Host array literal, written `@[...]`.
    IndexedArray(Vec<Form>),
}

impl Form {
    pub fn new(kind: FormKind) -> Self {
        Self { kind, span: None }
    }

    pub fn with_span(mut self, span: Option<SourceSpan>) -> Self {
        self.span = span;
        self
    }

    pub fn nil() -> Self {
        Self::new(FormKind::Nil)
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(FormKind::Bool(value))
    }

    pub fn number(value: f64) -> Self {
        Self::new(FormKind::Number(value))
    }

    pub fn string(value: &str) -> Self {
        Self::new(FormKind::String(value.to_string()))
    }

    pub fn keyword(name: &str) -> Self {
        Self::new(FormKind::Keyword(Keyword::new(name)))
    }

    pub fn symbol(symbol: Symbol) -> Self {
        Self::new(FormKind::Symbol(symbol))
    }

    pub fn list(items: Vec<Form>) -> Self {
        Self::new(FormKind::List(items))
    }

    pub fn vector(items: Vec<Form>) -> Self {
        Self::new(FormKind::Vector(items))
    }

    pub fn map(pairs: Vec<(Form, Form)>) -> Self {
        Self::new(FormKind::Map(pairs))
    }

    pub fn indexed_array(items: Vec<Form>) -> Self {
        Self::new(FormKind::IndexedArray(items))
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match &self.kind {
            FormKind::Symbol(symbol) => Some(symbol),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Form]> {
        match &self.kind {
            FormKind::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[Form]> {
        match &self.kind {
            FormKind::Vector(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self.kind, FormKind::Nil)
    }

    /// Variant name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            FormKind::Nil => "nil",
            FormKind::Bool(_) => "boolean",
            FormKind::Number(_) => "number",
            FormKind::String(_) => "string",
            FormKind::Keyword(_) => "keyword",
            FormKind::Symbol(_) => "symbol",
            FormKind::List(_) => "list",
            FormKind::Vector(_) => "vector",
            FormKind::Map(_) => "map",
            FormKind::IndexedArray(_) => "indexed array",
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Form]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FormKind::Nil => write!(f, "nil"),
            FormKind::Bool(value) => write!(f, "{}", value),
            FormKind::Number(value) => {
                // The integral fast-path only holds while the i64 cast is
                // exact; beyond that the cast saturates.
                if value.fract() == 0.0 && value.abs() < 9.2e18 {
                    write!(f, "{}", *value as i64)
                } else {
                    write!(f, "{}", value)
                }
            }
            FormKind::String(value) => write!(f, "{:?}", value),
            FormKind::Keyword(keyword) => write!(f, "{}", keyword),
            FormKind::Symbol(symbol) => write!(f, "{}", symbol),
            FormKind::List(items) => {
                write!(f, "(")?;
                write_joined(f, items)?;
                write!(f, ")")
            }
            FormKind::Vector(items) => {
                write!(f, "[")?;
                write_joined(f, items)?;
                write!(f, "]")
            }
            FormKind::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", key, value)?;
                }
                write!(f, "}}")
            }
            FormKind::IndexedArray(items) => {
                write!(f, "@[")?;
                write_joined(f, items)?;
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::{assert_eq, assert_ne};

    #[test]
    fn test_symbol_display() {
        assert_eq!(Symbol::new("map").to_string(), "map");
        assert_eq!(Symbol::qualified("vesper.core", "map").to_string(), "vesper.core/map");
        assert_eq!(Symbol::qualified("host", "strlen").to_string(), "host/strlen");
    }

    #[test]
    fn test_form_display_renders_reader_syntax() {
        let form = Form::list(vec![
            Form::symbol(Symbol::new("f")),
            Form::number(1.0),
            Form::vector(vec![Form::keyword("k"), Form::string("s")]),
        ]);
        assert_eq!(form.to_string(), "(f 1 [:k \"s\"])");

        let map = Form::map(vec![(Form::keyword("a"), Form::number(1.5))]);
        assert_eq!(map.to_string(), "{:a 1.5}");

        let arr = Form::indexed_array(vec![Form::number(0.0), Form::nil()]);
        assert_eq!(arr.to_string(), "@[0 nil]");
    }

    #[test]
    fn test_integral_display_is_exact_for_large_magnitudes() {
        assert_eq!(Form::number(1e18).to_string(), "1000000000000000000");

        let huge = Form::number(1e300).to_string();
        assert_ne!(huge, i64::MAX.to_string());
        assert!(huge.starts_with('1'));

        let neg = Form::number(-1e300).to_string();
        assert_ne!(neg, i64::MIN.to_string());
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Form::nil().type_name(), "nil");
        assert_eq!(Form::number(3.0).type_name(), "number");
        assert_eq!(Form::list(vec![]).type_name(), "list");
        assert_eq!(Form::indexed_array(vec![]).type_name(), "indexed array");
    }
}
