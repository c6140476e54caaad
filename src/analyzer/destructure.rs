//! Pattern compiler: flattens destructuring patterns into sequential
//! `(symbol, form)` binding pairs over core accessor calls. Later pairs may
//! reference symbols introduced by earlier ones, so callers bind in order.

use itertools::Itertools;

use super::{core_symbol, is_rest_marker, Analyzer, AnalyzerError, AnalyzerResult};
use crate::form::{Form, FormKind, Symbol};

impl<'a> Analyzer<'a> {
    /// Rejects pattern kinds the compiler cannot take apart, so the error
    /// reads "cannot destructure a keyword binding pattern" instead of a
    /// failure deep in the cascade.
    pub fn assert_supported_binding(&self, pattern: &Form) -> AnalyzerResult<()> {
        match &pattern.kind {
            FormKind::Nil | FormKind::Vector(_) | FormKind::Map(_) | FormKind::IndexedArray(_) => {
                Ok(())
            }
            FormKind::Symbol(symbol) if !symbol.is_qualified() => Ok(()),
            FormKind::Symbol(_) => Err(AnalyzerError::UnsupportedDestructuring {
                type_name: "qualified symbol".to_string(),
                span: pattern.span.clone(),
            }),
            _ => Err(AnalyzerError::UnsupportedDestructuring {
                type_name: pattern.type_name().to_string(),
                span: pattern.span.clone(),
            }),
        }
    }

    /// Flattens `pattern` bound to `value` into sequential binding pairs.
    pub fn deconstruct(&mut self, pattern: &Form, value: Form) -> AnalyzerResult<Vec<(Symbol, Form)>> {
        self.assert_supported_binding(pattern)?;

        let mut pairs = Vec::new();
        match &pattern.kind {
            // A nil pattern binds nothing; the value is dropped unevaluated.
            FormKind::Nil => {}
            FormKind::Symbol(symbol) if symbol.name == "_" => {
                // Still evaluated for effect, just not nameable afterwards.
                pairs.push((self.fresh_symbol("val"), value));
            }
            FormKind::Symbol(symbol) => pairs.push((symbol.clone(), value)),
            FormKind::Vector(items) => self.deconstruct_vector(items, value, &mut pairs)?,
            FormKind::Map(entries) => self.deconstruct_map(entries, value, &mut pairs)?,
            FormKind::IndexedArray(items) => self.deconstruct_indexed(items, value, &mut pairs)?,
            _ => {
                return Err(AnalyzerError::UnsupportedDestructuring {
                    type_name: pattern.type_name().to_string(),
                    span: pattern.span.clone(),
                })
            }
        }
        Ok(pairs)
    }

    /// Folds a `(pattern, value)` sequence left to right, concatenating the
    /// pair lists in binding order.
    pub fn deconstruct_all(&mut self, bindings: &[(Form, Form)]) -> AnalyzerResult<Vec<(Symbol, Form)>> {
        bindings
            .iter()
            .try_fold(Vec::new(), |mut pairs, (pattern, value)| {
                pairs.extend(self.deconstruct(pattern, value.clone())?);
                Ok(pairs)
            })
    }

    /// Sequential patterns walk a cursor: each position binds a fresh head
    /// to `(vesper.core/first cursor)` and advances the cursor through a
    /// fresh tail bound to `(vesper.core/next cursor)`.
    fn deconstruct_vector(
        &mut self,
        items: &[Form],
        value: Form,
        pairs: &mut Vec<(Symbol, Form)>,
    ) -> AnalyzerResult<()> {
        let root = self.fresh_symbol("vec");
        pairs.push((root.clone(), value));

        let mut cursor = root;
        let mut items = items.iter();
        while let Some(item) = items.next() {
            if is_rest_marker(item) {
                // The rest pattern takes the remaining cursor as-is; it can
                // itself be a nested pattern. A dangling `&` binds nothing.
                if let Some(rest_pattern) = items.next() {
                    let rest_value = symbol_form(&cursor, rest_pattern);
                    pairs.extend(self.deconstruct(rest_pattern, rest_value)?);
                    if let Some(extra) = items.next() {
                        return Err(AnalyzerError::MultipleRestBindings {
                            span: extra.span.clone(),
                        });
                    }
                }
                return Ok(());
            }

            let head = self.fresh_symbol("head");
            pairs.push((head.clone(), accessor_call("first", &cursor, item)));
            let tail = self.fresh_symbol("tail");
            pairs.push((tail.clone(), accessor_call("next", &cursor, item)));
            pairs.extend(self.deconstruct(item, symbol_form(&head, item))?);
            cursor = tail;
        }
        Ok(())
    }

    fn deconstruct_map(
        &mut self,
        entries: &[(Form, Form)],
        value: Form,
        pairs: &mut Vec<(Symbol, Form)>,
    ) -> AnalyzerResult<()> {
        let root = self.fresh_symbol("map");
        pairs.push((root.clone(), value));

        for (key, sub_pattern) in entries {
            let entry = self.fresh_symbol("entry");
            pairs.push((entry.clone(), keyed_access(&root, key)));
            pairs.extend(self.deconstruct(sub_pattern, symbol_form(&entry, sub_pattern))?);
        }
        Ok(())
    }

    fn deconstruct_indexed(
        &mut self,
        items: &[Form],
        value: Form,
        pairs: &mut Vec<(Symbol, Form)>,
    ) -> AnalyzerResult<()> {
        let root = self.fresh_symbol("arr");
        pairs.push((root.clone(), value));

        // tuples() drops an odd trailing index, which then binds nothing.
        for (index, sub_pattern) in items.iter().tuples() {
            let item = self.fresh_symbol("item");
            pairs.push((item.clone(), keyed_access(&root, index)));
            pairs.extend(self.deconstruct(sub_pattern, symbol_form(&item, sub_pattern))?);
        }
        Ok(())
    }
}

/// Reference to an already-bound symbol, located at the pattern it serves.
fn symbol_form(symbol: &Symbol, at: &Form) -> Form {
    Form::symbol(symbol.clone()).with_span(at.span.clone())
}

/// `(vesper.core/<name> target)`, core-qualified so the generated form
/// resolves regardless of the caller's aliases.
fn accessor_call(name: &str, target: &Symbol, at: &Form) -> Form {
    Form::list(vec![
        Form::symbol(core_symbol(name)),
        Form::symbol(target.clone()),
    ])
    .with_span(at.span.clone())
}

/// `(vesper.core/get target key)` for map and indexed-array access.
fn keyed_access(target: &Symbol, key: &Form) -> Form {
    Form::list(vec![
        Form::symbol(core_symbol("get")),
        Form::symbol(target.clone()),
        key.clone(),
    ])
    .with_span(key.span.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NamespaceRegistry;
    use pretty_assertions::assert_eq;

    fn pairs_as_strings(pairs: &[(Symbol, Form)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(symbol, form)| (symbol.to_string(), form.to_string()))
            .collect()
    }

    #[test]
    fn flat_vector_pattern_walks_a_cursor() {
        let registry = NamespaceRegistry::new();
        let mut analyzer = Analyzer::new(&registry);

        let pattern = Form::vector(vec![
            Form::symbol(Symbol::new("a")),
            Form::symbol(Symbol::new("b")),
        ]);
        let pairs = analyzer
            .deconstruct(&pattern, Form::symbol(Symbol::new("coll")))
            .unwrap();

        assert_eq!(
            pairs_as_strings(&pairs),
            vec![
                ("__vec_0".to_string(), "coll".to_string()),
                ("__head_1".to_string(), "(vesper.core/first __vec_0)".to_string()),
                ("__tail_2".to_string(), "(vesper.core/next __vec_0)".to_string()),
                ("a".to_string(), "__head_1".to_string()),
                ("__head_3".to_string(), "(vesper.core/first __tail_2)".to_string()),
                ("__tail_4".to_string(), "(vesper.core/next __tail_2)".to_string()),
                ("b".to_string(), "__head_3".to_string()),
            ]
        );
    }

    #[test]
    fn underscore_binds_a_fresh_unnameable_symbol() {
        let registry = NamespaceRegistry::new();
        let mut analyzer = Analyzer::new(&registry);

        let pairs = analyzer
            .deconstruct(&Form::symbol(Symbol::new("_")), Form::number(1.0))
            .unwrap();

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0.name, "__val_0");
    }

    #[test]
    fn keyword_pattern_is_rejected_up_front() {
        let registry = NamespaceRegistry::new();
        let analyzer = Analyzer::new(&registry);

        let err = analyzer
            .assert_supported_binding(&Form::keyword("name"))
            .unwrap_err();
        match err {
            AnalyzerError::UnsupportedDestructuring { type_name, .. } => {
                assert_eq!(type_name, "keyword");
            }
            other => panic!("expected UnsupportedDestructuring, got {:?}", other),
        }
    }
}
