//! Quasiquote expansion: rewrites a template into code that constructs it,
//! leaving unquoted holes to evaluate in the caller's scope. Pure
//! form-to-form; the caller re-analyzes the constructed form.

use super::{core_symbol, Analyzer, AnalyzerError, AnalyzerResult};
use crate::form::{Form, FormKind, Symbol};
use crate::registry::HOST_NAMESPACE;

impl<'a> Analyzer<'a> {
    pub fn quasiquote(&mut self, template: &Form) -> AnalyzerResult<Form> {
        match &template.kind {
            FormKind::List(items) if head_is(items, "unquote") => {
                unquote_payload(template, items, "unquote")
            }
            FormKind::List(items) if head_is(items, "unquote-splicing") => {
                // A splice has no meaning outside a surrounding sequence.
                Err(AnalyzerError::SpliceNotInSequence {
                    span: template.span.clone(),
                })
            }
            FormKind::List(items) => self.quasiquote_sequence(template, items, "list"),
            FormKind::Vector(items) => self.quasiquote_sequence(template, items, "vector"),
            FormKind::IndexedArray(items) => {
                self.quasiquote_sequence(template, items, "indexed-array")
            }
            FormKind::Map(pairs) => {
                let flat: Vec<Form> = pairs
                    .iter()
                    .flat_map(|(key, value)| [key.clone(), value.clone()])
                    .collect();
                self.quasiquote_sequence(template, &flat, "hash-map")
            }
            FormKind::Symbol(symbol) => Ok(self.quote_symbol(template, symbol)),
            // Everything else is self-quoting.
            _ => Ok(template.clone()),
        }
    }

    /// `(vesper.core/apply <ctor> (vesper.core/concat <segment>...))` where
    /// each plain element contributes a one-element list segment and each
    /// splice contributes its expression bare.
    fn quasiquote_sequence(
        &mut self,
        template: &Form,
        items: &[Form],
        ctor: &str,
    ) -> AnalyzerResult<Form> {
        let mut concat = Vec::with_capacity(items.len() + 1);
        concat.push(Form::symbol(core_symbol("concat")));
        for item in items {
            concat.push(self.quasiquote_segment(item)?);
        }

        Ok(Form::list(vec![
            Form::symbol(core_symbol("apply")),
            Form::symbol(core_symbol(ctor)),
            Form::list(concat).with_span(template.span.clone()),
        ])
        .with_span(template.span.clone()))
    }

    fn quasiquote_segment(&mut self, item: &Form) -> AnalyzerResult<Form> {
        if let FormKind::List(items) = &item.kind {
            if head_is(items, "unquote") {
                let payload = unquote_payload(item, items, "unquote")?;
                return Ok(singleton(payload, item));
            }
            if head_is(items, "unquote-splicing") {
                return unquote_payload(item, items, "unquote-splicing");
            }
        }
        let constructed = self.quasiquote(item)?;
        Ok(singleton(constructed, item))
    }

    /// Symbols quote to their resolved, fully qualified name when the
    /// registry knows them, so the constructed form means the same thing in
    /// any namespace. Host and unknown symbols quote unchanged.
    fn quote_symbol(&self, template: &Form, symbol: &Symbol) -> Form {
        let quoted = if symbol.namespace.as_deref() == Some(HOST_NAMESPACE) {
            template.clone()
        } else {
            match self.registry().resolve(symbol) {
                Some(qualified) => Form::symbol(qualified).with_span(template.span.clone()),
                None => template.clone(),
            }
        };
        Form::list(vec![Form::symbol(Symbol::new("quote")), quoted])
            .with_span(template.span.clone())
    }
}

fn head_is(items: &[Form], name: &str) -> bool {
    items
        .first()
        .and_then(Form::as_symbol)
        .map_or(false, |symbol| !symbol.is_qualified() && symbol.name == name)
}

fn unquote_payload(form: &Form, items: &[Form], name: &str) -> AnalyzerResult<Form> {
    match items {
        [_, payload] => Ok(payload.clone()),
        _ => Err(AnalyzerError::MalformedSpecialForm {
            form: name.to_string(),
            message: "expected exactly one expression".to_string(),
            span: form.span.clone(),
        }),
    }
}

/// `(vesper.core/list v)`, the one-element segment for the concat chain.
fn singleton(value: Form, at: &Form) -> Form {
    Form::list(vec![Form::symbol(core_symbol("list")), value]).with_span(at.span.clone())
}
