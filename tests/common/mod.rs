// Shared builders for the analyzer integration tests. Forms are built
// directly instead of going through a reader, so spans are attached by hand
// where a test asserts on them.
#![allow(dead_code)]

use vesper_analyzer::error_reporting::SourceSpan;
use vesper_analyzer::form::{Form, Symbol};

pub fn sym(name: &str) -> Form {
    Form::symbol(Symbol::new(name))
}

pub fn qsym(namespace: &str, name: &str) -> Form {
    Form::symbol(Symbol::qualified(namespace, name))
}

pub fn num(value: f64) -> Form {
    Form::number(value)
}

pub fn string(value: &str) -> Form {
    Form::string(value)
}

pub fn kw(name: &str) -> Form {
    Form::keyword(name)
}

pub fn list(items: Vec<Form>) -> Form {
    Form::list(items)
}

pub fn vector(items: Vec<Form>) -> Form {
    Form::vector(items)
}

pub fn map(pairs: Vec<(Form, Form)>) -> Form {
    Form::map(pairs)
}

pub fn arr(items: Vec<Form>) -> Form {
    Form::indexed_array(items)
}

/// Single-line span, columns inclusive-exclusive, for tests that check
/// error locations.
pub fn spanned(form: Form, line: usize, start_column: usize, end_column: usize) -> Form {
    form.with_span(Some(SourceSpan::new(line, start_column, line, end_column)))
}
