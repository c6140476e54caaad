// Analyzer error taxonomy. Every variant carries the span of the offending
// sub-form, not the enclosing top-level form, so diagnostics can underline
// the exact token range.

use thiserror::Error;

use crate::error_reporting::{DiagnosticInfo, ErrorHint, SourceSpan};

pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyzerError {
    #[error("cannot resolve symbol '{symbol}'")]
    UnresolvedSymbol {
        symbol: String,
        /// Known names close to the unresolved one, best match first.
        similar: Vec<String>,
        span: Option<SourceSpan>,
    },

    #[error("cannot destructure a {type_name} binding pattern")]
    UnsupportedDestructuring {
        type_name: String,
        span: Option<SourceSpan>,
    },

    #[error("malformed {form} form: {message}")]
    MalformedSpecialForm {
        form: String,
        message: String,
        span: Option<SourceSpan>,
    },

    #[error("'{form}' is not allowed inside an expression")]
    NestedDefForbidden {
        form: String,
        span: Option<SourceSpan>,
    },

    #[error("illegal recur: {message}")]
    IllegalRecur {
        message: String,
        span: Option<SourceSpan>,
    },

    #[error("recur expects {expected} arguments, found {found}")]
    RecurArityMismatch {
        expected: usize,
        found: usize,
        span: Option<SourceSpan>,
    },

    #[error("unquote-splicing is only valid inside a sequence template")]
    SpliceNotInSequence { span: Option<SourceSpan> },

    #[error("only one binding may follow '&' in a pattern")]
    MultipleRestBindings { span: Option<SourceSpan> },
}

impl AnalyzerError {
    pub fn span(&self) -> Option<&SourceSpan> {
        match self {
            Self::UnresolvedSymbol { span, .. }
            | Self::UnsupportedDestructuring { span, .. }
            | Self::MalformedSpecialForm { span, .. }
            | Self::NestedDefForbidden { span, .. }
            | Self::IllegalRecur { span, .. }
            | Self::RecurArityMismatch { span, .. }
            | Self::SpliceNotInSequence { span }
            | Self::MultipleRestBindings { span } => span.as_ref(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnresolvedSymbol { .. } => "A001",
            Self::UnsupportedDestructuring { .. } => "A002",
            Self::MalformedSpecialForm { .. } => "A003",
            Self::NestedDefForbidden { .. } => "A004",
            Self::IllegalRecur { .. } => "A005",
            Self::RecurArityMismatch { .. } => "A006",
            Self::SpliceNotInSequence { .. } => "A007",
            Self::MultipleRestBindings { .. } => "A008",
        }
    }

    pub fn to_diagnostic(&self) -> DiagnosticInfo {
        let mut diagnostic = DiagnosticInfo::error(self.error_code(), &self.to_string());

        if let Some(span) = self.span() {
            diagnostic = diagnostic.with_primary_span(span.clone());
        }

        match self {
            Self::UnresolvedSymbol { similar, .. } if !similar.is_empty() => {
                let message = if similar.len() == 1 {
                    format!("did you mean `{}`?", similar[0])
                } else {
                    format!("did you mean one of: {}?", similar.join(", "))
                };
                diagnostic =
                    diagnostic.with_hint(ErrorHint::new(&message).with_suggestion(&similar[0]));
            }
            Self::IllegalRecur { .. } => {
                diagnostic =
                    diagnostic.with_note("recur must target an enclosing fn or loop frame");
            }
            Self::NestedDefForbidden { .. } => {
                diagnostic = diagnostic.with_note("definitions are only valid at the top level");
            }
            _ => {}
        }

        diagnostic
    }
}
