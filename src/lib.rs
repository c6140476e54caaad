// Vesper Analyzer Library
// Semantic analysis phase of the Vesper compiler: reader forms in, typed
// AST out.
pub mod analyzer;
pub mod error_reporting;
pub mod form;
pub mod registry;

// Re-export the analysis entry points and the AST.
pub use analyzer::{
    Analyzer, AnalyzerError, AnalyzerResult, CatchClause, ExecutionContext, Node,
    NodeEnvironment, NodeKind, RecurFrame,
};
pub use error_reporting::{DiagnosticFormatter, DiagnosticInfo, SourceSpan};
pub use form::{Form, FormKind, Keyword, Symbol};
pub use registry::NamespaceRegistry;
