// Diagnostic rendering for analyzer errors.
// Provides source location information, code snippets, and helpful hints.

use serde::{Deserialize, Serialize};

/// Source span representing a range in the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub file_path: Option<String>,
    pub source_text: Option<String>,
}

impl SourceSpan {
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
            file_path: None,
            source_text: None,
        }
    }

    pub fn with_file(mut self, file_path: String) -> Self {
        self.file_path = Some(file_path);
        self
    }

    pub fn with_source_text(mut self, source_text: String) -> Self {
        self.source_text = Some(source_text);
        self
    }
}

/// Error severity levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Error,
    Warning,
}

/// Contextual hint for error resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorHint {
    pub message: String,
    pub suggested_fix: Option<String>,
}

impl ErrorHint {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            suggested_fix: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggested_fix = Some(suggestion.to_string());
        self
    }
}

/// Diagnostic information attached to a compile-time error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticInfo {
    pub error_code: String,
    pub severity: ErrorSeverity,
    pub primary_message: String,
    pub primary_span: Option<SourceSpan>,
    pub hints: Vec<ErrorHint>,
    pub notes: Vec<String>,
}

impl DiagnosticInfo {
    pub fn new(error_code: &str, severity: ErrorSeverity, message: &str) -> Self {
        Self {
            error_code: error_code.to_string(),
            severity,
            primary_message: message.to_string(),
            primary_span: None,
            hints: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn error(error_code: &str, message: &str) -> Self {
        Self::new(error_code, ErrorSeverity::Error, message)
    }

    pub fn warning(error_code: &str, message: &str) -> Self {
        Self::new(error_code, ErrorSeverity::Warning, message)
    }

    pub fn with_primary_span(mut self, span: SourceSpan) -> Self {
        self.primary_span = Some(span);
        self
    }

    pub fn with_hint(mut self, hint: ErrorHint) -> Self {
        self.hints.push(hint);
        self
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.notes.push(note.to_string());
        self
    }
}

/// Find similar symbols using Levenshtein distance
pub fn find_similar_symbols(target: &str, available: &[String]) -> Vec<String> {
    let mut candidates: Vec<_> = available
        .iter()
        .map(|s| (s, levenshtein_distance(target, s)))
        .filter(|(_, dist)| *dist <= 3 && *dist < target.len())
        .collect();

    candidates.sort_by_key(|(_, dist)| *dist);

    candidates
        .into_iter()
        .take(3)
        .map(|(s, _)| s.clone())
        .collect()
}

/// Calculate Levenshtein distance between two strings
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0; b_len + 1]; a_len + 1];

    for i in 0..=a_len {
        matrix[i][0] = i;
    }
    for j in 0..=b_len {
        matrix[0][j] = j;
    }

    for i in 1..=a_len {
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };
            matrix[i][j] = std::cmp::min(
                std::cmp::min(
                    matrix[i - 1][j] + 1, // deletion
                    matrix[i][j - 1] + 1, // insertion
                ),
                matrix[i - 1][j - 1] + cost, // substitution
            );
        }
    }

    matrix[a_len][b_len]
}

/// Pretty-print diagnostic information
pub struct DiagnosticFormatter {
    pub show_line_numbers: bool,
    pub context_lines: usize,
}

impl Default for DiagnosticFormatter {
    fn default() -> Self {
        Self {
            show_line_numbers: true,
            context_lines: 2,
        }
    }
}

impl DiagnosticFormatter {
    pub fn format_diagnostic(&self, diagnostic: &DiagnosticInfo) -> String {
        let mut output = String::new();

        let severity_str = match diagnostic.severity {
            ErrorSeverity::Error => "error",
            ErrorSeverity::Warning => "warning",
        };

        output.push_str(&format!(
            "{}: {}: {}\n",
            severity_str, diagnostic.error_code, diagnostic.primary_message
        ));

        if let Some(ref span) = diagnostic.primary_span {
            output.push_str(&self.format_source_span(span));
        }

        for hint in &diagnostic.hints {
            output.push_str(&format!("  = help: {}\n", hint.message));
            if let Some(ref suggestion) = hint.suggested_fix {
                output.push_str(&format!("  = suggestion: {}\n", suggestion));
            }
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("  = note: {}\n", note));
        }

        output
    }

    fn format_source_span(&self, span: &SourceSpan) -> String {
        let mut output = String::new();

        if let Some(ref file) = span.file_path {
            output.push_str(&format!(
                "  --> {}:{}:{}\n",
                file, span.start_line, span.start_column
            ));
        } else {
            output.push_str(&format!(
                "  --> line {}:{}\n",
                span.start_line, span.start_column
            ));
        }

        if let Some(ref source) = span.source_text {
            output.push_str(&self.format_source_snippet(source, span));
        }

        output
    }

    fn format_source_snippet(&self, source: &str, span: &SourceSpan) -> String {
        let lines: Vec<&str> = source.lines().collect();
        let mut output = String::new();

        let start_line = span.start_line.saturating_sub(1); // 0-based
        let end_line = span.end_line.saturating_sub(1);

        let context_start = start_line.saturating_sub(self.context_lines);
        let context_end = std::cmp::min(end_line + self.context_lines + 1, lines.len());

        let line_num_width = context_end.to_string().len();

        for (i, line) in lines
            .iter()
            .enumerate()
            .take(context_end)
            .skip(context_start)
        {
            let line_num = i + 1;
            let is_error_line = i >= start_line && i <= end_line;

            if self.show_line_numbers {
                output.push_str(&format!(
                    "{:width$} | {}\n",
                    line_num,
                    line,
                    width = line_num_width
                ));
            } else {
                output.push_str(&format!("{}\n", line));
            }

            if is_error_line && self.show_line_numbers {
                let start_col = if i == start_line {
                    span.start_column.saturating_sub(1)
                } else {
                    0
                };
                let end_col = if i == end_line { span.end_column } else { line.len() };

                output.push_str(&format!(
                    "{:width$} | {}{}\n",
                    "",
                    " ".repeat(start_col),
                    "^".repeat(std::cmp::max(1, end_col.saturating_sub(start_col))),
                    width = line_num_width
                ));
            }
        }

        output
    }
}
