//! Diagnostic reporting for lowering errors
//!
//! `DiagnosticSink` is the service lowering routines report user-facing
//! errors to. `Diagnostic` renders a reported error with source context,
//! either to the terminal or as JSON for editor integration.

use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, LabelStyle, Severity};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use kiln_syntax::Span;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::LoweringDiagnostic;

/// Receiver of user-facing lowering errors
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: LoweringDiagnostic);
}

impl DiagnosticSink for Vec<LoweringDiagnostic> {
    fn report(&mut self, diagnostic: LoweringDiagnostic) {
        self.push(diagnostic);
    }
}

/// Error code for a diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        self.0
    }
}

/// A diagnostic message with source code context
pub struct Diagnostic {
    inner: CsDiagnostic<usize>,
    code: Option<ErrorCode>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            inner: CsDiagnostic::new(severity).with_message(message),
            code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.inner = self.inner.with_code(code.0);
        self.code = Some(code);
        self
    }

    /// Add the primary label (main error location)
    pub fn with_primary_label(mut self, file_id: usize, span: Span, message: impl Into<String>) -> Self {
        let label = Label::primary(file_id, span.start..span.end).with_message(message);
        self.inner.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.inner.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.inner.notes.push(format!("help: {}", help.into()));
        self
    }

    pub fn code(&self) -> Option<&ErrorCode> {
        self.code.as_ref()
    }

    /// Create a diagnostic from a reported lowering error
    pub fn from_lowering(error: &LoweringDiagnostic, file_id: usize) -> Self {
        use LoweringDiagnostic::*;

        let diag = Diagnostic::error(error.to_string())
            .with_code(error_code(error))
            .with_note(format!("message key: {}", error.message_code()));
        let span = error.span();

        match error {
            BadAssignLeft { .. } => diag
                .with_primary_label(file_id, span, "cannot assign to this expression")
                .with_help("assign to a name, a property or an element"),
            BadDestructOp { .. } => diag
                .with_primary_label(file_id, span, "compound operator on a pattern")
                .with_help("use plain '=' with destructuring patterns"),
            BadForInLhs { .. } => diag.with_primary_label(file_id, span, "not assignable"),
            BadForInDestruct { .. } => diag
                .with_primary_label(file_id, span, "unsupported pattern")
                .with_help("use `for (let [key, value] in obj)` or a for-of loop"),
            BadIncDec { .. } => diag.with_primary_label(file_id, span, "not a reference"),
            BreakOutsideTarget { .. } => diag.with_primary_label(file_id, span, "nothing to break out of"),
            ContinueOutsideLoop { .. } => diag.with_primary_label(file_id, span, "not inside a loop"),
            UndefinedLabel { .. } => diag.with_primary_label(file_id, span, "label not found"),
            ContinueNonLoopLabel { .. } => diag.with_primary_label(file_id, span, "label is not on a loop"),
            Redeclaration { .. } => diag.with_primary_label(file_id, span, "already declared in this scope"),
            NumericTemplateMixed { .. } => diag
                .with_primary_label(file_id, span, "mixed decorators")
                .with_help("declare @numericTemplate decorators on their own"),
        }
    }

    /// Emit the diagnostic to stderr with colors
    pub fn emit(&self, files: &SimpleFiles<String, String>) -> Result<(), codespan_reporting::files::Error> {
        let mut writer = StandardStream::stderr(ColorChoice::Auto);
        let config = term::Config::default();
        term::emit(&mut writer, &config, files, &self.inner)
    }

    /// Get the underlying codespan diagnostic (for testing/custom rendering)
    pub fn inner(&self) -> &CsDiagnostic<usize> {
        &self.inner
    }

    /// Convert to JSON representation for tool integration
    pub fn to_json(&self, files: &SimpleFiles<String, String>) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&JsonDiagnostic::from_diagnostic(self, files))
    }
}

/// JSON representation of a diagnostic
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub code: Option<String>,
    pub severity: String,
    pub message: String,
    pub labels: Vec<JsonLabel>,
    pub notes: Vec<String>,
}

/// JSON representation of a diagnostic label
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLabel {
    pub file: String,
    /// 1-indexed
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub message: Option<String>,
    /// "primary" or "secondary"
    pub style: String,
}

impl JsonDiagnostic {
    pub fn from_diagnostic(diag: &Diagnostic, files: &SimpleFiles<String, String>) -> Self {
        let severity = match diag.inner.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
            Severity::Bug => "bug",
        };

        let labels = diag
            .inner
            .labels
            .iter()
            .filter_map(|label| {
                let file = files.get(label.file_id).ok()?;
                let start = file.location((), label.range.start).ok()?;
                let end = file.location((), label.range.end).ok()?;

                Some(JsonLabel {
                    file: file.name().to_string(),
                    start_line: start.line_number,
                    start_column: start.column_number,
                    end_line: end.line_number,
                    end_column: end.column_number,
                    message: Some(label.message.clone()),
                    style: match label.style {
                        LabelStyle::Primary => "primary",
                        LabelStyle::Secondary => "secondary",
                    }
                    .to_string(),
                })
            })
            .collect();

        JsonDiagnostic {
            code: diag.code.as_ref().map(|c| c.0.to_string()),
            severity: severity.to_string(),
            message: diag.inner.message.clone(),
            labels,
            notes: diag.inner.notes.clone(),
        }
    }
}

/// Get error code for a lowering diagnostic
pub fn error_code(error: &LoweringDiagnostic) -> ErrorCode {
    use LoweringDiagnostic::*;

    match error {
        BadAssignLeft { .. } => ErrorCode("E4001"),
        BadDestructOp { .. } => ErrorCode("E4002"),
        BadForInLhs { .. } => ErrorCode("E4003"),
        BadForInDestruct { .. } => ErrorCode("E4004"),
        BadIncDec { .. } => ErrorCode("E4005"),
        BreakOutsideTarget { .. } => ErrorCode("E4006"),
        ContinueOutsideLoop { .. } => ErrorCode("E4007"),
        UndefinedLabel { .. } => ErrorCode("E4008"),
        ContinueNonLoopLabel { .. } => ErrorCode("E4009"),
        Redeclaration { .. } => ErrorCode("E4010"),
        NumericTemplateMixed { .. } => ErrorCode("E4011"),
    }
}

/// Helper to create a SimpleFiles instance from source code
pub fn create_files(path: impl Into<PathBuf>, source: impl Into<String>) -> SimpleFiles<String, String> {
    let mut files = SimpleFiles::new();
    files.add(path.into().display().to_string(), source.into());
    files
}
