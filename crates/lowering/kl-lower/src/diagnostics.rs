//! Non-fatal diagnostics collected during lowering

use derive_more::Display;
use kl_span::FileSpan;
use kl_syntax::SyntaxKind;
use std::slice::Iter;

/// How serious a diagnostic is
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Lowering continued
    #[display("warning")]
    Warning,
}

/// Stable diagnostic codes
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// Declaration or statement kind outside coverage, skipped
    #[display("lower::unhandled_syntax")]
    UnhandledSyntax,
    /// Non-void function can fall off its end
    #[display("lower::missing_return")]
    MissingReturn,
}

/// One recorded diagnostic
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Code
    pub code: DiagnosticCode,
    /// Kind of the offending node
    pub kind: SyntaxKind,
    /// Human-readable message
    pub message: String,
    /// Node location
    pub span: FileSpan,
}

/// Diagnostic sink; every entry is also forwarded to `log`
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a skipped construct
    pub fn unhandled_syntax(&mut self, kind: SyntaxKind, span: FileSpan) {
        self.warn(
            DiagnosticCode::UnhandledSyntax,
            kind,
            format!("{kind} is not supported and was skipped"),
            span,
        );
    }

    /// Records a non-void function whose end is reachable
    pub fn missing_return(&mut self, function: &str, span: FileSpan) {
        self.warn(
            DiagnosticCode::MissingReturn,
            SyntaxKind::FunctionDeclaration,
            format!("function `{function}` can reach its end without returning a value"),
            span,
        );
    }

    fn warn(&mut self, code: DiagnosticCode, kind: SyntaxKind, message: String, span: FileSpan) {
        log::warn!("{span}: {code}: {message}");
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            code,
            kind,
            message,
            span,
        });
    }

    /// All diagnostics in the order they were recorded
    pub fn iter(&self) -> Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Diagnostics with the given code
    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |diag| diag.code == code)
    }

    /// Number of diagnostics
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'diag> IntoIterator for &'diag Diagnostics {
    type Item = &'diag Diagnostic;
    type IntoIter = Iter<'diag, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kl_span::{FileId, Span};

    #[test]
    fn test_records_in_order() {
        let span = FileSpan::new(FileId(1), Span::new(4, 9));
        let mut diagnostics = Diagnostics::new();
        diagnostics.unhandled_syntax(SyntaxKind::WhileStatement, span);
        diagnostics.missing_return("f", span);

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.with_code(DiagnosticCode::MissingReturn).count(), 1);
        let first = diagnostics.iter().next().unwrap();
        assert_eq!(first.message, "WhileStatement is not supported and was skipped");
        assert_eq!(first.severity.to_string(), "warning");

        let mut codes = Vec::new();
        for diag in &diagnostics {
            codes.push(diag.code);
        }
        assert_eq!(
            codes,
            vec![DiagnosticCode::UnhandledSyntax, DiagnosticCode::MissingReturn]
        );
    }
}
