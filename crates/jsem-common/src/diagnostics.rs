//! Diagnostics reported against analyzed files.
//!
//! The semantic core itself never reports anything; it only produces the
//! resolved symbol/type graph. Rule checks run by the external harness use a
//! [`DiagnosticCollector`] to register issues against a node's span or a
//! plain line number.

use crate::span::Span;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Error,
    Warning,
    Info,
}

/// One issue registered by a rule check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub message: String,
    /// Span of the offending node, when the check targeted a node.
    pub span: Option<Span>,
    /// 1-based line, when the check targeted a whole line.
    pub line: Option<u32>,
}

impl Diagnostic {
    pub fn at_span(category: DiagnosticCategory, span: Span, message: impl Into<String>) -> Self {
        Diagnostic {
            category,
            message: message.into(),
            span: Some(span),
            line: None,
        }
    }

    pub fn at_line(category: DiagnosticCategory, line: u32, message: impl Into<String>) -> Self {
        Diagnostic {
            category,
            message: message.into(),
            span: None,
            line: Some(line),
        }
    }
}

/// Accumulates diagnostics for one file during a checking pass.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report_at_span(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::at_span(DiagnosticCategory::Warning, span, message));
    }

    pub fn report_at_line(&mut self, line: u32, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::at_line(DiagnosticCategory::Warning, line, message));
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
