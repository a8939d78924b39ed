//! Diagnostics sink shared between the IR builder and its collaborators.
//!
//! Handlers take `&self` so one handler can be shared through an `Arc`
//! by the statement mapper and the access computation.

use crate::ast::StmtId;
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Note,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    /// Statement the diagnostic refers to, if any.
    pub stmt: Option<StmtId>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            level: DiagnosticLevel::Error,
            message: message.into(),
            stmt: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            level: DiagnosticLevel::Warning,
            message: message.into(),
            stmt: None,
        }
    }

    pub fn at(mut self, stmt: StmtId) -> Self {
        self.stmt = Some(stmt);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.level {
            DiagnosticLevel::Error => "error",
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Note => "note",
        };
        write!(f, "{level}: {}", self.message)
    }
}

pub trait DiagnosticHandler: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);

    fn error_count(&self) -> usize;

    fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn error(&self, message: &str) {
        self.report(Diagnostic::error(message));
    }

    fn warning(&self, message: &str) {
        self.report(Diagnostic::warning(message));
    }
}

/// Handler that keeps every reported diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingDiagnosticHandler {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnosticHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    pub fn warning_count(&self) -> usize {
        self.count(DiagnosticLevel::Warning)
    }

    pub fn clear(&self) {
        self.diagnostics.lock().clear();
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics
            .lock()
            .iter()
            .filter(|d| d.level == level)
            .count()
    }
}

impl DiagnosticHandler for CollectingDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.lock().push(diagnostic);
    }

    fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }
}
