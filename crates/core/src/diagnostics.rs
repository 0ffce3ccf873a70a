//! Diagnostics channel shared by every compiler stage

use serde::Serialize;
use std::fmt;

use crate::symbols::SymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Note,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<SymbolId>,
}

impl Diagnostic {
    pub fn note(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Note,
            message: message.into(),
            element: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            element: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            element: None,
        }
    }

    pub fn at(mut self, element: &SymbolId) -> Self {
        self.element = Some(element.clone());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match &self.element {
            Some(element) => write!(f, "{label}: {} [{element}]", self.message),
            None => write!(f, "{label}: {}", self.message),
        }
    }
}

/// Host-side receiver of compiler messages
pub trait Messager {
    fn print_message(&mut self, diagnostic: Diagnostic);
}

/// Collecting messager that also mirrors every message into `tracing`
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    /// Forward everything collected so far to another messager
    pub fn forward_to(&self, messager: &mut dyn Messager) {
        for diagnostic in &self.entries {
            messager.print_message(diagnostic.clone());
        }
    }
}

impl Messager for Diagnostics {
    fn print_message(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Note => tracing::info!("{}", diagnostic),
            Severity::Warning => tracing::warn!("{}", diagnostic),
            Severity::Error => tracing::error!("{}", diagnostic),
        }
        self.entries.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_severity() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.print_message(Diagnostic::warning("careful"));
        diagnostics.print_message(Diagnostic::error("broken").at(&SymbolId::new("demo.A")));

        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.count(Severity::Warning), 1);
        assert_eq!(
            diagnostics.entries()[1].to_string(),
            "error: broken [demo.A]"
        );
    }
}
