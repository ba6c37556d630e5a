//! Diagnostics produced during resolution
//!
//! Nothing here is fatal. Callers that want fail-fast behavior inspect the
//! severities (or call [`Resolution::ensure_valid`](super::Resolution::ensure_valid)).

use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reported; never fails a strict run on its own
    Warning,
    /// Fails `ensure_valid` and the CLI's `check`
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// What kind of finding a diagnostic records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    /// Value's runtime type disagrees with the schema
    TypeMismatch,
    /// Value has the right type but is outside the allowed set
    ConstraintViolation,
    /// Key has no schema entry
    UnknownKey,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::TypeMismatch => "type-mismatch",
            DiagnosticKind::ConstraintViolation => "constraint-violation",
            DiagnosticKind::UnknownKey => "unknown-key",
        };
        f.write_str(name)
    }
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity assigned by the [`SeverityPolicy`]
    pub severity: Severity,
    /// What went wrong
    pub kind: DiagnosticKind,
    /// Configuration key the finding is about
    pub key: String,
    /// Fragment that supplied the offending value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
    /// Human-readable explanation
    pub message: String,
}

impl Diagnostic {
    /// Whether this finding has error severity
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] {}: {}", self.severity, self.kind, self.key, self.message)?;
        if let Some(fragment) = &self.fragment {
            write!(f, " (from '{}')", fragment)?;
        }
        Ok(())
    }
}

/// Informational findings that are not part of the diagnostic list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Note {
    /// The resolved configuration has zero keys
    EmptyResolution,
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Note::EmptyResolution => f.write_str("resolved configuration is empty"),
        }
    }
}

/// Maps each diagnostic kind to the severity it is reported with
///
/// Only reporting changes: an unknown key promoted to `Error` is still kept in
/// the resolved configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityPolicy {
    /// Severity of [`DiagnosticKind::TypeMismatch`]
    pub type_mismatch: Severity,
    /// Severity of [`DiagnosticKind::ConstraintViolation`]
    pub constraint_violation: Severity,
    /// Severity of [`DiagnosticKind::UnknownKey`]
    pub unknown_key: Severity,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            type_mismatch: Severity::Error,
            constraint_violation: Severity::Error,
            unknown_key: Severity::Warning,
        }
    }
}

impl SeverityPolicy {
    /// Treat unknown keys as errors too
    #[must_use]
    pub fn strict() -> Self {
        Self {
            unknown_key: Severity::Error,
            ..Self::default()
        }
    }

    /// Severity for a kind of finding
    #[must_use]
    pub fn severity_of(&self, kind: DiagnosticKind) -> Severity {
        match kind {
            DiagnosticKind::TypeMismatch => self.type_mismatch,
            DiagnosticKind::ConstraintViolation => self.constraint_violation,
            DiagnosticKind::UnknownKey => self.unknown_key,
        }
    }
}
