//! Diagnostics
//!
//! Collects recoverable findings during compilation. Nothing recorded here ever
//! aborts a run; the CLI prints the report once everything has been emitted.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // === References ===
    /// Placement or subview list names a view that does not exist
    DanglingViewRef,
    /// Menu view names a menu that does not exist
    DanglingMenuRef,
    /// Menu or icon-bar item names a page that does not exist
    DanglingPageRef,

    // === Payloads ===
    /// View configuration is not valid JSON
    MalformedPayload,
    /// Subview list entry has neither a string id nor an object id
    MalformedPlacement,
    /// External link with a scheme that is not passed through
    UnsafeLink,

    // === Graph ===
    /// Container references a view resolving to its own identity
    SelfReference,
    /// Container edge closes a cycle through other containers
    ContainerCycle,

    // === Naming ===
    /// Identity was disambiguated because the base slug was taken
    IdentityDisambiguated,
    /// Two pages route to the same path
    RouteCollision,
    /// View kind is not recognized; placeholder emitted
    UnknownViewKind,

    // === Schema ===
    /// Dialect cannot express a change; commented warning emitted
    DialectCapabilityGap,
    /// Journal entry cannot be translated into DDL
    InvalidJournalEntry,
    /// Model table name collides with a built-in table
    ReservedTableName,
    /// Journal entry names a model several models share
    AmbiguousModel,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DanglingViewRef => "R001",
            Self::DanglingMenuRef => "R002",
            Self::DanglingPageRef => "R003",
            Self::MalformedPayload => "P001",
            Self::MalformedPlacement => "P002",
            Self::UnsafeLink => "P003",
            Self::SelfReference => "G001",
            Self::ContainerCycle => "G002",
            Self::IdentityDisambiguated => "N001",
            Self::RouteCollision => "N002",
            Self::UnknownViewKind => "N003",
            Self::DialectCapabilityGap => "S001",
            Self::InvalidJournalEntry => "S002",
            Self::ReservedTableName => "S003",
            Self::AmbiguousModel => "S004",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::SelfReference
            | Self::ContainerCycle
            | Self::InvalidJournalEntry => Severity::Error,

            Self::DanglingViewRef
            | Self::DanglingMenuRef
            | Self::DanglingPageRef
            | Self::MalformedPayload
            | Self::MalformedPlacement
            | Self::UnsafeLink
            | Self::RouteCollision
            | Self::UnknownViewKind
            | Self::DialectCapabilityGap
            | Self::ReservedTableName
            | Self::AmbiguousModel => Severity::Warning,

            Self::IdentityDisambiguated => Severity::Info,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// View, page, menu or table the finding is about
    pub subject: String,
    /// Diagnostic code
    pub code: DiagnosticCode,
    /// Human-readable message
    pub message: String,
    /// Additional context (e.g., related ids, cycle members)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(subject: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.subject
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of diagnostics from one compilation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic item, mirroring it to the log
    pub fn push(&mut self, item: DiagnosticItem) {
        match item.severity() {
            Severity::Info => tracing::debug!(code = %item.code, subject = %item.subject, "{}", item.message),
            Severity::Warning | Severity::Error => {
                tracing::warn!(code = %item.code, subject = %item.subject, "{}", item.message)
            }
        }
        self.items.push(item);
    }

    /// Record a finding
    pub fn report(
        &mut self,
        subject: impl Into<String>,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) {
        self.push(DiagnosticItem::new(subject, code, message));
    }

    /// Record a dangling view reference
    pub fn dangling_view(&mut self, owner: &str, missing: &str) {
        self.push(DiagnosticItem::new(
            owner,
            DiagnosticCode::DanglingViewRef,
            format!("view '{}' is not defined in the blueprint; placement skipped", missing),
        ));
    }

    /// Record a malformed JSON payload
    pub fn malformed_payload(&mut self, view_id: &str, error: &str) {
        self.push(
            DiagnosticItem::new(
                view_id,
                DiagnosticCode::MalformedPayload,
                "configuration is not valid JSON; using the default configuration",
            )
            .with_context(error.to_string()),
        );
    }

    /// Record a container cycle
    pub fn container_cycle(&mut self, container: &str, target: &str, members: &[String]) {
        self.push(
            DiagnosticItem::new(
                container,
                DiagnosticCode::ContainerCycle,
                format!("subview '{}' closes a container cycle; slot replaced by a diagnostic block", target),
            )
            .with_context(format!("Cycle: {}", members.join(" -> "))),
        );
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Error)
    }

    /// Get all errors
    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Error)
    }

    /// Get all warnings
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    /// Items with a given code
    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(move |i| i.code == code)
    }

    /// Get all items
    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    /// Get total count
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Count errors
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Count warnings
    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Merge another Diagnostics into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Format all diagnostics for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }

        if self.has_errors() {
            output.push_str(&format!(
                "\n{} error(s), {} warning(s)\n",
                self.error_count(),
                self.warning_count()
            ));
        } else if !self.is_empty() {
            output.push_str(&format!("\n{} warning(s)\n", self.warning_count()));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticItem;
    type IntoIter = std::vec::IntoIter<DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_severity() {
        assert_eq!(DiagnosticCode::ContainerCycle.severity(), Severity::Error);
        assert_eq!(DiagnosticCode::DanglingViewRef.severity(), Severity::Warning);
        assert_eq!(DiagnosticCode::IdentityDisambiguated.severity(), Severity::Info);
    }

    #[test]
    fn test_diagnostics_collection() {
        let mut diags = Diagnostics::new();
        diags.dangling_view("home", "ghost");
        diags.container_cycle("a", "b", &["a".to_string(), "b".to_string(), "a".to_string()]);

        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 1);
        assert!(diags.has_errors());
        assert_eq!(diags.with_code(DiagnosticCode::DanglingViewRef).count(), 1);
        assert!(diags.format_all().contains("a -> b -> a"));
    }
}
