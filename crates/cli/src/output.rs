//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output.

use luna_core::config::{ConfigValue, Diagnostic, Note, Resolution, Schema, Severity};
use owo_colors::{OwoColorize, Stream};
use std::fmt::Write as _;

/// Status message helpers
///
/// Markers are colored only when the target stream supports it and
/// `owo_colors::set_override(false)` has not been called.
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".if_supports_color(Stream::Stdout, |s| s.green()), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".if_supports_color(Stream::Stderr, |s| s.red()), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".if_supports_color(Stream::Stderr, |s| s.yellow()), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".if_supports_color(Stream::Stdout, |s| s.blue()), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.if_supports_color(Stream::Stdout, |s| s.bold()));
        println!("{}", "─".repeat(message.chars().count()));
    }
}

/// Print one diagnostic to stderr with a severity marker
pub fn print_diagnostic(diagnostic: &Diagnostic) {
    let line = format_diagnostic(diagnostic);
    match diagnostic.severity {
        Severity::Error => Status::error(&line),
        Severity::Warning => Status::warning(&line),
    }
}

/// Print every diagnostic and note, then a one-line summary
pub fn print_findings(resolution: &Resolution) {
    for diagnostic in &resolution.diagnostics {
        print_diagnostic(diagnostic);
    }
    for note in &resolution.notes {
        print_note(*note);
    }

    let errors = resolution.errors().count();
    let warnings = resolution.warnings().count();
    let summary = format!(
        "{}, {}",
        format_count(errors, "error", "errors"),
        format_count(warnings, "warning", "warnings")
    );
    if errors > 0 {
        Status::error(&summary);
    } else if warnings > 0 {
        Status::warning(&summary);
    } else {
        Status::success(&summary);
    }
}

/// Print an informational note
pub fn print_note(note: Note) {
    Status::info(&note.to_string());
}

/// Format a diagnostic without colors
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let mut line = format!("{} [{}]: {}", diagnostic.key, diagnostic.kind, diagnostic.message);
    if let Some(fragment) = &diagnostic.fragment {
        let _ = write!(line, " (from '{}')", fragment);
    }
    line
}

/// Render the resolved configuration as an aligned `key = value` table
pub fn format_config_table(resolution: &Resolution) -> String {
    let config = &resolution.config;
    let width = config.values().keys().map(String::len).max().unwrap_or(0);

    let mut out = String::new();
    for (key, value) in config.values() {
        let source = config.source_of(key).unwrap_or("?");
        let _ = writeln!(
            out,
            "{:<width$} = {}  # {}",
            key,
            format_value(value),
            source,
            width = width
        );
    }
    out
}

/// Render a schema as an aligned table of key, type and allowed values
pub fn format_schema_table(schema: &Schema) -> String {
    let width = schema.keys().map(str::len).max().unwrap_or(0);

    let mut out = String::new();
    for (key, entry) in schema.iter() {
        let allowed = entry
            .constraint
            .as_ref()
            .map(|c| format!(" {}", c.describe()))
            .unwrap_or_default();
        let _ = write!(out, "{:<width$}  {}{}", key, entry.kind, allowed, width = width);
        if !entry.description.is_empty() {
            let _ = write!(out, "  # {}", entry.description);
        }
        out.push('\n');
    }
    out
}

/// Format a value the way it would appear in a Gradle script
pub fn format_value(value: &ConfigValue) -> String {
    value.to_string()
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
