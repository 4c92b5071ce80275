//! Diagnostics collection for debug-information emission.
//!
//! Some problems found while building debug information are compiler *warnings*: the
//! emit continues and still produces a complete document. They are collected here and
//! handed back to the compiler, which reports them next to its other diagnostics.
//!
//! # Reported conditions
//!
//! - [`DiagnosticCategory::Checksum`] - a checksum pragma disagrees with an earlier pragma
//!   or with the hash of the source it names; the pragma loses
//! - [`DiagnosticCategory::Pragma`] - a checksum pragma is malformed (bad GUID, odd number
//!   of hex digits, non-hex characters, empty hash) and is ignored
//! - [`DiagnosticCategory::LineDirective`] - a `#line` directive carries an unusable line
//!   number and is ignored
//!
//! Every entry is a warning and carries the location of the offending directive.
//!
//! # Thread Safety
//!
//! [`Diagnostics`] uses `boxcar::Vec` for lock-free appends, so methods built in parallel
//! can report into the same container without coordination.
//!
//! # Examples
//!
//! ```rust
//! use symscope::{Diagnostics, DiagnosticCategory, SourceLocation};
//!
//! let diagnostics = Diagnostics::new();
//! diagnostics.warning_at(
//!     DiagnosticCategory::Checksum,
//!     "Conflicting checksum for file 'a.cs'",
//!     SourceLocation::new("main.cs", 3),
//! );
//! assert_eq!(diagnostics.count(), 1);
//! ```

use std::fmt::{self, Write};

/// Category indicating the source of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// Conflicting checksum declarations for one document.
    Checksum,

    /// Malformed checksum pragma.
    Pragma,

    /// Unusable `#line` directive.
    LineDirective,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Checksum => write!(f, "Checksum"),
            DiagnosticCategory::Pragma => write!(f, "Pragma"),
            DiagnosticCategory::LineDirective => write!(f, "LineDirective"),
        }
    }
}

/// Syntactic location of the directive a diagnostic is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// Path of the source text containing the directive
    pub path: String,
    /// 1-based physical line of the directive
    pub line: u32,
}

impl SourceLocation {
    /// Create a location from a path and a 1-based line.
    pub fn new(path: impl Into<String>, line: u32) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.path, self.line)
    }
}

/// A single warning.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Category indicating the source of this diagnostic.
    pub category: DiagnosticCategory,

    /// Human-readable description of the issue.
    pub message: String,

    /// Location of the offending directive.
    pub location: SourceLocation,
}

impl Diagnostic {
    /// Creates a new warning at `location`.
    pub fn new(category: DiagnosticCategory, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            category,
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: warning {}: {}", self.location, self.category, self.message)
    }
}

/// Thread-safe container for collecting diagnostic entries.
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Creates a new empty diagnostics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
        }
    }

    /// Adds a warning attached to a directive location.
    pub fn warning_at(
        &self,
        category: DiagnosticCategory,
        message: impl Into<String>,
        location: SourceLocation,
    ) {
        self.push(Diagnostic::new(category, message, location));
    }

    /// Adds a diagnostic entry directly.
    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Returns true if any diagnostics have been collected.
    pub fn has_any(&self) -> bool {
        self.entries.count() > 0
    }

    /// Returns the total number of diagnostics.
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Returns an iterator over all diagnostics in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, d)| d)
    }

    /// Returns diagnostics filtered by category.
    pub fn by_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.category == category).collect()
    }

    /// Formats a summary of all diagnostics for display.
    pub fn summary(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "Diagnostics: {} warning(s)", self.count());
        for diag in self.iter() {
            let _ = writeln!(output, "  {diag}");
        }
        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}
