//! `#line` directive state machine.
//!
//! The parser records every `#line` directive of a source text together with the
//! physical line it sits on. [`DirectiveMap`] turns that list into ranges of physical
//! lines, each carrying one of three states:
//!
//! - `Default` - physical file and physical line numbers
//! - `Remapped` - a fixed line delta and optionally another file
//! - `Hidden` - spans are not debuggable and produce hidden sequence points
//!
//! A directive takes effect on the line after it. `#line N` without a file keeps the
//! file of the current mapping; `#line default` drops back to the physical mapping.
//! Directives with a line number of zero or above `0xFEEFED` are ignored with a warning.

use crate::debuginfo::diagnostics::{DiagnosticCategory, Diagnostics, SourceLocation};

/// Highest line number a `#line` directive may declare.
pub const MAX_DIRECTIVE_LINE: u32 = 0x00FE_EFED;

/// What a `#line` directive asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineDirectiveKind {
    /// `#line default`
    Default,
    /// `#line hidden`
    Hidden,
    /// `#line N` or `#line N "file"`
    Numbered {
        /// Line number the following physical line reports
        line: u32,
        /// File the following lines are attributed to
        file: Option<String>,
    },
}

/// A `#line` directive as found by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDirective {
    /// 1-based physical line the directive is written on
    pub line: u32,
    /// Directive payload
    pub kind: LineDirectiveKind,
}

impl LineDirective {
    /// `#line default` on physical `line`.
    #[must_use]
    pub fn default_at(line: u32) -> Self {
        LineDirective {
            line,
            kind: LineDirectiveKind::Default,
        }
    }

    /// `#line hidden` on physical `line`.
    #[must_use]
    pub fn hidden_at(line: u32) -> Self {
        LineDirective {
            line,
            kind: LineDirectiveKind::Hidden,
        }
    }

    /// `#line mapped ["file"]` on physical `line`.
    #[must_use]
    pub fn numbered_at(line: u32, mapped: u32, file: Option<&str>) -> Self {
        LineDirective {
            line,
            kind: LineDirectiveKind::Numbered {
                line: mapped,
                file: file.map(str::to_string),
            },
        }
    }
}

/// Mapping state in effect for a range of physical lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveState {
    /// Physical file, physical lines
    Default,
    /// Lines shifted by `delta`; `file` of `None` means the physical file
    Remapped {
        /// Raw (unnormalized) file text of the directive
        file: Option<String>,
        /// Added to the physical line
        delta: i64,
    },
    /// Not debuggable
    Hidden {
        /// File of the mapping that was active before `#line hidden`
        file: Option<String>,
    },
}

/// Result of mapping one physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappedLine {
    /// Visible line in `file` (`None` = the physical file)
    Visible {
        /// Raw file text, when remapped
        file: Option<String>,
        /// Reported 1-based line
        line: u32,
    },
    /// Hidden; `file` is the file of the surrounding mapping
    Hidden {
        /// Raw file text, when remapped
        file: Option<String>,
    },
}

/// Per-source directive ranges, sorted by physical line.
#[derive(Debug, Clone, Default)]
pub struct DirectiveMap {
    // (directive physical line, state for the lines after it)
    entries: Vec<(u32, DirectiveState)>,
}

impl DirectiveMap {
    /// Build the map for `source_path`, reporting ignored directives.
    pub fn build(
        source_path: &str,
        directives: &[LineDirective],
        diagnostics: &Diagnostics,
    ) -> Self {
        let mut sorted: Vec<&LineDirective> = directives.iter().collect();
        sorted.sort_by_key(|d| d.line);

        let mut entries = Vec::with_capacity(sorted.len());
        let mut current_file: Option<String> = None;

        for directive in sorted {
            let state = match &directive.kind {
                LineDirectiveKind::Default => {
                    current_file = None;
                    DirectiveState::Default
                }
                LineDirectiveKind::Hidden => DirectiveState::Hidden {
                    file: current_file.clone(),
                },
                LineDirectiveKind::Numbered { line, file } => {
                    if *line == 0 || *line > MAX_DIRECTIVE_LINE {
                        diagnostics.warning_at(
                            DiagnosticCategory::LineDirective,
                            format!("Line number {line} is out of range; directive ignored"),
                            SourceLocation::new(source_path, directive.line),
                        );
                        continue;
                    }
                    if file.is_some() {
                        current_file.clone_from(file);
                    }
                    DirectiveState::Remapped {
                        file: current_file.clone(),
                        delta: i64::from(*line) - (i64::from(directive.line) + 1),
                    }
                }
            };
            entries.push((directive.line, state));
        }

        DirectiveMap { entries }
    }

    /// Returns `true` when the source has no effective directives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// State in effect on `physical_line`.
    #[must_use]
    pub fn state_at(&self, physical_line: u32) -> &DirectiveState {
        const DEFAULT: &DirectiveState = &DirectiveState::Default;

        let count = self.entries.partition_point(|(line, _)| *line < physical_line);
        match count.checked_sub(1) {
            Some(index) => &self.entries[index].1,
            None => DEFAULT,
        }
    }

    /// Map a physical line through the state in effect at `state_line`.
    ///
    /// Spans are mapped with the state of their start line so that both ends land in
    /// the same file.
    #[must_use]
    pub fn map_line(&self, state_line: u32, physical_line: u32) -> MappedLine {
        match self.state_at(state_line) {
            DirectiveState::Default => MappedLine::Visible {
                file: None,
                line: physical_line,
            },
            DirectiveState::Remapped { file, delta } => MappedLine::Visible {
                file: file.clone(),
                line: u32::try_from((i64::from(physical_line) + delta).max(1))
                    .unwrap_or(MAX_DIRECTIVE_LINE),
            },
            DirectiveState::Hidden { file } => MappedLine::Hidden { file: file.clone() },
        }
    }
}
