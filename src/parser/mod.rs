//! Timetable text parsing.
//!
//! Two export layouts are understood. [`TimetableParser::parse`] sniffs
//! the layout once per call and hands the whole document to the matching
//! strategy:
//! - [`GridFormat`]: per-subject tables introduced by a `Nhóm lớp` header,
//!   one tab-separated row per weekly meeting.
//! - [`BlockFormat`]: fixed-stride records with one field per line.
//!
//! Per-line failures never abort a parse; they are collected into the
//! [`ParseReport`] next to the slots that did parse.

pub mod block;
pub mod grid;

use serde::Serialize;

pub use block::BlockFormat;
pub use grid::GridFormat;

use crate::config::ParserConfig;
use crate::error::ParseLineError;
use crate::model::Catalog;

/// Marker token of the grid layout's class-table header.
pub const GRID_HEADER_MARKER: &str = "Nhóm lớp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Layout {
    Grid,
    Block,
}

/// A non-blank input line with its 1-based position in the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLine<'a> {
    pub number: usize,
    pub text: &'a str,
}

/// Split raw text into non-blank lines, keeping original line numbers.
pub fn source_lines(raw: &str) -> Vec<SourceLine<'_>> {
    raw.lines()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(index, text)| SourceLine {
            number: index + 1,
            text: text.trim_end_matches('\r'),
        })
        .collect()
}

/// A line that parsed but whose interpretation involved a guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlaggedLine {
    pub line: usize,
    pub reason: String,
}

/// What a layout strategy produces from one document.
#[derive(Debug, Clone, Default)]
pub struct LayoutOutput {
    pub catalog: Catalog,
    pub failures: Vec<ParseLineError>,
    pub flagged: Vec<FlaggedLine>,
}

/// Summary of one parse call for caller reporting.
#[derive(Debug, Clone)]
pub struct ParseReport {
    pub layout: Layout,
    pub slots_parsed: usize,
    pub subject_count: usize,
    pub failures: Vec<ParseLineError>,
    pub flagged: Vec<FlaggedLine>,
}

#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub catalog: Catalog,
    pub report: ParseReport,
}

/// Week offsets anchoring mask position 0 for each layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    pub grid_week_offset: u32,
    pub block_week_offset: u32,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            grid_week_offset: 37,
            block_week_offset: 1,
        }
    }
}

impl From<&ParserConfig> for ParserOptions {
    fn from(config: &ParserConfig) -> Self {
        Self {
            grid_week_offset: config.grid_week_offset,
            block_week_offset: config.block_week_offset,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimetableParser {
    options: ParserOptions,
}

impl TimetableParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ParserOptions {
        self.options
    }

    /// Grid iff any line carries the class-table header marker.
    pub fn detect_layout(lines: &[SourceLine<'_>]) -> Layout {
        if lines.iter().any(|l| l.text.contains(GRID_HEADER_MARKER)) {
            Layout::Grid
        } else {
            Layout::Block
        }
    }

    /// Parse raw text into a fresh catalog.
    pub fn parse(&self, raw: &str) -> ParseOutcome {
        let lines = source_lines(raw);
        let layout = Self::detect_layout(&lines);
        tracing::debug!("Parsing {} non-blank lines as {:?} layout", lines.len(), layout);

        let output = match layout {
            Layout::Grid => GridFormat::new(self.options.grid_week_offset).parse(&lines),
            Layout::Block => BlockFormat::new(self.options.block_week_offset).parse(&lines),
        };

        for failure in &output.failures {
            tracing::warn!("Skipped {}", failure);
        }

        let report = ParseReport {
            layout,
            slots_parsed: output.catalog.slot_count(),
            subject_count: output.catalog.len(),
            failures: output.failures,
            flagged: output.flagged,
        };
        tracing::info!(
            "Parsed {} time slots for {} subjects ({} failed lines, {} flagged)",
            report.slots_parsed,
            report.subject_count,
            report.failures.len(),
            report.flagged.len()
        );

        ParseOutcome {
            catalog: output.catalog,
            report,
        }
    }
}

/// Drop control characters other than `\n` and trim the result.
pub(crate) fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| *c == '\n' || !c.is_control())
        .collect::<String>()
        .trim_matches(|c: char| c == ' ')
        .to_string()
}
