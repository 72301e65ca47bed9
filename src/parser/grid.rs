//! Grid layout: subject tables with one tab-separated row per meeting.
//!
//! ```text
//! CO2003 - Data Structures\t4 credits
//! Nhóm lớp\t...
//! L01_TN01\t...
//! Thứ 4\t- - - - - - - 8 9 10 11 12 - - - -\tC6-103\t1\t\t------7-9-1-3-5-7---
//! Thứ 6\t- - - - - - - 8 9 - - - - - - -\tC5-503\t1\t\t12--56789-12345678--
//! ```
//!
//! The period column has one token per hourly period; `-` is an empty
//! period and the numeric run marks when the class meets.

use std::collections::BTreeSet;

use super::{FlaggedLine, GRID_HEADER_MARKER, LayoutOutput, SourceLine, sanitize_text};
use crate::error::{ParseLineError, SlotError};
use crate::model::TimeSlotDefinition;
use crate::period_clock::PeriodClock;
use crate::week_mask;

/// Role tags that open a class-code marker line.
const ROLE_TAGS: [&str; 7] = ["CC", "L", "CN", "TN", "DT", "AN", "P"];

const BLANK_PERIOD: &str = "-";

/// Column positions within a day row.
const COL_DAY: usize = 0;
const COL_PERIODS: usize = 1;
const COL_ROOM: usize = 2;
const COL_MASK: usize = 5;

/// Scan position inside one subject table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ParseCursor {
    class_code: Option<String>,
    slot_index: usize,
}

impl ParseCursor {
    fn enter_class(self, class_code: String) -> Self {
        Self {
            class_code: Some(class_code),
            slot_index: 0,
        }
    }

    fn advance(self) -> Self {
        Self {
            slot_index: self.slot_index + 1,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SubjectHeader {
    code: String,
    name: String,
}

/// `CODE - Name[\t...]`, split on the first `" - "` or else the first `-`.
fn parse_subject_header(text: &str) -> Option<SubjectHeader> {
    let first = text.split('\t').next()?.trim();
    let (code, name) = first.split_once(" - ").or_else(|| first.split_once('-'))?;
    let (code, name) = (code.trim(), name.trim());
    if code.is_empty() || name.is_empty() {
        return None;
    }
    Some(SubjectHeader {
        code: code.to_string(),
        name: name.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GridLine<'a> {
    Skip,
    DayRow,
    ClassMarker(&'a str),
    End,
}

fn classify(text: &str) -> GridLine<'_> {
    let first = text.split('\t').next().unwrap_or_default().trim();
    if first == "Thứ" || first.starts_with("DK") {
        return GridLine::Skip;
    }
    if first.starts_with("Thứ ") || first.to_lowercase() == "chủ nhật" {
        return GridLine::DayRow;
    }
    if is_class_code(first) {
        return GridLine::ClassMarker(first);
    }
    GridLine::End
}

/// Leading letters form a role tag and a digit follows them.
fn is_class_code(token: &str) -> bool {
    let letters: String = token.chars().take_while(|c| c.is_ascii_uppercase()).collect();
    let rest = &token[letters.len()..];
    ROLE_TAGS.contains(&letters.as_str()) && rest.starts_with(|c: char| c.is_ascii_digit())
}

/// `Thứ N` -> N-1 (Monday is `Thứ 2`), `Chủ nhật` -> 7.
fn grid_day(token: &str) -> Result<u32, SlotError> {
    let token = token.trim();
    if token.to_lowercase() == "chủ nhật" {
        return Ok(7);
    }
    token
        .strip_prefix("Thứ ")
        .and_then(|n| n.trim().parse::<u32>().ok())
        .filter(|n| (2..=7).contains(n))
        .map(|n| n - 1)
        .ok_or_else(|| SlotError::UnknownDay(token.to_string()))
}

/// The numeric run in a period column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PeriodRun {
    start: u32,
    count: u32,
    /// Blank markers strictly before the first numeric token.
    leading_blanks: u32,
}

impl PeriodRun {
    fn scan(column: &str) -> Result<Self, SlotError> {
        let tokens: Vec<&str> = column.split_whitespace().collect();
        let first_numeric = tokens
            .iter()
            .position(|t| *t != BLANK_PERIOD)
            .ok_or_else(|| SlotError::Malformed("period column has no class periods".to_string()))?;

        let leading_blanks = tokens[..first_numeric]
            .iter()
            .filter(|t| **t == BLANK_PERIOD)
            .count() as u32;

        let start = tokens[first_numeric].parse::<u32>().map_err(|_| {
            SlotError::Malformed(format!("invalid period token '{}'", tokens[first_numeric]))
        })?;

        let count = tokens[first_numeric..]
            .iter()
            .take_while(|t| t.parse::<u32>().is_ok())
            .count() as u32;

        Ok(Self {
            start,
            count,
            leading_blanks,
        })
    }

    fn is_aligned(&self) -> bool {
        self.leading_blanks + 1 == self.start
    }
}

pub struct GridFormat {
    week_offset: u32,
    clock: PeriodClock,
}

impl GridFormat {
    pub fn new(week_offset: u32) -> Self {
        Self {
            week_offset,
            clock: PeriodClock::HOURLY,
        }
    }

    pub fn parse(&self, lines: &[SourceLine<'_>]) -> LayoutOutput {
        let mut output = LayoutOutput::default();
        let mut index = 0;

        while index < lines.len() {
            if !lines[index].text.contains(GRID_HEADER_MARKER) {
                index += 1;
                continue;
            }

            let header = index
                .checked_sub(1)
                .and_then(|prev| parse_subject_header(lines[prev].text));
            match header {
                Some(header) => {
                    tracing::debug!("Subject table {} ({}) at line {}", header.name, header.code, lines[index].number);
                    index = self.parse_table(&header, lines, index + 1, &mut output);
                }
                None => {
                    output.failures.push(ParseLineError::malformed(
                        lines[index].number,
                        "class table has no `CODE - Name` subject header above it",
                    ));
                    index += 1;
                }
            }
        }

        output
    }

    /// Scan one subject table; returns the index of the first line after it.
    fn parse_table(
        &self,
        header: &SubjectHeader,
        lines: &[SourceLine<'_>],
        start: usize,
        output: &mut LayoutOutput,
    ) -> usize {
        let mut cursor = ParseCursor::default();
        let mut index = start;

        while let Some(line) = lines.get(index) {
            cursor = match classify(line.text) {
                GridLine::Skip => cursor,
                GridLine::ClassMarker(code) => cursor.enter_class(code.to_string()),
                GridLine::DayRow => {
                    match self.parse_day_row(header, &cursor, line.text) {
                        Ok((slot, run)) => {
                            if !run.is_aligned() {
                                tracing::warn!(
                                    "Line {}: period {} preceded by {} blank columns",
                                    line.number,
                                    run.start,
                                    run.leading_blanks
                                );
                                output.flagged.push(FlaggedLine {
                                    line: line.number,
                                    reason: format!(
                                        "period {} preceded by {} blank columns",
                                        run.start, run.leading_blanks
                                    ),
                                });
                            }
                            output.catalog.push_slot(slot);
                        }
                        Err(kind) => output.failures.push(ParseLineError::new(line.number, kind)),
                    }
                    cursor.advance()
                }
                GridLine::End => break,
            };
            index += 1;
        }

        index
    }

    fn parse_day_row(
        &self,
        header: &SubjectHeader,
        cursor: &ParseCursor,
        text: &str,
    ) -> Result<(TimeSlotDefinition, PeriodRun), SlotError> {
        let columns: Vec<&str> = text.split('\t').map(str::trim).collect();
        let column = |index: usize, name: &str| {
            columns
                .get(index)
                .copied()
                .filter(|c| !c.is_empty())
                .ok_or_else(|| SlotError::Malformed(format!("missing {} column", name)))
        };

        let class_code = cursor
            .class_code
            .as_deref()
            .ok_or_else(|| SlotError::Malformed("day row before any class code".to_string()))?;

        let day = grid_day(column(COL_DAY, "day")?)?;
        let run = PeriodRun::scan(column(COL_PERIODS, "period")?)?;
        let room = column(COL_ROOM, "room")?;
        let mask = column(COL_MASK, "week mask")?;

        let clock = self.clock.clock_for(run.start, run.count)?;
        let active_weeks = week_mask::decode(mask, self.week_offset)?;

        let free_text = columns.get(COL_MASK + 1..).map(|rest| rest.join(" ")).unwrap_or_default();
        let suffix = class_code.split('_').nth(cursor.slot_index).unwrap_or_default();
        let notes = sanitize_text(&format!("{}\n{}\n{}", header.code, suffix, free_text.trim()));

        let slot = TimeSlotDefinition {
            subject_name: header.name.clone(),
            class_code: class_code.to_string(),
            days: BTreeSet::from([day]),
            start_time: clock.start,
            duration_minutes: clock.duration_minutes,
            room: sanitize_text(room),
            active_weeks,
            notes,
        };
        Ok((slot, run))
    }
}
