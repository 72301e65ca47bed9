//! Block layout: fixed-stride records, one field per line.
//!
//! A record opens with `<no>\t<subject>\t<class>[\t<notes>...]` and is
//! followed by five fields per component (day, start period, period
//! count, room, week mask). Records with two components (a lecture and a
//! lab sharing one class code) interleave them field by field:
//!
//! ```text
//! 2\tPhysics\tP01      2\tPhysics\tP01
//! Thứ Ba               Thứ Ba
//! 3                    Thứ Năm
//! 2                    3
//! B2                   7
//! Tuần\t11111          ...
//! ```

use std::collections::BTreeSet;

use super::{FlaggedLine, LayoutOutput, SourceLine, sanitize_text};
use crate::error::{ParseLineError, SlotError};
use crate::model::TimeSlotDefinition;
use crate::period_clock::PeriodClock;
use crate::week_mask;

const FIELDS_PER_COMPONENT: usize = 5;

/// Line (relative to the record start) probed to tell one component from two.
const STRIDE_PROBE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Day = 0,
    StartPeriod = 1,
    PeriodCount = 2,
    Room = 3,
    Mask = 4,
}

const BLOCK_DAYS: [(&str, u32); 7] = [
    ("hai", 1),
    ("ba", 2),
    ("tư", 3),
    ("năm", 4),
    ("sáu", 5),
    ("bảy", 6),
    ("chủ nhật", 7),
];

/// Map a localized day name (`Thứ Hai`, `Hai`, `Chủ Nhật`, `CN`) to 1..=7.
fn block_day(token: &str) -> Result<u32, SlotError> {
    let lower = token.trim().to_lowercase();
    let name = lower.strip_prefix("thứ").map(str::trim).unwrap_or(&lower);
    if name == "cn" {
        return Ok(7);
    }
    BLOCK_DAYS
        .iter()
        .find(|(day_name, _)| *day_name == name)
        .map(|(_, number)| *number)
        .ok_or_else(|| SlotError::UnknownDay(token.trim().to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RecordHeader {
    subject_name: String,
    class_code: String,
    notes: String,
}

fn parse_record_header(text: &str) -> Option<RecordHeader> {
    let columns: Vec<&str> = text.split('\t').map(str::trim).collect();
    let subject_name = columns.get(1).filter(|c| !c.is_empty())?;
    let class_code = columns.get(2).filter(|c| !c.is_empty())?;
    let notes = columns.get(3..).map(|rest| rest.join(" ")).unwrap_or_default();
    Some(RecordHeader {
        subject_name: subject_name.to_string(),
        class_code: class_code.to_string(),
        notes: notes.trim().to_string(),
    })
}

/// Index of the first line at or after `from` that opens a record.
fn next_header(lines: &[SourceLine<'_>], from: usize) -> usize {
    lines[from.min(lines.len())..]
        .iter()
        .position(|line| parse_record_header(line.text).is_some())
        .map_or(lines.len(), |offset| from + offset)
}

/// 1 when the probe line is the start period, 2 when it is a second day name.
fn class_number(lines: &[SourceLine<'_>], record_start: usize) -> usize {
    match lines.get(record_start + STRIDE_PROBE) {
        Some(line) if line.text.trim().parse::<u32>().is_ok() => 1,
        _ => 2,
    }
}

/// Where the week mask was found on its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MaskColumn {
    Primary,
    Fallback,
}

const MASK_PRIMARY_COLUMN: usize = 1;
const MASK_FALLBACK_COLUMN: usize = 0;

fn mask_field(text: &str) -> (&str, MaskColumn) {
    let columns: Vec<&str> = text.split('\t').collect();
    match columns.get(MASK_PRIMARY_COLUMN) {
        Some(mask) => (mask.trim(), MaskColumn::Primary),
        None => (columns[MASK_FALLBACK_COLUMN].trim(), MaskColumn::Fallback),
    }
}

/// Record-relative addressing for one component.
struct ComponentFields<'l, 'a> {
    lines: &'l [SourceLine<'a>],
    record_start: usize,
    class_number: usize,
    component: usize,
}

impl<'l, 'a> ComponentFields<'l, 'a> {
    fn line(&self, field: Field) -> Result<&'l SourceLine<'a>, ParseLineError> {
        let offset = 1 + field as usize * self.class_number + self.component;
        self.lines.get(self.record_start + offset).ok_or_else(|| {
            ParseLineError::malformed(
                self.lines[self.record_start].number,
                format!("record truncated before its {:?} field", field),
            )
        })
    }

    fn number(&self, field: Field) -> Result<(&'l SourceLine<'a>, u32), ParseLineError> {
        let line = self.line(field)?;
        let value = line.text.trim().parse::<u32>().map_err(|_| {
            ParseLineError::malformed(
                line.number,
                format!("expected a number for {:?}, got '{}'", field, line.text.trim()),
            )
        })?;
        Ok((line, value))
    }
}

struct ParsedComponent {
    slot: TimeSlotDefinition,
    mask_line: usize,
    mask_column: MaskColumn,
}

pub struct BlockFormat {
    week_offset: u32,
    clock: PeriodClock,
}

impl BlockFormat {
    pub fn new(week_offset: u32) -> Self {
        Self {
            week_offset,
            clock: PeriodClock::STANDARD,
        }
    }

    pub fn parse(&self, lines: &[SourceLine<'_>]) -> LayoutOutput {
        let mut output = LayoutOutput::default();
        let mut record_start = 0;

        while record_start < lines.len() {
            let Some(header) = parse_record_header(lines[record_start].text) else {
                let next = next_header(lines, record_start + 1);
                tracing::debug!(
                    "Line {}: not a record header, skipping {} line(s)",
                    lines[record_start].number,
                    next - record_start
                );
                output.failures.push(ParseLineError::malformed(
                    lines[record_start].number,
                    "expected a record header `<no>\\t<subject>\\t<class>`",
                ));
                record_start = next;
                continue;
            };

            let class_number = class_number(lines, record_start);
            tracing::debug!(
                "Record {} / {} at line {} with {} component(s)",
                header.subject_name,
                header.class_code,
                lines[record_start].number,
                class_number
            );

            for component in 0..class_number {
                let fields = ComponentFields {
                    lines,
                    record_start,
                    class_number,
                    component,
                };
                match self.parse_component(&header, &fields) {
                    Ok(parsed) => {
                        if parsed.mask_column == MaskColumn::Fallback {
                            tracing::warn!(
                                "Line {}: week mask read from fallback column",
                                parsed.mask_line
                            );
                            output.flagged.push(FlaggedLine {
                                line: parsed.mask_line,
                                reason: "week mask read from fallback column".to_string(),
                            });
                        }
                        output.catalog.push_slot(parsed.slot);
                    }
                    Err(err) => output.failures.push(err),
                }
            }

            record_start += 1 + FIELDS_PER_COMPONENT * class_number;
        }

        output
    }

    fn parse_component(
        &self,
        header: &RecordHeader,
        fields: &ComponentFields<'_, '_>,
    ) -> Result<ParsedComponent, ParseLineError> {
        let day_line = fields.line(Field::Day)?;
        let day = block_day(day_line.text).map_err(|kind| ParseLineError::new(day_line.number, kind))?;

        let (start_line, start_period) = fields.number(Field::StartPeriod)?;
        let (_, period_count) = fields.number(Field::PeriodCount)?;
        let clock = self
            .clock
            .clock_for(start_period, period_count)
            .map_err(|kind| ParseLineError::new(start_line.number, kind))?;

        let room_line = fields.line(Field::Room)?;
        let room = sanitize_text(room_line.text.trim());
        if room.is_empty() {
            return Err(ParseLineError::malformed(room_line.number, "empty room"));
        }

        let mask_line = fields.line(Field::Mask)?;
        let (mask, mask_column) = mask_field(mask_line.text);
        let active_weeks = week_mask::decode(mask, self.week_offset)
            .map_err(|kind| ParseLineError::new(mask_line.number, kind))?;

        Ok(ParsedComponent {
            slot: TimeSlotDefinition {
                subject_name: header.subject_name.clone(),
                class_code: header.class_code.clone(),
                days: BTreeSet::from([day]),
                start_time: clock.start,
                duration_minutes: clock.duration_minutes,
                room,
                active_weeks,
                notes: sanitize_text(&header.notes),
            },
            mask_line: mask_line.number,
            mask_column,
        })
    }
}
