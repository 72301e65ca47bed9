//! Occurrence listings for the command line.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::model::{Occurrence, day_label};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// Flat row written per occurrence.
#[derive(Debug, Serialize)]
struct OccurrenceRow<'a> {
    subject: &'a str,
    class_code: &'a str,
    week: u32,
    day: &'static str,
    start: String,
    end: String,
    room: &'a str,
}

impl<'a> From<&'a Occurrence> for OccurrenceRow<'a> {
    fn from(o: &'a Occurrence) -> Self {
        Self {
            subject: &o.subject_name,
            class_code: &o.class_code,
            week: o.week_num,
            day: day_label(o.day_of_week),
            start: o.start.format("%Y-%m-%d %H:%M").to_string(),
            end: o.end.format("%Y-%m-%d %H:%M").to_string(),
            room: &o.room,
        }
    }
}

pub fn write_occurrences<W: Write>(occurrences: &[Occurrence], format: ExportFormat, writer: W) -> Result<()> {
    match format {
        ExportFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(writer);
            for occurrence in occurrences {
                wtr.serialize(OccurrenceRow::from(occurrence))
                    .context("Failed to serialize occurrence")?;
            }
            wtr.flush().context("Failed to flush CSV writer")?;
        }
        ExportFormat::Json => {
            serde_json::to_writer_pretty(writer, occurrences).context("Failed to write JSON")?;
        }
    }
    Ok(())
}
