//! Time-overlap detection between candidate and committed occurrences.
//!
//! Occurrences are half-open intervals `[start, end)`: a class ending at
//! 09:40 and another starting at 09:40 do not conflict.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::model::{Occurrence, day_label};

/// Half-open interval overlap.
#[inline]
pub fn overlaps(a: &Occurrence, b: &Occurrence) -> bool {
    a.start < b.end && a.end > b.start
}

/// A candidate occurrence colliding with a committed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictInfo {
    /// Subject owning the committed occurrence.
    pub conflict_subject: String,
    pub conflict_class: String,
    /// Day and week of the candidate occurrence.
    pub day_of_week: u32,
    pub week_num: u32,
    pub start: NaiveDateTime,
}

impl ConflictInfo {
    fn between(candidate: &Occurrence, committed: &Occurrence) -> Self {
        Self {
            conflict_subject: committed.subject_name.clone(),
            conflict_class: committed.class_code.clone(),
            day_of_week: candidate.day_of_week,
            week_num: candidate.week_num,
            start: candidate.start,
        }
    }

    /// `"Mon 08:30"`
    pub fn time_label(&self) -> String {
        format!("{} {}", day_label(self.day_of_week), self.start.format("%H:%M"))
    }
}

impl fmt::Display for ConflictInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {} (week {})",
            self.conflict_subject,
            self.time_label(),
            self.week_num
        )
    }
}

/// Candidate-major, committed-minor scan skipping `exclude_subject`.
fn conflicts<'a>(
    candidates: &'a [Occurrence],
    committed: &'a [Occurrence],
    exclude_subject: &'a str,
) -> impl Iterator<Item = ConflictInfo> + 'a {
    candidates.iter().flat_map(move |candidate| {
        committed
            .iter()
            .filter(move |existing| existing.subject_name != exclude_subject)
            .filter(move |existing| overlaps(candidate, existing))
            .map(move |existing| ConflictInfo::between(candidate, existing))
    })
}

/// First conflict in scan order, if any.
pub fn find_conflict(
    candidates: &[Occurrence],
    committed: &[Occurrence],
    exclude_subject: &str,
) -> Option<ConflictInfo> {
    conflicts(candidates, committed, exclude_subject).next()
}

/// Every conflicting `(candidate, committed)` pair, in scan order.
pub fn find_all_conflicts(
    candidates: &[Occurrence],
    committed: &[Occurrence],
    exclude_subject: &str,
) -> Vec<ConflictInfo> {
    conflicts(candidates, committed, exclude_subject).collect()
}
