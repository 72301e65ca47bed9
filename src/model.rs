//! Catalog and occurrence data types.
//!
//! A parsed timetable is a [`Catalog`]: subject name -> [`Subject`], each
//! holding its competing [`ClassGroup`]s keyed by class code. Catalog
//! entries are immutable once built; selection lives in the store.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Day labels indexed by day number (1=Monday..7=Sunday).
const DAY_NAMES: [&str; 8] = ["", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Short English label for a day number, or `"?"` when out of range.
pub fn day_label(day: u32) -> &'static str {
    DAY_NAMES.get(day as usize).copied().filter(|s| !s.is_empty()).unwrap_or("?")
}

/// One recurring weekly meeting pattern of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlotDefinition {
    pub subject_name: String,
    pub class_code: String,
    /// Day numbers, 1=Monday..7=Sunday. Never empty.
    pub days: BTreeSet<u32>,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    pub room: String,
    /// Term week numbers the slot meets on. Never empty.
    pub active_weeks: BTreeSet<u32>,
    pub notes: String,
}

impl TimeSlotDefinition {
    /// `"Mon, Wed 07:00 (100 min) @ A1"`
    pub fn summary(&self) -> String {
        let days: Vec<&str> = self.days.iter().map(|d| day_label(*d)).collect();
        format!(
            "{} {} ({} min) @ {}",
            days.join(", "),
            self.start_time.format("%H:%M"),
            self.duration_minutes,
            self.room
        )
    }
}

/// One selectable section of a subject. Slots keep source-line order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassGroup {
    pub class_code: String,
    pub subject_name: String,
    pub time_slots: Vec<TimeSlotDefinition>,
}

impl ClassGroup {
    pub fn new(subject_name: impl Into<String>, class_code: impl Into<String>) -> Self {
        Self {
            class_code: class_code.into(),
            subject_name: subject_name.into(),
            time_slots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Subject {
    pub name: String,
    pub classes: BTreeMap<String, ClassGroup>,
}

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: BTreeMap::new(),
        }
    }

    pub fn slot_count(&self) -> usize {
        self.classes.values().map(|c| c.time_slots.len()).sum()
    }
}

/// Parsed subjects keyed by subject name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Catalog {
    subjects: BTreeMap<String, Subject>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a slot under its `(subject, class)` pair, creating both on demand.
    pub fn push_slot(&mut self, slot: TimeSlotDefinition) {
        let subject = self
            .subjects
            .entry(slot.subject_name.clone())
            .or_insert_with(|| Subject::new(slot.subject_name.clone()));
        subject
            .classes
            .entry(slot.class_code.clone())
            .or_insert_with(|| ClassGroup::new(slot.subject_name.clone(), slot.class_code.clone()))
            .time_slots
            .push(slot);
    }

    pub fn subject(&self, name: &str) -> Option<&Subject> {
        self.subjects.get(name)
    }

    pub fn class(&self, subject: &str, class_code: &str) -> Option<&ClassGroup> {
        self.subjects.get(subject)?.classes.get(class_code)
    }

    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.values()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn slot_count(&self) -> usize {
        self.subjects.values().map(Subject::slot_count).sum()
    }
}

/// A concrete dated instance of a slot, regenerated from a selection on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Occurrence {
    pub subject_name: String,
    pub class_code: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub room: String,
    pub week_num: u32,
    pub day_of_week: u32,
    pub notes: String,
}

impl Occurrence {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(subject: &str, class_code: &str, room: &str) -> TimeSlotDefinition {
        TimeSlotDefinition {
            subject_name: subject.to_string(),
            class_code: class_code.to_string(),
            days: BTreeSet::from([1, 3]),
            start_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            duration_minutes: 100,
            room: room.to_string(),
            active_weeks: BTreeSet::from([1, 2]),
            notes: String::new(),
        }
    }

    #[test]
    fn test_day_label_range() {
        assert_eq!(day_label(1), "Mon");
        assert_eq!(day_label(7), "Sun");
        assert_eq!(day_label(0), "?");
        assert_eq!(day_label(8), "?");
    }

    #[test]
    fn test_push_slot_groups_by_subject_and_class() {
        let mut catalog = Catalog::new();
        catalog.push_slot(slot("Algorithms", "L01", "A1"));
        catalog.push_slot(slot("Algorithms", "L01", "B2"));
        catalog.push_slot(slot("Algorithms", "L02", "C3"));
        catalog.push_slot(slot("Physics", "L01", "D4"));

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.slot_count(), 4);
        let group = catalog.class("Algorithms", "L01").unwrap();
        let rooms: Vec<&str> = group.time_slots.iter().map(|s| s.room.as_str()).collect();
        assert_eq!(rooms, vec!["A1", "B2"]);
        assert_eq!(catalog.subject("Algorithms").unwrap().classes.len(), 2);
    }

    #[test]
    fn test_slot_summary() {
        assert_eq!(slot("S", "L01", "A1").summary(), "Mon, Wed 07:00 (100 min) @ A1");
    }
}
