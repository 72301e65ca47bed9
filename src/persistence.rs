//! Schedule snapshots - save and load catalog and selection state.
//!
//! The on-disk form is plain nested JSON: subject name -> class code ->
//! slot list, and subject name -> selected class code. Older saves used
//! two other shapes which are still accepted on load:
//! - subjects as an array of `[name, classes]` pairs,
//! - classes as a flat list of slot records each carrying `classCode`,
//! - a selection stored as an object with `classCode` instead of a string.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::model::{Catalog, TimeSlotDefinition};
use crate::parser::sanitize_text;
use crate::store::{DropReason, DroppedSelection, ScheduleStore, SelectOutcome};

/// Serializable slot record. Accepts legacy camelCase keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSlot {
    #[serde(default, alias = "subjectname")]
    pub subject_name: String,
    #[serde(default)]
    pub class_code: String,
    pub days: Vec<u32>,
    /// `HH:MM`
    pub start_time: String,
    #[serde(alias = "period")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub room: String,
    #[serde(alias = "weeks")]
    pub active_weeks: Vec<u32>,
    #[serde(default)]
    pub notes: String,
}

impl From<&TimeSlotDefinition> for StoredSlot {
    fn from(slot: &TimeSlotDefinition) -> Self {
        Self {
            subject_name: slot.subject_name.clone(),
            class_code: slot.class_code.clone(),
            days: slot.days.iter().copied().collect(),
            start_time: slot.start_time.format("%H:%M").to_string(),
            duration_minutes: slot.duration_minutes,
            room: slot.room.clone(),
            active_weeks: slot.active_weeks.iter().copied().collect(),
            notes: slot.notes.clone(),
        }
    }
}

impl StoredSlot {
    /// Validate and convert, filing the slot under `subject` / `class_code`.
    fn to_definition(&self, subject: &str, class_code: &str) -> Result<TimeSlotDefinition, String> {
        let start_time = NaiveTime::parse_from_str(self.start_time.trim(), "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(self.start_time.trim(), "%H:%M:%S"))
            .map_err(|_| format!("invalid start time '{}'", self.start_time))?;
        if self.days.is_empty() || self.days.iter().any(|d| !(1..=7).contains(d)) {
            return Err(format!("invalid days {:?}", self.days));
        }
        if self.active_weeks.is_empty() {
            return Err("no active weeks".to_string());
        }
        if self.duration_minutes == 0 {
            return Err("zero duration".to_string());
        }
        Ok(TimeSlotDefinition {
            subject_name: subject.to_string(),
            class_code: class_code.to_string(),
            days: self.days.iter().copied().collect(),
            start_time,
            duration_minutes: self.duration_minutes,
            room: sanitize_text(&self.room),
            active_weeks: self.active_weeks.iter().copied().collect(),
            notes: sanitize_text(&self.notes),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredClassGroup {
    #[serde(default)]
    pub class_code: String,
    #[serde(default, alias = "subjectname")]
    pub subject_name: String,
    pub time_slots: Vec<StoredSlot>,
}

/// The classes of one subject, in either historical shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredClasses {
    Grouped(BTreeMap<String, StoredClassGroup>),
    Flat(Vec<StoredSlot>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredSubjects {
    Map(BTreeMap<String, StoredClasses>),
    Pairs(Vec<(String, StoredClasses)>),
}

impl Default for StoredSubjects {
    fn default() -> Self {
        StoredSubjects::Map(BTreeMap::new())
    }
}

impl StoredSubjects {
    fn entries(&self) -> Vec<(&str, &StoredClasses)> {
        match self {
            StoredSubjects::Map(map) => map.iter().map(|(k, v)| (k.as_str(), v)).collect(),
            StoredSubjects::Pairs(pairs) => pairs.iter().map(|(k, v)| (k.as_str(), v)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredSelection {
    Code(String),
    Legacy {
        #[serde(rename = "classCode")]
        class_code: String,
    },
}

impl StoredSelection {
    pub fn class_code(&self) -> &str {
        match self {
            StoredSelection::Code(code) => code,
            StoredSelection::Legacy { class_code } => class_code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSnapshot {
    /// 0 for saves that predate versioning.
    #[serde(default)]
    pub version: u32,
    #[serde(default, alias = "timestamp")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subjects: StoredSubjects,
    #[serde(default, alias = "selectedClasses")]
    pub selected: BTreeMap<String, StoredSelection>,
    #[serde(default)]
    pub raw_input: Option<String>,
}

/// A store rebuilt from a snapshot, plus what had to be left behind.
#[derive(Debug)]
pub struct RestoredSchedule {
    pub store: ScheduleStore,
    pub skipped_slots: Vec<String>,
    pub dropped: Vec<DroppedSelection>,
}

impl ScheduleSnapshot {
    pub const CURRENT_VERSION: u32 = 1;

    /// Capture the store in the current (grouped) shape.
    pub fn capture(store: &ScheduleStore, raw_input: Option<String>) -> Self {
        let subjects = store
            .catalog()
            .subjects()
            .map(|subject| {
                let classes = subject
                    .classes
                    .iter()
                    .map(|(code, class)| {
                        (
                            code.clone(),
                            StoredClassGroup {
                                class_code: class.class_code.clone(),
                                subject_name: class.subject_name.clone(),
                                time_slots: class.time_slots.iter().map(StoredSlot::from).collect(),
                            },
                        )
                    })
                    .collect();
                (subject.name.clone(), StoredClasses::Grouped(classes))
            })
            .collect();

        let selected = store
            .selections()
            .map(|(subject, code)| (subject.to_string(), StoredSelection::Code(code.to_string())))
            .collect();

        Self {
            version: Self::CURRENT_VERSION,
            saved_at: Some(Utc::now()),
            subjects: StoredSubjects::Map(subjects),
            selected,
            raw_input,
        }
    }

    /// Normalize either historical shape into a catalog.
    ///
    /// Invalid slot records are skipped and described in the second value.
    pub fn catalog(&self) -> (Catalog, Vec<String>) {
        let mut catalog = Catalog::new();
        let mut skipped = Vec::new();

        let mut add = |subject: &str, class_code: &str, slot: &StoredSlot| match slot.to_definition(subject, class_code) {
            Ok(definition) => catalog.push_slot(definition),
            Err(reason) => {
                tracing::warn!("Skipping stored slot of {} / {}: {}", subject, class_code, reason);
                skipped.push(format!("{} / {}: {}", subject, class_code, reason));
            }
        };

        for (subject, classes) in self.subjects.entries() {
            match classes {
                StoredClasses::Flat(slots) => {
                    for slot in slots {
                        add(subject, &slot.class_code, slot);
                    }
                }
                StoredClasses::Grouped(groups) => {
                    for (code, group) in groups {
                        for slot in &group.time_slots {
                            add(subject, code, slot);
                        }
                    }
                }
            }
        }

        (catalog, skipped)
    }

    /// Rebuild a store, re-selecting saved classes through the conflict check.
    pub fn restore(&self, term_year: i32) -> RestoredSchedule {
        let (catalog, skipped_slots) = self.catalog();
        let mut store = ScheduleStore::new(term_year);
        store.replace_catalog(catalog);

        let mut dropped = Vec::new();
        for (subject, selection) in &self.selected {
            let class_code = selection.class_code();
            let reason = match store.select(subject, class_code) {
                Ok(SelectOutcome::Rejected(conflict)) => DropReason::Conflict(conflict),
                Ok(_) => continue,
                Err(_) => DropReason::Missing,
            };
            dropped.push(DroppedSelection {
                subject: subject.clone(),
                class_code: class_code.to_string(),
                reason,
            });
        }

        RestoredSchedule {
            store,
            skipped_slots,
            dropped,
        }
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// JSON snapshot on disk.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn save(&self, snapshot: &ScheduleSnapshot) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, snapshot.to_json()?)?;
        tracing::debug!("Saved snapshot to {}", self.path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<ScheduleSnapshot, PersistenceError> {
        if !self.path.exists() {
            return Err(PersistenceError::FileNotFound(
                self.path.to_string_lossy().to_string(),
            ));
        }

        let snapshot = ScheduleSnapshot::from_json(&fs::read_to_string(&self.path)?)?;
        if snapshot.version > ScheduleSnapshot::CURRENT_VERSION {
            return Err(PersistenceError::VersionMismatch {
                expected: ScheduleSnapshot::CURRENT_VERSION,
                found: snapshot.version,
            });
        }
        Ok(snapshot)
    }

    pub fn remove(&self) -> Result<(), PersistenceError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
