//! Catalog and selection state.
//!
//! The store is the single owner of the parsed [`Catalog`] and of the
//! per-subject selection. Each subject is either unselected or has exactly
//! one selected class whose occurrences are committed. All mutation goes
//! through [`ScheduleStore::select`], [`ScheduleStore::deselect`],
//! [`ScheduleStore::clear`] and [`ScheduleStore::replace_catalog`]; every
//! one of them computes its result before touching state, so a rejected or
//! failed call leaves the store unchanged.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::conflict::{ConflictInfo, find_all_conflicts, find_conflict};
use crate::error::StoreError;
use crate::model::{Catalog, Occurrence};
use crate::recurrence::{expand, expand_class};

/// The committed class of one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub class_code: String,
    occurrences: Vec<Occurrence>,
}

impl Selection {
    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }
}

/// Result of [`ScheduleStore::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The subject had no selection before.
    Added,
    /// Another class of the subject was replaced.
    Switched { previous: String },
    /// The class was already selected; occurrences were regenerated.
    Reselected,
    /// A candidate occurrence overlaps another subject's commitment.
    Rejected(ConflictInfo),
}

impl SelectOutcome {
    pub fn is_committed(&self) -> bool {
        !matches!(self, SelectOutcome::Rejected(_))
    }
}

/// Advisory conflicts of one slot of an unselected class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAdvisory {
    pub slot_index: usize,
    pub conflicts: Vec<ConflictInfo>,
}

impl SlotAdvisory {
    /// One line per distinct `(subject, day/time)` pair.
    pub fn messages(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.conflicts
            .iter()
            .filter(|c| seen.insert((c.conflict_subject.clone(), c.time_label())))
            .map(|c| format!("Conflicts with {} at {}", c.conflict_subject, c.time_label()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The new catalog no longer has the subject or class.
    Missing,
    /// The class now conflicts with a selection kept before it.
    Conflict(ConflictInfo),
}

/// A selection lost while installing a new catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedSelection {
    pub subject: String,
    pub class_code: String,
    pub reason: DropReason,
}

pub type AdvisoryMap = BTreeMap<(String, String), Vec<SlotAdvisory>>;

#[derive(Debug, Clone)]
pub struct ScheduleStore {
    term_year: i32,
    catalog: Catalog,
    selections: BTreeMap<String, Selection>,
    advisories: AdvisoryMap,
}

impl ScheduleStore {
    pub fn new(term_year: i32) -> Self {
        Self {
            term_year,
            catalog: Catalog::new(),
            selections: BTreeMap::new(),
            advisories: BTreeMap::new(),
        }
    }

    pub fn term_year(&self) -> i32 {
        self.term_year
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selected_class(&self, subject: &str) -> Option<&str> {
        self.selections.get(subject).map(|s| s.class_code.as_str())
    }

    /// `(subject, class code)` pairs in subject order.
    pub fn selections(&self) -> impl Iterator<Item = (&str, &str)> {
        self.selections
            .iter()
            .map(|(subject, selection)| (subject.as_str(), selection.class_code.as_str()))
    }

    pub fn occurrences_for(&self, subject: &str) -> &[Occurrence] {
        self.selections
            .get(subject)
            .map(Selection::occurrences)
            .unwrap_or_default()
    }

    /// All committed occurrences, ordered by start time.
    pub fn occurrences(&self) -> Vec<Occurrence> {
        let mut all = self.committed();
        all.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.subject_name.cmp(&b.subject_name)));
        all
    }

    fn committed(&self) -> Vec<Occurrence> {
        self.selections
            .values()
            .flat_map(|s| s.occurrences.iter().cloned())
            .collect()
    }

    /// Advisory conflicts keyed by `(subject, class code)`.
    pub fn advisories(&self) -> &AdvisoryMap {
        &self.advisories
    }

    pub fn advisory_for(&self, subject: &str, class_code: &str) -> Option<&[SlotAdvisory]> {
        self.advisories
            .get(&(subject.to_string(), class_code.to_string()))
            .map(Vec::as_slice)
    }

    /// Commit `class_code` for `subject` unless it overlaps another subject.
    pub fn select(&mut self, subject: &str, class_code: &str) -> Result<SelectOutcome, StoreError> {
        let class = self
            .catalog
            .subject(subject)
            .ok_or_else(|| StoreError::UnknownSubject(subject.to_string()))?
            .classes
            .get(class_code)
            .ok_or_else(|| StoreError::UnknownClass {
                subject: subject.to_string(),
                class_code: class_code.to_string(),
            })?;

        let candidates = expand_class(class, self.term_year);
        if let Some(conflict) = find_conflict(&candidates, &self.committed(), subject) {
            tracing::info!("Rejected {} / {}: conflicts with {}", subject, class_code, conflict);
            return Ok(SelectOutcome::Rejected(conflict));
        }

        let previous = self.selections.insert(
            subject.to_string(),
            Selection {
                class_code: class_code.to_string(),
                occurrences: candidates,
            },
        );
        let outcome = match previous {
            None => SelectOutcome::Added,
            Some(p) if p.class_code == class_code => SelectOutcome::Reselected,
            Some(p) => SelectOutcome::Switched {
                previous: p.class_code,
            },
        };
        tracing::info!("Selected {} / {} ({:?})", subject, class_code, outcome);

        self.refresh_advisories();
        Ok(outcome)
    }

    /// Drop the subject's selection, returning the class code it had.
    pub fn deselect(&mut self, subject: &str) -> Result<String, StoreError> {
        let removed = self
            .selections
            .remove(subject)
            .ok_or_else(|| StoreError::NotSelected(subject.to_string()))?;
        tracing::info!("Deselected {} / {}", subject, removed.class_code);
        self.refresh_advisories();
        Ok(removed.class_code)
    }

    /// Reset to an empty catalog and no selections.
    pub fn clear(&mut self) {
        self.catalog = Catalog::new();
        self.selections.clear();
        self.advisories.clear();
        tracing::info!("Schedule cleared");
    }

    /// Install a freshly parsed catalog.
    ///
    /// Selections whose subject and class survive are re-expanded against
    /// the new catalog in subject order; one that now conflicts with an
    /// earlier kept selection is dropped.
    pub fn replace_catalog(&mut self, catalog: Catalog) -> Vec<DroppedSelection> {
        let previous = std::mem::take(&mut self.selections);
        self.catalog = catalog;

        let mut dropped = Vec::new();
        for (subject, selection) in previous {
            let reason = match self.select(&subject, &selection.class_code) {
                Ok(SelectOutcome::Rejected(conflict)) => DropReason::Conflict(conflict),
                Ok(_) => continue,
                Err(_) => DropReason::Missing,
            };
            tracing::warn!("Dropped selection {} / {}: {:?}", subject, selection.class_code, reason);
            dropped.push(DroppedSelection {
                subject,
                class_code: selection.class_code,
                reason,
            });
        }

        self.refresh_advisories();
        dropped
    }

    /// Recompute advisories for every class of every unselected subject.
    fn refresh_advisories(&mut self) {
        let committed = self.committed();
        let mut advisories = AdvisoryMap::new();

        for subject in self.catalog.subjects() {
            if self.selections.contains_key(&subject.name) {
                continue;
            }
            for (class_code, class) in &subject.classes {
                let slots: Vec<SlotAdvisory> = class
                    .time_slots
                    .iter()
                    .enumerate()
                    .filter_map(|(slot_index, slot)| {
                        let conflicts =
                            find_all_conflicts(&expand(slot, self.term_year), &committed, &subject.name);
                        (!conflicts.is_empty()).then_some(SlotAdvisory {
                            slot_index,
                            conflicts,
                        })
                    })
                    .collect();
                if !slots.is_empty() {
                    advisories.insert((subject.name.clone(), class_code.clone()), slots);
                }
            }
        }

        tracing::debug!("{} classes carry advisory conflicts", advisories.len());
        self.advisories = advisories;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::NaiveTime;

    use super::*;
    use crate::model::TimeSlotDefinition;

    const YEAR: i32 = 2025;

    fn slot(
        subject: &str,
        class_code: &str,
        day: u32,
        (hour, minute): (u32, u32),
        duration: u32,
        weeks: &[u32],
    ) -> TimeSlotDefinition {
        TimeSlotDefinition {
            subject_name: subject.to_string(),
            class_code: class_code.to_string(),
            days: BTreeSet::from([day]),
            start_time: NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
            duration_minutes: duration,
            room: "R1".to_string(),
            active_weeks: weeks.iter().copied().collect(),
            notes: String::new(),
        }
    }

    fn store_with(slots: Vec<TimeSlotDefinition>) -> ScheduleStore {
        let mut catalog = Catalog::new();
        for s in slots {
            catalog.push_slot(s);
        }
        let mut store = ScheduleStore::new(YEAR);
        store.replace_catalog(catalog);
        store
    }

    fn sample_store() -> ScheduleStore {
        store_with(vec![
            slot("Subject A", "A1", 1, (8, 0), 100, &[1, 2]),
            slot("Subject A", "A2", 2, (8, 0), 100, &[1, 2]),
            slot("Subject B", "B1", 1, (8, 30), 90, &[1]),
            slot("Subject B", "B2", 1, (8, 30), 90, &[2]),
            slot("Subject B", "B3", 1, (9, 40), 50, &[1, 2]),
            slot("Subject C", "C1", 3, (13, 0), 50, &[1]),
        ])
    }

    fn occurrence_set(store: &ScheduleStore) -> BTreeSet<(String, String, chrono::NaiveDateTime)> {
        store
            .occurrences()
            .into_iter()
            .map(|o| (o.subject_name, o.class_code, o.start))
            .collect()
    }

    // ==================== Selection Tests ====================

    #[test]
    fn test_select_commits_occurrences() {
        let mut store = sample_store();
        assert_eq!(store.select("Subject A", "A1"), Ok(SelectOutcome::Added));
        assert_eq!(store.selected_class("Subject A"), Some("A1"));
        assert_eq!(store.occurrences_for("Subject A").len(), 2);
    }

    #[test]
    fn test_overlapping_class_is_rejected() {
        let mut store = sample_store();
        store.select("Subject A", "A1").unwrap();

        match store.select("Subject B", "B1").unwrap() {
            SelectOutcome::Rejected(conflict) => {
                assert_eq!(conflict.conflict_subject, "Subject A");
                assert_eq!(conflict.week_num, 1);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(store.selected_class("Subject B"), None);
    }

    #[test]
    fn test_conflict_is_checked_per_occurrence() {
        let mut store = sample_store();
        store.select("Subject A", "A1").unwrap();

        match store.select("Subject B", "B2").unwrap() {
            SelectOutcome::Rejected(conflict) => {
                assert_eq!(conflict.conflict_subject, "Subject A");
                assert_eq!(conflict.week_num, 2);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_touching_class_is_accepted() {
        let mut store = sample_store();
        store.select("Subject A", "A1").unwrap();
        // A1 ends 09:40, B3 starts 09:40
        assert_eq!(store.select("Subject B", "B3"), Ok(SelectOutcome::Added));
    }

    #[test]
    fn test_rejection_leaves_state_unchanged() {
        let mut store = sample_store();
        store.select("Subject A", "A1").unwrap();
        store.select("Subject B", "B3").unwrap();
        let before = occurrence_set(&store);

        // B1 conflicts with A1; B keeps B3.
        assert!(!store.select("Subject B", "B1").unwrap().is_committed());
        assert_eq!(store.selected_class("Subject B"), Some("B3"));
        assert_eq!(occurrence_set(&store), before);
    }

    #[test]
    fn test_reselect_is_idempotent() {
        let mut store = sample_store();
        store.select("Subject A", "A1").unwrap();
        let before = occurrence_set(&store);

        assert_eq!(store.select("Subject A", "A1"), Ok(SelectOutcome::Reselected));
        assert_eq!(occurrence_set(&store), before);
    }

    #[test]
    fn test_switch_replaces_all_occurrences() {
        let mut store = sample_store();
        store.select("Subject A", "A1").unwrap();

        assert_eq!(
            store.select("Subject A", "A2"),
            Ok(SelectOutcome::Switched {
                previous: "A1".to_string(),
            })
        );
        let occurrences = store.occurrences_for("Subject A");
        assert_eq!(occurrences.len(), 2);
        assert!(occurrences.iter().all(|o| o.class_code == "A2"));
        assert!(store.occurrences().iter().all(|o| o.class_code != "A1"));
    }

    #[test]
    fn test_switch_frees_time_for_other_subjects() {
        let mut store = sample_store();
        store.select("Subject A", "A1").unwrap();
        store.select("Subject A", "A2").unwrap();
        // A2 is on Tuesdays, so Monday's B1 no longer conflicts.
        assert_eq!(store.select("Subject B", "B1"), Ok(SelectOutcome::Added));
    }

    #[test]
    fn test_unknown_subject_and_class() {
        let mut store = sample_store();
        assert_eq!(
            store.select("Nope", "X"),
            Err(StoreError::UnknownSubject("Nope".to_string()))
        );
        assert_eq!(
            store.select("Subject A", "A9"),
            Err(StoreError::UnknownClass {
                subject: "Subject A".to_string(),
                class_code: "A9".to_string(),
            })
        );
    }

    // ==================== Deselect & Clear Tests ====================

    #[test]
    fn test_deselect_removes_occurrences() {
        let mut store = sample_store();
        store.select("Subject A", "A1").unwrap();
        assert_eq!(store.deselect("Subject A"), Ok("A1".to_string()));
        assert!(store.occurrences().is_empty());
        assert_eq!(store.selected_class("Subject A"), None);
        assert_eq!(
            store.deselect("Subject A"),
            Err(StoreError::NotSelected("Subject A".to_string()))
        );
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut store = sample_store();
        store.select("Subject A", "A1").unwrap();
        store.clear();
        assert!(store.catalog().is_empty());
        assert_eq!(store.selections().count(), 0);
        assert!(store.advisories().is_empty());
    }

    // ==================== Advisory Tests ====================

    #[test]
    fn test_advisories_follow_commitments() {
        let mut store = sample_store();
        assert!(store.advisories().is_empty());

        store.select("Subject A", "A1").unwrap();
        let b1 = store.advisory_for("Subject B", "B1").unwrap();
        assert_eq!(b1.len(), 1);
        assert_eq!(b1[0].slot_index, 0);
        assert_eq!(b1[0].messages(), vec!["Conflicts with Subject A at Mon 08:30".to_string()]);
        assert!(store.advisory_for("Subject B", "B2").is_some());
        assert!(store.advisory_for("Subject B", "B3").is_none());
        assert!(store.advisory_for("Subject C", "C1").is_none());
        // Selected subjects carry no advisories.
        assert!(store.advisory_for("Subject A", "A2").is_none());

        store.deselect("Subject A").unwrap();
        assert!(store.advisories().is_empty());
    }

    #[test]
    fn test_advisories_skip_subject_once_selected() {
        let mut store = sample_store();
        store.select("Subject A", "A1").unwrap();
        store.select("Subject B", "B3").unwrap();
        assert!(store.advisory_for("Subject B", "B1").is_none());
    }

    // ==================== Catalog Replacement Tests ====================

    #[test]
    fn test_replace_catalog_keeps_surviving_selections() {
        let mut store = sample_store();
        store.select("Subject A", "A1").unwrap();
        store.select("Subject C", "C1").unwrap();

        let mut catalog = Catalog::new();
        catalog.push_slot(slot("Subject A", "A1", 4, (7, 0), 50, &[3]));
        let dropped = store.replace_catalog(catalog);

        assert_eq!(
            dropped,
            vec![DroppedSelection {
                subject: "Subject C".to_string(),
                class_code: "C1".to_string(),
                reason: DropReason::Missing,
            }]
        );
        assert_eq!(store.selected_class("Subject A"), Some("A1"));
        // Occurrences come from the new catalog's slot.
        let occurrences = store.occurrences_for("Subject A");
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].week_num, 3);
        assert_eq!(occurrences[0].day_of_week, 4);
    }

    #[test]
    fn test_replace_catalog_drops_new_conflicts() {
        let mut store = sample_store();
        store.select("Subject A", "A1").unwrap();
        store.select("Subject C", "C1").unwrap();

        let mut catalog = Catalog::new();
        catalog.push_slot(slot("Subject A", "A1", 3, (13, 0), 50, &[1]));
        catalog.push_slot(slot("Subject C", "C1", 3, (13, 0), 50, &[1]));
        let dropped = store.replace_catalog(catalog);

        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].subject, "Subject C");
        assert!(matches!(dropped[0].reason, DropReason::Conflict(_)));
        assert_eq!(store.selected_class("Subject A"), Some("A1"));
        assert_eq!(store.selected_class("Subject C"), None);
    }

    #[test]
    fn test_occurrences_sorted_by_start() {
        let mut store = sample_store();
        store.select("Subject C", "C1").unwrap();
        store.select("Subject A", "A1").unwrap();
        let occurrences = store.occurrences();
        assert!(occurrences.windows(2).all(|w| w[0].start <= w[1].start));
        assert_eq!(occurrences.len(), 3);
    }
}
