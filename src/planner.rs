//! User-facing orchestration of parsing, selection and snapshots.
//!
//! [`Planner`] wraps a [`ScheduleStore`] and reports every transition to a
//! [`Notifier`]. The store itself stays silent; the wording of messages
//! lives here.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::StoreError;
use crate::parser::{ParseReport, ParserOptions, TimetableParser};
use crate::persistence::ScheduleSnapshot;
use crate::store::{DropReason, DroppedSelection, ScheduleStore, SelectOutcome};
use crate::traits::{Clock, Notifier, Severity};

pub struct Planner {
    store: ScheduleStore,
    parser: TimetableParser,
    notifier: Arc<dyn Notifier>,
    raw_input: Option<String>,
}

impl Planner {
    pub fn new(term_year: i32, options: ParserOptions, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store: ScheduleStore::new(term_year),
            parser: TimetableParser::new(options),
            notifier,
            raw_input: None,
        }
    }

    pub fn from_config(config: &AppConfig, clock: &dyn Clock, notifier: Arc<dyn Notifier>) -> Self {
        Self::new(
            config.term.resolve_year(clock),
            ParserOptions::from(&config.parser),
            notifier,
        )
    }

    pub fn store(&self) -> &ScheduleStore {
        &self.store
    }

    /// Text of the last successful parse.
    pub fn raw_input(&self) -> Option<&str> {
        self.raw_input.as_deref()
    }

    /// Parse `raw` and install the result as the new catalog.
    ///
    /// When nothing parses the previous catalog and selections are kept.
    pub fn parse_text(&mut self, raw: &str) -> Result<ParseReport, StoreError> {
        if raw.trim().is_empty() {
            self.notifier
                .notify("Please enter course data to parse", Severity::Warning);
            return Err(StoreError::NothingParsed);
        }

        let outcome = self.parser.parse(raw);
        let report = outcome.report;

        for failure in &report.failures {
            self.notifier
                .notify(&format!("Error parsing {}", failure), Severity::Warning);
        }
        for flagged in &report.flagged {
            self.notifier.notify(
                &format!("Check line {}: {}", flagged.line, flagged.reason),
                Severity::Info,
            );
        }

        if report.slots_parsed == 0 {
            self.notifier
                .notify("No valid classes found", Severity::Warning);
            return Err(StoreError::NothingParsed);
        }

        let dropped = self.store.replace_catalog(outcome.catalog);
        self.report_dropped(&dropped);
        self.raw_input = Some(raw.to_string());

        self.notifier.notify(
            &format!(
                "Successfully parsed {} time slots for {} subjects",
                report.slots_parsed, report.subject_count
            ),
            Severity::Success,
        );
        Ok(report)
    }

    pub fn select(&mut self, subject: &str, class_code: &str) -> Result<SelectOutcome, StoreError> {
        let outcome = match self.store.select(subject, class_code) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.notifier.notify(&e.to_string(), Severity::Danger);
                return Err(e);
            }
        };

        let (message, severity) = match &outcome {
            SelectOutcome::Added => (format!("Added {} to {}", class_code, subject), Severity::Success),
            SelectOutcome::Switched { previous } => (
                format!("Switched from {} to {} in {}", previous, class_code, subject),
                Severity::Info,
            ),
            SelectOutcome::Reselected => (
                format!("{} is already selected for {}", class_code, subject),
                Severity::Info,
            ),
            SelectOutcome::Rejected(conflict) => (
                format!("Cannot select {}: Time conflict with {}", class_code, conflict),
                Severity::Danger,
            ),
        };
        self.notifier.notify(&message, severity);
        Ok(outcome)
    }

    /// Select `class_code`, or deselect it when it is already the selection.
    pub fn toggle(&mut self, subject: &str, class_code: &str) -> Result<Option<SelectOutcome>, StoreError> {
        if self.store.selected_class(subject) == Some(class_code) {
            self.deselect(subject)?;
            return Ok(None);
        }
        self.select(subject, class_code).map(Some)
    }

    pub fn deselect(&mut self, subject: &str) -> Result<String, StoreError> {
        match self.store.deselect(subject) {
            Ok(class_code) => {
                self.notifier
                    .notify(&format!("Removed {} from {}", class_code, subject), Severity::Info);
                Ok(class_code)
            }
            Err(e) => {
                self.notifier.notify(&e.to_string(), Severity::Warning);
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) {
        self.store.clear();
        self.raw_input = None;
        self.notifier.notify("Schedule cleared", Severity::Info);
    }

    pub fn snapshot(&self) -> ScheduleSnapshot {
        ScheduleSnapshot::capture(&self.store, self.raw_input.clone())
    }

    /// Replace all state with a snapshot's, keeping the current term year.
    pub fn restore(&mut self, snapshot: &ScheduleSnapshot) {
        let restored = snapshot.restore(self.store.term_year());

        for skipped in &restored.skipped_slots {
            self.notifier
                .notify(&format!("Skipped saved slot {}", skipped), Severity::Warning);
        }
        self.report_dropped(&restored.dropped);

        self.store = restored.store;
        self.raw_input = snapshot.raw_input.clone();
        tracing::info!(
            "Restored {} subjects, {} selections",
            self.store.catalog().len(),
            self.store.selections().count()
        );
    }

    fn report_dropped(&self, dropped: &[DroppedSelection]) {
        for d in dropped {
            let message = match &d.reason {
                DropReason::Missing => format!(
                    "Dropped {} from {}: class no longer offered",
                    d.class_code, d.subject
                ),
                DropReason::Conflict(conflict) => format!(
                    "Dropped {} from {}: Time conflict with {}",
                    d.class_code, d.subject, conflict
                ),
            };
            self.notifier.notify(&message, Severity::Warning);
        }
    }
}
