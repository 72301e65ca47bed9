//! Integration tests for the planner using mock dependencies.
//!
//! These tests drive parse/select/save/load cycles through `Planner` with
//! a `MockNotifier` so user-facing messages can be asserted exactly.

use std::sync::Arc;

use chrono::NaiveDate;
use semester_planner::{
    AppConfig, MockClock, MockNotifier, ParserOptions, Planner, ScheduleSnapshot, SelectOutcome,
    Severity, SnapshotFile, config::{ParserConfig, StorageConfig, TermConfig},
};
use tempfile::tempdir;

const TIMETABLE: &str = "\
CO2003 - Data Structures\t4\n\
Nhóm lớp\tSĩ số\n\
L01_TN01\t40/40\n\
Thứ 2\t- - 3 4 - - - - - - - - - - - -\tC6-103\t1\t\t1111\n\
Thứ 5\t- - - - - - - 8 9 - - - - - - -\tLAB-2\t1\t\t-1-1\tLab\n\
L02\t40/40\n\
Thứ 3\t- - 3 4 - - - - - - - - - - - -\tC6-104\t1\t\t1111\n\
MT1003 - Calculus\t4\n\
Nhóm lớp\tSĩ số\n\
CC01\t50/50\n\
Thứ 2\t- - - 4 5 - - - - - - - - - - -\tH1-101\t1\t\t11\n\
CC02\t50/50\n\
Thứ 6\t- - - 4 5 - - - - - - - - - - -\tH1-102\t1\t\t11\n";

fn planner() -> (Planner, MockNotifier) {
    let notifier = MockNotifier::new();
    let options = ParserOptions {
        grid_week_offset: 1,
        block_week_offset: 1,
    };
    (Planner::new(2025, options, Arc::new(notifier.clone())), notifier)
}

fn messages(notifier: &MockNotifier) -> Vec<String> {
    notifier.get_notifications().into_iter().map(|(m, _)| m).collect()
}

// ==================== Notification Tests ====================

#[test]
fn test_full_session_messages() {
    let (mut planner, notifier) = planner();

    planner.parse_text(TIMETABLE).unwrap();
    planner.select("Data Structures", "L01_TN01").unwrap();
    let rejected = planner.select("Calculus", "CC01").unwrap();
    planner.select("Calculus", "CC02").unwrap();
    planner.deselect("Data Structures").unwrap();

    assert!(!rejected.is_committed());
    assert_eq!(
        messages(&notifier),
        vec![
            "Successfully parsed 5 time slots for 2 subjects".to_string(),
            "Added L01_TN01 to Data Structures".to_string(),
            "Cannot select CC01: Time conflict with Data Structures at Mon 09:00 (week 1)".to_string(),
            "Added CC02 to Calculus".to_string(),
            "Removed L01_TN01 from Data Structures".to_string(),
        ]
    );
}

#[test]
fn test_conflicting_select_reports_danger() {
    let (mut planner, notifier) = planner();
    planner.parse_text(TIMETABLE).unwrap();
    planner.select("Calculus", "CC01").unwrap();
    notifier.clear();

    let outcome = planner.select("Data Structures", "L01_TN01").unwrap();
    assert!(matches!(outcome, SelectOutcome::Rejected(_)));
    assert_eq!(notifier.notification_count(), 1);
    assert_eq!(notifier.last().unwrap().1, Severity::Danger);
    assert_eq!(planner.store().selected_class("Data Structures"), None);
}

#[test]
fn test_failed_rows_are_reported_and_rest_parsed() {
    let (mut planner, notifier) = planner();
    let raw = TIMETABLE.replace("Thứ 3\t", "Thứ 9\t");
    let report = planner.parse_text(&raw).unwrap();

    assert_eq!(report.slots_parsed, 4);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].line, 7);
    let all = messages(&notifier);
    assert_eq!(all[0], "Error parsing line 7: unknown day 'Thứ 9'");
    assert_eq!(notifier.last().unwrap().1, Severity::Success);
}

#[test]
fn test_notes_and_advisories_after_parse() {
    let (mut planner, _) = planner();
    planner.parse_text(TIMETABLE).unwrap();
    planner.select("Calculus", "CC01").unwrap();

    let store = planner.store();
    let lab = &store.catalog().class("Data Structures", "L01_TN01").unwrap().time_slots[1];
    assert_eq!(lab.notes, "CO2003\nTN01\nLab");

    let advisory = store.advisory_for("Data Structures", "L01_TN01").unwrap();
    assert_eq!(advisory.len(), 1);
    assert_eq!(advisory[0].slot_index, 0);
    assert!(store.advisory_for("Data Structures", "L02").is_none());
}

// ==================== Snapshot Persistence Tests ====================

#[test]
fn test_save_and_restore_through_file() {
    let dir = tempdir().unwrap();
    let file = SnapshotFile::new(dir.path().join("schedule.json"));

    let (mut planner, _) = planner();
    planner.parse_text(TIMETABLE).unwrap();
    planner.select("Data Structures", "L02").unwrap();
    planner.select("Calculus", "CC01").unwrap();
    file.save(&planner.snapshot()).unwrap();

    let (mut restored, notifier) = self::planner();
    restored.restore(&file.load().unwrap());

    assert!(!notifier.was_called());
    assert_eq!(restored.store().selected_class("Data Structures"), Some("L02"));
    assert_eq!(restored.store().selected_class("Calculus"), Some("CC01"));
    assert_eq!(restored.store().occurrences(), planner.store().occurrences());
    assert_eq!(restored.raw_input(), Some(TIMETABLE));
}

#[test]
fn test_restore_legacy_snapshot_reports_drops() {
    let legacy = r#"{
        "subjects": [
            ["Calculus", [
                {"subjectname": "Calculus", "classCode": "CC01", "days": [1],
                 "startTime": "09:00", "period": 110, "room": "H1-101", "weeks": [1, 2]}
            ]],
            ["Physics", [
                {"subjectname": "Physics", "classCode": "P01", "days": [1],
                 "startTime": "09:30", "period": 50, "room": "B2", "weeks": [2]}
            ]]
        ],
        "selectedClasses": {
            "Calculus": {"classCode": "CC01"},
            "Physics": {"classCode": "P01"},
            "Biology": {"classCode": "B01"}
        }
    }"#;
    let snapshot = ScheduleSnapshot::from_json(legacy).unwrap();

    let (mut planner, notifier) = planner();
    planner.restore(&snapshot);

    assert_eq!(planner.store().selected_class("Calculus"), Some("CC01"));
    assert_eq!(planner.store().selected_class("Physics"), None);
    assert_eq!(
        messages(&notifier),
        vec![
            "Dropped B01 from Biology: class no longer offered".to_string(),
            "Dropped P01 from Physics: Time conflict with Calculus at Mon 09:30 (week 2)".to_string(),
        ]
    );
}

#[test]
fn test_planner_from_config_overrides() {
    let config = AppConfig {
        term: TermConfig { year: Some(2024) },
        parser: ParserConfig {
            grid_week_offset: 1,
            block_week_offset: 1,
        },
        storage: StorageConfig::default(),
    };
    let clock = MockClock::new(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
    let mut planner = Planner::from_config(&config, &clock, Arc::new(MockNotifier::new()));

    assert_eq!(planner.store().term_year(), 2024);
    planner.parse_text(TIMETABLE).unwrap();
    let weeks = &planner.store().catalog().class("Calculus", "CC01").unwrap().time_slots[0].active_weeks;
    assert_eq!(weeks.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
}
