//! Semester Planner Library
//!
//! Parses university timetable exports into a catalog of subjects and
//! classes, expands selected classes into dated occurrences and keeps the
//! selection free of time conflicts.

pub mod config;
pub mod conflict;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod period_clock;
pub mod persistence;
pub mod planner;
pub mod recurrence;
pub mod store;
pub mod traits;
pub mod week_mask;

// Re-export commonly used types
pub use config::AppConfig;
pub use conflict::{ConflictInfo, find_all_conflicts, find_conflict, overlaps};
pub use error::{ParseLineError, PersistenceError, SlotError, StoreError};
pub use export::{ExportFormat, write_occurrences};
pub use model::{Catalog, ClassGroup, Occurrence, Subject, TimeSlotDefinition};
pub use parser::{
    BlockFormat, FlaggedLine, GridFormat, Layout, ParseOutcome, ParseReport, ParserOptions,
    TimetableParser,
};
pub use period_clock::{ClockTime, PeriodClock};
pub use persistence::{RestoredSchedule, ScheduleSnapshot, SnapshotFile};
pub use planner::Planner;
pub use recurrence::{date_of, expand, expand_class};
pub use store::{DropReason, DroppedSelection, ScheduleStore, SelectOutcome, SlotAdvisory};
pub use traits::{Clock, ConsoleNotifier, MockClock, MockNotifier, Notifier, Severity, SystemClock};
