//! Typed errors for parsing, scheduling and persistence.

use thiserror::Error;

/// Why a single timetable line (or record) could not become a time slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("unknown day '{0}'")]
    UnknownDay(String),
    #[error("period {start} (count {count}) is outside the clock table")]
    InvalidPeriod { start: u32, count: u32 },
    #[error("week mask '{0}' has no active weeks")]
    EmptyWeekMask(String),
    #[error("{0}")]
    Malformed(String),
}

/// A slot failure pinned to the 1-based line of the raw input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseLineError {
    pub line: usize,
    pub kind: SlotError,
}

impl ParseLineError {
    pub fn new(line: usize, kind: SlotError) -> Self {
        Self { line, kind }
    }

    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::new(line, SlotError::Malformed(reason.into()))
    }
}

/// Failures of store transitions. None of them touch committed state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("unknown subject '{0}'")]
    UnknownSubject(String),
    #[error("subject '{subject}' has no class '{class_code}'")]
    UnknownClass { subject: String, class_code: String },
    #[error("subject '{0}' has no selected class")]
    NotSelected(String),
    #[error("no valid time slots found in input")]
    NothingParsed,
}

/// Errors raised while saving or loading a schedule snapshot.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Snapshot file not found: {0}")]
    FileNotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Snapshot version mismatch: expected v{expected}, found v{found}")]
    VersionMismatch { expected: u32, found: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_error_display_includes_line_number() {
        let err = ParseLineError::new(12, SlotError::UnknownDay("Thứ Tám".to_string()));
        assert_eq!(err.to_string(), "line 12: unknown day 'Thứ Tám'");
    }

    #[test]
    fn test_invalid_period_display() {
        let err = SlotError::InvalidPeriod { start: 13, count: 2 };
        assert!(err.to_string().contains("period 13"));
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::UnknownClass {
            subject: "Algorithms".to_string(),
            class_code: "L09".to_string(),
        };
        assert_eq!(err.to_string(), "subject 'Algorithms' has no class 'L09'");
    }
}
