//! Abstractions for time and user-facing notifications.
//!
//! This module provides traits for:
//! - `Clock`: supplies "today" so the default term year is testable
//! - `Notifier`: the notification collaborator receiving `(message, severity)`

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate};
use serde::Serialize;

// ==================== Clock Trait ====================

/// Trait for abstracting the current date.
pub trait Clock: Send + Sync {
    /// Today's date in local, naive time.
    fn today(&self) -> NaiveDate;
}

/// System clock implementation using real time.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Mock clock for testing with a controllable date.
#[derive(Debug, Clone)]
pub struct MockClock {
    date: Arc<Mutex<NaiveDate>>,
}

impl MockClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Arc::new(Mutex::new(date)),
        }
    }

    pub fn set_date(&self, date: NaiveDate) {
        *self.date.lock().unwrap() = date;
    }
}

impl Clock for MockClock {
    fn today(&self) -> NaiveDate {
        *self.date.lock().unwrap()
    }
}

// ==================== Notifier Trait ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Danger,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        };
        f.write_str(label)
    }
}

/// Receives user-facing messages. The core never renders them itself.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Prints notifications to stderr, one `[severity] message` line each.
/// Nothing is mirrored into `tracing`.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    fn render(message: &str, severity: Severity) -> String {
        format!("[{}] {}", severity, message)
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        eprintln!("{}", Self::render(message, severity));
    }
}

/// Mock notifier for testing that records all notifications.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    notifications: Arc<Mutex<Vec<(String, Severity)>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_notifications(&self) -> Vec<(String, Severity)> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn notification_count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }

    /// Most recent notification, if any.
    pub fn last(&self) -> Option<(String, Severity)> {
        self.notifications.lock().unwrap().last().cloned()
    }

    pub fn clear(&self) {
        self.notifications.lock().unwrap().clear();
    }

    pub fn was_called(&self) -> bool {
        !self.notifications.lock().unwrap().is_empty()
    }
}

impl Notifier for MockNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.notifications
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
    }
}
