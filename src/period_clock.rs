//! Period number -> wall clock conversion.
//!
//! Raw timetables only carry a period number and a period count. The
//! institution's block schedule is not uniform: some period boundaries
//! carry a break longer than the usual one, recorded here as an
//! "extension" keyed by the period being entered.

use chrono::NaiveTime;

use crate::error::SlotError;

/// Start of each period, `(hour, minute)`, indexed from period 1.
const STANDARD_STARTS: [(u32, u32); 12] = [
    (7, 0),
    (7, 50),
    (9, 0),
    (9, 50),
    (10, 40),
    (12, 25),
    (13, 15),
    (14, 15),
    (15, 5),
    (16, 5),
    (16, 55),
    (17, 45),
];

/// Extra minutes added when a run crosses into period `j` (index `j - 1`).
const STANDARD_EXTENSIONS: [u32; 12] = [0, 0, 20, 0, 0, 55, 0, 10, 0, 10, 0, 0];

/// Hourly grid: period `p` starts at `(p + 5):00`.
const HOURLY_STARTS: [(u32, u32); 16] = [
    (6, 0),
    (7, 0),
    (8, 0),
    (9, 0),
    (10, 0),
    (11, 0),
    (12, 0),
    (13, 0),
    (14, 0),
    (15, 0),
    (16, 0),
    (17, 0),
    (18, 0),
    (19, 0),
    (20, 0),
    (21, 0),
];

const HOURLY_EXTENSIONS: [u32; 16] = [0, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10];

/// Start time and length of a run of consecutive periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub start: NaiveTime,
    pub duration_minutes: u32,
}

/// Table-driven period clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodClock {
    starts: &'static [(u32, u32)],
    extensions: &'static [u32],
    period_minutes: u32,
}

impl PeriodClock {
    /// Twelve 50-minute periods with the institutional break table.
    pub const STANDARD: PeriodClock = PeriodClock {
        starts: &STANDARD_STARTS,
        extensions: &STANDARD_EXTENSIONS,
        period_minutes: 50,
    };

    /// Sixteen hourly columns, 50 minutes of class plus a 10-minute break.
    pub const HOURLY: PeriodClock = PeriodClock {
        starts: &HOURLY_STARTS,
        extensions: &HOURLY_EXTENSIONS,
        period_minutes: 50,
    };

    /// Number of periods in the table.
    pub fn period_count(&self) -> u32 {
        self.starts.len() as u32
    }

    /// Resolve `period_count` periods starting at `start_period`.
    ///
    /// Fails with [`SlotError::InvalidPeriod`] when the start is outside
    /// the table, the count is zero, or the run would overrun the last
    /// period.
    pub fn clock_for(&self, start_period: u32, period_count: u32) -> Result<ClockTime, SlotError> {
        let invalid = SlotError::InvalidPeriod {
            start: start_period,
            count: period_count,
        };
        let last = self.period_count();
        if start_period == 0 || start_period > last || period_count == 0 {
            return Err(invalid);
        }
        let end_period = start_period
            .checked_add(period_count - 1)
            .filter(|end| *end <= last)
            .ok_or(invalid.clone())?;

        let (hour, minute) = self.starts[(start_period - 1) as usize];
        let start = NaiveTime::from_hms_opt(hour, minute, 0).ok_or(invalid)?;

        let extension: u32 = ((start_period + 1)..=end_period)
            .map(|boundary| self.extensions[(boundary - 1) as usize])
            .sum();

        Ok(ClockTime {
            start,
            duration_minutes: period_count * self.period_minutes + extension,
        })
    }
}
