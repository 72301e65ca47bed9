//! Materialize weekly slots into dated occurrences.

use chrono::{Datelike, Duration, NaiveDate};

use crate::model::{ClassGroup, Occurrence, TimeSlotDefinition};

/// Monday of term week 1: the Monday on or before January 1st of `term_year`.
pub fn week_one_monday(term_year: i32) -> Option<NaiveDate> {
    let new_year = NaiveDate::from_ymd_opt(term_year, 1, 1)?;
    Some(new_year - Duration::days(new_year.weekday().num_days_from_monday() as i64))
}

/// Date of `day` (1=Monday..7=Sunday) in term week `week`.
pub fn date_of(term_year: i32, week: u32, day: u32) -> Option<NaiveDate> {
    let monday = week_one_monday(term_year)?;
    monday.checked_add_signed(Duration::weeks(week as i64 - 1) + Duration::days(day as i64 - 1))
}

/// One occurrence per `(day, active week)` pair, day-major.
///
/// Week numbers past the end of `term_year` simply roll into the next
/// calendar year; terms that start in autumn rely on this.
pub fn expand(slot: &TimeSlotDefinition, term_year: i32) -> Vec<Occurrence> {
    let duration = Duration::minutes(slot.duration_minutes as i64);
    let mut occurrences = Vec::with_capacity(slot.days.len() * slot.active_weeks.len());

    for &day in &slot.days {
        for &week in &slot.active_weeks {
            let Some(date) = date_of(term_year, week, day) else {
                tracing::warn!(
                    "No calendar date for {} week {} day {} in {}",
                    slot.subject_name,
                    week,
                    day,
                    term_year
                );
                continue;
            };
            let start = date.and_time(slot.start_time);
            occurrences.push(Occurrence {
                subject_name: slot.subject_name.clone(),
                class_code: slot.class_code.clone(),
                start,
                end: start + duration,
                room: slot.room.clone(),
                week_num: week,
                day_of_week: day,
                notes: slot.notes.clone(),
            });
        }
    }

    occurrences
}

/// Every occurrence of every slot of a class, in slot order.
pub fn expand_class(class: &ClassGroup, term_year: i32) -> Vec<Occurrence> {
    class
        .time_slots
        .iter()
        .flat_map(|slot| expand(slot, term_year))
        .collect()
}
