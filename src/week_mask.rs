//! Week-activity mask decoding.
//!
//! A mask is a fixed-width string where each character stands for one
//! term week. `-` marks an inactive week; any other character is active.

use std::collections::BTreeSet;

use crate::error::SlotError;

/// Inactive-week marker.
pub const INACTIVE: char = '-';

/// Decode `mask` into active week numbers, anchoring position 0 at `week_offset`.
pub fn decode(mask: &str, week_offset: u32) -> Result<BTreeSet<u32>, SlotError> {
    let weeks: BTreeSet<u32> = mask
        .trim()
        .chars()
        .enumerate()
        .filter(|(_, ch)| *ch != INACTIVE && !ch.is_whitespace())
        .map(|(position, _)| {
            u32::try_from(position)
                .ok()
                .and_then(|position| position.checked_add(week_offset))
                .ok_or_else(|| {
                    SlotError::Malformed(format!(
                        "week {} of mask '{}' overflows offset {}",
                        position + 1,
                        mask.trim(),
                        week_offset
                    ))
                })
        })
        .collect::<Result<_, _>>()?;

    if weeks.is_empty() {
        return Err(SlotError::EmptyWeekMask(mask.to_string()));
    }
    Ok(weeks)
}
