//! Activity code splitting.
//!
//! The compound activity field packs up to three 3-character activity
//! codes into one string. This module slices it into its sub-codes.

use crate::models::{ActivityCodes, Relation, ACTIVITY_CODE_WIDTH};
use tracing::debug;

/// Returns true if the raw activity value means "no activity".
///
/// Empty values and values that read as the integer zero ("0", "000000000")
/// are reported as missing in the data-quality summary. Splitting ignores
/// this and slices the value as-is.
pub fn is_missing_activity(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed.parse::<u64>() == Ok(0)
}

/// Slice a compound activity value into its three sub-codes.
///
/// A sub-code is present only when all of its characters are present, so
/// a 7-character value yields two sub-codes and nothing for the third.
pub fn split_activity(raw: &str) -> ActivityCodes {
    let chars: Vec<char> = raw.trim().chars().collect();
    let mut codes: [Option<String>; 3] = Default::default();

    for (slot, chunk) in codes.iter_mut().zip(chars.chunks(ACTIVITY_CODE_WIDTH)) {
        if chunk.len() == ACTIVITY_CODE_WIDTH {
            *slot = Some(chunk.iter().collect());
        }
    }

    ActivityCodes::new(codes)
}

/// Derive the activity sub-codes for every record in place.
pub fn apply_activity_split(relation: &mut Relation) {
    let mut split = 0usize;

    for record in &mut relation.records {
        record.activity_codes = record
            .activity
            .as_deref()
            .map(split_activity)
            .unwrap_or_default();

        if !record.activity_codes.is_empty() {
            split += 1;
        }
    }

    debug!(
        "Derived activity sub-codes for {} of {} records",
        split,
        relation.len()
    );
}
