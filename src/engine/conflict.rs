use chrono::{DateTime, Duration, Utc};

use super::EngineError;
use crate::limits::MAX_DURATION_MIN;
use crate::model::{Minute, ResourceCalendar, TimeWindow};

pub(crate) fn validate_duration(duration_min: Minute) -> Result<(), EngineError> {
    if duration_min == 0 || duration_min > MAX_DURATION_MIN {
        return Err(EngineError::InvalidDuration(duration_min as u32));
    }
    Ok(())
}

/// True when the candidate window overlaps any occupied window.
/// Half-open semantics throughout: touching windows never conflict.
pub fn conflicts_any(candidate: TimeWindow, occupied: &[TimeWindow]) -> bool {
    occupied.iter().any(|w| candidate.overlaps(w))
}

/// Commit-time exclusion guard. Re-validates non-conflict against the
/// calendar's current bookings under the caller's write lock, so two
/// writers racing for the same interval cannot both commit. The loser
/// gets `SlotNoLongerAvailable` and is expected to re-query.
pub(crate) fn check_no_conflict(
    cal: &ResourceCalendar,
    start: DateTime<Utc>,
    duration_min: Minute,
) -> Result<(), EngineError> {
    let end = start + Duration::minutes(duration_min as i64);
    for booking in cal.overlapping(start, end) {
        if booking.status.occupies_time() {
            return Err(EngineError::SlotNoLongerAvailable {
                conflicting: booking.id,
            });
        }
    }
    Ok(())
}
