use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use super::EngineError;
use crate::model::{Minute, TimeWindow, MINUTES_PER_DAY};

// ── Timezone normalization ───────────────────────────────────────
//
// Bookings live on the UTC timeline; every other computation works in
// the business's civil timezone. These two functions are the only
// crossing point, and they are inverses of each other for any instant
// outside a DST transition.

/// Project a UTC instant onto the business's wall clock.
pub fn to_local(tz: Tz, instant: DateTime<Utc>) -> (NaiveDate, Minute) {
    let local = instant.with_timezone(&tz);
    let minute = (local.time().num_seconds_from_midnight() / 60) as Minute;
    (local.date_naive(), minute)
}

/// Resolve a local calendar date + minute-of-day to a UTC instant.
///
/// A wall-clock value inside a spring-forward gap does not exist;
/// rather than silently picking a side the engine fails with
/// [`EngineError::AmbiguousLocalTime`]. A fall-back value that occurs
/// twice resolves to the earlier instant, keeping `to_local ∘ to_utc`
/// the identity for the first occurrence.
pub fn to_utc(tz: Tz, date: NaiveDate, minute: Minute) -> Result<DateTime<Utc>, EngineError> {
    debug_assert!(minute < MINUTES_PER_DAY, "minute-of-day out of range");
    let naive = date.and_time(NaiveTime::MIN) + Duration::minutes(minute as i64);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(EngineError::AmbiguousLocalTime { date, minute }),
    }
}

/// UTC instant at which the civil day `date` begins.
///
/// Midnight itself can fall inside a spring-forward gap (Havana and
/// Santiago both shift at 00:00); the civil day then begins at the
/// first valid wall-clock after the gap.
fn start_of_day(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    let mut probe = midnight;
    // Real gaps are at most a few hours; probe in 15-minute steps.
    for _ in 0..=12 {
        match tz.from_local_datetime(&probe) {
            LocalResult::Single(dt) => return dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
            LocalResult::None => probe += Duration::minutes(15),
        }
    }
    Utc.from_utc_datetime(&midnight)
}

/// Half-open UTC range `[start, end)` covering the civil day `date`.
/// 23, 24 or 25 hours long depending on DST.
pub fn day_bounds(tz: Tz, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of_day(tz, date);
    let end = match date.succ_opt() {
        Some(next) => start_of_day(tz, next),
        None => start + Duration::days(1),
    };
    (start, end)
}

/// Clamp an occupied UTC interval `[start, end)` to the civil day `date`,
/// as a local minutes-of-day window. `None` when the interval does not
/// reach into the day.
pub fn local_day_window(
    tz: Tz,
    date: NaiveDate,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Option<TimeWindow> {
    if end <= start {
        return None;
    }
    let (start_date, start_min) = to_local(tz, start);
    let (end_date, end_min) = to_local(tz, end);

    let lo = if start_date < date {
        0
    } else if start_date == date {
        start_min
    } else {
        return None; // starts after the day
    };
    let hi = if end_date > date {
        MINUTES_PER_DAY
    } else if end_date == date {
        end_min
    } else {
        return None; // ends before the day
    };
    (lo < hi).then(|| TimeWindow::new(lo, hi))
}
