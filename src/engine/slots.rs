use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

use super::conflict::conflicts_any;
use super::tz::to_local;
use crate::config::CalendarConfig;
use crate::model::{Minute, SlotVerdict, TimeWindow, UnavailableReason};

// ── Slot generation ──────────────────────────────────────────────

/// Where the queried civil date sits relative to "now" on the
/// business's wall clock. Computed once per query so the generator
/// itself never touches a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayProgress {
    /// The whole day is behind us.
    Past,
    /// The queried date is today; payload is the current local minute.
    Today(Minute),
    Future,
}

impl DayProgress {
    pub fn at(tz: Tz, date: NaiveDate, now: DateTime<Utc>) -> Self {
        let (today, now_minute) = to_local(tz, now);
        if date < today {
            DayProgress::Past
        } else if date == today {
            DayProgress::Today(now_minute)
        } else {
            DayProgress::Future
        }
    }

    /// A slot starting at the current minute counts as already started.
    fn has_passed(self, start: Minute) -> bool {
        match self {
            DayProgress::Past => true,
            DayProgress::Today(now) => start <= now,
            DayProgress::Future => false,
        }
    }
}

/// Enumerate candidate slots for one resource-day and annotate each with
/// an availability verdict.
///
/// Candidates run `open, open+g, open+2g, …` while the full service
/// duration still fits before closing; a slot that would run past close
/// is not generated at all. Verdict precedence per candidate: break
/// overlap, then already-passed, then first booking conflict. A closed
/// weekday yields no slots. Output is ascending by start minute.
///
/// `occupied` holds the day's occupying bookings as local windows, in
/// any order; overlapping entries (pre-existing anomalies) just produce
/// conflict verdicts.
pub fn generate_slots(
    config: &CalendarConfig,
    date: NaiveDate,
    occupied: &[TimeWindow],
    duration_min: Minute,
    progress: DayProgress,
) -> Vec<SlotVerdict> {
    debug_assert!(duration_min > 0, "duration validated by caller");
    if !config.is_open_on(date.weekday()) {
        return Vec::new();
    }

    let granularity = config.slot_granularity_min;
    let mut verdicts = Vec::new();
    let mut start = config.open_minute;
    while start + duration_min <= config.close_minute {
        let candidate = TimeWindow::new(start, start + duration_min);
        let verdict = if let Some(brk) = &config.break_window
            && candidate.overlaps(brk)
        {
            SlotVerdict::unavailable(start, UnavailableReason::InBreak)
        } else if progress.has_passed(start) {
            SlotVerdict::unavailable(start, UnavailableReason::AlreadyPassed)
        } else if conflicts_any(candidate, occupied) {
            SlotVerdict::unavailable(start, UnavailableReason::Conflict)
        } else {
            SlotVerdict::available(start)
        };
        verdicts.push(verdict);
        start += granularity;
    }
    verdicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    /// 09:00–12:00, 30-minute grid, open every day, UTC.
    fn config() -> CalendarConfig {
        CalendarConfig {
            open_minute: 9 * 60,
            close_minute: 12 * 60,
            slot_granularity_min: 30,
            break_window: None,
            open_days: [true; 7],
            timezone: chrono_tz::Tz::UTC,
        }
    }

    fn wednesday() -> NaiveDate {
        let d = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();
        assert_eq!(d.weekday(), Weekday::Wed);
        d
    }

    fn starts(verdicts: &[SlotVerdict]) -> Vec<Minute> {
        verdicts.iter().map(|v| v.start_minute).collect()
    }

    #[test]
    fn empty_day_generates_full_grid() {
        let v = generate_slots(&config(), wednesday(), &[], 30, DayProgress::Future);
        assert_eq!(starts(&v), vec![540, 570, 600, 630, 660, 690]);
        assert!(v.iter().all(|s| s.available));
    }

    #[test]
    fn output_is_ascending() {
        let v = generate_slots(&config(), wednesday(), &[], 30, DayProgress::Future);
        assert!(v.windows(2).all(|p| p[0].start_minute < p[1].start_minute));
    }

    #[test]
    fn booking_conflict_marks_slot_but_back_to_back_is_free() {
        // Existing booking 10:00–10:40: the 10:00 and 10:30 candidates
        // conflict, 09:30 (ends exactly at 10:00) stays available.
        let occupied = [TimeWindow::new(600, 640)];
        let v = generate_slots(&config(), wednesday(), &occupied, 30, DayProgress::Future);
        let by_start = |m: Minute| v.iter().find(|s| s.start_minute == m).unwrap();
        assert!(by_start(570).available);
        assert_eq!(by_start(600).reason, Some(UnavailableReason::Conflict));
        assert_eq!(by_start(630).reason, Some(UnavailableReason::Conflict));
        assert!(by_start(660).available);
    }

    #[test]
    fn duration_must_fit_before_close() {
        // 90-minute service: last candidate is 10:30; 11:00+ would run
        // past close and is not generated at all.
        let v = generate_slots(&config(), wednesday(), &[], 90, DayProgress::Future);
        assert_eq!(starts(&v), vec![540, 570, 600, 630]);
    }

    #[test]
    fn duration_longer_than_window_yields_nothing() {
        let v = generate_slots(&config(), wednesday(), &[], 240, DayProgress::Future);
        assert!(v.is_empty());
    }

    #[test]
    fn closed_weekday_yields_nothing() {
        let mut cfg = config();
        cfg.open_days[crate::model::weekday_index(Weekday::Wed)] = false;
        let v = generate_slots(&cfg, wednesday(), &[], 30, DayProgress::Future);
        assert!(v.is_empty());
    }

    #[test]
    fn all_days_closed_yields_nothing() {
        let mut cfg = config();
        cfg.open_days = [false; 7];
        let v = generate_slots(&cfg, wednesday(), &[], 30, DayProgress::Future);
        assert!(v.is_empty());
    }

    #[test]
    fn break_window_masks_slots() {
        let mut cfg = config();
        cfg.break_window = Some(TimeWindow::new(600, 660)); // 10:00–11:00
        let v = generate_slots(&cfg, wednesday(), &[], 30, DayProgress::Future);
        let reasons: Vec<_> = v.iter().map(|s| s.reason).collect();
        assert_eq!(
            reasons,
            vec![
                None,
                None,
                Some(UnavailableReason::InBreak),
                Some(UnavailableReason::InBreak),
                None,
                None,
            ]
        );
    }

    #[test]
    fn break_outranks_conflict() {
        let mut cfg = config();
        cfg.break_window = Some(TimeWindow::new(600, 660));
        let occupied = [TimeWindow::new(600, 660)];
        let v = generate_slots(&cfg, wednesday(), &occupied, 30, DayProgress::Future);
        let slot = v.iter().find(|s| s.start_minute == 600).unwrap();
        assert_eq!(slot.reason, Some(UnavailableReason::InBreak));
    }

    #[test]
    fn current_minute_counts_as_passed() {
        let v = generate_slots(&config(), wednesday(), &[], 30, DayProgress::Today(600));
        let by_start = |m: Minute| v.iter().find(|s| s.start_minute == m).unwrap();
        assert_eq!(by_start(540).reason, Some(UnavailableReason::AlreadyPassed));
        assert_eq!(by_start(600).reason, Some(UnavailableReason::AlreadyPassed));
        assert!(by_start(630).available);
    }

    #[test]
    fn past_day_marks_everything_passed() {
        let v = generate_slots(&config(), wednesday(), &[], 30, DayProgress::Past);
        assert!(v.iter().all(|s| s.reason == Some(UnavailableReason::AlreadyPassed)));
    }

    #[test]
    fn overlapping_existing_bookings_degrade_gracefully() {
        // Two bookings that overlap each other — a data anomaly the
        // generator tolerates.
        let occupied = [TimeWindow::new(570, 630), TimeWindow::new(600, 660)];
        let v = generate_slots(&config(), wednesday(), &occupied, 30, DayProgress::Future);
        let conflicted: Vec<_> = v
            .iter()
            .filter(|s| s.reason == Some(UnavailableReason::Conflict))
            .map(|s| s.start_minute)
            .collect();
        assert_eq!(conflicted, vec![570, 600, 630]);
    }

    #[test]
    fn progress_classifies_dates() {
        use chrono::TimeZone;
        let tz = chrono_tz::America::New_York;
        // 2026-08-05 18:00 UTC = 14:00 in New York.
        let now = Utc.with_ymd_and_hms(2026, 8, 5, 18, 0, 0).unwrap();
        let d = NaiveDate::from_ymd_opt;
        assert_eq!(DayProgress::at(tz, d(2026, 8, 4).unwrap(), now), DayProgress::Past);
        assert_eq!(DayProgress::at(tz, d(2026, 8, 5).unwrap(), now), DayProgress::Today(840));
        assert_eq!(DayProgress::at(tz, d(2026, 8, 6).unwrap(), now), DayProgress::Future);
    }

    #[test]
    fn progress_uses_local_date_not_utc_date() {
        use chrono::TimeZone;
        // 2026-08-06 02:00 UTC is still 2026-08-05 22:00 in New York.
        let tz = chrono_tz::America::New_York;
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 2, 0, 0).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();
        assert_eq!(DayProgress::at(tz, today, now), DayProgress::Today(1320));
    }
}
