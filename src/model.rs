use chrono::{DateTime, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::config::CalendarConfig;

/// Minutes since local midnight — the engine's only wall-clock unit.
pub type Minute = u16;

pub const MINUTES_PER_DAY: Minute = 1440;

/// Half-open window `[start, end)` of local minutes-of-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Minute,
    pub end: Minute,
}

impl TimeWindow {
    pub fn new(start: Minute, end: Minute) -> Self {
        debug_assert!(start < end, "TimeWindow start must be before end");
        debug_assert!(end <= MINUTES_PER_DAY, "TimeWindow must fit in one day");
        Self { start, end }
    }

    pub fn duration_min(&self) -> Minute {
        self.end - self.start
    }

    /// Half-open overlap: windows that merely touch do not overlap,
    /// so back-to-back bookings are legal.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_minute(&self, m: Minute) -> bool {
        self.start <= m && m < self.end
    }
}

/// Booking lifecycle. Only `Pending` and `Confirmed` occupy time;
/// `Cancelled` and `Completed` never block a new reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn occupies_time(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Legal lifecycle moves. Terminal states accept nothing.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }
}

/// A reservation on one resource. Stored on the UTC timeline; every
/// wall-clock interpretation goes through the timezone normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub start: DateTime<Utc>,
    pub duration_min: Minute,
    pub status: BookingStatus,
    pub label: Option<String>,
}

impl Booking {
    /// End of the occupied interval `[start, start + duration)`.
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(self.duration_min as i64)
    }
}

/// One resource's calendar: its booking window config plus every booking
/// the engine has seen, sorted by `start`.
#[derive(Debug, Clone)]
pub struct ResourceCalendar {
    pub id: Ulid,
    pub name: Option<String>,
    pub config: CalendarConfig,
    /// Sorted by `start`. Overlapping entries are tolerated — pre-existing
    /// anomalies degrade to conflict verdicts on the read path.
    pub bookings: Vec<Booking>,
}

impl ResourceCalendar {
    pub fn new(id: Ulid, name: Option<String>, config: CalendarConfig) -> Self {
        Self {
            id,
            name,
            config,
            bookings: Vec::new(),
        }
    }

    /// Insert maintaining sort order by start instant.
    pub fn insert_booking(&mut self, booking: Booking) {
        let pos = self
            .bookings
            .binary_search_by_key(&booking.start, |b| b.start)
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
    }

    pub fn booking(&self, id: Ulid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    pub fn booking_mut(&mut self, id: Ulid) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|b| b.id == id)
    }

    /// Bookings whose occupied interval intersects `[from, to)`.
    /// Binary search skips everything starting at or after `to`.
    pub fn overlapping(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> impl Iterator<Item = &Booking> {
        let right_bound = self.bookings.partition_point(|b| b.start < to);
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.end() > from)
    }
}

/// Why a slot cannot be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    InBreak,
    AlreadyPassed,
    Conflict,
}

/// Availability verdict for one candidate start time. Recomputed on every
/// query, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotVerdict {
    pub start_minute: Minute,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnavailableReason>,
}

impl SlotVerdict {
    pub fn available(start_minute: Minute) -> Self {
        Self {
            start_minute,
            available: true,
            reason: None,
        }
    }

    pub fn unavailable(start_minute: Minute, reason: UnavailableReason) -> Self {
        Self {
            start_minute,
            available: false,
            reason: Some(reason),
        }
    }
}

/// Rendering lane assignment for one booking in a day layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutAssignment {
    pub booking_id: Ulid,
    pub column_index: u32,
    /// Distinct columns active anywhere in this booking's window —
    /// the divisor a renderer uses for its width.
    pub total_columns: u32,
}

// ── Change feed ──────────────────────────────────────────────────

/// Published on every committed mutation. Consumers re-run the slot and
/// layout queries from scratch; there is no incremental state to patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    ResourceCreated {
        resource_id: Ulid,
    },
    ConfigUpdated {
        resource_id: Ulid,
    },
    ResourceDeleted {
        resource_id: Ulid,
    },
    BookingCreated {
        resource_id: Ulid,
        booking_id: Ulid,
    },
    BookingStatusChanged {
        resource_id: Ulid,
        booking_id: Ulid,
        status: BookingStatus,
    },
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub id: Ulid,
    pub name: Option<String>,
    pub config: CalendarConfig,
    pub booking_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingInfo {
    pub id: Ulid,
    pub resource_id: Ulid,
    pub start: DateTime<Utc>,
    pub duration_min: Minute,
    pub status: BookingStatus,
    pub label: Option<String>,
    /// Local calendar date the booking starts on.
    pub local_date: NaiveDate,
    /// Local wall-clock start, minutes since midnight.
    pub local_start_minute: Minute,
}

/// Weekday index on the Monday-first 0–6 scale used by `open_days`.
pub fn weekday_index(day: Weekday) -> usize {
    day.num_days_from_monday() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn window_basics() {
        let w = TimeWindow::new(540, 600);
        assert_eq!(w.duration_min(), 60);
        assert!(w.contains_minute(540));
        assert!(w.contains_minute(599));
        assert!(!w.contains_minute(600)); // half-open
    }

    #[test]
    fn window_overlap() {
        let a = TimeWindow::new(540, 600);
        let b = TimeWindow::new(570, 630);
        let c = TimeWindow::new(600, 660);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c)); // back-to-back, not overlapping
    }

    #[test]
    fn status_occupancy() {
        assert!(BookingStatus::Pending.occupies_time());
        assert!(BookingStatus::Confirmed.occupies_time());
        assert!(!BookingStatus::Completed.occupies_time());
        assert!(!BookingStatus::Cancelled.occupies_time());
    }

    #[test]
    fn status_transitions() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Cancelled));
    }

    fn booking_at(hour: u32, duration_min: Minute) -> Booking {
        Booking {
            id: Ulid::new(),
            start: Utc.with_ymd_and_hms(2026, 8, 5, hour, 0, 0).unwrap(),
            duration_min,
            status: BookingStatus::Confirmed,
            label: None,
        }
    }

    #[test]
    fn calendar_insert_keeps_order() {
        let mut cal = ResourceCalendar::new(Ulid::new(), None, CalendarConfig::default());
        cal.insert_booking(booking_at(14, 30));
        cal.insert_booking(booking_at(9, 30));
        cal.insert_booking(booking_at(11, 30));
        let hours: Vec<_> = cal.bookings.iter().map(|b| b.start.format("%H").to_string()).collect();
        assert_eq!(hours, vec!["09", "11", "14"]);
    }

    #[test]
    fn calendar_overlapping_window() {
        let mut cal = ResourceCalendar::new(Ulid::new(), None, CalendarConfig::default());
        cal.insert_booking(booking_at(8, 30));
        cal.insert_booking(booking_at(12, 60));
        cal.insert_booking(booking_at(18, 30));

        let from = Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 8, 5, 13, 0, 0).unwrap();
        let hits: Vec<_> = cal.overlapping(from, to).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].duration_min, 60);
    }

    #[test]
    fn calendar_overlapping_excludes_adjacent() {
        // A booking ending exactly at the window start is not overlapping.
        let mut cal = ResourceCalendar::new(Ulid::new(), None, CalendarConfig::default());
        cal.insert_booking(booking_at(9, 60));
        let from = Utc.with_ymd_and_hms(2026, 8, 5, 10, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 8, 5, 11, 0, 0).unwrap();
        assert_eq!(cal.overlapping(from, to).count(), 0);
    }

    #[test]
    fn booking_end_is_start_plus_duration() {
        let b = booking_at(9, 40);
        assert_eq!(b.end(), Utc.with_ymd_and_hms(2026, 8, 5, 9, 40, 0).unwrap());
    }

    #[test]
    fn change_event_serialization_roundtrip() {
        let event = ChangeEvent::BookingStatusChanged {
            resource_id: Ulid::new(),
            booking_id: Ulid::new(),
            status: BookingStatus::Cancelled,
        };
        let json = serde_json::to_string(&event).unwrap();
        let decoded: ChangeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, decoded);
    }
}
