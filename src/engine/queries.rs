use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use ulid::Ulid;

use super::conflict::validate_duration;
use super::layout::pack_columns;
use super::slots::{generate_slots, DayProgress};
use super::tz::{day_bounds, local_day_window, to_local};
use super::{Engine, EngineError};
use crate::limits::MAX_LAYOUT_GROUP;
use crate::model::{
    Booking, BookingInfo, BookingStatus, LayoutAssignment, Minute, ResourceCalendar, ResourceInfo,
    SlotVerdict, TimeWindow,
};

/// Dates handed to the query API must be plausible calendar dates;
/// anything outside this range is a caller bug, not a day to compute.
pub(super) fn validate_date(date: NaiveDate) -> Result<(), EngineError> {
    if !(1970..=9999).contains(&date.year()) {
        return Err(EngineError::LimitExceeded("date out of range"));
    }
    Ok(())
}

/// The day's bookings passing `filter`, clamped to local windows on `date`.
pub(super) fn day_windows(
    cal: &ResourceCalendar,
    date: NaiveDate,
    filter: impl Fn(BookingStatus) -> bool,
) -> Vec<(Ulid, TimeWindow)> {
    let tz = cal.config.timezone;
    let (from, to) = day_bounds(tz, date);
    cal.overlapping(from, to)
        .filter(|b| filter(b.status))
        .filter_map(|b| local_day_window(tz, date, b.start, b.end()).map(|w| (b.id, w)))
        .collect()
}

pub(super) fn booking_info(resource_id: Ulid, tz: Tz, booking: &Booking) -> BookingInfo {
    let (local_date, local_start_minute) = to_local(tz, booking.start);
    BookingInfo {
        id: booking.id,
        resource_id,
        start: booking.start,
        duration_min: booking.duration_min,
        status: booking.status,
        label: booking.label.clone(),
        local_date,
        local_start_minute,
    }
}

impl Engine {
    /// Ordered slot verdicts for one resource-day, ascending by start.
    ///
    /// `duration_min` defaults to one granularity unit. `now` is passed
    /// in by the caller so the computation is a pure function of its
    /// arguments — identical inputs yield identical output.
    pub async fn available_slots(
        &self,
        resource_id: Ulid,
        date: NaiveDate,
        duration_min: Option<Minute>,
        now: DateTime<Utc>,
    ) -> Result<Vec<SlotVerdict>, EngineError> {
        validate_date(date)?;
        let cal = self
            .get_calendar(&resource_id)
            .ok_or(EngineError::NotFound(resource_id))?;
        let guard = cal.read().await;
        guard.config.validate()?;

        let duration = match duration_min {
            Some(d) => {
                validate_duration(d)?;
                d
            }
            None => guard.config.slot_granularity_min,
        };

        let occupied: Vec<TimeWindow> = day_windows(&guard, date, BookingStatus::occupies_time)
            .into_iter()
            .map(|(_, window)| window)
            .collect();
        let progress = DayProgress::at(guard.config.timezone, date, now);
        Ok(generate_slots(&guard.config, date, &occupied, duration, progress))
    }

    /// Column layout for one display group's day. The caller picks the
    /// grouping — one staff member or several merged into one band.
    /// Cancelled bookings are excluded by policy; completed ones still
    /// render.
    pub async fn day_layout(
        &self,
        resource_ids: &[Ulid],
        date: NaiveDate,
    ) -> Result<Vec<LayoutAssignment>, EngineError> {
        validate_date(date)?;
        if resource_ids.len() > MAX_LAYOUT_GROUP {
            return Err(EngineError::LimitExceeded("layout group too large"));
        }
        let mut items = Vec::new();
        for rid in resource_ids {
            let cal = self
                .get_calendar(rid)
                .ok_or(EngineError::NotFound(*rid))?;
            let guard = cal.read().await;
            items.extend(day_windows(&guard, date, |s| s != BookingStatus::Cancelled));
        }
        Ok(pack_columns(&items))
    }

    /// Every booking touching the resource's civil day, any status.
    pub async fn bookings_for_day(
        &self,
        resource_id: Ulid,
        date: NaiveDate,
    ) -> Result<Vec<BookingInfo>, EngineError> {
        validate_date(date)?;
        let cal = self
            .get_calendar(&resource_id)
            .ok_or(EngineError::NotFound(resource_id))?;
        let guard = cal.read().await;
        let tz = guard.config.timezone;
        let (from, to) = day_bounds(tz, date);
        Ok(guard
            .overlapping(from, to)
            .map(|b| booking_info(resource_id, tz, b))
            .collect())
    }

    pub async fn get_booking(&self, booking_id: Ulid) -> Result<BookingInfo, EngineError> {
        let resource_id = self
            .resource_for_booking(&booking_id)
            .ok_or(EngineError::NotFound(booking_id))?;
        let cal = self
            .get_calendar(&resource_id)
            .ok_or(EngineError::NotFound(resource_id))?;
        let guard = cal.read().await;
        let booking = guard
            .booking(booking_id)
            .ok_or(EngineError::NotFound(booking_id))?;
        Ok(booking_info(resource_id, guard.config.timezone, booking))
    }

    pub async fn list_resources(&self) -> Vec<ResourceInfo> {
        let calendars: Vec<_> = self.state.iter().map(|e| e.value().clone()).collect();
        let mut out = Vec::with_capacity(calendars.len());
        for cal in calendars {
            let guard = cal.read().await;
            out.push(ResourceInfo {
                id: guard.id,
                name: guard.name.clone(),
                config: guard.config.clone(),
                booking_count: guard.bookings.len(),
            });
        }
        out.sort_by_key(|r| r.id);
        out
    }
}
