use chrono::NaiveDate;
use ulid::Ulid;

use super::conflict::{check_no_conflict, validate_duration};
use super::queries::{booking_info, validate_date};
use super::tz::to_utc;
use super::{Engine, EngineError};
use crate::config::CalendarConfig;
use crate::limits::*;
use crate::model::{
    Booking, BookingInfo, BookingStatus, ChangeEvent, Minute, ResourceCalendar, MINUTES_PER_DAY,
};

/// A booking request as it arrives from the booking-creation flow: a
/// slot the user picked on the business's wall clock, plus the service
/// duration. `id` lets callers retry idempotently; omitted ids are
/// minted here.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub id: Option<Ulid>,
    pub resource_id: Ulid,
    pub date: NaiveDate,
    pub start_minute: Minute,
    pub duration_min: Minute,
    pub label: Option<String>,
}

impl Engine {
    pub async fn create_resource(
        &self,
        id: Ulid,
        name: Option<String>,
        config: Option<CalendarConfig>,
    ) -> Result<(), EngineError> {
        if self.state.len() >= MAX_RESOURCES {
            return Err(EngineError::LimitExceeded("too many resources"));
        }
        if let Some(ref n) = name
            && n.len() > MAX_NAME_LEN
        {
            return Err(EngineError::LimitExceeded("resource name too long"));
        }
        let config = config.unwrap_or_default();
        config.validate()?;
        if self.state.contains_key(&id) {
            return Err(EngineError::AlreadyExists(id));
        }

        let cal = ResourceCalendar::new(id, name, config);
        self.state
            .insert(id, std::sync::Arc::new(tokio::sync::RwLock::new(cal)));
        metrics::gauge!(crate::observability::RESOURCES_ACTIVE).set(self.state.len() as f64);
        self.notify.send(id, &ChangeEvent::ResourceCreated { resource_id: id });
        Ok(())
    }

    pub async fn update_config(&self, id: Ulid, config: CalendarConfig) -> Result<(), EngineError> {
        config.validate()?;
        let cal = self.get_calendar(&id).ok_or(EngineError::NotFound(id))?;
        let mut guard = cal.write().await;
        guard.config = config;
        self.notify.send(id, &ChangeEvent::ConfigUpdated { resource_id: id });
        Ok(())
    }

    pub async fn delete_resource(&self, id: Ulid) -> Result<(), EngineError> {
        let cal = self.get_calendar(&id).ok_or(EngineError::NotFound(id))?;
        let guard = cal.read().await;
        for booking in &guard.bookings {
            self.booking_to_resource.remove(&booking.id);
        }
        drop(guard);

        self.state.remove(&id);
        metrics::gauge!(crate::observability::RESOURCES_ACTIVE).set(self.state.len() as f64);
        self.notify.send(id, &ChangeEvent::ResourceDeleted { resource_id: id });
        self.notify.remove(&id);
        Ok(())
    }

    /// Create a booking, guarded against the read-then-write race: the
    /// conflict check runs again under the calendar's write lock right
    /// before commit, so of two callers who both saw the slot as
    /// available only one can win. The loser gets
    /// [`EngineError::SlotNoLongerAvailable`] and re-queries.
    pub async fn create_booking(&self, req: NewBooking) -> Result<BookingInfo, EngineError> {
        validate_date(req.date)?;
        validate_duration(req.duration_min)?;
        if req.start_minute >= MINUTES_PER_DAY {
            return Err(EngineError::LimitExceeded("start minute past end of day"));
        }
        if let Some(ref l) = req.label
            && l.len() > MAX_LABEL_LEN
        {
            return Err(EngineError::LimitExceeded("label too long"));
        }

        let cal = self
            .get_calendar(&req.resource_id)
            .ok_or(EngineError::NotFound(req.resource_id))?;
        let mut guard = cal.write().await;
        if guard.bookings.len() >= MAX_BOOKINGS_PER_RESOURCE {
            return Err(EngineError::LimitExceeded("too many bookings on resource"));
        }
        guard.config.validate()?;

        let id = req.id.unwrap_or_else(Ulid::new);
        if self.booking_to_resource.contains_key(&id) {
            return Err(EngineError::AlreadyExists(id));
        }

        let start = to_utc(guard.config.timezone, req.date, req.start_minute)?;
        if let Err(e) = check_no_conflict(&guard, start, req.duration_min) {
            metrics::counter!(crate::observability::BOOKING_CONFLICTS_TOTAL).increment(1);
            return Err(e);
        }

        let booking = Booking {
            id,
            start,
            duration_min: req.duration_min,
            status: BookingStatus::Pending,
            label: req.label,
        };
        let info = booking_info(req.resource_id, guard.config.timezone, &booking);
        guard.insert_booking(booking);
        self.booking_to_resource.insert(id, req.resource_id);
        metrics::counter!(crate::observability::BOOKINGS_CREATED_TOTAL).increment(1);
        self.notify.send(
            req.resource_id,
            &ChangeEvent::BookingCreated {
                resource_id: req.resource_id,
                booking_id: id,
            },
        );
        Ok(info)
    }

    /// Move a booking through its lifecycle. Cancelling frees the
    /// occupied interval; the booking itself is never deleted.
    pub async fn set_booking_status(
        &self,
        booking_id: Ulid,
        status: BookingStatus,
    ) -> Result<BookingInfo, EngineError> {
        let (resource_id, mut guard) = self.resolve_booking_write(&booking_id).await?;
        let tz = guard.config.timezone;

        let booking = guard
            .booking_mut(booking_id)
            .ok_or(EngineError::NotFound(booking_id))?;
        if !booking.status.can_transition_to(status) {
            return Err(EngineError::IllegalTransition {
                from: booking.status,
                to: status,
            });
        }
        booking.status = status;
        let info = booking_info(resource_id, tz, booking);

        self.notify.send(
            resource_id,
            &ChangeEvent::BookingStatusChanged {
                resource_id,
                booking_id,
                status,
            },
        );
        Ok(info)
    }
}
