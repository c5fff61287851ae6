mod conflict;
mod error;
mod layout;
mod mutations;
mod queries;
mod slots;
mod tz;

pub use conflict::conflicts_any;
pub use error::EngineError;
pub use layout::pack_columns;
pub use mutations::NewBooking;
pub use slots::{generate_slots, DayProgress};
pub use tz::{day_bounds, local_day_window, to_local, to_utc};

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::model::ResourceCalendar;
use crate::notify::NotifyHub;

pub type SharedCalendar = Arc<RwLock<ResourceCalendar>>;

/// The serving facade around the pure engine: an in-memory directory of
/// resource calendars plus the change hub. Queries take read locks and
/// call the pure functions on a snapshot; mutations take write locks so
/// the commit-time conflict guard is race-free per resource.
pub struct Engine {
    pub state: DashMap<Ulid, SharedCalendar>,
    pub notify: Arc<NotifyHub>,
    /// Reverse lookup: booking id → owning resource id.
    pub(super) booking_to_resource: DashMap<Ulid, Ulid>,
}

impl Engine {
    pub fn new(notify: Arc<NotifyHub>) -> Self {
        Self {
            state: DashMap::new(),
            notify,
            booking_to_resource: DashMap::new(),
        }
    }

    pub fn get_calendar(&self, id: &Ulid) -> Option<SharedCalendar> {
        self.state.get(id).map(|e| e.value().clone())
    }

    pub fn resource_for_booking(&self, booking_id: &Ulid) -> Option<Ulid> {
        self.booking_to_resource.get(booking_id).map(|e| *e.value())
    }

    /// Lookup booking → resource, fetch the calendar, acquire its write lock.
    pub(super) async fn resolve_booking_write(
        &self,
        booking_id: &Ulid,
    ) -> Result<(Ulid, tokio::sync::OwnedRwLockWriteGuard<ResourceCalendar>), EngineError> {
        let resource_id = self
            .resource_for_booking(booking_id)
            .ok_or(EngineError::NotFound(*booking_id))?;
        let cal = self
            .get_calendar(&resource_id)
            .ok_or(EngineError::NotFound(resource_id))?;
        let guard = cal.write_owned().await;
        Ok((resource_id, guard))
    }
}
