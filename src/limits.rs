//! Hard caps protecting the in-memory directory from unbounded input.

use crate::model::Minute;

/// Max resources a single engine will hold.
pub const MAX_RESOURCES: usize = 10_000;

/// Max bookings tracked on one resource calendar.
pub const MAX_BOOKINGS_PER_RESOURCE: usize = 100_000;

/// Max resources in one layout column-group query.
pub const MAX_LAYOUT_GROUP: usize = 64;

/// Max booking duration. Anything longer than a day is not a service
/// appointment and would break the per-day clamping assumptions.
pub const MAX_DURATION_MIN: Minute = 1440;

pub const MAX_NAME_LEN: usize = 256;
pub const MAX_LABEL_LEN: usize = 1024;
