use chrono::Weekday;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::engine::EngineError;
use crate::model::{weekday_index, Minute, TimeWindow, MINUTES_PER_DAY};

/// Declarative description of when a resource can be booked: the open
/// window, the slot grid, an optional break, the weekdays the business
/// operates, and the business's fixed civil timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub open_minute: Minute,
    pub close_minute: Minute,
    pub slot_granularity_min: Minute,
    pub break_window: Option<TimeWindow>,
    /// Monday-first open flags, indexed by `weekday_index`.
    pub open_days: [bool; 7],
    pub timezone: Tz,
}

impl Default for CalendarConfig {
    /// Documented fallback used when a resource has no stored config:
    /// 09:00–18:00, 30-minute grid, no break, Monday–Saturday, UTC.
    fn default() -> Self {
        Self {
            open_minute: 9 * 60,
            close_minute: 18 * 60,
            slot_granularity_min: 30,
            break_window: None,
            open_days: [true, true, true, true, true, true, false],
            timezone: Tz::UTC,
        }
    }
}

impl CalendarConfig {
    /// Rejects configs that can never generate a sane slot grid.
    /// Runs before any slot generation; a bad config is fatal, not a
    /// degraded verdict.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.open_minute >= self.close_minute {
            return Err(EngineError::InvalidConfig("open time must be before close time"));
        }
        if self.close_minute > MINUTES_PER_DAY {
            return Err(EngineError::InvalidConfig("close time past end of day"));
        }
        if self.slot_granularity_min == 0 {
            return Err(EngineError::InvalidConfig("slot granularity must be positive"));
        }
        if let Some(brk) = &self.break_window {
            if brk.start >= brk.end {
                return Err(EngineError::InvalidConfig("break window is empty or inverted"));
            }
            if brk.start < self.open_minute || brk.end > self.close_minute {
                return Err(EngineError::InvalidConfig("break window outside open hours"));
            }
        }
        Ok(())
    }

    pub fn is_open_on(&self, day: Weekday) -> bool {
        self.open_days[weekday_index(day)]
    }

    /// The whole bookable window for an open day.
    pub fn open_window(&self) -> TimeWindow {
        TimeWindow::new(self.open_minute, self.close_minute)
    }
}
