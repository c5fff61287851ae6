use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::{BookingStatus, Minute};

#[derive(Debug)]
pub enum EngineError {
    NotFound(Ulid),
    AlreadyExists(Ulid),
    /// Config can never produce a sane slot grid; surfaced before any
    /// slot generation runs.
    InvalidConfig(&'static str),
    InvalidDuration(u32),
    /// The local wall-clock value does not exist (DST spring-forward
    /// gap). The engine refuses to pick a side.
    AmbiguousLocalTime { date: NaiveDate, minute: Minute },
    /// Commit-time guard lost the race: another booking now occupies the
    /// interval. Recoverable — re-query slots and re-select.
    SlotNoLongerAvailable { conflicting: Ulid },
    IllegalTransition { from: BookingStatus, to: BookingStatus },
    LimitExceeded(&'static str),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            EngineError::InvalidConfig(msg) => write!(f, "invalid calendar config: {msg}"),
            EngineError::InvalidDuration(min) => write!(f, "invalid duration: {min} minutes"),
            EngineError::AmbiguousLocalTime { date, minute } => {
                write!(
                    f,
                    "local time {date} {:02}:{:02} falls in a DST transition gap",
                    minute / 60,
                    minute % 60
                )
            }
            EngineError::SlotNoLongerAvailable { conflicting } => {
                write!(f, "slot no longer available: conflicts with booking {conflicting}")
            }
            EngineError::IllegalTransition { from, to } => {
                write!(f, "illegal status transition: {from:?} -> {to:?}")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
