//! timegrid — scheduling & availability engine for service businesses.
//!
//! The engine answers two questions about a resource's calendar day:
//! which slots can still be booked, and how the day's bookings should be
//! laid out side by side without visual overlap. All computation is pure
//! over immutable snapshots; the serving shell around it owns the
//! in-memory calendar directory, the change feed, and the HTTP surface.

pub mod config;
pub mod engine;
pub mod http;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;

pub use engine::{Engine, EngineError};
