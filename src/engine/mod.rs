//! Availability and allocation engine.
//!
//! Everything that can double-book a resource lives here: the availability
//! index, the allocation planner and the two coordinators that commit and
//! release appointment/allocation rows. The HTTP modules never write those
//! tables themselves.

pub mod booking;
pub mod error;
pub mod interval;
pub mod lifecycle;
pub mod planner;
pub mod store;

#[cfg(test)]
pub mod testutil;

pub use self::error::{EngineError, EngineResult};
pub use self::interval::Interval;
pub use self::store::{AppointmentFilter, MysqlStore, Store};

use crate::models::appointments::AppointmentData;

/// Filtered, deterministically ordered read of appointment history.
pub fn list_appointments<S: Store>(
    store: &S,
    filter: &AppointmentFilter,
) -> EngineResult<Vec<AppointmentData>> {
    store.transaction(|txn| txn.list_appointments(filter))
}
