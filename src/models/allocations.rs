use crate::schema::allocations;
use chrono::NaiveDateTime;

/// An exclusive claim on one resource for one interval. The interval is
/// copied from the appointment at creation and never re-derived.
#[derive(Clone, Debug, Queryable)]
pub struct AllocationData {
    pub id: u64,
    pub appointment_id: u64,
    pub resource_id: u64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "allocations"]
pub struct NewAllocation {
    pub appointment_id: u64,
    pub resource_id: u64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}
