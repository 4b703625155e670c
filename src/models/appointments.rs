use crate::schema::appointments;
use chrono::NaiveDateTime;

#[derive(Clone, Debug, Queryable)]
pub struct AppointmentData {
    pub id: u64,
    pub username: String,
    pub service_id: u64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: String,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "appointments"]
pub struct NewAppointment {
    pub username: String,
    pub service_id: u64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

pub const APPOINT_STATUS_PENDING: &str = "PENDING";
pub const APPOINT_STATUS_CONFIRMED: &str = "CONFIRMED";
pub const APPOINT_STATUS_IN_PROGRESS: &str = "IN_PROGRESS";
pub const APPOINT_STATUS_COMPLETED: &str = "COMPLETED";
pub const APPOINT_STATUS_CANCELLED: &str = "CANCELLED";
pub const APPOINT_STATUS_NO_SHOW: &str = "NO_SHOW";

/// COMPLETED, CANCELLED and NO_SHOW accept no further transitions.
pub fn is_terminal(status: &str) -> bool {
    matches!(
        status,
        APPOINT_STATUS_COMPLETED | APPOINT_STATUS_CANCELLED | APPOINT_STATUS_NO_SHOW
    )
}

/// Single source of transition legality. Every status mutation goes
/// through this check.
pub fn can_transition(from: &str, to: &str) -> bool {
    match (from, to) {
        (APPOINT_STATUS_PENDING, APPOINT_STATUS_CONFIRMED) => true,
        (APPOINT_STATUS_PENDING, APPOINT_STATUS_CANCELLED) => true,
        (APPOINT_STATUS_CONFIRMED, APPOINT_STATUS_IN_PROGRESS) => true,
        (APPOINT_STATUS_CONFIRMED, APPOINT_STATUS_CANCELLED) => true,
        (APPOINT_STATUS_CONFIRMED, APPOINT_STATUS_NO_SHOW) => true,
        (APPOINT_STATUS_IN_PROGRESS, APPOINT_STATUS_COMPLETED) => true,
        _ => false,
    }
}
