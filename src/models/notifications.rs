use crate::schema::notifications;
use chrono::NaiveDateTime;

#[derive(Insertable)]
#[table_name = "notifications"]
pub struct NewNotification {
    pub recipient: String,
    pub kind: String,
    pub subject: String,
    pub message: String,
    pub appointment_id: Option<u64>,
    pub sent_at: NaiveDateTime,
}

pub const NOTIFY_KIND_CONFIRMATION: &str = "CONFIRMATION";
pub const NOTIFY_KIND_CANCELLATION: &str = "CANCELLATION";
pub const NOTIFY_KIND_REMINDER: &str = "REMINDER";
pub const NOTIFY_KIND_RESCHEDULE: &str = "RESCHEDULE";
pub const NOTIFY_KIND_NO_SHOW: &str = "NO_SHOW";

pub fn is_known_kind(kind: &str) -> bool {
    matches!(
        kind,
        NOTIFY_KIND_CONFIRMATION
            | NOTIFY_KIND_CANCELLATION
            | NOTIFY_KIND_REMINDER
            | NOTIFY_KIND_RESCHEDULE
            | NOTIFY_KIND_NO_SHOW
    )
}
