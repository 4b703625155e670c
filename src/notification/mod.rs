use std::sync::Arc;

use chrono::Utc;
use diesel::prelude::*;

use crate::models::notifications::{
    is_known_kind, NewNotification, NOTIFY_KIND_CANCELLATION, NOTIFY_KIND_CONFIRMATION,
    NOTIFY_KIND_NO_SHOW,
};
use crate::DbPool;

/// Outbound notification hook. Fire and forget: implementations log
/// failures, never propagate them, and must not undo the operation that
/// triggered the send.
pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        recipient: &str,
        kind: &str,
        subject: &str,
        message: &str,
        appointment_id: Option<u64>,
    );
}

/// Domain events mirrored to an attached publisher. The engine never
/// talks to a transport directly; whoever owns a push channel registers
/// a publisher and may also be absent entirely.
#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    AppointmentBooked {
        appointment_id: u64,
        recipient: String,
    },
    AppointmentCancelled {
        appointment_id: u64,
        recipient: String,
    },
}

pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: &DomainEvent);
}

fn event_for(kind: &str, appointment_id: Option<u64>, recipient: &str) -> Option<DomainEvent> {
    let appointment_id = appointment_id?;
    match kind {
        NOTIFY_KIND_CONFIRMATION => Some(DomainEvent::AppointmentBooked {
            appointment_id,
            recipient: recipient.to_string(),
        }),
        // NO_SHOW releases the slot just like a cancellation does.
        NOTIFY_KIND_CANCELLATION | NOTIFY_KIND_NO_SHOW => {
            Some(DomainEvent::AppointmentCancelled {
                appointment_id,
                recipient: recipient.to_string(),
            })
        }
        _ => None,
    }
}

pub struct Dispatcher {
    pool: DbPool,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl Dispatcher {
    pub fn new(pool: DbPool, publisher: Option<Arc<dyn EventPublisher>>) -> Self {
        Dispatcher { pool, publisher }
    }

    fn record(&self, row: NewNotification) {
        use crate::schema::notifications;

        let conn = match self.pool.get() {
            Ok(conn) => conn,
            Err(err) => {
                tracing::warn!(%err, "notification not recorded");
                return;
            }
        };
        if let Err(err) = diesel::insert_into(notifications::table)
            .values(&row)
            .execute(&conn)
        {
            tracing::warn!(%err, "notification not recorded");
        }
    }
}

impl Notifier for Dispatcher {
    fn notify(
        &self,
        recipient: &str,
        kind: &str,
        subject: &str,
        message: &str,
        appointment_id: Option<u64>,
    ) {
        if !is_known_kind(kind) {
            tracing::warn!(kind, "dropping notification of unknown kind");
            return;
        }
        tracing::info!(
            recipient,
            kind,
            subject,
            appointment_id = ?appointment_id,
            "dispatching notification"
        );

        self.record(NewNotification {
            recipient: recipient.to_string(),
            kind: kind.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
            appointment_id,
            sent_at: Utc::now().naive_utc(),
        });

        if let Some(publisher) = &self.publisher {
            if let Some(event) = event_for(kind, appointment_id, recipient) {
                publisher.publish(&event);
            }
        }
    }
}
