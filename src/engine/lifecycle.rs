use chrono::Utc;

use crate::models::{
    appointments::{
        can_transition, AppointmentData, APPOINT_STATUS_CANCELLED, APPOINT_STATUS_NO_SHOW,
    },
    notifications::{NOTIFY_KIND_CANCELLATION, NOTIFY_KIND_NO_SHOW},
};
use crate::notification::Notifier;

use super::error::{EngineError, EngineResult};
use super::store::Store;

/// Who is asking. Clients may only touch their own appointments;
/// operators may touch any. Authentication itself happens upstream.
#[derive(Debug)]
pub enum Actor {
    Client(String),
    Operator(String),
}

/// Terminal-state transitions and their allocation releases. Cancellation
/// and release always commit together: no reader can observe a cancelled
/// appointment that still holds resources.
pub struct CancelCoordinator<'a, S: Store> {
    store: &'a S,
    notifier: &'a dyn Notifier,
}

impl<'a, S: Store> CancelCoordinator<'a, S> {
    pub fn new(store: &'a S, notifier: &'a dyn Notifier) -> Self {
        CancelCoordinator { store, notifier }
    }

    pub fn cancel(
        &self,
        appointment_id: u64,
        actor: &Actor,
        reason: &str,
    ) -> EngineResult<AppointmentData> {
        let (appointment, released) = self.store.transaction(|txn| {
            let appointment = txn
                .lock_appointment(appointment_id)?
                .ok_or(EngineError::NotFound("appointment"))?;

            if let Actor::Client(username) = actor {
                if *username != appointment.username {
                    return Err(EngineError::Forbidden);
                }
            }
            if !can_transition(&appointment.status, APPOINT_STATUS_CANCELLED) {
                return Err(EngineError::InvalidState(format!(
                    "cannot cancel a {} appointment",
                    appointment.status
                )));
            }

            let cancelled_at = Utc::now().naive_utc();
            txn.set_appointment_cancelled(appointment_id, reason, cancelled_at)?;
            let released = txn.delete_allocations(appointment_id)?;

            Ok((
                AppointmentData {
                    status: APPOINT_STATUS_CANCELLED.to_string(),
                    cancellation_reason: Some(reason.to_string()),
                    cancelled_at: Some(cancelled_at),
                    ..appointment
                },
                released,
            ))
        })?;

        tracing::info!(appointment_id, actor = ?actor, released, "appointment cancelled");
        self.notifier.notify(
            &appointment.username,
            NOTIFY_KIND_CANCELLATION,
            "Appointment cancelled",
            reason,
            Some(appointment.id),
        );
        Ok(appointment)
    }

    /// Operator-driven status progression (confirm, begin, complete, mark
    /// no-show). Legality comes from the one transition table; NO_SHOW is
    /// terminal and frees the slot for resale.
    pub fn advance(&self, appointment_id: u64, target: &str) -> EngineResult<AppointmentData> {
        if target == APPOINT_STATUS_CANCELLED {
            return Err(EngineError::InvalidState(
                "cancellation carries a reason and an actor, use cancel".to_string(),
            ));
        }

        let (appointment, released) = self.store.transaction(|txn| {
            let appointment = txn
                .lock_appointment(appointment_id)?
                .ok_or(EngineError::NotFound("appointment"))?;
            if !can_transition(&appointment.status, target) {
                return Err(EngineError::InvalidState(format!(
                    "{} does not follow {}",
                    target, appointment.status
                )));
            }

            txn.set_appointment_status(appointment_id, target)?;
            let released = if target == APPOINT_STATUS_NO_SHOW {
                txn.delete_allocations(appointment_id)?
            } else {
                0
            };

            Ok((
                AppointmentData {
                    status: target.to_string(),
                    ..appointment
                },
                released,
            ))
        })?;

        tracing::info!(appointment_id, status = target, released, "appointment transitioned");
        if target == APPOINT_STATUS_NO_SHOW {
            self.notifier.notify(
                &appointment.username,
                NOTIFY_KIND_NO_SHOW,
                "Missed appointment",
                "The appointment was marked as a no-show.",
                Some(appointment.id),
            );
        }
        Ok(appointment)
    }
}
