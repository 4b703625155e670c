use chrono::NaiveDateTime;

use crate::models::{
    allocations::NewAllocation,
    appointments::{AppointmentData, NewAppointment, APPOINT_STATUS_PENDING},
    notifications::NOTIFY_KIND_CONFIRMATION,
    resources::RESOURCE_STATUS_AVAILABLE,
};
use crate::notification::Notifier;

use super::error::{EngineError, EngineResult};
use super::interval::Interval;
use super::planner::{plan, resolve_requirements, resolve_service, AllocationDraft};
use super::store::{Store, StoreTxn};

pub struct BookingCommand {
    pub username: String,
    pub service_id: u64,
    pub start_time: NaiveDateTime,
    pub notes: Option<String>,
}

/// Commits appointments and their allocations as one unit. The store and
/// the notifier are injected; nothing here reaches process-wide state.
pub struct BookingCoordinator<'a, S: Store> {
    store: &'a S,
    notifier: &'a dyn Notifier,
}

impl<'a, S: Store> BookingCoordinator<'a, S> {
    pub fn new(store: &'a S, notifier: &'a dyn Notifier) -> Self {
        BookingCoordinator { store, notifier }
    }

    pub fn book(&self, cmd: BookingCommand) -> EngineResult<AppointmentData> {
        // The plan is provisional. Between this read and the commit below a
        // concurrent booking may take any planned resource, so every pick is
        // re-validated under row locks before anything is written.
        let (service, interval, drafts) = self.store.transaction(|txn| {
            let service = resolve_service(txn, cmd.service_id)?;
            let interval = Interval::span(cmd.start_time, service.duration_minutes)?;
            let requirements = resolve_requirements(txn, cmd.service_id)?;
            let drafts = plan(txn, &requirements, interval)?;
            Ok((service, interval, drafts))
        })?;

        let appointment = self.store.transaction(|txn| {
            for draft in &drafts {
                revalidate(txn, draft, interval)?;
            }

            let appointment = txn.insert_appointment(NewAppointment {
                username: cmd.username.clone(),
                service_id: cmd.service_id,
                start_time: interval.start(),
                end_time: interval.end(),
                status: APPOINT_STATUS_PENDING.to_string(),
                notes: cmd.notes.clone(),
                created_at: None,
            })?;

            for draft in &drafts {
                txn.insert_allocation(NewAllocation {
                    appointment_id: appointment.id,
                    resource_id: draft.resource_id,
                    start_time: interval.start(),
                    end_time: interval.end(),
                })?;
            }

            Ok(appointment)
        })?;

        tracing::info!(
            appointment_id = appointment.id,
            service_id = service.id,
            resources = drafts.len(),
            "appointment booked"
        );
        self.notifier.notify(
            &appointment.username,
            NOTIFY_KIND_CONFIRMATION,
            "Appointment booked",
            &format!("{} at {}", service.name, appointment.start_time),
            Some(appointment.id),
        );
        Ok(appointment)
    }
}

/// A planned resource must still be bookable at commit time. A failed
/// check is a `Conflict`, never a silent re-plan: the caller decides
/// whether to retry.
fn revalidate(txn: &mut dyn StoreTxn, draft: &AllocationDraft, interval: Interval) -> EngineResult<()> {
    let resource = txn
        .lock_resource(draft.resource_id)?
        .ok_or(EngineError::NotFound("resource"))?;
    if resource.status != RESOURCE_STATUS_AVAILABLE || !resource.is_active {
        return Err(EngineError::Conflict(format!(
            "resource {} is no longer bookable",
            resource.id
        )));
    }
    if !txn.resource_is_free(draft.resource_id, interval)? {
        return Err(EngineError::Conflict(format!(
            "resource {} was allocated concurrently",
            resource.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::engine::store::AppointmentFilter;
    use crate::engine::testutil::{at, MemStore, RecordingNotifier};
    use crate::models::resources::{
        ResourceData, RESOURCE_TYPE_EQUIPMENT, RESOURCE_TYPE_PERSONNEL,
    };
    use crate::models::service_requirements::RequirementData;
    use crate::models::services::ServiceData;

    fn book_at(
        store: &MemStore,
        notifier: &RecordingNotifier,
        username: &str,
        service_id: u64,
        hour: u32,
        min: u32,
    ) -> EngineResult<AppointmentData> {
        BookingCoordinator::new(store, notifier).book(BookingCommand {
            username: username.to_string(),
            service_id,
            start_time: at(hour, min),
            notes: None,
        })
    }

    #[test]
    fn booking_allocates_every_required_resource() {
        let store = MemStore::new();
        let notifier = RecordingNotifier::default();
        let service = store.add_service("Ultrasound", 45);
        store.add_requirement(service, RESOURCE_TYPE_PERSONNEL, 1);
        store.add_requirement(service, RESOURCE_TYPE_EQUIPMENT, 1);
        store.add_personnel("p1");
        store.add_equipment("scanner");

        let appointment = book_at(&store, &notifier, "c1", service, 9, 0).unwrap();
        assert_eq!(appointment.status, APPOINT_STATUS_PENDING);
        assert_eq!(appointment.end_time, at(9, 45));
        assert_eq!(store.allocations_for(appointment.id).len(), 2);
        assert_eq!(
            notifier.kinds_for("c1"),
            vec![NOTIFY_KIND_CONFIRMATION.to_string()]
        );
        store.assert_no_overlap();
    }

    #[test]
    fn service_without_requirements_books_without_allocations() {
        let store = MemStore::new();
        let notifier = RecordingNotifier::default();
        let service = store.add_service("Consultation", 15);

        let appointment = book_at(&store, &notifier, "c1", service, 9, 0).unwrap();
        assert_eq!(store.allocations_for(appointment.id).len(), 0);
    }

    #[test]
    fn unknown_or_inactive_service_is_not_found() {
        let store = MemStore::new();
        let notifier = RecordingNotifier::default();
        assert!(matches!(
            book_at(&store, &notifier, "c1", 999, 9, 0),
            Err(EngineError::NotFound("service"))
        ));

        let service = store.add_service("Haircut", 30);
        store.deactivate_service(service);
        assert!(matches!(
            book_at(&store, &notifier, "c1", service, 9, 0),
            Err(EngineError::NotFound("service"))
        ));
    }

    #[test]
    fn failed_booking_writes_nothing() {
        let store = MemStore::new();
        let notifier = RecordingNotifier::default();
        let service = store.add_service("Haircut", 30);
        store.add_requirement(service, RESOURCE_TYPE_PERSONNEL, 1);

        let err = book_at(&store, &notifier, "c1", service, 9, 0).unwrap_err();
        match err {
            EngineError::InsufficientResources { resource_type } => {
                assert_eq!(resource_type, RESOURCE_TYPE_PERSONNEL);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(store.appointment_count(), 0);
        assert_eq!(store.allocation_count(), 0);
        assert!(notifier.kinds_for("c1").is_empty());
    }

    #[test]
    fn touching_intervals_share_a_resource_but_overlaps_do_not() {
        let store = MemStore::new();
        let notifier = RecordingNotifier::default();
        let service = store.add_service("Massage", 60);
        store.add_requirement(service, RESOURCE_TYPE_PERSONNEL, 1);
        store.add_personnel("p1");

        book_at(&store, &notifier, "c1", service, 10, 0).unwrap();
        // [11:00, 12:00) touches [10:00, 11:00) and must fit.
        book_at(&store, &notifier, "c2", service, 11, 0).unwrap();
        // [10:30, 11:30) overlaps both.
        assert!(matches!(
            book_at(&store, &notifier, "c3", service, 10, 30),
            Err(EngineError::InsufficientResources { .. })
        ));
        store.assert_no_overlap();
    }

    #[test]
    fn duplicate_requirement_rows_draw_distinct_units() {
        let store = MemStore::new();
        let notifier = RecordingNotifier::default();
        let service = store.add_service("Imaging", 30);
        store.add_requirement(service, RESOURCE_TYPE_EQUIPMENT, 1);
        store.add_requirement(service, RESOURCE_TYPE_EQUIPMENT, 1);
        let only = store.add_equipment("scanner");

        // One unit cannot satisfy a merged demand of two.
        assert!(matches!(
            book_at(&store, &notifier, "c1", service, 9, 0),
            Err(EngineError::InsufficientResources { .. })
        ));

        let second = store.add_equipment("scanner-2");
        let appointment = book_at(&store, &notifier, "c1", service, 9, 0).unwrap();
        let mut picked: Vec<u64> = store
            .allocations_for(appointment.id)
            .iter()
            .map(|a| a.resource_id)
            .collect();
        picked.sort_unstable();
        assert_eq!(picked, vec![only, second]);
    }

    #[test]
    fn stale_plan_is_rejected_with_conflict() {
        let store = MemStore::new();
        let notifier = RecordingNotifier::default();
        let service = store.add_service("Haircut", 30);
        store.add_requirement(service, RESOURCE_TYPE_PERSONNEL, 1);
        let p1 = store.add_personnel("p1");

        let first = book_at(&store, &notifier, "c1", service, 9, 0).unwrap();
        assert_eq!(store.allocations_for(first.id)[0].resource_id, p1);

        // Serve the committer a snapshot taken before c1's booking: the
        // planner happily picks p1 again, and only the in-transaction
        // re-validation stands between that plan and a double booking.
        let stale = store
            .transaction(|txn| txn.lock_resource(p1))
            .unwrap()
            .unwrap();
        let racing = StalePlanStore {
            inner: &store,
            stale: vec![stale],
        };
        let err = BookingCoordinator::new(&racing, &notifier)
            .book(BookingCommand {
                username: "c2".to_string(),
                service_id: service,
                start_time: at(9, 0),
                notes: None,
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
        assert_eq!(store.appointment_count(), 1);
        store.assert_no_overlap();
    }

    #[test]
    fn concurrent_bookings_for_one_resource_produce_one_winner() {
        let store = Arc::new(MemStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = store.add_service("Haircut", 30);
        store.add_requirement(service, RESOURCE_TYPE_PERSONNEL, 1);
        store.add_personnel("p1");

        let mut handles = Vec::new();
        for client in &["c1", "c2"] {
            let store = Arc::clone(&store);
            let notifier = Arc::clone(&notifier);
            let client = client.to_string();
            handles.push(thread::spawn(move || {
                BookingCoordinator::new(&*store, &*notifier).book(BookingCommand {
                    username: client,
                    service_id: service,
                    start_time: at(9, 0),
                    notes: None,
                })
            }));
        }
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let won = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(won, 1);
        for result in &results {
            if let Err(err) = result {
                assert!(matches!(
                    err,
                    EngineError::Conflict(_) | EngineError::InsufficientResources { .. }
                ));
            }
        }
        assert_eq!(store.appointment_count(), 1);
        assert_eq!(store.allocation_count(), 1);
        store.assert_no_overlap();
    }

    #[test]
    fn listing_is_stable_across_identical_calls() {
        let store = MemStore::new();
        let notifier = RecordingNotifier::default();
        let service = store.add_service("Haircut", 30);
        store.add_personnel("p1");
        store.add_requirement(service, RESOURCE_TYPE_PERSONNEL, 1);

        book_at(&store, &notifier, "c1", service, 9, 0).unwrap();
        book_at(&store, &notifier, "c2", service, 9, 30).unwrap();

        let filter = AppointmentFilter::default();
        let first = crate::engine::list_appointments(&store, &filter).unwrap();
        let second = crate::engine::list_appointments(&store, &filter).unwrap();
        let ids = |items: &[AppointmentData]| items.iter().map(|a| a.id).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.len(), 2);

        let scoped = crate::engine::list_appointments(
            &store,
            &AppointmentFilter {
                username: Some("c1".to_string()),
                ..AppointmentFilter::default()
            },
        )
        .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].username, "c1");
    }

    /// Store double whose availability index answers from a stale snapshot,
    /// standing in for a concurrent writer between plan and commit.
    struct StalePlanStore<'a> {
        inner: &'a MemStore,
        stale: Vec<ResourceData>,
    }

    impl<'a> Store for StalePlanStore<'a> {
        fn transaction<T, F>(&self, f: F) -> EngineResult<T>
        where
            F: FnOnce(&mut dyn StoreTxn) -> EngineResult<T>,
        {
            let stale = self.stale.clone();
            self.inner.transaction(move |txn| {
                let mut wrapped = StaleTxn { inner: txn, stale };
                f(&mut wrapped)
            })
        }
    }

    struct StaleTxn<'b> {
        inner: &'b mut dyn StoreTxn,
        stale: Vec<ResourceData>,
    }

    impl<'b> StoreTxn for StaleTxn<'b> {
        fn service(&mut self, service_id: u64) -> EngineResult<Option<ServiceData>> {
            self.inner.service(service_id)
        }

        fn requirements(&mut self, service_id: u64) -> EngineResult<Vec<RequirementData>> {
            self.inner.requirements(service_id)
        }

        fn find_available(
            &mut self,
            resource_type: &str,
            _interval: Interval,
            limit: i64,
        ) -> EngineResult<Vec<ResourceData>> {
            let mut out: Vec<ResourceData> = self
                .stale
                .iter()
                .filter(|r| r.resource_type == resource_type)
                .cloned()
                .collect();
            out.truncate(limit as usize);
            Ok(out)
        }

        fn lock_resource(&mut self, resource_id: u64) -> EngineResult<Option<ResourceData>> {
            self.inner.lock_resource(resource_id)
        }

        fn resource_is_free(&mut self, resource_id: u64, interval: Interval) -> EngineResult<bool> {
            self.inner.resource_is_free(resource_id, interval)
        }

        fn insert_appointment(
            &mut self,
            appointment: NewAppointment,
        ) -> EngineResult<AppointmentData> {
            self.inner.insert_appointment(appointment)
        }

        fn insert_allocation(&mut self, allocation: NewAllocation) -> EngineResult<()> {
            self.inner.insert_allocation(allocation)
        }

        fn lock_appointment(
            &mut self,
            appointment_id: u64,
        ) -> EngineResult<Option<AppointmentData>> {
            self.inner.lock_appointment(appointment_id)
        }

        fn set_appointment_status(
            &mut self,
            appointment_id: u64,
            status: &str,
        ) -> EngineResult<()> {
            self.inner.set_appointment_status(appointment_id, status)
        }

        fn set_appointment_cancelled(
            &mut self,
            appointment_id: u64,
            reason: &str,
            cancelled_at: chrono::NaiveDateTime,
        ) -> EngineResult<()> {
            self.inner
                .set_appointment_cancelled(appointment_id, reason, cancelled_at)
        }

        fn delete_allocations(&mut self, appointment_id: u64) -> EngineResult<usize> {
            self.inner.delete_allocations(appointment_id)
        }

        fn list_appointments(
            &mut self,
            filter: &AppointmentFilter,
        ) -> EngineResult<Vec<AppointmentData>> {
            self.inner.list_appointments(filter)
        }
    }
}
