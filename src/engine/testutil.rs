//! In-memory store double for engine tests. Transactions serialize on one
//! mutex and roll back by restoring a snapshot, which gives the same
//! all-or-nothing and isolation guarantees the MySQL store provides.

use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime, Utc};

use crate::models::{
    allocations::{AllocationData, NewAllocation},
    appointments::{AppointmentData, NewAppointment},
    resources::{ResourceData, RESOURCE_STATUS_AVAILABLE, RESOURCE_TYPE_EQUIPMENT,
        RESOURCE_TYPE_PERSONNEL},
    service_requirements::RequirementData,
    services::ServiceData,
};
use crate::notification::Notifier;

use super::error::EngineResult;
use super::interval::Interval;
use super::store::{AppointmentFilter, Store, StoreTxn};

pub fn at(hour: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd(2021, 6, 1).and_hms(hour, min, 0)
}

#[derive(Clone, Default)]
struct MemState {
    next_id: u64,
    services: Vec<ServiceData>,
    requirements: Vec<RequirementData>,
    resources: Vec<ResourceData>,
    appointments: Vec<AppointmentData>,
    allocations: Vec<AllocationData>,
}

pub struct MemStore {
    state: Mutex<MemState>,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore {
            state: Mutex::new(MemState {
                next_id: 1,
                ..MemState::default()
            }),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    pub fn add_service(&self, name: &str, duration_minutes: i32) -> u64 {
        self.with_state(|state| {
            let id = state.next_id;
            state.next_id += 1;
            state.services.push(ServiceData {
                id,
                name: name.to_string(),
                category: "general".to_string(),
                duration_minutes,
                price_cents: 2500,
                information: String::new(),
                is_active: true,
            });
            id
        })
    }

    pub fn deactivate_service(&self, service_id: u64) {
        self.with_state(|state| {
            if let Some(service) = state.services.iter_mut().find(|s| s.id == service_id) {
                service.is_active = false;
            }
        });
    }

    pub fn add_requirement(&self, service_id: u64, resource_type: &str, quantity: i32) {
        self.with_state(|state| {
            let id = state.next_id;
            state.next_id += 1;
            state.requirements.push(RequirementData {
                id,
                service_id,
                resource_type: resource_type.to_string(),
                quantity,
            });
        });
    }

    fn add_resource(&self, name: &str, resource_type: &str) -> u64 {
        self.with_state(|state| {
            let id = state.next_id;
            state.next_id += 1;
            state.resources.push(ResourceData {
                id,
                name: name.to_string(),
                resource_type: resource_type.to_string(),
                status: RESOURCE_STATUS_AVAILABLE.to_string(),
                is_active: true,
                personnel_id: match resource_type {
                    RESOURCE_TYPE_PERSONNEL => Some(format!("staff-{}", id)),
                    _ => None,
                },
                model: None,
                serial_number: None,
            });
            id
        })
    }

    pub fn add_personnel(&self, name: &str) -> u64 {
        self.add_resource(name, RESOURCE_TYPE_PERSONNEL)
    }

    pub fn add_equipment(&self, name: &str) -> u64 {
        self.add_resource(name, RESOURCE_TYPE_EQUIPMENT)
    }

    pub fn set_resource_status(&self, resource_id: u64, status: &str) {
        self.with_state(|state| {
            if let Some(resource) = state.resources.iter_mut().find(|r| r.id == resource_id) {
                resource.status = status.to_string();
            }
        });
    }

    pub fn appointment(&self, appointment_id: u64) -> Option<AppointmentData> {
        self.with_state(|state| {
            state
                .appointments
                .iter()
                .find(|a| a.id == appointment_id)
                .cloned()
        })
    }

    pub fn appointment_count(&self) -> usize {
        self.with_state(|state| state.appointments.len())
    }

    pub fn allocation_count(&self) -> usize {
        self.with_state(|state| state.allocations.len())
    }

    pub fn allocations(&self) -> Vec<AllocationData> {
        self.with_state(|state| state.allocations.clone())
    }

    pub fn allocations_for(&self, appointment_id: u64) -> Vec<AllocationData> {
        self.with_state(|state| {
            state
                .allocations
                .iter()
                .filter(|a| a.appointment_id == appointment_id)
                .cloned()
                .collect()
        })
    }

    /// The core invariant: no two allocations on one resource overlap.
    pub fn assert_no_overlap(&self) {
        let allocations = self.allocations();
        for (i, a) in allocations.iter().enumerate() {
            for b in allocations.iter().skip(i + 1) {
                if a.resource_id != b.resource_id {
                    continue;
                }
                assert!(
                    !(a.start_time < b.end_time && b.start_time < a.end_time),
                    "allocations {} and {} overlap on resource {}",
                    a.id,
                    b.id,
                    a.resource_id,
                );
            }
        }
    }
}

impl Store for MemStore {
    fn transaction<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&mut dyn StoreTxn) -> EngineResult<T>,
    {
        let mut guard = self.state.lock().unwrap();
        let snapshot = guard.clone();
        let mut txn = MemTxn { state: &mut guard };
        match f(&mut txn) {
            Ok(value) => Ok(value),
            Err(err) => {
                *guard = snapshot;
                Err(err)
            }
        }
    }
}

struct MemTxn<'a> {
    state: &'a mut MemState,
}

impl<'a> StoreTxn for MemTxn<'a> {
    fn service(&mut self, service_id: u64) -> EngineResult<Option<ServiceData>> {
        Ok(self
            .state
            .services
            .iter()
            .find(|s| s.id == service_id)
            .cloned())
    }

    fn requirements(&mut self, service_id: u64) -> EngineResult<Vec<RequirementData>> {
        let mut rows: Vec<RequirementData> = self
            .state
            .requirements
            .iter()
            .filter(|r| r.service_id == service_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    fn find_available(
        &mut self,
        resource_type: &str,
        interval: Interval,
        limit: i64,
    ) -> EngineResult<Vec<ResourceData>> {
        let allocations = &self.state.allocations;
        let mut out: Vec<ResourceData> = self
            .state
            .resources
            .iter()
            .filter(|r| {
                r.resource_type == resource_type
                    && r.status == RESOURCE_STATUS_AVAILABLE
                    && r.is_active
            })
            .filter(|r| {
                !allocations
                    .iter()
                    .any(|a| a.resource_id == r.id && interval.overlaps(a.start_time, a.end_time))
            })
            .cloned()
            .collect();
        out.sort_by_key(|r| r.id);
        out.truncate(limit as usize);
        Ok(out)
    }

    fn lock_resource(&mut self, resource_id: u64) -> EngineResult<Option<ResourceData>> {
        Ok(self
            .state
            .resources
            .iter()
            .find(|r| r.id == resource_id)
            .cloned())
    }

    fn resource_is_free(&mut self, resource_id: u64, interval: Interval) -> EngineResult<bool> {
        Ok(!self
            .state
            .allocations
            .iter()
            .any(|a| a.resource_id == resource_id && interval.overlaps(a.start_time, a.end_time)))
    }

    fn insert_appointment(
        &mut self,
        appointment: NewAppointment,
    ) -> EngineResult<AppointmentData> {
        let id = self.state.next_id;
        self.state.next_id += 1;
        let data = AppointmentData {
            id,
            username: appointment.username,
            service_id: appointment.service_id,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            status: appointment.status,
            notes: appointment.notes,
            cancellation_reason: None,
            cancelled_at: None,
            created_at: appointment
                .created_at
                .unwrap_or_else(|| Utc::now().naive_utc()),
        };
        self.state.appointments.push(data.clone());
        Ok(data)
    }

    fn insert_allocation(&mut self, allocation: NewAllocation) -> EngineResult<()> {
        let id = self.state.next_id;
        self.state.next_id += 1;
        self.state.allocations.push(AllocationData {
            id,
            appointment_id: allocation.appointment_id,
            resource_id: allocation.resource_id,
            start_time: allocation.start_time,
            end_time: allocation.end_time,
        });
        Ok(())
    }

    fn lock_appointment(
        &mut self,
        appointment_id: u64,
    ) -> EngineResult<Option<AppointmentData>> {
        Ok(self
            .state
            .appointments
            .iter()
            .find(|a| a.id == appointment_id)
            .cloned())
    }

    fn set_appointment_status(&mut self, appointment_id: u64, status: &str) -> EngineResult<()> {
        if let Some(appointment) = self
            .state
            .appointments
            .iter_mut()
            .find(|a| a.id == appointment_id)
        {
            appointment.status = status.to_string();
        }
        Ok(())
    }

    fn set_appointment_cancelled(
        &mut self,
        appointment_id: u64,
        reason: &str,
        cancelled_at: NaiveDateTime,
    ) -> EngineResult<()> {
        use crate::models::appointments::APPOINT_STATUS_CANCELLED;

        if let Some(appointment) = self
            .state
            .appointments
            .iter_mut()
            .find(|a| a.id == appointment_id)
        {
            appointment.status = APPOINT_STATUS_CANCELLED.to_string();
            appointment.cancellation_reason = Some(reason.to_string());
            appointment.cancelled_at = Some(cancelled_at);
        }
        Ok(())
    }

    fn delete_allocations(&mut self, appointment_id: u64) -> EngineResult<usize> {
        let before = self.state.allocations.len();
        self.state
            .allocations
            .retain(|a| a.appointment_id != appointment_id);
        Ok(before - self.state.allocations.len())
    }

    fn list_appointments(
        &mut self,
        filter: &AppointmentFilter,
    ) -> EngineResult<Vec<AppointmentData>> {
        let mut out: Vec<AppointmentData> = self
            .state
            .appointments
            .iter()
            .filter(|a| match &filter.username {
                Some(username) => a.username == *username,
                None => true,
            })
            .filter(|a| match &filter.status {
                Some(status) => a.status == *status,
                None => true,
            })
            .filter(|a| match filter.start_from {
                Some(from) => a.start_time >= from,
                None => true,
            })
            .filter(|a| match filter.start_until {
                Some(until) => a.start_time <= until,
                None => true,
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| (a.start_time, a.id).cmp(&(b.start_time, b.id)));
        Ok(out)
    }
}

/// Notifier double that remembers every send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String, Option<u64>)>>,
}

impl RecordingNotifier {
    pub fn kinds_for(&self, recipient: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _, _)| to == recipient)
            .map(|(_, kind, _)| kind.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(
        &self,
        recipient: &str,
        kind: &str,
        _subject: &str,
        _message: &str,
        appointment_id: Option<u64>,
    ) {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), kind.to_string(), appointment_id));
    }
}
