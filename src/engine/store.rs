use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;
use r2d2::PooledConnection;

use crate::models::{
    allocations::{AllocationData, NewAllocation},
    appointments::{AppointmentData, NewAppointment},
    resources::{ResourceData, RESOURCE_STATUS_AVAILABLE},
    service_requirements::RequirementData,
    services::ServiceData,
};

use crate::utils::last_insert_id;

use super::error::EngineResult;
use super::interval::Interval;

#[derive(Clone, Default)]
pub struct AppointmentFilter {
    /// Scope to one client's appointments.
    pub username: Option<String>,
    pub status: Option<String>,
    pub start_from: Option<NaiveDateTime>,
    pub start_until: Option<NaiveDateTime>,
}

/// Primitives the engine needs from the store, all executed inside one
/// atomic unit. Only the coordinators write appointments and allocations;
/// the index and planner stay on the read-only subset.
pub trait StoreTxn {
    fn service(&mut self, service_id: u64) -> EngineResult<Option<ServiceData>>;

    /// Requirement rows of a service, ordered by id.
    fn requirements(&mut self, service_id: u64) -> EngineResult<Vec<RequirementData>>;

    /// The availability index: resources of the given type that are
    /// AVAILABLE, active and have no allocation overlapping the interval.
    /// Ordered by resource id so repeated calls under identical state
    /// return identical results.
    fn find_available(
        &mut self,
        resource_type: &str,
        interval: Interval,
        limit: i64,
    ) -> EngineResult<Vec<ResourceData>>;

    /// Locking read of one resource row. Serializes concurrent committers
    /// that planned the same resource.
    fn lock_resource(&mut self, resource_id: u64) -> EngineResult<Option<ResourceData>>;

    /// Re-validation read: true iff no allocation on the resource overlaps
    /// the interval. Must see concurrently committed rows.
    fn resource_is_free(&mut self, resource_id: u64, interval: Interval) -> EngineResult<bool>;

    fn insert_appointment(&mut self, appointment: NewAppointment)
        -> EngineResult<AppointmentData>;

    fn insert_allocation(&mut self, allocation: NewAllocation) -> EngineResult<()>;

    fn lock_appointment(&mut self, appointment_id: u64) -> EngineResult<Option<AppointmentData>>;

    fn set_appointment_status(&mut self, appointment_id: u64, status: &str) -> EngineResult<()>;

    fn set_appointment_cancelled(
        &mut self,
        appointment_id: u64,
        reason: &str,
        cancelled_at: NaiveDateTime,
    ) -> EngineResult<()>;

    /// Releases every allocation of the appointment, returning the count.
    fn delete_allocations(&mut self, appointment_id: u64) -> EngineResult<usize>;

    fn list_appointments(
        &mut self,
        filter: &AppointmentFilter,
    ) -> EngineResult<Vec<AppointmentData>>;
}

/// A store that can run a closure transactionally: on `Err` every write
/// made inside the closure is rolled back.
pub trait Store {
    fn transaction<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&mut dyn StoreTxn) -> EngineResult<T>;
}

pub struct MysqlStore {
    conn: PooledConnection<ConnectionManager<MysqlConnection>>,
}

impl MysqlStore {
    pub fn new(conn: PooledConnection<ConnectionManager<MysqlConnection>>) -> Self {
        MysqlStore { conn }
    }
}

impl Store for MysqlStore {
    fn transaction<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&mut dyn StoreTxn) -> EngineResult<T>,
    {
        let conn: &MysqlConnection = &self.conn;
        conn.transaction(|| f(&mut MysqlTxn { conn }))
    }
}

struct MysqlTxn<'a> {
    conn: &'a MysqlConnection,
}

impl<'a> StoreTxn for MysqlTxn<'a> {
    fn service(&mut self, service_id: u64) -> EngineResult<Option<ServiceData>> {
        use crate::schema::services;

        services::table
            .filter(services::id.eq(service_id))
            .first::<ServiceData>(self.conn)
            .optional()
            .map_err(Into::into)
    }

    fn requirements(&mut self, service_id: u64) -> EngineResult<Vec<RequirementData>> {
        use crate::schema::service_requirements;

        service_requirements::table
            .filter(service_requirements::service_id.eq(service_id))
            .order(service_requirements::id.asc())
            .get_results::<RequirementData>(self.conn)
            .map_err(Into::into)
    }

    fn find_available(
        &mut self,
        resource_type: &str,
        interval: Interval,
        limit: i64,
    ) -> EngineResult<Vec<ResourceData>> {
        use crate::schema::{allocations, resources};
        use diesel::dsl::{exists, not};

        let conflicting = allocations::table.filter(
            allocations::resource_id
                .eq(resources::id)
                .and(allocations::start_time.lt(interval.end()))
                .and(allocations::end_time.gt(interval.start())),
        );

        resources::table
            .filter(resources::resource_type.eq(resource_type))
            .filter(resources::status.eq(RESOURCE_STATUS_AVAILABLE))
            .filter(resources::is_active.eq(true))
            .filter(not(exists(conflicting)))
            .order(resources::id.asc())
            .limit(limit)
            .get_results::<ResourceData>(self.conn)
            .map_err(Into::into)
    }

    fn lock_resource(&mut self, resource_id: u64) -> EngineResult<Option<ResourceData>> {
        use crate::schema::resources;

        resources::table
            .filter(resources::id.eq(resource_id))
            .for_update()
            .first::<ResourceData>(self.conn)
            .optional()
            .map_err(Into::into)
    }

    fn resource_is_free(&mut self, resource_id: u64, interval: Interval) -> EngineResult<bool> {
        use crate::schema::allocations;

        let conflicting = allocations::table
            .filter(allocations::resource_id.eq(resource_id))
            .filter(allocations::start_time.lt(interval.end()))
            .filter(allocations::end_time.gt(interval.start()))
            .for_update()
            .get_results::<AllocationData>(self.conn)?;

        Ok(conflicting.is_empty())
    }

    fn insert_appointment(
        &mut self,
        appointment: NewAppointment,
    ) -> EngineResult<AppointmentData> {
        use crate::schema::appointments;

        diesel::insert_into(appointments::table)
            .values(&appointment)
            .execute(self.conn)?;
        let id: u64 = diesel::select(last_insert_id).get_result(self.conn)?;

        appointments::table
            .filter(appointments::id.eq(id))
            .first::<AppointmentData>(self.conn)
            .map_err(Into::into)
    }

    fn insert_allocation(&mut self, allocation: NewAllocation) -> EngineResult<()> {
        use crate::schema::allocations;

        diesel::insert_into(allocations::table)
            .values(&allocation)
            .execute(self.conn)?;
        Ok(())
    }

    fn lock_appointment(
        &mut self,
        appointment_id: u64,
    ) -> EngineResult<Option<AppointmentData>> {
        use crate::schema::appointments;

        appointments::table
            .filter(appointments::id.eq(appointment_id))
            .for_update()
            .first::<AppointmentData>(self.conn)
            .optional()
            .map_err(Into::into)
    }

    fn set_appointment_status(&mut self, appointment_id: u64, status: &str) -> EngineResult<()> {
        use crate::schema::appointments;

        diesel::update(appointments::table.filter(appointments::id.eq(appointment_id)))
            .set(appointments::status.eq(status))
            .execute(self.conn)?;
        Ok(())
    }

    fn set_appointment_cancelled(
        &mut self,
        appointment_id: u64,
        reason: &str,
        cancelled_at: NaiveDateTime,
    ) -> EngineResult<()> {
        use crate::models::appointments::APPOINT_STATUS_CANCELLED;
        use crate::schema::appointments;

        diesel::update(appointments::table.filter(appointments::id.eq(appointment_id)))
            .set((
                appointments::status.eq(APPOINT_STATUS_CANCELLED),
                appointments::cancellation_reason.eq(reason),
                appointments::cancelled_at.eq(cancelled_at),
            ))
            .execute(self.conn)?;
        Ok(())
    }

    fn delete_allocations(&mut self, appointment_id: u64) -> EngineResult<usize> {
        use crate::schema::allocations;

        diesel::delete(allocations::table.filter(allocations::appointment_id.eq(appointment_id)))
            .execute(self.conn)
            .map_err(Into::into)
    }

    fn list_appointments(
        &mut self,
        filter: &AppointmentFilter,
    ) -> EngineResult<Vec<AppointmentData>> {
        use crate::schema::appointments;

        let mut query = appointments::table.into_boxed();
        if let Some(username) = &filter.username {
            query = query.filter(appointments::username.eq(username.clone()));
        }
        if let Some(status) = &filter.status {
            query = query.filter(appointments::status.eq(status.clone()));
        }
        if let Some(from) = filter.start_from {
            query = query.filter(appointments::start_time.ge(from));
        }
        if let Some(until) = filter.start_until {
            query = query.filter(appointments::start_time.le(until));
        }

        query
            .order((appointments::start_time.asc(), appointments::id.asc()))
            .get_results::<AppointmentData>(self.conn)
            .map_err(Into::into)
    }
}
