mod requests;
mod responses;
mod utils;

use crate::{
    database::{assert, get_db_conn},
    engine::{
        lifecycle::{Actor, CancelCoordinator},
        AppointmentFilter, MysqlStore,
    },
    models::{
        appointments::{
            is_terminal, AppointmentData, APPOINT_STATUS_COMPLETED, APPOINT_STATUS_CONFIRMED,
            APPOINT_STATUS_IN_PROGRESS, APPOINT_STATUS_NO_SHOW,
        },
        categories::CategoryData,
        notifications::NOTIFY_KIND_REMINDER,
        operator_logins::OperatorLoginData,
        operators::OperatorData,
        resources::{
            is_known_status, is_known_type, NewResource, ResourceData, UpdateResource,
            RESOURCE_STATUS_AVAILABLE, RESOURCE_STATUS_RETIRED, RESOURCE_TYPE_EQUIPMENT,
            RESOURCE_TYPE_PERSONNEL,
        },
        service_requirements::NewRequirement,
        services::{NewService, UpdateService},
    },
    notification::Notifier,
    protocol::{IdResponse, SimpleResponse},
    utils::{flatten_engine, last_insert_id},
};
use actix_web::{post, web, HttpResponse, Responder};
use anyhow::{bail, Context};
use blake2::{Blake2b, Digest};
use chrono::Utc;
use diesel::prelude::*;

use self::{requests::*, responses::*, utils::get_oid_from_token};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(logout)
        .service(add_category)
        .service(add_service)
        .service(modify_service)
        .service(set_service_active)
        .service(register_equipment)
        .service(register_personnel)
        .service(search_resource)
        .service(set_resource_status)
        .service(retire_resource)
        .service(search_appoint)
        .service(confirm_appoint)
        .service(begin_appoint)
        .service(complete_appoint)
        .service(mark_no_show)
        .service(cancel_appoint)
        .service(send_reminder);
}

crate::post_funcs! {
    (register, "/register", RegisterRequest, SimpleResponse),
    (login, "/login", LoginRequest, LoginResponse),
    (logout, "/logout", LogoutRequest, SimpleResponse),
    (add_category, "/add_category", AddCategoryRequest, SimpleResponse),
    (add_service, "/add_service", AddServiceRequest, IdResponse),
    (modify_service, "/modify_service", ModifyServiceRequest, SimpleResponse),
    (set_service_active, "/set_service_active", SetServiceActiveRequest, SimpleResponse),
    (register_equipment, "/register_equipment", RegisterEquipmentRequest, IdResponse),
    (register_personnel, "/register_personnel", RegisterPersonnelRequest, IdResponse),
    (search_resource, "/search_resource", SearchResourceRequest, SearchResourceResponse),
    (set_resource_status, "/set_resource_status", SetResourceStatusRequest, SimpleResponse),
    (retire_resource, "/retire_resource", RetireResourceRequest, SimpleResponse),
    (search_appoint, "/search_appoint", SearchAppointRequest, SearchAppointResponse),
    (confirm_appoint, "/confirm_appoint", AppointActionRequest, AppointResponse),
    (begin_appoint, "/begin_appoint", AppointActionRequest, AppointResponse),
    (complete_appoint, "/complete_appoint", AppointActionRequest, AppointResponse),
    (mark_no_show, "/mark_no_show", AppointActionRequest, AppointResponse),
    (cancel_appoint, "/cancel_appoint", CancelAppointRequest, AppointResponse),
    (send_reminder, "/send_reminder", AppointActionRequest, SimpleResponse),
}

async fn register_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<RegisterRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::operators;

    let info = info.into_inner();
    let conn = get_db_conn(&ctx.pool)?;

    web::block(move || {
        conn.transaction(|| {
            let res = operators::table
                .filter(operators::oid.eq(&info.oid))
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            if res > 0 {
                bail!("ID already exists");
            }

            let hashed_password = format!("{:x}", Blake2b::digest(info.password.as_bytes()));
            let data = OperatorData {
                oid: info.oid,
                password: hashed_password,
            };
            diesel::insert_into(operators::table)
                .values(data)
                .execute(&conn)
                .context("DB error")?;

            Ok(())
        })
    })
    .await?;

    Ok(SimpleResponse::ok())
}

async fn login_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<LoginRequest>,
) -> anyhow::Result<LoginResponse> {
    use crate::schema::{operator_logins, operators};

    let info = info.into_inner();
    assert::assert_operator(&ctx.pool, info.oid.clone()).await?;

    let conn = get_db_conn(&ctx.pool)?;
    let login_token = web::block(move || {
        conn.transaction(|| {
            let hashed_password = format!("{:x}", Blake2b::digest(info.password.as_bytes()));
            let res = operators::table
                .filter(operators::oid.eq(&info.oid))
                .filter(operators::password.eq(&hashed_password))
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            if res != 1 {
                bail!("Wrong password");
            }

            let login_time = Utc::now().naive_utc();
            let login_token = format!(
                "{:x}",
                Blake2b::digest(format!("{}:{}", info.oid, login_time).as_bytes())
            );
            let token_data = OperatorLoginData {
                token: login_token.clone(),
                oid: info.oid,
                login_time,
            };
            diesel::insert_into(operator_logins::table)
                .values(token_data)
                .execute(&conn)
                .context("DB error")?;

            Ok(login_token)
        })
    })
    .await?;

    Ok(LoginResponse {
        success: true,
        err: "".to_string(),
        login_token,
    })
}

async fn logout_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<LogoutRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::operator_logins;

    let info = info.into_inner();
    let conn = get_db_conn(&ctx.pool)?;
    web::block(move || {
        diesel::delete(operator_logins::table.filter(operator_logins::token.eq(info.login_token)))
            .execute(&conn)
    })
    .await
    .context("DB error")?;

    Ok(SimpleResponse::ok())
}

async fn add_category_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<AddCategoryRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::categories;

    let info = info.into_inner();
    get_oid_from_token(info.login_token, &ctx.pool).await?;

    let conn = get_db_conn(&ctx.pool)?;
    let name = info.category;
    let information = info.info;
    web::block(move || {
        conn.transaction(|| {
            let res = categories::table
                .filter(categories::name.eq(&name))
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            if res > 0 {
                bail!("Category already exists");
            }

            let data = CategoryData { name, information };
            diesel::insert_into(categories::table)
                .values(data)
                .execute(&conn)
                .context("DB error")?;

            Ok(())
        })
    })
    .await?;

    Ok(SimpleResponse::ok())
}

async fn add_service_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<AddServiceRequest>,
) -> anyhow::Result<IdResponse> {
    use crate::schema::{service_requirements, services};

    let info = info.into_inner();
    get_oid_from_token(info.login_token.clone(), &ctx.pool).await?;
    assert::assert_category(&ctx.pool, info.category.clone()).await?;

    if info.duration_minutes <= 0 {
        bail!("Duration must be positive");
    }
    if info.price_cents <= 0 {
        bail!("Price must be positive");
    }
    for req in &info.requirements {
        if !is_known_type(&req.resource_type) {
            bail!("Unknown resource type '{}'", req.resource_type);
        }
        if req.quantity < 1 {
            bail!("Requirement quantity must be at least 1");
        }
    }

    let conn = get_db_conn(&ctx.pool)?;
    let service_id = web::block(move || {
        conn.transaction(|| {
            let res = services::table
                .filter(services::name.eq(&info.name))
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            if res > 0 {
                bail!("Service name already exists");
            }

            let data = NewService {
                name: info.name,
                category: info.category,
                duration_minutes: info.duration_minutes,
                price_cents: info.price_cents,
                information: info.info,
                is_active: true,
            };
            diesel::insert_into(services::table)
                .values(data)
                .execute(&conn)
                .context("DB error")?;
            let service_id: u64 = diesel::select(last_insert_id)
                .get_result(&conn)
                .context("DB error")?;

            for req in &info.requirements {
                let data = NewRequirement {
                    service_id,
                    resource_type: req.resource_type.clone(),
                    quantity: req.quantity,
                };
                diesel::insert_into(service_requirements::table)
                    .values(data)
                    .execute(&conn)
                    .context("DB error")?;
            }

            Ok(service_id)
        })
    })
    .await?;

    Ok(IdResponse::ok(service_id))
}

async fn modify_service_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<ModifyServiceRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::services;

    let info = info.into_inner();
    get_oid_from_token(info.login_token.clone(), &ctx.pool).await?;

    if let Some(price) = info.price_cents {
        if price <= 0 {
            bail!("Price must be positive");
        }
    }

    let conn = get_db_conn(&ctx.pool)?;
    let service_id = info.service_id;
    let data = UpdateService {
        price_cents: info.price_cents,
        information: info.info,
        ..Default::default()
    };
    let updated = web::block(move || {
        diesel::update(services::table.filter(services::id.eq(service_id)))
            .set(&data)
            .execute(&conn)
    })
    .await
    .context("DB error")?;
    if updated == 0 {
        bail!("No such service");
    }

    Ok(SimpleResponse::ok())
}

async fn set_service_active_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<SetServiceActiveRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::services;

    let info = info.into_inner();
    get_oid_from_token(info.login_token.clone(), &ctx.pool).await?;

    let conn = get_db_conn(&ctx.pool)?;
    let updated = web::block(move || {
        diesel::update(services::table.filter(services::id.eq(info.service_id)))
            .set(services::is_active.eq(info.active))
            .execute(&conn)
    })
    .await
    .context("DB error")?;
    if updated == 0 {
        bail!("No such service");
    }

    Ok(SimpleResponse::ok())
}

async fn register_equipment_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<RegisterEquipmentRequest>,
) -> anyhow::Result<IdResponse> {
    use crate::schema::resources;

    let info = info.into_inner();
    get_oid_from_token(info.login_token.clone(), &ctx.pool).await?;

    let conn = get_db_conn(&ctx.pool)?;
    let resource_id = web::block(move || {
        conn.transaction(|| {
            let data = NewResource {
                name: info.name,
                resource_type: RESOURCE_TYPE_EQUIPMENT.to_string(),
                status: RESOURCE_STATUS_AVAILABLE.to_string(),
                is_active: true,
                personnel_id: None,
                model: info.model,
                serial_number: info.serial_number,
            };
            diesel::insert_into(resources::table)
                .values(data)
                .execute(&conn)
                .context("DB error")?;
            diesel::select(last_insert_id)
                .get_result::<u64>(&conn)
                .context("DB error")
        })
    })
    .await?;

    Ok(IdResponse::ok(resource_id))
}

async fn register_personnel_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<RegisterPersonnelRequest>,
) -> anyhow::Result<IdResponse> {
    use crate::schema::resources;

    let info = info.into_inner();
    get_oid_from_token(info.login_token.clone(), &ctx.pool).await?;

    let conn = get_db_conn(&ctx.pool)?;
    let resource_id = web::block(move || {
        conn.transaction(|| {
            // One bookable resource per personnel profile.
            let res = resources::table
                .filter(resources::personnel_id.eq(&info.personnel_id))
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            if res > 0 {
                bail!("Resource already exists for this personnel");
            }

            let name = match info.display_name {
                Some(name) => name,
                None => info.personnel_id.clone(),
            };
            let data = NewResource {
                name,
                resource_type: RESOURCE_TYPE_PERSONNEL.to_string(),
                status: RESOURCE_STATUS_AVAILABLE.to_string(),
                is_active: true,
                personnel_id: Some(info.personnel_id),
                model: None,
                serial_number: None,
            };
            diesel::insert_into(resources::table)
                .values(data)
                .execute(&conn)
                .context("DB error")?;
            diesel::select(last_insert_id)
                .get_result::<u64>(&conn)
                .context("DB error")
        })
    })
    .await?;

    Ok(IdResponse::ok(resource_id))
}

async fn search_resource_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<SearchResourceRequest>,
) -> anyhow::Result<SearchResourceResponse> {
    use crate::schema::resources;

    let info = info.into_inner();
    get_oid_from_token(info.login_token.clone(), &ctx.pool).await?;

    let conn = get_db_conn(&ctx.pool)?;
    let first_index = info.first_index.unwrap_or(0).max(0);
    let limit = info.limit.unwrap_or(30).max(0);
    let rows = web::block(move || {
        let mut query = resources::table.into_boxed();
        if let Some(resource_type) = info.resource_type {
            query = query.filter(resources::resource_type.eq(resource_type));
        }
        if let Some(status) = info.status {
            query = query.filter(resources::status.eq(status));
        }
        query
            .order(resources::id.asc())
            .offset(first_index)
            .limit(limit)
            .get_results::<ResourceData>(&conn)
    })
    .await
    .context("DB error")?;

    let rows = rows
        .into_iter()
        .map(|data| SearchResourceItem {
            resource_id: data.id,
            name: data.name,
            resource_type: data.resource_type,
            status: data.status,
            is_active: data.is_active,
            personnel_id: data.personnel_id.unwrap_or_default(),
            model: data.model.unwrap_or_default(),
            serial_number: data.serial_number.unwrap_or_default(),
        })
        .collect();

    Ok(SearchResourceResponse {
        success: true,
        err: "".to_string(),
        resources: rows,
    })
}

async fn set_resource_status_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<SetResourceStatusRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::resources;

    let info = info.into_inner();
    get_oid_from_token(info.login_token.clone(), &ctx.pool).await?;

    if !is_known_status(&info.status) {
        bail!("Unknown resource status '{}'", info.status);
    }
    if info.status == RESOURCE_STATUS_RETIRED {
        bail!("Retire resources through retire_resource");
    }
    assert::assert_resource(&ctx.pool, info.resource_id).await?;

    let conn = get_db_conn(&ctx.pool)?;
    let resource_id = info.resource_id;
    let data = UpdateResource {
        status: Some(info.status),
        ..Default::default()
    };
    web::block(move || {
        diesel::update(resources::table.filter(resources::id.eq(resource_id)))
            .set(&data)
            .execute(&conn)
    })
    .await
    .context("DB error")?;

    Ok(SimpleResponse::ok())
}

async fn retire_resource_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<RetireResourceRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::resources;

    let info = info.into_inner();
    get_oid_from_token(info.login_token.clone(), &ctx.pool).await?;
    assert::assert_resource(&ctx.pool, info.resource_id).await?;

    // Historical allocations keep referencing the row; it only leaves the
    // availability index.
    let conn = get_db_conn(&ctx.pool)?;
    let data = UpdateResource {
        status: Some(RESOURCE_STATUS_RETIRED.to_string()),
        is_active: Some(false),
    };
    web::block(move || {
        diesel::update(resources::table.filter(resources::id.eq(info.resource_id)))
            .set(&data)
            .execute(&conn)
    })
    .await
    .context("DB error")?;

    Ok(SimpleResponse::ok())
}

async fn search_appoint_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<SearchAppointRequest>,
) -> anyhow::Result<SearchAppointResponse> {
    let info = info.into_inner();
    get_oid_from_token(info.login_token.clone(), &ctx.pool).await?;

    let (start_time, end_time) =
        crate::utils::parse_time_pair_str_opt(info.start_time, info.end_time)?;
    let filter = AppointmentFilter {
        username: info.username,
        status: info.status,
        start_from: Some(start_time),
        start_until: Some(end_time),
    };

    let conn = get_db_conn(&ctx.pool)?;
    let appos = flatten_engine(
        web::block(move || {
            let store = MysqlStore::new(conn);
            crate::engine::list_appointments(&store, &filter)
        })
        .await,
    )?;

    let appos = appos
        .into_iter()
        .map(|data| SearchAppointItem {
            appointment_id: data.id,
            username: data.username,
            service_id: data.service_id,
            start_time: crate::utils::format_time_str(&data.start_time),
            end_time: crate::utils::format_time_str(&data.end_time),
            status: data.status,
        })
        .collect();

    Ok(SearchAppointResponse {
        success: true,
        err: "".to_string(),
        appointments: appos,
    })
}

async fn advance_to(
    ctx: web::Data<crate::AppContext>,
    info: AppointActionRequest,
    target: &'static str,
) -> anyhow::Result<AppointResponse> {
    get_oid_from_token(info.login_token.clone(), &ctx.pool).await?;

    let conn = get_db_conn(&ctx.pool)?;
    let notifier = ctx.notifier.clone();
    let appointment = flatten_engine(
        web::block(move || {
            let store = MysqlStore::new(conn);
            CancelCoordinator::new(&store, notifier.as_ref()).advance(info.appointment_id, target)
        })
        .await,
    )?;

    Ok(AppointResponse {
        success: true,
        err: "".to_string(),
        appointment_id: appointment.id,
        status: appointment.status,
    })
}

async fn confirm_appoint_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<AppointActionRequest>,
) -> anyhow::Result<AppointResponse> {
    advance_to(ctx, info.into_inner(), APPOINT_STATUS_CONFIRMED).await
}

async fn begin_appoint_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<AppointActionRequest>,
) -> anyhow::Result<AppointResponse> {
    advance_to(ctx, info.into_inner(), APPOINT_STATUS_IN_PROGRESS).await
}

async fn complete_appoint_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<AppointActionRequest>,
) -> anyhow::Result<AppointResponse> {
    advance_to(ctx, info.into_inner(), APPOINT_STATUS_COMPLETED).await
}

async fn mark_no_show_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<AppointActionRequest>,
) -> anyhow::Result<AppointResponse> {
    advance_to(ctx, info.into_inner(), APPOINT_STATUS_NO_SHOW).await
}

async fn cancel_appoint_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<CancelAppointRequest>,
) -> anyhow::Result<AppointResponse> {
    let info = info.into_inner();
    let oid = get_oid_from_token(info.login_token.clone(), &ctx.pool).await?;

    let conn = get_db_conn(&ctx.pool)?;
    let notifier = ctx.notifier.clone();
    let appointment = flatten_engine(
        web::block(move || {
            let store = MysqlStore::new(conn);
            CancelCoordinator::new(&store, notifier.as_ref()).cancel(
                info.appointment_id,
                &Actor::Operator(oid),
                &info.reason,
            )
        })
        .await,
    )?;

    Ok(AppointResponse {
        success: true,
        err: "".to_string(),
        appointment_id: appointment.id,
        status: appointment.status,
    })
}

async fn send_reminder_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<AppointActionRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::appointments;

    let info = info.into_inner();
    get_oid_from_token(info.login_token.clone(), &ctx.pool).await?;

    let conn = get_db_conn(&ctx.pool)?;
    let notifier = ctx.notifier.clone();
    web::block(move || {
        let appointment = appointments::table
            .filter(appointments::id.eq(info.appointment_id))
            .get_result::<AppointmentData>(&conn)
            .optional()
            .context("DB error")?;
        let appointment = match appointment {
            Some(appointment) => appointment,
            None => bail!("No such appointment"),
        };
        if is_terminal(&appointment.status) {
            bail!("Appointment is not upcoming");
        }

        notifier.notify(
            &appointment.username,
            NOTIFY_KIND_REMINDER,
            "Appointment reminder",
            &format!(
                "Upcoming appointment at {}",
                crate::utils::format_time_str(&appointment.start_time)
            ),
            Some(appointment.id),
        );
        Ok(())
    })
    .await?;

    Ok(SimpleResponse::ok())
}
