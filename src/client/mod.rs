mod requests;
mod responses;
mod utils;

use crate::{
    database::{assert, get_db_conn},
    engine::{
        booking::{BookingCommand, BookingCoordinator},
        lifecycle::{Actor, CancelCoordinator},
        AppointmentFilter, MysqlStore,
    },
    models::{
        categories::CategoryData, client_logins::ClientLoginData, clients::ClientData,
        services::ServiceData,
    },
    protocol::SimpleResponse,
    utils::flatten_engine,
};
use actix_web::{post, web, HttpResponse, Responder};
use anyhow::{bail, Context};
use blake2::{Blake2b, Digest};
use chrono::Utc;
use diesel::prelude::*;

use self::{requests::*, responses::*, utils::get_username_from_token};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(logout)
        .service(view_info)
        .service(search_category)
        .service(search_service)
        .service(book)
        .service(cancel)
        .service(search_appoint);
}

crate::post_funcs! {
    (register, "/register", RegisterRequest, SimpleResponse),
    (login, "/login", LoginRequest, LoginResponse),
    (logout, "/logout", LogoutRequest, SimpleResponse),
    (view_info, "/view_info", ViewInfoRequest, ViewInfoResponse),
    (search_category, "/search_category", SearchCategoryRequest, SearchCategoryResponse),
    (search_service, "/search_service", SearchServiceRequest, SearchServiceResponse),
    (book, "/book", BookRequest, BookResponse),
    (cancel, "/cancel", CancelRequest, CancelResponse),
    (search_appoint, "/search_appoint", SearchAppointRequest, SearchAppointResponse),
}

async fn register_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<RegisterRequest>,
) -> anyhow::Result<SimpleResponse> {
    use crate::schema::clients;

    let info = info.into_inner();
    let conn = get_db_conn(&ctx.pool)?;

    web::block(move || {
        conn.transaction(|| {
            let res = clients::table
                .filter(clients::username.eq(&info.username))
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            if res > 0 {
                bail!("Username already exists");
            }

            let hashed_password = format!("{:x}", Blake2b::digest(info.password.as_bytes()));
            let data = ClientData {
                username: info.username,
                password: hashed_password,
                name: info.name,
                telephone: info.telephone,
                is_active: true,
            };

            diesel::insert_into(clients::table)
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
    use crate::schema::{client_logins, clients};

    let info = info.into_inner();
    assert::assert_client(&ctx.pool, info.username.clone(), true).await?;

    let conn = get_db_conn(&ctx.pool)?;
    let login_token = web::block(move || {
        conn.transaction(|| {
            let hashed_password = format!("{:x}", Blake2b::digest(info.password.as_bytes()));
            let res = clients::table
                .filter(clients::username.eq(&info.username))
                .filter(clients::password.eq(&hashed_password))
                .filter(clients::is_active.eq(true))
                .count()
                .get_result::<i64>(&conn)
                .context("DB error")?;
            if res != 1 {
                bail!("Wrong password");
            }

            let login_time = Utc::now().naive_utc();
            let login_token = format!(
                "{:x}",
                Blake2b::digest(format!("{}:{}", info.username, login_time).as_bytes())
            );
            let token_data = ClientLoginData {
                token: login_token.clone(),
                username: info.username,
                login_time,
            };
            diesel::insert_into(client_logins::table)
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
    use crate::schema::client_logins;

    let info = info.into_inner();
    let conn = get_db_conn(&ctx.pool)?;
    web::block(move || {
        diesel::delete(client_logins::table.filter(client_logins::token.eq(info.login_token)))
            .execute(&conn)
    })
    .await
    .context("DB error")?;

    Ok(SimpleResponse::ok())
}

async fn view_info_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<ViewInfoRequest>,
) -> anyhow::Result<ViewInfoResponse> {
    use crate::schema::clients;

    let info = info.into_inner();
    let username = get_username_from_token(info.login_token, &ctx.pool).await?;

    let conn = get_db_conn(&ctx.pool)?;
    let data = web::block(move || {
        clients::table
            .filter(clients::username.eq(username))
            .get_result::<ClientData>(&conn)
    })
    .await
    .context("DB error")?;

    Ok(ViewInfoResponse {
        success: true,
        err: "".to_string(),
        username: data.username,
        name: data.name,
        telephone: data.telephone,
    })
}

async fn search_category_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<SearchCategoryRequest>,
) -> anyhow::Result<SearchCategoryResponse> {
    use crate::schema::categories;

    let info = info.into_inner();
    let conn = get_db_conn(&ctx.pool)?;
    let name_pattern = crate::utils::get_str_pattern_opt(info.category_name);
    let first_index = info.first_index.unwrap_or(0).max(0);
    let limit = info.limit.unwrap_or(30).max(0);
    let cats = web::block(move || {
        categories::table
            .filter(categories::name.like(name_pattern))
            .order(categories::name.asc())
            .offset(first_index)
            .limit(limit)
            .get_results::<CategoryData>(&conn)
    })
    .await
    .context("DB error")?;

    let cats = cats
        .into_iter()
        .map(|data| SearchCategoryItem {
            name: data.name,
            info: data.information,
        })
        .collect();

    Ok(SearchCategoryResponse {
        success: true,
        err: "".to_string(),
        categories: cats,
    })
}

async fn search_service_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<SearchServiceRequest>,
) -> anyhow::Result<SearchServiceResponse> {
    use crate::schema::services;

    let info = info.into_inner();
    let conn = get_db_conn(&ctx.pool)?;
    let name_pattern = crate::utils::get_str_pattern_opt(info.service_name);
    let category_pattern = crate::utils::get_str_pattern_opt(info.category_name);
    let first_index = info.first_index.unwrap_or(0).max(0);
    let limit = info.limit.unwrap_or(30).max(0);
    let svcs = web::block(move || {
        services::table
            .filter(services::name.like(name_pattern))
            .filter(services::category.like(category_pattern))
            .filter(services::is_active.eq(true))
            .order(services::name.asc())
            .offset(first_index)
            .limit(limit)
            .get_results::<ServiceData>(&conn)
    })
    .await
    .context("DB error")?;

    let svcs = svcs
        .into_iter()
        .map(|data| SearchServiceItem {
            service_id: data.id,
            name: data.name,
            category: data.category,
            duration_minutes: data.duration_minutes,
            price_cents: data.price_cents,
            info: data.information,
        })
        .collect();

    Ok(SearchServiceResponse {
        success: true,
        err: "".to_string(),
        services: svcs,
    })
}

async fn book_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<BookRequest>,
) -> anyhow::Result<BookResponse> {
    let info = info.into_inner();
    let username = get_username_from_token(info.login_token.clone(), &ctx.pool).await?;
    assert::assert_client(&ctx.pool, username.clone(), true).await?;

    let start_time = crate::utils::parse_time_str(&info.start_time)?;

    let conn = get_db_conn(&ctx.pool)?;
    let notifier = ctx.notifier.clone();
    let appointment = flatten_engine(
        web::block(move || {
            let store = MysqlStore::new(conn);
            BookingCoordinator::new(&store, notifier.as_ref()).book(BookingCommand {
                username,
                service_id: info.service_id,
                start_time,
                notes: info.notes,
            })
        })
        .await,
    )?;

    Ok(BookResponse {
        success: true,
        err: "".to_string(),
        appointment_id: appointment.id,
        start_time: crate::utils::format_time_str(&appointment.start_time),
        end_time: crate::utils::format_time_str(&appointment.end_time),
        status: appointment.status,
    })
}

async fn cancel_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<CancelRequest>,
) -> anyhow::Result<CancelResponse> {
    let info = info.into_inner();
    let username = get_username_from_token(info.login_token.clone(), &ctx.pool).await?;
    assert::assert_client(&ctx.pool, username.clone(), true).await?;

    let conn = get_db_conn(&ctx.pool)?;
    let notifier = ctx.notifier.clone();
    let appointment = flatten_engine(
        web::block(move || {
            let store = MysqlStore::new(conn);
            CancelCoordinator::new(&store, notifier.as_ref()).cancel(
                info.appointment_id,
                &Actor::Client(username),
                &info.reason,
            )
        })
        .await,
    )?;

    Ok(CancelResponse {
        success: true,
        err: "".to_string(),
        appointment_id: appointment.id,
        status: appointment.status,
        cancelled_at: appointment
            .cancelled_at
            .map(|t| crate::utils::format_time_str(&t))
            .unwrap_or_default(),
    })
}

async fn search_appoint_impl(
    ctx: web::Data<crate::AppContext>,
    info: web::Json<SearchAppointRequest>,
) -> anyhow::Result<SearchAppointResponse> {
    let info = info.into_inner();
    let username = get_username_from_token(info.login_token.clone(), &ctx.pool).await?;
    assert::assert_client(&ctx.pool, username.clone(), true).await?;

    let (start_time, end_time) =
        crate::utils::parse_time_pair_str_opt(info.start_time, info.end_time)?;
    let filter = AppointmentFilter {
        username: Some(username),
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
            service_id: data.service_id,
            start_time: crate::utils::format_time_str(&data.start_time),
            end_time: crate::utils::format_time_str(&data.end_time),
            status: data.status,
            notes: data.notes.unwrap_or_default(),
        })
        .collect();

    Ok(SearchAppointResponse {
        success: true,
        err: "".to_string(),
        appointments: appos,
    })
}
