use actix_web::web;
use anyhow::{bail, Context};
use diesel::prelude::*;

use crate::{database::get_db_conn, DbPool};

pub async fn assert_client(
    pool: &DbPool,
    username: String,
    require_active: bool,
) -> anyhow::Result<()> {
    use crate::schema::clients;

    let conn = get_db_conn(pool)?;
    let res = web::block(move || {
        if require_active {
            clients::table
                .filter(clients::username.eq(username))
                .filter(clients::is_active.eq(true))
                .count()
                .get_result::<i64>(&conn)
        } else {
            clients::table
                .filter(clients::username.eq(username))
                .count()
                .get_result::<i64>(&conn)
        }
    })
    .await
    .context("DB error")?;

    if res == 0 {
        bail!("No such client");
    }

    Ok(())
}

pub async fn assert_operator(pool: &DbPool, oid: String) -> anyhow::Result<()> {
    use crate::schema::operators;

    let conn = get_db_conn(pool)?;
    let res = web::block(move || {
        operators::table
            .filter(operators::oid.eq(oid))
            .count()
            .get_result::<i64>(&conn)
    })
    .await
    .context("DB error")?;

    if res == 0 {
        bail!("No such operator");
    }

    Ok(())
}

pub async fn assert_category(pool: &DbPool, name: String) -> anyhow::Result<()> {
    use crate::schema::categories;

    let conn = get_db_conn(pool)?;
    let res = web::block(move || {
        categories::table
            .filter(categories::name.eq(name))
            .count()
            .get_result::<i64>(&conn)
    })
    .await
    .context("DB error")?;

    if res == 0 {
        bail!("No such category");
    }

    Ok(())
}

pub async fn assert_resource(pool: &DbPool, resource_id: u64) -> anyhow::Result<()> {
    use crate::schema::resources;

    let conn = get_db_conn(pool)?;
    let res = web::block(move || {
        resources::table
            .filter(resources::id.eq(resource_id))
            .count()
            .get_result::<i64>(&conn)
    })
    .await
    .context("DB error")?;

    if res == 0 {
        bail!("No such resource");
    }

    Ok(())
}
