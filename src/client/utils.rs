use actix_web::web;
use anyhow::{bail, Context};
use chrono::Utc;
use diesel::prelude::*;

use crate::{database::get_db_conn, models::client_logins::ClientLoginData, DbPool};

pub async fn get_username_from_token(token: String, pool: &DbPool) -> anyhow::Result<String> {
    use crate::schema::client_logins;
    const MAX_LOGIN_TIME_SECS: i64 = 3600;

    let conn = get_db_conn(pool)?;
    let data = web::block(move || {
        client_logins::table
            .filter(client_logins::token.eq(token))
            .order(client_logins::login_time.desc())
            .limit(1)
            .get_result::<ClientLoginData>(&conn)
            .optional()
    })
    .await
    .context("DB error")?;

    if let Some(data) = data {
        let time_diff = Utc::now()
            .naive_utc()
            .signed_duration_since(data.login_time);
        if time_diff.num_seconds() <= MAX_LOGIN_TIME_SECS {
            Ok(data.username)
        } else {
            bail!("Login expired");
        }
    } else {
        bail!("Not logged in");
    }
}
