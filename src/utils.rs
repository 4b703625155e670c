#[macro_export]
macro_rules! post_funcs {
    ( $( ( $func_name:ident, $url:expr, $request:ty, $response:ty ) ),+ $(,)? ) => {
        $(
            paste::paste! {
                #[post($url)]
                async fn $func_name(
                    ctx: web::Data<crate::AppContext>,
                    info: web::Json<$request>
                ) -> impl Responder {
                    let response = match [<$func_name _impl>](ctx, info).await {
                        Ok(response) => response,
                        Err(err) => $response::err(err.to_string()),
                    };
                    HttpResponse::Ok().json(response)
                }
            }
        )+
    };
}

use actix_web::error::BlockingError;
use anyhow::Context;
use chrono::{DateTime, NaiveDateTime};

use crate::engine::EngineError;

no_arg_sql_function!(
    last_insert_id,
    diesel::sql_types::Unsigned<diesel::sql_types::Bigint>
);

/// Unwraps a `web::block` result whose closure ran an engine operation,
/// keeping the engine's own error message intact.
pub fn flatten_engine<T>(res: Result<T, BlockingError<EngineError>>) -> anyhow::Result<T> {
    match res {
        Ok(value) => Ok(value),
        Err(BlockingError::Error(err)) => Err(err.into()),
        Err(BlockingError::Canceled) => Err(anyhow::anyhow!("blocking task canceled")),
    }
}

pub fn parse_time_str<S: AsRef<str>>(s: S) -> anyhow::Result<NaiveDateTime> {
    const TIME_FMT: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";
    const TIME_FMT_SPECIAL: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

    let s = s.as_ref();
    if let Some('Z') = s.chars().last() {
        NaiveDateTime::parse_from_str(s, TIME_FMT_SPECIAL).context("Wrong time format")
    } else {
        DateTime::parse_from_str(s, TIME_FMT)
            .context("Wrong time format")
            .map(|t| t.naive_utc())
    }
}

pub fn parse_time_pair_str_opt<S1: AsRef<str>, S2: AsRef<str>>(
    start_time: Option<S1>,
    end_time: Option<S2>,
) -> anyhow::Result<(NaiveDateTime, NaiveDateTime)> {
    let time_min = parse_time_str("1901-01-01T00:00:00.0000Z")?;
    let time_max = parse_time_str("2901-01-01T00:00:00.0000Z")?;
    let start_time = start_time.map_or(Ok(time_min), |t| {
        parse_time_str(t).context("Wrong format on 'start_time'")
    })?;
    let end_time = end_time.map_or(Ok(time_max), |t| {
        parse_time_str(t).context("Wrong format on 'end_time'")
    })?;
    Ok((start_time, end_time))
}

pub fn format_time_str(time: &NaiveDateTime) -> String {
    const TIME_FMT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    format!("{}+00:00", time.format(TIME_FMT))
}

pub fn get_str_pattern<S: AsRef<str>>(s: S) -> String {
    format!("%{}%", s.as_ref())
}

pub fn get_str_pattern_opt<S: AsRef<str>>(s: Option<S>) -> String {
    match s {
        Some(s) => get_str_pattern(s),
        None => "%".to_string(),
    }
}
