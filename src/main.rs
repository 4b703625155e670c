#[macro_use]
extern crate diesel;

mod admin;
mod client;
mod database;
mod engine;
mod models;
mod notification;
mod protocol;
mod schema;
mod utils;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use diesel::{r2d2::ConnectionManager, MysqlConnection};
use tracing_subscriber::EnvFilter;

use crate::notification::Dispatcher;

pub type DbPool = r2d2::Pool<ConnectionManager<MysqlConnection>>;

/// Shared per-request context. Both the pool and the dispatcher are
/// injected here once; no module reaches for process-wide handles.
#[derive(Clone)]
pub struct AppContext {
    pub pool: DbPool,
    pub notifier: Arc<Dispatcher>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let conn_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not found");
    let manager = ConnectionManager::<MysqlConnection>::new(conn_url);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .expect("Failed to create pool");

    // A push transport would register an EventPublisher here; none ships
    // with the server itself.
    let notifier = Arc::new(Dispatcher::new(pool.clone(), None));
    let ctx = AppContext { pool, notifier };

    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    tracing::info!(%bind, "starting booking server");

    HttpServer::new(move || {
        App::new()
            .data(ctx.clone())
            // clients: accounts, catalog search, booking
            .service(web::scope("/client").configure(client::config))
            // operators: catalog, resource registry, appointment lifecycle
            .service(web::scope("/admin").configure(admin::config))
    })
    .bind(bind)?
    .run()
    .await
}
