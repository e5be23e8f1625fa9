use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info, warn};
use std::io;
use std::sync::Arc;

use employee_directory::config::{AppConfig, StoreBackend};
use employee_directory::db;
use employee_directory::handlers;
use employee_directory::services::employee::EmployeeService;
use employee_directory::store::memory::InMemoryEmployeeStore;
use employee_directory::store::postgres::PgEmployeeStore;
use employee_directory::store::EmployeeStore;

fn startup_error<E>(context: &str, err: E) -> io::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, err)
}

async fn build_store(config: &AppConfig) -> io::Result<Arc<dyn EmployeeStore>> {
    match config.store {
        StoreBackend::Postgres => {
            let database_url = config.database_url.as_deref().unwrap_or_default();
            let pool = db::create_pool(database_url)
                .await
                .map_err(|err| startup_error("Failed to connect to the database", err))?;

            if config.run_migrations {
                db::run_migrations(&pool)
                    .await
                    .map_err(|err| startup_error("Failed to run migrations", err))?;
            }
            Ok(Arc::new(PgEmployeeStore::new(pool)))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory employee store; records are lost on shutdown");
            Ok(Arc::new(InMemoryEmployeeStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(|err| startup_error("Invalid configuration", err))?;
    let store = build_store(&config).await?;
    let service = web::Data::new(EmployeeService::new(store));

    let (host, port) = config.bind_address();
    info!("Starting server at {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(service.clone())
            .configure(handlers::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
