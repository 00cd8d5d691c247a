#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use pulsewatch::LibsqlStore;
use tracing::info;

mod error;
mod routes;
mod settings;
mod state;

use error::AppError;
use logger::init_tracing;
use settings::Settings;
use state::AppState;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    init_tracing();

    let settings = Settings::from_env();
    let addr: SocketAddr = format!("{}:{}", settings.bind, settings.port).parse()?;

    info!("Opening database at {}", settings.database_path);
    let store = Arc::new(LibsqlStore::open(&settings.database_path, settings.pool_size).await?);

    run_server(addr, AppState::new(store)).await
}

async fn run_server(addr: SocketAddr, state: AppState) -> Result<(), AppError> {
    let data = web::Data::new(state);

    info!("Listening on {}", addr);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(routes::routes))
        .bind(addr)?
        .run()
        .await?;

    Ok(())
}
