#![warn(clippy::dbg_macro)]

use std::time::Duration;

use actix_web::{App, HttpServer, middleware, web};
use heritage_catalog::error::{IoErrorContext, Result};
use heritage_catalog::{build_cache, build_service, config, prometheus, routes};
use tracing_subscriber::EnvFilter;

async fn inner_main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::load()?;
    let metrics = prometheus::initialize_metrics()?;

    let cache = metrics.instrument_cache(build_cache(&config)?);
    let service = web::Data::new(build_service(&config, cache)?);
    let metrics_data = web::Data::new(metrics);
    let enable_compression = config.enable_compression;

    tracing::info!(
        "listening on {} (catalog {})",
        config.bind,
        config.database_path.display()
    );
    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Condition::new(
                enable_compression,
                middleware::Compress::default(),
            ))
            .wrap(middleware::from_fn(prometheus::track_requests))
            .app_data(service.clone())
            .app_data(metrics_data.clone())
            .configure(routes::configure)
            .route("/metrics", web::get().to(prometheus::metrics_handler))
    })
    .client_request_timeout(Duration::from_secs(30))
    .workers(config.workers)
    .max_connection_rate(config.max_connection_rate)
    .bind(config.bind.clone())
    .io_context("Failed to bind server")?;

    server.run().await.io_context("Failed to start server")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    inner_main().await.map_err(std::io::Error::other)
}
