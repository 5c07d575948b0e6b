mod cors;

use std::sync::Arc;

use actix_web::{
    App, HttpServer,
    web::{self},
};
use common::{
    env_config::{Config, StoreBackend},
    payment::PaymentProcessor,
    stripe::StripeProcessor,
    vision::{OpenAiVision, VisionOracle},
};
use db::{MemoryStore, Store};
use ledger::{Ledger, SystemClock};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let config_data = config.clone();

    // get info
    let is_production = config.environment == "production";
    let origin = config.cors_allowed_origin.clone();

    // init logger
    logger::setup(&config.log_file, config.console_logging_enabled)
        .expect("Failed to set up logger");

    // init store
    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Postgres => Arc::new(
            db::setup(&config.database_url, is_production)
                .await
                .expect("Failed to set up database"),
        ),
        StoreBackend::Memory => {
            log::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    let ledger = Ledger::new(store, Arc::new(SystemClock));

    // external services
    let processor: Arc<dyn PaymentProcessor> = Arc::new(StripeProcessor::new(
        &config.stripe_secret_key,
        &config.stripe_webhook_secret,
    ));
    let oracle: Arc<dyn VisionOracle> = Arc::new(OpenAiVision::new(config.vision.clone()));

    log::info!(
        "Starting server on {}:{} ({})",
        config.server_host,
        config.server_port,
        config.environment
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config_data.clone()))
            .app_data(web::Data::new(ledger.clone()))
            .app_data(web::Data::new(processor.clone()))
            .app_data(web::Data::new(oracle.clone()))
            .app_data(common::http::json_config())
            .app_data(common::http::path_config())
            .wrap(logger::middleware()) // 3rd
            .wrap(extractor::middleware()) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(
                web::scope("/api")
                    .service(api_appeals::mount_analysis())
                    .service(api_appeals::mount_chat())
                    .service(api_pay::mount_webhook())
                    .service(
                        web::scope("/dashboard")
                            .wrap(extractor::require_user())
                            .service(api_appeals::mount_usage())
                            .service(api_appeals::mount_profile())
                            .service(api_appeals::mount_appeals())
                            .service(api_appeals::mount_vehicles())
                            .service(api_pay::mount_pay()),
                    ),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
