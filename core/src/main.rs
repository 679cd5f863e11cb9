mod cors;

use std::sync::Arc;

use actix_web::{
    App, HttpResponse, HttpServer, Responder, get,
    web::{self},
};
use api_lessons::LessonServices;
use common::env_config::Config;

/// Saved lessons carry their pictures inline as data URLs.
const JSON_BODY_LIMIT: usize = 16 * 1024 * 1024;

#[get("/health")]
async fn get_health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let config_data = config.clone();
    let origin = config.cors_allowed_origin.clone();

    // init logger
    logger::setup(&config.log_file).expect("Failed to set up logger");

    // init db connection
    let pool = db::setup(&config.database_url, config.is_production())
        .await
        .expect("Failed to set up database");

    // provider clients, shared by all workers
    let lesson_services = Arc::new(LessonServices::from_config(&config));

    log::info!(
        "Starting PlanWise on {}:{} with {} workers",
        config.server_host,
        config.server_port,
        config.num_workers
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config_data.clone()))
            .app_data(web::Data::new(lesson_services.clone()))
            .app_data(web::JsonConfig::default().limit(JSON_BODY_LIMIT))
            .wrap(limiter::global_middleware(config_data.rate_limit_per_second)) // 4th
            .wrap(logger::middleware(config_data.console_logging_enabled)) // 3rd
            .wrap(extractor::middleware(&config_data)) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(
                web::scope("/api").service(get_health).service(
                    web::scope("")
                        .wrap(api_auth::auth_middleware())
                        .service(api_auth::mount_users())
                        .service(api_students::mount_students())
                        .service(api_lessons::mount_lessons()),
                ),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
