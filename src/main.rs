use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod agent;
mod ai;
mod config;
mod controllers;
mod db;
mod middleware;
mod models;
mod swap;
mod tools;

use agent::AgentEngine;
use ai::AiClient;
use config::Config;
use db::Database;
use middleware::AuthClient;
use swap::FusionSwapService;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub engine: Arc<AgentEngine>,
    pub ai_client: Arc<AiClient>,
    pub auth: Arc<AuthClient>,
    pub swap: Arc<FusionSwapService>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Arc::new(Database::new(&config.database_url).expect("Failed to initialize database"));

    log::info!("Initializing tool registry");
    let registry = Arc::new(tools::create_default_registry());
    log::info!("Registered {} tools", registry.len());

    let engine = Arc::new(AgentEngine::new(db.clone(), registry));

    let ai_client =
        Arc::new(AiClient::from_config(&config).expect("Failed to create AI client"));

    let auth = Arc::new(
        AuthClient::new(
            &config.identity_api_url,
            &config.identity_app_id,
            &config.identity_app_secret,
        )
        .expect("Failed to create auth client"),
    );

    let swap_service = Arc::new(
        FusionSwapService::new(&config.oneinch_api_key).expect("Failed to create swap service"),
    );

    log::info!("Starting DeFi Pilot backend on port {}", port);

    let frontend_url = config.frontend_url.clone();
    let app_config = config.clone();

    HttpServer::new(move || {
        let cors = match &frontend_url {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
                .max_age(3600),
            None => Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600),
        };

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                config: app_config.clone(),
                engine: Arc::clone(&engine),
                ai_client: Arc::clone(&ai_client),
                auth: Arc::clone(&auth),
                swap: Arc::clone(&swap_service),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::ai::config)
            .configure(controllers::users::config)
            .configure(controllers::chats::config)
            .configure(controllers::messages::config)
            .configure(controllers::delegations::config)
            .configure(controllers::swaps::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
