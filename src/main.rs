use std::sync::Arc;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use battle_server::{
    battle::BattleCoordinator,
    cache,
    env::{Settings, StoreBackend},
    http::{create_player, get_battle_results, start_battle},
    metrics,
    secrets::EnvSecretProvider,
    store::{memory::MemoryGameStore, postgres::PostgresGameStore, GameStore},
    AppState, LoggerManager,
};
use prometheus::{Encoder, TextEncoder};
use tracing::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let settings = Settings::new().expect("Failed to load settings");

    let logger_manager = Arc::new(LoggerManager::setup(&settings));
    info!("Logger initialized");

    let secret_provider = EnvSecretProvider;
    let lock_cache = cache::connect_lock_cache(&settings.lock_cache, &secret_provider).await;

    let store: Arc<dyn GameStore> = match settings.store.backend {
        StoreBackend::Postgres => {
            let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
            let store = PostgresGameStore::connect(&database_url)
                .await
                .expect("Failed to connect to the game store");
            info!("Game store connected (postgres)");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            info!("Game store running in-memory; data will not survive a restart");
            Arc::new(MemoryGameStore::new())
        }
    };

    let metrics_registry = prometheus::Registry::new();
    metrics::register_custom_metrics(&metrics_registry)
        .expect("Failed to register custom metrics");
    info!("Metrics initialized and registered");

    let coordinator = Arc::new(BattleCoordinator::new(
        store.clone(),
        lock_cache,
        &settings.lock_cache,
        &settings.battle,
    ));

    let app_state = AppState {
        settings: settings.clone(),
        coordinator,
        store,
        logger_manager,
        metrics_registry: metrics_registry.clone(),
    };

    let bind_address = format!("{}:{}", settings.server.bind_address, settings.server.port);
    info!("Starting HTTP server on {}", bind_address);

    let server = HttpServer::new(move || {
        // /metrics endpoint (optional auth)
        let metrics_route = |req: HttpRequest, state: web::Data<AppState>| async move {
            if let Some(expected_token) = &state.settings.server.metrics_auth_token {
                let provided_token = req
                    .headers()
                    .get("Authorization")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.strip_prefix("Bearer "));

                if provided_token != Some(expected_token.as_str()) {
                    return HttpResponse::Unauthorized()
                        .body("Unauthorized: Invalid or missing token");
                }
            }

            let metric_families = state.metrics_registry.gather();
            let mut buffer = Vec::new();
            let encoder = TextEncoder::new();

            if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
                return HttpResponse::InternalServerError()
                    .body(format!("Metrics encode error: {}", e));
            }

            HttpResponse::Ok()
                .content_type(encoder.format_type())
                .body(buffer)
        };

        // Healthcheck endpoints
        let health_route = || async { HttpResponse::Ok().body("OK") };
        let ready_route = || async { HttpResponse::Ok().body("READY") };

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .service(start_battle)
            .service(get_battle_results)
            .service(create_player)
            .route("/metrics", web::get().to(metrics_route))
            .route("/health", web::get().to(health_route))
            .route("/ready", web::get().to(ready_route))
    })
    .bind(&bind_address)?
    .run();

    info!("Battle Server is running on {}", bind_address);

    server.await?;
    info!("Battle Server has shut down gracefully");

    Ok(())
}
