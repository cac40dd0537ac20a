use std::io;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use crypto_core::jwt;
use social_network::config::StorageBackend;
use social_network::middleware::JwtAuthMiddleware;
use social_network::openapi::ApiDoc;
use social_network::{configure_routes, db, jobs, Config, Repositories};
use tokio::task::JoinSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

async fn openapi_json(doc: web::Data<utoipa::openapi::OpenApi>) -> actix_web::Result<HttpResponse> {
    let body = serde_json::to_string(doc.get_ref()).map_err(|e| {
        actix_web::error::ErrorInternalServerError(format!("OpenAPI serialization failed: {e}"))
    })?;

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn build_repositories(config: &Config) -> io::Result<Repositories> {
    match config.database.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Repositories::in_memory())
        }
        StorageBackend::Postgres => {
            let url = config.database.url.as_deref().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "DATABASE_URL is not set")
            })?;

            let pool = db::init_pool(&config.database, url).await.map_err(|e| {
                io::Error::new(io::ErrorKind::Other, format!("database connection failed: {e}"))
            })?;
            tracing::info!(
                max_connections = config.database.max_connections,
                "Database pool initialized"
            );

            db::run_migrations(&pool).await.map_err(|e| {
                io::Error::new(io::ErrorKind::Other, format!("migrations failed: {e}"))
            })?;
            tracing::info!("Database migrations applied");

            Ok(Repositories::postgres(pool))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        env = %config.app.env,
        backend = ?config.database.backend,
        "Starting social-network v{}",
        env!("CARGO_PKG_VERSION")
    );

    jwt::initialize_jwt(&config.auth.jwt_secret, config.auth.access_token_ttl_secs)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("JWT setup failed: {e}")))?;

    let repos = build_repositories(&config).await?;

    let mut tasks: JoinSet<()> = JoinSet::new();
    if config.scheduler.enabled {
        tasks.spawn(jobs::start_scheduled_post_worker(
            repos.clone(),
            config.scheduler.clone(),
        ));
    } else {
        tracing::info!("Scheduled post worker disabled");
    }
    tasks.spawn(jobs::start_revoked_token_purger(repos.clone()));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let origins = config.cors_origins();
    let repos_data = web::Data::new(repos.clone());
    let openapi_doc = web::Data::new(ApiDoc::openapi());

    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in &origins {
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(repos_data.clone())
            .app_data(openapi_doc.clone())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url(ApiDoc::openapi_json_path(), openapi_doc.get_ref().clone()),
            )
            .route(ApiDoc::openapi_json_path(), web::get().to(openapi_json))
            .wrap(JwtAuthMiddleware::new(repos_data.get_ref().clone()))
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .shutdown_timeout(30)
    .run();

    // actix-server handles SIGINT/SIGTERM and drains in-flight requests
    let result = server.await;

    tracing::info!("HTTP server stopped, shutting down background jobs");
    tasks.shutdown().await;

    result
}
