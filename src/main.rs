mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::{Config, StoreBackend, SwaggerConfig};
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::modules::persistence::{InMemoryRepository, PgRepository, Repository};
use axum::{http::StatusCode, middleware::from_fn, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const OPENAPI_JSON: &str = "/api-docs/openapi.json";

fn main() -> anyhow::Result<()> {
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?
        .block_on(serve(worker_threads))
}

async fn serve(worker_threads: usize) -> anyhow::Result<()> {
    // RUST_LOG may come from .env
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(
        "Starting improv agenda: tokio_worker_threads={}, store={:?}, pid={}",
        worker_threads,
        config.store.backend,
        std::process::id()
    );

    let repository = build_repository(&config).await?;
    let app = build_app(&config, repository);

    let addr = config.app.server_address();
    let listener = bind_listener(&addr)?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn build_repository(config: &Config) -> anyhow::Result<Arc<dyn Repository>> {
    match config.store.backend {
        StoreBackend::Postgres => {
            let db_config = config
                .store
                .database
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres store"))?;
            let pool = database::connect_and_migrate(db_config).await?;
            tracing::info!("Using postgres repository");
            Ok(Arc::new(PgRepository::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory repository; data is lost on restart");
            Ok(Arc::new(InMemoryRepository::new()))
        }
    }
}

fn swagger_routes(swagger: &SwaggerConfig) -> Router {
    let mut openapi = ApiDoc::openapi();
    SwaggerInfoModifier {
        title: swagger.title.clone(),
        version: swagger.version.clone(),
        description: swagger.description.clone(),
    }
    .modify(&mut openapi);

    let router = Router::new().merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_JSON, openapi));
    match swagger.credentials() {
        Some(credentials) => {
            tracing::info!("Swagger UI basic auth enabled");
            router.layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
        }
        None => {
            tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
            router
        }
    }
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

fn build_app(config: &Config, repository: Arc<dyn Repository>) -> Router {
    Router::new()
        .merge(swagger_routes(&config.swagger))
        .merge(features::routes(repository))
        .route("/health", get(health_check))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Client-provided X-Request-Id wins, otherwise UUID v7
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
}

fn bind_listener(addr: &str) -> anyhow::Result<TcpListener> {
    let socket_addr: SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address {}: {}", addr, e))?;

    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;
    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    let keepalive = socket2::TcpKeepalive::new().with_time(Duration::from_secs(60));
    #[cfg(target_os = "linux")]
    let keepalive = keepalive
        .with_interval(Duration::from_secs(10))
        .with_retries(3);
    socket.set_tcp_keepalive(&keepalive)?;

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    Ok(TcpListener::from_std(socket.into())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{AppConfig, StoreConfig};
    use axum_test::TestServer;

    fn memory_config() -> Config {
        Config {
            app: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_allowed_origins: vec!["*".to_string()],
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                database: None,
            },
            swagger: SwaggerConfig {
                username: None,
                password: None,
                title: "Improv Agenda API".to_string(),
                version: "0.1.0".to_string(),
                description: "Test".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_app_serves_health_and_echoes_request_id() {
        let config = memory_config();
        let repository = build_repository(&config).await.unwrap();
        let server = TestServer::new(build_app(&config, repository)).unwrap();

        let response = server
            .get("/health")
            .add_header("x-request-id", "req-123")
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("x-request-id"), "req-123");
    }

    #[tokio::test]
    async fn test_app_exposes_openapi_document() {
        let config = memory_config();
        let repository = build_repository(&config).await.unwrap();
        let server = TestServer::new(build_app(&config, repository)).unwrap();

        let response = server.get(OPENAPI_JSON).await;

        response.assert_status_ok();
        let doc: serde_json::Value = response.json();
        assert_eq!(doc["info"]["description"], "Test");
    }
}
