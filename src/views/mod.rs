mod blog_posts;
mod notes;
mod openapi;
mod router;
mod validation;

#[cfg(test)]
mod test_app;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::ServiceExt;
use axum::extract::DefaultBodyLimit;
use axum::extract::FromRef;
use axum::extract::Json;
use axum::extract::State;
use axum_tracing_opentelemetry::middleware::OtelAxumLayer;
use common::Version;
use completion_client::CompletionClient;
use database::DbConnectionPoolV2;
use database::db_connection_pool::DatabasePoolError;
use database::db_connection_pool::PingError;
use database::ping_database;
use noteblog_derive::NoteblogError;
pub use openapi::OpenApiRoot;
use thiserror::Error;
use tokio::time::timeout;
use tower::Layer as _;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::normalize_path::NormalizePath;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use tracing::info;
use url::Url;

use crate::error::Result;
use crate::generation::GenerationSettings;

fn service_router() -> router::DocumentedRouter {
    use router::delete;
    use router::get;
    use router::post;
    use router::put;

    // Sub routers list their routes first and their nests second.
    // Static segments come before path parameters.

    router::DocumentedRouter::root(|path| {
        path.route("/health", get!(health))
            .route("/version", get!(version))
            .nests("/api", |path| {
                path.nests("/notes", |path| {
                    path.route("/", get!(notes::list))
                        .route("/", post!(notes::create))
                        .route("/generate-blog", get!(notes::generate_blog))
                        .nests("/{note_id}", |path| {
                            path.route("/", get!(notes::get))
                                .route("/", put!(notes::update))
                                .route("/", delete!(notes::delete))
                        })
                })
                .nests("/blogposts", |path| {
                    path.route("/", get!(blog_posts::list))
                        .route("/", post!(blog_posts::create))
                        .route("/generate", post!(blog_posts::generate))
                        .nests("/{blog_post_id}", |path| {
                            path.route("/", get!(blog_posts::get))
                                .route("/", put!(blog_posts::update))
                                .route("/", delete!(blog_posts::delete))
                        })
                })
            })
    })
}

#[derive(Debug, Error, NoteblogError)]
#[noteblog_error(base_id = "app_health")]
pub enum AppHealthError {
    #[error("Timeout error")]
    Timeout,
    #[error(transparent)]
    Database(#[from] PingError),
    #[error(transparent)]
    DatabasePool(#[from] DatabasePoolError),
}

#[noteblog_derive::route]
#[utoipa::path(
    get, path = "",
    responses(
        (status = 200, description = "Check if Noteblog is running correctly", body = String)
    )
)]
async fn health(
    State(AppState {
        db_pool,
        health_check_timeout,
        ..
    }): State<AppState>,
) -> Result<&'static str> {
    timeout(health_check_timeout, check_health(db_pool))
        .await
        .map_err(|_| AppHealthError::Timeout)??;
    Ok("ok")
}

/// Checks that a database connection can be acquired and answers
///
/// The completion service is not checked, it is only reachable with credentials.
pub async fn check_health(db_pool: Arc<DbConnectionPoolV2>) -> Result<(), AppHealthError> {
    let mut db_connection = db_pool.get().await?;
    ping_database(&mut db_connection).await?;
    Ok(())
}

#[noteblog_derive::route]
#[utoipa::path(
    get, path = "",
    responses(
        (status = 200, description = "Return the service version", body = Version),
    ),
)]
async fn version(State(AppState { config, .. }): State<AppState>) -> Json<Version> {
    Json(Version {
        git_describe: config.app_version.clone(),
    })
}

#[derive(Clone)]
pub struct PostgresConfig {
    pub database_url: Url,
    pub pool_size: usize,
}

/// Completion client options and generation settings
///
/// Consumed when the [AppState] is built, so the API key is not kept in the [ServerConfig].
pub struct CompletionConfig {
    pub options: completion_client::Options,
    pub settings: GenerationSettings,
}

pub struct ServerConfig {
    pub port: u16,
    pub address: String,
    pub health_check_timeout: Duration,
    pub allowed_origin: Option<String>,
    /// Maximum size of a request body, in bytes
    pub body_limit: usize,
    pub postgres_config: PostgresConfig,
    pub app_version: Option<String>,
}

pub struct Server {
    app_state: AppState,
    router: NormalizePath<Router>,
}

/// The state of the whole Noteblog service, available to all handlers
///
/// If only the database is needed, use `State<Arc<DbConnectionPoolV2>>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub db_pool: Arc<DbConnectionPoolV2>,
    pub completion_client: Arc<CompletionClient>,
    pub generation_settings: Arc<GenerationSettings>,
    pub health_check_timeout: Duration,
}

impl FromRef<AppState> for Arc<DbConnectionPoolV2> {
    fn from_ref(input: &AppState) -> Self {
        input.db_pool.clone()
    }
}

impl FromRef<AppState> for Arc<CompletionClient> {
    fn from_ref(input: &AppState) -> Self {
        input.completion_client.clone()
    }
}

impl AppState {
    #[tracing::instrument(skip_all, level = "info", err, name = "AppState initialization")]
    async fn init(
        config: ServerConfig,
        CompletionConfig { options, settings }: CompletionConfig,
    ) -> anyhow::Result<Self> {
        #[tracing::instrument(skip_all, level = "info", err, name = "PostgreSQL connection")]
        async fn connect_db(
            PostgresConfig {
                database_url,
                pool_size,
            }: PostgresConfig,
        ) -> anyhow::Result<Arc<DbConnectionPoolV2>> {
            let pool = DbConnectionPoolV2::try_initialize(database_url, pool_size).await?;
            Ok(Arc::new(pool))
        }
        let db_pool_fut =
            tokio::spawn(connect_db(config.postgres_config.clone()).in_current_span());

        info!(endpoint = %options.endpoint, model = %settings.model, "using the completion service");
        let completion_client = Arc::new(CompletionClient::new_http(options)?);
        let generation_settings = Arc::new(settings);

        let db_pool = db_pool_fut.await??;

        Ok(Self {
            db_pool,
            completion_client,
            generation_settings,
            health_check_timeout: config.health_check_timeout,
            config: Arc::new(config),
        })
    }
}

impl Server {
    #[tracing::instrument(skip_all, err, level = "info", name = "server initialization")]
    pub async fn new(config: ServerConfig, completion: CompletionConfig) -> anyhow::Result<Self> {
        info!("Building server...");
        let app_state_fut = tokio::spawn(AppState::init(config, completion).in_current_span());
        let router =
            tracing::debug_span!("router initialization").in_scope(|| service_router().router);
        let app_state = app_state_fut.await??;

        let request_payload_limit = RequestBodyLimitLayer::new(app_state.config.body_limit);

        let cors = match &app_state.config.allowed_origin {
            Some(origin) => CorsLayer::new()
                .allow_methods(Any)
                .allow_headers(Any)
                .allow_origin(origin.parse::<axum::http::header::HeaderValue>()?),
            None => CorsLayer::new()
                .allow_methods(Any)
                .allow_headers(Any)
                .allow_origin(Any),
        };

        let router: Router<()> = axum::Router::<AppState>::new()
            .merge(router)
            .layer(OtelAxumLayer::default())
            .layer(DefaultBodyLimit::disable())
            .layer(request_payload_limit)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(app_state.clone());
        let normalizing_router = NormalizePathLayer::trim_trailing_slash().layer(router);

        Ok(Self {
            app_state,
            router: normalizing_router,
        })
    }

    pub async fn start(self) -> std::io::Result<()> {
        let Self { app_state, router } = self;
        let ServerConfig { address, port, .. } = app_state.config.as_ref();

        info!(address, port, "Running server...");
        let service = ServiceExt::<axum::extract::Request>::into_make_service(router);
        let listener = tokio::net::TcpListener::bind((address.as_str(), *port)).await?;
        axum::serve(listener, service).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;

    use super::test_app::TestAppBuilder;
    use super::*;
    use crate::error::InternalError;

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn health() {
        let app = TestAppBuilder::default_app();
        let request = app.get("/health");
        app.fetch(request).await.assert_status(StatusCode::OK);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn health_without_database() {
        let app = TestAppBuilder::new()
            .db_pool(DbConnectionPoolV2::for_tests_without_database())
            .build();
        let request = app.get("/health");
        let error: InternalError = app
            .fetch(request)
            .await
            .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
            .json_into();
        assert!(error.error_type.starts_with("noteblog:"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn version() {
        let app = TestAppBuilder::new()
            .db_pool(DbConnectionPoolV2::for_tests_without_database())
            .build();
        let request = app.get("/version");
        let response: HashMap<String, Option<String>> = app
            .fetch(request)
            .await
            .assert_status(StatusCode::OK)
            .json_into();
        assert!(response.contains_key("git_describe"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn unknown_routes_are_not_found() {
        let app = TestAppBuilder::new()
            .db_pool(DbConnectionPoolV2::for_tests_without_database())
            .build();
        let request = app.get("/api/unknown");
        let response = app.fetch(request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
