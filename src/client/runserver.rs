use std::time::Duration;

use clap::Args;

use crate::views;

use super::PostgresConfig;
use super::completion_config::CompletionConfig;

#[derive(Args, Debug)]
#[command(about, long_about = "Launch the server")]
pub struct RunserverArgs {
    #[arg(long, env = "NOTEBLOG_PORT", default_value_t = 8090)]
    port: u16,
    #[arg(long, env = "NOTEBLOG_ADDRESS", default_value_t = String::from("0.0.0.0"))]
    address: String,
    #[command(flatten)]
    completion: CompletionConfig,
    /// Origin allowed by CORS, any origin if not set
    #[clap(long, env = "NOTEBLOG_ALLOWED_ORIGIN")]
    allowed_origin: Option<String>,
    /// Maximum size of a request body, in bytes
    #[clap(long, env = "NOTEBLOG_BODY_LIMIT", default_value_t = 1024 * 1024)]
    body_limit: usize,
    /// The timeout to use when performing the healthcheck, in milliseconds
    #[clap(long, env = "NOTEBLOG_HEALTH_CHECK_TIMEOUT_MS", default_value_t = 500)]
    health_check_timeout_ms: u64,
}

/// Create and run the server
pub async fn runserver(
    RunserverArgs {
        port,
        address,
        completion,
        allowed_origin,
        body_limit,
        health_check_timeout_ms,
    }: RunserverArgs,
    postgres: PostgresConfig,
    app_version: Option<String>,
) -> anyhow::Result<()> {
    let config = views::ServerConfig {
        port,
        address,
        health_check_timeout: Duration::from_millis(health_check_timeout_ms),
        allowed_origin,
        body_limit,
        postgres_config: postgres.into(),
        app_version,
    };

    let server = views::Server::new(config, completion.into()).await?;
    Ok(server.start().await?)
}
