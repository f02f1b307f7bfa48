mod client;
mod error;
mod generation;
mod views;

use std::process::exit;
use std::sync::Arc;

use clap::Parser;
use client::Client;
use client::Color;
use client::Commands;
use client::healthcheck::healthcheck_cmd;
use client::print_openapi;
use client::runserver::runserver;
use colored::Colorize as _;
use common::tracing::NoopSpanExporter;
use common::tracing::SpanUploading;
use common::tracing::Stream;
use common::tracing::TracingConfig;
use common::tracing::create_tracing_subscriber;
use database::DbConnectionPoolV2;
use opentelemetry_otlp::WithExportConfig as _;
use tracing::error;
use tracing::info;
use tracing_subscriber::util::SubscriberInitExt as _;

use crate::client::TelemetryConfig;

fn init_tracing(telemetry_config: &TelemetryConfig) -> anyhow::Result<()> {
    let tracing_config = TracingConfig {
        stream: Stream::Stderr,
        telemetry: telemetry_config.telemetry(),
        directives: vec![],
        span_uploading: SpanUploading::BackgroundBatched,
    };
    let level = tracing_subscriber::filter::LevelFilter::INFO;
    match &tracing_config.telemetry {
        Some(telemetry) => {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(telemetry.endpoint.as_str())
                .build()?;
            create_tracing_subscriber(tracing_config, level, exporter).try_init()?;
        }
        None => {
            create_tracing_subscriber(tracing_config, level, NoopSpanExporter).try_init()?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(_) => (),
        Err(e) => {
            error!("{e}");
            eprintln!("{} {e:#}", "Error:".red().bold());
            exit(2);
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let client = Client::parse();
    init_tracing(&client.telemetry_config)?;

    match client.color {
        Color::Never => colored::control::set_override(false),
        Color::Always => colored::control::set_override(true),
        Color::Auto => colored::control::unset_override(),
    }

    match client.command {
        Commands::Runserver(args) => {
            runserver(*args, client.postgres_config, client.app_version).await
        }
        Commands::Migrate => {
            let applied =
                database::migrations::run_pending_migrations(client.postgres_config.database_url)
                    .await?;
            if applied.is_empty() {
                info!("The database is up to date");
            }
            for migration in applied {
                info!(migration, "Migration applied");
            }
            Ok(())
        }
        Commands::Openapi => print_openapi(),
        Commands::Healthcheck => {
            let db_pool = DbConnectionPoolV2::try_initialize(
                client.postgres_config.database_url,
                client.postgres_config.database_pool_size,
            )
            .await?;
            healthcheck_cmd(Arc::new(db_pool)).await
        }
    }
}
