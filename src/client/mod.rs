mod completion_config;
pub mod healthcheck;
mod postgres_config;
pub mod runserver;
mod telemetry_config;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
pub use postgres_config::PostgresConfig;
use runserver::RunserverArgs;
pub use telemetry_config::TelemetryConfig;

use crate::views::OpenApiRoot;

#[derive(Parser, Debug)]
#[command(author, version)]
pub struct Client {
    #[command(flatten)]
    pub postgres_config: PostgresConfig,
    #[command(flatten)]
    pub telemetry_config: TelemetryConfig,
    #[arg(long, env, value_enum, default_value_t = Color::Auto)]
    pub color: Color,
    /// Noteblog version, reported by the `/version` endpoint
    #[clap(long, env = "NOTEBLOG_GIT_DESCRIBE")]
    pub app_version: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Debug, Default, Clone)]
pub enum Color {
    Never,
    Always,
    #[default]
    Auto,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Runserver(Box<RunserverArgs>), // suppresses clippy lint about variant size
    #[command(about, long_about = "Applies the pending database migrations")]
    Migrate,
    #[command(about, long_about = "Prints the OpenApi of the service")]
    Openapi,
    #[command(about, long_about = "Healthcheck")]
    Healthcheck,
}

/// Prints the OpenApi to stdout
pub fn print_openapi() -> anyhow::Result<()> {
    let openapi = OpenApiRoot::build_openapi();
    print!("{}", serde_yaml::to_string(&openapi)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Client::command().debug_assert();
    }

    #[test]
    fn openapi_needs_no_completion_credentials() {
        let client = Client::try_parse_from(["noteblog", "openapi"]).expect("should parse");
        assert!(matches!(client.command, Commands::Openapi));
        assert_eq!(client.postgres_config.database_pool_size, 32);
    }

    #[test]
    fn runserver_reads_its_arguments() {
        let client = Client::try_parse_from([
            "noteblog",
            "--database-url",
            "postgresql://user:pass@db/notes",
            "runserver",
            "--port",
            "9000",
            "--completion-api-key",
            "secret",
        ])
        .expect("should parse");

        assert_eq!(
            client.postgres_config.database_url.as_str(),
            "postgresql://user:pass@db/notes"
        );
        assert!(matches!(client.command, Commands::Runserver(_)));
    }
}
