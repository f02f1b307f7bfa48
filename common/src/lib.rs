pub mod tracing;

use serde::Deserialize;
use serde::Serialize;
use utoipa::ToSchema;

pub fn setup_tracing_for_test() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .pretty()
        .try_init()
        .ok();
}

#[derive(Debug, Clone, PartialEq, ToSchema, Serialize, Deserialize)]
pub struct Version {
    #[schema(required)] // Options are by default not required, but this one is
    pub git_describe: Option<String>,
}

impl Version {
    /// The version baked in at build time through the `NOTEBLOG_GIT_DESCRIBE` variable
    pub fn current() -> Self {
        Self {
            git_describe: option_env!("NOTEBLOG_GIT_DESCRIBE").map(String::from),
        }
    }
}
