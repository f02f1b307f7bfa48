use std::time::Duration;

use clap::Args;
use educe::Educe;
use url::Url;

use crate::generation::DEFAULT_MAX_TOKENS;
use crate::generation::DEFAULT_MODEL;
use crate::generation::DEFAULT_TEMPERATURE;
use crate::generation::GenerationSettings;
use crate::views::CompletionConfig as ServerCompletionConfig;

#[derive(Args, Educe, Clone)]
#[educe(Debug)]
pub struct CompletionConfig {
    /// Full URL of the chat completion endpoint
    #[arg(long, env = "COMPLETION_API_URL", default_value_t = Url::parse("https://api.openai.com/v1/chat/completions").unwrap())]
    pub completion_api_url: Url,
    #[educe(Debug(ignore))]
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub completion_api_key: String,
    #[arg(long, env = "COMPLETION_MODEL", default_value = DEFAULT_MODEL)]
    pub completion_model: String,
    #[arg(long, env = "COMPLETION_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    pub completion_max_tokens: u32,
    #[arg(long, env = "COMPLETION_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    pub completion_temperature: f64,
    /// Timeout of a single completion request, in seconds
    #[arg(long, env = "COMPLETION_TIMEOUT_SECONDS", default_value_t = 60)]
    pub completion_timeout_seconds: u64,
}

impl From<CompletionConfig> for ServerCompletionConfig {
    fn from(
        CompletionConfig {
            completion_api_url,
            completion_api_key,
            completion_model,
            completion_max_tokens,
            completion_temperature,
            completion_timeout_seconds,
        }: CompletionConfig,
    ) -> Self {
        Self {
            options: completion_client::Options {
                endpoint: completion_api_url,
                api_key: completion_api_key,
                timeout: Duration::from_secs(completion_timeout_seconds),
            },
            settings: GenerationSettings {
                model: completion_model,
                max_tokens: completion_max_tokens,
                temperature: completion_temperature,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        completion: CompletionConfig,
    }

    #[test]
    fn defaults_match_the_generation_settings() {
        let cli = TestCli::parse_from(["noteblog", "--completion-api-key", "secret"]);

        let config = ServerCompletionConfig::from(cli.completion);

        assert_eq!(config.settings, GenerationSettings::default());
        assert_eq!(
            config.options.endpoint.as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(config.options.api_key, "secret");
        assert_eq!(config.options.timeout, Duration::from_secs(60));
    }

    #[test]
    fn the_api_key_is_not_logged() {
        let cli = TestCli::parse_from(["noteblog", "--completion-api-key", "secret"]);

        assert!(!format!("{:?}", cli.completion).contains("secret"));
    }
}
