mod chat;
mod http_client;

#[cfg(feature = "mocking_client")]
pub mod mocking;

pub use chat::ChatCompletionRequest;
pub use chat::ChatCompletionResponse;
pub use chat::ChatMessage;
pub use chat::Choice;
pub use chat::ResponseMessage;
pub use chat::Role;
pub use http_client::HttpClient;
pub use http_client::Options;

use thiserror::Error;
use tracing::trace;

/// Client of an OpenAI-compatible chat completion API
#[derive(Debug, Clone)]
pub enum CompletionClient {
    Http(HttpClient),
    #[cfg(feature = "mocking_client")]
    Mocked(mocking::MockingClient),
}

impl CompletionClient {
    #[tracing::instrument(skip_all, err)]
    pub fn new_http(options: Options) -> Result<Self, Error> {
        Ok(Self::Http(HttpClient::new(options)?))
    }

    /// Sends a chat completion request, once
    ///
    /// Any non-success status of the service is an [Error::UpstreamStatus].
    #[tracing::instrument(
        target = "noteblog::completion",
        name = "completion:complete",
        skip_all,
        fields(model = %request.model, messages = request.messages.len()),
        err
    )]
    pub async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, Error> {
        trace!(
            target: "noteblog::completion",
            body = serde_json::to_string_pretty(request).unwrap_or_default(),
            "Request content");
        match self {
            CompletionClient::Http(client) => client.post(request).await,
            #[cfg(feature = "mocking_client")]
            CompletionClient::Mocked(client) => match client.fetch_mocked(request) {
                Ok(Some(bytes)) => serde_json::from_slice(&bytes)
                    .map_err(|e| Error::ResponseFormat { msg: e.to_string() }),
                Ok(None) => Err(Error::NoResponseContent),
                Err(mocking::MockingError { status, bytes }) => Err(Error::UpstreamStatus {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                }),
            },
        }
    }

    /// Sends a chat completion request and returns the content of the first choice
    pub async fn complete_first(&self, request: &ChatCompletionRequest) -> Result<String, Error> {
        self.complete(request).await?.into_first_content()
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not reach the completion service: {0}")]
    Request(#[from] reqwest::Error),
    #[error("the completion service answered with status {status}")]
    UpstreamStatus { status: u16, body: String },
    #[error("the completion service response could not be parsed: {msg}")]
    ResponseFormat { msg: String },
    #[error("the completion service returned no choice")]
    EmptyChoices,
    #[error("the completion service returned no content")]
    NoResponseContent,
}
