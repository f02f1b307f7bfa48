use std::time::Duration;

use educe::Educe;
use url::Url;

use crate::ChatCompletionRequest;
use crate::ChatCompletionResponse;
use crate::Error;

#[derive(Clone, Educe)]
#[educe(Debug)]
pub struct Options {
    /// Full URL of the chat completion endpoint
    pub endpoint: Url,
    #[educe(Debug(ignore))]
    pub api_key: String,
    pub timeout: Duration,
}

/// Calls the chat completion endpoint over HTTP(S), authenticated with a bearer token
#[derive(Clone, Educe)]
#[educe(Debug)]
pub struct HttpClient {
    #[educe(Debug(ignore))]
    inner: reqwest::Client,
    endpoint: Url,
    #[educe(Debug(ignore))]
    api_key: String,
}

impl HttpClient {
    pub fn new(
        Options {
            endpoint,
            api_key,
            timeout,
        }: Options,
    ) -> Result<Self, Error> {
        let inner = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner,
            endpoint,
            api_key,
        })
    }

    pub(crate) async fn post(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, Error> {
        let response = self
            .inner
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| Error::ResponseFormat { msg: e.to_string() })
    }
}
