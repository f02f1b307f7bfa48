use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use http::StatusCode;
use serde::Serialize;

use super::ChatCompletionRequest;
use super::CompletionClient;

/// A mocking completion client replaying a queue of stub requests
///
/// Clones share their stubs and their record of received requests.
///
/// See [MockingClient::stub]
#[derive(Debug, Default, Clone)]
pub struct MockingClient {
    stubs: Arc<Mutex<VecDeque<StubRequest>>>,
    received: Arc<Mutex<Vec<ChatCompletionRequest>>>,
}

impl From<MockingClient> for CompletionClient {
    fn from(value: MockingClient) -> Self {
        Self::Mocked(value)
    }
}

#[derive(Debug)]
pub struct MockingError {
    pub status: StatusCode,
    pub bytes: Vec<u8>,
}

impl MockingClient {
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a stub request
    #[must_use = "call .finish() to register the stub request"]
    pub fn stub(&mut self) -> StubRequestBuilder<'_> {
        StubRequestBuilder {
            body: None,
            client: self,
        }
    }

    /// The requests handled so far, oldest first
    pub fn received_requests(&self) -> Vec<ChatCompletionRequest> {
        self.received.lock().unwrap().clone()
    }

    pub(super) fn fetch_mocked(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<Option<Vec<u8>>, MockingError> {
        self.received.lock().unwrap().push(request.clone());
        let Some(stub) = self.stubs.lock().unwrap().pop_front() else {
            panic!("could not find stub for completion request {request:?}");
        };

        if let Some(expected) = stub.body {
            let actual = serde_json::to_string(request).expect("could not serialize request body");
            assert_eq!(actual, expected.as_str(), "request body mismatch");
        }
        match stub.response {
            None => Ok(None),
            Some(StubResponse { code, body }) if code.is_success() => {
                Ok(body.map(|b| b.as_bytes().to_vec()))
            }
            Some(StubResponse { code, body }) => Err(MockingError {
                status: code,
                bytes: body.map(|b| b.as_bytes().to_vec()).unwrap_or_default(),
            }),
        }
    }
}

/// A stub request used to assert the validity of an incoming request to mock
#[derive(Debug, Clone)]
pub struct StubRequest {
    body: Option<Arc<String>>,
    response: Option<StubResponse>,
}

/// A stub response that mocks a response status code and body
#[derive(Debug, Clone)]
pub struct StubResponse {
    code: StatusCode,
    body: Option<Arc<String>>,
}

#[derive(Debug)]
pub struct StubRequestBuilder<'a> {
    body: Option<Arc<String>>,
    client: &'a mut MockingClient,
}

#[derive(Debug)]
pub struct StubResponseBuilder<'a> {
    code: StatusCode,
    body: Option<Arc<String>>,
    request_builder: StubRequestBuilder<'a>,
}

impl<'a> StubRequestBuilder<'a> {
    /// Sets the expected body of the outgoing request
    ///
    /// If no expected body is set, the request actual body is ignored
    #[must_use = "call .finish() to register the stub request"]
    pub fn body<B: AsRef<str>>(mut self, body: B) -> Self {
        self.body = Some(Arc::new(body.as_ref().to_string()));
        self
    }

    /// Sets the expected outgoing request
    #[must_use = "call .finish() to register the stub request"]
    pub fn request(self, request: &ChatCompletionRequest) -> Self {
        let body = serde_json::to_string(request).expect("Failed to serialize JSON");
        self.body(body)
    }

    /// Sets the mocked response associated to this stubbed request
    #[must_use = "call .finish() to register the stub request"]
    pub fn response(self, code: StatusCode) -> StubResponseBuilder<'a> {
        StubResponseBuilder {
            code,
            body: None,
            request_builder: self,
        }
    }

    /// Registers a stub without response into the [MockingClient]
    pub fn finish(self) {
        self.register(None)
    }

    fn register(self, response: Option<StubResponse>) {
        self.client
            .stubs
            .lock()
            .unwrap()
            .push_back(StubRequest {
                body: self.body,
                response,
            })
    }
}

impl StubResponseBuilder<'_> {
    /// Sets the body of the mocked response
    ///
    /// If none is set, [CompletionClient::complete] returns `Err(Error::NoResponseContent)`
    /// for a successful status code.
    #[must_use = "call .finish() to register the stub request"]
    pub fn body<B: AsRef<str>>(mut self, body: B) -> Self {
        self.body = Some(Arc::new(body.as_ref().to_string()));
        self
    }

    #[must_use = "call .finish() to register the stub request"]
    pub fn json<T: Serialize>(self, body: T) -> Self {
        let json_body = serde_json::to_string(&body).expect("Failed to serialize JSON");
        self.body(json_body)
    }

    /// Builds the [StubResponse] and registers it into the [MockingClient]
    pub fn finish(self) {
        let response = StubResponse {
            code: self.code,
            body: self.body,
        };
        self.request_builder.register(Some(response))
    }
}
