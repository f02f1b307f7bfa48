use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use colored::Colorize;
use database::DatabaseError;
use database::db_connection_pool::DatabasePoolBuildError;
use database::db_connection_pool::DatabasePoolError;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::result::Result as StdResult;
use tracing::error;
use utoipa::ToSchema;

pub type Result<T, E = InternalError> = StdResult<T, E>;

/// Trait for all errors that can be returned by noteblog
pub trait NoteblogError: Error + Send + Sync {
    fn get_status(&self) -> StatusCode;

    fn get_type(&self) -> &str;

    fn context(&self) -> HashMap<String, Value> {
        Default::default()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(remote = "StatusCode")]
pub(crate) struct StatusCodeRemoteDef(#[serde(getter = "StatusCode::as_u16")] u16);

impl From<StatusCodeRemoteDef> for StatusCode {
    fn from(def: StatusCodeRemoteDef) -> Self {
        StatusCode::from_u16(def.0).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

pub(crate) fn default_status_code() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

/// The body of every error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct InternalError {
    #[serde(with = "StatusCodeRemoteDef", default = "default_status_code")]
    #[schema(value_type = u16, minimum = 100, maximum = 599)]
    pub status: StatusCode,
    #[serde(rename = "type")]
    pub error_type: String,
    pub context: HashMap<String, Value>,
    pub message: String,
}

impl Error for InternalError {}

impl Display for InternalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl<T: NoteblogError> From<T> for InternalError {
    fn from(err: T) -> Self {
        InternalError {
            status: err.get_status(),
            error_type: err.get_type().to_owned(),
            context: err.context(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for InternalError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                "[{}] {}: {}",
                self.error_type.bold(),
                self.message,
                Backtrace::capture() // won't log unless RUST_BACKTRACE=1
            );
        } else {
            tracing::info!("[{}] {}", self.error_type.bold(), self.message);
        }
        (self.status, Json(self)).into_response()
    }
}

inventory::submit! {
    crate::error::ErrorDefinition::new("noteblog:DatabaseAccessError", "DatabaseAccessError", "DatabaseAccessError", 500u16, r#"{}"#)
}
impl NoteblogError for DatabasePoolBuildError {
    fn get_status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn get_type(&self) -> &str {
        "noteblog:DatabaseAccessError"
    }
}
impl NoteblogError for DatabasePoolError {
    fn get_status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn get_type(&self) -> &str {
        "noteblog:DatabaseAccessError"
    }
}

impl NoteblogError for DatabaseError {
    fn get_status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn get_type(&self) -> &str {
        "noteblog:DatabaseAccessError"
    }
}

inventory::submit! {
    ErrorDefinition::new("noteblog:model:ModelError", "ModelError", "ModelError", 500u16, r#"{}"#)
}
inventory::submit! {
    ErrorDefinition::new("noteblog:model:CheckViolation", "CheckViolation", "ModelError", 500u16, r#"{"constraint":"String"}"#)
}
impl NoteblogError for noteblog_models::Error {
    fn get_status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn get_type(&self) -> &str {
        match self {
            noteblog_models::Error::CheckViolation { .. } => "noteblog:model:CheckViolation",
            noteblog_models::Error::DatabaseError(_) => "noteblog:model:ModelError",
        }
    }

    fn context(&self) -> HashMap<String, Value> {
        match self {
            noteblog_models::Error::CheckViolation { constraint } => {
                [("constraint".to_owned(), Value::from(constraint.as_str()))].into()
            }
            noteblog_models::Error::DatabaseError(_) => Default::default(),
        }
    }
}

inventory::submit! {
    crate::error::ErrorDefinition::new("noteblog:completion:Unreachable", "Unreachable", "CompletionError", 502u16, r#"{}"#)
}
inventory::submit! {
    crate::error::ErrorDefinition::new("noteblog:completion:UpstreamStatus", "UpstreamStatus", "CompletionError", 502u16, r#"{"status":"u16"}"#)
}
inventory::submit! {
    crate::error::ErrorDefinition::new("noteblog:completion:ResponseFormat", "ResponseFormat", "CompletionError", 502u16, r#"{"msg":"String"}"#)
}
inventory::submit! {
    crate::error::ErrorDefinition::new("noteblog:completion:EmptyChoices", "EmptyChoices", "CompletionError", 502u16, r#"{}"#)
}
inventory::submit! {
    crate::error::ErrorDefinition::new("noteblog:completion:NoResponseContent", "NoResponseContent", "CompletionError", 502u16, r#"{}"#)
}

/// Every failure of the completion service is reported as a bad gateway
///
/// The upstream response body is logged, never forwarded to the client.
impl NoteblogError for completion_client::Error {
    fn get_status(&self) -> StatusCode {
        StatusCode::BAD_GATEWAY
    }

    fn get_type(&self) -> &'static str {
        match self {
            completion_client::Error::Request(_) => "noteblog:completion:Unreachable",
            completion_client::Error::UpstreamStatus { .. } => {
                "noteblog:completion:UpstreamStatus"
            }
            completion_client::Error::ResponseFormat { .. } => {
                "noteblog:completion:ResponseFormat"
            }
            completion_client::Error::EmptyChoices => "noteblog:completion:EmptyChoices",
            completion_client::Error::NoResponseContent => {
                "noteblog:completion:NoResponseContent"
            }
        }
    }

    fn context(&self) -> HashMap<String, Value> {
        match self {
            completion_client::Error::UpstreamStatus { status, body } => {
                tracing::warn!(status, body, "completion service failure");
                [("status".to_owned(), Value::from(*status))].into()
            }
            completion_client::Error::ResponseFormat { msg } => {
                [("msg".to_owned(), Value::from(msg.as_str()))].into()
            }
            _ => Default::default(),
        }
    }
}

// error definition : used by the macro NoteblogError to generate
// the list of errors and share it with the OpenAPI generator
#[derive(Debug)]
pub struct ErrorDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub namespace: &'static str,
    pub status: u16,
    context_serialized: &'static str,
}

impl ErrorDefinition {
    pub const fn new(
        id: &'static str,
        name: &'static str,
        namespace: &'static str,
        status: u16,
        context_serialized: &'static str,
    ) -> Self {
        ErrorDefinition {
            id,
            name,
            namespace,
            status,
            context_serialized,
        }
    }

    pub fn get_context(&self) -> HashMap<String, String> {
        serde_json::from_str(self.context_serialized).expect("Error context should be a valid json")
    }

    pub fn get_schema_name(&self) -> String {
        format!("Noteblog{}{}", self.namespace, self.name)
    }
}

inventory::collect!(ErrorDefinition);

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn upstream_failures_are_bad_gateways() {
        let error = InternalError::from(completion_client::Error::UpstreamStatus {
            status: 429,
            body: "rate limited".to_owned(),
        });

        assert_eq!(error.status, StatusCode::BAD_GATEWAY);
        assert_eq!(error.error_type, "noteblog:completion:UpstreamStatus");
        assert_eq!(error.context["status"], Value::from(429));
        assert!(!error.message.contains("rate limited"));
    }

    #[test]
    fn check_violations_keep_their_constraint() {
        let error = InternalError::from(noteblog_models::Error::CheckViolation {
            constraint: "note_content_not_blank".to_owned(),
        });

        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            error.context["constraint"],
            Value::from("note_content_not_blank")
        );
    }

    #[test]
    fn internal_errors_serialize_their_status_as_a_number() {
        let error = InternalError::from(completion_client::Error::EmptyChoices);
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["status"], Value::from(502));
        assert_eq!(json["type"], Value::from("noteblog:completion:EmptyChoices"));
    }

    #[test]
    fn every_error_definition_has_a_valid_context() {
        for definition in inventory::iter::<ErrorDefinition> {
            let _ = definition.get_context();
        }
    }
}
