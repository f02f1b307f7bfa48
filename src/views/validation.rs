//! Validation of the request forms
//!
//! Every form implements [Validate], which turns the raw deserialized form into the values
//! handlers work with, or lists each offending field.

use itertools::Itertools as _;
use noteblog_derive::NoteblogError;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// A field of a request form which failed validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    /// The name of the field, as sent by the client
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_owned(),
            message: message.to_owned(),
        }
    }
}

#[derive(Debug, Error, NoteblogError)]
#[noteblog_error(base_id = "validation", default_status = 400)]
pub enum ValidationError {
    #[error("Invalid request: {}", describe(.errors))]
    InvalidFields { errors: Vec<FieldError> },
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|FieldError { field, message }| format!("'{field}' {message}"))
        .join(", ")
}

impl ValidationError {
    pub fn from_fields(errors: impl IntoIterator<Item = FieldError>) -> Self {
        Self::InvalidFields {
            errors: errors.into_iter().collect(),
        }
    }
}

impl From<FieldError> for ValidationError {
    fn from(error: FieldError) -> Self {
        Self::from_fields([error])
    }
}

pub trait Validate {
    type Valid;

    fn validate(self) -> Result<Self::Valid, ValidationError>;
}

pub fn required<T>(field: &str, value: Option<T>) -> Result<T, FieldError> {
    value.ok_or_else(|| FieldError::new(field, "is required"))
}

/// A text which must be present and contain at least one non-whitespace character
pub fn non_blank(field: &str, value: Option<String>) -> Result<String, FieldError> {
    match required(field, value)? {
        value if value.trim().is_empty() => Err(FieldError::new(field, "must not be blank")),
        value => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::error::InternalError;

    #[rstest]
    #[case::missing(None, "is required")]
    #[case::empty(Some(""), "must not be blank")]
    #[case::whitespace(Some(" \n\t "), "must not be blank")]
    fn blank_texts_are_rejected(#[case] value: Option<&str>, #[case] message: &str) {
        assert_eq!(
            non_blank("content", value.map(String::from)),
            Err(FieldError::new("content", message))
        );
    }

    #[test]
    fn texts_are_kept_as_sent() {
        assert_eq!(
            non_blank("content", Some("  padded ".to_owned())),
            Ok("  padded ".to_owned())
        );
    }

    #[test]
    fn validation_errors_list_every_field() {
        let error = ValidationError::from_fields([
            FieldError::new("startTime", "is required"),
            FieldError::new("endTime", "is required"),
        ]);
        let error = InternalError::from(error);

        assert_eq!(error.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(error.error_type, "noteblog:validation:InvalidFields");
        assert_eq!(
            error.context["errors"],
            serde_json::json!([
                { "field": "startTime", "message": "is required" },
                { "field": "endTime", "message": "is required" },
            ])
        );
        assert_eq!(
            error.message,
            "Invalid request: 'startTime' is required, 'endTime' is required"
        );
    }
}
