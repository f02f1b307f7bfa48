use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use chrono::DateTime;
use chrono::Utc;
use database::DbConnectionPoolV2;
use noteblog_derive::NoteblogError;
use noteblog_models::Note;
use noteblog_models::prelude::*;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use utoipa::IntoParams;
use utoipa::ToSchema;

use super::AppState;
use super::blog_posts::BlogPostResponse;
use super::blog_posts::created_blog_post;
use super::validation::Validate;
use super::validation::ValidationError;
use super::validation::non_blank;
use super::validation::required;
use crate::error::InternalError;
use crate::error::Result;
use crate::generation::TimeRange;
use crate::generation::generate_blog_post;

#[derive(Debug, Error, NoteblogError)]
#[noteblog_error(base_id = "note")]
pub enum NoteError {
    #[error("Note '{note_id}' could not be found")]
    #[noteblog_error(status = 404)]
    NotFound { note_id: i64 },
    #[error("Note '{note_id}' was modified by someone else, fetch it and retry")]
    #[noteblog_error(status = 409)]
    Conflict { note_id: i64 },
    #[error("The id '{body_id}' of the body doesn't match the note '{note_id}'")]
    #[noteblog_error(status = 400)]
    IdMismatch { note_id: i64, body_id: i64 },
    #[error(transparent)]
    #[noteblog_error(status = 500)]
    Database(#[from] noteblog_models::Error),
}

/// A note as sent to the clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = Note)]
pub struct NoteResponse {
    pub id: i64,
    pub content: String,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(
        Note {
            id,
            content,
            created_date,
            last_modified_date,
        }: Note,
    ) -> Self {
        Self {
            id,
            content,
            created_date,
            last_modified_date,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteForm {
    /// Must contain at least one non-whitespace character
    #[serde(default)]
    #[schema(required)]
    content: Option<String>,
}

impl Validate for NoteForm {
    type Valid = String;

    fn validate(self) -> Result<String, ValidationError> {
        Ok(non_blank("content", self.content)?)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdateForm {
    /// If given, must be the id of the updated note
    #[serde(default)]
    id: Option<i64>,
    /// Must contain at least one non-whitespace character
    #[serde(default)]
    #[schema(required)]
    content: Option<String>,
}

/// The creation date window of the notes to summarize
///
/// Both bounds are RFC 3339 dates, percent-encoded in the query string. A `+` offset
/// must be sent as `%2B` since a raw `+` decodes to a space. The `Z` form needs no encoding.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct GenerateBlogQueryParams {
    /// Included lower bound of the creation dates, required
    start_date: Option<DateTime<Utc>>,
    /// Included upper bound of the creation dates, required
    end_date: Option<DateTime<Utc>>,
}

impl Validate for GenerateBlogQueryParams {
    type Valid = TimeRange;

    fn validate(self) -> Result<TimeRange, ValidationError> {
        match (
            required("startDate", self.start_date),
            required("endDate", self.end_date),
        ) {
            (Ok(start), Ok(end)) => Ok(TimeRange { start, end }),
            (start, end) => Err(ValidationError::from_fields(
                [start.err(), end.err()].into_iter().flatten(),
            )),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct NoteIdParam {
    /// The id of a note
    note_id: i64,
}

fn location(note_id: i64) -> String {
    format!("/api/notes/{note_id}")
}

/// List all the notes, by id
#[noteblog_derive::route]
#[utoipa::path(
    get, path = "",
    tag = "notes",
    responses(
        (status = 200, body = Vec<NoteResponse>, description = "Every note"),
    )
)]
#[tracing::instrument(skip_all, err)]
pub(in crate::views) async fn list(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
) -> Result<Json<Vec<NoteResponse>>> {
    let notes = Note::list(&mut db_pool.get().await?).await?;
    Ok(Json(notes.into_iter().map(NoteResponse::from).collect()))
}

/// Retrieve a note
#[noteblog_derive::route]
#[utoipa::path(
    get, path = "",
    tag = "notes",
    params(NoteIdParam),
    responses(
        (status = 200, body = NoteResponse, description = "The requested note"),
        (status = 404, body = InternalError, description = "The note doesn't exist"),
    )
)]
#[tracing::instrument(skip(db_pool), err)]
pub(in crate::views) async fn get(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    Path(NoteIdParam { note_id }): Path<NoteIdParam>,
) -> Result<Json<NoteResponse>> {
    let note = Note::retrieve_or_fail(db_pool.get().await?, note_id, || NoteError::NotFound {
        note_id,
    })
    .await?;
    Ok(Json(note.into()))
}

/// Create a note, both of its dates are set to the current time
#[noteblog_derive::route]
#[utoipa::path(
    post, path = "",
    tag = "notes",
    request_body = NoteForm,
    responses(
        (status = 201, body = NoteResponse, description = "The created note"),
        (status = 400, body = InternalError, description = "The content is missing or blank"),
    )
)]
#[tracing::instrument(skip_all, err)]
pub(in crate::views) async fn create(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    Json(form): Json<NoteForm>,
) -> Result<impl IntoResponse> {
    let content = form.validate()?;
    let note = Note::changeset()
        .content(content)
        .created_at(Utc::now())
        .create(&mut db_pool.get().await?)
        .await?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location(note.id))],
        Json(NoteResponse::from(note)),
    ))
}

/// Replace the content of a note
///
/// The update is rejected if the note was modified by someone else in the meantime.
#[noteblog_derive::route]
#[utoipa::path(
    put, path = "",
    tag = "notes",
    params(NoteIdParam),
    request_body = NoteUpdateForm,
    responses(
        (status = 200, body = NoteResponse, description = "The updated note"),
        (status = 400, body = InternalError, description = "The content is missing or blank, or the ids differ"),
        (status = 404, body = InternalError, description = "The note doesn't exist"),
        (status = 409, body = InternalError, description = "The note was modified concurrently"),
    )
)]
#[tracing::instrument(skip(db_pool, form), err)]
pub(in crate::views) async fn update(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    Path(NoteIdParam { note_id }): Path<NoteIdParam>,
    Json(form): Json<NoteUpdateForm>,
) -> Result<Json<NoteResponse>> {
    if let Some(body_id) = form.id
        && body_id != note_id
    {
        return Err(NoteError::IdMismatch { note_id, body_id }.into());
    }
    let content = NoteForm {
        content: form.content,
    }
    .validate()?;

    let conn = &mut db_pool.get().await?;
    let note = Note::retrieve_or_fail(conn.clone(), note_id, || NoteError::NotFound { note_id })
        .await?;
    let outcome = Note::changeset()
        .content(content)
        .last_modified_date(Utc::now())
        .update_unless_modified(conn, note_id, note.last_modified_date)
        .await?;
    match outcome {
        UpdateOutcome::Updated(note) => Ok(Json(note.into())),
        UpdateOutcome::NotFound => Err(NoteError::NotFound { note_id }.into()),
        UpdateOutcome::Conflict => Err(NoteError::Conflict { note_id }.into()),
    }
}

/// Delete a note
#[noteblog_derive::route]
#[utoipa::path(
    delete, path = "",
    tag = "notes",
    params(NoteIdParam),
    responses(
        (status = 204, description = "The note was deleted"),
        (status = 404, body = InternalError, description = "The note doesn't exist"),
    )
)]
#[tracing::instrument(skip(db_pool), err)]
pub(in crate::views) async fn delete(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    Path(NoteIdParam { note_id }): Path<NoteIdParam>,
) -> Result<impl IntoResponse> {
    Note::delete_static_or_fail(&mut db_pool.get().await?, note_id, || NoteError::NotFound {
        note_id,
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Generate a blog post from the notes created within a time window
#[noteblog_derive::route]
#[utoipa::path(
    get, path = "",
    tag = "notes",
    params(GenerateBlogQueryParams),
    responses(
        (status = 201, body = BlogPostResponse, description = "The generated blog post"),
        (status = 400, body = InternalError, description = "A bound of the window is missing"),
        (status = 404, body = InternalError, description = "No note was created within the window"),
        (status = 502, body = InternalError, description = "The completion service failed"),
    )
)]
#[tracing::instrument(skip_all, err)]
pub(in crate::views) async fn generate_blog(
    State(AppState {
        db_pool,
        completion_client,
        generation_settings,
        ..
    }): State<AppState>,
    Query(params): Query<GenerateBlogQueryParams>,
) -> Result<impl IntoResponse> {
    let range = params.validate()?;
    let blog_post =
        generate_blog_post(&db_pool, &completion_client, &generation_settings, range).await?;
    Ok(created_blog_post(blog_post))
}
