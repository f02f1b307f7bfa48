use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use chrono::DateTime;
use chrono::Utc;
use database::DbConnectionPoolV2;
use noteblog_derive::NoteblogError;
use noteblog_models::BlogPost;
use noteblog_models::prelude::*;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use utoipa::IntoParams;
use utoipa::ToSchema;

use super::AppState;
use super::validation::Validate;
use super::validation::ValidationError;
use super::validation::non_blank;
use super::validation::required;
use crate::error::InternalError;
use crate::error::Result;
use crate::generation::TimeRange;
use crate::generation::generate_blog_post;

#[derive(Debug, Error, NoteblogError)]
#[noteblog_error(base_id = "blog_post")]
pub enum BlogPostError {
    #[error("Blog post '{blog_post_id}' could not be found")]
    #[noteblog_error(status = 404)]
    NotFound { blog_post_id: i64 },
    #[error("Blog post '{blog_post_id}' was modified by someone else, fetch it and retry")]
    #[noteblog_error(status = 409)]
    Conflict { blog_post_id: i64 },
    #[error("The id '{body_id}' of the body doesn't match the blog post '{blog_post_id}'")]
    #[noteblog_error(status = 400)]
    IdMismatch { blog_post_id: i64, body_id: i64 },
    #[error(transparent)]
    #[noteblog_error(status = 500)]
    Database(#[from] noteblog_models::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = BlogPost)]
pub struct BlogPostResponse {
    pub id: i64,
    pub content: String,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

impl From<BlogPost> for BlogPostResponse {
    fn from(
        BlogPost {
            id,
            content,
            created_date,
            last_modified_date,
        }: BlogPost,
    ) -> Self {
        Self {
            id,
            content,
            created_date,
            last_modified_date,
        }
    }
}

/// The `201 Created` response of a new blog post, with its location
pub(in crate::views) fn created_blog_post(blog_post: BlogPost) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/blogposts/{}", blog_post.id))],
        Json(BlogPostResponse::from(blog_post)),
    )
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostForm {
    /// Must contain at least one non-whitespace character
    #[serde(default)]
    #[schema(required)]
    content: Option<String>,
}

impl Validate for BlogPostForm {
    type Valid = String;

    fn validate(self) -> Result<String, ValidationError> {
        Ok(non_blank("content", self.content)?)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostUpdateForm {
    /// If given, must be the id of the updated blog post
    #[serde(default)]
    id: Option<i64>,
    /// Must contain at least one non-whitespace character
    #[serde(default)]
    #[schema(required)]
    content: Option<String>,
}

/// The creation date window of the notes to summarize, bounds included
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateForm {
    #[serde(default)]
    #[schema(required)]
    start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    #[schema(required)]
    end_time: Option<DateTime<Utc>>,
}

impl Validate for GenerateForm {
    type Valid = TimeRange;

    fn validate(self) -> Result<TimeRange, ValidationError> {
        match (
            required("startTime", self.start_time),
            required("endTime", self.end_time),
        ) {
            (Ok(start), Ok(end)) => Ok(TimeRange { start, end }),
            (start, end) => Err(ValidationError::from_fields(
                [start.err(), end.err()].into_iter().flatten(),
            )),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BlogPostIdParam {
    /// The id of a blog post
    blog_post_id: i64,
}

/// List all the blog posts, by id
#[noteblog_derive::route]
#[utoipa::path(
    get, path = "",
    tag = "blog_posts",
    responses(
        (status = 200, body = Vec<BlogPostResponse>, description = "Every blog post, by id"),
    )
)]
#[tracing::instrument(skip_all, err)]
pub(in crate::views) async fn list(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
) -> Result<Json<Vec<BlogPostResponse>>> {
    let blog_posts = BlogPost::list(&mut db_pool.get().await?).await?;
    Ok(Json(
        blog_posts.into_iter().map(BlogPostResponse::from).collect(),
    ))
}

/// Retrieve a blog post
#[noteblog_derive::route]
#[utoipa::path(
    get, path = "",
    tag = "blog_posts",
    params(BlogPostIdParam),
    responses(
        (status = 200, body = BlogPostResponse, description = "The requested blog post"),
        (status = 404, body = InternalError, description = "The blog post doesn't exist"),
    )
)]
#[tracing::instrument(skip(db_pool), err)]
pub(in crate::views) async fn get(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    Path(BlogPostIdParam { blog_post_id }): Path<BlogPostIdParam>,
) -> Result<Json<BlogPostResponse>> {
    let blog_post = BlogPost::retrieve_or_fail(db_pool.get().await?, blog_post_id, || {
        BlogPostError::NotFound { blog_post_id }
    })
    .await?;
    Ok(Json(blog_post.into()))
}

/// Write a blog post by hand
#[noteblog_derive::route]
#[utoipa::path(
    post, path = "",
    tag = "blog_posts",
    request_body = BlogPostForm,
    responses(
        (status = 201, body = BlogPostResponse, description = "The created blog post"),
        (status = 400, body = InternalError, description = "The content is missing or blank"),
    )
)]
#[tracing::instrument(skip_all, err)]
pub(in crate::views) async fn create(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    Json(form): Json<BlogPostForm>,
) -> Result<impl IntoResponse> {
    let content = form.validate()?;
    let blog_post = BlogPost::changeset()
        .content(content)
        .created_at(Utc::now())
        .create(&mut db_pool.get().await?)
        .await?;
    Ok(created_blog_post(blog_post))
}

/// Replace the content of a blog post, unless it was modified in the meantime
#[noteblog_derive::route]
#[utoipa::path(
    put, path = "",
    tag = "blog_posts",
    params(BlogPostIdParam),
    request_body = BlogPostUpdateForm,
    responses(
        (status = 200, body = BlogPostResponse, description = "The updated blog post"),
        (status = 400, body = InternalError, description = "The content is missing or blank, or the ids differ"),
        (status = 404, body = InternalError, description = "The blog post doesn't exist"),
        (status = 409, body = InternalError, description = "The blog post was modified concurrently"),
    )
)]
#[tracing::instrument(skip(db_pool, form), err)]
pub(in crate::views) async fn update(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    Path(BlogPostIdParam { blog_post_id }): Path<BlogPostIdParam>,
    Json(form): Json<BlogPostUpdateForm>,
) -> Result<Json<BlogPostResponse>> {
    if let Some(body_id) = form.id
        && body_id != blog_post_id
    {
        return Err(BlogPostError::IdMismatch {
            blog_post_id,
            body_id,
        }
        .into());
    }
    let content = BlogPostForm {
        content: form.content,
    }
    .validate()?;

    let conn = &mut db_pool.get().await?;
    let blog_post = BlogPost::retrieve_or_fail(conn.clone(), blog_post_id, || {
        BlogPostError::NotFound { blog_post_id }
    })
    .await?;
    let outcome = BlogPost::changeset()
        .content(content)
        .last_modified_date(Utc::now())
        .update_unless_modified(conn, blog_post_id, blog_post.last_modified_date)
        .await?;
    match outcome {
        UpdateOutcome::Updated(blog_post) => Ok(Json(blog_post.into())),
        UpdateOutcome::NotFound => Err(BlogPostError::NotFound { blog_post_id }.into()),
        UpdateOutcome::Conflict => Err(BlogPostError::Conflict { blog_post_id }.into()),
    }
}

/// Delete a blog post
#[noteblog_derive::route]
#[utoipa::path(
    delete, path = "",
    tag = "blog_posts",
    params(BlogPostIdParam),
    responses(
        (status = 204, description = "The blog post was deleted"),
        (status = 404, body = InternalError, description = "The blog post doesn't exist"),
    )
)]
#[tracing::instrument(skip(db_pool), err)]
pub(in crate::views) async fn delete(
    State(db_pool): State<Arc<DbConnectionPoolV2>>,
    Path(BlogPostIdParam { blog_post_id }): Path<BlogPostIdParam>,
) -> Result<impl IntoResponse> {
    BlogPost::delete_static_or_fail(&mut db_pool.get().await?, blog_post_id, || {
        BlogPostError::NotFound { blog_post_id }
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Generate a blog post from the notes created within a time window
///
/// The notes are summarized by the completion service, in creation order.
#[noteblog_derive::route]
#[utoipa::path(
    post, path = "",
    tag = "blog_posts",
    request_body = GenerateForm,
    responses(
        (status = 201, body = BlogPostResponse, description = "The generated blog post"),
        (status = 400, body = InternalError, description = "A bound of the window is missing"),
        (status = 404, body = InternalError, description = "No note was created within the window"),
        (status = 502, body = InternalError, description = "The completion service failed"),
    )
)]
#[tracing::instrument(skip_all, err)]
pub(in crate::views) async fn generate(
    State(AppState {
        db_pool,
        completion_client,
        generation_settings,
        ..
    }): State<AppState>,
    Json(form): Json<GenerateForm>,
) -> Result<impl IntoResponse> {
    let range = form.validate()?;
    let blog_post =
        generate_blog_post(&db_pool, &completion_client, &generation_settings, range).await?;
    Ok(created_blog_post(blog_post))
}
