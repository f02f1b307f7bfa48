//! Blog post generation: the notes of a time window are summarized by the completion service

use chrono::DateTime;
use chrono::Utc;
use completion_client::ChatCompletionRequest;
use completion_client::ChatMessage;
use completion_client::CompletionClient;
use database::DbConnectionPoolV2;
use database::db_connection_pool::DatabasePoolError;
use noteblog_derive::NoteblogError;
use noteblog_models::BlogPost;
use noteblog_models::Note;
use noteblog_models::prelude::*;
use thiserror::Error;
use tracing::info;

/// First line of every prompt, followed by the content of the notes
pub const PROMPT_INSTRUCTION: &str = "Create a blog post from the following notes:";

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// How the completion service is asked to write a post
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_owned(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl GenerationSettings {
    pub fn chat_request(&self, prompt: String) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// A creation date window, bounds included
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub fn build_prompt<'a>(contents: impl IntoIterator<Item = &'a str>) -> String {
    std::iter::once::<&'a str>(PROMPT_INSTRUCTION)
        .chain(contents)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Error, NoteblogError)]
#[noteblog_error(base_id = "generation")]
pub enum GenerationError {
    #[error("No note was created between {start} and {end}")]
    #[noteblog_error(status = 404)]
    NoNotesInRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("The blog post could not be generated: {0}")]
    #[noteblog_error(status = 502)]
    UpstreamFailure(#[from] completion_client::Error),
    #[error(transparent)]
    #[noteblog_error(status = 500)]
    Database(#[from] noteblog_models::Error),
    #[error(transparent)]
    #[noteblog_error(status = 500)]
    DatabasePool(#[from] DatabasePoolError),
}

/// Generates a blog post from the notes created within the time range and saves it
///
/// The notes are sent in creation order. Nothing is saved if the completion service fails.
/// No database connection is held while waiting for the completion service.
#[tracing::instrument(skip(db_pool, client, settings), err)]
pub async fn generate_blog_post(
    db_pool: &DbConnectionPoolV2,
    client: &CompletionClient,
    settings: &GenerationSettings,
    TimeRange { start, end }: TimeRange,
) -> Result<BlogPost, GenerationError> {
    let notes = Note::list_created_within(&mut db_pool.get().await?, start, end).await?;
    if notes.is_empty() {
        return Err(GenerationError::NoNotesInRange { start, end });
    }
    info!(notes = notes.len(), "generating a blog post");

    let prompt = build_prompt(notes.iter().map(|note| note.content.as_str()));
    let content = client
        .complete_first(&settings.chat_request(prompt))
        .await?;
    if content.trim().is_empty() {
        return Err(completion_client::Error::NoResponseContent.into());
    }

    let blog_post = BlogPost::changeset()
        .content(content)
        .created_at(Utc::now())
        .create(&mut db_pool.get().await?)
        .await?;
    info!(blog_post_id = blog_post.id, "blog post generated");
    Ok(blog_post)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::Duration;
    use completion_client::ChatCompletionResponse;
    use completion_client::mocking::MockingClient;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn prompts_list_one_note_per_line() {
        assert_eq!(
            build_prompt(["Buy milk", "Call Alex"]),
            "Create a blog post from the following notes:\nBuy milk\nCall Alex"
        );
    }

    #[test]
    fn prompts_without_notes_are_the_instruction() {
        assert_eq!(build_prompt(std::iter::empty()), PROMPT_INSTRUCTION);
    }

    #[test]
    fn chat_requests_use_the_settings() {
        let settings = GenerationSettings {
            model: "small-model".to_owned(),
            max_tokens: 42,
            temperature: 0.2,
        };

        let request = settings.chat_request("Hello".to_owned());

        assert_eq!(
            request,
            ChatCompletionRequest {
                model: "small-model".to_owned(),
                messages: vec![ChatMessage::user("Hello")],
                max_tokens: 42,
                temperature: 0.2,
            }
        );
    }

    #[test]
    fn default_settings() {
        let settings = GenerationSettings::default();
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.max_tokens, 500);
        assert_eq!(settings.temperature, 0.7);
    }

    async fn create_note(db_pool: &DbConnectionPoolV2, content: &str, at: DateTime<Utc>) -> Note {
        Note::changeset()
            .content(content.to_owned())
            .created_at(at)
            .create(&mut db_pool.get_ok())
            .await
            .expect("Failed to create note")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn notes_of_the_range_make_up_the_prompt() {
        let db_pool = DbConnectionPoolV2::for_tests();
        let now = Utc::now();
        create_note(&db_pool, "too old", now - Duration::days(10)).await;
        create_note(&db_pool, "second", now - Duration::hours(1)).await;
        create_note(&db_pool, "first", now - Duration::hours(2)).await;
        let mut completion = MockingClient::new();
        completion
            .stub()
            .response(StatusCode::OK)
            .json(ChatCompletionResponse::from("A fine post".to_owned()))
            .finish();
        let client = CompletionClient::from(completion.clone());

        let blog_post = generate_blog_post(
            &db_pool,
            &client,
            &GenerationSettings::default(),
            TimeRange {
                start: now - Duration::days(1),
                end: now,
            },
        )
        .await
        .expect("generation should succeed");

        assert_eq!(blog_post.content, "A fine post");
        assert_eq!(
            completion.received_requests(),
            vec![GenerationSettings::default().chat_request(build_prompt(["first", "second"]))]
        );
        let saved = BlogPost::list(&mut db_pool.get_ok()).await.unwrap();
        assert_eq!(saved, vec![blog_post]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn upstream_failures_save_nothing() {
        let db_pool = DbConnectionPoolV2::for_tests();
        let now = Utc::now();
        create_note(&db_pool, "a note", now).await;
        let mut completion = MockingClient::new();
        completion
            .stub()
            .response(StatusCode::SERVICE_UNAVAILABLE)
            .body("overloaded")
            .finish();

        let error = generate_blog_post(
            &db_pool,
            &completion.into(),
            &GenerationSettings::default(),
            TimeRange {
                start: now - Duration::minutes(1),
                end: now + Duration::minutes(1),
            },
        )
        .await
        .expect_err("generation should fail");

        assert!(matches!(
            error,
            GenerationError::UpstreamFailure(completion_client::Error::UpstreamStatus {
                status: 503,
                ..
            })
        ));
        assert!(BlogPost::list(&mut db_pool.get_ok()).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn empty_ranges_are_not_found() {
        let db_pool = DbConnectionPoolV2::for_tests();
        let now = Utc::now();
        create_note(&db_pool, "a note", now).await;
        let completion = MockingClient::new();

        let error = generate_blog_post(
            &db_pool,
            &completion.clone().into(),
            &GenerationSettings::default(),
            TimeRange {
                start: now + Duration::minutes(1),
                end: now - Duration::minutes(1),
            },
        )
        .await
        .expect_err("generation should fail");

        assert!(matches!(error, GenerationError::NoNotesInRange { .. }));
        assert!(completion.received_requests().is_empty());
    }
}
