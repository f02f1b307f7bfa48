//! Payloads of the chat completion API

use serde::Deserialize;
use serde::Serialize;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Upper bound of the number of generated tokens
    pub max_tokens: u32,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Consumes the response, keeping only the content of its first choice
    pub fn into_first_content(self) -> Result<String, Error> {
        let choice = self.choices.into_iter().next().ok_or(Error::EmptyChoices)?;
        choice.message.content.ok_or(Error::NoResponseContent)
    }
}

impl From<String> for ChatCompletionResponse {
    fn from(content: String) -> Self {
        Self {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: Some(content),
                },
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn request_serialization() {
        let request = ChatCompletionRequest {
            model: "gpt-4o".to_owned(),
            messages: vec![ChatMessage::user("Hello")],
            max_tokens: 500,
            temperature: 0.7,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "gpt-4o",
                "messages": [{ "role": "user", "content": "Hello" }],
                "max_tokens": 500,
                "temperature": 0.7,
            })
        );
    }

    #[test]
    fn response_keeps_the_first_choice_only() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "first" }, "finish_reason": "stop" },
                { "index": 1, "message": { "role": "assistant", "content": "second" }, "finish_reason": "stop" },
            ],
        }))
        .unwrap();

        assert_eq!(response.into_first_content().unwrap(), "first");
    }

    #[test]
    fn response_without_choices() {
        let response: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(matches!(
            response.into_first_content(),
            Err(Error::EmptyChoices)
        ));
    }

    #[test]
    fn response_with_null_content() {
        let response: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [{ "message": { "content": null } }] }))
                .unwrap();
        assert!(matches!(
            response.into_first_content(),
            Err(Error::NoResponseContent)
        ));
    }
}
