//! OpenAI-compatible chat-completions wire types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use callcenter_contracts::script::GeneratedMessage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    /// A single-prompt free-text request.
    pub fn text(model: &str, temperature: f32, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage::user(prompt)],
            temperature,
            response_format: None,
        }
    }

    /// A JSON-mode request with `schema` stated in a system message.
    pub fn structured(model: &str, temperature: f32, prompt: &str, schema: &Value) -> Self {
        let instruction = format!(
            "Respond with a single JSON object and nothing else. It must conform to this JSON Schema:\n{}",
            schema
        );
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage::system(instruction), ChatMessage::user(prompt)],
            temperature,
            response_format: Some(ResponseFormat { kind: "json_object" }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<Value>,
}

impl ChatResponse {
    /// The first choice as a `GeneratedMessage`, with model, finish reason
    /// and usage carried in `metadata`.
    pub fn into_message(self) -> Option<GeneratedMessage> {
        let choice = self.choices.into_iter().next()?;
        let mut metadata = Map::new();
        if let Some(model) = self.model {
            metadata.insert("model".to_string(), Value::String(model));
        }
        if let Some(reason) = choice.finish_reason {
            metadata.insert("finish_reason".to_string(), Value::String(reason));
        }
        if let Some(usage) = self.usage {
            metadata.insert("usage".to_string(), usage);
        }
        Some(GeneratedMessage {
            content: choice.message.content,
            role: choice.message.role,
            metadata,
        })
    }
}

/// Strip a surrounding Markdown code fence (```` ```json ... ``` ````), if any.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}
