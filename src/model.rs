use crate::constants::{MAX_RESPONSE_TOKENS, MODEL_TIMEOUT_SECS};
use crate::credentials::ModelEndpoint;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// a chat model: one system instruction, then user messages in order
pub trait ModelClient {
    fn complete(&self, system_prompt: &str, messages: &[String]) -> Result<String>;
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    stream: bool,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    content: Option<String>,
}

/// openai-compatible `/chat/completions` over blocking http
pub struct OpenAiClient {
    agent: ureq::Agent,
    endpoint: ModelEndpoint,
}

impl OpenAiClient {
    pub fn new(endpoint: ModelEndpoint) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(MODEL_TIMEOUT_SECS)))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            endpoint,
        }
    }

    fn url(&self) -> String {
        completions_url(&self.endpoint.base_url)
    }
}

fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn build_request<'a>(model: &'a str, system_prompt: &'a str, messages: &'a [String]) -> ChatRequest<'a> {
    let mut chat = Vec::with_capacity(messages.len() + 1);
    chat.push(ChatMessage {
        role: "system",
        content: system_prompt,
    });
    chat.extend(messages.iter().map(|content| ChatMessage {
        role: "user",
        content,
    }));
    ChatRequest {
        model,
        max_tokens: MAX_RESPONSE_TOKENS,
        stream: false,
        messages: chat,
    }
}

fn first_choice(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| Error::Model("response contained no message".to_string()))
}

impl ModelClient for OpenAiClient {
    fn complete(&self, system_prompt: &str, messages: &[String]) -> Result<String> {
        let request = build_request(&self.endpoint.model, system_prompt, messages);

        let mut builder = self.agent.post(self.url());
        if let Some(token) = &self.endpoint.token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let mut response = builder
            .send_json(&request)
            .map_err(|e| Error::Model(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(Error::Model(format!("{status}: {}", body.trim())));
        }

        let parsed: ChatResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| Error::Model(format!("invalid response: {e}")))?;
        first_choice(parsed)
    }
}
