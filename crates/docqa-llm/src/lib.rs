//! Language model gateway for OpenAI-compatible `/chat/completions` endpoints.
//!
//! Works against hosted APIs and local servers (llama.cpp, Ollama, vLLM) that
//! speak the same protocol; only `gateway.base_url` changes.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use docqa_core::config::GatewaySettings;
use docqa_core::error::{Error, Result};
pub use docqa_core::traits::LanguageModel;
use docqa_core::types::ChatMessage;

pub struct OpenAiChatModel {
    client: reqwest::blocking::Client,
    url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChatModel {
    pub fn from_settings(settings: &GatewaySettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("http client: {e}")))?;
        let api_key = settings.api_key();
        if api_key.is_none() {
            warn!(env = %settings.api_key_env, "no API key set; sending unauthenticated chat requests");
        }
        Ok(Self {
            client,
            url: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            api_key,
            model: settings.chat_model.clone(),
            temperature: settings.temperature,
        })
    }

    pub fn model(&self) -> &str { &self.model }
}

fn to_wire(messages: &[ChatMessage]) -> Vec<WireMessage<'_>> {
    messages.iter().map(|m| WireMessage { role: m.role.as_str(), content: &m.content }).collect()
}

fn first_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| Error::Generation("model returned no content".to_string()))
}

impl LanguageModel for OpenAiChatModel {
    fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = ChatRequest { model: &self.model, messages: to_wire(messages), temperature: self.temperature };
        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().map_err(|e| Error::Generation(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Generation(format!("{status}: {body}")));
        }
        let parsed: ChatResponse = response.json().map_err(|e| Error::Generation(format!("bad response: {e}")))?;
        let text = first_content(parsed)?;
        debug!(model = %self.model, messages = messages.len(), chars = text.len(), "generated completion");
        Ok(text)
    }
}
