// src/discovery/model_client.rs
//! Generative-model providers. Each call names its model so the selector can
//! walk a fallback list against one client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use super::response::ResponseFormat;
use crate::error::ModelError;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const CHAT_COMPLETIONS_URL: &str = "https://models.github.ai/inference/chat/completions";

/// A model answer before validation: either already a JSON object, or raw
/// text that still has to be decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelPayload {
    Structured(Value),
    Text(String),
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        format: ResponseFormat,
    ) -> Result<ModelPayload, ModelError>;
}

fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

async fn read_success(response: reqwest::Response) -> Result<Value, ModelError> {
    let status = response.status();
    let body = response.text().await.map_err(ModelError::transport)?;

    if !status.is_success() {
        return Err(ModelError::classify(status, &body));
    }

    debug!("Model raw response: {}", body);
    serde_json::from_str(&body)
        .map_err(|e| ModelError::Malformed(format!("response body is not JSON: {}", e)))
}

/// Google Gemini `generateContent`.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            base_url: base_url.unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }

    fn request_body(prompt: &str, format: ResponseFormat) -> Value {
        let mut generation_config = json!({ "temperature": 0.2 });
        if format == ResponseFormat::Structured {
            generation_config["responseMimeType"] = json!("application/json");
            generation_config["responseSchema"] = json!({
                "type": "OBJECT",
                "properties": {
                    "url": { "type": "STRING" },
                    "message": { "type": "STRING" },
                    "confidence": { "type": "INTEGER" }
                },
                "required": ["url", "message", "confidence"]
            });
        }

        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": generation_config
        })
    }

    fn extract_payload(data: &Value) -> Result<ModelPayload, ModelError> {
        let parts = data["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| {
                let reason = data["promptFeedback"]["blockReason"]
                    .as_str()
                    .unwrap_or("no candidates returned");
                ModelError::Malformed(format!("empty Gemini response: {}", reason))
            })?;

        let text: String = parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect();

        if text.trim().is_empty() {
            return Err(ModelError::Malformed("Gemini response has no text".to_string()));
        }
        Ok(ModelPayload::Text(text))
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        format: ResponseFormat,
    ) -> Result<ModelPayload, ModelError> {
        info!("Calling Gemini model: {}", model);

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&Self::request_body(prompt, format))
            .send()
            .await
            .map_err(ModelError::transport)?;

        let data = read_success(response).await?;
        Self::extract_payload(&data)
    }
}

/// OpenAI-compatible chat completions (GitHub Models and friends).
pub struct ChatClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl ChatClient {
    pub fn new(api_key: String, endpoint: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            endpoint: endpoint.unwrap_or_else(|| CHAT_COMPLETIONS_URL.to_string()),
        })
    }

    fn request_body(model: &str, prompt: &str, format: ResponseFormat) -> Value {
        let mut body = json!({
            "model": model,
            "messages": [
                { "role": "system", "content": "You are a helpful assistant." },
                { "role": "user", "content": prompt }
            ],
            "temperature": 0.2,
            "max_tokens": 500,
            "top_p": 1.0
        });
        if format == ResponseFormat::Structured {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }

    fn extract_payload(data: &Value) -> Result<ModelPayload, ModelError> {
        let message = &data["choices"][0]["message"];

        if message["parsed"].is_object() {
            return Ok(ModelPayload::Structured(message["parsed"].clone()));
        }

        match &message["content"] {
            Value::String(text) if !text.trim().is_empty() => {
                Ok(ModelPayload::Text(text.trim().to_string()))
            }
            Value::Object(_) => Ok(ModelPayload::Structured(message["content"].clone())),
            _ => Err(ModelError::Malformed("no choices in chat response".to_string())),
        }
    }
}

#[async_trait]
impl GenerativeModel for ChatClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        format: ResponseFormat,
    ) -> Result<ModelPayload, ModelError> {
        info!("Calling chat model: {}", model);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&Self::request_body(model, prompt, format))
            .send()
            .await
            .map_err(ModelError::transport)?;

        let data = read_success(response).await?;
        Self::extract_payload(&data)
    }
}
