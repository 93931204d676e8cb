// src/discovery/response.rs
//! Decode model payloads into a validated profile pick.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model_client::ModelPayload;
use crate::error::ModelError;
use crate::types::selection::looks_like_url;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// JSON object with url, message and confidence.
    #[default]
    Structured,
    /// A single URL in plain text.
    BareUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePick {
    pub url: String,
    pub message: Option<String>,
    pub confidence: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct RawPick {
    #[serde(alias = "profile_url", alias = "linkedin_url")]
    url: Option<String>,
    message: Option<String>,
    confidence: Option<Value>,
}

pub fn decode(payload: ModelPayload, format: ResponseFormat) -> Result<ProfilePick, ModelError> {
    match format {
        ResponseFormat::Structured => decode_structured(payload),
        ResponseFormat::BareUrl => decode_bare_url(payload),
    }
}

fn decode_structured(payload: ModelPayload) -> Result<ProfilePick, ModelError> {
    let value = match payload {
        ModelPayload::Structured(value) => value,
        ModelPayload::Text(text) => {
            let body = json_body(&text);
            serde_json::from_str::<Value>(body).map_err(|e| {
                ModelError::Malformed(format!("response is not JSON ({}): {}", e, truncate(body)))
            })?
        }
    };
    validate(value)
}

fn validate(value: Value) -> Result<ProfilePick, ModelError> {
    let raw: RawPick = serde_json::from_value(value.clone())
        .map_err(|e| ModelError::Malformed(format!("unexpected shape ({}): {}", e, value)))?;

    let url = raw
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| looks_like_url(u))
        .ok_or_else(|| ModelError::Malformed(format!("missing or invalid url: {}", value)))?;
    let message = raw
        .message
        .ok_or_else(|| ModelError::Malformed(format!("missing message: {}", value)))?;
    let confidence = raw
        .confidence
        .as_ref()
        .and_then(parse_confidence)
        .ok_or_else(|| ModelError::Malformed(format!("missing or invalid confidence: {}", value)))?;

    let message = message.trim().to_string();
    Ok(ProfilePick {
        url,
        message: (!message.is_empty()).then_some(message),
        confidence: Some(confidence),
    })
}

/// Integers, floats and numeric strings, clamped to 0..=100.
fn parse_confidence(value: &Value) -> Option<u8> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() {
        return None;
    }
    Some(number.round().clamp(0.0, 100.0) as u8)
}

fn decode_bare_url(payload: ModelPayload) -> Result<ProfilePick, ModelError> {
    let text = match payload {
        ModelPayload::Structured(value) => {
            if let Ok(pick) = validate(value.clone()) {
                return Ok(pick);
            }
            value
                .get("url")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string())
        }
        ModelPayload::Text(text) => text,
    };

    first_url(&text)
        .map(|url| ProfilePick {
            url,
            message: None,
            confidence: None,
        })
        .ok_or_else(|| ModelError::Malformed(format!("no URL in response: {}", truncate(&text))))
}

fn first_url(text: &str) -> Option<String> {
    text.split(|c: char| c.is_whitespace() || c == '<' || c == '(' || c == '[')
        .map(|token| token.trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '>' | ')' | ']' | ',' | '.' | ';')))
        .find(|token| looks_like_url(token))
        .map(str::to_string)
}

/// The JSON object inside a reply: fence removed, or else the outermost
/// `{...}` span when the model wrapped it in prose.
fn json_body(text: &str) -> &str {
    let body = strip_code_fence(text);
    if body.starts_with('{') {
        return body;
    }
    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => body,
    }
}

/// Models often wrap JSON in a Markdown fence, with any language tag.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn truncate(text: &str) -> String {
    const LIMIT: usize = 200;
    if text.chars().count() > LIMIT {
        format!("{}...", text.chars().take(LIMIT).collect::<String>())
    } else {
        text.to_string()
    }
}
