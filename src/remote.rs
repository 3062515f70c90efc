//! Remote classifier delegate: an OpenAI-style chat API asked for a
//! strict-JSON batch classification.
//!
//! Same contract as the rule engine: ordered batch of unit texts in,
//! ordered batch of candidates out. Any mismatch in batch length, HTTP
//! failure, timeout, or parse error surfaces as `ClassifierDelegateError`
//! and the caller falls back to the rule engine for that batch.
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::Prompts;
use crate::domain::{CardCandidate, FilteredUnit};
use crate::error::HankiError;
use crate::pinyin_text::to_pinyin_diacritics;
use crate::util::{fill_template, trunc_for_log};

#[derive(Clone)]
pub struct RemoteClassifier {
  client: reqwest::Client,
  api_key: String,
  base_url: String,
  model: String,
  prompts: Prompts,
}

impl RemoteClassifier {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  ///
  /// Env:
  ///   OPENAI_API_KEY   : enables the delegate
  ///   OPENAI_BASE_URL  : default "https://api.openai.com/v1"
  ///   OPENAI_MODEL     : default "gpt-4o-mini"
  ///   HANKI_CLASSIFY_TIMEOUT_SECS : per-call bound, default 20
  pub fn from_env(prompts: Prompts) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let timeout_secs = std::env::var("HANKI_CLASSIFY_TIMEOUT_SECS")
      .ok()
      .and_then(|s| s.parse::<u64>().ok())
      .unwrap_or(20);

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(timeout_secs))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model, prompts })
  }

  /// Build a client against an arbitrary endpoint with a tight timeout,
  /// for exercising the failure path without any environment setup.
  #[cfg(test)]
  pub(crate) fn with_base_url(base_url: &str) -> Self {
    Self {
      client: reqwest::Client::builder()
        .timeout(Duration::from_millis(250))
        .build()
        .unwrap(),
      api_key: "test-key".into(),
      base_url: base_url.into(),
      model: "test-model".into(),
      prompts: Prompts::default(),
    }
  }

  /// Classify one bounded batch. The unit gloss rides along in
  /// parentheses, same as the rule engine sees it.
  #[instrument(level = "info", skip(self, units), fields(model = %self.model, batch = units.len()))]
  pub async fn classify_batch(
    &self,
    units: &[FilteredUnit],
  ) -> Result<Vec<CardCandidate>, HankiError> {
    let numbered: Vec<String> = units
      .iter()
      .enumerate()
      .map(|(i, u)| match &u.gloss {
        Some(g) => format!("{}. {} ({})", i + 1, u.text, g),
        None => format!("{}. {}", i + 1, u.text),
      })
      .collect();
    let user = fill_template(
      &self.prompts.classify_user_template,
      &[("count", &units.len().to_string()), ("lines", &numbered.join("\n"))],
    );

    let start = std::time::Instant::now();
    let envelope: ItemsEnvelope =
      self.chat_json(&self.prompts.classify_system, &user, 0.0).await?;
    info!(elapsed = ?start.elapsed(), items = envelope.items.len(), "Remote classification received");

    if envelope.items.len() != units.len() {
      return Err(HankiError::ClassifierDelegate(format!(
        "batch length mismatch: sent {}, got {}",
        units.len(),
        envelope.items.len()
      )));
    }

    let mut out = envelope.items;
    for (candidate, unit) in out.iter_mut().zip(units) {
      candidate.line_no = unit.line_no;
      if candidate.traditional.is_empty() {
        candidate.traditional = candidate.simplified.clone();
      }
      if candidate.pinyin.is_empty() {
        candidate.pinyin = to_pinyin_diacritics(&candidate.simplified);
      }
      if candidate.gloss.is_none() {
        candidate.gloss = unit.gloss.clone();
      }
    }
    Ok(out)
  }

  /// JSON-object chat completion against `/chat/completions`.
  async fn chat_json<T: for<'a> Deserialize<'a>>(
    &self,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<T, HankiError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      response_format: Some(ResponseFormat { r#type: "json_object".into() }),
    };

    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "hanki/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req)
      .send()
      .await
      .map_err(|e| HankiError::ClassifierDelegate(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_api_error(&body).unwrap_or(body);
      return Err(HankiError::ClassifierDelegate(format!("HTTP {}: {}", status, msg)));
    }

    let body: ChatCompletionResponse = res
      .json()
      .await
      .map_err(|e| HankiError::ClassifierDelegate(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "API usage");
    }
    let text = body
      .choices
      .first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default();

    serde_json::from_str::<T>(&text).map_err(|e| {
      HankiError::ClassifierDelegate(format!(
        "JSON parse error: {} in {}",
        e,
        trunc_for_log(&text, 200)
      ))
    })
  }
}

/// Response envelope: `{"items": [...]}` with one item per input line.
#[derive(Deserialize)]
pub struct ItemsEnvelope {
  pub items: Vec<CardCandidate>,
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an API error body.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
