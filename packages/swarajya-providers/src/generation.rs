//! OpenAI-compatible chat-completions client used for reply generation.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use swarajya_config::LlmProviderConfig;

use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
	pub system: String,
	pub prompt: String,
	pub max_tokens: u32,
	pub temperature: f32,
}
impl GenerationRequest {
	/// A request using the configured sampling settings.
	pub fn from_config(cfg: &LlmProviderConfig, system: String, prompt: String) -> Self {
		Self { system, prompt, max_tokens: cfg.max_tokens, temperature: cfg.temperature }
	}
}

/// Performs one generation call bounded by `cfg.timeout_ms`. Retries are the caller's decision.
pub async fn generate(cfg: &LlmProviderConfig, request: &GenerationRequest) -> Result<String> {
	if !cfg.is_configured() {
		return Err(Error::Disabled);
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": request.temperature,
		"max_tokens": request.max_tokens,
		"top_p": cfg.top_p,
		"messages": [
			{ "role": "system", "content": request.system },
			{ "role": "user", "content": request.prompt },
		],
	});

	tracing::debug!(
		provider = %cfg.provider_id,
		model = %cfg.model,
		%url,
		"Sending generation request."
	);

	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let status = res.status();

	if !status.is_success() {
		return Err(Error::Status { status: status.as_u16() });
	}

	let json: Value = res.json().await?;

	parse_completion(&json)
}

/// Sends a tiny request to check that the service answers.
pub async fn ping(cfg: &LlmProviderConfig) -> Result<String> {
	let request = GenerationRequest {
		system: "You are a helpful assistant. Reply briefly.".to_string(),
		prompt: "नमस्ते! Reply with one short greeting.".to_string(),
		max_tokens: 16,
		temperature: 0.0,
	};

	generate(cfg, &request).await
}

fn parse_completion(json: &Value) -> Result<String> {
	let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	else {
		return Err(Error::InvalidResponse {
			message: "Generation response is missing choices[0].message.content.".to_string(),
		});
	};
	let content = content.trim();

	if content.is_empty() {
		return Err(Error::EmptyOutput);
	}

	Ok(content.to_string())
}
