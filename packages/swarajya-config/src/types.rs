use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub catalog: Catalog,
	pub search: Search,
	pub composer: Composer,
	pub providers: Providers,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
	pub path: PathBuf,
	/// Reject the whole catalog on the first malformed entry instead of skipping it.
	#[serde(default)]
	pub strict: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	#[serde(default = "default_max_results")]
	pub max_results: u32,
	/// Minimum token length in characters. Shorter tokens are dropped from the query.
	#[serde(default = "default_min_query_length")]
	pub min_query_length: u32,
	#[serde(default)]
	pub weights: SearchWeights,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SearchWeights {
	/// Query token equals a keyword.
	pub exact: u32,
	/// Query token and keyword contain one another.
	pub partial: u32,
	/// Query token occurs in the title or description.
	pub text: u32,
	/// A multi-word keyword occurs verbatim in the query. Added once per keyword.
	pub phrase: u32,
}
impl Default for SearchWeights {
	fn default() -> Self {
		Self { exact: 3, partial: 2, text: 1, phrase: 3 }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Composer {
	#[serde(default = "default_language")]
	pub default_language: String,
	#[serde(default = "default_fallback_field_chars")]
	pub fallback_field_chars: u32,
	#[serde(default = "default_prompt_field_chars")]
	pub prompt_field_chars: u32,
	#[serde(default = "default_related_titles")]
	pub related_titles: u32,
	#[serde(default = "default_retry_backoff_ms")]
	pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub generation: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	#[serde(default = "default_true")]
	pub enabled: bool,
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	/// Environment variable consulted when `api_key` is empty.
	#[serde(default = "default_api_key_env")]
	pub api_key_env: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	#[serde(default = "default_top_p")]
	pub top_p: f32,
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}
impl LlmProviderConfig {
	/// Enabled and carrying a usable credential.
	pub fn is_configured(&self) -> bool {
		self.enabled && !self.api_key.trim().is_empty()
	}
}

fn default_max_results() -> u32 {
	10
}

fn default_min_query_length() -> u32 {
	2
}

fn default_language() -> String {
	"hi".to_string()
}

fn default_fallback_field_chars() -> u32 {
	200
}

fn default_prompt_field_chars() -> u32 {
	600
}

fn default_related_titles() -> u32 {
	3
}

fn default_retry_backoff_ms() -> u64 {
	250
}

fn default_true() -> bool {
	true
}

fn default_api_key_env() -> String {
	"GROQ_API_KEY".to_string()
}

fn default_top_p() -> f32 {
	0.9
}
