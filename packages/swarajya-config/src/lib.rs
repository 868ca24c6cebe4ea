mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Catalog, Composer, Config, LlmProviderConfig, Providers, Search, SearchWeights, Service,
};

use std::{env, fs, path::Path};

const API_KEY_PLACEHOLDER: &str = "your-groq-api-key-here";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.admin_bind", &cfg.service.admin_bind),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.catalog.path.as_os_str().is_empty() {
		return Err(Error::Validation { message: "catalog.path must be non-empty.".to_string() });
	}
	if cfg.search.max_results == 0 {
		return Err(Error::Validation {
			message: "search.max_results must be greater than zero.".to_string(),
		});
	}
	if cfg.search.min_query_length == 0 {
		return Err(Error::Validation {
			message: "search.min_query_length must be greater than zero.".to_string(),
		});
	}

	let weights = &cfg.search.weights;

	if weights.exact == 0 {
		return Err(Error::Validation {
			message: "search.weights.exact must be greater than zero.".to_string(),
		});
	}
	if weights.exact <= weights.partial {
		return Err(Error::Validation {
			message: "search.weights.exact must be greater than search.weights.partial."
				.to_string(),
		});
	}
	if weights.partial < weights.text {
		return Err(Error::Validation {
			message: "search.weights.partial must be at least search.weights.text.".to_string(),
		});
	}
	if !matches!(cfg.composer.default_language.as_str(), "hi" | "en") {
		return Err(Error::Validation {
			message: "composer.default_language must be one of hi or en.".to_string(),
		});
	}
	if cfg.composer.fallback_field_chars == 0 {
		return Err(Error::Validation {
			message: "composer.fallback_field_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.composer.prompt_field_chars == 0 {
		return Err(Error::Validation {
			message: "composer.prompt_field_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.composer.retry_backoff_ms > 5_000 {
		return Err(Error::Validation {
			message: "composer.retry_backoff_ms must be 5000 or less.".to_string(),
		});
	}

	validate_generation(&cfg.providers.generation)
}

fn validate_generation(provider: &LlmProviderConfig) -> Result<()> {
	if !(1..=30_000).contains(&provider.timeout_ms) {
		return Err(Error::Validation {
			message: "providers.generation.timeout_ms must be in the range 1-30000.".to_string(),
		});
	}
	if !provider.temperature.is_finite() || !(0.0..=2.0).contains(&provider.temperature) {
		return Err(Error::Validation {
			message: "providers.generation.temperature must be in the range 0.0-2.0.".to_string(),
		});
	}
	if !provider.top_p.is_finite() || provider.top_p <= 0.0 || provider.top_p > 1.0 {
		return Err(Error::Validation {
			message: "providers.generation.top_p must be greater than 0.0 and at most 1.0."
				.to_string(),
		});
	}
	if provider.max_tokens == 0 {
		return Err(Error::Validation {
			message: "providers.generation.max_tokens must be greater than zero.".to_string(),
		});
	}
	if provider.enabled {
		for (label, value) in [
			("providers.generation.api_base", &provider.api_base),
			("providers.generation.path", &provider.path),
			("providers.generation.model", &provider.model),
		] {
			if value.trim().is_empty() {
				return Err(Error::Validation {
					message: format!("{label} must be non-empty when generation is enabled."),
				});
			}
		}
	}

	for (key, value) in &provider.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("providers.generation.default_headers.{key} must be a string."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let generation = &mut cfg.providers.generation;
	let key = generation.api_key.trim();

	if key.is_empty() || key == API_KEY_PLACEHOLDER {
		generation.api_key = env::var(&generation.api_key_env)
			.ok()
			.map(|value| value.trim().to_string())
			.filter(|value| !value.is_empty() && value != API_KEY_PLACEHOLDER)
			.unwrap_or_default();
	} else {
		generation.api_key = key.to_string();
	}

	generation.api_base = generation.api_base.trim_end_matches('/').to_string();
}
