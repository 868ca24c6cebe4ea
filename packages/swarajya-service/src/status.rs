use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;

use crate::{Result, SearchRequest, SearchResponse, SwarajyaService};
use swarajya_domain::{Locale, ReplyLanguage, language};

#[derive(Clone, Debug, Serialize)]
pub struct ServiceStatus {
	pub status: &'static str,
	pub generation_configured: bool,
	pub total_categories: usize,
	pub total_programs: usize,
	pub rejected_entries: usize,
	pub catalog_version: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub loaded_at: OffsetDateTime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
	Healthy,
	Degraded,
	Disabled,
}

#[derive(Clone, Debug, Serialize)]
pub struct GenerationHealth {
	pub status: GenerationStatus,
	pub provider_id: String,
	pub model: String,
	pub message: Option<String>,
	/// Template replies keep working whatever the provider does.
	pub fallback_available: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct CategorySummary {
	pub name: String,
	pub programs: usize,
	pub titles: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CategoriesResponse {
	pub categories: Vec<CategorySummary>,
	pub total_programs: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct DebugResponse {
	pub search: SearchResponse,
	pub language: ReplyLanguage,
	pub generation_configured: bool,
	pub total_categories: usize,
	pub total_programs: usize,
}

impl SwarajyaService {
	pub fn status(&self) -> ServiceStatus {
		let catalog = self.catalog.snapshot();

		ServiceStatus {
			status: "healthy",
			generation_configured: self.cfg.providers.generation.is_configured(),
			total_categories: catalog.category_count(),
			total_programs: catalog.program_count(),
			rejected_entries: catalog.rejected().len(),
			catalog_version: catalog.metadata().version.clone(),
			loaded_at: catalog.loaded_at(),
		}
	}

	/// Sends one tiny live request to the provider.
	pub async fn generation_health(&self) -> GenerationHealth {
		let cfg = &self.cfg.providers.generation;
		let mut health = GenerationHealth {
			status: GenerationStatus::Disabled,
			provider_id: cfg.provider_id.clone(),
			model: cfg.model.clone(),
			message: None,
			fallback_available: true,
		};

		if !cfg.is_configured() {
			health.message = Some("Generation is disabled or has no API key.".to_string());

			return health;
		}

		let timeout = Duration::from_millis(cfg.timeout_ms);

		match tokio::time::timeout(timeout, self.providers.generation.ping(cfg)).await {
			Ok(Ok(_)) => health.status = GenerationStatus::Healthy,
			Ok(Err(err)) => {
				health.status = GenerationStatus::Degraded;
				health.message = Some(err.to_string());
			},
			Err(_) => {
				health.status = GenerationStatus::Degraded;
				health.message = Some("Generation request timed out.".to_string());
			},
		}

		health
	}

	pub fn categories(&self) -> CategoriesResponse {
		let catalog = self.catalog.snapshot();
		let categories = catalog
			.categories()
			.iter()
			.map(|category| CategorySummary {
				name: category.name.clone(),
				programs: category.programs.len(),
				titles: category.programs.iter().map(|program| program.title.clone()).collect(),
			})
			.collect();

		CategoriesResponse { categories, total_programs: catalog.program_count() }
	}

	/// Search output plus the context a developer needs to explain it.
	pub fn debug(&self, query: &str) -> Result<DebugResponse> {
		let search = self.search(SearchRequest { query: query.to_string(), top_k: None })?;
		let catalog = self.catalog.snapshot();

		Ok(DebugResponse {
			language: language::apparent_language(query, Locale::Auto, self.default_language()),
			search,
			generation_configured: self.cfg.providers.generation.is_configured(),
			total_categories: catalog.category_count(),
			total_programs: catalog.program_count(),
		})
	}
}
