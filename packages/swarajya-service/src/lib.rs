pub mod admin;
pub mod catalog_store;
pub mod compose;
pub mod search;
pub mod status;
pub mod time_serde;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

pub use admin::ReloadReport;
pub use catalog_store::CatalogStore;
pub use compose::{ComposedResponse, FallbackReason, QueryRequest, QueryResponse, ReplySource};
pub use error::{Error, Result};
pub use search::{SearchItem, SearchRequest, SearchResponse};
pub use status::{
	CategoriesResponse, CategorySummary, DebugResponse, GenerationHealth, GenerationStatus,
	ServiceStatus,
};

use swarajya_config::{Config, LlmProviderConfig};
use swarajya_domain::{NormalizedQuery, normalize};
use swarajya_providers::{GenerationRequest, generation};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Text generation backend used by the composer.
///
/// Implementations perform a single attempt. Timeouts and retries are applied by the caller.
pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a GenerationRequest,
	) -> BoxFuture<'a, swarajya_providers::Result<String>>;

	fn ping<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
	) -> BoxFuture<'a, swarajya_providers::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub generation: Arc<dyn GenerationProvider>,
}
impl Providers {
	pub fn new(generation: Arc<dyn GenerationProvider>) -> Self {
		Self { generation }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self { generation: Arc::new(DefaultProviders) }
	}
}

pub struct SwarajyaService {
	pub cfg: Config,
	pub catalog: CatalogStore,
	pub providers: Providers,
}
impl SwarajyaService {
	pub fn new(cfg: Config, catalog: CatalogStore) -> Self {
		Self { cfg, catalog, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, catalog: CatalogStore, providers: Providers) -> Self {
		Self { cfg, catalog, providers }
	}

	pub(crate) fn normalize(&self, raw: &str) -> Result<NormalizedQuery> {
		Ok(normalize::normalize_query(raw, self.cfg.search.min_query_length as usize)?)
	}
}

struct DefaultProviders;
impl GenerationProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a GenerationRequest,
	) -> BoxFuture<'a, swarajya_providers::Result<String>> {
		Box::pin(generation::generate(cfg, request))
	}

	fn ping<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
	) -> BoxFuture<'a, swarajya_providers::Result<String>> {
		Box::pin(generation::ping(cfg))
	}
}
