use std::sync::Arc;

use swarajya_service::{CatalogStore, SwarajyaService};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SwarajyaService>,
}
impl AppState {
	/// Loads the catalog named by `catalog.path`. A catalog that cannot be loaded is fatal here.
	pub fn new(config: swarajya_config::Config) -> color_eyre::Result<Self> {
		let catalog = CatalogStore::open(&config.catalog)?;

		Ok(Self::from_service(SwarajyaService::new(config, catalog)))
	}

	pub fn from_service(service: SwarajyaService) -> Self {
		Self { service: Arc::new(service) }
	}
}
