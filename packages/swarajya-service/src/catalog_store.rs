use std::{
	path::{Path, PathBuf},
	sync::{Arc, RwLock},
};

use swarajya_domain::{Catalog, CatalogLoadError, LoadMode};

/// Process-wide holder of the current catalog snapshot.
///
/// Readers take an `Arc` clone and never hold the lock across work, so a reload swaps the
/// reference without disturbing requests already scoring against the previous snapshot.
pub struct CatalogStore {
	path: PathBuf,
	mode: LoadMode,
	current: RwLock<Arc<Catalog>>,
}
impl CatalogStore {
	pub fn open(cfg: &swarajya_config::Catalog) -> Result<Self, CatalogLoadError> {
		let mode = LoadMode::from_strict(cfg.strict);
		let catalog = Catalog::load(&cfg.path, mode)?;

		Ok(Self::with_catalog(catalog, cfg.path.clone(), mode))
	}

	pub fn with_catalog(catalog: Catalog, path: PathBuf, mode: LoadMode) -> Self {
		Self { path, mode, current: RwLock::new(Arc::new(catalog)) }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn snapshot(&self) -> Arc<Catalog> {
		self.current.read().unwrap_or_else(|err| err.into_inner()).clone()
	}

	/// Loads the backing file afresh and swaps it in. The old snapshot stays on failure.
	pub fn reload(&self) -> Result<Arc<Catalog>, CatalogLoadError> {
		let catalog = Catalog::load(&self.path, self.mode)?;

		Ok(self.replace(catalog))
	}

	pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
		let next = Arc::new(catalog);
		let mut current = self.current.write().unwrap_or_else(|err| err.into_inner());

		*current = next.clone();

		next
	}
}
