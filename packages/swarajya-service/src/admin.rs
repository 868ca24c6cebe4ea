use serde::Serialize;
use time::OffsetDateTime;

use crate::{Result, SwarajyaService};
use swarajya_domain::RejectedEntry;

#[derive(Clone, Debug, Serialize)]
pub struct ReloadReport {
	pub categories: usize,
	pub programs: usize,
	pub rejected: Vec<RejectedEntry>,
	#[serde(with = "crate::time_serde")]
	pub loaded_at: OffsetDateTime,
}

impl SwarajyaService {
	/// Re-reads the catalog file and swaps the snapshot. In-flight requests keep the old one.
	pub fn reload_catalog(&self) -> Result<ReloadReport> {
		let catalog = self.catalog.reload().inspect_err(|err| {
			tracing::error!(
				path = %self.catalog.path().display(),
				error = %err,
				"Catalog reload failed."
			);
		})?;

		tracing::info!(
			categories = catalog.category_count(),
			programs = catalog.program_count(),
			rejected = catalog.rejected().len(),
			"Catalog reloaded."
		);

		Ok(ReloadReport {
			categories: catalog.category_count(),
			programs: catalog.program_count(),
			rejected: catalog.rejected().to_vec(),
			loaded_at: catalog.loaded_at(),
		})
	}
}
