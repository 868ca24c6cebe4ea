//! The read-only program catalog.
//!
//! The backing document maps category names to program arrays:
//!
//! ```json
//! { "metadata": { "version": "1.0" }, "schemes": { "housing": [ { "title": "..." } ] } }
//! ```
//!
//! Category order is the key order of `schemes` and program order is array order. Scoring walks
//! programs in exactly this order, which is what makes tie-breaks reproducible.

use std::{collections::HashSet, fs, path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use url::Url;

use crate::{CatalogLoadError, Result, normalize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadMode {
	/// Skip and log malformed entries, keep the rest.
	#[default]
	Lenient,
	/// Fail the whole load on the first malformed entry.
	Strict,
}
impl LoadMode {
	pub fn from_strict(strict: bool) -> Self {
		if strict { Self::Strict } else { Self::Lenient }
	}
}

/// One program entry as it appears in the backing document.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ProgramRecord {
	pub title: String,
	pub description: String,
	#[serde(default)]
	pub link: Option<String>,
	#[serde(default)]
	pub eligibility: Option<String>,
	#[serde(default)]
	pub benefits: Option<String>,
	#[serde(default)]
	pub application_process: Option<String>,
	#[serde(default)]
	pub documents_required: Vec<String>,
	#[serde(default)]
	pub keywords: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CatalogMetadata {
	#[serde(default)]
	pub version: Option<String>,
	#[serde(default)]
	pub last_updated: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Keyword {
	/// Normalized tokens joined by single spaces.
	pub text: String,
	#[serde(skip)]
	pub tokens: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Program {
	pub title: String,
	pub category: String,
	pub description: String,
	pub link: Option<String>,
	pub eligibility: String,
	pub benefits: String,
	pub application_process: String,
	pub documents_required: Vec<String>,
	pub keywords: Vec<Keyword>,
	#[serde(skip)]
	search_text: String,
}
impl Program {
	/// Validates a record and precomputes its match structures.
	pub fn from_record(category: &str, record: ProgramRecord) -> Result<Self, String> {
		let title = record.title.trim();
		let description = record.description.trim();

		if title.is_empty() {
			return Err("title must be non-empty".to_string());
		}
		if description.is_empty() {
			return Err("description must be non-empty".to_string());
		}

		let link = record.link.map(|link| link.trim().to_string()).filter(|link| !link.is_empty());
		let link = match link {
			Some(link) if is_http_url(&link) => Some(link),
			Some(link) => {
				tracing::warn!(title, %link, "Dropping program link that is not an http(s) URL.");

				None
			},
			None => None,
		};
		let mut seen = HashSet::new();
		let mut keywords = Vec::with_capacity(record.keywords.len());

		for raw in &record.keywords {
			let tokens = normalize::tokenize(raw);

			if tokens.is_empty() {
				continue;
			}

			let text = tokens.join(" ");

			if seen.insert(text.clone()) {
				keywords.push(Keyword { text, tokens });
			}
		}

		Ok(Self {
			search_text: normalize::fold(&format!("{title}\n{description}")),
			title: title.to_string(),
			category: category.to_string(),
			description: description.to_string(),
			link,
			eligibility: trimmed_or_empty(record.eligibility),
			benefits: trimmed_or_empty(record.benefits),
			application_process: trimmed_or_empty(record.application_process),
			documents_required: record
				.documents_required
				.into_iter()
				.map(|doc| doc.trim().to_string())
				.filter(|doc| !doc.is_empty())
				.collect(),
			keywords,
		})
	}

	/// Folded title and description, searched by substring.
	pub fn search_text(&self) -> &str {
		&self.search_text
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct Category {
	pub name: String,
	pub programs: Vec<Arc<Program>>,
}

/// An entry skipped by a lenient load.
#[derive(Clone, Debug, Serialize)]
pub struct RejectedEntry {
	pub category: String,
	pub index: Option<usize>,
	pub reason: String,
}

#[derive(Clone, Debug)]
pub struct Catalog {
	categories: Vec<Category>,
	metadata: CatalogMetadata,
	rejected: Vec<RejectedEntry>,
	loaded_at: OffsetDateTime,
}
impl Catalog {
	pub fn empty() -> Self {
		Self {
			categories: Vec::new(),
			metadata: CatalogMetadata::default(),
			rejected: Vec::new(),
			loaded_at: OffsetDateTime::now_utc(),
		}
	}

	pub fn load(path: &Path, mode: LoadMode) -> Result<Self> {
		let raw = fs::read_to_string(path)
			.map_err(|err| CatalogLoadError::Read { path: path.to_path_buf(), source: err })?;
		let catalog = Self::from_json_str(&raw, mode)?;

		tracing::info!(
			path = %path.display(),
			categories = catalog.category_count(),
			programs = catalog.program_count(),
			rejected = catalog.rejected.len(),
			"Catalog loaded."
		);

		Ok(catalog)
	}

	pub fn from_json_str(raw: &str, mode: LoadMode) -> Result<Self> {
		let document: Value = serde_json::from_str(raw)?;
		let Some(schemes) = document.get("schemes").and_then(Value::as_object) else {
			return Err(CatalogLoadError::MissingSchemes);
		};
		let mut builder = Builder::new(mode);
		let metadata = match document.get("metadata") {
			Some(value) if !value.is_null() => builder.metadata(value)?,
			_ => CatalogMetadata::default(),
		};

		builder.add_schemes(schemes)?;

		Ok(builder.finish(metadata))
	}

	/// Builds a catalog from already-deserialized records, in the given order.
	pub fn from_records<I>(categories: I, mode: LoadMode) -> Result<Self>
	where
		I: IntoIterator<Item = (String, Vec<ProgramRecord>)>,
	{
		let mut builder = Builder::new(mode);

		for (name, records) in categories {
			builder.add_category(&name, records.into_iter().map(Ok).collect())?;
		}

		Ok(builder.finish(CatalogMetadata::default()))
	}

	pub fn categories(&self) -> &[Category] {
		&self.categories
	}

	/// Every program in category declaration order, then in-category order.
	pub fn all_programs(&self) -> impl Iterator<Item = &Arc<Program>> + Clone + '_ {
		self.categories.iter().flat_map(|category| category.programs.iter())
	}

	pub fn get(&self, title: &str) -> Option<&Arc<Program>> {
		self.all_programs().find(|program| program.title == title)
	}

	pub fn category_count(&self) -> usize {
		self.categories.len()
	}

	pub fn program_count(&self) -> usize {
		self.categories.iter().map(|category| category.programs.len()).sum()
	}

	pub fn metadata(&self) -> &CatalogMetadata {
		&self.metadata
	}

	pub fn rejected(&self) -> &[RejectedEntry] {
		&self.rejected
	}

	pub fn loaded_at(&self) -> OffsetDateTime {
		self.loaded_at
	}
}

struct Builder {
	mode: LoadMode,
	categories: Vec<Category>,
	titles: HashSet<String>,
	rejected: Vec<RejectedEntry>,
}
impl Builder {
	fn new(mode: LoadMode) -> Self {
		Self { mode, categories: Vec::new(), titles: HashSet::new(), rejected: Vec::new() }
	}

	fn metadata(&mut self, value: &Value) -> Result<CatalogMetadata> {
		match serde_json::from_value(value.clone()) {
			Ok(metadata) => Ok(metadata),
			Err(err) => {
				self.reject(
					CatalogLoadError::InvalidMetadata { reason: err.to_string() },
					"metadata",
					None,
				)?;

				Ok(CatalogMetadata::default())
			},
		}
	}

	fn add_schemes(&mut self, schemes: &Map<String, Value>) -> Result<()> {
		for (name, value) in schemes {
			let Some(entries) = value.as_array() else {
				self.reject(
					CatalogLoadError::InvalidCategory {
						category: name.clone(),
						reason: "expected an array of programs".to_string(),
					},
					name,
					None,
				)?;

				continue;
			};
			let records = entries
				.iter()
				.map(|entry| {
					serde_json::from_value::<ProgramRecord>(entry.clone())
						.map_err(|err| err.to_string())
				})
				.collect();

			self.add_category(name, records)?;
		}

		Ok(())
	}

	fn add_category(
		&mut self,
		name: &str,
		records: Vec<Result<ProgramRecord, String>>,
	) -> Result<()> {
		let name = name.trim();

		if name.is_empty() {
			return self.reject(
				CatalogLoadError::InvalidCategory {
					category: name.to_string(),
					reason: "category name must be non-empty".to_string(),
				},
				name,
				None,
			);
		}
		if records.is_empty() {
			return self.reject(
				CatalogLoadError::EmptyCategory { category: name.to_string() },
				name,
				None,
			);
		}

		let mut programs = Vec::with_capacity(records.len());

		for (index, record) in records.into_iter().enumerate() {
			let program = match record.and_then(|record| Program::from_record(name, record)) {
				Ok(program) => program,
				Err(reason) => {
					self.reject(
						CatalogLoadError::InvalidEntry {
							category: name.to_string(),
							index,
							reason,
						},
						name,
						Some(index),
					)?;

					continue;
				},
			};

			if !self.titles.insert(program.title.clone()) {
				self.reject(
					CatalogLoadError::DuplicateTitle {
						category: name.to_string(),
						index,
						title: program.title,
					},
					name,
					Some(index),
				)?;

				continue;
			}

			programs.push(Arc::new(program));
		}

		if programs.is_empty() {
			tracing::warn!(category = name, "Every entry in the category was rejected.");

			return Ok(());
		}

		self.categories.push(Category { name: name.to_string(), programs });

		Ok(())
	}

	fn reject(
		&mut self,
		err: CatalogLoadError,
		category: &str,
		index: Option<usize>,
	) -> Result<()> {
		if self.mode == LoadMode::Strict {
			return Err(err);
		}

		tracing::warn!(category, ?index, error = %err, "Rejected catalog entry.");

		self.rejected.push(RejectedEntry {
			category: category.to_string(),
			index,
			reason: err.to_string(),
		});

		Ok(())
	}

	fn finish(self, metadata: CatalogMetadata) -> Catalog {
		Catalog {
			categories: self.categories,
			metadata,
			rejected: self.rejected,
			loaded_at: OffsetDateTime::now_utc(),
		}
	}
}

fn trimmed_or_empty(value: Option<String>) -> String {
	value.map(|value| value.trim().to_string()).unwrap_or_default()
}

fn is_http_url(link: &str) -> bool {
	match Url::parse(link) {
		Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
		Err(_) => false,
	}
}
