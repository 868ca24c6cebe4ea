pub type Result<T, E = CatalogLoadError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum CatalogLoadError {
	#[error("Failed to read catalog at {path:?}.")]
	Read { path: std::path::PathBuf, source: std::io::Error },
	#[error("Catalog is not valid JSON: {source}")]
	Parse {
		#[from]
		source: serde_json::Error,
	},
	#[error("Catalog metadata is invalid: {reason}")]
	InvalidMetadata { reason: String },
	#[error("Catalog document is missing the schemes object.")]
	MissingSchemes,
	#[error("Category {category:?} is invalid: {reason}")]
	InvalidCategory { category: String, reason: String },
	#[error("Category {category:?} has no programs.")]
	EmptyCategory { category: String },
	#[error("Entry {index} in category {category:?} is invalid: {reason}")]
	InvalidEntry { category: String, index: usize, reason: String },
	#[error("Entry {index} in category {category:?} duplicates the title {title:?}.")]
	DuplicateTitle { category: String, index: usize, title: String },
}

/// Caller input problems surfaced by the query normalizer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
	#[error("Query must not be empty.")]
	Empty,
	#[error("Query must contain at least one word of {min_len} or more characters.")]
	TooShort { min_len: usize },
}
