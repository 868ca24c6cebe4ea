use swarajya_domain::{CatalogLoadError, QueryError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Query must not be empty.")]
	EmptyQuery,
	#[error("Query must contain at least one word of {min_len} or more characters.")]
	QueryTooShort { min_len: usize },
	#[error("Catalog error: {message}")]
	Catalog { message: String },
}
impl From<QueryError> for Error {
	fn from(err: QueryError) -> Self {
		match err {
			QueryError::Empty => Self::EmptyQuery,
			QueryError::TooShort { min_len } => Self::QueryTooShort { min_len },
		}
	}
}

impl From<CatalogLoadError> for Error {
	fn from(err: CatalogLoadError) -> Self {
		Self::Catalog { message: err.to_string() }
	}
}
