pub mod catalog;
pub mod language;
pub mod normalize;
pub mod scoring;
pub mod selection;

mod error;

pub use catalog::{
	Catalog, CatalogMetadata, Category, Keyword, LoadMode, Program, ProgramRecord, RejectedEntry,
};
pub use error::{CatalogLoadError, QueryError, Result};
pub use language::{Locale, ReplyLanguage};
pub use normalize::NormalizedQuery;
pub use scoring::{MatchKind, MatchSpan, ScoredCandidate, Scorer};
pub use selection::Selection;
