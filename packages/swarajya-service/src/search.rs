use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, SwarajyaService};
use swarajya_domain::{MatchSpan, ScoredCandidate, Scorer, Selection};

#[derive(Clone, Debug, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	#[serde(default)]
	pub top_k: Option<usize>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchItem {
	pub rank: usize,
	pub title: String,
	pub category: String,
	pub description: String,
	pub link: Option<String>,
	pub score: u32,
	pub matches: Vec<MatchSpan>,
}
impl SearchItem {
	pub(crate) fn from_candidate(rank: usize, candidate: &ScoredCandidate<'_>) -> Self {
		let program = candidate.program;

		Self {
			rank,
			title: program.title.clone(),
			category: program.category.clone(),
			description: program.description.clone(),
			link: program.link.clone(),
			score: candidate.score,
			matches: candidate.matches.clone(),
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchResponse {
	pub trace_id: Uuid,
	pub query: String,
	pub tokens: Vec<String>,
	pub total_found: usize,
	pub items: Vec<SearchItem>,
}

impl SwarajyaService {
	/// Ranks the catalog for `req.query` without composing a reply.
	///
	/// `top_k` may narrow `search.max_results` but never widen it.
	pub fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let trace_id = Uuid::new_v4();
		let query = self.normalize(&req.query)?;
		let catalog = self.catalog.snapshot();
		let max_results = self.cfg.search.max_results as usize;
		let limit =
			req.top_k.filter(|top_k| *top_k > 0).map_or(max_results, |top_k| top_k.min(max_results));
		let ranked = Scorer::new(self.cfg.search.weights).rank(&query, &catalog);
		let selection = Selection::from_ranked(ranked, limit);
		let items: Vec<SearchItem> = selection
			.candidates()
			.iter()
			.enumerate()
			.map(|(idx, candidate)| SearchItem::from_candidate(idx + 1, candidate))
			.collect();

		tracing::info!(
			%trace_id,
			tokens = query.tokens().len(),
			total_found = items.len(),
			top = items.first().map(|item| item.title.as_str()).unwrap_or_default(),
			"Search completed."
		);

		Ok(SearchResponse {
			trace_id,
			query: query.raw().to_string(),
			tokens: query.tokens().to_vec(),
			total_found: items.len(),
			items,
		})
	}
}
