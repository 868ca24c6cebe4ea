//! Relevance scoring of a normalized query against every catalog program.
//!
//! Each query token contributes the weight of the strongest tier it reaches on a program:
//!
//! | tier      | condition                                             |
//! |-----------|-------------------------------------------------------|
//! | `exact`   | token equals a keyword                                |
//! | `partial` | token is a substring of a keyword, or the reverse     |
//! | `text`    | token is a substring of the folded title/description  |
//!
//! On top of the per-token sum, every multi-word keyword found verbatim as a contiguous run of
//! query tokens adds `phrase` once.

use std::sync::Arc;

use serde::Serialize;

use swarajya_config::SearchWeights;

use crate::{Catalog, Keyword, NormalizedQuery, Program};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
	Exact,
	Partial,
	Text,
	Phrase,
}

/// A run of query tokens `[start, end)` that matched a program.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MatchSpan {
	pub start: usize,
	pub end: usize,
	pub kind: MatchKind,
	/// The keyword that matched. Absent for free-text matches.
	pub keyword: Option<String>,
	pub weight: u32,
}

#[derive(Clone, Debug)]
pub struct ScoredCandidate<'a> {
	pub program: &'a Arc<Program>,
	pub score: u32,
	pub matches: Vec<MatchSpan>,
}

#[derive(Clone, Copy, Debug)]
pub struct Scorer {
	weights: SearchWeights,
}
impl Default for Scorer {
	fn default() -> Self {
		Self::new(SearchWeights::default())
	}
}
impl Scorer {
	pub fn new(weights: SearchWeights) -> Self {
		Self { weights }
	}

	/// Scores every program and returns them best first.
	///
	/// The sort is stable and input follows catalog order, so equal scores keep category
	/// declaration order, then in-category order. Zero-score programs are included at the tail.
	pub fn rank<'a>(
		&self,
		query: &NormalizedQuery,
		catalog: &'a Catalog,
	) -> Vec<ScoredCandidate<'a>> {
		let mut ranked: Vec<ScoredCandidate<'a>> = catalog
			.all_programs()
			.map(|program| {
				let (score, matches) = self.score_program(query, program);

				ScoredCandidate { program, score, matches }
			})
			.collect();

		ranked.sort_by(|a, b| b.score.cmp(&a.score));

		ranked
	}

	pub fn score_program(
		&self,
		query: &NormalizedQuery,
		program: &Program,
	) -> (u32, Vec<MatchSpan>) {
		let mut score = 0_u32;
		let mut matches = Vec::new();

		for (position, token) in query.tokens().iter().enumerate() {
			let Some((kind, keyword)) = self.best_tier(token, program) else { continue };
			let weight = self.weight(kind);

			score = score.saturating_add(weight);
			matches.push(MatchSpan {
				start: position,
				end: position + 1,
				kind,
				keyword: keyword.map(|keyword| keyword.text.clone()),
				weight,
			});
		}

		if self.weights.phrase > 0 {
			for keyword in program.keywords.iter().filter(|keyword| keyword.tokens.len() > 1) {
				let Some(start) = find_run(query.tokens(), &keyword.tokens) else { continue };

				score = score.saturating_add(self.weights.phrase);
				matches.push(MatchSpan {
					start,
					end: start + keyword.tokens.len(),
					kind: MatchKind::Phrase,
					keyword: Some(keyword.text.clone()),
					weight: self.weights.phrase,
				});
			}
		}

		(score, matches)
	}

	fn best_tier<'p>(
		&self,
		token: &str,
		program: &'p Program,
	) -> Option<(MatchKind, Option<&'p Keyword>)> {
		if let Some(keyword) = program.keywords.iter().find(|keyword| keyword.text == token) {
			return Some((MatchKind::Exact, Some(keyword)));
		}
		if self.weights.partial > 0
			&& let Some(keyword) = program
				.keywords
				.iter()
				.find(|keyword| keyword.text.contains(token) || token.contains(keyword.text.as_str()))
		{
			return Some((MatchKind::Partial, Some(keyword)));
		}
		if self.weights.text > 0 && program.search_text().contains(token) {
			return Some((MatchKind::Text, None));
		}

		None
	}

	fn weight(&self, kind: MatchKind) -> u32 {
		match kind {
			MatchKind::Exact => self.weights.exact,
			MatchKind::Partial => self.weights.partial,
			MatchKind::Text => self.weights.text,
			MatchKind::Phrase => self.weights.phrase,
		}
	}
}

fn find_run(haystack: &[String], needle: &[String]) -> Option<usize> {
	if needle.is_empty() || needle.len() > haystack.len() {
		return None;
	}

	haystack.windows(needle.len()).position(|window| window == needle)
}
