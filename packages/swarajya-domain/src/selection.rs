use crate::ScoredCandidate;

/// Outcome of thresholding a ranked candidate list.
#[derive(Clone, Debug)]
pub enum Selection<'a> {
	/// Nothing scored above zero. Not an error; the composer answers with an apology.
	NoMatch,
	/// Positive-score candidates, best first, never empty.
	Matched(Vec<ScoredCandidate<'a>>),
}
impl<'a> Selection<'a> {
	/// Keeps candidates with a positive score, up to `max_results`, preserving rank order.
	pub fn from_ranked(ranked: Vec<ScoredCandidate<'a>>, max_results: usize) -> Self {
		let selected: Vec<ScoredCandidate<'a>> = ranked
			.into_iter()
			.take_while(|candidate| candidate.score > 0)
			.take(max_results)
			.collect();

		if selected.is_empty() { Self::NoMatch } else { Self::Matched(selected) }
	}

	pub fn top(&self) -> Option<&ScoredCandidate<'a>> {
		match self {
			Self::NoMatch => None,
			Self::Matched(candidates) => candidates.first(),
		}
	}

	pub fn candidates(&self) -> &[ScoredCandidate<'a>] {
		match self {
			Self::NoMatch => &[],
			Self::Matched(candidates) => candidates,
		}
	}

	pub fn is_match(&self) -> bool {
		matches!(self, Self::Matched(_))
	}

	pub fn len(&self) -> usize {
		self.candidates().len()
	}

	pub fn is_empty(&self) -> bool {
		!self.is_match()
	}
}
