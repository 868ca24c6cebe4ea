//! Script-aware query normalization.
//!
//! Queries arrive as Devanagari Hindi, romanized Hindi, English, or any mix of the three. Text is
//! NFKC-folded and lowercased (a no-op for Devanagari), split into UAX #29 words with punctuation
//! dropped, and each word is further split wherever the script changes without a separator, so
//! `"kisanयोजना"` yields `["kisan", "योजना"]`. Catalog keywords go through the same [`tokenize`]
//! so both sides compare surface forms in one canonical shape.

use unicode_normalization::UnicodeNormalization;
use unicode_script::{Script, UnicodeScript};
use unicode_segmentation::UnicodeSegmentation;

use crate::QueryError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedQuery {
	raw: String,
	tokens: Vec<String>,
}
impl NormalizedQuery {
	/// The query as received, kept for logging and prompting.
	pub fn raw(&self) -> &str {
		&self.raw
	}

	/// Ordered tokens. Duplicates are kept since each occurrence contributes to the score.
	pub fn tokens(&self) -> &[String] {
		&self.tokens
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}
}

/// Normalizes a raw query.
///
/// Tokens shorter than `min_len` characters are dropped. The query fails with
/// [`QueryError::TooShort`] when the trimmed input is shorter than `min_len` or when every token
/// was dropped for length. Input made only of punctuation or symbols is long enough to pass and
/// yields an empty token sequence, which matches nothing downstream.
pub fn normalize_query(raw: &str, min_len: usize) -> Result<NormalizedQuery, QueryError> {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return Err(QueryError::Empty);
	}
	if trimmed.chars().count() < min_len {
		return Err(QueryError::TooShort { min_len });
	}

	let words = tokenize(trimmed);
	let word_count = words.len();
	let tokens: Vec<String> =
		words.into_iter().filter(|token| token.chars().count() >= min_len).collect();

	if tokens.is_empty() && word_count > 0 {
		return Err(QueryError::TooShort { min_len });
	}

	Ok(NormalizedQuery { raw: raw.to_string(), tokens })
}

/// Splits text into canonical lowercase word tokens without any length filtering.
pub fn tokenize(text: &str) -> Vec<String> {
	let folded = fold(text);
	let mut out = Vec::new();

	for word in folded.unicode_words() {
		split_on_script_change(word, &mut out);
	}

	out
}

/// NFKC plus lowercase. Used for substring search over free text.
pub fn fold(text: &str) -> String {
	text.nfkc().collect::<String>().to_lowercase()
}

fn split_on_script_change(word: &str, out: &mut Vec<String>) {
	let mut current = String::with_capacity(word.len());
	let mut current_script = None;

	for ch in word.chars() {
		let script = ch.script();

		// Digits, marks and shared symbols stick to whatever run they appear in.
		if !matches!(script, Script::Common | Script::Inherited) {
			if current_script.is_some_and(|prev| prev != script) && !current.is_empty() {
				out.push(std::mem::take(&mut current));
			}

			current_script = Some(script);
		}

		current.push(ch);
	}

	if !current.is_empty() {
		out.push(current);
	}
}
