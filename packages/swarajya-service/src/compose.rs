//! Turns a selection into the reply the user reads.
//!
//! A matched query first tries the generation provider with the top program as grounding
//! context. Every attempt runs under `providers.generation.timeout_ms`, and only a retryable
//! failure earns a single second attempt after `composer.retry_backoff_ms`. Any remaining failure,
//! including an unconfigured provider, lands on a template built from the program's own fields,
//! so a matched query always gets a non-empty reply with the program's link.

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::Instrument;
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

use crate::{Result, SwarajyaService};
use swarajya_domain::{Locale, Program, ReplyLanguage, Scorer, Selection, language};
use swarajya_providers::{Error as ProviderError, GenerationRequest};

const MAX_GENERATION_ATTEMPTS: u32 = 2;
const QUERY_ECHO_CHARS: usize = 80;
const ELLIPSIS: char = '…';

#[derive(Clone, Debug, Deserialize)]
pub struct QueryRequest {
	pub query: String,
	/// `hi`, `en`, a regional tag such as `hi-IN`, or `auto`.
	#[serde(default, alias = "language")]
	pub locale: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
	Disabled,
	Timeout,
	Status,
	Transport,
	EmptyOutput,
	InvalidResponse,
	InvalidConfig,
}
impl FallbackReason {
	pub fn from_error(err: &ProviderError) -> Self {
		match err {
			ProviderError::Disabled => Self::Disabled,
			ProviderError::Timeout => Self::Timeout,
			ProviderError::Status { .. } => Self::Status,
			ProviderError::Transport { .. } => Self::Transport,
			ProviderError::EmptyOutput => Self::EmptyOutput,
			ProviderError::SerdeJson(_) | ProviderError::InvalidResponse { .. } =>
				Self::InvalidResponse,
			ProviderError::InvalidHeaderName(_)
			| ProviderError::InvalidHeaderValue(_)
			| ProviderError::InvalidConfig { .. } => Self::InvalidConfig,
		}
	}
}

/// How the reply was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplySource {
	Generated,
	Fallback { reason: FallbackReason },
	NoMatch,
}

#[derive(Clone, Debug)]
pub struct ComposedResponse {
	pub reply: String,
	pub link: Option<String>,
	pub matched_program: Option<Arc<Program>>,
	/// Titles of further matches, best first.
	pub related: Vec<String>,
	pub language: ReplyLanguage,
	pub source: ReplySource,
}

#[derive(Clone, Debug, Serialize)]
pub struct QueryResponse {
	pub trace_id: Uuid,
	pub query: String,
	pub reply: String,
	pub link: Option<String>,
	pub matched_program: Option<String>,
	pub category: Option<String>,
	pub related: Vec<String>,
	pub language: ReplyLanguage,
	pub source: ReplySource,
}
impl QueryResponse {
	fn new(trace_id: Uuid, query: &str, composed: ComposedResponse) -> Self {
		let (matched_program, category) = match composed.matched_program {
			Some(program) => (Some(program.title.clone()), Some(program.category.clone())),
			None => (None, None),
		};

		Self {
			trace_id,
			query: query.to_string(),
			reply: composed.reply,
			link: composed.link,
			matched_program,
			category,
			related: composed.related,
			language: composed.language,
			source: composed.source,
		}
	}
}

impl SwarajyaService {
	/// Runs the full pipeline for one user question.
	///
	/// Only input validation errors are returned. Generation problems degrade to the template.
	pub async fn query(&self, req: QueryRequest) -> Result<QueryResponse> {
		let trace_id = Uuid::new_v4();
		let span = tracing::info_span!("query", %trace_id);

		self.run_query(trace_id, req).instrument(span).await
	}

	async fn run_query(&self, trace_id: Uuid, req: QueryRequest) -> Result<QueryResponse> {
		let query = self.normalize(&req.query)?;
		let language = language::apparent_language(
			query.raw(),
			Locale::from_hint(req.locale.as_deref()),
			self.default_language(),
		);
		let catalog = self.catalog.snapshot();
		let ranked = Scorer::new(self.cfg.search.weights).rank(&query, &catalog);
		let selection = Selection::from_ranked(ranked, self.cfg.search.max_results as usize);

		tracing::info!(
			tokens = query.tokens().len(),
			matches = selection.len(),
			top = selection.top().map(|top| top.program.title.as_str()).unwrap_or_default(),
			language = language.code(),
			"Selection completed."
		);

		let composed = self.compose(query.raw(), language, &selection).await;

		Ok(QueryResponse::new(trace_id, query.raw(), composed))
	}

	/// Builds the reply for an already computed selection.
	pub async fn compose(
		&self,
		raw_query: &str,
		language: ReplyLanguage,
		selection: &Selection<'_>,
	) -> ComposedResponse {
		let Some(top) = selection.top() else {
			return ComposedResponse {
				reply: no_match_reply(raw_query, language),
				link: None,
				matched_program: None,
				related: Vec::new(),
				language,
				source: ReplySource::NoMatch,
			};
		};
		let program = top.program;
		let related = selection
			.candidates()
			.iter()
			.skip(1)
			.take(self.cfg.composer.related_titles as usize)
			.map(|candidate| candidate.program.title.clone())
			.collect();
		let (reply, source) = match self.generate_reply(raw_query, language, program).await {
			Ok(reply) => (reply, ReplySource::Generated),
			Err(err) => {
				let reason = FallbackReason::from_error(&err);

				tracing::info!(
					title = %program.title,
					?reason,
					error = %err,
					"Using fallback reply."
				);

				let reply = fallback_reply(
					program,
					language,
					selection.len().saturating_sub(1),
					self.cfg.composer.fallback_field_chars as usize,
				);

				(reply, ReplySource::Fallback { reason })
			},
		};

		ComposedResponse {
			reply,
			link: program.link.clone(),
			matched_program: Some(program.clone()),
			related,
			language,
			source,
		}
	}

	pub(crate) fn default_language(&self) -> ReplyLanguage {
		ReplyLanguage::from_code(&self.cfg.composer.default_language)
			.unwrap_or(ReplyLanguage::Hindi)
	}

	async fn generate_reply(
		&self,
		raw_query: &str,
		language: ReplyLanguage,
		program: &Program,
	) -> Result<String, ProviderError> {
		let cfg = &self.cfg.providers.generation;

		if !cfg.is_configured() {
			return Err(ProviderError::Disabled);
		}

		let request = GenerationRequest::from_config(
			cfg,
			system_prompt(language).to_string(),
			user_prompt(
				raw_query,
				program,
				language,
				self.cfg.composer.prompt_field_chars as usize,
			),
		);
		let timeout = Duration::from_millis(cfg.timeout_ms);
		let backoff = Duration::from_millis(self.cfg.composer.retry_backoff_ms);
		let mut attempt = 1;

		loop {
			let call = self.providers.generation.generate(cfg, &request);
			let result = match tokio::time::timeout(timeout, call).await {
				Ok(result) => result.and_then(validate_output),
				Err(_) => Err(ProviderError::Timeout),
			};

			match result {
				Ok(reply) => return Ok(reply),
				Err(err) if err.is_retryable() && attempt < MAX_GENERATION_ATTEMPTS => {
					tracing::warn!(attempt, error = %err, "Generation attempt failed. Retrying.");
					tokio::time::sleep(backoff).await;

					attempt += 1;
				},
				Err(err) => {
					tracing::warn!(attempt, error = %err, "Generation attempt failed.");

					return Err(err);
				},
			}
		}
	}
}

struct Labels {
	intro: &'static str,
	benefits: &'static str,
	eligibility: &'static str,
	apply: &'static str,
	documents: &'static str,
	missing: &'static str,
	terminator: char,
}

const HINDI: Labels = Labels {
	intro: "आपके सवाल से जुड़ी योजना है",
	benefits: "लाभ",
	eligibility: "पात्रता",
	apply: "आवेदन कैसे करें",
	documents: "जरूरी दस्तावेज",
	missing: "उपलब्ध नहीं",
	terminator: '।',
};

const ENGLISH: Labels = Labels {
	intro: "The scheme that matches your question is",
	benefits: "Benefits",
	eligibility: "Eligibility",
	apply: "How to apply",
	documents: "Documents needed",
	missing: "not available",
	terminator: '.',
};

fn labels(language: ReplyLanguage) -> &'static Labels {
	match language {
		ReplyLanguage::Hindi => &HINDI,
		ReplyLanguage::English => &ENGLISH,
	}
}

fn system_prompt(language: ReplyLanguage) -> &'static str {
	match language {
		ReplyLanguage::Hindi =>
			"आप भारत सरकार की कल्याण योजनाओं के बारे में मदद करने वाले सहायक हैं। \
			 सरल हिंदी में छोटे वाक्यों में जवाब दें, जैसे किसी गांव के व्यक्ति से बात कर रहे हों। \
			 केवल दी गई योजना की जानकारी का उपयोग करें और कोई नया तथ्य, राशि या तारीख न जोड़ें।",
		ReplyLanguage::English =>
			"You help people in India understand government welfare schemes. \
			 Answer in plain English with short sentences. Use only the scheme details you are \
			 given and never add amounts, dates or facts that are not in them.",
	}
}

fn user_prompt(raw_query: &str, program: &Program, language: ReplyLanguage, max: usize) -> String {
	let labels = labels(language);
	let field = |value: &str| {
		if value.trim().is_empty() { labels.missing.to_string() } else { truncate_graphemes(value, max) }
	};
	let (question, details, name, description, instruction) = match language {
		ReplyLanguage::Hindi => (
			"उपयोगकर्ता का सवाल",
			"योजना की जानकारी",
			"नाम",
			"विवरण",
			"इसी जानकारी के आधार पर 120 से 180 शब्दों में बातचीत के अंदाज़ में जवाब दें। \
			 बताएं कि योजना क्या है, किसे मिलती है, क्या लाभ है और आवेदन कैसे करें।",
		),
		ReplyLanguage::English => (
			"User question",
			"Scheme details",
			"Name",
			"Description",
			"Using only these details, reply conversationally in 120 to 180 words. Explain what \
			 the scheme is, who can get it, what it gives and how to apply.",
		),
	};

	format!(
		"{question}: \"{query}\"\n\n{details}:\n{name}: {title}\n{description}: {desc}\n\
		 {eligibility}: {elig}\n{benefits}: {ben}\n{apply}: {process}\n\n{instruction}",
		query = truncate_graphemes(raw_query.trim(), max),
		title = program.title,
		desc = field(&program.description),
		eligibility = labels.eligibility,
		elig = field(&program.eligibility),
		benefits = labels.benefits,
		ben = field(&program.benefits),
		apply = labels.apply,
		process = field(&program.application_process),
	)
}

/// Deterministic reply assembled only from the program's fields.
fn fallback_reply(
	program: &Program,
	language: ReplyLanguage,
	more_matches: usize,
	max: usize,
) -> String {
	let labels = labels(language);
	let mut parts = vec![
		sentence(&format!("{}: {}", labels.intro, program.title), labels.terminator),
		sentence(&truncate_graphemes(&program.description, max), labels.terminator),
	];

	for (label, value) in [
		(labels.benefits, &program.benefits),
		(labels.eligibility, &program.eligibility),
		(labels.apply, &program.application_process),
	] {
		if value.trim().is_empty() {
			continue;
		}

		parts.push(sentence(&format!("{label}: {}", truncate_graphemes(value, max)), labels.terminator));
	}

	if !program.documents_required.is_empty() {
		let documents = truncate_graphemes(&program.documents_required.join(", "), max);

		parts.push(sentence(&format!("{}: {documents}", labels.documents), labels.terminator));
	}

	parts.push(match (language, &program.link) {
		(ReplyLanguage::Hindi, Some(link)) => format!("अधिक जानकारी के लिए {link} पर जाएं।"),
		(ReplyLanguage::Hindi, None) =>
			"अधिक जानकारी के लिए नजदीकी सरकारी कार्यालय या CSC केंद्र से संपर्क करें।".to_string(),
		(ReplyLanguage::English, Some(link)) => format!("For more details visit {link}"),
		(ReplyLanguage::English, None) =>
			"For more details contact your nearest government office or CSC centre.".to_string(),
	});

	if more_matches > 0 {
		parts.push(match language {
			ReplyLanguage::Hindi => format!("इसके अलावा {more_matches} और योजनाएं भी उपलब्ध हैं।"),
			ReplyLanguage::English => format!("{more_matches} more schemes also match your question."),
		});
	}

	parts.join(" ")
}

fn no_match_reply(raw_query: &str, language: ReplyLanguage) -> String {
	let query = truncate_graphemes(raw_query.trim(), QUERY_ECHO_CHARS);

	match language {
		ReplyLanguage::Hindi => format!(
			"'{query}' के लिए कोई सरकारी योजना नहीं मिली। कृपया अलग शब्दों में खोजें जैसे 'घर', \
			 'नौकरी', 'शिक्षा', 'स्वास्थ्य', या 'किसान'।"
		),
		ReplyLanguage::English => format!(
			"I could not find a government scheme for '{query}'. Please try other words such as \
			 'house', 'job', 'education', 'health' or 'farmer'."
		),
	}
}

fn validate_output(text: String) -> Result<String, ProviderError> {
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return Err(ProviderError::EmptyOutput);
	}

	Ok(trimmed.to_string())
}

/// Cuts `text` to at most `max` user-perceived characters, marking the cut with an ellipsis.
///
/// Counting grapheme clusters keeps Devanagari conjuncts and vowel signs attached to their base.
fn truncate_graphemes(text: &str, max: usize) -> String {
	let text = text.trim();

	if text.graphemes(true).count() <= max {
		return text.to_string();
	}

	let mut out: String = text.graphemes(true).take(max.saturating_sub(1)).collect();

	out.truncate(out.trim_end().len());
	out.push(ELLIPSIS);

	out
}

fn sentence(text: &str, terminator: char) -> String {
	let text = text.trim_end();

	if text.ends_with(['।', '.', '!', '?', ELLIPSIS]) {
		text.to_string()
	} else {
		format!("{text}{terminator}")
	}
}
