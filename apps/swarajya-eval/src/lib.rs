use std::{
	fs,
	path::{Path, PathBuf},
	time::Instant,
};

use clap::Parser;
use color_eyre::eyre;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use swarajya_config::Config;
use swarajya_service::{CatalogStore, SearchRequest, SwarajyaService};

#[derive(Debug, Parser)]
#[command(
	version = swarajya_cli::VERSION,
	rename_all = "kebab",
	styles = swarajya_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[arg(long, short = 'd', value_name = "FILE")]
	pub dataset: PathBuf,
	/// Cut-off for hit@k. Defaults to `search.max_results`.
	#[arg(long, value_name = "N")]
	pub top_k: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EvalDataset {
	name: Option<String>,
	queries: Vec<EvalQuery>,
}

#[derive(Debug, Deserialize)]
struct EvalQuery {
	id: Option<String>,
	query: String,
	/// Acceptable top results. Empty means the query must not match anything.
	#[serde(default)]
	expected_titles: Vec<String>,
}

#[derive(Debug, Serialize)]
struct EvalOutput {
	dataset: EvalDatasetInfo,
	settings: EvalSettings,
	summary: EvalSummary,
	queries: Vec<QueryReport>,
}

#[derive(Debug, Serialize)]
struct EvalDatasetInfo {
	name: String,
	query_count: usize,
}

#[derive(Debug, Serialize)]
struct EvalSettings {
	config_path: String,
	catalog_path: String,
	top_k: u32,
	weights: EvalWeights,
}

#[derive(Debug, Serialize)]
struct EvalWeights {
	exact: u32,
	partial: u32,
	text: u32,
	phrase: u32,
}

#[derive(Debug, Default, PartialEq, Serialize)]
struct EvalSummary {
	match_queries: usize,
	no_match_queries: usize,
	hit_at_1: f64,
	hit_at_k: f64,
	mean_rr: f64,
	no_match_accuracy: f64,
	latency_ms_p50: f64,
	latency_ms_p95: f64,
}

#[derive(Debug, Serialize)]
struct QueryReport {
	id: String,
	query: String,
	trace_id: Option<Uuid>,
	expected_titles: Vec<String>,
	retrieved_titles: Vec<String>,
	scores: Vec<u32>,
	/// 1-based rank of the first expected title.
	first_relevant_rank: Option<usize>,
	#[serde(flatten)]
	metrics: Metrics,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<String>,
	latency_ms: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
struct Metrics {
	expects_match: bool,
	hit_at_1: bool,
	hit_at_k: bool,
	reciprocal_rank: f64,
	/// Only meaningful when no match is expected.
	no_match_correct: bool,
}

pub fn run(args: Args) -> color_eyre::Result<()> {
	let config = swarajya_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	let dataset = load_dataset(&args.dataset)?;
	let output = eval_config(&args.config, config, &dataset, args.top_k)?;
	let json = serde_json::to_string_pretty(&output)?;

	println!("{json}");

	Ok(())
}

fn load_dataset(path: &Path) -> color_eyre::Result<EvalDataset> {
	let raw = fs::read_to_string(path)?;
	let dataset: EvalDataset = serde_json::from_str(&raw)?;

	if dataset.queries.is_empty() {
		return Err(eyre::eyre!("Dataset must include at least one query."));
	}

	Ok(dataset)
}

fn eval_config(
	config_path: &Path,
	config: Config,
	dataset: &EvalDataset,
	top_k: Option<u32>,
) -> color_eyre::Result<EvalOutput> {
	let top_k = effective_top_k(top_k, config.search.max_results);
	let weights = config.search.weights;
	let settings = EvalSettings {
		config_path: config_path.display().to_string(),
		catalog_path: config.catalog.path.display().to_string(),
		top_k,
		weights: EvalWeights {
			exact: weights.exact,
			partial: weights.partial,
			text: weights.text,
			phrase: weights.phrase,
		},
	};
	let catalog = CatalogStore::open(&config.catalog)?;
	let service = SwarajyaService::new(config, catalog);
	let queries = eval_queries(&service, dataset, top_k as usize);

	Ok(EvalOutput {
		dataset: EvalDatasetInfo {
			name: dataset.name.clone().unwrap_or_else(|| "unnamed".to_string()),
			query_count: dataset.queries.len(),
		},
		settings,
		summary: summarize(&queries),
		queries,
	})
}

/// Search never returns more than `max_results`, so a larger `k` would overstate hit@k.
fn effective_top_k(requested: Option<u32>, max_results: u32) -> u32 {
	let max_results = max_results.max(1);
	let top_k = requested.unwrap_or(max_results).clamp(1, max_results);

	if let Some(requested) = requested.filter(|requested| *requested > max_results) {
		tracing::warn!(requested, max_results, "Clamped top_k to search.max_results.");
	}

	top_k
}

fn eval_queries(
	service: &SwarajyaService,
	dataset: &EvalDataset,
	top_k: usize,
) -> Vec<QueryReport> {
	let mut reports = Vec::with_capacity(dataset.queries.len());

	for (idx, query) in dataset.queries.iter().enumerate() {
		let id = query.id.clone().unwrap_or_else(|| format!("q{}", idx + 1));
		let start = Instant::now();
		let result =
			service.search(SearchRequest { query: query.query.clone(), top_k: Some(top_k) });
		let latency_ms = start.elapsed().as_secs_f64() * 1_000.0;
		let (trace_id, retrieved, scores, error) = match result {
			Ok(response) => (
				Some(response.trace_id),
				response.items.iter().map(|item| item.title.clone()).collect::<Vec<_>>(),
				response.items.iter().map(|item| item.score).collect(),
				None,
			),
			Err(err) => {
				tracing::warn!(%id, error = %err, "Evaluation query was rejected.");

				(None, Vec::new(), Vec::new(), Some(err.to_string()))
			},
		};
		let first_relevant_rank = first_relevant_rank(&retrieved, &query.expected_titles);
		let metrics = compute_metrics(
			first_relevant_rank,
			!query.expected_titles.is_empty(),
			retrieved.is_empty() && error.is_none(),
			top_k,
		);

		reports.push(QueryReport {
			id,
			query: query.query.clone(),
			trace_id,
			expected_titles: query.expected_titles.clone(),
			retrieved_titles: retrieved,
			scores,
			first_relevant_rank,
			metrics,
			error,
			latency_ms,
		});
	}

	reports
}

fn first_relevant_rank(retrieved: &[String], expected: &[String]) -> Option<usize> {
	retrieved.iter().position(|title| expected.contains(title)).map(|idx| idx + 1)
}

fn compute_metrics(
	first_relevant_rank: Option<usize>,
	expects_match: bool,
	retrieved_nothing: bool,
	top_k: usize,
) -> Metrics {
	if !expects_match {
		return Metrics { no_match_correct: retrieved_nothing, ..Default::default() };
	}

	let Some(rank) = first_relevant_rank else {
		return Metrics { expects_match, ..Default::default() };
	};

	Metrics {
		expects_match,
		hit_at_1: rank == 1,
		hit_at_k: rank <= top_k,
		reciprocal_rank: 1.0 / rank as f64,
		no_match_correct: false,
	}
}

fn summarize(reports: &[QueryReport]) -> EvalSummary {
	let matching: Vec<&Metrics> =
		reports.iter().map(|report| &report.metrics).filter(|m| m.expects_match).collect();
	let no_match: Vec<&Metrics> =
		reports.iter().map(|report| &report.metrics).filter(|m| !m.expects_match).collect();
	let mut latencies: Vec<f64> = reports.iter().map(|report| report.latency_ms).collect();

	latencies.sort_by(f64::total_cmp);

	EvalSummary {
		match_queries: matching.len(),
		no_match_queries: no_match.len(),
		hit_at_1: ratio(matching.iter().filter(|m| m.hit_at_1).count(), matching.len()),
		hit_at_k: ratio(matching.iter().filter(|m| m.hit_at_k).count(), matching.len()),
		mean_rr: mean(matching.iter().map(|m| m.reciprocal_rank), matching.len()),
		no_match_accuracy: ratio(
			no_match.iter().filter(|m| m.no_match_correct).count(),
			no_match.len(),
		),
		latency_ms_p50: percentile(&latencies, 0.50),
		latency_ms_p95: percentile(&latencies, 0.95),
	}
}

fn ratio(hits: usize, total: usize) -> f64 {
	if total == 0 { 0.0 } else { hits as f64 / total as f64 }
}

fn mean(values: impl Iterator<Item = f64>, count: usize) -> f64 {
	if count == 0 { 0.0 } else { values.sum::<f64>() / count as f64 }
}

fn percentile(values: &[f64], percentile: f64) -> f64 {
	if values.is_empty() {
		return 0.0;
	}

	let clamped = percentile.clamp(0.0, 1.0);
	let pos = clamped * (values.len() as f64 - 1.0);
	let lower = pos.floor() as usize;
	let upper = pos.ceil() as usize;

	if lower == upper {
		values[lower]
	} else {
		let weight = pos - lower as f64;

		values[lower] * (1.0 - weight) + values[upper] * weight
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use swarajya_config::{
		Catalog as CatalogConfig, Composer, LlmProviderConfig, Providers, Search, SearchWeights,
		Service,
	};
	use swarajya_domain::{Catalog, LoadMode};

	const SAMPLE_CATALOG_JSON: &str = include_str!("../../../data/schemes_database.json");

	fn sample_service() -> SwarajyaService {
		let config = Config {
			service: Service {
				http_bind: "127.0.0.1:0".to_string(),
				admin_bind: "127.0.0.1:0".to_string(),
				log_level: "info".to_string(),
			},
			catalog: CatalogConfig { path: PathBuf::from("unused.json"), strict: false },
			search: Search {
				max_results: 10,
				min_query_length: 2,
				weights: SearchWeights::default(),
			},
			composer: Composer {
				default_language: "hi".to_string(),
				fallback_field_chars: 200,
				prompt_field_chars: 600,
				related_titles: 3,
				retry_backoff_ms: 0,
			},
			providers: Providers {
				generation: LlmProviderConfig {
					enabled: false,
					provider_id: "test".to_string(),
					api_base: "http://127.0.0.1:1".to_string(),
					api_key: String::new(),
					api_key_env: "SWARAJYA_EVAL_TEST_UNSET_KEY".to_string(),
					path: "/chat/completions".to_string(),
					model: "test".to_string(),
					temperature: 0.3,
					top_p: 0.9,
					max_tokens: 300,
					timeout_ms: 1_000,
					default_headers: Default::default(),
				},
			},
		};
		let catalog = Catalog::from_json_str(SAMPLE_CATALOG_JSON, LoadMode::Strict)
			.expect("Sample must load.");
		let store = CatalogStore::with_catalog(catalog, PathBuf::from("unused.json"), LoadMode::Strict);

		SwarajyaService::new(config, store)
	}

	fn query(id: &str, query: &str, expected: &[&str]) -> EvalQuery {
		EvalQuery {
			id: Some(id.to_string()),
			query: query.to_string(),
			expected_titles: expected.iter().map(|title| title.to_string()).collect(),
		}
	}

	#[test]
	fn metrics_follow_first_relevant_rank() {
		let hit = compute_metrics(Some(1), true, false, 3);

		assert!(hit.hit_at_1 && hit.hit_at_k);
		assert_eq!(hit.reciprocal_rank, 1.0);

		let late = compute_metrics(Some(4), true, false, 3);

		assert!(!late.hit_at_1 && !late.hit_at_k);
		assert_eq!(late.reciprocal_rank, 0.25);

		let miss = compute_metrics(None, true, true, 3);

		assert_eq!(miss.reciprocal_rank, 0.0);
		assert!(compute_metrics(None, false, true, 3).no_match_correct);
		assert!(!compute_metrics(None, false, false, 3).no_match_correct);
	}

	#[test]
	fn top_k_never_exceeds_max_results() {
		assert_eq!(effective_top_k(None, 10), 10);
		assert_eq!(effective_top_k(Some(3), 10), 3);
		assert_eq!(effective_top_k(Some(50), 10), 10);
		assert_eq!(effective_top_k(Some(0), 10), 1);
	}

	#[test]
	fn percentile_interpolates() {
		assert_eq!(percentile(&[], 0.5), 0.0);
		assert_eq!(percentile(&[1.0, 3.0], 0.5), 2.0);
		assert_eq!(percentile(&[1.0, 2.0, 3.0], 1.0), 3.0);
	}

	#[test]
	fn scenario_dataset_scores_perfectly_on_sample_catalog() {
		let dataset = EvalDataset {
			name: Some("scenarios".to_string()),
			queries: vec![
				query("housing", "घर बनाने की योजना", &["प्रधानमंत्री आवास योजना (PMAY)"]),
				query("kisan", "kisan", &["पीएम किसान सम्मान निधि (PM-KISAN)"]),
				query(
					"health",
					"स्वास्थ्य योजना",
					&[
						"आयुष्मान भारत प्रधानमंत्री जन आरोग्य योजना (AB-PMJAY)",
						"जननी सुरक्षा योजना (JSY)",
					],
				),
				query("nonsense", "xyz123", &[]),
			],
		};
		let reports = eval_queries(&sample_service(), &dataset, 5);
		let summary = summarize(&reports);

		assert_eq!(summary.match_queries, 3);
		assert_eq!(summary.no_match_queries, 1);
		assert_eq!(summary.hit_at_1, 1.0);
		assert_eq!(summary.mean_rr, 1.0);
		assert_eq!(summary.no_match_accuracy, 1.0);
		assert!(reports.iter().all(|report| report.error.is_none()));
	}

	#[test]
	fn rejected_queries_are_reported_not_fatal() {
		let dataset = EvalDataset { name: None, queries: vec![query("short", "a", &["x"])] };
		let reports = eval_queries(&sample_service(), &dataset, 5);

		assert_eq!(reports.len(), 1);
		assert!(reports[0].error.is_some());
		assert!(!reports[0].metrics.hit_at_k);
	}
}
