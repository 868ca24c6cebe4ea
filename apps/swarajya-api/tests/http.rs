use std::{env, fs, path::PathBuf};

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::{Map, Value};
use tower::util::ServiceExt;

use swarajya_api::{routes, state::AppState};
use swarajya_config::{
	Catalog as CatalogConfig, Composer, Config, LlmProviderConfig, Providers, Search,
	SearchWeights, Service,
};
use swarajya_domain::{Catalog, LoadMode};
use swarajya_service::{CatalogStore, SwarajyaService};

const SAMPLE_CATALOG_JSON: &str = include_str!("../../../data/schemes_database.json");

fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			admin_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		catalog: CatalogConfig { path: PathBuf::from("data/schemes_database.json"), strict: false },
		search: Search { max_results: 10, min_query_length: 2, weights: SearchWeights::default() },
		composer: Composer {
			default_language: "hi".to_string(),
			fallback_field_chars: 200,
			prompt_field_chars: 600,
			related_titles: 3,
			retry_backoff_ms: 10,
		},
		providers: Providers { generation: disabled_generation() },
	}
}

fn disabled_generation() -> LlmProviderConfig {
	LlmProviderConfig {
		enabled: false,
		provider_id: "test".to_string(),
		api_base: "http://127.0.0.1:1".to_string(),
		api_key: String::new(),
		api_key_env: "SWARAJYA_API_TEST_UNSET_KEY".to_string(),
		path: "/chat/completions".to_string(),
		model: "test".to_string(),
		temperature: 0.3,
		top_p: 0.9,
		max_tokens: 300,
		timeout_ms: 1_000,
		default_headers: Map::new(),
	}
}

fn test_state() -> AppState {
	let catalog =
		Catalog::from_json_str(SAMPLE_CATALOG_JSON, LoadMode::Strict).expect("Sample must load.");
	let store = CatalogStore::with_catalog(
		catalog,
		PathBuf::from("missing/schemes_database.json"),
		LoadMode::Lenient,
	);

	AppState::from_service(SwarajyaService::new(test_config(), store))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
	let response = app.oneshot(request).await.expect("Failed to call router.");
	let status = response.status();
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = if body.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&body).expect("Failed to parse response.")
	};

	(status, json)
}

fn get(uri: &str) -> Request<Body> {
	Request::builder().uri(uri).body(Body::empty()).expect("Failed to build request.")
}

fn post_json(uri: &str, payload: Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header("content-type", "application/json")
		.body(Body::from(payload.to_string()))
		.expect("Failed to build request.")
}

#[tokio::test]
async fn health_ok() {
	let (status, _) = send(routes::router(test_state()), get("/health")).await;

	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn root_reports_catalog_counts() {
	let (status, json) = send(routes::router(test_state()), get("/")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["status"], "healthy");
	assert_eq!(json["total_categories"], 6);
	assert_eq!(json["total_programs"], 10);
	assert_eq!(json["generation_configured"], false);
	assert_eq!(json["catalog_version"], "1.2");
}

#[tokio::test]
async fn query_falls_back_when_generation_is_disabled() {
	let (status, json) =
		send(routes::router(test_state()), post_json("/query", serde_json::json!({ "query": "kisan" })))
			.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["matched_program"], "पीएम किसान सम्मान निधि (PM-KISAN)");
	assert_eq!(json["link"], "https://pmkisan.gov.in");
	assert_eq!(json["source"]["kind"], "fallback");
	assert_eq!(json["source"]["reason"], "disabled");
	assert_eq!(json["language"], "hi");
	assert!(json["trace_id"].is_string());
	assert!(!json["reply"].as_str().expect("reply must be a string").is_empty());
}

#[tokio::test]
async fn query_accepts_language_alias() {
	let payload = serde_json::json!({ "query": "kisan", "language": "en" });
	let (status, json) = send(routes::router(test_state()), post_json("/query", payload)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["language"], "en");
}

#[tokio::test]
async fn unknown_query_is_ok_with_apology() {
	let (status, json) = send(
		routes::router(test_state()),
		post_json("/query", serde_json::json!({ "query": "xyz123" })),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["source"]["kind"], "no_match");
	assert!(json["link"].is_null());
	assert!(json["matched_program"].is_null());
	assert!(json["reply"].as_str().expect("reply must be a string").contains("xyz123"));
}

#[tokio::test]
async fn blank_query_is_a_bad_request() {
	let (status, json) = send(
		routes::router(test_state()),
		post_json("/query", serde_json::json!({ "query": "   " })),
	)
	.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "EMPTY_QUERY");
}

#[tokio::test]
async fn short_search_is_a_bad_request() {
	let (status, json) = send(
		routes::router(test_state()),
		post_json("/search", serde_json::json!({ "query": "a" })),
	)
	.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "QUERY_TOO_SHORT");
}

#[tokio::test]
async fn search_returns_ranked_items() {
	let (status, json) = send(
		routes::router(test_state()),
		post_json("/search", serde_json::json!({ "query": "स्वास्थ्य योजना" })),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["items"][0]["title"], "आयुष्मान भारत प्रधानमंत्री जन आरोग्य योजना (AB-PMJAY)");
	assert_eq!(json["items"][1]["title"], "जननी सुरक्षा योजना (JSY)");
	assert_eq!(json["items"][0]["score"], json["items"][1]["score"]);
}

#[tokio::test]
async fn schemes_lists_categories_in_order() {
	let (status, json) = send(routes::router(test_state()), get("/schemes")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["categories"][0]["name"], "housing");
	assert_eq!(json["categories"][5]["name"], "pension");
	assert_eq!(json["total_programs"], 10);
}

#[tokio::test]
async fn debug_accepts_encoded_hindi_path() {
	// "घर"
	let (status, json) =
		send(routes::router(test_state()), get("/debug/%E0%A4%98%E0%A4%B0")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["search"]["query"], "घर");
	assert_eq!(json["language"], "hi");
	assert_eq!(json["search"]["items"][0]["category"], "housing");
}

#[tokio::test]
async fn generation_health_reports_disabled() {
	let (status, json) = send(routes::router(test_state()), get("/health/generation")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["status"], "disabled");
	assert_eq!(json["fallback_available"], true);
}

#[tokio::test]
async fn reload_is_only_on_the_admin_router() {
	let state = test_state();
	let (status, _) =
		send(routes::router(state.clone()), post_json("/v1/admin/catalog/reload", Value::Null))
			.await;

	assert_eq!(status, StatusCode::NOT_FOUND);

	// The store points at a file that does not exist, so the loaded snapshot must survive.
	let (status, json) = send(
		routes::admin_router(state.clone()),
		Request::builder()
			.method("POST")
			.uri("/v1/admin/catalog/reload")
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(json["error_code"], "CATALOG_ERROR");
	assert_eq!(state.service.catalog.snapshot().program_count(), 10);
}

#[tokio::test(flavor = "multi_thread")]
async fn reload_swaps_in_the_file_on_disk() {
	let path = env::temp_dir().join(format!("swarajya_api_reload_{}.json", std::process::id()));

	fs::write(
		&path,
		r#"{ "schemes": { "pension": [ { "title": "Atal Pension", "description": "Monthly pension." } ] } }"#,
	)
	.expect("Failed to write test catalog.");

	let catalog =
		Catalog::from_json_str(SAMPLE_CATALOG_JSON, LoadMode::Strict).expect("Sample must load.");
	let store = CatalogStore::with_catalog(catalog, path.clone(), LoadMode::Lenient);
	let state = AppState::from_service(SwarajyaService::new(test_config(), store));
	let (status, json) = send(
		routes::admin_router(state.clone()),
		Request::builder()
			.method("POST")
			.uri("/v1/admin/catalog/reload")
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	fs::remove_file(&path).expect("Failed to remove test catalog.");

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["programs"], 1);
	assert_eq!(json["categories"], 1);
	assert_eq!(state.service.catalog.snapshot().program_count(), 1);
}
