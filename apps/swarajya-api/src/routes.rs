use axum::{
	Json, Router,
	extract::{Path, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::state::AppState;
use swarajya_service::{
	CategoriesResponse, DebugResponse, Error, GenerationHealth, QueryRequest, QueryResponse,
	ReloadReport, SearchRequest, SearchResponse, ServiceStatus,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(status))
		.route("/health", get(health))
		.route("/health/generation", get(generation_health))
		.route("/query", post(query))
		.route("/search", post(search))
		.route("/schemes", get(schemes))
		.route("/debug/{query}", get(debug))
		.layer(CorsLayer::permissive())
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new().route("/v1/admin/catalog/reload", post(reload_catalog)).with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn status(State(state): State<AppState>) -> Json<ServiceStatus> {
	Json(state.service.status())
}

async fn generation_health(State(state): State<AppState>) -> Json<GenerationHealth> {
	Json(state.service.generation_health().await)
}

async fn query(
	State(state): State<AppState>,
	Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
	let response = state.service.query(payload).await?;

	Ok(Json(response))
}

async fn search(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(payload)?;

	Ok(Json(response))
}

async fn schemes(State(state): State<AppState>) -> Json<CategoriesResponse> {
	Json(state.service.categories())
}

async fn debug(
	State(state): State<AppState>,
	Path(query): Path<String>,
) -> Result<Json<DebugResponse>, ApiError> {
	let response = state.service.debug(&query)?;

	Ok(Json(response))
}

async fn reload_catalog(State(state): State<AppState>) -> Result<Json<ReloadReport>, ApiError> {
	// File IO and JSON parsing stay off the async workers.
	let service = state.service.clone();
	let response =
		tokio::task::spawn_blocking(move || service.reload_catalog()).await.map_err(|err| {
			tracing::error!(error = %err, "Catalog reload task failed.");

			ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", err.to_string())
		})??;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: &'static str,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
		Self { status, error_code, message: message.into() }
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		let message = err.to_string();

		match err {
			Error::EmptyQuery => Self::new(StatusCode::BAD_REQUEST, "EMPTY_QUERY", message),
			Error::QueryTooShort { .. } =>
				Self::new(StatusCode::BAD_REQUEST, "QUERY_TOO_SHORT", message),
			Error::Catalog { .. } => {
				tracing::error!(error = %message, "Catalog operation failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "CATALOG_ERROR", message)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
