use axum::{
    Router,
    extract::{Json, Path, RawQuery, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use crate::cache::TtlCache;
use crate::core::{
    CalculatorInput, CalculatorResult, Summary, YearlyResult, encode_params, input_from_query,
    run_projection,
};
use crate::history::{FileBackend, HistoryEntry, HistoryStore};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub history_file: Option<PathBuf>,
    pub cache_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            history_file: None,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

pub struct AppState {
    history: Mutex<HistoryStore>,
    projections: Mutex<TtlCache<ProjectResponse>>,
}

impl AppState {
    pub fn new(history: HistoryStore, cache_ttl: Duration) -> Self {
        Self {
            history: Mutex::new(history),
            projections: Mutex::new(TtlCache::new(cache_ttl)),
        }
    }

    fn from_config(config: &ServerConfig) -> Self {
        let history = match &config.history_file {
            Some(path) => HistoryStore::load(FileBackend::new(path)),
            None => HistoryStore::in_memory(),
        };
        Self::new(history, config.cache_ttl)
    }
}

type SharedState = Arc<AppState>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    input: CalculatorInput,
    yearly_results: Vec<YearlyResult>,
    summary: Summary,
    share_query: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShareResponse {
    share_query: String,
    input: CalculatorInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveHistoryPayload {
    #[serde(default)]
    input: CalculatorInput,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RenamePayload {
    name: String,
}

#[derive(Debug, Serialize)]
struct SavedResponse<'a> {
    id: &'a str,
    entry: &'a HistoryEntry,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/share", get(share_handler))
        .route(
            "/api/history",
            get(history_list_handler)
                .post(history_save_handler)
                .delete(history_clear_handler),
        )
        .route(
            "/api/history/:id",
            get(history_get_handler)
                .patch(history_rename_handler)
                .delete(history_delete_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(AppState::from_config(&config));
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("compound interest API listening on http://{addr}");
    info!("local access: http://127.0.0.1:{}/api/project", config.port);

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(
    State(state): State<SharedState>,
    RawQuery(query): RawQuery,
) -> Response {
    let input = input_from_query(query.as_deref().unwrap_or_default());
    json_response(StatusCode::OK, cached_projection(&state, input))
}

async fn project_post_handler(
    State(state): State<SharedState>,
    payload: Result<Json<CalculatorInput>, JsonRejection>,
) -> Response {
    let input = match validated_input(payload) {
        Ok(input) => input,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    json_response(StatusCode::OK, cached_projection(&state, input))
}

async fn share_handler(RawQuery(query): RawQuery) -> Response {
    let input = input_from_query(query.as_deref().unwrap_or_default());
    json_response(
        StatusCode::OK,
        ShareResponse {
            share_query: encode_params(&input),
            input,
        },
    )
}

async fn history_list_handler(State(state): State<SharedState>) -> Response {
    let history = lock(&state.history);
    json_response(StatusCode::OK, history.entries())
}

async fn history_save_handler(
    State(state): State<SharedState>,
    payload: Result<Json<SaveHistoryPayload>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("Invalid API JSON payload: {}", rejection.body_text()),
            );
        }
    };
    if let Err(err) = payload.input.validate() {
        return error_response(StatusCode::BAD_REQUEST, &err.to_string());
    }

    let summary = run_projection(&payload.input).summary;
    let mut history = lock(&state.history);
    let id = history.save_entry(payload.input, summary, payload.name);
    match history.get_entry(&id) {
        Some(entry) => json_response(StatusCode::CREATED, SavedResponse { id: &id, entry }),
        None => error_response(StatusCode::INTERNAL_SERVER_ERROR, "entry was not saved"),
    }
}

async fn history_clear_handler(State(state): State<SharedState>) -> Response {
    lock(&state.history).clear();
    StatusCode::NO_CONTENT.into_response()
}

async fn history_get_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Response {
    let history = lock(&state.history);
    match history.get_entry(&id) {
        Some(entry) => json_response(StatusCode::OK, entry),
        None => error_response(StatusCode::NOT_FOUND, "history entry not found"),
    }
}

async fn history_rename_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<RenamePayload>, JsonRejection>,
) -> Response {
    let Ok(Json(payload)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "expected JSON body {\"name\": ...}");
    };
    let mut history = lock(&state.history);
    if !history.rename_entry(&id, payload.name) {
        return error_response(StatusCode::NOT_FOUND, "history entry not found");
    }
    match history.get_entry(&id) {
        Some(entry) => json_response(StatusCode::OK, entry),
        None => error_response(StatusCode::NOT_FOUND, "history entry not found"),
    }
}

async fn history_delete_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Response {
    if lock(&state.history).delete_entry(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(StatusCode::NOT_FOUND, "history entry not found")
    }
}

fn validated_input(
    payload: Result<Json<CalculatorInput>, JsonRejection>,
) -> Result<CalculatorInput, String> {
    let Json(input) =
        payload.map_err(|e| format!("Invalid API JSON payload: {}", e.body_text()))?;
    input.validate().map_err(|e| e.to_string())?;
    Ok(input)
}

fn cached_projection(state: &AppState, input: CalculatorInput) -> ProjectResponse {
    // CalculatorInput always serializes; the fallback key just bypasses reuse.
    let key = serde_json::to_string(&input).unwrap_or_else(|_| encode_params(&input));
    if let Some(response) = lock(&state.projections).get(&key) {
        return response;
    }

    // Computed without holding the lock so one slow projection never blocks
    // other requests.
    let response = build_project_response(input);
    lock(&state.projections).insert(&key, response.clone());
    response
}

fn build_project_response(input: CalculatorInput) -> ProjectResponse {
    let CalculatorResult {
        yearly_results,
        summary,
    } = run_projection(&input);
    ProjectResponse {
        share_query: encode_params(&input),
        input,
        yearly_results,
        summary,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CompoundFrequency;
    use serde_json::Value;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn test_state() -> SharedState {
        Arc::new(AppState::new(HistoryStore::in_memory(), DEFAULT_CACHE_TTL))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn json_payload(json: &str) -> Result<Json<CalculatorInput>, JsonRejection> {
        let input = serde_json::from_str::<CalculatorInput>(json).expect("test payload parses");
        Ok(Json(input))
    }

    #[test]
    fn validated_input_fills_defaults_from_partial_json() {
        let input = validated_input(json_payload(r#"{"principal": 2000, "years": 5}"#))
            .expect("valid input");
        assert_approx(input.principal, 2_000.0);
        assert_eq!(input.years, 5);
        assert_eq!(input.compound_frequency, CompoundFrequency::Monthly);
    }

    #[test]
    fn validated_input_rejects_out_of_range_rate() {
        let err = validated_input(json_payload(r#"{"annualRate": 250}"#))
            .expect_err("must reject rate");
        assert!(err.contains("annualRate"));
    }

    #[test]
    fn project_response_serialization_contains_expected_fields() {
        let response = build_project_response(CalculatorInput::default());
        let value = serde_json::to_value(&response).expect("serialize");

        assert_eq!(value["shareQuery"], "p=100000&r=4&y=30&f=m");
        assert_eq!(value["yearlyResults"].as_array().map(Vec::len), Some(30));
        assert!(value["yearlyResults"][0]["simpleInterestBalance"].is_number());
        assert!(value["summary"]["returnMultiple"].is_number());
        assert_eq!(value["input"]["compoundFrequency"], "monthly");
    }

    #[test]
    fn cached_projection_reuses_entry_for_same_input() {
        let state = test_state();
        let first = cached_projection(&state, CalculatorInput::default());
        let second = cached_projection(&state, CalculatorInput::default());
        assert_eq!(first.share_query, second.share_query);
        assert_eq!(lock(&state.projections).len(), 1);
    }

    #[tokio::test]
    async fn project_get_decodes_share_query() {
        let response = project_get_handler(
            State(test_state()),
            RawQuery(Some("p=5000&r=10&y=1&f=y".to_string())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );

        let body = body_json(response).await;
        let years = body["yearlyResults"].as_array().expect("array");
        assert_eq!(years.len(), 1);
        assert_approx(years[0]["endBalance"].as_f64().unwrap_or_default(), 5_500.0);
    }

    #[tokio::test]
    async fn project_get_survives_overflowing_query() {
        let state = test_state();
        let response = project_get_handler(
            State(Arc::clone(&state)),
            RawQuery(Some("p=1e300&r=200&y=100&f=d".to_string())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["yearlyResults"].as_array().map(Vec::len), Some(100));
        // Non-finite amounts serialize as null.
        let final_amount = &body["summary"]["finalAmount"];
        assert!(final_amount.is_null() || final_amount.as_f64().is_some_and(f64::is_finite));
        let doubling_count = body["summary"]["doublingCount"].as_u64().expect("count");
        assert!(doubling_count <= 1_024);

        // The cache lock was released and later requests still go through.
        let response = project_get_handler(State(state), RawQuery(None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn project_get_accepts_start_year_past_horizon() {
        let response = project_get_handler(
            State(test_state()),
            RawQuery(Some("p=1000&r=0&y=5&f=y&a=100&as=50".to_string())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["input"]["additionalStartYear"], 50);
        assert_approx(
            body["summary"]["totalPrincipal"].as_f64().unwrap_or_default(),
            1_000.0,
        );
        assert_approx(
            body["summary"]["finalAmount"].as_f64().unwrap_or_default(),
            1_000.0,
        );
    }

    #[tokio::test]
    async fn share_handler_canonicalizes_query() {
        let response = share_handler(RawQuery(Some("f=zzz&r=6&p=2500".to_string()))).await;
        let body = body_json(response).await;
        assert_eq!(body["shareQuery"], "p=2500&r=6&y=30&f=m");
    }

    #[tokio::test]
    async fn project_post_rejects_invalid_input() {
        let response = project_post_handler(
            State(test_state()),
            json_payload(r#"{"years": 0}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap_or_default().contains("years"));
    }

    #[tokio::test]
    async fn history_save_rename_delete_flow() {
        let state = test_state();
        let payload = serde_json::from_str::<SaveHistoryPayload>(
            r#"{"input": {"principal": 1000, "years": 10}, "name": "first"}"#,
        )
        .expect("payload parses");

        let response = history_save_handler(State(Arc::clone(&state)), Ok(Json(payload))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        let id = body["id"].as_str().expect("id").to_string();
        assert_eq!(body["entry"]["name"], "first");

        let response = history_rename_handler(
            State(Arc::clone(&state)),
            Path(id.clone()),
            Ok(Json(RenamePayload {
                name: "renamed".to_string(),
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["name"], "renamed");

        let response = history_list_handler(State(Arc::clone(&state))).await;
        assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(1));

        let response = history_delete_handler(State(Arc::clone(&state)), Path(id.clone())).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = history_get_handler(State(state), Path(id)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
