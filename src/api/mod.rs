use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    Catalog, CommunityGroup, FinancialInputs, HealthReport, Lender, QuizAction, QuizSessionState,
    QuizView, Resource, compute, transition, validate_state,
};

#[derive(Clone)]
struct AppState {
    catalog: Arc<Catalog>,
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum ApiQuizAction {
    #[serde(alias = "selectOption", alias = "select_option", alias = "select")]
    SelectOption { option: String },
    Next,
    #[serde(alias = "prev", alias = "back")]
    Previous,
    #[serde(alias = "restart")]
    Reset,
}

impl From<ApiQuizAction> for QuizAction {
    fn from(value: ApiQuizAction) -> Self {
        match value {
            ApiQuizAction::SelectOption { option } => QuizAction::SelectOption(option),
            ApiQuizAction::Next => QuizAction::Next,
            ApiQuizAction::Previous => QuizAction::Previous,
            ApiQuizAction::Reset => QuizAction::Reset,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuizPayload {
    #[serde(default)]
    state: Option<QuizSessionState>,
    action: ApiQuizAction,
}

/// Amount as typed by the user; JSON clients may send plain numbers.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
enum AmountField {
    Text(String),
    Number(f64),
}

impl AmountField {
    fn into_text(self) -> String {
        match self {
            AmountField::Text(text) => text,
            AmountField::Number(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HealthPayload {
    income: Option<AmountField>,
    expenses: Option<AmountField>,
    debt: Option<AmountField>,
    strict: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DirectoryQuery {
    show_all: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuizResponse {
    state: QuizSessionState,
    view: QuizView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthInputsResponse {
    income: f64,
    expenses: f64,
    debt: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthDisplayResponse {
    savings_rate: String,
    debt_to_income_ratio: String,
    emergency_fund: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    inputs: HealthInputsResponse,
    report: HealthReport,
    display: HealthDisplayResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DirectoryResponse<'a> {
    lenders: &'a [Lender],
    resources: &'a [Resource],
    show_all: bool,
    has_more_resources: bool,
    community_groups: &'a [CommunityGroup],
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run_http_server(addr: SocketAddr, catalog: Catalog) -> std::io::Result<()> {
    let app = router(catalog);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "FinWiz HTTP API listening");
    info!("local access: http://127.0.0.1:{}/", addr.port());

    axum::serve(listener, app).await
}

fn router(catalog: Catalog) -> Router {
    let state = AppState {
        catalog: Arc::new(catalog),
    };
    Router::new()
        .route("/", get(index_handler))
        .route("/api/directory", get(directory_handler))
        .route("/api/quiz", get(quiz_start_handler).post(quiz_action_handler))
        .route(
            "/api/health",
            get(health_get_handler).post(health_post_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

async fn index_handler() -> Response {
    json_response(
        StatusCode::OK,
        serde_json::json!({
            "service": "finwiz",
            "endpoints": ["/api/directory", "/api/quiz", "/api/health"],
        }),
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn directory_handler(
    State(state): State<AppState>,
    Query(query): Query<DirectoryQuery>,
) -> Response {
    let show_all = query.show_all.unwrap_or(false);
    json_response(StatusCode::OK, build_directory_response(&state.catalog, show_all))
}

async fn quiz_start_handler(State(state): State<AppState>) -> Response {
    let session = QuizSessionState::default();
    let view = QuizView::render(&state.catalog.quiz, &session);
    json_response(
        StatusCode::OK,
        QuizResponse {
            state: session,
            view,
        },
    )
}

async fn quiz_action_handler(
    State(state): State<AppState>,
    Json(payload): Json<QuizPayload>,
) -> Response {
    match apply_quiz_payload(&state.catalog, payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => {
            warn!(error = %msg, "rejected quiz action");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

async fn health_get_handler(Query(payload): Query<HealthPayload>) -> Response {
    health_handler_impl(payload)
}

async fn health_post_handler(Json(payload): Json<HealthPayload>) -> Response {
    health_handler_impl(payload)
}

fn health_handler_impl(payload: HealthPayload) -> Response {
    match build_health_response(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => {
            warn!(error = %msg, "rejected health check");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
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
fn quiz_payload_from_json(json: &str) -> Result<QuizPayload, String> {
    serde_json::from_str::<QuizPayload>(json).map_err(|e| format!("Invalid quiz JSON payload: {e}"))
}

fn apply_quiz_payload(catalog: &Catalog, payload: QuizPayload) -> Result<QuizResponse, String> {
    let bank = &catalog.quiz;
    let session = payload.state.unwrap_or_default();
    validate_state(bank, &session).map_err(|e| format!("Invalid quiz state: {e}"))?;

    let action = QuizAction::from(payload.action);
    debug!(?action, index = session.current_index, "applying quiz action");
    let next = transition(bank, session, action);
    let view = QuizView::render(bank, &next);
    Ok(QuizResponse { state: next, view })
}

fn build_health_response(payload: HealthPayload) -> Result<HealthResponse, String> {
    let text = |field: Option<AmountField>| field.map(AmountField::into_text).unwrap_or_default();
    let income = text(payload.income);
    let expenses = text(payload.expenses);
    let debt = text(payload.debt);

    let inputs = if payload.strict.unwrap_or(false) {
        FinancialInputs::parse_strict(&income, &expenses, &debt).map_err(|e| e.to_string())?
    } else {
        FinancialInputs::parse(&income, &expenses, &debt)
    };

    let report = compute(inputs);
    Ok(HealthResponse {
        inputs: HealthInputsResponse {
            income: inputs.income,
            expenses: inputs.expenses,
            debt: inputs.debt,
        },
        display: HealthDisplayResponse {
            savings_rate: report.savings_rate_display(),
            debt_to_income_ratio: report.debt_to_income_display(),
            emergency_fund: report.emergency_fund_display(),
        },
        report,
    })
}

fn build_directory_response(catalog: &Catalog, show_all: bool) -> DirectoryResponse<'_> {
    DirectoryResponse {
        lenders: &catalog.lenders,
        resources: catalog.visible_resources(show_all),
        show_all,
        has_more_resources: catalog.has_more_resources(),
        community_groups: &catalog.community_groups,
    }
}
