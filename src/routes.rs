//! HTTP routes for the homework helper backend.
//!
//! Every handler converts its failure into an [`ApiError`], rendered as
//! `{"message": "..."}` with 400 / 404 / 500.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::ledger::{Grant, GrantOutcome, LedgerError, UserProfile};
use crate::metrics::Metrics;
use crate::server::AppContext;
use crate::tutor::{GeneratedProblem, LearningContext};

type Ctx = Arc<AppContext>;

const EXPLAIN_FAILED: &str = "AI 해설 생성 중 오류가 발생했습니다.";
const PROBLEM_FAILED: &str = "AI 문제 생성 중 오류가 발생했습니다.";

/// Handler-boundary error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// Generation API failure. Carries the user-facing message only.
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotFound(_) => Self::NotFound(e.to_string()),
            LedgerError::Repository(inner) => {
                error!(error = %inner, "repository failure");
                Self::Internal("Server error".into())
            }
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), message = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), message = %self, "request rejected");
        }
        (status, Json(serde_json::json!({ "message": self.to_string() }))).into_response()
    }
}

// ============================================================================
// Request / response shapes
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub user_id: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub user_id: Option<u64>,
    pub item_name: Option<String>,
    pub item_cost: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplainRequest {
    pub question: Option<String>,
    pub context: Option<LearningContext>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProblemRequest {
    pub context: Option<LearningContext>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: GrantOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub message: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainResponse {
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub metrics: Metrics,
    pub success_rate: f64,
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<Ctx> {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/metrics", get(metrics))
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
        .route("/api/user/update-progress", post(update_progress))
        .route("/api/user/easter-egg", post(easter_egg))
        .route("/api/shop/buy", post(buy))
        .route("/api/explain", post(explain))
        .route("/api/generate-problem", post(generate_problem))
}

/// Count the outcome, then hand the result back unchanged.
fn tally<T>(ctx: &AppContext, result: Result<T, ApiError>) -> Result<T, ApiError> {
    ctx.with_metrics(|m| match &result {
        Ok(_) => m.record_success(),
        Err(_) => m.record_failure(),
    });
    result
}

async fn status() -> &'static str {
    "homework helper backend is running"
}

async fn metrics(State(ctx): State<Ctx>) -> Json<MetricsResponse> {
    let metrics = ctx.metrics_snapshot();
    Json(MetricsResponse {
        success_rate: metrics.success_rate(),
        metrics,
    })
}

// ============================================================================
// Accounts
// ============================================================================

async fn register(
    State(ctx): State<Ctx>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let result = sign_up(&ctx, payload).map(|auth| (StatusCode::CREATED, Json(auth)));
    tally(&ctx, result)
}

async fn login(
    State(ctx): State<Ctx>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let result = sign_in(&ctx, payload).map(Json);
    tally(&ctx, result)
}

fn sign_up(
    ctx: &AppContext,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<AuthResponse, ApiError> {
    let Json(req) = payload?;
    let user = ctx.ledger.register(&req.username, &req.password)?;
    let token = issue_token(ctx, user.id)?;
    Ok(AuthResponse { token, user })
}

fn sign_in(
    ctx: &AppContext,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<AuthResponse, ApiError> {
    let Json(req) = payload?;
    let user = ctx.ledger.authenticate(&req.username, &req.password)?;
    let token = issue_token(ctx, user.id)?;
    Ok(AuthResponse { token, user })
}

fn issue_token(ctx: &AppContext, user_id: u64) -> Result<String, ApiError> {
    ctx.tokens.issue(user_id).map_err(|e| {
        error!(error = %e, user_id, "token issue failed");
        ApiError::Internal("Server error".into())
    })
}

// ============================================================================
// Progress ledger
// ============================================================================

async fn update_progress(
    State(ctx): State<Ctx>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<GrantResponse>, ApiError> {
    let result = apply_grant(&ctx, payload, Grant::Progress, "Progress updated successfully");
    tally(&ctx, result)
}

async fn easter_egg(
    State(ctx): State<Ctx>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<GrantResponse>, ApiError> {
    let result = apply_grant(&ctx, payload, Grant::EasterEgg, "Easter egg reward granted!");
    tally(&ctx, result)
}

fn apply_grant(
    ctx: &AppContext,
    payload: Result<Json<UserRequest>, JsonRejection>,
    grant: Grant,
    message: &str,
) -> Result<Json<GrantResponse>, ApiError> {
    let Json(req) = payload?;
    let user_id = req
        .user_id
        .ok_or_else(|| ApiError::Validation("User ID is required".into()))?;

    let outcome = ctx.ledger.grant(user_id, grant, Utc::now())?;
    ctx.with_metrics(Metrics::record_reward);

    Ok(Json(GrantResponse {
        message: message.to_string(),
        outcome,
    }))
}

async fn buy(
    State(ctx): State<Ctx>,
    payload: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let result = purchase(&ctx, payload);
    tally(&ctx, result)
}

fn purchase(
    ctx: &AppContext,
    payload: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let Json(req) = payload?;
    let (Some(user_id), Some(item_name), Some(cost)) = (req.user_id, req.item_name, req.item_cost)
    else {
        return Err(ApiError::Validation(
            "User ID, item name, and item cost are required".into(),
        ));
    };

    let user = ctx.ledger.purchase(user_id, &item_name, cost, Utc::now())?;
    ctx.with_metrics(Metrics::record_purchase);
    Ok(Json(PurchaseResponse {
        message: "Purchase successful!".into(),
        user,
    }))
}

// ============================================================================
// Tutoring proxy
// ============================================================================

async fn explain(
    State(ctx): State<Ctx>,
    payload: Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<Json<ExplainResponse>, ApiError> {
    let result = explain_question(&ctx, payload).await;
    tally(&ctx, result)
}

async fn explain_question(
    ctx: &AppContext,
    payload: Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<Json<ExplainResponse>, ApiError> {
    let Json(req) = payload?;
    let (Some(question), Some(context)) = (req.question, req.context) else {
        return Err(ApiError::Validation("질문과 학습 단원 정보가 필요합니다.".into()));
    };
    if question.trim().is_empty() {
        return Err(ApiError::Validation("질문과 학습 단원 정보가 필요합니다.".into()));
    }

    let generated = ctx.tutor.explain(&question, &context).await;
    ctx.with_metrics(|m| m.record_generation(generated.is_ok()));
    let explanation = generated.map_err(|e| {
        error!(error = %e, "explanation generation failed");
        ApiError::Upstream(EXPLAIN_FAILED.into())
    })?;
    Ok(Json(ExplainResponse { explanation }))
}

async fn generate_problem(
    State(ctx): State<Ctx>,
    payload: Result<Json<ProblemRequest>, JsonRejection>,
) -> Result<Json<GeneratedProblem>, ApiError> {
    let result = new_problem(&ctx, payload).await;
    tally(&ctx, result)
}

async fn new_problem(
    ctx: &AppContext,
    payload: Result<Json<ProblemRequest>, JsonRejection>,
) -> Result<Json<GeneratedProblem>, ApiError> {
    let Json(req) = payload?;
    let context = req
        .context
        .ok_or_else(|| ApiError::Validation("학습 단원 정보가 필요합니다.".into()))?;

    let generated = ctx.tutor.generate_problem(&context).await;
    ctx.with_metrics(|m| m.record_generation(generated.is_ok()));
    let problem = generated.map_err(|e| {
        error!(error = %e, "problem generation failed");
        ApiError::Upstream(PROBLEM_FAILED.into())
    })?;
    Ok(Json(problem))
}
