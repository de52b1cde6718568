use crate::api::routes::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{CandidateDispute, DisputeState, FieldOverrides, RawRow, UrgencyTier};
use crate::service::tabular::{read_csv_rows, read_xlsx_rows, write_candidates_csv};
use crate::service::{ImportSummary, RecomputeSummary};
use axum::{
    body::Bytes,
    extract::{Json, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Header carrying the authenticated actor's user id
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Request body: raw spreadsheet rows
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub success: bool,
    pub message: String,
    pub candidates: Vec<CandidateDispute>,
}

/// Request body: candidates as reviewed by the operator
#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    pub candidates: Vec<CandidateDispute>,
}

#[derive(Debug, Serialize)]
pub struct CommitResponse {
    pub success: bool,
    pub message: String,
    pub summary: ImportSummary,
}

#[derive(Debug, Deserialize)]
pub struct ColumnMappingRequest {
    pub fields: FieldOverrides,
}

#[derive(Debug, Serialize)]
pub struct RecomputeResponse {
    pub success: bool,
    pub message: String,
    pub summary: RecomputeSummary,
}

#[derive(Debug, Deserialize)]
pub struct StateChangeRequest {
    pub state: DisputeState,
}

#[derive(Debug, Serialize)]
pub struct StateChangeResponse {
    pub success: bool,
    pub message: String,
    pub tier: Option<UrgencyTier>,
    pub business_days_remaining: Option<i32>,
}

/// Plain success / failure body
#[derive(Debug, Serialize, Deserialize)]
pub struct BasicResponse {
    pub success: bool,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::DisputeNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) | AppError::Csv(_) | AppError::Workbook(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Database(_) | AppError::Task(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let response = BasicResponse {
            success: false,
            message: format!("Error: {}", self),
        };
        (status, Json(response)).into_response()
    }
}

/// Reads the actor id; mutations are refused without one
pub fn actor_from_headers(headers: &HeaderMap) -> AppResult<i64> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or(AppError::Unauthenticated)
}

fn preview_response(candidates: Vec<CandidateDispute>) -> Response {
    let importable = candidates.iter().filter(|c| c.is_importable()).count();
    let response = PreviewResponse {
        success: true,
        message: format!("Resolved {} rows, {} importable", candidates.len(), importable),
        candidates,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// Resolves JSON rows without persisting anything
pub async fn preview_import(
    State(state): State<AppState>,
    Path(insurer_id): Path<i64>,
    Json(req): Json<PreviewRequest>,
) -> Result<Response, AppError> {
    let candidates = state.import.preview(insurer_id, req.rows).await?;
    Ok(preview_response(candidates))
}

/// Same as `preview_import`, for a raw CSV body.
/// Answers with the review table as CSV when the client accepts `text/csv`.
pub async fn preview_import_csv(
    State(state): State<AppState>,
    Path(insurer_id): Path<i64>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, AppError> {
    let rows = read_csv_rows(body.as_bytes())?;
    let candidates = state.import.preview(insurer_id, rows).await?;
    review_response(&headers, candidates)
}

/// Same as `preview_import`, for an `.xlsx` workbook body (first sheet)
pub async fn preview_import_xlsx(
    State(state): State<AppState>,
    Path(insurer_id): Path<i64>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let rows = read_xlsx_rows(&body)?;
    let candidates = state.import.preview(insurer_id, rows).await?;
    review_response(&headers, candidates)
}

fn review_response(headers: &HeaderMap, candidates: Vec<CandidateDispute>) -> Result<Response, AppError> {
    let wants_csv = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/csv"));
    if !wants_csv {
        return Ok(preview_response(candidates));
    }

    let mut table: Vec<u8> = Vec::new();
    write_candidates_csv(&candidates, &mut table)?;
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "text/csv; charset=utf-8")], table).into_response())
}

/// Persists reviewed candidates; error rows are left out
pub async fn commit_import(
    State(state): State<AppState>,
    Path(insurer_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<CommitRequest>,
) -> Result<Response, AppError> {
    let actor_id = actor_from_headers(&headers)?;
    let summary = state.import.commit(actor_id, insurer_id, &req.candidates).await?;

    let response = CommitResponse {
        success: true,
        message: format!("Imported {} glosas", summary.imported),
        summary,
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Replaces the insurer's column-label overrides
pub async fn put_column_mapping(
    State(state): State<AppState>,
    Path(insurer_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<ColumnMappingRequest>,
) -> Result<Response, AppError> {
    let actor_id = actor_from_headers(&headers)?;
    state
        .import
        .save_column_mapping(actor_id, insurer_id, &req.fields)
        .await?;

    let response = BasicResponse {
        success: true,
        message: format!("Column mapping saved ({} fields overridden)", req.fields.len()),
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Recomputes the semaphore of every active glosa
pub async fn recompute_semaphores(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let actor_id = actor_from_headers(&headers)?;
    let summary = state.semaphore.recompute_all(actor_id).await?;

    let response = RecomputeResponse {
        success: true,
        message: format!("Recomputed {} glosas", summary.updated),
        summary,
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Changes the workflow state of one glosa
pub async fn change_dispute_state(
    State(state): State<AppState>,
    Path(dispute_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<StateChangeRequest>,
) -> Result<Response, AppError> {
    let actor_id = actor_from_headers(&headers)?;
    let refreshed = state
        .semaphore
        .change_state(actor_id, dispute_id, req.state)
        .await?;

    let response = StateChangeResponse {
        success: true,
        message: format!("Glosa {} is now {}", dispute_id, req.state),
        tier: refreshed.as_ref().map(|u| u.tier),
        business_days_remaining: refreshed.as_ref().map(|u| u.business_days_remaining),
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}
