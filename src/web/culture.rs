use crate::db;
use crate::domain::models::CultureScoreReport;
use crate::report::pdf;
use crate::services::culture::{self, CultureError};
use crate::state::SharedState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(default)]
    force_refresh: bool,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/culture-score/generate", post(generate_culture_score))
        .route("/culture-score", get(get_culture_score))
        .route("/culture-score/pdf", get(download_culture_score_pdf))
        .with_state(state)
}

/// Hard pipeline errors all collapse to a generic 500 for the caller; the
/// detail (including raw model output for parse failures) goes to the log.
fn log_and_map(err: CultureError) -> StatusCode {
    match err {
        CultureError::NoReport => StatusCode::NOT_FOUND,
        CultureError::MalformedOutput { ref raw } => {
            tracing::error!(raw_output = %raw, "failed to parse AI response");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        other => {
            tracing::error!("culture score pipeline failed: {other}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn generate_culture_score(
    State(state): State<SharedState>,
    body: Option<Json<GenerateRequest>>,
) -> Result<Json<CultureScoreReport>, StatusCode> {
    let force_refresh = body.map(|Json(b)| b.force_refresh).unwrap_or(false);
    let report = culture::generate_culture_score(&state.pool, state.completions.as_ref(), force_refresh)
        .await
        .map_err(log_and_map)?;
    Ok(Json(report))
}

async fn get_culture_score(
    State(state): State<SharedState>,
) -> Result<Json<CultureScoreReport>, StatusCode> {
    let report = culture::get_latest_culture_score(&state.pool)
        .await
        .map_err(log_and_map)?;
    Ok(Json(report))
}

async fn download_culture_score_pdf(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, StatusCode> {
    let report = culture::get_latest_culture_score(&state.pool)
        .await
        .map_err(log_and_map)?;

    let branding = db::get_org_branding(&state.pool).await.map_err(|err| {
        tracing::error!("failed to load org settings: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let bytes = pdf::render_pdf(&report, &branding).map_err(|err| {
        tracing::error!("failed to render culture score PDF: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let disposition = format!(
        "attachment; filename=culture-score-{}.pdf",
        Utc::now().format("%Y-%m-%d")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
