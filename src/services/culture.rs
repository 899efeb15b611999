use crate::analytics::aggregate::{self, SurveyAggregate};
use crate::db;
use crate::domain::models::{
    ActionItem, CompanyOverview, CultureScoreReport, Team, TeamMetrics,
};
use crate::services::ai::CompletionBackend;
use crate::services::parse::{self, AiAnalysis};
use crate::services::prompt;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

/// Cached reports younger than this are served without a new model call.
pub const FRESHNESS_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum CultureError {
    #[error("completion request failed: {0}")]
    Upstream(#[source] anyhow::Error),
    #[error("AI analysis returned invalid JSON format")]
    MalformedOutput { raw: String },
    #[error("AI analysis returned incomplete data structure: missing {missing}")]
    IncompleteOutput { missing: &'static str },
    #[error("no culture score available")]
    NoReport,
    /// Storage and other infrastructure failures below the pipeline.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Qualitative figures the model is trusted for. Everything countable is
/// overlaid from the aggregator.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiCompanyOverview {
    average_satisfaction: f64,
    average_work_life_balance: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiTeamMetrics {
    team: String,
    satisfaction: f64,
    work_life_balance: f64,
}

pub fn is_fresh(last_updated: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - last_updated < Duration::hours(FRESHNESS_HOURS)
}

/// Cache gate: a fresh existing report short-circuits generation unless the
/// caller forces a refresh.
fn cached_if_fresh(
    existing: Option<CultureScoreReport>,
    force_refresh: bool,
    now: DateTime<Utc>,
) -> Option<CultureScoreReport> {
    if force_refresh {
        return None;
    }
    existing.filter(|report| is_fresh(report.last_updated, now))
}

/// Full pipeline entry point. Serves a fresh cached report unless a forced
/// refresh is requested; otherwise aggregates, calls the model, merges and
/// appends a brand-new report. Nothing is persisted on a hard error.
///
/// Concurrent forced refreshes are not coordinated: both may call the model
/// and both rows land in the append-only history. Wasted cost, no corruption.
pub async fn generate_culture_score(
    pool: &PgPool,
    backend: &dyn CompletionBackend,
    force_refresh: bool,
) -> Result<CultureScoreReport, CultureError> {
    let existing = db::find_latest_culture_score(pool).await?;
    if let Some(report) = cached_if_fresh(existing, force_refresh, Utc::now()) {
        tracing::debug!(
            last_updated = %report.last_updated,
            "serving cached culture score"
        );
        return Ok(report);
    }

    // Three independent collections, read concurrently.
    let (employees, responses, surveys) = tokio::try_join!(
        db::list_employees(pool),
        db::list_responses(pool),
        db::list_surveys(pool),
    )?;

    let stats = aggregate::aggregate(&employees, &responses, &surveys);
    tracing::info!(
        total_employees = stats.total_employees,
        employees_with_responses = stats.employees_with_responses,
        "generating culture score"
    );

    let report = run_analysis(backend, &stats).await?;
    db::insert_culture_score(pool, &report).await?;
    Ok(report)
}

/// Cache read; never triggers generation.
pub async fn get_latest_culture_score(pool: &PgPool) -> Result<CultureScoreReport, CultureError> {
    db::find_latest_culture_score(pool)
        .await?
        .ok_or(CultureError::NoReport)
}

/// Prompt → completion → parse → merge, with no storage involved. One model
/// invocation per call.
pub async fn run_analysis(
    backend: &dyn CompletionBackend,
    stats: &SurveyAggregate,
) -> Result<CultureScoreReport, CultureError> {
    let user_prompt = prompt::build_user_prompt(&stats.team_bundles)?;
    let raw = backend
        .complete(prompt::SYSTEM_PROMPT, &user_prompt)
        .await
        .map_err(CultureError::Upstream)?;
    let analysis = parse::extract_analysis(&raw)?;
    merge_report(analysis, stats, Utc::now())
}

/// Overlays trusted local counts onto the AI payload. The model never
/// supplies employee counts; a team name it invents degrades to zeroed
/// counts rather than failing the whole report.
pub fn merge_report(
    analysis: AiAnalysis,
    stats: &SurveyAggregate,
    now: DateTime<Utc>,
) -> Result<CultureScoreReport, CultureError> {
    let overview: AiCompanyOverview = coerce(analysis.company_overview)?;
    let ai_teams: Vec<AiTeamMetrics> = coerce(analysis.team_metrics)?;
    let action_items: Vec<ActionItem> = coerce(analysis.action_items)?;

    let team_metrics = ai_teams
        .into_iter()
        .map(|metric| {
            let local = Team::parse(&metric.team.to_lowercase())
                .and_then(|team| stats.team_counts.get(&team));
            if local.is_none() {
                tracing::warn!(team = %metric.team, "AI metrics for unknown team, zeroing counts");
            }
            TeamMetrics {
                team: metric.team,
                total_count: local.map(|c| c.total_count).unwrap_or(0),
                responded_count: local.map(|c| c.responded_count).unwrap_or(0),
                response_rate: local
                    .map(|c| c.response_rate())
                    .unwrap_or_else(|| "0".to_string()),
                satisfaction: metric.satisfaction,
                work_life_balance: metric.work_life_balance,
            }
        })
        .collect();

    Ok(CultureScoreReport {
        company_overview: CompanyOverview {
            total_employees: stats.total_employees,
            employees_with_responses: stats.employees_with_responses,
            response_rate: stats.response_rate.clone(),
            average_satisfaction: overview.average_satisfaction,
            average_work_life_balance: overview.average_work_life_balance,
        },
        team_metrics,
        action_items,
        ai_generated: true,
        last_updated: now,
    })
}

fn coerce<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, CultureError> {
    let raw = value.to_string();
    serde_json::from_value(value).map_err(|_| CultureError::MalformedOutput { raw })
}
