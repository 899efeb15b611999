use crate::domain::models::{
    CultureScoreReport, EmployeeRecord, OrgBranding, ResponseRecord, SurveyRecord, Team,
};
use anyhow::Result;
use serde_json::Value;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

pub async fn list_employees(pool: &PgPool) -> Result<Vec<EmployeeRecord>> {
    let rows = sqlx::query("SELECT email, name, team FROM employees ORDER BY created_at ASC")
        .fetch_all(pool)
        .await?;

    let mut employees = Vec::with_capacity(rows.len());
    for row in rows {
        let team: Option<String> = row.try_get("team")?;
        employees.push(EmployeeRecord {
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            team: team.as_deref().and_then(Team::parse),
        });
    }
    Ok(employees)
}

pub async fn list_surveys(pool: &PgPool) -> Result<Vec<SurveyRecord>> {
    let rows = sqlx::query("SELECT id, title FROM surveys ORDER BY created_at ASC")
        .fetch_all(pool)
        .await?;

    let mut surveys = Vec::with_capacity(rows.len());
    for row in rows {
        surveys.push(SurveyRecord {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
        });
    }
    Ok(surveys)
}

pub async fn list_responses(pool: &PgPool) -> Result<Vec<ResponseRecord>> {
    let rows = sqlx::query(
        "SELECT email, survey_id, answers, submitted_at FROM responses ORDER BY submitted_at ASC",
    )
    .fetch_all(pool)
    .await?;

    let mut responses = Vec::with_capacity(rows.len());
    for row in rows {
        let answers: Value = row.try_get("answers")?;
        responses.push(ResponseRecord {
            email: row.try_get("email")?,
            survey_id: row.try_get::<Uuid, _>("survey_id")?,
            answers: answers_to_map(answers),
            submitted_at: row.try_get("submitted_at")?,
        });
    }
    Ok(responses)
}

/// Answer values are stored as JSON; ratings may arrive as numbers from older
/// clients, so stringify anything that is not already a string.
fn answers_to_map(answers: Value) -> HashMap<String, String> {
    match answers {
        Value::Object(map) => map
            .into_iter()
            .map(|(question, answer)| {
                let answer = match answer {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (question, answer)
            })
            .collect(),
        _ => HashMap::new(),
    }
}

/// Most recent report regardless of age, or None when no generation has run.
pub async fn find_latest_culture_score(pool: &PgPool) -> Result<Option<CultureScoreReport>> {
    let row = sqlx::query(
        "SELECT company_overview, team_metrics, action_items, ai_generated, last_updated
         FROM culture_scores ORDER BY last_updated DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    row.map(report_from_row).transpose()
}

/// Appends a new report row; history is never updated in place.
pub async fn insert_culture_score(pool: &PgPool, report: &CultureScoreReport) -> Result<()> {
    sqlx::query(
        "INSERT INTO culture_scores
            (company_overview, team_metrics, action_items, ai_generated, last_updated)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(serde_json::to_value(&report.company_overview)?)
    .bind(serde_json::to_value(&report.team_metrics)?)
    .bind(serde_json::to_value(&report.action_items)?)
    .bind(report.ai_generated)
    .bind(report.last_updated)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_org_branding(pool: &PgPool) -> Result<OrgBranding> {
    let row = sqlx::query("SELECT company_name, logo_path FROM org_settings LIMIT 1")
        .fetch_optional(pool)
        .await?;

    Ok(match row {
        Some(row) => OrgBranding {
            company_name: row.try_get("company_name")?,
            logo_path: row.try_get("logo_path")?,
        },
        None => OrgBranding {
            company_name: "Culture Pulse".to_string(),
            logo_path: None,
        },
    })
}

fn report_from_row(row: sqlx::postgres::PgRow) -> Result<CultureScoreReport> {
    Ok(CultureScoreReport {
        company_overview: serde_json::from_value(row.try_get("company_overview")?)?,
        team_metrics: serde_json::from_value(row.try_get("team_metrics")?)?,
        action_items: serde_json::from_value(row.try_get("action_items")?)?,
        ai_generated: row.try_get("ai_generated")?,
        last_updated: row.try_get("last_updated")?,
    })
}
