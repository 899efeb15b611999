use crate::services::culture::CultureError;
use serde_json::Value;

/// Untyped intermediate for the model's reply. The three sections are only
/// coerced into the report types at the merge boundary, so one malformed
/// nested field fails the generation instead of poisoning a saved report.
#[derive(Debug, Clone)]
pub struct AiAnalysis {
    pub company_overview: Value,
    pub team_metrics: Value,
    pub action_items: Value,
}

/// Models frequently wrap JSON replies in markdown fences despite the system
/// instruction; tolerate ```json and bare ``` wrappers, nothing else.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let body = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        return trimmed;
    };
    let body = body.trim();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parses the raw completion text and checks the three required top-level
/// sections exist. No deeper validation happens here.
pub fn extract_analysis(raw: &str) -> Result<AiAnalysis, CultureError> {
    let content = strip_code_fences(raw);

    let mut parsed: Value =
        serde_json::from_str(content).map_err(|_| CultureError::MalformedOutput {
            raw: raw.to_string(),
        })?;

    let mut take = |key: &'static str| -> Result<Value, CultureError> {
        match parsed.get_mut(key) {
            Some(value) => Ok(value.take()),
            None => Err(CultureError::IncompleteOutput { missing: key }),
        }
    };

    Ok(AiAnalysis {
        company_overview: take("companyOverview")?,
        team_metrics: take("teamMetrics")?,
        action_items: take("actionItems")?,
    })
}
