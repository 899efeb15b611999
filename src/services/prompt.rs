use crate::analytics::aggregate::ResponseBundle;
use crate::domain::models::Team;
use anyhow::Result;
use std::collections::BTreeMap;

/// Fixed persona for the completion request. The "valid JSON" instruction is
/// load-bearing: the parser downstream refuses anything else.
pub const SYSTEM_PROMPT: &str = "You are an expert HR analyst who provides detailed \
cultural analysis of organizations. Always respond with valid JSON.";

/// Builds the user instruction around the per-team response bundles. Counts
/// are never requested from the model; they are overlaid locally after the
/// reply is parsed.
pub fn build_user_prompt(bundles: &BTreeMap<Team, Vec<ResponseBundle>>) -> Result<String> {
    let team_list = bundles
        .keys()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let survey_data = serde_json::to_string_pretty(
        &bundles
            .iter()
            .map(|(team, bundle)| (team.as_str(), bundle))
            .collect::<BTreeMap<_, _>>(),
    )?;

    Ok(format!(
        r#"Analyze the following employee survey data and generate a comprehensive culture score report.
For each team ({team_list}), calculate:
1. Average satisfaction score (1-5)
2. Average work-life balance score (1-5)
3. Key themes in feedback

Then, provide 5 specific, actionable recommendations for management, each with relevant tags and priority levels.
Format the response as a JSON object with the following structure:
{{
    "companyOverview": {{
        "averageSatisfaction": number,
        "averageWorkLifeBalance": number
    }},
    "teamMetrics": [
        {{
            "team": string,
            "satisfaction": number,
            "workLifeBalance": number
        }}
    ],
    "actionItems": [
        {{
            "text": string,
            "tags": string[],
            "priority": "high" | "medium" | "low"
        }}
    ]
}}

Survey Data:
{survey_data}"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::aggregate::SurveyAnswers;

    fn bundle(survey: &str, question: &str, answer: &str) -> ResponseBundle {
        let mut answers = BTreeMap::new();
        answers.insert(question.to_string(), answer.to_string());
        ResponseBundle {
            responses: vec![SurveyAnswers {
                survey: survey.to_string(),
                answers,
            }],
        }
    }

    #[test]
    fn test_prompt_enumerates_present_teams_only() {
        let mut bundles = BTreeMap::new();
        bundles.insert(
            Team::Tech,
            vec![bundle("Pulse", "How is the workload?", "heavy")],
        );
        bundles.insert(
            Team::Marketing,
            vec![bundle("Pulse", "How is the workload?", "fine")],
        );

        let prompt = build_user_prompt(&bundles).unwrap();
        assert!(prompt.contains("For each team (tech, marketing)"));
        assert!(!prompt.contains("sales"));
        assert!(prompt.contains("How is the workload?"));
    }

    #[test]
    fn test_prompt_never_requests_counts() {
        let mut bundles = BTreeMap::new();
        bundles.insert(Team::Sales, vec![bundle("Pulse", "q", "a")]);

        let prompt = build_user_prompt(&bundles).unwrap();
        assert!(prompt.contains("5 specific, actionable recommendations"));
        assert!(!prompt.contains("totalEmployees"));
        assert!(!prompt.contains("respondedCount"));
        assert!(!prompt.contains("responseRate"));
    }
}
