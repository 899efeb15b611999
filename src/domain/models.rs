use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Closed team set. Employee rows carry the team as free text; anything
/// outside this set is treated as "no team" and skipped from team rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Tech,
    Sales,
    Product,
    Marketing,
}

impl Team {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tech" => Some(Team::Tech),
            "sales" => Some(Team::Sales),
            "product" => Some(Team::Product),
            "marketing" => Some(Team::Marketing),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Tech => "tech",
            Team::Sales => "sales",
            Team::Product => "product",
            Team::Marketing => "marketing",
        }
    }

    /// Capitalized form for report headings.
    pub fn display_name(&self) -> &'static str {
        match self {
            Team::Tech => "Tech",
            Team::Sales => "Sales",
            Team::Product => "Product",
            Team::Marketing => "Marketing",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmployeeRecord {
    pub email: String,
    pub name: String,
    pub team: Option<Team>,
}

#[derive(Debug, Clone)]
pub struct SurveyRecord {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct ResponseRecord {
    pub email: String,
    pub survey_id: Uuid,
    pub answers: HashMap<String, String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn display_name(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            Priority::High => "[!]",
            Priority::Medium => "[*]",
            Priority::Low => "[.]",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyOverview {
    pub total_employees: i64,
    pub employees_with_responses: i64,
    /// Percentage with one decimal place; "0" when there are no employees.
    pub response_rate: String,
    pub average_satisfaction: f64,
    pub average_work_life_balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMetrics {
    pub team: String,
    pub total_count: i64,
    pub responded_count: i64,
    pub response_rate: String,
    pub satisfaction: f64,
    pub work_life_balance: f64,
}

/// The persisted analytics artifact: AI-scored qualitative metrics merged
/// with locally computed counts. Created wholesale per refresh, never
/// partially mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CultureScoreReport {
    pub company_overview: CompanyOverview,
    pub team_metrics: Vec<TeamMetrics>,
    pub action_items: Vec<ActionItem>,
    pub ai_generated: bool,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OrgBranding {
    pub company_name: String,
    pub logo_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_parse_round_trip() {
        for team in [Team::Tech, Team::Sales, Team::Product, Team::Marketing] {
            assert_eq!(Team::parse(team.as_str()), Some(team));
        }
        assert_eq!(Team::parse("finance"), None);
        assert_eq!(Team::parse(""), None);
    }

    #[test]
    fn test_priority_serde_lowercase() {
        let item: ActionItem =
            serde_json::from_str(r#"{"text":"do it","tags":["culture"],"priority":"high"}"#)
                .unwrap();
        assert_eq!(item.priority, Priority::High);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["priority"], "high");
    }
}
