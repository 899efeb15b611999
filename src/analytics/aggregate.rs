use crate::domain::models::{EmployeeRecord, ResponseRecord, SurveyRecord, Team};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

/// Locally computed counts for one team. These are the trusted figures the
/// merger overlays onto whatever the model reports.
#[derive(Debug, Clone, Default)]
pub struct TeamCounts {
    pub total_count: i64,
    pub responded_count: i64,
}

impl TeamCounts {
    pub fn response_rate(&self) -> String {
        format_rate(self.responded_count, self.total_count)
    }
}

/// One employee's answer material for the prompt: survey title plus the
/// question/answer pairs they submitted.
#[derive(Debug, Clone, Serialize)]
pub struct SurveyAnswers {
    pub survey: String,
    pub answers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseBundle {
    pub responses: Vec<SurveyAnswers>,
}

#[derive(Debug, Clone)]
pub struct SurveyAggregate {
    pub total_employees: i64,
    pub employees_with_responses: i64,
    pub response_rate: String,
    pub team_counts: HashMap<Team, TeamCounts>,
    /// Per-team bundles restricted to employees with at least one response.
    /// BTreeMap keeps prompt ordering stable across runs.
    pub team_bundles: BTreeMap<Team, Vec<ResponseBundle>>,
}

/// `(numerator / denominator) * 100` to one decimal place, `"0"` when the
/// denominator is zero.
pub fn format_rate(numerator: i64, denominator: i64) -> String {
    if denominator == 0 {
        return "0".to_string();
    }
    format!("{:.1}", (numerator as f64 / denominator as f64) * 100.0)
}

pub fn aggregate(
    employees: &[EmployeeRecord],
    responses: &[ResponseRecord],
    surveys: &[SurveyRecord],
) -> SurveyAggregate {
    let total_employees = employees.len() as i64;

    let responders: HashSet<&str> = responses.iter().map(|r| r.email.as_str()).collect();
    let employees_with_responses = responders.len() as i64;

    let survey_titles: HashMap<Uuid, &str> = surveys
        .iter()
        .map(|s| (s.id, s.title.as_str()))
        .collect();

    let mut team_counts: HashMap<Team, TeamCounts> = HashMap::new();
    let mut team_bundles: BTreeMap<Team, Vec<ResponseBundle>> = BTreeMap::new();

    for employee in employees {
        // No team: counted in total_employees only, skipped from team rollups.
        let Some(team) = employee.team else {
            continue;
        };

        let counts = team_counts.entry(team).or_default();
        counts.total_count += 1;

        let own_responses: Vec<SurveyAnswers> = responses
            .iter()
            .filter(|r| r.email == employee.email)
            .filter_map(|r| {
                // A response to a deleted survey can't be titled; it still
                // counted toward responded_count above via the email set.
                let title = survey_titles.get(&r.survey_id)?;
                Some(SurveyAnswers {
                    survey: (*title).to_string(),
                    answers: r.answers.iter().map(|(q, a)| (q.clone(), a.clone())).collect(),
                })
            })
            .collect();

        if responders.contains(employee.email.as_str()) {
            counts.responded_count += 1;
        }

        if !own_responses.is_empty() {
            team_bundles.entry(team).or_default().push(ResponseBundle {
                responses: own_responses,
            });
        }
    }

    SurveyAggregate {
        total_employees,
        employees_with_responses,
        response_rate: format_rate(employees_with_responses, total_employees),
        team_counts,
        team_bundles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn employee(email: &str, team: Option<Team>) -> EmployeeRecord {
        EmployeeRecord {
            email: email.to_string(),
            name: email.split('@').next().unwrap_or("user").to_string(),
            team,
        }
    }

    fn response(email: &str, survey_id: Uuid) -> ResponseRecord {
        let mut answers = HashMap::new();
        answers.insert(
            "How satisfied are you?".to_string(),
            "4".to_string(),
        );
        ResponseRecord {
            email: email.to_string(),
            survey_id,
            answers,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn test_company_and_team_rates() {
        // 10 employees (4 tech, 6 sales), 6 responses from 5 distinct
        // employees (3 tech, 2 sales).
        let survey = SurveyRecord {
            id: Uuid::new_v4(),
            title: "Quarterly Pulse".to_string(),
        };
        let mut employees = Vec::new();
        for i in 0..4 {
            employees.push(employee(&format!("tech{i}@acme.io"), Some(Team::Tech)));
        }
        for i in 0..6 {
            employees.push(employee(&format!("sales{i}@acme.io"), Some(Team::Sales)));
        }
        let responses = vec![
            response("tech0@acme.io", survey.id),
            response("tech1@acme.io", survey.id),
            response("tech2@acme.io", survey.id),
            response("tech2@acme.io", survey.id), // second response, same person
            response("sales0@acme.io", survey.id),
            response("sales1@acme.io", survey.id),
        ];

        let agg = aggregate(&employees, &responses, &[survey]);

        assert_eq!(agg.total_employees, 10);
        assert_eq!(agg.employees_with_responses, 5);
        assert_eq!(agg.response_rate, "50.0");

        let tech = &agg.team_counts[&Team::Tech];
        assert_eq!(tech.total_count, 4);
        assert_eq!(tech.responded_count, 3);
        assert_eq!(tech.response_rate(), "75.0");

        let sales = &agg.team_counts[&Team::Sales];
        assert_eq!(sales.total_count, 6);
        assert_eq!(sales.responded_count, 2);
        assert_eq!(sales.response_rate(), "33.3");
    }

    #[test]
    fn test_zero_employees_does_not_divide() {
        let agg = aggregate(&[], &[], &[]);
        assert_eq!(agg.total_employees, 0);
        assert_eq!(agg.employees_with_responses, 0);
        assert_eq!(agg.response_rate, "0");
        assert_eq!(format_rate(0, 0), "0");
    }

    #[test]
    fn test_employee_without_team_counts_toward_total_only() {
        let survey = SurveyRecord {
            id: Uuid::new_v4(),
            title: "Pulse".to_string(),
        };
        let employees = vec![
            employee("a@acme.io", Some(Team::Product)),
            employee("b@acme.io", None),
        ];
        let responses = vec![response("b@acme.io", survey.id)];

        let agg = aggregate(&employees, &responses, &[survey]);

        assert_eq!(agg.total_employees, 2);
        assert_eq!(agg.employees_with_responses, 1);
        assert!(!agg.team_counts.contains_key(&Team::Sales));
        assert_eq!(agg.team_counts[&Team::Product].total_count, 1);
        assert_eq!(agg.team_counts[&Team::Product].responded_count, 0);
        // The teamless responder produces no bundle either.
        assert!(agg.team_bundles.is_empty());
    }

    #[test]
    fn test_bundles_exclude_non_responders() {
        let survey = SurveyRecord {
            id: Uuid::new_v4(),
            title: "Pulse".to_string(),
        };
        let employees = vec![
            employee("a@acme.io", Some(Team::Tech)),
            employee("b@acme.io", Some(Team::Tech)),
        ];
        let responses = vec![response("a@acme.io", survey.id)];

        let agg = aggregate(&employees, &responses, &[survey]);

        let bundles = &agg.team_bundles[&Team::Tech];
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].responses[0].survey, "Pulse");
        assert_eq!(agg.team_counts[&Team::Tech].total_count, 2);
    }

    #[test]
    fn test_response_to_deleted_survey_still_counts_responder() {
        let employees = vec![employee("a@acme.io", Some(Team::Tech))];
        let responses = vec![response("a@acme.io", Uuid::new_v4())];

        let agg = aggregate(&employees, &responses, &[]);

        assert_eq!(agg.employees_with_responses, 1);
        assert_eq!(agg.team_counts[&Team::Tech].responded_count, 1);
        assert!(agg.team_bundles.is_empty());
    }
}
