//! Individual development plans (PDI) and their actions.

use serde::{Deserialize, Serialize};

use crate::types::{Date, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdiActionType {
    Training,
    Project,
    Mentoring,
    Rotation,
    Coaching,
    Certification,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PdiActionStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdiAction {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub action_type: PdiActionType,
    pub description: String,
    #[serde(default)]
    pub deadline: Option<Date>,
    #[serde(default)]
    pub responsible_id: Option<EntityId>,
    #[serde(default)]
    pub success_indicator: Option<String>,
    #[serde(default)]
    pub status: PdiActionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pdi {
    pub id: EntityId,
    pub user_id: EntityId,
    pub cycle_id: EntityId,
    pub period: String,
    #[serde(default)]
    pub strengths: Option<String>,
    #[serde(default)]
    pub improvements: Option<String>,
    #[serde(default)]
    pub career_goals: Option<String>,
    #[serde(default)]
    pub resources_needed: Option<String>,
    #[serde(default)]
    pub actions: Vec<PdiAction>,
}

impl PdiAction {
    /// Past its deadline and still open.
    pub fn is_overdue(&self, today: Date) -> bool {
        matches!(
            self.status,
            PdiActionStatus::Pending | PdiActionStatus::InProgress
        ) && self.deadline.is_some_and(|d| d < today)
    }
}

/// Percentage (0-100, rounded) of non-cancelled actions that are completed.
/// A plan with no countable actions is 0.
pub fn pdi_completion(pdi: &Pdi) -> u8 {
    let counted: Vec<_> = pdi
        .actions
        .iter()
        .filter(|a| a.status != PdiActionStatus::Cancelled)
        .collect();
    if counted.is_empty() {
        return 0;
    }
    let done = counted
        .iter()
        .filter(|a| a.status == PdiActionStatus::Completed)
        .count();
    (done as f64 / counted.len() as f64 * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(status: PdiActionStatus) -> PdiAction {
        PdiAction {
            id: "a".to_string(),
            action_type: PdiActionType::Training,
            description: "Course".to_string(),
            deadline: Date::from_ymd_opt(2026, 3, 1),
            responsible_id: None,
            success_indicator: None,
            status,
        }
    }

    fn pdi(actions: Vec<PdiAction>) -> Pdi {
        Pdi {
            id: "p1".to_string(),
            user_id: "u1".to_string(),
            cycle_id: "c1".to_string(),
            period: "2026".to_string(),
            strengths: None,
            improvements: None,
            career_goals: None,
            resources_needed: None,
            actions,
        }
    }

    #[test]
    fn completion_ignores_cancelled_actions() {
        let plan = pdi(vec![
            action(PdiActionStatus::Completed),
            action(PdiActionStatus::InProgress),
            action(PdiActionStatus::Pending),
            action(PdiActionStatus::Cancelled),
        ]);
        assert_eq!(pdi_completion(&plan), 33);
    }

    #[test]
    fn completion_of_empty_plan_is_zero() {
        assert_eq!(pdi_completion(&pdi(vec![])), 0);
        assert_eq!(pdi_completion(&pdi(vec![action(PdiActionStatus::Cancelled)])), 0);
    }

    #[test]
    fn overdue_only_when_open() {
        let today = Date::from_ymd_opt(2026, 4, 1).unwrap();
        assert!(action(PdiActionStatus::InProgress).is_overdue(today));
        assert!(!action(PdiActionStatus::Completed).is_overdue(today));
    }

    #[test]
    fn action_status_wire_names() {
        let a: PdiAction = serde_json::from_str(
            r#"{"id":"a","type":"mentoring","description":"Pair","status":"in-progress"}"#,
        )
        .unwrap();
        assert_eq!(a.status, PdiActionStatus::InProgress);
        assert_eq!(a.action_type, PdiActionType::Mentoring);
    }
}
