//! Objectives and their key results.
//!
//! An objective owns its key results: they are created and deleted with it,
//! or patched individually through [`Objective::update_key_result`].

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::check_in::CheckIn;
use crate::decimal::f64_lenient;
use crate::error::CoreError;
use crate::progress::{key_result_progress, objective_progress};
use crate::settings::ScoringConfig;
use crate::status::{classify_status, ApprovalStatus, ObjectiveStatus, ObjectiveWindow};
use crate::types::{Date, EntityId, Timestamp};

/// Upper bound for an objective's weight (percentage of the owner's plan).
pub const MAX_OBJECTIVE_WEIGHT: f64 = 100.0;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveType {
    Strategic,
    Operational,
    Innovation,
    Development,
}

/// Goal-writing methodology selected when the objective was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Methodology {
    #[default]
    Okr,
    Smart,
}

// ---------------------------------------------------------------------------
// Key results
// ---------------------------------------------------------------------------

/// A measurable sub-target of an objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct KeyResult {
    pub id: EntityId,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: String,
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(deserialize_with = "f64_lenient")]
    #[validate(range(exclusive_min = 0.0, message = "must be greater than 0"))]
    pub target: f64,
    #[serde(default, deserialize_with = "f64_lenient")]
    pub current: f64,
    #[serde(default)]
    pub unit: String,
}

/// DTO for creating a key result (no id yet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CreateKeyResult {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: String,
    #[serde(default)]
    pub metric: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "must be greater than 0"))]
    pub target: f64,
    #[serde(default)]
    pub current: f64,
    #[serde(default)]
    pub unit: String,
}

impl KeyResult {
    /// Build a key result, enforcing `target > 0`.
    pub fn new(id: impl Into<EntityId>, input: CreateKeyResult) -> Result<Self, CoreError> {
        input.validate()?;
        ensure_finite(input.current, "current")?;
        Ok(Self {
            id: id.into(),
            title: input.title,
            metric: input.metric,
            target: input.target,
            current: input.current,
            unit: input.unit,
        })
    }

    /// Re-check invariants on a key result decoded from the wire.
    pub fn ensure_valid(&self) -> Result<(), CoreError> {
        self.validate()?;
        ensure_finite(self.current, "current")
    }

    /// Record a new measured value.
    pub fn set_current(&mut self, current: f64) -> Result<(), CoreError> {
        ensure_finite(current, "current")?;
        self.current = current;
        Ok(())
    }

    pub fn progress(&self) -> Result<u8, CoreError> {
        key_result_progress(self)
    }
}

// ---------------------------------------------------------------------------
// Objectives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Objective {
    pub id: EntityId,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub objective_type: ObjectiveType,
    pub owner_id: EntityId,
    #[serde(default)]
    pub department_id: Option<EntityId>,
    pub cycle_id: EntityId,
    pub start_date: Date,
    pub end_date: Date,
    #[serde(deserialize_with = "f64_lenient")]
    #[validate(range(
        exclusive_min = 0.0,
        max = 100.0,
        message = "must be greater than 0 and at most 100"
    ))]
    pub weight: f64,
    #[serde(default)]
    pub key_results: Vec<KeyResult>,
    #[serde(default)]
    pub status: ObjectiveStatus,
    #[serde(default)]
    pub approval_status: ApprovalStatus,
    /// Cached progress as last computed by the backend. Use
    /// [`objective_progress`] for the authoritative value.
    #[serde(default, deserialize_with = "f64_lenient")]
    pub progress: f64,
    #[serde(default)]
    pub methodology: Methodology,
}

/// DTO for creating an objective, optionally seeded with key results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CreateObjective {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub objective_type: ObjectiveType,
    pub owner_id: EntityId,
    pub department_id: Option<EntityId>,
    pub cycle_id: EntityId,
    pub start_date: Date,
    pub end_date: Date,
    #[validate(range(
        exclusive_min = 0.0,
        max = 100.0,
        message = "must be greater than 0 and at most 100"
    ))]
    pub weight: f64,
    #[serde(default)]
    pub methodology: Methodology,
    #[serde(default)]
    pub key_results: Vec<CreateKeyResult>,
}

impl Objective {
    /// Build an objective from a create payload. Key results receive fresh ids.
    pub fn new(id: impl Into<EntityId>, input: CreateObjective) -> Result<Self, CoreError> {
        validate_create_objective(&input)?;

        let key_results = input
            .key_results
            .into_iter()
            .map(|kr| KeyResult::new(uuid::Uuid::new_v4().to_string(), kr))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: id.into(),
            title: input.title,
            description: input.description,
            objective_type: input.objective_type,
            owner_id: input.owner_id,
            department_id: input.department_id,
            cycle_id: input.cycle_id,
            start_date: input.start_date,
            end_date: input.end_date,
            weight: input.weight,
            key_results,
            status: ObjectiveStatus::NotStarted,
            approval_status: ApprovalStatus::Draft,
            progress: 0.0,
            methodology: input.methodology,
        })
    }

    /// Re-check invariants on an objective decoded from the wire.
    pub fn ensure_valid(&self) -> Result<(), CoreError> {
        self.validate()?;
        ensure_window(self.start_date, self.end_date)?;
        for (i, kr) in self.key_results.iter().enumerate() {
            kr.ensure_valid()
                .map_err(|e| prefix_field(e, &format!("key_results[{i}]")))?;
        }
        Ok(())
    }

    pub fn window(&self) -> ObjectiveWindow {
        ObjectiveWindow::new(self.start_date, self.end_date)
    }

    pub fn add_key_result(&mut self, input: CreateKeyResult) -> Result<&KeyResult, CoreError> {
        let kr = KeyResult::new(uuid::Uuid::new_v4().to_string(), input)?;
        self.key_results.push(kr);
        Ok(&self.key_results[self.key_results.len() - 1])
    }

    /// Remove a key result by id. Returns `true` if one was removed.
    pub fn remove_key_result(&mut self, key_result_id: &str) -> bool {
        let before = self.key_results.len();
        self.key_results.retain(|kr| kr.id != key_result_id);
        self.key_results.len() != before
    }

    /// Patch the measured value of one key result.
    pub fn update_key_result(
        &mut self,
        key_result_id: &str,
        current: f64,
    ) -> Result<(), CoreError> {
        let kr = self
            .key_results
            .iter_mut()
            .find(|kr| kr.id == key_result_id)
            .ok_or_else(|| {
                CoreError::validation(
                    "key_result_id",
                    format!("no key result '{key_result_id}' on objective '{}'", self.id),
                )
            })?;
        kr.set_current(current)
    }

    /// Return a copy with cached `progress` and `status` recomputed after a
    /// check-in has been appended to `check_ins`.
    ///
    /// The check-in log itself is never modified. A completed objective stays
    /// completed.
    pub fn apply_check_in(
        &self,
        check_ins: &[CheckIn],
        now: Timestamp,
        config: &ScoringConfig,
    ) -> Result<Objective, CoreError> {
        let progress = objective_progress(self, check_ins)?;
        let status = if self.status.is_terminal() {
            self.status
        } else {
            classify_status(
                f64::from(progress),
                &self.window(),
                now,
                config.at_risk_tolerance,
            )
        };
        Ok(Objective {
            progress: f64::from(progress),
            status,
            ..self.clone()
        })
    }
}

/// Validate a create payload, including the date window and each key result.
pub fn validate_create_objective(input: &CreateObjective) -> Result<(), CoreError> {
    input.validate()?;
    ensure_window(input.start_date, input.end_date)?;
    for (i, kr) in input.key_results.iter().enumerate() {
        kr.validate()
            .map_err(|e| prefix_field(CoreError::from(e), &format!("key_results[{i}]")))?;
    }
    Ok(())
}

fn ensure_window(start_date: Date, end_date: Date) -> Result<(), CoreError> {
    if end_date < start_date {
        return Err(CoreError::validation(
            "end_date",
            format!("must not be before start_date ({start_date})"),
        ));
    }
    Ok(())
}

fn ensure_finite(value: f64, field: &str) -> Result<(), CoreError> {
    if !value.is_finite() {
        return Err(CoreError::validation(field, "must be a finite number"));
    }
    Ok(())
}

/// Qualify the field of a validation error with a parent path.
pub(crate) fn prefix_field(err: CoreError, prefix: &str) -> CoreError {
    match err {
        CoreError::Validation { field, message } => CoreError::Validation {
            field: format!("{prefix}.{field}"),
            message,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn create_kr(target: f64, current: f64) -> CreateKeyResult {
        CreateKeyResult {
            title: "Reduce churn".to_string(),
            metric: Some("churn".to_string()),
            target,
            current,
            unit: "%".to_string(),
        }
    }

    fn create_objective() -> CreateObjective {
        CreateObjective {
            title: "Grow revenue".to_string(),
            description: None,
            objective_type: ObjectiveType::Strategic,
            owner_id: "u1".to_string(),
            department_id: Some("d1".to_string()),
            cycle_id: "c1".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
            weight: 25.0,
            methodology: Methodology::Okr,
            key_results: vec![create_kr(100.0, 50.0), create_kr(50.0, 25.0)],
        }
    }

    #[test]
    fn new_objective_starts_as_draft_and_not_started() {
        let obj = Objective::new("o1", create_objective()).unwrap();
        assert_eq!(obj.status, ObjectiveStatus::NotStarted);
        assert_eq!(obj.approval_status, ApprovalStatus::Draft);
        assert_eq!(obj.key_results.len(), 2);
        assert_ne!(obj.key_results[0].id, obj.key_results[1].id);
    }

    #[test]
    fn rejects_zero_weight() {
        let mut input = create_objective();
        input.weight = 0.0;
        assert_matches!(
            Objective::new("o1", input),
            Err(CoreError::Validation { field, .. }) if field == "weight"
        );
    }

    #[test]
    fn rejects_weight_above_hundred() {
        let mut input = create_objective();
        input.weight = 100.5;
        assert!(Objective::new("o1", input).is_err());
    }

    #[test]
    fn accepts_full_weight() {
        let mut input = create_objective();
        input.weight = MAX_OBJECTIVE_WEIGHT;
        assert!(Objective::new("o1", input).is_ok());
    }

    #[test]
    fn rejects_inverted_window() {
        let mut input = create_objective();
        input.end_date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_matches!(
            Objective::new("o1", input),
            Err(CoreError::Validation { field, .. }) if field == "end_date"
        );
    }

    #[test]
    fn key_result_error_names_nested_field() {
        let mut input = create_objective();
        input.key_results[1].target = 0.0;
        assert_matches!(
            Objective::new("o1", input),
            Err(CoreError::Validation { field, .. }) if field == "key_results[1].target"
        );
    }

    #[test]
    fn key_result_rejects_non_positive_target() {
        assert!(KeyResult::new("kr", create_kr(-5.0, 0.0)).is_err());
        assert!(KeyResult::new("kr", create_kr(0.0, 0.0)).is_err());
    }

    #[test]
    fn update_key_result_patches_current() {
        let mut obj = Objective::new("o1", create_objective()).unwrap();
        let kr_id = obj.key_results[0].id.clone();
        obj.update_key_result(&kr_id, 80.0).unwrap();
        assert_eq!(obj.key_results[0].current, 80.0);
    }

    #[test]
    fn update_unknown_key_result_fails() {
        let mut obj = Objective::new("o1", create_objective()).unwrap();
        assert!(obj.update_key_result("missing", 1.0).is_err());
    }

    #[test]
    fn add_and_remove_key_results() {
        let mut obj = Objective::new("o1", create_objective()).unwrap();
        let id = obj.add_key_result(create_kr(10.0, 1.0)).unwrap().id.clone();
        assert_eq!(obj.key_results.len(), 3);
        assert!(obj.remove_key_result(&id));
        assert!(!obj.remove_key_result(&id));
        assert_eq!(obj.key_results.len(), 2);
    }

    #[test]
    fn apply_check_in_refreshes_cached_progress_and_status() {
        let obj = Objective::new("o1", create_objective()).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let refreshed = obj
            .apply_check_in(&[], now, &ScoringConfig::default())
            .unwrap();
        assert_eq!(refreshed.progress, 50.0);
        assert_eq!(refreshed.status, ObjectiveStatus::OnTrack);
        // Original is untouched.
        assert_eq!(obj.progress, 0.0);
    }

    #[test]
    fn decodes_backend_payload_with_decimal_strings() {
        let json = r#"{
            "id": "o1",
            "title": "Launch",
            "type": "innovation",
            "owner_id": "u1",
            "cycle_id": "c1",
            "start_date": "2026-01-01",
            "end_date": "2026-03-31",
            "weight": "30.0",
            "status": "at-risk",
            "approval_status": "pending",
            "progress": "45.5",
            "key_results": [
                {"id": "k1", "title": "Ship", "target": "10", "current": "4", "unit": "features"}
            ]
        }"#;
        let obj: Objective = serde_json::from_str(json).unwrap();
        assert_eq!(obj.weight, 30.0);
        assert_eq!(obj.status, ObjectiveStatus::AtRisk);
        assert_eq!(obj.approval_status, ApprovalStatus::Pending);
        assert_eq!(obj.key_results[0].target, 10.0);
        assert!(obj.ensure_valid().is_ok());
    }
}
