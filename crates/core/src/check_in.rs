//! Check-ins: the append-only progress log of an objective.

use serde::{Deserialize, Serialize};

use crate::decimal::{f64_lenient, timestamp_lenient};
use crate::error::CoreError;
use crate::threshold_validation::validate_percentage;
use crate::types::{EntityId, Timestamp};

/// A timestamped progress report against an objective. Immutable once
/// created; corrections are new check-ins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: EntityId,
    pub objective_id: EntityId,
    pub user_id: EntityId,
    #[serde(deserialize_with = "f64_lenient")]
    pub progress: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub previous_progress: f64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub blockers: Option<String>,
    #[serde(deserialize_with = "timestamp_lenient")]
    pub created_at: Timestamp,
}

/// DTO for creating a check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCheckIn {
    pub objective_id: EntityId,
    pub user_id: EntityId,
    pub progress: f64,
    pub previous_progress: f64,
    pub comment: Option<String>,
    pub blockers: Option<String>,
}

impl CreateCheckIn {
    pub fn ensure_valid(&self) -> Result<(), CoreError> {
        validate_percentage(self.progress, "progress")?;
        validate_percentage(self.previous_progress, "previous_progress")
    }
}

impl CheckIn {
    pub fn new(
        id: impl Into<EntityId>,
        input: CreateCheckIn,
        created_at: Timestamp,
    ) -> Result<Self, CoreError> {
        input.ensure_valid()?;
        Ok(Self {
            id: id.into(),
            objective_id: input.objective_id,
            user_id: input.user_id,
            progress: input.progress,
            previous_progress: input.previous_progress,
            comment: input.comment,
            blockers: input.blockers,
            created_at,
        })
    }

    /// Change in progress reported by this check-in (may be negative).
    pub fn delta(&self) -> f64 {
        self.progress - self.previous_progress
    }

    pub fn has_blockers(&self) -> bool {
        self.blockers
            .as_deref()
            .is_some_and(|b| !b.trim().is_empty())
    }
}

/// The most recent check-in for an objective, by `created_at`.
///
/// Ties keep the later entry in the slice.
pub fn latest_check_in<'a>(check_ins: &'a [CheckIn], objective_id: &str) -> Option<&'a CheckIn> {
    check_ins
        .iter()
        .filter(|c| c.objective_id == objective_id)
        .max_by_key(|c| c.created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn create(progress: f64) -> CreateCheckIn {
        CreateCheckIn {
            objective_id: "o1".to_string(),
            user_id: "u1".to_string(),
            progress,
            previous_progress: 20.0,
            comment: None,
            blockers: Some("  ".to_string()),
        }
    }

    fn at(day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn new_validates_progress_range() {
        assert!(CheckIn::new("c1", create(45.0), at(1)).is_ok());
        assert!(CheckIn::new("c1", create(101.0), at(1)).is_err());
        assert!(CheckIn::new("c1", create(-1.0), at(1)).is_err());
    }

    #[test]
    fn delta_and_blank_blockers() {
        let c = CheckIn::new("c1", create(45.0), at(1)).unwrap();
        assert_eq!(c.delta(), 25.0);
        assert!(!c.has_blockers());
    }

    #[test]
    fn decodes_backend_payload_with_naive_timestamp() {
        let json = r#"{
            "id": "ci1", "objective_id": "o1", "user_id": "u1",
            "progress": "55.00", "previous_progress": "40.00",
            "comment": null, "blockers": null,
            "created_at": "2026-02-03T10:00:00.123456"
        }"#;
        let check_in: CheckIn = serde_json::from_str(json).unwrap();
        assert_eq!(
            check_in.created_at,
            Utc.with_ymd_and_hms(2026, 2, 3, 10, 0, 0).unwrap()
                + chrono::Duration::microseconds(123_456)
        );
        assert_eq!(check_in.delta(), 15.0);
    }

    #[test]
    fn latest_picks_most_recent_for_objective() {
        let mut a = CheckIn::new("a", create(10.0), at(1)).unwrap();
        let b = CheckIn::new("b", create(30.0), at(5)).unwrap();
        let mut other = CheckIn::new("x", create(90.0), at(9)).unwrap();
        other.objective_id = "o2".to_string();
        a.created_at = at(2);

        let log = vec![b.clone(), a, other];
        assert_eq!(latest_check_in(&log, "o1").map(|c| c.id.as_str()), Some("b"));
        assert!(latest_check_in(&log, "missing").is_none());
    }
}
