//! Dashboard metrics for one cycle.

use chrono::Duration;
use serde::Serialize;

use crate::check_in::CheckIn;
use crate::cycle::Cycle;
use crate::error::CoreError;
use crate::objective::Objective;
use crate::settings::ScoringConfig;
use crate::status::ObjectiveStatus;
use crate::types::Timestamp;

/// Look-back window for recent check-ins and look-ahead for deadlines.
pub const DASHBOARD_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub total_objectives: usize,
    pub completed_objectives: usize,
    pub avg_progress: f64,
    pub on_track_percentage: f64,
    pub at_risk_count: usize,
    pub delayed_count: usize,
    /// Check-ins on the cycle's objectives during the last seven days.
    pub recent_check_ins: usize,
    /// Open objectives whose end date falls within the next seven days.
    pub upcoming_deadlines: usize,
}

/// Aggregate the cycle's objectives using derived progress and status.
///
/// Without a cycle every metric is zero.
pub fn dashboard_metrics(
    objectives: &[Objective],
    check_ins: &[CheckIn],
    cycle: Option<&Cycle>,
    now: Timestamp,
    config: &ScoringConfig,
) -> Result<DashboardMetrics, CoreError> {
    let Some(cycle) = cycle else {
        return Ok(DashboardMetrics::default());
    };

    let refreshed = objectives
        .iter()
        .filter(|o| o.cycle_id == cycle.id)
        .map(|o| o.apply_check_in(check_ins, now, config))
        .collect::<Result<Vec<_>, _>>()?;

    let total = refreshed.len();
    let count = |status: ObjectiveStatus| refreshed.iter().filter(|o| o.status == status).count();

    let (avg_progress, on_track_percentage) = if total == 0 {
        (0.0, 0.0)
    } else {
        let progress_sum: f64 = refreshed.iter().map(|o| o.progress).sum();
        (
            progress_sum / total as f64,
            count(ObjectiveStatus::OnTrack) as f64 / total as f64 * 100.0,
        )
    };

    let since = now - Duration::days(DASHBOARD_WINDOW_DAYS);
    let recent_check_ins = check_ins
        .iter()
        .filter(|c| c.created_at >= since && c.created_at <= now)
        .filter(|c| refreshed.iter().any(|o| o.id == c.objective_id))
        .count();

    let today = now.date_naive();
    let horizon = today + Duration::days(DASHBOARD_WINDOW_DAYS);
    let upcoming_deadlines = refreshed
        .iter()
        .filter(|o| o.status != ObjectiveStatus::Completed)
        .filter(|o| o.end_date >= today && o.end_date <= horizon)
        .count();

    tracing::debug!(
        cycle_id = %cycle.id,
        total_objectives = total,
        recent_check_ins,
        "Computed dashboard metrics"
    );

    Ok(DashboardMetrics {
        total_objectives: total,
        completed_objectives: count(ObjectiveStatus::Completed),
        avg_progress,
        on_track_percentage,
        at_risk_count: count(ObjectiveStatus::AtRisk),
        delayed_count: count(ObjectiveStatus::Delayed),
        recent_check_ins,
        upcoming_deadlines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::{KeyResult, Methodology, ObjectiveType};
    use crate::status::ApprovalStatus;
    use crate::types::Date;
    use chrono::{TimeZone, Utc};

    fn date(m: u32, d: u32) -> Date {
        Date::from_ymd_opt(2026, m, d).unwrap()
    }

    fn objective(id: &str, end: Date, current: f64) -> Objective {
        Objective {
            id: id.to_string(),
            title: id.to_string(),
            description: None,
            objective_type: ObjectiveType::Strategic,
            owner_id: "u1".to_string(),
            department_id: None,
            cycle_id: "q1".to_string(),
            start_date: date(1, 1),
            end_date: end,
            weight: 25.0,
            key_results: vec![KeyResult {
                id: format!("{id}-kr"),
                title: "kr".to_string(),
                metric: None,
                target: 100.0,
                current,
                unit: String::new(),
            }],
            status: ObjectiveStatus::NotStarted,
            approval_status: ApprovalStatus::Approved,
            progress: 0.0,
            methodology: Methodology::Okr,
        }
    }

    fn cycle() -> Cycle {
        Cycle {
            id: "q1".to_string(),
            name: "Q1".to_string(),
            start_date: date(1, 1),
            end_date: date(6, 30),
            is_active: true,
        }
    }

    fn check_in(objective_id: &str, created_at: Timestamp) -> CheckIn {
        CheckIn {
            id: format!("{objective_id}-{created_at}"),
            objective_id: objective_id.to_string(),
            user_id: "u1".to_string(),
            progress: 10.0,
            previous_progress: 0.0,
            comment: None,
            blockers: None,
            created_at,
        }
    }

    #[test]
    fn no_cycle_yields_zeros() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let m = dashboard_metrics(&[], &[], None, now, &ScoringConfig::default()).unwrap();
        assert_eq!(m, DashboardMetrics::default());
    }

    #[test]
    fn aggregates_derived_status() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let objectives = vec![
            // Completed.
            objective("done", date(6, 30), 100.0),
            // Ends in five days, far behind: at risk, upcoming.
            objective("late", date(3, 6), 10.0),
            // Healthy.
            objective("fine", date(4, 15), 80.0),
            // Already past its end date.
            objective("over", date(2, 20), 50.0),
        ];
        let log = vec![
            check_in("fine", Utc.with_ymd_and_hms(2026, 2, 27, 0, 0, 0).unwrap()),
            check_in("fine", Utc.with_ymd_and_hms(2026, 2, 10, 0, 0, 0).unwrap()),
            check_in("elsewhere", Utc.with_ymd_and_hms(2026, 2, 28, 0, 0, 0).unwrap()),
        ];
        let c = cycle();
        let m = dashboard_metrics(&objectives, &log, Some(&c), now, &ScoringConfig::default())
            .unwrap();

        assert_eq!(m.total_objectives, 4);
        assert_eq!(m.completed_objectives, 1);
        assert_eq!(m.at_risk_count, 1);
        assert_eq!(m.delayed_count, 1);
        assert!((m.on_track_percentage - 25.0).abs() < 1e-9);
        assert!((m.avg_progress - 60.0).abs() < 1e-9);
        assert_eq!(m.recent_check_ins, 1);
        assert_eq!(m.upcoming_deadlines, 1);
    }
}
