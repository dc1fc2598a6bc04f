//! Progress aggregation: key result → objective → department → organization,
//! plus the monthly progress series.
//!
//! All functions are pure and recompute from their inputs; calling them twice
//! with the same data yields the same result.

use std::collections::HashMap;

use chrono::{NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::check_in::{latest_check_in, CheckIn};
use crate::cycle::{Cycle, YearMonth};
use crate::error::CoreError;
use crate::objective::{KeyResult, Objective};
use crate::team::{Department, TeamMember};
use crate::types::EntityId;

// ---------------------------------------------------------------------------
// Key results and objectives
// ---------------------------------------------------------------------------

/// `round(clamp(current / target, 0, 1) * 100)`.
///
/// A negative target is rejected. A zero target is only accepted while
/// `current` is also zero, which yields 0.
pub fn key_result_progress(kr: &KeyResult) -> Result<u8, CoreError> {
    let invalid = || CoreError::InvalidTarget {
        key_result_id: kr.id.clone(),
        target: kr.target,
    };
    if !kr.target.is_finite() || kr.target < 0.0 {
        return Err(invalid());
    }
    if kr.target == 0.0 {
        return if kr.current == 0.0 { Ok(0) } else { Err(invalid()) };
    }
    let ratio = (kr.current / kr.target).clamp(0.0, 1.0);
    if ratio.is_nan() {
        return Ok(0);
    }
    Ok((ratio * 100.0).round() as u8)
}

/// Progress of an objective, 0-100.
///
/// With key results: the rounded unweighted mean of their progress. Without
/// key results: the progress of the latest check-in for the objective, or 0.
pub fn objective_progress(objective: &Objective, check_ins: &[CheckIn]) -> Result<u8, CoreError> {
    if objective.key_results.is_empty() {
        return Ok(latest_check_in(check_ins, &objective.id)
            .map(|c| c.progress.clamp(0.0, 100.0).round() as u8)
            .unwrap_or(0));
    }

    let mut total = 0u32;
    for kr in &objective.key_results {
        total += u32::from(key_result_progress(kr)?);
    }
    let mean = f64::from(total) / objective.key_results.len() as f64;
    Ok(mean.round() as u8)
}

/// Objective-weight-weighted mean progress, e.g. for one owner's plan.
/// Returns 0 when there are no objectives or all weights are zero.
pub fn weighted_objective_progress(
    objectives: &[Objective],
    check_ins: &[CheckIn],
) -> Result<f64, CoreError> {
    let mut weighted = 0.0;
    let mut weights = 0.0;
    for objective in objectives {
        let progress = objective_progress(objective, check_ins)?;
        weighted += f64::from(progress) * objective.weight;
        weights += objective.weight;
    }
    if weights <= 0.0 {
        return Ok(0.0);
    }
    Ok(weighted / weights)
}

// ---------------------------------------------------------------------------
// Departments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentProgress {
    pub department_id: EntityId,
    pub name: String,
    /// Mean objective progress, 0-100.
    pub progress: f64,
    pub objectives: usize,
    /// `true` when the department has no objectives in the active cycle.
    pub no_data: bool,
}

/// Mean progress of the active cycle's objectives owned by members of
/// `department`.
///
/// An owner missing from `members` is attributed through the objective's
/// own `department_id`. Without an active cycle, or without matching
/// objectives, the department reports `no_data`.
pub fn department_progress(
    department: &Department,
    members: &[TeamMember],
    objectives: &[Objective],
    check_ins: &[CheckIn],
    active_cycle: Option<&Cycle>,
) -> Result<DepartmentProgress, CoreError> {
    let member_departments: HashMap<&str, Option<&str>> = members
        .iter()
        .map(|m| (m.id.as_str(), m.department_id.as_deref()))
        .collect();

    let mut progress_sum = 0u32;
    let mut count = 0usize;

    if let Some(cycle) = active_cycle {
        for objective in objectives.iter().filter(|o| o.cycle_id == cycle.id) {
            let owner_department = match member_departments.get(objective.owner_id.as_str()) {
                Some(dept) => *dept,
                None => objective.department_id.as_deref(),
            };
            if owner_department != Some(department.id.as_str()) {
                continue;
            }
            progress_sum += u32::from(objective_progress(objective, check_ins)?);
            count += 1;
        }
    }

    if count == 0 {
        tracing::debug!(
            department_id = %department.id,
            "No objectives for department in active cycle"
        );
        return Ok(DepartmentProgress {
            department_id: department.id.clone(),
            name: department.name.clone(),
            progress: 0.0,
            objectives: 0,
            no_data: true,
        });
    }

    Ok(DepartmentProgress {
        department_id: department.id.clone(),
        name: department.name.clone(),
        progress: f64::from(progress_sum) / count as f64,
        objectives: count,
        no_data: false,
    })
}

/// [`department_progress`] for every department, in input order.
pub fn departments_progress(
    departments: &[Department],
    members: &[TeamMember],
    objectives: &[Objective],
    check_ins: &[CheckIn],
    active_cycle: Option<&Cycle>,
) -> Result<Vec<DepartmentProgress>, CoreError> {
    departments
        .iter()
        .map(|d| department_progress(d, members, objectives, check_ins, active_cycle))
        .collect()
}

/// Mean progress over departments that have data, or `None` if none do.
pub fn organization_progress(departments: &[DepartmentProgress]) -> Option<f64> {
    let with_data: Vec<f64> = departments
        .iter()
        .filter(|d| !d.no_data)
        .map(|d| d.progress)
        .collect();
    if with_data.is_empty() {
        return None;
    }
    Some(with_data.iter().sum::<f64>() / with_data.len() as f64)
}

// ---------------------------------------------------------------------------
// Monthly series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyProgress {
    pub month: YearMonth,
    pub label: String,
    /// Mean of the per-objective snapshots, 0-100.
    pub progress: f64,
    /// Number of objectives with a snapshot at month end.
    pub objectives: usize,
}

/// Calendar months spanned by a cycle.
pub fn cycle_months(cycle: &Cycle) -> Vec<YearMonth> {
    cycle.months()
}

/// Progress snapshot at the end of each month.
///
/// For every month, each objective contributes its latest check-in created
/// before the first instant of the following month. Months with no snapshot
/// report 0 with `objectives = 0`.
pub fn monthly_progress_series(
    check_ins: &[CheckIn],
    months: &[YearMonth],
) -> Vec<MonthlyProgress> {
    months
        .iter()
        .map(|&month| {
            let Some(cutoff) = month
                .first_day_of_next()
                .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)))
            else {
                return empty_month(month);
            };

            let mut latest: HashMap<&str, &CheckIn> = HashMap::new();
            for check_in in check_ins.iter().filter(|c| c.created_at < cutoff) {
                latest
                    .entry(check_in.objective_id.as_str())
                    .and_modify(|current| {
                        if check_in.created_at >= current.created_at {
                            *current = check_in;
                        }
                    })
                    .or_insert(check_in);
            }

            if latest.is_empty() {
                return empty_month(month);
            }
            let total: f64 = latest.values().map(|c| c.progress).sum();
            MonthlyProgress {
                month,
                label: month.label(),
                progress: total / latest.len() as f64,
                objectives: latest.len(),
            }
        })
        .collect()
}

fn empty_month(month: YearMonth) -> MonthlyProgress {
    MonthlyProgress {
        month,
        label: month.label(),
        progress: 0.0,
        objectives: 0,
    }
}

/// Monthly series for a cycle, restricted to check-ins on its objectives.
pub fn cycle_monthly_progress(
    cycle: &Cycle,
    objectives: &[Objective],
    check_ins: &[CheckIn],
) -> Vec<MonthlyProgress> {
    let in_cycle: Vec<CheckIn> = check_ins
        .iter()
        .filter(|c| {
            objectives
                .iter()
                .any(|o| o.id == c.objective_id && o.cycle_id == cycle.id)
        })
        .cloned()
        .collect();
    monthly_progress_series(&in_cycle, &cycle_months(cycle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::{Methodology, ObjectiveType};
    use crate::status::{ApprovalStatus, ObjectiveStatus};
    use crate::types::{Date, Timestamp};
    use assert_matches::assert_matches;

    fn kr(id: &str, target: f64, current: f64) -> KeyResult {
        KeyResult {
            id: id.to_string(),
            title: id.to_string(),
            metric: None,
            target,
            current,
            unit: String::new(),
        }
    }

    fn objective(id: &str, owner: &str, key_results: Vec<KeyResult>) -> Objective {
        Objective {
            id: id.to_string(),
            title: id.to_string(),
            description: None,
            objective_type: ObjectiveType::Operational,
            owner_id: owner.to_string(),
            department_id: None,
            cycle_id: "q1".to_string(),
            start_date: Date::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: Date::from_ymd_opt(2026, 3, 31).unwrap(),
            weight: 50.0,
            key_results,
            status: ObjectiveStatus::NotStarted,
            approval_status: ApprovalStatus::Approved,
            progress: 0.0,
            methodology: Methodology::Okr,
        }
    }

    fn check_in(objective_id: &str, progress: f64, created_at: Timestamp) -> CheckIn {
        CheckIn {
            id: format!("{objective_id}-{progress}"),
            objective_id: objective_id.to_string(),
            user_id: "u1".to_string(),
            progress,
            previous_progress: 0.0,
            comment: None,
            blockers: None,
            created_at,
        }
    }

    fn at(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    fn cycle() -> Cycle {
        Cycle {
            id: "q1".to_string(),
            name: "Q1 2026".to_string(),
            start_date: Date::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: Date::from_ymd_opt(2026, 3, 31).unwrap(),
            is_active: true,
        }
    }

    fn member(id: &str, department: Option<&str>) -> TeamMember {
        TeamMember {
            id: id.to_string(),
            full_name: id.to_string(),
            email: String::new(),
            role: String::new(),
            department_id: department.map(str::to_string),
            department_name: None,
            manager_id: None,
            is_active: true,
            avg_progress: 0.0,
            objectives_count: 0,
            pending_check_ins: 0,
        }
    }

    fn department(id: &str) -> Department {
        Department {
            id: id.to_string(),
            name: id.to_uppercase(),
            organization_id: None,
        }
    }

    // -- key results ---------------------------------------------------------

    #[test]
    fn key_result_progress_is_clamped() {
        assert_eq!(key_result_progress(&kr("a", 100.0, 50.0)).unwrap(), 50);
        assert_eq!(key_result_progress(&kr("a", 100.0, 250.0)).unwrap(), 100);
        assert_eq!(key_result_progress(&kr("a", 100.0, -10.0)).unwrap(), 0);
        assert_eq!(key_result_progress(&kr("a", 3.0, 1.0)).unwrap(), 33);
    }

    #[test]
    fn zero_target_with_zero_current_is_zero() {
        assert_eq!(key_result_progress(&kr("a", 0.0, 0.0)).unwrap(), 0);
    }

    #[test]
    fn invalid_targets_are_rejected() {
        assert_matches!(
            key_result_progress(&kr("neg", -5.0, 1.0)),
            Err(CoreError::InvalidTarget { key_result_id, .. }) if key_result_id == "neg"
        );
        assert_matches!(
            key_result_progress(&kr("zero", 0.0, 3.0)),
            Err(CoreError::InvalidTarget { .. })
        );
    }

    // -- objectives ----------------------------------------------------------

    #[test]
    fn objective_progress_is_mean_of_key_results() {
        let obj = objective("o1", "u1", vec![kr("a", 100.0, 50.0), kr("b", 50.0, 25.0)]);
        assert_eq!(objective_progress(&obj, &[]).unwrap(), 50);
    }

    #[test]
    fn key_results_take_precedence_over_check_ins() {
        let obj = objective("o1", "u1", vec![kr("a", 10.0, 10.0)]);
        let log = vec![check_in("o1", 20.0, at(2026, 2, 1))];
        assert_eq!(objective_progress(&obj, &log).unwrap(), 100);
    }

    #[test]
    fn objective_without_key_results_uses_latest_check_in() {
        let obj = objective("o1", "u1", vec![]);
        let log = vec![
            check_in("o1", 60.0, at(2026, 2, 10)),
            check_in("o1", 40.0, at(2026, 2, 1)),
            check_in("o2", 90.0, at(2026, 3, 1)),
        ];
        assert_eq!(objective_progress(&obj, &log).unwrap(), 60);
        assert_eq!(objective_progress(&obj, &[]).unwrap(), 0);
    }

    #[test]
    fn objective_progress_propagates_invalid_target() {
        let obj = objective("o1", "u1", vec![kr("a", 10.0, 5.0), kr("b", -1.0, 0.0)]);
        assert!(objective_progress(&obj, &[]).is_err());
    }

    #[test]
    fn weighted_progress_uses_objective_weights() {
        let mut heavy = objective("o1", "u1", vec![kr("a", 100.0, 100.0)]);
        heavy.weight = 75.0;
        let mut light = objective("o2", "u1", vec![kr("b", 100.0, 0.0)]);
        light.weight = 25.0;
        let p = weighted_objective_progress(&[heavy, light], &[]).unwrap();
        assert!((p - 75.0).abs() < 1e-9);
        assert_eq!(weighted_objective_progress(&[], &[]).unwrap(), 0.0);
    }

    // -- departments ---------------------------------------------------------

    #[test]
    fn department_progress_groups_by_owner_membership() {
        let members = vec![member("u1", Some("sales")), member("u2", Some("ops"))];
        let objectives = vec![
            objective("o1", "u1", vec![kr("a", 100.0, 80.0)]),
            objective("o2", "u1", vec![kr("b", 100.0, 40.0)]),
            objective("o3", "u2", vec![kr("c", 100.0, 10.0)]),
        ];
        let c = cycle();
        let sales =
            department_progress(&department("sales"), &members, &objectives, &[], Some(&c))
                .unwrap();
        assert_eq!(sales.objectives, 2);
        assert!((sales.progress - 60.0).abs() < 1e-9);
        assert!(!sales.no_data);
    }

    #[test]
    fn unknown_owner_falls_back_to_objective_department() {
        let mut obj = objective("o1", "ghost", vec![kr("a", 100.0, 30.0)]);
        obj.department_id = Some("sales".to_string());
        let c = cycle();
        let sales = department_progress(&department("sales"), &[], &[obj], &[], Some(&c)).unwrap();
        assert_eq!(sales.objectives, 1);
        assert!((sales.progress - 30.0).abs() < 1e-9);
    }

    #[test]
    fn objectives_outside_active_cycle_are_ignored() {
        let members = vec![member("u1", Some("sales"))];
        let mut obj = objective("o1", "u1", vec![kr("a", 100.0, 30.0)]);
        obj.cycle_id = "q4-2025".to_string();
        let c = cycle();
        let sales =
            department_progress(&department("sales"), &members, &[obj], &[], Some(&c)).unwrap();
        assert!(sales.no_data);
        assert_eq!(sales.progress, 0.0);
    }

    #[test]
    fn no_active_cycle_means_no_data() {
        let members = vec![member("u1", Some("sales"))];
        let objectives = vec![objective("o1", "u1", vec![kr("a", 100.0, 30.0)])];
        let sales =
            department_progress(&department("sales"), &members, &objectives, &[], None).unwrap();
        assert!(sales.no_data);
    }

    #[test]
    fn organization_progress_skips_departments_without_data() {
        let members = vec![member("u1", Some("sales")), member("u2", Some("ops"))];
        let objectives = vec![objective("o1", "u1", vec![kr("a", 100.0, 80.0)])];
        let c = cycle();
        let all = departments_progress(
            &[department("sales"), department("ops")],
            &members,
            &objectives,
            &[],
            Some(&c),
        )
        .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[1].no_data);
        assert_eq!(organization_progress(&all), Some(80.0));
        assert_eq!(organization_progress(&all[1..]), None);
    }

    // -- monthly -------------------------------------------------------------

    #[test]
    fn monthly_series_uses_month_end_snapshots() {
        let log = vec![
            check_in("o1", 20.0, at(2026, 1, 10)),
            check_in("o1", 50.0, at(2026, 2, 15)),
            check_in("o2", 40.0, at(2026, 2, 1)),
            check_in("o2", 10.0, at(2026, 1, 20)),
        ];
        let series = monthly_progress_series(&log, &cycle_months(&cycle()));
        assert_eq!(series.len(), 3);

        // January: o1 = 20, o2 = 10.
        assert_eq!(series[0].objectives, 2);
        assert!((series[0].progress - 15.0).abs() < 1e-9);
        assert_eq!(series[0].label, "Jan 2026");

        // February: o1 = 50, o2 = 40.
        assert!((series[1].progress - 45.0).abs() < 1e-9);

        // March carries the February snapshots forward.
        assert!((series[2].progress - 45.0).abs() < 1e-9);
    }

    #[test]
    fn months_before_any_check_in_are_empty() {
        let log = vec![check_in("o1", 70.0, at(2026, 3, 2))];
        let series = monthly_progress_series(&log, &cycle_months(&cycle()));
        assert_eq!(series[0].objectives, 0);
        assert_eq!(series[0].progress, 0.0);
        assert_eq!(series[2].objectives, 1);
    }

    #[test]
    fn cycle_series_ignores_foreign_objectives() {
        let objectives = vec![objective("o1", "u1", vec![])];
        let log = vec![
            check_in("o1", 30.0, at(2026, 1, 5)),
            check_in("other", 90.0, at(2026, 1, 5)),
        ];
        let series = cycle_monthly_progress(&cycle(), &objectives, &log);
        assert_eq!(series[0].objectives, 1);
        assert!((series[0].progress - 30.0).abs() < 1e-9);
    }
}
