//! Cycle report assembled from fetched records.
//!
//! Fetching lives in the binary; this module only combines plain records
//! with the `okr_core` computations so it can be tested without a server.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::Serialize;

use okr_core::bands::{ProgressBand, ScoreBand};
use okr_core::check_in::CheckIn;
use okr_core::cycle::{active_cycle, Cycle};
use okr_core::dashboard::{dashboard_metrics, DashboardMetrics};
use okr_core::evaluation::Evaluation;
use okr_core::objective::Objective;
use okr_core::pdi::{pdi_completion, Pdi};
use okr_core::progress::{
    cycle_monthly_progress, departments_progress, organization_progress,
    weighted_objective_progress, DepartmentProgress, MonthlyProgress,
};
use okr_core::scoring::final_score;
use okr_core::settings::ScoringConfig;
use okr_core::status::{assess_status, ObjectiveStatus, StatusAssessment};
use okr_core::team::{team_stats, Department, TeamMember, TeamStats};
use okr_core::types::{EntityId, Timestamp};
use okr_core::CoreError;

use crate::dashboard::BackendFigures;

/// Everything the report needs, as fetched from the API.
#[derive(Debug, Clone, Default)]
pub struct ReportInput {
    pub cycles: Vec<Cycle>,
    pub objectives: Vec<Objective>,
    pub check_ins: Vec<CheckIn>,
    pub members: Vec<TeamMember>,
    pub evaluations: Vec<Evaluation>,
    pub pdis: Vec<Pdi>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub evaluation_id: EntityId,
    pub user_id: EntityId,
    pub final_score: f64,
    pub band: ScoreBand,
    pub incomplete: bool,
    pub warnings: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusOverride {
    pub objective_id: EntityId,
    #[serde(flatten)]
    pub assessment: StatusAssessment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdiSummary {
    pub pdi_id: EntityId,
    pub user_id: EntityId,
    pub completion: u8,
    pub band: ProgressBand,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub generated_at: Timestamp,
    pub cycle: Option<Cycle>,
    pub dashboard: DashboardMetrics,
    pub departments: Vec<DepartmentProgress>,
    pub organization_progress: Option<f64>,
    pub monthly: Vec<MonthlyProgress>,
    pub team: TeamStats,
    pub evaluations: Vec<EvaluationSummary>,
    /// Evaluations that could not be scored, with the reason.
    pub skipped_evaluations: Vec<(EntityId, String)>,
    pub status_overrides: Vec<StatusOverride>,
    pub pdis: Vec<PdiSummary>,
    /// The backend's own dashboard aggregates for the same cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendFigures>,
}

impl Report {
    pub fn with_backend(self, backend: BackendFigures) -> Self {
        Self {
            backend: Some(backend),
            ..self
        }
    }
}

/// Departments referenced by members, ordered by id. Members without a
/// department id are skipped.
pub fn departments_from_members(members: &[TeamMember]) -> Vec<Department> {
    let mut departments: BTreeMap<&str, Department> = BTreeMap::new();
    for member in members {
        let Some(id) = member.department_id.as_deref() else {
            continue;
        };
        departments.entry(id).or_insert_with(|| Department {
            id: id.to_string(),
            name: member.department_name.clone().unwrap_or_else(|| id.to_string()),
            organization_id: None,
        });
    }
    departments.into_values().collect()
}

/// Fill each member's progress and counters from the cycle's objectives.
///
/// `pending_check_ins` counts open objectives with no check-in during the
/// last seven days.
pub fn enrich_members(
    members: &[TeamMember],
    objectives: &[Objective],
    check_ins: &[CheckIn],
    now: Timestamp,
) -> Result<Vec<TeamMember>, CoreError> {
    let since = now - Duration::days(7);
    members
        .iter()
        .map(|member| {
            let owned: Vec<Objective> = objectives
                .iter()
                .filter(|o| o.owner_id == member.id)
                .cloned()
                .collect();
            let pending = owned
                .iter()
                .filter(|o| o.status != ObjectiveStatus::Completed)
                .filter(|o| {
                    !check_ins
                        .iter()
                        .any(|c| c.objective_id == o.id && c.created_at >= since)
                })
                .count();
            Ok(TeamMember {
                avg_progress: weighted_objective_progress(&owned, check_ins)?,
                objectives_count: owned.len() as u32,
                pending_check_ins: pending as u32,
                ..member.clone()
            })
        })
        .collect()
}

pub fn build_report(
    input: &ReportInput,
    now: Timestamp,
    config: &ScoringConfig,
) -> Result<Report, CoreError> {
    let cycle = active_cycle(&input.cycles);
    let in_cycle: Vec<Objective> = match cycle {
        Some(c) => input
            .objectives
            .iter()
            .filter(|o| o.cycle_id == c.id)
            .cloned()
            .collect(),
        None => Vec::new(),
    };

    let dashboard = dashboard_metrics(&input.objectives, &input.check_ins, cycle, now, config)?;
    let departments = departments_progress(
        &departments_from_members(&input.members),
        &input.members,
        &input.objectives,
        &input.check_ins,
        cycle,
    )?;
    let monthly = match cycle {
        Some(c) => cycle_monthly_progress(c, &input.objectives, &input.check_ins),
        None => Vec::new(),
    };
    let members = enrich_members(&input.members, &in_cycle, &input.check_ins, now)?;

    let mut evaluations = Vec::new();
    let mut skipped_evaluations = Vec::new();
    for evaluation in input
        .evaluations
        .iter()
        .filter(|e| cycle.is_some_and(|c| c.id == e.cycle_id))
    {
        match final_score(evaluation, config) {
            Ok(score) => evaluations.push(EvaluationSummary {
                evaluation_id: evaluation.id.clone(),
                user_id: evaluation.user_id.clone(),
                final_score: score.final_score,
                band: score.band,
                incomplete: score.incomplete,
                warnings: score.warnings.len(),
            }),
            Err(e) => {
                tracing::warn!(
                    evaluation_id = %evaluation.id,
                    error = %e,
                    "Skipping evaluation that cannot be scored"
                );
                skipped_evaluations.push((evaluation.id.clone(), e.to_string()));
            }
        }
    }

    let mut status_overrides = Vec::new();
    for objective in &in_cycle {
        let assessment = assess_status(objective, &input.check_ins, now, config)?;
        if assessment.overridden {
            status_overrides.push(StatusOverride {
                objective_id: objective.id.clone(),
                assessment,
            });
        }
    }

    let pdis = input
        .pdis
        .iter()
        .filter(|p| cycle.is_some_and(|c| c.id == p.cycle_id))
        .map(|p| {
            let completion = pdi_completion(p);
            PdiSummary {
                pdi_id: p.id.clone(),
                user_id: p.user_id.clone(),
                completion,
                band: ProgressBand::from_progress(f64::from(completion)),
            }
        })
        .collect();

    Ok(Report {
        generated_at: now,
        cycle: cycle.cloned(),
        dashboard,
        organization_progress: organization_progress(&departments),
        departments,
        monthly,
        team: team_stats(&members),
        evaluations,
        skipped_evaluations,
        status_overrides,
        pdis,
        backend: None,
    })
}
