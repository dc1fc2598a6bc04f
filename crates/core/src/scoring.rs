//! Evaluation scoring: objectives score, competencies score and the final
//! weighted score.
//!
//! Every row's score is its leader score when present, otherwise its self
//! score. Objective weights are relative shares; they are normalized to sum
//! to 100 before weighting, and a [`WeightNormalizationWarning`] is attached
//! whenever the raw weights did not already sum to 100 (or to 1.0 for
//! fractional weights).

use serde::Serialize;

use crate::bands::ScoreBand;
use crate::error::CoreError;
use crate::evaluation::Evaluation;
use crate::settings::ScoringConfig;

/// Allowed deviation of `objectives_weight + competencies_weight` from 100.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Allowed deviation of fractional objective weights from 1.0.
const FRACTIONAL_SUM_TOLERANCE: f64 = 0.0001;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Non-fatal: objective weights did not sum to 100 and were rescaled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightNormalizationWarning {
    pub original_sum: f64,
    pub normalized_weights: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringWarning {
    WeightNormalization(WeightNormalizationWarning),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectivesScore {
    /// Weighted score, 0-100.
    pub score: f64,
    /// Per-row weights after normalization, summing to 100 (empty when
    /// there are no rows).
    pub normalized_weights: Vec<f64>,
    pub warning: Option<WeightNormalizationWarning>,
    /// `true` when there are no rows or some row has no score yet.
    pub incomplete: bool,
}

impl ObjectivesScore {
    /// Normalized weights as multipliers (summing to 1.0).
    pub fn multipliers(&self) -> Vec<f64> {
        self.normalized_weights.iter().map(|w| w / 100.0).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetenciesScore {
    /// Mean rating as a percentage of the top level, 0-100.
    pub score: f64,
    /// Number of rows that carried a rating.
    pub rated: usize,
    pub incomplete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationScore {
    pub objectives_score: f64,
    pub competencies_score: f64,
    pub final_score: f64,
    pub band: ScoreBand,
    pub incomplete: bool,
    pub warnings: Vec<ScoringWarning>,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Weighted objectives score of an evaluation.
///
/// Unscored rows contribute 0 and mark the result incomplete. Fails when
/// a weight is negative or when all weights are zero.
pub fn objectives_score(evaluation: &Evaluation) -> Result<ObjectivesScore, CoreError> {
    let rows = &evaluation.evaluation_objectives;
    if rows.is_empty() {
        return Ok(ObjectivesScore {
            score: 0.0,
            normalized_weights: Vec::new(),
            warning: None,
            incomplete: true,
        });
    }

    if let Some(row) = rows.iter().find(|r| !r.weight.is_finite() || r.weight < 0.0) {
        return Err(CoreError::validation(
            "evaluation_objectives.weight",
            format!("weight of objective '{}' must be non-negative", row.objective_id),
        ));
    }

    let sum: f64 = rows.iter().map(|r| r.weight).sum();
    if sum <= 0.0 {
        return Err(CoreError::validation(
            "evaluation_objectives.weight",
            "weights must not all be zero",
        ));
    }

    let normalized_weights: Vec<f64> = rows.iter().map(|r| r.weight / sum * 100.0).collect();

    let already_percent = (sum - 100.0).abs() <= WEIGHT_SUM_TOLERANCE;
    let already_fractional =
        rows.iter().all(|r| r.weight <= 1.0) && (sum - 1.0).abs() <= FRACTIONAL_SUM_TOLERANCE;
    let warning = if already_percent || already_fractional {
        None
    } else {
        tracing::warn!(
            evaluation_id = %evaluation.id,
            original_sum = sum,
            "Objective weights do not sum to 100, normalizing proportionally"
        );
        Some(WeightNormalizationWarning {
            original_sum: sum,
            normalized_weights: normalized_weights.clone(),
        })
    };

    let score = rows
        .iter()
        .zip(&normalized_weights)
        .map(|(row, weight)| row.effective_score().unwrap_or(0.0) * weight / 100.0)
        .sum();

    Ok(ObjectivesScore {
        score,
        normalized_weights,
        warning,
        incomplete: rows.iter().any(|r| r.effective_score().is_none()),
    })
}

/// Mean competency rating as a percentage of `max_level`.
///
/// Unrated rows are left out of the mean and mark the result incomplete; no
/// rows at all scores 0.
pub fn competencies_score(
    evaluation: &Evaluation,
    max_level: u8,
) -> Result<CompetenciesScore, CoreError> {
    if max_level == 0 {
        return Err(CoreError::validation("max_competency_level", "must be at least 1"));
    }

    let rows = &evaluation.evaluation_competencies;
    let ratings: Vec<f64> = rows
        .iter()
        .filter_map(|r| r.effective_score())
        .map(f64::from)
        .collect();

    if ratings.is_empty() {
        return Ok(CompetenciesScore {
            score: 0.0,
            rated: 0,
            incomplete: true,
        });
    }

    let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
    Ok(CompetenciesScore {
        score: mean / f64::from(max_level) * 100.0,
        rated: ratings.len(),
        incomplete: ratings.len() < rows.len(),
    })
}

/// Check that the two component weights sum to 100 within tolerance.
pub fn validate_component_weights(
    objectives_weight: f64,
    competencies_weight: f64,
) -> Result<(), CoreError> {
    let sum = objectives_weight + competencies_weight;
    if !sum.is_finite() || (sum - 100.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(CoreError::WeightConfiguration {
            objectives_weight,
            competencies_weight,
        });
    }
    Ok(())
}

/// `objectives * (ow / 100) + competencies * (cw / 100)`.
pub fn combine_scores(
    objectives_score: f64,
    competencies_score: f64,
    objectives_weight: f64,
    competencies_weight: f64,
) -> Result<f64, CoreError> {
    validate_component_weights(objectives_weight, competencies_weight)?;
    Ok(objectives_score * objectives_weight / 100.0
        + competencies_score * competencies_weight / 100.0)
}

/// Full scoring of an evaluation. Component weights stored on the record
/// are used; a missing one comes from `config`.
pub fn final_score(
    evaluation: &Evaluation,
    config: &ScoringConfig,
) -> Result<EvaluationScore, CoreError> {
    evaluation.ensure_valid(config.max_competency_level)?;
    let (objectives_weight, competencies_weight) = evaluation.component_weights(config);
    validate_component_weights(objectives_weight, competencies_weight)?;

    let objectives = objectives_score(evaluation)?;
    let competencies = competencies_score(evaluation, config.max_competency_level)?;
    let final_score = combine_scores(
        objectives.score,
        competencies.score,
        objectives_weight,
        competencies_weight,
    )?;

    let warnings = objectives
        .warning
        .clone()
        .map(ScoringWarning::WeightNormalization)
        .into_iter()
        .collect();

    Ok(EvaluationScore {
        objectives_score: objectives.score,
        competencies_score: competencies.score,
        final_score,
        band: ScoreBand::from_score(final_score),
        incomplete: objectives.incomplete || competencies.incomplete,
        warnings,
    })
}
