//! Performance evaluations and their per-objective / per-competency rows.
//!
//! An evaluation owns its join rows; the rows reference objectives and
//! competencies without owning them. The three score fields are caches of
//! what [`crate::scoring`] computes.

use serde::{Deserialize, Serialize};

use crate::decimal::{f64_lenient, opt_f64_lenient};
use crate::error::CoreError;
use crate::objective::prefix_field;
use crate::scoring::{final_score, EvaluationScore};
use crate::settings::ScoringConfig;
use crate::threshold_validation::{validate_level, validate_percentage, validate_unit_range};
use crate::types::EntityId;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationPhase {
    #[default]
    SelfEvaluation,
    LeaderEvaluation,
    Calibration,
    Feedback,
    Completed,
}

impl EvaluationPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SelfEvaluation => "self-evaluation",
            Self::LeaderEvaluation => "leader-evaluation",
            Self::Calibration => "calibration",
            Self::Feedback => "feedback",
            Self::Completed => "completed",
        }
    }

    /// The phase that follows, or `None` once completed.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::SelfEvaluation => Some(Self::LeaderEvaluation),
            Self::LeaderEvaluation => Some(Self::Calibration),
            Self::Calibration => Some(Self::Feedback),
            Self::Feedback => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    pub fn advance(self) -> Result<Self, CoreError> {
        self.next().ok_or_else(|| CoreError::InvalidTransition {
            from: self.as_str().to_string(),
            to: "next phase".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Join rows
// ---------------------------------------------------------------------------

/// One objective as rated within an evaluation. Scores are 0-100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationObjective {
    pub objective_id: EntityId,
    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub self_score: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub leader_score: Option<f64>,
    /// Relative weight; normalized against the other rows when scoring.
    #[serde(deserialize_with = "f64_lenient")]
    pub weight: f64,
    #[serde(default, deserialize_with = "f64_lenient")]
    pub target_progress: f64,
    #[serde(default)]
    pub comment: Option<String>,
}

impl EvaluationObjective {
    /// The leader's score when present, otherwise the self score.
    pub fn effective_score(&self) -> Option<f64> {
        self.leader_score.or(self.self_score)
    }

    pub fn ensure_valid(&self) -> Result<(), CoreError> {
        if let Some(s) = self.self_score {
            validate_percentage(s, "self_score")?;
        }
        if let Some(s) = self.leader_score {
            validate_percentage(s, "leader_score")?;
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(CoreError::validation(
                "weight",
                format!("must be a non-negative number, got {}", self.weight),
            ));
        }
        validate_unit_range(self.target_progress, "target_progress")
    }
}

/// One competency as rated within an evaluation. Scores are levels `1..=max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationCompetency {
    pub competency_id: EntityId,
    #[serde(default)]
    pub self_score: Option<u8>,
    #[serde(default)]
    pub leader_score: Option<u8>,
    pub expected_level: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

impl EvaluationCompetency {
    pub fn effective_score(&self) -> Option<u8> {
        self.leader_score.or(self.self_score)
    }

    /// Difference between the effective score and the expected level.
    pub fn gap(&self) -> Option<i16> {
        self.effective_score()
            .map(|s| i16::from(s) - i16::from(self.expected_level))
    }

    pub fn ensure_valid(&self, max_level: u8) -> Result<(), CoreError> {
        if let Some(s) = self.self_score {
            validate_level(s, max_level, "self_score")?;
        }
        if let Some(s) = self.leader_score {
            validate_level(s, max_level, "leader_score")?;
        }
        validate_level(self.expected_level, max_level, "expected_level")
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: EntityId,
    pub user_id: EntityId,
    pub cycle_id: EntityId,
    pub period: String,
    #[serde(default)]
    pub phase: EvaluationPhase,
    /// Component weights stored on the record. `None` falls back to the
    /// organization's configured weights.
    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub objectives_weight: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub competencies_weight: Option<f64>,
    #[serde(default)]
    pub evaluation_objectives: Vec<EvaluationObjective>,
    #[serde(default)]
    pub evaluation_competencies: Vec<EvaluationCompetency>,
    #[serde(default)]
    pub strengths: Option<String>,
    #[serde(default)]
    pub improvements: Option<String>,
    #[serde(default)]
    pub development_actions: Option<String>,
    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub objectives_score: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub competencies_score: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub final_score: Option<f64>,
}

impl Evaluation {
    /// Validate every join row against the configured competency scale.
    pub fn ensure_valid(&self, max_level: u8) -> Result<(), CoreError> {
        for (i, row) in self.evaluation_objectives.iter().enumerate() {
            row.ensure_valid()
                .map_err(|e| prefix_field(e, &format!("evaluation_objectives[{i}]")))?;
        }
        for (i, row) in self.evaluation_competencies.iter().enumerate() {
            row.ensure_valid(max_level)
                .map_err(|e| prefix_field(e, &format!("evaluation_competencies[{i}]")))?;
        }
        Ok(())
    }

    /// `(objectives, competencies)` weights, taking each missing one from
    /// `config`.
    pub fn component_weights(&self, config: &ScoringConfig) -> (f64, f64) {
        (
            self.objectives_weight
                .unwrap_or(config.default_objectives_weight),
            self.competencies_weight
                .unwrap_or(config.default_competencies_weight),
        )
    }

    /// Compute the scores and return a copy with the cached fields filled.
    pub fn with_scores(
        &self,
        config: &ScoringConfig,
    ) -> Result<(Evaluation, EvaluationScore), CoreError> {
        let score = final_score(self, config)?;
        let scored = Evaluation {
            objectives_score: Some(score.objectives_score),
            competencies_score: Some(score.competencies_score),
            final_score: Some(score.final_score),
            ..self.clone()
        };
        Ok((scored, score))
    }

    pub fn is_completed(&self) -> bool {
        self.phase == EvaluationPhase::Completed
    }
}
