use crate::error::CoreError;
use crate::evaluation::Evaluation;
use crate::scoring::{final_score, EvaluationScore};
use crate::settings::ScoringConfig;
use crate::threshold_validation::{validate_level, validate_percentage};

/// Who is entering a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rater {
    Employee,
    Leader,
}

/// Ratings and comments for one evaluation, with a live score preview.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationForm {
    draft: Evaluation,
}

impl EvaluationForm {
    pub fn new(initial: &Evaluation) -> Self {
        Self {
            draft: initial.clone(),
        }
    }

    pub fn reset(&mut self, initial: &Evaluation) {
        *self = Self::new(initial);
    }

    pub fn draft(&self) -> &Evaluation {
        &self.draft
    }

    pub fn rate_objective(
        &mut self,
        objective_id: &str,
        rater: Rater,
        score: f64,
    ) -> Result<(), CoreError> {
        validate_percentage(score, "score")?;
        let row = self
            .draft
            .evaluation_objectives
            .iter_mut()
            .find(|r| r.objective_id == objective_id)
            .ok_or_else(|| {
                CoreError::validation(
                    "objective_id",
                    format!("'{objective_id}' is not part of this evaluation"),
                )
            })?;
        match rater {
            Rater::Employee => row.self_score = Some(score),
            Rater::Leader => row.leader_score = Some(score),
        }
        Ok(())
    }

    pub fn rate_competency(
        &mut self,
        competency_id: &str,
        rater: Rater,
        level: u8,
        max_level: u8,
    ) -> Result<(), CoreError> {
        validate_level(level, max_level, "score")?;
        let row = self
            .draft
            .evaluation_competencies
            .iter_mut()
            .find(|r| r.competency_id == competency_id)
            .ok_or_else(|| {
                CoreError::validation(
                    "competency_id",
                    format!("'{competency_id}' is not part of this evaluation"),
                )
            })?;
        match rater {
            Rater::Employee => row.self_score = Some(level),
            Rater::Leader => row.leader_score = Some(level),
        }
        Ok(())
    }

    pub fn set_strengths(&mut self, text: impl Into<String>) {
        self.draft.strengths = non_blank(text.into());
    }

    pub fn set_improvements(&mut self, text: impl Into<String>) {
        self.draft.improvements = non_blank(text.into());
    }

    pub fn set_development_actions(&mut self, text: impl Into<String>) {
        self.draft.development_actions = non_blank(text.into());
    }

    /// Scores for the ratings entered so far.
    pub fn preview(&self, config: &ScoringConfig) -> Result<EvaluationScore, CoreError> {
        final_score(&self.draft, config)
    }

    /// The evaluation with its cached scores filled in.
    pub fn build(&self, config: &ScoringConfig) -> Result<Evaluation, CoreError> {
        self.draft.with_scores(config).map(|(evaluation, _)| evaluation)
    }
}

fn non_blank(text: String) -> Option<String> {
    Some(text).filter(|t| !t.trim().is_empty())
}
