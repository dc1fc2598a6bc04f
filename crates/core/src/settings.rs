//! Organization settings and the scoring configuration derived from them.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::scoring::WEIGHT_SUM_TOLERANCE;
use crate::status::DEFAULT_AT_RISK_TOLERANCE;

/// Fallback weight of the objectives component when a record omits it.
pub const DEFAULT_OBJECTIVES_WEIGHT: f64 = 70.0;

/// Fallback weight of the competencies component when a record omits it.
pub const DEFAULT_COMPETENCIES_WEIGHT: f64 = 30.0;

/// Default top of the competency rating scale.
pub const DEFAULT_MAX_COMPETENCY_LEVEL: u8 = 5;

/// Default rating scale string stored in organization settings.
pub const DEFAULT_RATING_SCALE: &str = "1-5";

// ---------------------------------------------------------------------------
// Rating scale
// ---------------------------------------------------------------------------

/// An inclusive `min-max` rating scale such as `"1-5"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingScale {
    pub min: u8,
    pub max: u8,
}

impl RatingScale {
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let invalid = || {
            CoreError::validation(
                "evaluation_scale",
                format!("expected '<min>-<max>' with min < max, got '{s}'"),
            )
        };
        let (min, max) = s.split_once('-').ok_or_else(invalid)?;
        let min: u8 = min.trim().parse().map_err(|_| invalid())?;
        let max: u8 = max.trim().parse().map_err(|_| invalid())?;
        if min >= max {
            return Err(invalid());
        }
        Ok(Self { min, max })
    }
}

// ---------------------------------------------------------------------------
// Organization settings
// ---------------------------------------------------------------------------

/// Settings exposed by the backend's `/api/settings` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationSettings {
    pub evaluation_scale_objectives: String,
    pub evaluation_scale_competencies: String,
    pub weight_objectives: i32,
    pub weight_competencies: i32,
}

impl Default for OrganizationSettings {
    fn default() -> Self {
        Self {
            evaluation_scale_objectives: DEFAULT_RATING_SCALE.to_string(),
            evaluation_scale_competencies: DEFAULT_RATING_SCALE.to_string(),
            weight_objectives: DEFAULT_OBJECTIVES_WEIGHT as i32,
            weight_competencies: DEFAULT_COMPETENCIES_WEIGHT as i32,
        }
    }
}

impl OrganizationSettings {
    pub fn ensure_valid(&self) -> Result<(), CoreError> {
        RatingScale::parse(&self.evaluation_scale_objectives)?;
        RatingScale::parse(&self.evaluation_scale_competencies)?;
        if self.weight_objectives < 0 || self.weight_competencies < 0 {
            return Err(CoreError::validation("weight_objectives", "weights must not be negative"));
        }
        if self.weight_objectives.checked_add(self.weight_competencies) != Some(100) {
            return Err(CoreError::WeightConfiguration {
                objectives_weight: f64::from(self.weight_objectives),
                competencies_weight: f64::from(self.weight_competencies),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scoring configuration
// ---------------------------------------------------------------------------

/// Parameters of the scoring and status model.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Fraction (0..1) by which elapsed time may exceed progress before an
    /// objective is at risk.
    pub at_risk_tolerance: f64,
    /// Top of the competency rating scale.
    pub max_competency_level: u8,
    /// Component weights applied to evaluations that omit their own.
    pub default_objectives_weight: f64,
    pub default_competencies_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            at_risk_tolerance: DEFAULT_AT_RISK_TOLERANCE,
            max_competency_level: DEFAULT_MAX_COMPETENCY_LEVEL,
            default_objectives_weight: DEFAULT_OBJECTIVES_WEIGHT,
            default_competencies_weight: DEFAULT_COMPETENCIES_WEIGHT,
        }
    }
}

impl ScoringConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `OKR_AT_RISK_TOLERANCE`     | `0.20`  |
    /// | `OKR_MAX_COMPETENCY_LEVEL`  | `5`     |
    pub fn from_env() -> Result<Self, CoreError> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("OKR_AT_RISK_TOLERANCE") {
            let tolerance: f64 = raw.trim().parse().map_err(|_| {
                CoreError::validation("OKR_AT_RISK_TOLERANCE", format!("not a number: '{raw}'"))
            })?;
            crate::threshold_validation::validate_unit_range(tolerance, "OKR_AT_RISK_TOLERANCE")?;
            config.at_risk_tolerance = tolerance;
        }

        if let Ok(raw) = std::env::var("OKR_MAX_COMPETENCY_LEVEL") {
            let level: u8 = raw.trim().parse().map_err(|_| {
                CoreError::validation("OKR_MAX_COMPETENCY_LEVEL", format!("not a level: '{raw}'"))
            })?;
            if level < 2 {
                return Err(CoreError::validation(
                    "OKR_MAX_COMPETENCY_LEVEL",
                    "must be at least 2",
                ));
            }
            config.max_competency_level = level;
        }

        Ok(config)
    }

    /// Derive scoring parameters from organization settings. The competency
    /// scale's upper bound becomes `max_competency_level`.
    pub fn from_settings(settings: &OrganizationSettings) -> Result<Self, CoreError> {
        settings.ensure_valid()?;
        let scale = RatingScale::parse(&settings.evaluation_scale_competencies)?;
        Ok(Self {
            max_competency_level: scale.max,
            default_objectives_weight: f64::from(settings.weight_objectives),
            default_competencies_weight: f64::from(settings.weight_competencies),
            ..Self::default()
        })
    }

    /// Check that the fallback weights sum to 100.
    pub fn ensure_valid(&self) -> Result<(), CoreError> {
        let sum = self.default_objectives_weight + self.default_competencies_weight;
        if (sum - 100.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(CoreError::WeightConfiguration {
                objectives_weight: self.default_objectives_weight,
                competencies_weight: self.default_competencies_weight,
            });
        }
        Ok(())
    }
}
