//! Organizational competencies and their rating levels.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::EntityId;

pub const MIN_COMPETENCY_LEVELS: u8 = 3;
pub const MAX_COMPETENCY_LEVELS: u8 = 5;

/// Default level descriptions offered when a competency is created.
pub const DEFAULT_LEVEL_DESCRIPTIONS: &[(u8, &str)] = &[
    (1, "Does not demonstrate the competency"),
    (2, "Basic level, requires supervision"),
    (3, "Competent, works independently"),
    (4, "Advanced, can teach others"),
    (5, "Role model, leads initiatives"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetencyCategory {
    #[default]
    Core,
    Leadership,
    Technical,
    Functional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Competency {
    pub id: EntityId,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[validate(range(min = 3, max = 5, message = "must be between 3 and 5"))]
    pub levels: u8,
    #[serde(default)]
    pub level_descriptions: BTreeMap<u8, String>,
    #[serde(default)]
    pub category: CompetencyCategory,
    /// Expected level per role name.
    #[serde(default)]
    pub role_expectations: BTreeMap<String, u8>,
}

/// Level descriptions `1..=levels` taken from [`DEFAULT_LEVEL_DESCRIPTIONS`].
pub fn default_level_descriptions(levels: u8) -> BTreeMap<u8, String> {
    DEFAULT_LEVEL_DESCRIPTIONS
        .iter()
        .filter(|(level, _)| *level <= levels)
        .map(|(level, text)| (*level, text.to_string()))
        .collect()
}

impl Competency {
    /// Re-check invariants: level count, description keys and role
    /// expectations must all fit within `1..=levels`.
    pub fn ensure_valid(&self) -> Result<(), CoreError> {
        self.validate()?;
        if let Some(level) = self
            .level_descriptions
            .keys()
            .find(|l| **l < 1 || **l > self.levels)
        {
            return Err(CoreError::validation(
                "level_descriptions",
                format!("level {level} is outside 1..={}", self.levels),
            ));
        }
        if let Some((role, level)) = self
            .role_expectations
            .iter()
            .find(|(_, l)| **l < 1 || **l > self.levels)
        {
            return Err(CoreError::validation(
                "role_expectations",
                format!("role '{role}' expects level {level}, outside 1..={}", self.levels),
            ));
        }
        Ok(())
    }

    /// Change the number of levels. See [`resize_scale`].
    pub fn set_levels(&mut self, levels: u8) -> Result<(), CoreError> {
        resize_scale(
            levels,
            &mut self.level_descriptions,
            &mut self.role_expectations,
        )?;
        self.levels = levels;
        Ok(())
    }

    /// Expected level for a role, if configured.
    pub fn expected_level_for(&self, role: &str) -> Option<u8> {
        self.role_expectations.get(role).copied()
    }
}

/// Resize a rating scale to `levels`.
///
/// Descriptions above the new top level are dropped and missing ones get
/// defaults. Role expectations above the new top level are clamped to it.
pub fn resize_scale(
    levels: u8,
    level_descriptions: &mut BTreeMap<u8, String>,
    role_expectations: &mut BTreeMap<String, u8>,
) -> Result<(), CoreError> {
    if !(MIN_COMPETENCY_LEVELS..=MAX_COMPETENCY_LEVELS).contains(&levels) {
        return Err(CoreError::validation(
            "levels",
            format!(
                "must be between {MIN_COMPETENCY_LEVELS} and {MAX_COMPETENCY_LEVELS}, \
                 got {levels}"
            ),
        ));
    }
    level_descriptions.retain(|l, _| *l <= levels);
    for (level, text) in default_level_descriptions(levels) {
        level_descriptions.entry(level).or_insert(text);
    }
    for level in role_expectations.values_mut() {
        *level = (*level).min(levels);
    }
    Ok(())
}
