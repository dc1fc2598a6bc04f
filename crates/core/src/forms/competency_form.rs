use std::collections::BTreeMap;

use crate::competency::{
    default_level_descriptions, resize_scale, Competency, CompetencyCategory, MAX_COMPETENCY_LEVELS,
};
use crate::error::CoreError;
use crate::types::EntityId;

#[derive(Debug, Clone, PartialEq)]
pub struct CompetencyForm {
    pub name: String,
    pub description: String,
    pub category: CompetencyCategory,
    levels: u8,
    level_descriptions: BTreeMap<u8, String>,
    role_expectations: BTreeMap<String, u8>,
}

impl Default for CompetencyForm {
    fn default() -> Self {
        Self::new(None)
    }
}

impl CompetencyForm {
    /// Form for a new competency (five default levels) or for editing one.
    pub fn new(initial: Option<&Competency>) -> Self {
        match initial {
            Some(c) => {
                let mut level_descriptions = default_level_descriptions(c.levels);
                level_descriptions.extend(c.level_descriptions.clone());
                Self {
                    name: c.name.clone(),
                    description: c.description.clone().unwrap_or_default(),
                    category: c.category,
                    levels: c.levels,
                    level_descriptions,
                    role_expectations: c.role_expectations.clone(),
                }
            }
            None => Self {
                name: String::new(),
                description: String::new(),
                category: CompetencyCategory::default(),
                levels: MAX_COMPETENCY_LEVELS,
                level_descriptions: default_level_descriptions(MAX_COMPETENCY_LEVELS),
                role_expectations: BTreeMap::new(),
            },
        }
    }

    pub fn reset(&mut self, initial: Option<&Competency>) {
        *self = Self::new(initial);
    }

    pub fn levels(&self) -> u8 {
        self.levels
    }

    pub fn level_descriptions(&self) -> &BTreeMap<u8, String> {
        &self.level_descriptions
    }

    pub fn role_expectations(&self) -> &BTreeMap<String, u8> {
        &self.role_expectations
    }

    /// Resize the scale the same way [`Competency::set_levels`] does.
    pub fn set_levels(&mut self, levels: u8) -> Result<(), CoreError> {
        resize_scale(
            levels,
            &mut self.level_descriptions,
            &mut self.role_expectations,
        )?;
        self.levels = levels;
        Ok(())
    }

    pub fn set_level_description(
        &mut self,
        level: u8,
        text: impl Into<String>,
    ) -> Result<(), CoreError> {
        self.check_level(level, "level_descriptions")?;
        self.level_descriptions.insert(level, text.into());
        Ok(())
    }

    pub fn set_role_expectation(
        &mut self,
        role: impl Into<String>,
        level: u8,
    ) -> Result<(), CoreError> {
        self.check_level(level, "role_expectations")?;
        self.role_expectations.insert(role.into(), level);
        Ok(())
    }

    pub fn remove_role_expectation(&mut self, role: &str) {
        self.role_expectations.remove(role);
    }

    pub fn build(&self, id: impl Into<EntityId>) -> Result<Competency, CoreError> {
        let description = Some(self.description.trim().to_string()).filter(|d| !d.is_empty());
        let competency = Competency {
            id: id.into(),
            name: self.name.trim().to_string(),
            description,
            levels: self.levels,
            level_descriptions: self.level_descriptions.clone(),
            category: self.category,
            role_expectations: self.role_expectations.clone(),
        };
        competency.ensure_valid()?;
        Ok(competency)
    }

    fn check_level(&self, level: u8, field: &str) -> Result<(), CoreError> {
        if level < 1 || level > self.levels {
            return Err(CoreError::validation(
                field,
                format!("level {level} is outside 1..={}", self.levels),
            ));
        }
        Ok(())
    }
}
