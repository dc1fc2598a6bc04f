use uuid::Uuid;

use crate::error::CoreError;
use crate::objective::{CreateKeyResult, CreateObjective, Methodology, Objective, ObjectiveType};
use crate::types::{Date, EntityId};

/// Weight pre-filled for a new objective.
pub const DEFAULT_OBJECTIVE_WEIGHT: f64 = 25.0;

/// An editable key result row. `draft_id` only identifies the row inside the
/// form; the persisted key result gets its own id.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyResultDraft {
    pub draft_id: Uuid,
    pub title: String,
    pub metric: String,
    pub target: f64,
    pub current: f64,
    pub unit: String,
}

impl KeyResultDraft {
    pub fn empty() -> Self {
        Self {
            draft_id: Uuid::new_v4(),
            title: String::new(),
            metric: String::new(),
            target: 0.0,
            current: 0.0,
            unit: String::new(),
        }
    }

    fn to_create(&self) -> CreateKeyResult {
        CreateKeyResult {
            title: self.title.trim().to_string(),
            metric: Some(self.metric.trim().to_string()).filter(|m| !m.is_empty()),
            target: self.target,
            current: self.current,
            unit: self.unit.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveForm {
    pub title: String,
    pub description: String,
    pub objective_type: ObjectiveType,
    pub department_id: Option<EntityId>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub weight: f64,
    pub methodology: Methodology,
    key_results: Vec<KeyResultDraft>,
}

impl ObjectiveForm {
    pub fn new(initial: Option<&Objective>) -> Self {
        match initial {
            Some(o) => {
                let mut key_results: Vec<KeyResultDraft> = o
                    .key_results
                    .iter()
                    .map(|kr| KeyResultDraft {
                        draft_id: Uuid::new_v4(),
                        title: kr.title.clone(),
                        metric: kr.metric.clone().unwrap_or_default(),
                        target: kr.target,
                        current: kr.current,
                        unit: kr.unit.clone(),
                    })
                    .collect();
                if key_results.is_empty() {
                    key_results.push(KeyResultDraft::empty());
                }
                Self {
                    title: o.title.clone(),
                    description: o.description.clone().unwrap_or_default(),
                    objective_type: o.objective_type,
                    department_id: o.department_id.clone(),
                    start_date: Some(o.start_date),
                    end_date: Some(o.end_date),
                    weight: o.weight,
                    methodology: o.methodology,
                    key_results,
                }
            }
            None => Self {
                title: String::new(),
                description: String::new(),
                objective_type: ObjectiveType::Strategic,
                department_id: None,
                start_date: None,
                end_date: None,
                weight: DEFAULT_OBJECTIVE_WEIGHT,
                methodology: Methodology::default(),
                key_results: vec![KeyResultDraft::empty()],
            },
        }
    }

    pub fn reset(&mut self, initial: Option<&Objective>) {
        *self = Self::new(initial);
    }

    pub fn key_results(&self) -> &[KeyResultDraft] {
        &self.key_results
    }

    /// Append an empty key result row and return its draft id.
    pub fn add_key_result(&mut self) -> Uuid {
        let draft = KeyResultDraft::empty();
        let id = draft.draft_id;
        self.key_results.push(draft);
        id
    }

    /// Remove a row. The last remaining row cannot be removed.
    pub fn remove_key_result(&mut self, draft_id: Uuid) -> bool {
        if self.key_results.len() <= 1 {
            return false;
        }
        let before = self.key_results.len();
        self.key_results.retain(|kr| kr.draft_id != draft_id);
        self.key_results.len() != before
    }

    /// Edit a row in place. Returns `false` if no row has `draft_id`.
    pub fn update_key_result(
        &mut self,
        draft_id: Uuid,
        edit: impl FnOnce(&mut KeyResultDraft),
    ) -> bool {
        match self.key_results.iter_mut().find(|kr| kr.draft_id == draft_id) {
            Some(kr) => {
                edit(kr);
                true
            }
            None => false,
        }
    }

    /// The create payload this form describes, validated.
    pub fn to_create(
        &self,
        owner_id: impl Into<EntityId>,
        cycle_id: impl Into<EntityId>,
    ) -> Result<CreateObjective, CoreError> {
        let start_date = self
            .start_date
            .ok_or_else(|| CoreError::validation("start_date", "is required"))?;
        let end_date = self
            .end_date
            .ok_or_else(|| CoreError::validation("end_date", "is required"))?;
        let input = CreateObjective {
            title: self.title.trim().to_string(),
            description: Some(self.description.trim().to_string()).filter(|d| !d.is_empty()),
            objective_type: self.objective_type,
            owner_id: owner_id.into(),
            department_id: self.department_id.clone(),
            cycle_id: cycle_id.into(),
            start_date,
            end_date,
            weight: self.weight,
            methodology: self.methodology,
            key_results: self.key_results.iter().map(KeyResultDraft::to_create).collect(),
        };
        crate::objective::validate_create_objective(&input)?;
        Ok(input)
    }

    /// Build a new objective from the form.
    pub fn build(
        &self,
        id: impl Into<EntityId>,
        owner_id: impl Into<EntityId>,
        cycle_id: impl Into<EntityId>,
    ) -> Result<Objective, CoreError> {
        Objective::new(id, self.to_create(owner_id, cycle_id)?)
    }
}

impl Default for ObjectiveForm {
    fn default() -> Self {
        Self::new(None)
    }
}
