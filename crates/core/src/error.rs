use crate::types::EntityId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid target {target} on key result {key_result_id}")]
    InvalidTarget {
        key_result_id: EntityId,
        target: f64,
    },

    #[error(
        "Weight configuration error: objectives ({objectives_weight}) + \
         competencies ({competencies_weight}) must equal 100"
    )]
    WeightConfiguration {
        objectives_weight: f64,
        competencies_weight: f64,
    },

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

impl CoreError {
    /// Shorthand for a [`CoreError::Validation`] naming the offending field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<validator::ValidationErrors> for CoreError {
    /// Collapse derive-level validation errors into the first offending field
    /// (sorted by name so the reported field is stable).
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let Some((field, field_errors)) = fields.first() else {
            return Self::validation("unknown", errors.to_string());
        };

        let message = field_errors
            .first()
            .map(|e| match &e.message {
                Some(msg) => msg.to_string(),
                None => e.code.to_string(),
            })
            .unwrap_or_else(|| "invalid value".to_string());

        Self::validation(field.to_string(), message)
    }
}
