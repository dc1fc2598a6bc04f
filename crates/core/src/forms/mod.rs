//! Dialog form state.
//!
//! Each form is an explicit struct initialized from an optional existing
//! record, mutated through small setters, and turned back into a validated
//! domain value with `build`. `reset` restores the state a fresh dialog would
//! show for the given record.

mod competency_form;
mod evaluation_form;
mod objective_form;

pub use competency_form::CompetencyForm;
pub use evaluation_form::{EvaluationForm, Rater};
pub use objective_form::{KeyResultDraft, ObjectiveForm, DEFAULT_OBJECTIVE_WEIGHT};
