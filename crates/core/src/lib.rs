//! OKR domain model and performance-scoring logic.
//!
//! Entity types for objectives, key results, check-ins, cycles,
//! competencies, evaluations, team members and development plans, plus the
//! pure computations the dashboards and evaluation screens rely on:
//! progress aggregation, evaluation scoring, status classification and
//! score banding. Nothing in this crate performs I/O.

pub mod bands;
pub mod check_in;
pub mod competency;
pub mod cycle;
pub mod dashboard;
pub mod decimal;
pub mod error;
pub mod evaluation;
pub mod forms;
pub mod objective;
pub mod pdi;
pub mod progress;
pub mod scoring;
pub mod settings;
pub mod status;
pub mod team;
pub mod threshold_validation;
pub mod types;

pub use error::CoreError;
