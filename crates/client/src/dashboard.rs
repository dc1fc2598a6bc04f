//! Response shapes of the `/api/dashboard` endpoints.
//!
//! These are the backend's own aggregates. The report binary recomputes the
//! same figures locally with `okr_core` and attaches these next to them.

use serde::{Deserialize, Serialize};

use okr_core::decimal::f64_lenient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDashboardMetrics {
    pub total_objectives: u32,
    pub completed_objectives: u32,
    #[serde(deserialize_with = "f64_lenient")]
    pub avg_progress: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub on_track_percentage: f64,
    pub at_risk_count: u32,
    /// Check-ins recorded during the last seven days.
    pub pending_check_ins: u32,
    pub upcoming_deadlines: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDepartmentProgress {
    pub name: String,
    #[serde(deserialize_with = "f64_lenient")]
    pub progress: f64,
    pub objectives: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteMonthlyProgress {
    pub month: String,
    #[serde(deserialize_with = "f64_lenient")]
    pub progress: f64,
}

/// The three dashboard aggregates the backend computes for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendFigures {
    pub metrics: RemoteDashboardMetrics,
    pub departments: Vec<RemoteDepartmentProgress>,
    pub monthly: Vec<RemoteMonthlyProgress>,
}
