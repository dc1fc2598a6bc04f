//! Objective status classification and the approval state machine.
//!
//! Status is derived from progress and the objective's date window. The
//! stored status on an objective may have been set manually in the UI;
//! [`assess_status`] reports when the two disagree.

use chrono::{NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::check_in::CheckIn;
use crate::error::CoreError;
use crate::objective::Objective;
use crate::progress::objective_progress;
use crate::settings::ScoringConfig;
use crate::types::{Date, Timestamp};

/// Default tolerance (as a fraction) by which elapsed time may exceed
/// progress before an objective is considered at risk.
pub const DEFAULT_AT_RISK_TOLERANCE: f64 = 0.20;

// ---------------------------------------------------------------------------
// Objective status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectiveStatus {
    #[default]
    NotStarted,
    OnTrack,
    AtRisk,
    Delayed,
    Completed,
}

impl ObjectiveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::OnTrack => "on-track",
            Self::AtRisk => "at-risk",
            Self::Delayed => "delayed",
            Self::Completed => "completed",
        }
    }

    /// `completed` is the only terminal status.
    pub fn is_terminal(self) -> bool {
        self == Self::Completed
    }
}

/// The time window of an objective: from the start of `start_date` up to
/// (but excluding) the day after `end_date`, both in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectiveWindow {
    pub start_date: Date,
    pub end_date: Date,
}

impl ObjectiveWindow {
    pub fn new(start_date: Date, end_date: Date) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    pub fn starts_at(&self) -> Timestamp {
        Utc.from_utc_datetime(&self.start_date.and_time(NaiveTime::MIN))
    }

    pub fn ends_at(&self) -> Timestamp {
        let day_after = self.end_date + chrono::Duration::days(1);
        Utc.from_utc_datetime(&day_after.and_time(NaiveTime::MIN))
    }

    /// Fraction of the window that has elapsed at `now`, clamped to `[0, 1]`.
    pub fn elapsed_fraction(&self, now: Timestamp) -> f64 {
        let total = (self.ends_at() - self.starts_at()).num_seconds();
        if total <= 0 {
            return 1.0;
        }
        let elapsed = (now - self.starts_at()).num_seconds();
        (elapsed as f64 / total as f64).clamp(0.0, 1.0)
    }
}

/// Classify an objective from its progress (0-100) and window.
///
/// Rules are checked in order: completed, delayed, not started (before the
/// window opens with no progress), at risk, on track. An objective inside its
/// window with zero progress that is not yet at risk stays `not-started`.
pub fn classify_status(
    progress: f64,
    window: &ObjectiveWindow,
    now: Timestamp,
    tolerance: f64,
) -> ObjectiveStatus {
    if progress >= 100.0 {
        return ObjectiveStatus::Completed;
    }
    if now >= window.ends_at() {
        return ObjectiveStatus::Delayed;
    }
    if now < window.starts_at() && progress <= 0.0 {
        return ObjectiveStatus::NotStarted;
    }

    let elapsed = window.elapsed_fraction(now);
    let done = (progress / 100.0).clamp(0.0, 1.0);
    if elapsed - done > tolerance {
        return ObjectiveStatus::AtRisk;
    }
    if progress > 0.0 {
        ObjectiveStatus::OnTrack
    } else {
        ObjectiveStatus::NotStarted
    }
}

/// Derived status next to the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusAssessment {
    pub progress: u8,
    pub derived: ObjectiveStatus,
    pub stored: ObjectiveStatus,
    /// `true` when the stored status was set to something other than what
    /// progress and deadline imply (manual override in the UI).
    pub overridden: bool,
}

/// Derive the status of an objective and compare it with the stored value.
pub fn assess_status(
    objective: &Objective,
    check_ins: &[CheckIn],
    now: Timestamp,
    config: &ScoringConfig,
) -> Result<StatusAssessment, CoreError> {
    let progress = objective_progress(objective, check_ins)?;
    let derived = classify_status(
        f64::from(progress),
        &objective.window(),
        now,
        config.at_risk_tolerance,
    );
    if derived != objective.status {
        tracing::debug!(
            objective_id = %objective.id,
            stored = objective.status.as_str(),
            derived = derived.as_str(),
            "Stored objective status differs from derived status"
        );
    }
    Ok(StatusAssessment {
        progress,
        derived,
        stored: objective.status,
        overridden: derived != objective.status,
    })
}

// ---------------------------------------------------------------------------
// Approval state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    #[default]
    Draft,
    Pending,
    Approved,
    Rejected,
}

/// Reviewer or owner actions that move an objective through approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalAction {
    Submit,
    Approve,
    Reject,
    Reopen,
}

impl ApprovalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// States reachable from `self`. `approved` is terminal for the cycle.
    pub fn valid_transitions(self) -> &'static [ApprovalStatus] {
        match self {
            Self::Draft => &[Self::Pending],
            Self::Pending => &[Self::Approved, Self::Rejected],
            Self::Rejected => &[Self::Draft],
            Self::Approved => &[],
        }
    }

    pub fn can_transition(self, to: ApprovalStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    pub fn transition_to(self, to: ApprovalStatus) -> Result<ApprovalStatus, CoreError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(CoreError::InvalidTransition {
                from: self.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }

    /// Apply an action, returning the resulting state.
    pub fn apply(self, action: ApprovalAction) -> Result<ApprovalStatus, CoreError> {
        let target = match action {
            ApprovalAction::Submit => Self::Pending,
            ApprovalAction::Approve => Self::Approved,
            ApprovalAction::Reject => Self::Rejected,
            ApprovalAction::Reopen => Self::Draft,
        };
        self.transition_to(target)
    }

    pub fn is_terminal(self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    /// 100-day window: 2026-01-01 ..= 2026-04-10.
    fn window() -> ObjectiveWindow {
        ObjectiveWindow::new(date(2026, 1, 1), date(2026, 4, 10))
    }

    // -- window --------------------------------------------------------------

    #[test]
    fn elapsed_fraction_is_clamped() {
        let w = window();
        assert_eq!(w.elapsed_fraction(at(2025, 12, 1)), 0.0);
        assert_eq!(w.elapsed_fraction(at(2026, 6, 1)), 1.0);
        let half = w.elapsed_fraction(at(2026, 2, 20));
        assert!((half - 0.5).abs() < 1e-9);
    }

    #[test]
    fn end_date_is_inclusive() {
        let w = window();
        assert!(at(2026, 4, 10) < w.ends_at());
        assert_eq!(w.ends_at(), at(2026, 4, 11));
    }

    // -- classifier ----------------------------------------------------------

    #[test]
    fn completed_wins_over_everything() {
        let s = classify_status(100.0, &window(), at(2027, 1, 1), 0.2);
        assert_eq!(s, ObjectiveStatus::Completed);
    }

    #[test]
    fn past_end_date_is_delayed() {
        let s = classify_status(99.0, &window(), at(2026, 4, 11), 0.2);
        assert_eq!(s, ObjectiveStatus::Delayed);
    }

    #[test]
    fn before_start_with_no_progress_is_not_started() {
        let s = classify_status(0.0, &window(), at(2025, 12, 15), 0.2);
        assert_eq!(s, ObjectiveStatus::NotStarted);
    }

    #[test]
    fn low_progress_late_in_window_is_at_risk() {
        // 90 of 100 days elapsed, 10% done.
        let s = classify_status(10.0, &window(), at(2026, 4, 1), 0.2);
        assert_eq!(s, ObjectiveStatus::AtRisk);
    }

    #[test]
    fn gap_within_tolerance_is_on_track() {
        // 50% elapsed, 35% done: gap of 15 points.
        let s = classify_status(35.0, &window(), at(2026, 2, 20), 0.2);
        assert_eq!(s, ObjectiveStatus::OnTrack);
    }

    #[test]
    fn tolerance_is_configurable() {
        let s = classify_status(35.0, &window(), at(2026, 2, 20), 0.1);
        assert_eq!(s, ObjectiveStatus::AtRisk);
    }

    #[test]
    fn zero_progress_early_in_window_stays_not_started() {
        let s = classify_status(0.0, &window(), at(2026, 1, 5), 0.2);
        assert_eq!(s, ObjectiveStatus::NotStarted);
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&ObjectiveStatus::AtRisk).unwrap();
        assert_eq!(json, "\"at-risk\"");
        let parsed: ObjectiveStatus = serde_json::from_str("\"not-started\"").unwrap();
        assert_eq!(parsed, ObjectiveStatus::NotStarted);
    }

    // -- approval ------------------------------------------------------------

    #[test]
    fn draft_submits_to_pending() {
        assert_eq!(
            ApprovalStatus::Draft.apply(ApprovalAction::Submit).unwrap(),
            ApprovalStatus::Pending
        );
    }

    #[test]
    fn pending_can_be_approved_or_rejected() {
        assert!(ApprovalStatus::Pending.can_transition(ApprovalStatus::Approved));
        assert!(ApprovalStatus::Pending.can_transition(ApprovalStatus::Rejected));
    }

    #[test]
    fn rejected_can_be_reopened_as_draft() {
        assert_eq!(
            ApprovalStatus::Rejected.apply(ApprovalAction::Reopen).unwrap(),
            ApprovalStatus::Draft
        );
    }

    #[test]
    fn approved_is_terminal() {
        assert!(ApprovalStatus::Approved.is_terminal());
        assert_matches!(
            ApprovalStatus::Approved.apply(ApprovalAction::Reopen),
            Err(CoreError::InvalidTransition { from, to }) if from == "approved" && to == "draft"
        );
    }

    #[test]
    fn draft_cannot_be_approved_directly() {
        assert!(ApprovalStatus::Draft
            .apply(ApprovalAction::Approve)
            .is_err());
    }
}
