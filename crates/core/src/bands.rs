//! Shared banding tables for scores and progress.
//!
//! Every screen that colors or labels a score reads these tables; the
//! thresholds are declared exactly once.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Score bands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Excellent,
    Good,
    Warning,
    Critical,
}

/// Lower bounds (inclusive) of each score band, highest first. Scores below
/// the last entry are [`ScoreBand::Critical`].
pub const SCORE_BANDS: &[(f64, ScoreBand)] = &[
    (85.0, ScoreBand::Excellent),
    (70.0, ScoreBand::Good),
    (50.0, ScoreBand::Warning),
];

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        SCORE_BANDS
            .iter()
            .find(|(min, _)| score >= *min)
            .map(|(_, band)| *band)
            .unwrap_or(Self::Critical)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

// ---------------------------------------------------------------------------
// Progress bands
// ---------------------------------------------------------------------------

/// Coarse progress classes for progress bars on team and report screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressBand {
    OnTrack,
    Normal,
    Low,
    Critical,
}

/// Lower bounds (inclusive) of each progress band, highest first.
pub const PROGRESS_BANDS: &[(f64, ProgressBand)] = &[
    (75.0, ProgressBand::OnTrack),
    (50.0, ProgressBand::Normal),
    (25.0, ProgressBand::Low),
];

impl ProgressBand {
    pub fn from_progress(progress: f64) -> Self {
        PROGRESS_BANDS
            .iter()
            .find(|(min, _)| progress >= *min)
            .map(|(_, band)| *band)
            .unwrap_or(Self::Critical)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnTrack => "on-track",
            Self::Normal => "normal",
            Self::Low => "low",
            Self::Critical => "critical",
        }
    }
}
