//! Departments, team members and the team-level aggregates.
//!
//! Users reach the client in two shapes: the backend's user record (with an
//! optional embedded department) and an older flattened shape carrying
//! display names and camelCase counters. Both are decoded through
//! [`RawTeamMember`] and converted into the one canonical [`TeamMember`].

use serde::{Deserialize, Serialize};

use crate::types::EntityId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub organization_id: Option<EntityId>,
}

/// Canonical team member used by every aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: EntityId,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub department_id: Option<EntityId>,
    pub department_name: Option<String>,
    pub manager_id: Option<EntityId>,
    pub is_active: bool,
    /// Mean progress of the member's objectives, 0-100.
    pub avg_progress: f64,
    pub objectives_count: u32,
    pub pending_check_ins: u32,
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

/// User record as returned by `/api/users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiUser {
    pub id: EntityId,
    pub email: String,
    pub full_name: String,
    pub role: String,
    #[serde(default)]
    pub department_id: Option<EntityId>,
    #[serde(default)]
    pub manager_id: Option<EntityId>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub department: Option<Department>,
}

/// Flattened member shape with display names and camelCase counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyMember {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub avg_progress: f64,
    #[serde(default)]
    pub objectives_count: u32,
    #[serde(default)]
    pub pending_check_ins: u32,
}

/// Either wire shape. The backend shape is tried first.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTeamMember {
    Api(ApiUser),
    Legacy(LegacyMember),
}

impl From<ApiUser> for TeamMember {
    fn from(user: ApiUser) -> Self {
        let department_name = user.department.as_ref().map(|d| d.name.clone());
        let department_id = user
            .department_id
            .or_else(|| user.department.map(|d| d.id));
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
            department_id,
            department_name,
            manager_id: user.manager_id,
            is_active: user.is_active,
            avg_progress: 0.0,
            objectives_count: 0,
            pending_check_ins: 0,
        }
    }
}

impl From<LegacyMember> for TeamMember {
    fn from(member: LegacyMember) -> Self {
        let department_name = Some(member.department).filter(|d| !d.trim().is_empty());
        Self {
            id: member.id,
            full_name: member.name,
            email: member.email,
            role: member.role,
            department_id: None,
            department_name,
            manager_id: None,
            is_active: true,
            avg_progress: member.avg_progress,
            objectives_count: member.objectives_count,
            pending_check_ins: member.pending_check_ins,
        }
    }
}

impl From<RawTeamMember> for TeamMember {
    fn from(raw: RawTeamMember) -> Self {
        match raw {
            RawTeamMember::Api(user) => user.into(),
            RawTeamMember::Legacy(member) => member.into(),
        }
    }
}

impl TeamMember {
    /// Department display name, or the id when no name is known.
    pub fn department_label(&self) -> &str {
        self.department_name
            .as_deref()
            .or(self.department_id.as_deref())
            .unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeamStats {
    pub total_members: usize,
    /// Rounded mean of the members' `avg_progress`; 0 for an empty team.
    pub avg_progress: u8,
    pub total_objectives: u32,
    pub pending_check_ins: u32,
}

pub fn team_stats(members: &[TeamMember]) -> TeamStats {
    if members.is_empty() {
        return TeamStats::default();
    }
    let mean = members.iter().map(|m| m.avg_progress).sum::<f64>() / members.len() as f64;
    TeamStats {
        total_members: members.len(),
        avg_progress: mean.round().clamp(0.0, 100.0) as u8,
        total_objectives: members.iter().map(|m| m.objectives_count).sum(),
        pending_check_ins: members.iter().map(|m| m.pending_check_ins).sum(),
    }
}

/// Members whose name or department contains `query`, ignoring case. An
/// empty query matches everyone.
pub fn filter_members<'a>(members: &'a [TeamMember], query: &str) -> Vec<&'a TeamMember> {
    let needle = query.trim().to_lowercase();
    members
        .iter()
        .filter(|m| {
            needle.is_empty()
                || m.full_name.to_lowercase().contains(&needle)
                || m.department_label().to_lowercase().contains(&needle)
        })
        .collect()
}
