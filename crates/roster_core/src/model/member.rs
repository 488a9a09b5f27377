//! Member domain model.
//!
//! # Responsibility
//! - Represent one person enrolled in the roster.
//! - Own the foreign-key side of the member -> team relationship.
//!
//! # Invariants
//! - `id` is assigned by the store on first save and never changes afterwards.
//! - `team_id` is rewritten only through `change_team`/`leave_team`, so the
//!   derived team view always agrees with the stored key.

use crate::model::team::{Team, TeamId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable store-assigned member identifier.
pub type MemberId = i64;

/// Error raised when linking a member to a team that cannot be referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberLinkError {
    /// The target team was never saved, so it has no key to point at.
    UnsavedTeam,
}

impl Display for MemberLinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsavedTeam => write!(f, "cannot join a team that has not been saved yet"),
        }
    }
}

impl Error for MemberLinkError {}

/// Persisted member record.
///
/// `team_id` is the owning side of the many-to-one link; the matching team
/// member list is derived by query and never kept in memory here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// `None` until the first save; the store assigns the key on insert.
    pub id: Option<MemberId>,
    /// Display name. Not unique across the roster.
    pub username: String,
    /// Age in whole years.
    pub age: u32,
    /// Key of the team this member belongs to, when any.
    pub team_id: Option<TeamId>,
}

impl Member {
    /// Creates a not-yet-persisted member with age 0 and no team.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            age: 0,
            team_id: None,
        }
    }

    /// Creates a not-yet-persisted member with an explicit age.
    pub fn with_age(username: impl Into<String>, age: u32) -> Self {
        Self {
            age,
            ..Self::new(username)
        }
    }

    /// Creates a member already assigned to a persisted team.
    pub fn with_team(
        username: impl Into<String>,
        age: u32,
        team: &Team,
    ) -> Result<Self, MemberLinkError> {
        let mut member = Self::with_age(username, age);
        member.change_team(team)?;
        Ok(member)
    }

    /// Moves this member onto `team`.
    ///
    /// This is the only sanctioned way to establish the relationship: it
    /// rewrites the owning key, and because the team side is derived by
    /// query there is no second copy that could disagree.
    ///
    /// # Errors
    /// - `MemberLinkError::UnsavedTeam` when `team` has no id yet.
    pub fn change_team(&mut self, team: &Team) -> Result<(), MemberLinkError> {
        match team.id {
            Some(team_id) => {
                self.team_id = Some(team_id);
                Ok(())
            }
            None => Err(MemberLinkError::UnsavedTeam),
        }
    }

    /// Detaches this member from its current team, if any.
    pub fn leave_team(&mut self) {
        self.team_id = None;
    }

    /// Returns whether this member has been persisted at least once.
    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }
}
