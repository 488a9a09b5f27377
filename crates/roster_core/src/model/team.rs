//! Team domain model.
//!
//! # Responsibility
//! - Represent one named team that members can belong to.
//!
//! # Invariants
//! - `id` is assigned by the store on first save and never reused.
//! - The member collection of a team is derived on demand (query by
//!   `member.team_id`), so this struct carries no back-references.

use serde::{Deserialize, Serialize};

/// Stable store-assigned team identifier.
pub type TeamId = i64;

/// Persisted team record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// `None` until the first save; the store assigns the key on insert.
    pub id: Option<TeamId>,
    /// Team display name.
    pub name: String,
}

impl Team {
    /// Creates a not-yet-persisted team.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    /// Returns whether this team has been persisted at least once.
    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }
}
