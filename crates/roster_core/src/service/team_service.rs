//! Team use-case service.

use crate::model::team::{Team, TeamId};
use crate::repo::member_repo::RepoResult;
use crate::repo::team_repo::TeamRepository;

/// Use-case service wrapper for team persistence.
pub struct TeamService<R: TeamRepository> {
    repo: R,
}

impl<R: TeamRepository> TeamService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a new team and returns the stored state, id included.
    pub fn create_team(&self, name: impl Into<String>) -> RepoResult<Team> {
        self.repo.save(Team::new(name))
    }

    /// Gets one team by id.
    pub fn team(&self, id: TeamId) -> RepoResult<Option<Team>> {
        self.repo.find_by_id(id)
    }

    /// All teams.
    pub fn teams(&self) -> RepoResult<Vec<Team>> {
        self.repo.find_all()
    }

    /// Removes a team by id. Fails with a constraint error while members
    /// still reference it.
    pub fn disband(&self, id: TeamId) -> RepoResult<()> {
        self.repo.delete(id)
    }
}
