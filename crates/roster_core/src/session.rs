//! Unit-of-work session with per-scope identity maps.
//!
//! # Responsibility
//! - Scope data access to one transaction with an explicit commit.
//! - Guarantee a single in-memory instance per id inside the scope, so
//!   repeated lookups never produce divergent copies.
//!
//! # Invariants
//! - Identity maps live and die with the session; nothing is ambient state.
//! - Cached instances win over freshly read rows for the same id.
//! - Dropping an uncommitted session rolls the transaction back.

use crate::model::member::{Member, MemberId};
use crate::model::team::{Team, TeamId};
use crate::repo::member_repo::{self, MemberQuery, RepoResult};
use crate::repo::team_repo;
use log::debug;
use rusqlite::{Connection, Transaction};
use std::collections::HashMap;

/// One unit of work: a transaction plus explicit id -> instance caches.
pub struct Session<'conn> {
    tx: Transaction<'conn>,
    members: HashMap<MemberId, Member>,
    teams: HashMap<TeamId, Team>,
}

impl<'conn> Session<'conn> {
    /// Begins a unit of work.
    ///
    /// Schema and query registries are validated before the transaction
    /// opens, so a misconfigured store fails here instead of on the first
    /// query inside the scope.
    pub fn begin(conn: &'conn mut Connection) -> RepoResult<Self> {
        member_repo::ensure_member_schema(conn)?;
        team_repo::ensure_team_schema(conn)?;

        let tx = conn.transaction()?;
        debug!("event=session_begin module=session status=ok");
        Ok(Self {
            tx,
            members: HashMap::new(),
            teams: HashMap::new(),
        })
    }

    /// Returns the member for `id`, loading it on first access.
    ///
    /// A second lookup of the same id returns the cached instance without a
    /// store round trip, so edits made through `member_mut` stay visible.
    pub fn member(&mut self, id: MemberId) -> RepoResult<Option<&Member>> {
        self.load_member(id)?;
        Ok(self.members.get(&id))
    }

    /// Mutable view of the cached member for `id`, loading it on first
    /// access. Edits are persisted by `save_member`, not implicitly.
    pub fn member_mut(&mut self, id: MemberId) -> RepoResult<Option<&mut Member>> {
        self.load_member(id)?;
        Ok(self.members.get_mut(&id))
    }

    /// Writes a member through the transaction and refreshes the cache.
    pub fn save_member(&mut self, member: Member) -> RepoResult<Member> {
        let saved = member_repo::save_member(&self.tx, member)?;
        if let Some(id) = saved.id {
            self.members.insert(id, saved.clone());
        }
        Ok(saved)
    }

    /// Deletes a member and drops it from the identity map.
    pub fn delete_member(&mut self, id: MemberId) -> RepoResult<()> {
        member_repo::delete_member(&self.tx, id)?;
        self.members.remove(&id);
        Ok(())
    }

    /// Returns the team for `id`, loading it on first access.
    pub fn team(&mut self, id: TeamId) -> RepoResult<Option<&Team>> {
        self.load_team(id)?;
        Ok(self.teams.get(&id))
    }

    /// Mutable view of the cached team for `id`, loading it on first access.
    pub fn team_mut(&mut self, id: TeamId) -> RepoResult<Option<&mut Team>> {
        self.load_team(id)?;
        Ok(self.teams.get_mut(&id))
    }

    /// Writes a team through the transaction and refreshes the cache.
    pub fn save_team(&mut self, team: Team) -> RepoResult<Team> {
        let saved = team_repo::save_team(&self.tx, team)?;
        if let Some(id) = saved.id {
            self.teams.insert(id, saved.clone());
        }
        Ok(saved)
    }

    /// Deletes a team and drops it from the identity map.
    pub fn delete_team(&mut self, id: TeamId) -> RepoResult<()> {
        team_repo::delete_team(&self.tx, id)?;
        self.teams.remove(&id);
        Ok(())
    }

    /// Moves a member onto a team in one statement.
    ///
    /// The stored key and the derived team view change together, so no
    /// intermediate disagreeing state is observable from this scope.
    pub fn assign_team(&mut self, member_id: MemberId, team_id: TeamId) -> RepoResult<()> {
        member_repo::assign_team(&self.tx, member_id, team_id)?;
        if let Some(cached) = self.members.get_mut(&member_id) {
            cached.team_id = Some(team_id);
        }
        Ok(())
    }

    /// Derived member collection of a team, reconciled with the identity
    /// map: for ids already loaded in this scope the cached instance wins
    /// over the freshly read row.
    pub fn members_of(&mut self, team_id: TeamId) -> RepoResult<Vec<Member>> {
        let rows = member_repo::select_members(&self.tx, &MemberQuery::Team { team_id })?;

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            match row.id {
                Some(id) => {
                    let canonical = self.members.entry(id).or_insert(row);
                    result.push(canonical.clone());
                }
                None => result.push(row),
            }
        }
        Ok(result)
    }

    /// Commits the unit of work. Identity maps are discarded with the
    /// session either way.
    pub fn commit(self) -> RepoResult<()> {
        self.tx.commit()?;
        debug!("event=session_commit module=session status=ok");
        Ok(())
    }

    /// Explicitly rolls the unit of work back; dropping the session without
    /// committing has the same effect.
    pub fn rollback(self) -> RepoResult<()> {
        self.tx.rollback()?;
        debug!("event=session_rollback module=session status=ok");
        Ok(())
    }

    fn load_member(&mut self, id: MemberId) -> RepoResult<()> {
        if self.members.contains_key(&id) {
            return Ok(());
        }
        if let Some(found) = member_repo::fetch_member_by_id(&self.tx, id)? {
            self.members.insert(id, found);
        }
        Ok(())
    }

    fn load_team(&mut self, id: TeamId) -> RepoResult<()> {
        if self.teams.contains_key(&id) {
            return Ok(());
        }
        if let Some(found) = team_repo::fetch_team_by_id(&self.tx, id)? {
            self.teams.insert(id, found);
        }
        Ok(())
    }
}
