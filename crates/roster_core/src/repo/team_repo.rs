//! Team repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD persistence for teams.
//!
//! # Invariants
//! - Teams register no custom filters; the inverse member collection is
//!   served by the member repository (`find_by_team`), never stored here.

use crate::model::team::{Team, TeamId};
use crate::repo::member_repo::{write_error, EntityRef, RepoError, RepoResult};
use crate::repo::query::{ensure_repo_ready, TableSpec};
use rusqlite::{params, Connection, Row};

const TEAM_SELECT_SQL: &str = "SELECT id, name FROM team";

const TEAM_TABLES: &[TableSpec] = &[TableSpec {
    name: "team",
    columns: &["id", "name"],
}];

/// Repository interface for team persistence.
pub trait TeamRepository {
    /// Persists a new (`id == None`) or existing team and returns the
    /// stored state, id included.
    fn save(&self, team: Team) -> RepoResult<Team>;
    fn find_by_id(&self, id: TeamId) -> RepoResult<Option<Team>>;
    fn find_all(&self) -> RepoResult<Vec<Team>>;
    fn delete(&self, id: TeamId) -> RepoResult<()>;
    fn count(&self) -> RepoResult<u64>;
}

/// SQLite-backed team repository.
pub struct SqliteTeamRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTeamRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_team_schema(conn)?;
        Ok(Self { conn })
    }
}

pub(crate) fn ensure_team_schema(conn: &Connection) -> RepoResult<()> {
    ensure_repo_ready(conn, TEAM_TABLES, &[])
}

impl TeamRepository for SqliteTeamRepository<'_> {
    fn save(&self, team: Team) -> RepoResult<Team> {
        save_team(self.conn, team)
    }

    fn find_by_id(&self, id: TeamId) -> RepoResult<Option<Team>> {
        fetch_team_by_id(self.conn, id)
    }

    fn find_all(&self) -> RepoResult<Vec<Team>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TEAM_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut teams = Vec::new();
        while let Some(row) = rows.next()? {
            teams.push(parse_team_row(row)?);
        }
        Ok(teams)
    }

    fn delete(&self, id: TeamId) -> RepoResult<()> {
        delete_team(self.conn, id)
    }

    fn count(&self) -> RepoResult<u64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM team;", [], |row| row.get::<_, u64>(0))?;
        Ok(count)
    }
}

pub(crate) fn save_team(conn: &Connection, team: Team) -> RepoResult<Team> {
    match team.id {
        None => insert_team(conn, team),
        Some(id) => update_team(conn, team, id),
    }
}

fn insert_team(conn: &Connection, mut team: Team) -> RepoResult<Team> {
    conn.execute(
        "INSERT INTO team (name) VALUES (?1);",
        [team.name.as_str()],
    )?;
    team.id = Some(conn.last_insert_rowid());
    Ok(team)
}

fn update_team(conn: &Connection, team: Team, id: TeamId) -> RepoResult<Team> {
    let changed = conn.execute(
        "UPDATE team SET name = ?1 WHERE id = ?2;",
        params![team.name.as_str(), id],
    )?;

    if changed == 0 {
        return Err(RepoError::NotFound(EntityRef::Team(id)));
    }

    Ok(team)
}

pub(crate) fn fetch_team_by_id(conn: &Connection, id: TeamId) -> RepoResult<Option<Team>> {
    let mut stmt = conn.prepare(&format!("{TEAM_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_team_row(row)?));
    }
    Ok(None)
}

pub(crate) fn delete_team(conn: &Connection, id: TeamId) -> RepoResult<()> {
    // Deleting a team still referenced by members trips the foreign key.
    let changed = conn
        .execute("DELETE FROM team WHERE id = ?1;", [id])
        .map_err(write_error)?;
    if changed == 0 {
        return Err(RepoError::NotFound(EntityRef::Team(id)));
    }
    Ok(())
}

fn parse_team_row(row: &Row<'_>) -> RepoResult<Team> {
    Ok(Team {
        id: Some(row.get("id")?),
        name: row.get("name")?,
    })
}
