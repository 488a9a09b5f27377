//! Member repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD plus the registered member queries over `member` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Every non-CRUD filter goes through a `MemberQuery` descriptor that is
//!   validated against the live schema at construction time.
//! - Single-result lookups distinguish "no row" (`Ok(None)`) from
//!   "more than one row" (`NonUniqueResult`).

use crate::db::DbError;
use crate::model::member::{Member, MemberId};
use crate::model::team::TeamId;
use crate::page::{CountMode, Direction, Page, PageRequest, Sort};
use crate::repo::query::{ensure_repo_ready, QuerySpec, TableSpec};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MEMBER_SELECT_SQL: &str = "SELECT id, username, age, team_id FROM member";

pub type RepoResult<T> = Result<T, RepoError>;

/// Reference to a persisted row, used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Member(MemberId),
    Team(TeamId),
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Member(id) => write!(f, "member {id}"),
            Self::Team(id) => write!(f, "team {id}"),
        }
    }
}

/// Repository error shared by member and team persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Update or delete hit a row that no longer exists.
    NotFound(EntityRef),
    /// A single-result query matched more than one row.
    NonUniqueResult {
        query: &'static str,
        matched: usize,
    },
    /// The store rejected a write (NOT NULL, CHECK, foreign key, ...).
    Constraint(String),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from an expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// A registered query references a column the live schema lacks.
    UnknownQueryColumn {
        query: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::NonUniqueResult { query, matched } => write!(
                f,
                "query `{query}` matched {matched} rows where at most one was expected"
            ),
            Self::Constraint(detail) => write!(f, "constraint violated: {detail}"),
            Self::InvalidData(message) => write!(f, "invalid persisted row: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; apply migrations first"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
            Self::UnknownQueryColumn { query, column } => {
                write!(f, "query `{query}` references unknown column `{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Flat read model joining a member with its team.
///
/// Produced row-by-row inside the projection query; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDto {
    pub member_id: MemberId,
    pub username: String,
    pub team_name: String,
}

/// Typed descriptor for every registered member filter.
///
/// One variant maps to one parameterized predicate; the registry below
/// declares the columns each variant binds so construction-time validation
/// can check them against the live schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberQuery {
    UsernameAndAgeGreaterThan { username: String, age: u32 },
    UsernameAndAge { username: String, age: u32 },
    Username { username: String },
    UsernameIn { names: Vec<String> },
    Age { age: u32 },
    Team { team_id: TeamId },
}

impl MemberQuery {
    /// Registry name used in validation and error reporting.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UsernameAndAgeGreaterThan { .. } => "member_by_username_and_age_greater_than",
            Self::UsernameAndAge { .. } => "member_by_username_and_age",
            Self::Username { .. } => "member_by_username",
            Self::UsernameIn { .. } => "member_by_username_in",
            Self::Age { .. } => "member_by_age",
            Self::Team { .. } => "member_by_team",
        }
    }

    fn push_predicate(&self, sql: &mut String, binds: &mut Vec<Value>) {
        match self {
            Self::UsernameAndAgeGreaterThan { username, age } => {
                sql.push_str("username = ? AND age > ?");
                binds.push(Value::Text(username.clone()));
                binds.push(Value::Integer(i64::from(*age)));
            }
            Self::UsernameAndAge { username, age } => {
                sql.push_str("username = ? AND age = ?");
                binds.push(Value::Text(username.clone()));
                binds.push(Value::Integer(i64::from(*age)));
            }
            Self::Username { username } => {
                sql.push_str("username = ?");
                binds.push(Value::Text(username.clone()));
            }
            Self::UsernameIn { names } => {
                if names.is_empty() {
                    // An empty name set matches nothing, never everything.
                    sql.push_str("1 = 0");
                    return;
                }
                sql.push_str("username IN (");
                for (index, name) in names.iter().enumerate() {
                    if index > 0 {
                        sql.push_str(", ");
                    }
                    sql.push('?');
                    binds.push(Value::Text(name.clone()));
                }
                sql.push(')');
            }
            Self::Age { age } => {
                sql.push_str("age = ?");
                binds.push(Value::Integer(i64::from(*age)));
            }
            Self::Team { team_id } => {
                sql.push_str("team_id = ?");
                binds.push(Value::Integer(*team_id));
            }
        }
    }
}

const MEMBER_TABLES: &[TableSpec] = &[
    TableSpec {
        name: "member",
        columns: &["id", "username", "age", "team_id"],
    },
    TableSpec {
        name: "team",
        columns: &["id", "name"],
    },
];

/// Registered member queries and the columns they bind.
pub const MEMBER_QUERIES: &[QuerySpec] = &[
    QuerySpec {
        name: "member_by_username_and_age_greater_than",
        table: "member",
        columns: &["username", "age"],
    },
    QuerySpec {
        name: "member_by_username_and_age",
        table: "member",
        columns: &["username", "age"],
    },
    QuerySpec {
        name: "member_by_username",
        table: "member",
        columns: &["username"],
    },
    QuerySpec {
        name: "member_by_username_in",
        table: "member",
        columns: &["username"],
    },
    QuerySpec {
        name: "member_by_age",
        table: "member",
        columns: &["age"],
    },
    QuerySpec {
        name: "member_by_team",
        table: "member",
        columns: &["team_id"],
    },
    QuerySpec {
        name: "member_username_list",
        table: "member",
        columns: &["username"],
    },
    QuerySpec {
        name: "member_with_team",
        table: "member",
        columns: &["id", "username", "team_id"],
    },
    QuerySpec {
        name: "member_with_team",
        table: "team",
        columns: &["id", "name"],
    },
];

/// Repository interface for member persistence and queries.
pub trait MemberRepository {
    /// Persists a new (`id == None`) or existing member and returns the
    /// stored state, id included.
    fn save(&self, member: Member) -> RepoResult<Member>;
    fn find_by_id(&self, id: MemberId) -> RepoResult<Option<Member>>;
    fn find_all(&self) -> RepoResult<Vec<Member>>;
    fn delete(&self, id: MemberId) -> RepoResult<()>;
    fn count(&self) -> RepoResult<u64>;
    /// Members whose username matches exactly and whose age is strictly
    /// greater than the bound.
    fn find_by_username_and_age_greater_than(
        &self,
        username: &str,
        age: u32,
    ) -> RepoResult<Vec<Member>>;
    /// Members matching both username and age exactly.
    fn find_user(&self, username: &str, age: u32) -> RepoResult<Vec<Member>>;
    /// Single-result lookup: `Ok(None)` on no match, `NonUniqueResult` when
    /// the username is shared by several members.
    fn find_one_by_username(&self, username: &str) -> RepoResult<Option<Member>>;
    /// Every username as a flat list.
    fn find_username_list(&self) -> RepoResult<Vec<String>>;
    /// One row per member that has a team, joined and projected to
    /// (member id, username, team name). Teamless members are excluded.
    fn find_member_dto(&self) -> RepoResult<Vec<MemberDto>>;
    /// Members whose username is contained in `names`; an empty set yields
    /// an empty result.
    fn find_by_names(&self, names: &[String]) -> RepoResult<Vec<Member>>;
    /// Derived inverse side of the team relationship, ordered by member id.
    fn find_by_team(&self, team_id: TeamId) -> RepoResult<Vec<Member>>;
    /// One page of members with the exact given age.
    fn find_by_age(&self, age: u32, request: &PageRequest) -> RepoResult<Page<Member>>;
}

/// Sort keys accepted by paged member queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberSortKey {
    Id,
    Username,
    Age,
}

impl MemberSortKey {
    fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Username => "username",
            Self::Age => "age",
        }
    }

    pub fn asc(self) -> Sort {
        Sort::new(self.column(), Direction::Asc)
    }

    pub fn desc(self) -> Sort {
        Sort::new(self.column(), Direction::Desc)
    }
}

/// SQLite-backed member repository.
pub struct SqliteMemberRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMemberRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// Fails when the connection is not migrated, a required table or
    /// column is absent, or any registry entry references a column the
    /// live schema lacks.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_member_schema(conn)?;
        Ok(Self { conn })
    }
}

pub(crate) fn ensure_member_schema(conn: &Connection) -> RepoResult<()> {
    ensure_repo_ready(conn, MEMBER_TABLES, MEMBER_QUERIES)
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn save(&self, member: Member) -> RepoResult<Member> {
        save_member(self.conn, member)
    }

    fn find_by_id(&self, id: MemberId) -> RepoResult<Option<Member>> {
        fetch_member_by_id(self.conn, id)
    }

    fn find_all(&self) -> RepoResult<Vec<Member>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMBER_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }
        Ok(members)
    }

    fn delete(&self, id: MemberId) -> RepoResult<()> {
        delete_member(self.conn, id)
    }

    fn count(&self) -> RepoResult<u64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM member;", [], |row| {
                row.get::<_, u64>(0)
            })?;
        Ok(count)
    }

    fn find_by_username_and_age_greater_than(
        &self,
        username: &str,
        age: u32,
    ) -> RepoResult<Vec<Member>> {
        select_members(
            self.conn,
            &MemberQuery::UsernameAndAgeGreaterThan {
                username: username.to_string(),
                age,
            },
        )
    }

    fn find_user(&self, username: &str, age: u32) -> RepoResult<Vec<Member>> {
        select_members(
            self.conn,
            &MemberQuery::UsernameAndAge {
                username: username.to_string(),
                age,
            },
        )
    }

    fn find_one_by_username(&self, username: &str) -> RepoResult<Option<Member>> {
        let query = MemberQuery::Username {
            username: username.to_string(),
        };
        let mut matches = select_members(self.conn, &query)?;
        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            matched => Err(RepoError::NonUniqueResult {
                query: query.name(),
                matched,
            }),
        }
    }

    fn find_username_list(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT username FROM member ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut usernames = Vec::new();
        while let Some(row) = rows.next()? {
            usernames.push(row.get("username")?);
        }
        Ok(usernames)
    }

    fn find_member_dto(&self) -> RepoResult<Vec<MemberDto>> {
        // Inner join: members without a team never reach the projection.
        let mut stmt = self.conn.prepare(
            "SELECT m.id, m.username, t.name AS team_name
             FROM member m
             INNER JOIN team t ON t.id = m.team_id
             ORDER BY m.id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut dtos = Vec::new();
        while let Some(row) = rows.next()? {
            dtos.push(MemberDto {
                member_id: row.get("id")?,
                username: row.get("username")?,
                team_name: row.get("team_name")?,
            });
        }
        Ok(dtos)
    }

    fn find_by_names(&self, names: &[String]) -> RepoResult<Vec<Member>> {
        select_members(
            self.conn,
            &MemberQuery::UsernameIn {
                names: names.to_vec(),
            },
        )
    }

    fn find_by_team(&self, team_id: TeamId) -> RepoResult<Vec<Member>> {
        select_members(self.conn, &MemberQuery::Team { team_id })
    }

    fn find_by_age(&self, age: u32, request: &PageRequest) -> RepoResult<Page<Member>> {
        page_members(self.conn, &MemberQuery::Age { age }, request)
    }
}

pub(crate) fn save_member(conn: &Connection, member: Member) -> RepoResult<Member> {
    match member.id {
        None => insert_member(conn, member),
        Some(id) => update_member(conn, member, id),
    }
}

fn insert_member(conn: &Connection, mut member: Member) -> RepoResult<Member> {
    conn.execute(
        "INSERT INTO member (username, age, team_id) VALUES (?1, ?2, ?3);",
        params![
            member.username.as_str(),
            i64::from(member.age),
            member.team_id,
        ],
    )
    .map_err(write_error)?;

    member.id = Some(conn.last_insert_rowid());
    Ok(member)
}

fn update_member(conn: &Connection, member: Member, id: MemberId) -> RepoResult<Member> {
    let changed = conn
        .execute(
            "UPDATE member SET username = ?1, age = ?2, team_id = ?3 WHERE id = ?4;",
            params![
                member.username.as_str(),
                i64::from(member.age),
                member.team_id,
                id,
            ],
        )
        .map_err(write_error)?;

    if changed == 0 {
        return Err(RepoError::NotFound(EntityRef::Member(id)));
    }

    Ok(member)
}

pub(crate) fn fetch_member_by_id(conn: &Connection, id: MemberId) -> RepoResult<Option<Member>> {
    let mut stmt = conn.prepare(&format!("{MEMBER_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_member_row(row)?));
    }
    Ok(None)
}

pub(crate) fn delete_member(conn: &Connection, id: MemberId) -> RepoResult<()> {
    let changed = conn.execute("DELETE FROM member WHERE id = ?1;", [id])?;
    if changed == 0 {
        return Err(RepoError::NotFound(EntityRef::Member(id)));
    }
    Ok(())
}

/// Rewrites the owning key of the member -> team link in one statement.
///
/// The derived team view changes together with the key, so no intermediate
/// disagreeing state is observable.
pub(crate) fn assign_team(
    conn: &Connection,
    member_id: MemberId,
    team_id: TeamId,
) -> RepoResult<()> {
    let changed = conn
        .execute(
            "UPDATE member SET team_id = ?1 WHERE id = ?2;",
            params![team_id, member_id],
        )
        .map_err(write_error)?;

    if changed == 0 {
        return Err(RepoError::NotFound(EntityRef::Member(member_id)));
    }

    Ok(())
}

pub(crate) fn select_members(conn: &Connection, query: &MemberQuery) -> RepoResult<Vec<Member>> {
    let mut sql = format!("{MEMBER_SELECT_SQL} WHERE ");
    let mut binds: Vec<Value> = Vec::new();
    query.push_predicate(&mut sql, &mut binds);
    sql.push_str(" ORDER BY id ASC;");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(binds))?;
    let mut members = Vec::new();
    while let Some(row) = rows.next()? {
        members.push(parse_member_row(row)?);
    }
    Ok(members)
}

pub(crate) fn page_members(
    conn: &Connection,
    query: &MemberQuery,
    request: &PageRequest,
) -> RepoResult<Page<Member>> {
    let mut sql = format!("{MEMBER_SELECT_SQL} WHERE ");
    let mut binds: Vec<Value> = Vec::new();
    query.push_predicate(&mut sql, &mut binds);
    push_order_by(&mut sql, request.sort());

    // In countless mode one surplus row is fetched to answer has_next.
    let fetch_limit = match request.count_mode() {
        CountMode::Exact => i64::from(request.size()),
        CountMode::None => i64::from(request.size()) + 1,
    };
    sql.push_str(" LIMIT ? OFFSET ?;");
    binds.push(Value::Integer(fetch_limit));
    binds.push(Value::Integer(request.offset()));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(binds))?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_member_row(row)?);
    }

    match request.count_mode() {
        CountMode::Exact => {
            let total = count_members_matching(conn, query)?;
            let consumed = (u64::from(request.page()) + 1) * u64::from(request.size());
            Ok(Page::new(items, request, Some(total), consumed < total))
        }
        CountMode::None => {
            let has_next = items.len() > request.size() as usize;
            items.truncate(request.size() as usize);
            Ok(Page::new(items, request, None, has_next))
        }
    }
}

fn count_members_matching(conn: &Connection, query: &MemberQuery) -> RepoResult<u64> {
    let mut sql = String::from("SELECT COUNT(*) FROM member WHERE ");
    let mut binds: Vec<Value> = Vec::new();
    query.push_predicate(&mut sql, &mut binds);
    sql.push(';');

    let count = conn.query_row(&sql, params_from_iter(binds), |row| row.get::<_, u64>(0))?;
    Ok(count)
}

fn push_order_by(sql: &mut String, sort: Option<&Sort>) {
    sql.push_str(" ORDER BY ");
    match sort {
        Some(sort) if sort.column() != "id" => {
            sql.push_str(sort.column());
            sql.push(' ');
            sql.push_str(sort.direction().keyword());
            // Stable tiebreaker so pages never overlap under equal keys.
            sql.push_str(", id ASC");
        }
        Some(sort) => {
            sql.push_str("id ");
            sql.push_str(sort.direction().keyword());
        }
        None => sql.push_str("id ASC"),
    }
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<Member> {
    let age_raw: i64 = row.get("age")?;
    let age = u32::try_from(age_raw).map_err(|_| {
        RepoError::InvalidData(format!("invalid age value `{age_raw}` in member.age"))
    })?;

    Ok(Member {
        id: Some(row.get("id")?),
        username: row.get("username")?,
        age,
        team_id: row.get("team_id")?,
    })
}

/// Maps store-level constraint failures on write paths to `Constraint`.
pub(crate) fn write_error(err: rusqlite::Error) -> RepoError {
    if let rusqlite::Error::SqliteFailure(code, ref message) = err {
        if code.code == rusqlite::ErrorCode::ConstraintViolation {
            let detail = message.clone().unwrap_or_else(|| code.to_string());
            return RepoError::Constraint(detail);
        }
    }
    err.into()
}
