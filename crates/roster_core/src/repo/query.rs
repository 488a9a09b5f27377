//! Query registry and fail-fast schema validation.
//!
//! # Responsibility
//! - Declare, per repository, which tables and columns its statements bind.
//! - Verify those declarations against the live schema before first use.
//!
//! # Invariants
//! - A repository constructor rejects any connection whose schema cannot
//!   satisfy every registered query; nothing fails lazily on first call.
//! - Registry entries carry static column names only; callers never supply
//!   SQL fragments.

use crate::db::migrations::latest_version;
use crate::repo::member_repo::{RepoError, RepoResult};
use rusqlite::Connection;

/// Live-schema requirements of one repository.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

/// One registered query and the columns it binds.
///
/// Each repository keeps a const table of these instead of deriving filters
/// from method names; the mapping from registry entry to parameterized
/// statement is written out explicitly in the repository.
#[derive(Debug, Clone, Copy)]
pub struct QuerySpec {
    pub name: &'static str,
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

/// Verifies a connection can serve a repository before its first query.
///
/// Checks run in order: migration version, required tables and columns,
/// then every registered query against the live schema.
pub(crate) fn ensure_repo_ready(
    conn: &Connection,
    tables: &[TableSpec],
    queries: &[QuerySpec],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables {
        if !table_exists(conn, table.name)? {
            return Err(RepoError::MissingRequiredTable(table.name));
        }
        let live = table_columns(conn, table.name)?;
        for &column in table.columns {
            if !live.iter().any(|current| current == column) {
                return Err(RepoError::MissingRequiredColumn {
                    table: table.name,
                    column,
                });
            }
        }
    }

    validate_queries(conn, queries)
}

/// Checks every query entry against the live schema.
///
/// Exposed so callers can validate additional registries against an open
/// connection; repositories run this over their own registry at
/// construction time.
pub fn validate_queries(conn: &Connection, queries: &[QuerySpec]) -> RepoResult<()> {
    for query in queries {
        let live = table_columns(conn, query.table)?;
        for &column in query.columns {
            if !live.iter().any(|current| current == column) {
                return Err(RepoError::UnknownQueryColumn {
                    query: query.name,
                    column,
                });
            }
        }
    }

    Ok(())
}

fn current_user_version(conn: &Connection) -> RepoResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}
