use roster_core::db::migrations::latest_version;
use roster_core::db::open_db_in_memory;
use roster_core::{
    validate_queries, Member, MemberRepository, QuerySpec, RepoError, SqliteMemberRepository,
    SqliteTeamRepository, Team, TeamRepository,
};
use rusqlite::Connection;

#[test]
fn filter_by_username_and_min_age_is_strict() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    repo.save(Member::with_age("AAA", 10)).unwrap();
    repo.save(Member::with_age("AAA", 20)).unwrap();
    repo.save(Member::with_age("BBB", 30)).unwrap();

    let result = repo
        .find_by_username_and_age_greater_than("AAA", 10)
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].username, "AAA");
    assert_eq!(result[0].age, 20);
}

#[test]
fn find_user_matches_both_fields_exactly() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    repo.save(Member::with_age("AAA", 10)).unwrap();
    repo.save(Member::with_age("AAA", 20)).unwrap();

    let result = repo.find_user("AAA", 10).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].age, 10);
}

#[test]
fn username_list_returns_every_name_including_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    repo.save(Member::with_age("AAA", 10)).unwrap();
    repo.save(Member::with_age("BBB", 20)).unwrap();
    repo.save(Member::with_age("AAA", 30)).unwrap();

    let usernames = repo.find_username_list().unwrap();
    assert_eq!(usernames, vec!["AAA", "BBB", "AAA"]);
}

#[test]
fn member_dto_projects_only_teamed_members() {
    let conn = open_db_in_memory().unwrap();
    let team_repo = SqliteTeamRepository::try_new(&conn).unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let team = team_repo.save(Team::new("teamA")).unwrap();
    let teamed = repo
        .save(Member::with_team("memberA", 20, &team).unwrap())
        .unwrap();
    repo.save(Member::with_age("loner", 30)).unwrap();

    let dtos = repo.find_member_dto().unwrap();

    assert_eq!(dtos.len(), 1);
    assert_eq!(dtos[0].member_id, teamed.id.unwrap());
    assert_eq!(dtos[0].username, "memberA");
    assert_eq!(dtos[0].team_name, "teamA");
}

#[test]
fn find_by_names_is_set_membership() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    repo.save(Member::with_age("AAA", 10)).unwrap();
    repo.save(Member::with_age("BBB", 20)).unwrap();
    repo.save(Member::with_age("CCC", 30)).unwrap();

    let names = vec!["AAA".to_string(), "BBB".to_string()];
    let matched = repo.find_by_names(&names).unwrap();
    assert_eq!(matched.len(), 2);
    assert!(matched.iter().all(|m| names.contains(&m.username)));

    let empty = repo.find_by_names(&[]).unwrap();
    assert!(empty.is_empty());
}

#[test]
fn single_result_lookup_distinguishes_missing_from_ambiguous() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    assert!(repo.find_one_by_username("AAA").unwrap().is_none());

    repo.save(Member::with_age("AAA", 10)).unwrap();
    let found = repo.find_one_by_username("AAA").unwrap().unwrap();
    assert_eq!(found.age, 10);

    repo.save(Member::with_age("AAA", 10)).unwrap();
    let err = repo.find_one_by_username("AAA").unwrap_err();
    assert!(matches!(err, RepoError::NonUniqueResult { matched: 2, .. }));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteMemberRepository::try_new(&conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_member_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteMemberRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("member"))
    ));
}

#[test]
fn repository_rejects_member_table_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE member (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL,
            age INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteMemberRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "member",
            column: "team_id"
        })
    ));
}

#[test]
fn registered_queries_reject_unknown_columns() {
    let conn = open_db_in_memory().unwrap();

    let bogus = QuerySpec {
        name: "member_by_nickname",
        table: "member",
        columns: &["nickname"],
    };

    let err = validate_queries(&conn, &[bogus]).unwrap_err();
    assert!(matches!(
        err,
        RepoError::UnknownQueryColumn {
            query: "member_by_nickname",
            column: "nickname"
        }
    ));
}
