use roster_core::db::open_db_in_memory;
use roster_core::{
    Member, MemberRepository, MemberSortKey, PageRequest, SqliteMemberRepository,
};
use rusqlite::Connection;

fn seeded_connection() -> Connection {
    let conn = open_db_in_memory().unwrap();
    {
        let repo = SqliteMemberRepository::try_new(&conn).unwrap();
        for index in 0..10 {
            repo.save(Member::with_age(format!("m{index}"), 20)).unwrap();
        }
        repo.save(Member::with_age("elder", 70)).unwrap();
        repo.save(Member::with_age("child", 7)).unwrap();
    }
    conn
}

#[test]
fn first_page_carries_total_and_boundaries() {
    let conn = seeded_connection();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let page = repo.find_by_age(20, &PageRequest::of(0, 3)).unwrap();

    assert_eq!(page.len(), 3);
    assert_eq!(page.total(), Some(10));
    assert_eq!(page.total_pages(), Some(4));
    assert!(page.has_next());
    assert!(page.is_first());
    assert!(!page.has_previous());
    assert!(page.items().iter().all(|m| m.age == 20));
}

#[test]
fn last_page_holds_the_remainder() {
    let conn = seeded_connection();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let page = repo.find_by_age(20, &PageRequest::of(3, 3)).unwrap();

    assert_eq!(page.len(), 1);
    assert_eq!(page.total(), Some(10));
    assert!(!page.has_next());
    assert!(page.has_previous());
}

#[test]
fn page_past_the_end_is_empty() {
    let conn = seeded_connection();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let page = repo.find_by_age(20, &PageRequest::of(5, 3)).unwrap();

    assert!(page.is_empty());
    assert_eq!(page.total(), Some(10));
    assert!(!page.has_next());
}

#[test]
fn countless_mode_reports_has_next_without_total() {
    let conn = seeded_connection();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let first = repo
        .find_by_age(20, &PageRequest::of(0, 3).without_total())
        .unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(first.total(), None);
    assert!(first.has_next());

    let last = repo
        .find_by_age(20, &PageRequest::of(3, 3).without_total())
        .unwrap();
    assert_eq!(last.len(), 1);
    assert!(!last.has_next());
}

#[test]
fn sort_order_is_respected() {
    let conn = seeded_connection();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let request = PageRequest::of(0, 3).sorted_by(MemberSortKey::Username.desc());
    let page = repo.find_by_age(20, &request).unwrap();

    let usernames: Vec<_> = page.items().iter().map(|m| m.username.as_str()).collect();
    assert_eq!(usernames, vec!["m9", "m8", "m7"]);
}

#[test]
fn sort_by_id_desc_reverses_insertion_order() {
    let conn = seeded_connection();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let request = PageRequest::of(0, 10).sorted_by(MemberSortKey::Id.desc());
    let page = repo.find_by_age(20, &request).unwrap();

    let ids: Vec<_> = page.items().iter().map(|m| m.id.unwrap()).collect();
    assert_eq!(ids.len(), 10);
    assert!(ids.windows(2).all(|pair| pair[0] > pair[1]));
}

#[test]
fn equal_sort_keys_page_without_overlap() {
    let conn = seeded_connection();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    // Everyone in the filter shares age 20, so ordering falls back to the
    // id tiebreaker; collected pages must cover each member exactly once.
    let mut seen = Vec::new();
    for page_index in 0..4 {
        let request = PageRequest::of(page_index, 3).sorted_by(MemberSortKey::Age.asc());
        let page = repo.find_by_age(20, &request).unwrap();
        seen.extend(page.into_items().into_iter().map(|m| m.id.unwrap()));
    }

    assert_eq!(seen.len(), 10);
    let mut sorted = seen.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), 10);
    assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
}
