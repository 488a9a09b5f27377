use roster_core::{Member, MemberLinkError, Team};

#[test]
fn new_member_has_no_id_and_no_team() {
    let member = Member::new("memberA");

    assert_eq!(member.id, None);
    assert_eq!(member.username, "memberA");
    assert_eq!(member.age, 0);
    assert_eq!(member.team_id, None);
    assert!(!member.is_saved());
}

#[test]
fn change_team_requires_saved_team() {
    let mut member = Member::with_age("memberA", 20);
    let unsaved = Team::new("teamA");

    let err = member.change_team(&unsaved).unwrap_err();
    assert_eq!(err, MemberLinkError::UnsavedTeam);
    assert_eq!(member.team_id, None);
}

#[test]
fn change_and_leave_team_rewrite_the_owning_key() {
    let mut member = Member::with_age("memberA", 20);
    let team = Team {
        id: Some(7),
        name: "teamA".to_string(),
    };

    member.change_team(&team).unwrap();
    assert_eq!(member.team_id, Some(7));

    member.leave_team();
    assert_eq!(member.team_id, None);
}

#[test]
fn member_serialization_uses_expected_wire_fields() {
    let member = Member {
        id: Some(42),
        username: "memberA".to_string(),
        age: 27,
        team_id: Some(7),
    };

    let json = serde_json::to_value(&member).unwrap();
    assert_eq!(json["id"], 42);
    assert_eq!(json["username"], "memberA");
    assert_eq!(json["age"], 27);
    assert_eq!(json["team_id"], 7);

    let decoded: Member = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, member);
}

#[test]
fn unsaved_member_serializes_null_keys() {
    let json = serde_json::to_value(Member::new("memberA")).unwrap();
    assert!(json["id"].is_null());
    assert!(json["team_id"].is_null());
}
