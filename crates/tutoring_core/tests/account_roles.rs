use rusqlite::Connection;
use tutoring_core::db::open_db_in_memory;
use tutoring_core::repo::account_repo::SqliteAccountRepository;
use tutoring_core::repo::role_sync;
use tutoring_core::{AccountError, AccountService, ErrorKind, NewAccount, Role, RoleProfile};

fn service(conn: &mut Connection) -> AccountService<SqliteAccountRepository<'_>> {
    AccountService::new(SqliteAccountRepository::try_new(conn).unwrap())
}

fn profile_rows(conn: &Connection, account_id: i64) -> Vec<RoleProfile> {
    role_sync::load_role_profiles(conn, account_id).unwrap()
}

#[test]
fn created_account_owns_exactly_its_role_profile() {
    let mut conn = open_db_in_memory().unwrap();

    for (email, role) in [
        ("s@example.edu", Role::Student),
        ("t@example.edu", Role::Tutor),
        ("a@example.edu", Role::Admin),
    ] {
        let registered = service(&mut conn)
            .create_account(NewAccount::new(email, "Ada", "Lovelace", role))
            .unwrap();
        assert_eq!(registered.account.role, role);
        assert_eq!(registered.profile.role(), role);
        assert_eq!(
            profile_rows(&conn, registered.account.id),
            vec![registered.profile]
        );
    }
}

#[test]
fn role_sequences_leave_exactly_one_matching_profile() {
    let mut conn = open_db_in_memory().unwrap();
    let registered = service(&mut conn)
        .create_account(NewAccount::new(
            "grace@example.edu",
            "Grace",
            "Hopper",
            Role::Student,
        ))
        .unwrap();
    let id = registered.account.id;

    let sequence = [
        Role::Tutor,
        Role::Admin,
        Role::Student,
        Role::Student,
        Role::Tutor,
        Role::Tutor,
        Role::Admin,
    ];
    for role in sequence {
        let changed = service(&mut conn).change_role(id, role).unwrap();
        assert_eq!(changed.account.role, role);

        let profiles = profile_rows(&conn, id);
        assert_eq!(profiles.len(), 1, "after switching to {role}");
        assert_eq!(profiles[0].role(), role);
        assert_eq!(profiles[0], changed.profile);
    }
}

#[test]
fn repeating_current_role_keeps_profile_id() {
    let mut conn = open_db_in_memory().unwrap();
    let registered = service(&mut conn)
        .create_account(NewAccount::new("t@example.edu", "Alan", "Turing", Role::Tutor))
        .unwrap();

    let again = service(&mut conn)
        .change_role(registered.account.id, Role::Tutor)
        .unwrap();
    assert_eq!(again.profile, registered.profile);
    assert_eq!(profile_rows(&conn, registered.account.id), vec![registered.profile]);
}

#[test]
fn duplicate_email_is_a_validation_error() {
    let mut conn = open_db_in_memory().unwrap();
    service(&mut conn)
        .create_account(NewAccount::new("dup@Example.EDU", "One", "Person", Role::Student))
        .unwrap();

    let err = service(&mut conn)
        .create_account(NewAccount::new("dup@example.edu", "Two", "Person", Role::Tutor))
        .unwrap_err();
    assert!(matches!(err, AccountError::EmailTaken));
    assert_eq!(err.kind(), ErrorKind::ValidationError);

    let accounts: i64 = conn
        .query_row("SELECT COUNT(*) FROM accounts;", [], |row| row.get(0))
        .unwrap();
    let tutors: i64 = conn
        .query_row("SELECT COUNT(*) FROM tutors;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(accounts, 1);
    assert_eq!(tutors, 0);
}

#[test]
fn invalid_input_is_rejected_before_storage() {
    let mut conn = open_db_in_memory().unwrap();
    let mut accounts = service(&mut conn);

    let blank_name = accounts
        .create_account(NewAccount::new("x@example.edu", "  ", "Doe", Role::Student))
        .unwrap_err();
    assert_eq!(blank_name.kind(), ErrorKind::ValidationError);

    let bad_email = accounts
        .create_account(NewAccount::new("not-an-email", "Jo", "Doe", Role::Student))
        .unwrap_err();
    assert_eq!(bad_email.kind(), ErrorKind::ValidationError);

    let long_name = accounts
        .create_account(NewAccount::new(
            "y@example.edu",
            "x".repeat(31),
            "Doe",
            Role::Student,
        ))
        .unwrap_err();
    assert_eq!(long_name.kind(), ErrorKind::ValidationError);
}

#[test]
fn unknown_account_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut accounts = service(&mut conn);

    let err = accounts.change_role(42, Role::Admin).unwrap_err();
    assert!(matches!(err, AccountError::AccountNotFound(42)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(accounts.get_account(42).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(accounts.role_profiles(42).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn email_lookup_normalizes_domain() {
    let mut conn = open_db_in_memory().unwrap();
    let mut accounts = service(&mut conn);
    let registered = accounts
        .create_account(NewAccount::new(" Ada@Example.EDU ", "Ada", "Lovelace", Role::Student))
        .unwrap();
    assert_eq!(registered.account.email, "Ada@example.edu");

    let found = accounts.find_by_email("Ada@EXAMPLE.edu").unwrap().unwrap();
    assert_eq!(found.id, registered.account.id);
    assert!(accounts.find_by_email("ada@example.edu").unwrap().is_none());
}

#[test]
fn failed_role_sync_rolls_back_role_change() {
    let mut conn = open_db_in_memory().unwrap();
    let registered = service(&mut conn)
        .create_account(NewAccount::new("r@example.edu", "Rolled", "Back", Role::Student))
        .unwrap();
    let id = registered.account.id;

    // Make the tutor insert fail inside the reconciliation step.
    conn.execute_batch(
        "CREATE TRIGGER block_tutors BEFORE INSERT ON tutors
         BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
    )
    .unwrap();

    let err = service(&mut conn).change_role(id, Role::Tutor).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageFailure);

    let account = service(&mut conn).get_account(id).unwrap();
    assert_eq!(account.role, Role::Student);
    assert_eq!(profile_rows(&conn, id), vec![registered.profile]);
}
