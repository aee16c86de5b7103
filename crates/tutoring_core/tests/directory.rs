use rusqlite::Connection;
use tutoring_core::db::open_db_in_memory;
use tutoring_core::model::tutor::TutorProfileUpdate;
use tutoring_core::repo::account_repo::SqliteAccountRepository;
use tutoring_core::repo::tutor_repo::SqliteTutorRepository;
use tutoring_core::{
    AccountService, DirectoryError, ErrorKind, NewAccount, Role, TutorFilter, TutorService,
};

fn seed_tutor(conn: &mut Connection, email: &str, first: &str, last: &str) -> i64 {
    AccountService::new(SqliteAccountRepository::try_new(conn).unwrap())
        .create_account(NewAccount::new(email, first, last, Role::Tutor))
        .unwrap()
        .profile
        .profile_id()
}

fn names(tutors: &[tutoring_core::Tutor]) -> Vec<String> {
    tutors.iter().map(|tutor| tutor.display_name()).collect()
}

#[test]
fn browse_orders_by_last_then_first_name_and_filters() {
    let mut conn = open_db_in_memory().unwrap();
    let grace = seed_tutor(&mut conn, "g@example.edu", "Grace", "Hopper");
    let ada = seed_tutor(&mut conn, "a@example.edu", "Ada", "Lovelace");
    let alan = seed_tutor(&mut conn, "t@example.edu", "Alan", "Turing");
    let amy = seed_tutor(&mut conn, "h@example.edu", "Amy", "Hopper");

    let directory = TutorService::new(SqliteTutorRepository::try_new(&conn).unwrap());
    let cs = directory.create_major("Computer Science", "CS").unwrap();
    let math = directory.create_major("Mathematics", "MATH").unwrap();
    for (tutor_id, major_id) in [(grace, cs.id), (ada, math.id), (alan, cs.id)] {
        directory
            .update_profile(
                tutor_id,
                TutorProfileUpdate {
                    major_id: Some(major_id),
                    ..TutorProfileUpdate::default()
                },
            )
            .unwrap();
    }

    let everyone = directory.browse(TutorFilter::default()).unwrap();
    assert_eq!(
        names(&everyone),
        vec!["Amy Hopper", "Grace Hopper", "Ada Lovelace", "Alan Turing"]
    );
    assert_eq!(everyone[0].id, amy);

    let cs_only = directory
        .browse(TutorFilter {
            major: Some("Computer Science".to_string()),
            search: None,
        })
        .unwrap();
    assert_eq!(names(&cs_only), vec!["Grace Hopper", "Alan Turing"]);

    let searched = directory
        .browse(TutorFilter {
            major: None,
            search: Some("hOP".to_string()),
        })
        .unwrap();
    assert_eq!(names(&searched), vec!["Amy Hopper", "Grace Hopper"]);

    let combined = directory
        .browse(TutorFilter {
            major: Some("Computer Science".to_string()),
            search: Some("al".to_string()),
        })
        .unwrap();
    assert_eq!(names(&combined), vec!["Alan Turing"]);

    let blank = directory
        .browse(TutorFilter {
            major: Some("   ".to_string()),
            search: Some(String::new()),
        })
        .unwrap();
    assert_eq!(blank.len(), 4);
}

#[test]
fn profile_update_validates_and_keeps_rating() {
    let mut conn = open_db_in_memory().unwrap();
    let tutor_id = seed_tutor(&mut conn, "t@example.edu", "Alan", "Turing");
    conn.execute("UPDATE tutors SET rating = 4.5 WHERE id = ?1;", [tutor_id])
        .unwrap();

    let directory = TutorService::new(SqliteTutorRepository::try_new(&conn).unwrap());
    let negative = directory
        .update_profile(
            tutor_id,
            TutorProfileUpdate {
                minutes_tutored: -1,
                ..TutorProfileUpdate::default()
            },
        )
        .unwrap_err();
    assert_eq!(negative.kind(), ErrorKind::ValidationError);

    let updated = directory
        .update_profile(
            tutor_id,
            TutorProfileUpdate {
                description: Some("  Theory of computation.  ".to_string()),
                major_id: None,
                minutes_tutored: 90,
            },
        )
        .unwrap();
    assert_eq!(updated.description.as_deref(), Some("Theory of computation."));
    assert_eq!(updated.minutes_tutored, 90);
    assert_eq!(updated.rating, 4.5);

    let missing_major = directory
        .update_profile(
            tutor_id,
            TutorProfileUpdate {
                major_id: Some(77),
                ..TutorProfileUpdate::default()
            },
        )
        .unwrap_err();
    assert_eq!(missing_major.kind(), ErrorKind::NotFound);

    assert_eq!(directory.get_tutor(999).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn classes_are_offered_idempotently() {
    let mut conn = open_db_in_memory().unwrap();
    let tutor_id = seed_tutor(&mut conn, "t@example.edu", "Alan", "Turing");

    let directory = TutorService::new(SqliteTutorRepository::try_new(&conn).unwrap());
    let cs = directory.create_major("Computer Science", "CS").unwrap();
    let intro = directory.create_class(cs.id, 101, Some("Intro")).unwrap();
    let systems = directory.create_class(cs.id, 310, None).unwrap();
    assert_eq!(intro.label(), "CS 101");

    directory.offer_class(systems.id, tutor_id).unwrap();
    directory.offer_class(intro.id, tutor_id).unwrap();
    directory.offer_class(intro.id, tutor_id).unwrap();

    let offered = directory.classes_for_tutor(tutor_id).unwrap();
    assert_eq!(offered, vec![intro.clone(), systems]);

    let duplicate = directory.create_class(cs.id, 101, None).unwrap_err();
    assert!(matches!(duplicate, DirectoryError::Duplicate(_)));
    assert_eq!(duplicate.kind(), ErrorKind::ValidationError);

    let duplicate_major = directory.create_major("Computer Science", "CSC").unwrap_err();
    assert_eq!(duplicate_major.kind(), ErrorKind::ValidationError);

    assert_eq!(
        directory.offer_class(intro.id, 999).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        directory.create_class(999, 1, None).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(directory.list_majors().unwrap(), vec![cs]);
}
