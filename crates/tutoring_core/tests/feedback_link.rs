use rusqlite::Connection;
use tutoring_core::db::open_db_in_memory;
use tutoring_core::link::feedback_link::DEFAULT_MAX_AGE_SECS;
use tutoring_core::repo::account_repo::SqliteAccountRepository;
use tutoring_core::repo::feedback_repo::SqliteFeedbackRepository;
use tutoring_core::{
    AccountService, ErrorKind, FeedbackError, FeedbackLinkSigner, FeedbackService, LinkError,
    NewAccount, Role,
};

const SECRET: &str = "feedback-link-test-secret-42";
const ISSUED_AT: i64 = 1_700_000_000;
const HOUR: i64 = 60 * 60;

fn signer() -> FeedbackLinkSigner {
    FeedbackLinkSigner::new(SECRET).unwrap()
}

fn seed_tutors(conn: &mut Connection, count: usize) -> Vec<i64> {
    let mut accounts = AccountService::new(SqliteAccountRepository::try_new(conn).unwrap());
    (0..count)
        .map(|n| {
            accounts
                .create_account(NewAccount::new(
                    format!("tutor{n}@example.edu"),
                    "Tutor",
                    format!("Number{n}"),
                    Role::Tutor,
                ))
                .unwrap()
                .profile
                .profile_id()
        })
        .collect()
}

fn service(conn: &mut Connection) -> FeedbackService<SqliteFeedbackRepository<'_>> {
    FeedbackService::new(SqliteFeedbackRepository::try_new(conn).unwrap(), signer())
}

#[test]
fn link_redeems_within_window_and_expires_after_it() {
    let mut conn = open_db_in_memory().unwrap();
    let tutor_id = seed_tutors(&mut conn, 1)[0];
    let token = signer().issue_at(tutor_id, ISSUED_AT);
    let feedback = service(&mut conn);

    let tutor = feedback.redeem_at(&token, ISSUED_AT + HOUR).unwrap();
    assert_eq!(tutor.id, tutor_id);

    let err = feedback.redeem_at(&token, ISSUED_AT + 25 * HOUR).unwrap_err();
    assert!(matches!(
        err,
        FeedbackError::Link(LinkError::Expired { issued_at: ISSUED_AT, max_age_secs })
            if max_age_secs == DEFAULT_MAX_AGE_SECS
    ));
    assert_eq!(err.kind(), ErrorKind::Expired);
}

#[test]
fn custom_max_age_is_honoured() {
    let mut conn = open_db_in_memory().unwrap();
    let tutor_id = seed_tutors(&mut conn, 1)[0];
    let token = signer().issue_at(tutor_id, ISSUED_AT);
    let feedback = service(&mut conn).with_max_age(HOUR as u64);

    assert!(feedback.redeem_at(&token, ISSUED_AT + HOUR).is_ok());
    assert_eq!(
        feedback
            .redeem_at(&token, ISSUED_AT + HOUR + 1)
            .unwrap_err()
            .kind(),
        ErrorKind::Expired
    );
}

#[test]
fn altering_any_single_character_invalidates_the_link() {
    let mut conn = open_db_in_memory().unwrap();
    let tutor_id = seed_tutors(&mut conn, 1)[0];
    let token = signer().issue_at(tutor_id, ISSUED_AT);
    let feedback = service(&mut conn);

    for (index, original) in token.char_indices() {
        let replacement = if original == 'A' { 'B' } else { 'A' };
        let mut altered = token.clone();
        altered.replace_range(index..index + original.len_utf8(), &replacement.to_string());

        let err = feedback.redeem_at(&altered, ISSUED_AT + HOUR).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid, "position {index} of {token}");
    }
}

#[test]
fn link_is_replayable_until_expiry() {
    let mut conn = open_db_in_memory().unwrap();
    let tutors = seed_tutors(&mut conn, 7);
    assert_eq!(tutors[6], 7);

    let token = signer().issue(7);
    let feedback = service(&mut conn);
    assert_eq!(feedback.redeem(&token).unwrap().id, 7);
    assert_eq!(feedback.redeem(&token).unwrap().id, 7);
}

#[test]
fn link_for_unknown_tutor_is_invalid() {
    let mut conn = open_db_in_memory().unwrap();
    seed_tutors(&mut conn, 1);
    let token = signer().issue_at(999, ISSUED_AT);

    let err = service(&mut conn)
        .redeem_at(&token, ISSUED_AT + HOUR)
        .unwrap_err();
    assert!(matches!(err, FeedbackError::Link(LinkError::Invalid)));
}

#[test]
fn link_signed_with_other_secret_is_invalid() {
    let mut conn = open_db_in_memory().unwrap();
    let tutor_id = seed_tutors(&mut conn, 1)[0];
    let foreign = FeedbackLinkSigner::new("a-completely-different-secret")
        .unwrap()
        .issue_at(tutor_id, ISSUED_AT);

    let err = service(&mut conn)
        .redeem_at(&foreign, ISSUED_AT + HOUR)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);
}

#[test]
fn submit_records_feedback_and_refreshes_rating() {
    let mut conn = open_db_in_memory().unwrap();
    let tutor_id = seed_tutors(&mut conn, 1)[0];
    let token = signer().issue_at(tutor_id, ISSUED_AT);
    let mut feedback = service(&mut conn);

    let tutor = feedback
        .submit_at(&token, 4.0, Some("Very patient."), ISSUED_AT + HOUR)
        .unwrap();
    assert_eq!(tutor.rating, 4.0);

    let tutor = feedback
        .submit_at(&token, 5.0, None, ISSUED_AT + 2 * HOUR)
        .unwrap();
    assert_eq!(tutor.rating, 4.5);
    drop(feedback);

    let mut stmt = conn
        .prepare("SELECT comment FROM feedback WHERE tutor_id = ?1 ORDER BY id;")
        .unwrap();
    let comments: Vec<Option<String>> = stmt
        .query_map([tutor_id], |row| row.get(0))
        .unwrap()
        .map(Result::unwrap)
        .collect();
    assert_eq!(comments, vec![Some("Very patient.".to_string()), None]);
}

#[test]
fn submit_rejects_bad_input_without_writing() {
    let mut conn = open_db_in_memory().unwrap();
    let tutor_id = seed_tutors(&mut conn, 1)[0];
    let token = signer().issue_at(tutor_id, ISSUED_AT);
    let now = ISSUED_AT + HOUR;
    let mut feedback = service(&mut conn);

    let nan = feedback.submit_at(&token, f64::NAN, None, now).unwrap_err();
    assert_eq!(nan.kind(), ErrorKind::ValidationError);

    let infinite = feedback
        .submit_at(&token, f64::INFINITY, None, now)
        .unwrap_err();
    assert_eq!(infinite.kind(), ErrorKind::ValidationError);

    let long_comment = "x".repeat(501);
    let too_long = feedback
        .submit_at(&token, 3.0, Some(&long_comment), now)
        .unwrap_err();
    assert!(matches!(too_long, FeedbackError::CommentTooLong { max: 500 }));

    let expired = feedback
        .submit_at(&token, 3.0, None, ISSUED_AT + 25 * HOUR)
        .unwrap_err();
    assert_eq!(expired.kind(), ErrorKind::Expired);
    drop(feedback);

    let stored: i64 = conn
        .query_row("SELECT COUNT(*) FROM feedback;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(stored, 0);
}
