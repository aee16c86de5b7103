//! Session slot and shift repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Own the booking state transition of `sessions.student_id`.
//! - Store weekly shifts and materialize sessions from them.
//!
//! # Invariants
//! - Booking runs check-then-set in one `BEGIN IMMEDIATE` transaction and
//!   the write is conditional on `student_id IS NULL`; of two concurrent
//!   bookers exactly one succeeds and the other sees `AlreadyBooked`.
//! - Cancelling only clears `student_id`; `class_id` is kept.
//! - `(tutor_id, start_at)` is unique, so re-generating sessions is a no-op.

use crate::model::account::StudentId;
use crate::model::session::{
    minute_of_day, BookingDetails, NewSession, Session, SessionId, Shift,
};
use crate::model::tutor::{ClassId, TutorId};
use crate::repo::tutor_repo::tutor_exists;
use crate::repo::{
    ensure_schema_ready, is_unique_violation, row_exists, Entity, RepoError, RepoResult,
};
use chrono::{NaiveTime, Weekday};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

const SESSION_SELECT_SQL: &str = "SELECT
    id,
    tutor_id,
    student_id,
    start_at,
    end_at,
    class_id
FROM sessions";

/// Result of a cancel request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The student was removed from the session.
    Released {
        session: Session,
        student_id: StudentId,
    },
    /// The session had no student; nothing changed.
    AlreadyOpen(Session),
}

impl CancelOutcome {
    pub fn session(&self) -> &Session {
        match self {
            Self::Released { session, .. } | Self::AlreadyOpen(session) => session,
        }
    }

    pub fn into_session(self) -> Session {
        match self {
            Self::Released { session, .. } | Self::AlreadyOpen(session) => session,
        }
    }
}

/// Repository interface for sessions and shifts.
pub trait SessionRepository {
    fn create_session(&self, session: &NewSession) -> RepoResult<Session>;
    /// Inserts the session unless the tutor already has one at `start_at`.
    /// Returns whether a row was created.
    fn insert_session_if_absent(&self, session: &NewSession) -> RepoResult<bool>;
    fn get_session(&self, id: SessionId) -> RepoResult<Option<Session>>;
    fn open_sessions_for_tutor(&self, tutor_id: TutorId) -> RepoResult<Vec<Session>>;
    fn sessions_for_student(&self, student_id: StudentId) -> RepoResult<Vec<Session>>;
    /// Assigns an open session to a student for a class the tutor offers.
    fn book_session(
        &mut self,
        id: SessionId,
        student_id: StudentId,
        class_id: ClassId,
    ) -> RepoResult<Session>;
    fn cancel_session(&mut self, id: SessionId) -> RepoResult<CancelOutcome>;
    /// Contact details for a booked session; `None` when the session is open
    /// or missing.
    fn booking_details(&self, id: SessionId) -> RepoResult<Option<BookingDetails>>;
    fn tutor_exists(&self, tutor_id: TutorId) -> RepoResult<bool>;
    fn add_shift(
        &self,
        tutor_id: TutorId,
        weekday: Weekday,
        start: NaiveTime,
        end: NaiveTime,
    ) -> RepoResult<Shift>;
    fn list_shifts(&self) -> RepoResult<Vec<Shift>>;
}

/// SQLite-backed session repository.
pub struct SqliteSessionRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteSessionRepository<'conn> {
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SessionRepository for SqliteSessionRepository<'_> {
    fn create_session(&self, session: &NewSession) -> RepoResult<Session> {
        if !tutor_exists(self.conn, session.tutor_id)? {
            return Err(RepoError::not_found(Entity::Tutor, session.tutor_id));
        }

        self.conn
            .execute(
                "INSERT INTO sessions (tutor_id, start_at, end_at) VALUES (?1, ?2, ?3);",
                params![session.tutor_id, session.start_at, session.end_at],
            )
            .map_err(|err| {
                if is_unique_violation(&err) {
                    RepoError::Duplicate("session start for tutor")
                } else {
                    err.into()
                }
            })?;

        Ok(Session {
            id: self.conn.last_insert_rowid(),
            tutor_id: session.tutor_id,
            student_id: None,
            start_at: session.start_at,
            end_at: session.end_at,
            class_id: None,
        })
    }

    fn insert_session_if_absent(&self, session: &NewSession) -> RepoResult<bool> {
        let inserted = self.conn.execute(
            "INSERT INTO sessions (tutor_id, start_at, end_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (tutor_id, start_at) DO NOTHING;",
            params![session.tutor_id, session.start_at, session.end_at],
        )?;
        Ok(inserted == 1)
    }

    fn get_session(&self, id: SessionId) -> RepoResult<Option<Session>> {
        load_session(self.conn, id)
    }

    fn open_sessions_for_tutor(&self, tutor_id: TutorId) -> RepoResult<Vec<Session>> {
        query_sessions(
            self.conn,
            &format!(
                "{SESSION_SELECT_SQL}
                 WHERE tutor_id = ?1
                   AND student_id IS NULL
                 ORDER BY start_at ASC, id ASC;"
            ),
            tutor_id,
        )
    }

    fn sessions_for_student(&self, student_id: StudentId) -> RepoResult<Vec<Session>> {
        query_sessions(
            self.conn,
            &format!(
                "{SESSION_SELECT_SQL}
                 WHERE student_id = ?1
                 ORDER BY start_at ASC, id ASC;"
            ),
            student_id,
        )
    }

    fn book_session(
        &mut self,
        id: SessionId,
        student_id: StudentId,
        class_id: ClassId,
    ) -> RepoResult<Session> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let session =
            load_session(&tx, id)?.ok_or_else(|| RepoError::not_found(Entity::Session, id))?;
        if !session.is_open() {
            return Err(RepoError::AlreadyBooked(id));
        }
        if !row_exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM students WHERE id = ?1);",
            student_id,
        )? {
            return Err(RepoError::not_found(Entity::Student, student_id));
        }
        let offered: i64 = tx.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM class_tutors
                WHERE class_id = ?1 AND tutor_id = ?2
            );",
            params![class_id, session.tutor_id],
            |row| row.get(0),
        )?;
        if offered != 1 {
            return Err(RepoError::ClassNotOffered {
                class_id,
                tutor_id: session.tutor_id,
            });
        }

        let changed = tx.execute(
            "UPDATE sessions
             SET
                student_id = ?2,
                class_id = ?3
             WHERE id = ?1
               AND student_id IS NULL;",
            params![id, student_id, class_id],
        )?;
        if changed == 0 {
            return Err(RepoError::AlreadyBooked(id));
        }

        let booked = load_session(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("session {id} missing after booking"))
        })?;
        tx.commit()?;
        Ok(booked)
    }

    fn cancel_session(&mut self, id: SessionId) -> RepoResult<CancelOutcome> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let session =
            load_session(&tx, id)?.ok_or_else(|| RepoError::not_found(Entity::Session, id))?;
        let Some(student_id) = session.student_id else {
            return Ok(CancelOutcome::AlreadyOpen(session));
        };

        tx.execute(
            "UPDATE sessions SET student_id = NULL WHERE id = ?1;",
            [id],
        )?;
        let released = load_session(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("session {id} missing after cancel"))
        })?;
        tx.commit()?;

        Ok(CancelOutcome::Released {
            session: released,
            student_id,
        })
    }

    fn booking_details(&self, id: SessionId) -> RepoResult<Option<BookingDetails>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                s.id,
                s.tutor_id,
                s.student_id,
                s.start_at,
                s.end_at,
                s.class_id,
                sa.email AS student_email,
                sa.first_name AS student_first,
                sa.last_name AS student_last,
                ta.first_name AS tutor_first,
                ta.last_name AS tutor_last,
                m.abbreviation AS class_major,
                c.course_num AS class_num
             FROM sessions s
             INNER JOIN tutors t ON t.id = s.tutor_id
             INNER JOIN accounts ta ON ta.id = t.account_id
             INNER JOIN students st ON st.id = s.student_id
             INNER JOIN accounts sa ON sa.id = st.account_id
             LEFT JOIN classes c ON c.id = s.class_id
             LEFT JOIN majors m ON m.id = c.major_id
             WHERE s.id = ?1;",
        )?;

        let mut rows = stmt.query([id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let session = parse_session_row(row)?;
        let class_major: Option<String> = row.get("class_major")?;
        let class_num: Option<i64> = row.get("class_num")?;
        let class_label = match (class_major, class_num) {
            (Some(major), Some(num)) => Some(format!("{major} {num}")),
            _ => None,
        };
        let student_first: String = row.get("student_first")?;
        let student_last: String = row.get("student_last")?;
        let tutor_first: String = row.get("tutor_first")?;
        let tutor_last: String = row.get("tutor_last")?;

        Ok(Some(BookingDetails {
            tutor_id: session.tutor_id,
            session,
            student_email: row.get("student_email")?,
            student_name: format!("{student_first} {student_last}"),
            tutor_name: format!("{tutor_first} {tutor_last}"),
            class_label,
        }))
    }

    fn tutor_exists(&self, tutor_id: TutorId) -> RepoResult<bool> {
        tutor_exists(self.conn, tutor_id)
    }

    fn add_shift(
        &self,
        tutor_id: TutorId,
        weekday: Weekday,
        start: NaiveTime,
        end: NaiveTime,
    ) -> RepoResult<Shift> {
        if !tutor_exists(self.conn, tutor_id)? {
            return Err(RepoError::not_found(Entity::Tutor, tutor_id));
        }

        self.conn.execute(
            "INSERT INTO shifts (tutor_id, weekday, start_minute, end_minute)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                tutor_id,
                weekday.num_days_from_monday(),
                minute_of_day(start),
                minute_of_day(end),
            ],
        )?;

        Ok(Shift {
            id: self.conn.last_insert_rowid(),
            tutor_id,
            weekday,
            start,
            end,
        })
    }

    fn list_shifts(&self) -> RepoResult<Vec<Shift>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, tutor_id, weekday, start_minute, end_minute
             FROM shifts
             ORDER BY tutor_id ASC, weekday ASC, start_minute ASC, id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut shifts = Vec::new();
        while let Some(row) = rows.next()? {
            shifts.push(parse_shift_row(row)?);
        }
        Ok(shifts)
    }
}

fn load_session(conn: &Connection, id: SessionId) -> RepoResult<Option<Session>> {
    let session = conn
        .query_row(&format!("{SESSION_SELECT_SQL} WHERE id = ?1;"), [id], |row| {
            Ok(parse_session_row(row))
        })
        .optional()?
        .transpose()?;
    Ok(session)
}

fn query_sessions(conn: &Connection, sql: &str, key: i64) -> RepoResult<Vec<Session>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([key])?;
    let mut sessions = Vec::new();
    while let Some(row) = rows.next()? {
        sessions.push(parse_session_row(row)?);
    }
    Ok(sessions)
}

fn parse_session_row(row: &Row<'_>) -> RepoResult<Session> {
    let session = Session {
        id: row.get("id")?,
        tutor_id: row.get("tutor_id")?,
        student_id: row.get("student_id")?,
        start_at: row.get("start_at")?,
        end_at: row.get("end_at")?,
        class_id: row.get("class_id")?,
    };
    if session.end_at <= session.start_at {
        return Err(RepoError::InvalidData(format!(
            "session {} ends before it starts",
            session.id
        )));
    }
    Ok(session)
}

fn parse_shift_row(row: &Row<'_>) -> RepoResult<Shift> {
    let weekday_index: u8 = row.get("weekday")?;
    let weekday = Weekday::try_from(weekday_index).map_err(|_| {
        RepoError::InvalidData(format!("invalid weekday `{weekday_index}` in shifts.weekday"))
    })?;

    let start = minute_to_time(row.get("start_minute")?)?;
    let end = minute_to_time(row.get("end_minute")?)?;

    Ok(Shift {
        id: row.get("id")?,
        tutor_id: row.get("tutor_id")?,
        weekday,
        start,
        end,
    })
}

fn minute_to_time(minute: u32) -> RepoResult<NaiveTime> {
    NaiveTime::from_hms_opt(minute / 60, minute % 60, 0).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid minute-of-day `{minute}` in shifts"))
    })
}
