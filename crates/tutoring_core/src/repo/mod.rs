//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Keep SQL and transaction boundaries inside the persistence layer.
//! - Report semantic failures (`NotFound`, `AlreadyBooked`, ...) separately
//!   from storage transport errors.
//!
//! # Invariants
//! - Multi-row writes run in one transaction; an error drops the
//!   transaction, which rolls it back.
//! - Repositories refuse connections whose schema is not fully migrated.

pub mod account_repo;
pub mod feedback_repo;
pub mod role_sync;
pub mod session_repo;
pub mod tutor_repo;

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::session::SessionId;
use crate::model::tutor::{ClassId, TutorId};
use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity names used in `NotFound` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Account,
    Student,
    Tutor,
    Major,
    SubjectClass,
    Session,
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Account => "account",
            Self::Student => "student",
            Self::Tutor => "tutor",
            Self::Major => "major",
            Self::SubjectClass => "class",
            Self::Session => "session",
        };
        f.write_str(name)
    }
}

/// Repository error shared by all SQLite repositories.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound { entity: Entity, id: i64 },
    /// The session already has a student assigned.
    AlreadyBooked(SessionId),
    /// The class is unknown or not offered by the session's tutor.
    ClassNotOffered { class_id: ClassId, tutor_id: TutorId },
    /// A unique constraint rejected the write.
    Duplicate(&'static str),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::AlreadyBooked(id) => write!(f, "session already booked: {id}"),
            Self::ClassNotOffered { class_id, tutor_id } => {
                write!(f, "class {class_id} is not offered by tutor {tutor_id}")
            }
            Self::Duplicate(what) => write!(f, "duplicate {what}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
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

impl RepoError {
    pub(crate) fn not_found(entity: Entity, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}

/// Rejects connections that did not go through `db::open_db*`.
pub(crate) fn ensure_schema_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && (failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}

pub(crate) fn row_exists(conn: &Connection, sql: &str, id: i64) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(sql, [id], |row| row.get(0))?;
    Ok(exists == 1)
}
