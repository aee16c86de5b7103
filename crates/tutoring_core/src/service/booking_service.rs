//! Session booking use-cases.
//!
//! # Responsibility
//! - Claim open sessions for students and release them again.
//! - Hand confirmed bookings to the notifier after they are committed.
//!
//! # Invariants
//! - Of any number of concurrent bookers for one open session, exactly one
//!   succeeds; the rest observe `AlreadyBooked`.
//! - A failed booking leaves the session row untouched.
//! - A notifier failure is logged and never undoes a committed booking.
//! - Cancelling an open session is a no-op that returns the session.

use crate::error::ErrorKind;
use crate::model::account::StudentId;
use crate::model::session::{Session, SessionId};
use crate::model::tutor::{ClassId, TutorId};
use crate::notify::BookingNotifier;
use crate::repo::session_repo::{CancelOutcome, SessionRepository};
use crate::repo::{Entity, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from booking use-cases.
#[derive(Debug)]
pub enum BookingError {
    SessionNotFound(SessionId),
    StudentNotFound(StudentId),
    TutorNotFound(TutorId),
    AlreadyBooked(SessionId),
    /// The class is unknown or the session's tutor does not offer it.
    ClassNotOffered { class_id: ClassId, tutor_id: TutorId },
    Repo(RepoError),
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SessionNotFound(_) | Self::StudentNotFound(_) | Self::TutorNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::AlreadyBooked(_) => ErrorKind::AlreadyBooked,
            Self::ClassNotOffered { .. } => ErrorKind::ValidationError,
            Self::Repo(_) => ErrorKind::StorageFailure,
        }
    }
}

impl Display for BookingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionNotFound(id) => write!(f, "session not found: {id}"),
            Self::StudentNotFound(id) => write!(f, "student not found: {id}"),
            Self::TutorNotFound(id) => write!(f, "tutor not found: {id}"),
            Self::AlreadyBooked(id) => write!(f, "session already booked: {id}"),
            Self::ClassNotOffered { class_id, tutor_id } => {
                write!(f, "class {class_id} is not offered by tutor {tutor_id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BookingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BookingError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: Entity::Session,
                id,
            } => Self::SessionNotFound(id),
            RepoError::NotFound {
                entity: Entity::Student,
                id,
            } => Self::StudentNotFound(id),
            RepoError::NotFound {
                entity: Entity::Tutor,
                id,
            } => Self::TutorNotFound(id),
            RepoError::AlreadyBooked(id) => Self::AlreadyBooked(id),
            RepoError::ClassNotOffered { class_id, tutor_id } => {
                Self::ClassNotOffered { class_id, tutor_id }
            }
            other => Self::Repo(other),
        }
    }
}

/// Booking service facade over a session repository and a notifier.
pub struct BookingService<R: SessionRepository, N: BookingNotifier> {
    repo: R,
    notifier: N,
}

impl<R: SessionRepository, N: BookingNotifier> BookingService<R, N> {
    pub fn new(repo: R, notifier: N) -> Self {
        Self { repo, notifier }
    }

    /// Books `session_id` for `student_id` and `class_id`.
    ///
    /// The booking is committed before the notifier runs; the returned
    /// session reflects the committed row whatever the notifier does.
    pub fn book(
        &mut self,
        session_id: SessionId,
        student_id: StudentId,
        class_id: ClassId,
    ) -> Result<Session, BookingError> {
        let session = self
            .repo
            .book_session(session_id, student_id, class_id)
            .map_err(|err| {
                let err = BookingError::from(err);
                warn!(
                    "event=session_book module=service status=error session_id={session_id} kind={}",
                    err.kind()
                );
                err
            })?;
        info!(
            "event=session_book module=service status=ok session_id={} tutor_id={} class_id={class_id}",
            session.id, session.tutor_id
        );

        self.notify_booked(session.id);
        Ok(session)
    }

    /// Releases the student from `session_id`, keeping the chosen class.
    pub fn cancel(&mut self, session_id: SessionId) -> Result<Session, BookingError> {
        match self.repo.cancel_session(session_id)? {
            CancelOutcome::Released { session, .. } => {
                info!(
                    "event=session_cancel module=service status=ok session_id={} tutor_id={}",
                    session.id, session.tutor_id
                );
                Ok(session)
            }
            CancelOutcome::AlreadyOpen(session) => {
                info!(
                    "event=session_cancel module=service status=noop session_id={}",
                    session.id
                );
                Ok(session)
            }
        }
    }

    pub fn get_session(&self, session_id: SessionId) -> Result<Session, BookingError> {
        self.repo
            .get_session(session_id)?
            .ok_or(BookingError::SessionNotFound(session_id))
    }

    /// Open sessions of one tutor, earliest first.
    pub fn available_sessions(&self, tutor_id: TutorId) -> Result<Vec<Session>, BookingError> {
        if !self.repo.tutor_exists(tutor_id)? {
            return Err(BookingError::TutorNotFound(tutor_id));
        }
        Ok(self.repo.open_sessions_for_tutor(tutor_id)?)
    }

    /// Sessions currently booked by one student, earliest first.
    pub fn student_sessions(&self, student_id: StudentId) -> Result<Vec<Session>, BookingError> {
        Ok(self.repo.sessions_for_student(student_id)?)
    }

    fn notify_booked(&self, session_id: SessionId) {
        let details = match self.repo.booking_details(session_id) {
            Ok(Some(details)) => details,
            Ok(None) => {
                warn!(
                    "event=booking_notify module=service status=skipped session_id={session_id} reason=details_missing"
                );
                return;
            }
            Err(err) => {
                warn!(
                    "event=booking_notify module=service status=error session_id={session_id} error={err}"
                );
                return;
            }
        };

        if let Err(err) = self.notifier.booking_confirmed(&details) {
            warn!(
                "event=booking_notify module=service status=error session_id={session_id} error={err}"
            );
        }
    }
}
