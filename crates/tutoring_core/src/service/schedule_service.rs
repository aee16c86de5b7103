//! Session scheduling use-cases.
//!
//! # Responsibility
//! - Record tutors' weekly shifts.
//! - Materialize shifts into bookable sessions over a date window.
//!
//! # Invariants
//! - Generation never creates two sessions with the same tutor and start;
//!   rerunning it over the same window creates nothing new.
//! - Generated ranges are computed in UTC.

use crate::error::ErrorKind;
use crate::model::session::{validate_shift, NewSession, ScheduleValidationError, Session, Shift};
use crate::model::tutor::TutorId;
use crate::repo::session_repo::SessionRepository;
use crate::repo::{Entity, RepoError};
use chrono::{Days, NaiveDate, NaiveTime, Weekday};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ScheduleError {
    Validation(ScheduleValidationError),
    TutorNotFound(TutorId),
    /// The tutor already has a session starting at that instant.
    DuplicateSession,
    /// The requested window runs past the supported calendar.
    WindowOutOfRange,
    Repo(RepoError),
}

impl ScheduleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::DuplicateSession | Self::WindowOutOfRange => {
                ErrorKind::ValidationError
            }
            Self::TutorNotFound(_) => ErrorKind::NotFound,
            Self::Repo(_) => ErrorKind::StorageFailure,
        }
    }
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::TutorNotFound(id) => write!(f, "tutor not found: {id}"),
            Self::DuplicateSession => write!(f, "tutor already has a session at that start"),
            Self::WindowOutOfRange => write!(f, "schedule window is out of range"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ScheduleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ScheduleValidationError> for ScheduleError {
    fn from(value: ScheduleValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ScheduleError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: Entity::Tutor,
                id,
            } => Self::TutorNotFound(id),
            RepoError::Duplicate(_) => Self::DuplicateSession,
            other => Self::Repo(other),
        }
    }
}

pub struct ScheduleService<R: SessionRepository> {
    repo: R,
}

impl<R: SessionRepository> ScheduleService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds a weekly availability shift for `tutor_id`.
    pub fn add_shift(
        &self,
        tutor_id: TutorId,
        weekday: Weekday,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Shift, ScheduleError> {
        validate_shift(start, end)?;
        let shift = self.repo.add_shift(tutor_id, weekday, start, end)?;
        info!(
            "event=shift_add module=service status=ok shift_id={} tutor_id={tutor_id} weekday={weekday}",
            shift.id
        );
        Ok(shift)
    }

    pub fn shifts(&self) -> Result<Vec<Shift>, ScheduleError> {
        Ok(self.repo.list_shifts()?)
    }

    /// Creates one open session outside the shift schedule.
    pub fn create_session(
        &self,
        tutor_id: TutorId,
        start_at: i64,
        end_at: i64,
    ) -> Result<Session, ScheduleError> {
        let input = NewSession {
            tutor_id,
            start_at,
            end_at,
        };
        input.validate()?;
        let session = self.repo.create_session(&input)?;
        info!(
            "event=session_create module=service status=ok session_id={} tutor_id={tutor_id}",
            session.id
        );
        Ok(session)
    }

    /// Creates sessions for every shift occurrence in
    /// `[from, from + days)`, skipping ones that already exist.
    /// Returns how many sessions were created.
    pub fn generate_sessions(&self, from: NaiveDate, days: u32) -> Result<usize, ScheduleError> {
        info!("event=session_generate module=service status=start from={from} days={days}");
        let shifts = self.repo.list_shifts()?;

        let mut created = 0usize;
        let mut skipped = 0usize;
        for offset in 0..days {
            let date = from
                .checked_add_days(Days::new(u64::from(offset)))
                .ok_or(ScheduleError::WindowOutOfRange)?;
            for shift in &shifts {
                let Some((start_at, end_at)) = shift.occurrence_on(date) else {
                    continue;
                };
                let inserted = self
                    .repo
                    .insert_session_if_absent(&NewSession {
                        tutor_id: shift.tutor_id,
                        start_at,
                        end_at,
                    })
                    .map_err(|err| {
                        warn!(
                            "event=session_generate module=service status=error shift_id={} error={err}",
                            shift.id
                        );
                        ScheduleError::from(err)
                    })?;
                if inserted {
                    created += 1;
                } else {
                    skipped += 1;
                }
            }
        }

        info!(
            "event=session_generate module=service status=ok shifts={} created={created} skipped={skipped}",
            shifts.len()
        );
        Ok(created)
    }
}
