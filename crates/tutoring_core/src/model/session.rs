//! Bookable sessions and the weekly shifts they are generated from.
//!
//! # Responsibility
//! - Define session slots and their open/booked state.
//! - Map a weekly shift onto concrete UTC time ranges.
//!
//! # Invariants
//! - `student_id == None` means the session is open.
//! - `end_at` is strictly after `start_at` (epoch milliseconds, UTC).
//! - A shift ends after it starts, within a single day.

use crate::model::account::StudentId;
use crate::model::tutor::{ClassId, TutorId};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SessionId = i64;
pub type ShiftId = i64;

/// A time-boxed tutoring slot owned by one tutor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub tutor_id: TutorId,
    pub student_id: Option<StudentId>,
    pub start_at: i64,
    pub end_at: i64,
    /// Left in place when a booking is cancelled.
    pub class_id: Option<ClassId>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.student_id.is_none()
    }
}

/// Input for direct session creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewSession {
    pub tutor_id: TutorId,
    pub start_at: i64,
    pub end_at: i64,
}

impl NewSession {
    pub fn validate(&self) -> Result<(), ScheduleValidationError> {
        if self.end_at <= self.start_at {
            return Err(ScheduleValidationError::EndNotAfterStart);
        }
        Ok(())
    }
}

/// Recurring weekly availability of a tutor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub tutor_id: TutorId,
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Shift {
    /// UTC range `(start_ms, end_ms)` of this shift on `date`, when the
    /// weekday matches.
    pub fn occurrence_on(&self, date: NaiveDate) -> Option<(i64, i64)> {
        if date.weekday() == self.weekday {
            let start = date.and_time(self.start).and_utc().timestamp_millis();
            let end = date.and_time(self.end).and_utc().timestamp_millis();
            Some((start, end))
        } else {
            None
        }
    }
}

/// Validates a shift's time range.
pub fn validate_shift(start: NaiveTime, end: NaiveTime) -> Result<(), ScheduleValidationError> {
    if start.second() != 0 || end.second() != 0 || start.nanosecond() != 0 || end.nanosecond() != 0
    {
        return Err(ScheduleValidationError::SubMinutePrecision);
    }
    if end <= start {
        return Err(ScheduleValidationError::EndNotAfterStart);
    }
    Ok(())
}

/// Minutes since midnight, as stored in `shifts`.
pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Read model used to notify a student about a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingDetails {
    pub session: Session,
    pub student_email: String,
    pub student_name: String,
    pub tutor_id: TutorId,
    pub tutor_name: String,
    pub class_label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleValidationError {
    EndNotAfterStart,
    SubMinutePrecision,
}

impl Display for ScheduleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndNotAfterStart => write!(f, "end must be after start"),
            Self::SubMinutePrecision => write!(f, "shift times must be whole minutes"),
        }
    }
}

impl Error for ScheduleValidationError {}
