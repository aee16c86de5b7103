//! Tutor profile, majors and subject classes.

use crate::model::account::AccountId;
use serde::{Deserialize, Serialize};

pub type TutorId = i64;
pub type MajorId = i64;
pub type ClassId = i64;

/// Tutor profile joined with the owning account's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tutor {
    pub id: TutorId,
    pub account_id: AccountId,
    pub first_name: String,
    pub last_name: String,
    /// Never negative.
    pub minutes_tutored: i64,
    /// Mean feedback rating, kept within `[0, 5]`.
    pub rating: f64,
    pub major_id: Option<MajorId>,
    pub description: Option<String>,
}

impl Tutor {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Major {
    pub id: MajorId,
    pub name: String,
    pub abbreviation: String,
}

/// A course students can book a session for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectClass {
    pub id: ClassId,
    pub major_id: MajorId,
    pub major_abbreviation: String,
    pub course_num: i64,
    pub course_name: Option<String>,
}

impl SubjectClass {
    /// Short label such as `CS 101`.
    pub fn label(&self) -> String {
        format!("{} {}", self.major_abbreviation, self.course_num)
    }
}

/// Full replacement of the editable tutor profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TutorProfileUpdate {
    pub description: Option<String>,
    pub major_id: Option<MajorId>,
    pub minutes_tutored: i64,
}

/// Directory filter used when students browse tutors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TutorFilter {
    /// Exact major name.
    pub major: Option<String>,
    /// Case-insensitive substring of the first or last name.
    pub search: Option<String>,
}
