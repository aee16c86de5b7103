//! Tutor directory and course catalog use-cases.
//!
//! # Responsibility
//! - Browse tutors by major and name.
//! - Maintain majors, classes, tutor class offers and profile fields.

use crate::error::ErrorKind;
use crate::model::tutor::{
    ClassId, Major, MajorId, SubjectClass, Tutor, TutorFilter, TutorId, TutorProfileUpdate,
};
use crate::repo::tutor_repo::TutorRepository;
use crate::repo::{Entity, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAJOR_NAME_MAX_CHARS: usize = 50;
const ABBREVIATION_MAX_CHARS: usize = 10;

#[derive(Debug)]
pub enum DirectoryError {
    NotFound { entity: Entity, id: i64 },
    /// Input failed a field constraint.
    InvalidInput(String),
    Duplicate(&'static str),
    Repo(RepoError),
}

impl DirectoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidInput(_) | Self::Duplicate(_) => ErrorKind::ValidationError,
            Self::Repo(_) => ErrorKind::StorageFailure,
        }
    }
}

impl Display for DirectoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::Duplicate(what) => write!(f, "duplicate {what}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DirectoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for DirectoryError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Duplicate(what) => Self::Duplicate(what),
            other => Self::Repo(other),
        }
    }
}

pub struct TutorService<R: TutorRepository> {
    repo: R,
}

impl<R: TutorRepository> TutorService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists tutors matching `filter`, ordered by last name, first name, id.
    /// Blank filter fields are ignored.
    pub fn browse(&self, filter: TutorFilter) -> Result<Vec<Tutor>, DirectoryError> {
        let filter = TutorFilter {
            major: non_blank(filter.major),
            search: non_blank(filter.search),
        };
        Ok(self.repo.list_tutors(&filter)?)
    }

    pub fn get_tutor(&self, id: TutorId) -> Result<Tutor, DirectoryError> {
        self.repo.get_tutor(id)?.ok_or(DirectoryError::NotFound {
            entity: Entity::Tutor,
            id,
        })
    }

    pub fn update_profile(
        &self,
        id: TutorId,
        update: TutorProfileUpdate,
    ) -> Result<Tutor, DirectoryError> {
        if update.minutes_tutored < 0 {
            return Err(DirectoryError::InvalidInput(
                "minutes_tutored must not be negative".to_string(),
            ));
        }
        let update = TutorProfileUpdate {
            description: non_blank(update.description),
            ..update
        };
        let tutor = self.repo.update_profile(id, &update)?;
        info!("event=tutor_profile_update module=service status=ok tutor_id={id}");
        Ok(tutor)
    }

    pub fn create_major(&self, name: &str, abbreviation: &str) -> Result<Major, DirectoryError> {
        let name = required_text("name", name, MAJOR_NAME_MAX_CHARS)?;
        let abbreviation = required_text("abbreviation", abbreviation, ABBREVIATION_MAX_CHARS)?;
        let major = self.repo.create_major(name, abbreviation)?;
        info!(
            "event=major_create module=service status=ok major_id={}",
            major.id
        );
        Ok(major)
    }

    pub fn list_majors(&self) -> Result<Vec<Major>, DirectoryError> {
        Ok(self.repo.list_majors()?)
    }

    pub fn create_class(
        &self,
        major_id: MajorId,
        course_num: i64,
        course_name: Option<&str>,
    ) -> Result<SubjectClass, DirectoryError> {
        if course_num <= 0 {
            return Err(DirectoryError::InvalidInput(
                "course number must be positive".to_string(),
            ));
        }
        let course_name = course_name.map(str::trim).filter(|name| !name.is_empty());
        let class = self.repo.create_class(major_id, course_num, course_name)?;
        info!(
            "event=class_create module=service status=ok class_id={} major_id={major_id}",
            class.id
        );
        Ok(class)
    }

    pub fn offer_class(&self, class_id: ClassId, tutor_id: TutorId) -> Result<(), DirectoryError> {
        self.repo.offer_class(class_id, tutor_id)?;
        info!("event=class_offer module=service status=ok class_id={class_id} tutor_id={tutor_id}");
        Ok(())
    }

    pub fn classes_for_tutor(&self, tutor_id: TutorId) -> Result<Vec<SubjectClass>, DirectoryError> {
        if self.repo.get_tutor(tutor_id)?.is_none() {
            return Err(DirectoryError::NotFound {
                entity: Entity::Tutor,
                id: tutor_id,
            });
        }
        Ok(self.repo.classes_for_tutor(tutor_id)?)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn required_text<'a>(field: &str, value: &'a str, max: usize) -> Result<&'a str, DirectoryError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DirectoryError::InvalidInput(format!("{field} must not be empty")));
    }
    if value.chars().count() > max {
        return Err(DirectoryError::InvalidInput(format!(
            "{field} exceeds {max} characters"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::non_blank;

    #[test]
    fn blank_filter_values_are_dropped() {
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" Ada ".to_string())), Some("Ada".to_string()));
    }
}
