//! Tutor rating aggregation.

use crate::error::ErrorKind;
use crate::model::feedback::Feedback;
use crate::model::tutor::{Tutor, TutorId};
use crate::repo::feedback_repo::FeedbackRepository;
use crate::repo::{Entity, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum RatingError {
    TutorNotFound(TutorId),
    Repo(RepoError),
}

impl RatingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TutorNotFound(_) => ErrorKind::NotFound,
            Self::Repo(_) => ErrorKind::StorageFailure,
        }
    }
}

impl Display for RatingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TutorNotFound(id) => write!(f, "tutor not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RatingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::TutorNotFound(_) => None,
        }
    }
}

impl From<RepoError> for RatingError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: Entity::Tutor,
                id,
            } => Self::TutorNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub struct RatingService<R: FeedbackRepository> {
    repo: R,
}

impl<R: FeedbackRepository> RatingService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Sets the tutor's rating to the clamped mean of all their feedback.
    /// A tutor without feedback keeps the rating they have.
    pub fn recompute(&mut self, tutor_id: TutorId) -> Result<Tutor, RatingError> {
        let tutor = self.repo.recompute_rating(tutor_id)?;
        info!(
            "event=rating_recompute module=service status=ok tutor_id={tutor_id} rating={:.2}",
            tutor.rating
        );
        Ok(tutor)
    }

    pub fn feedback_for(&self, tutor_id: TutorId) -> Result<Vec<Feedback>, RatingError> {
        if self.repo.get_tutor(tutor_id)?.is_none() {
            return Err(RatingError::TutorNotFound(tutor_id));
        }
        Ok(self.repo.list_feedback(tutor_id)?)
    }
}
