//! Feedback link redemption and feedback submission.
//!
//! # Responsibility
//! - Resolve signed feedback links to tutors.
//! - Store submitted feedback and refresh the tutor rating with it.
//!
//! # Invariants
//! - A link that verifies but names no existing tutor is `Invalid`, the
//!   same as a forged one.
//! - Links are not consumed; redeeming twice yields the same tutor.
//! - Feedback insert and rating recompute commit together.

use crate::error::ErrorKind;
use crate::link::feedback_link::{
    now_epoch_secs, FeedbackLinkSigner, LinkError, DEFAULT_MAX_AGE_SECS,
};
use crate::model::feedback::COMMENT_MAX_CHARS;
use crate::model::tutor::Tutor;
use crate::repo::feedback_repo::FeedbackRepository;
use crate::repo::{Entity, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum FeedbackError {
    Link(LinkError),
    /// Rating is NaN or infinite.
    InvalidRating(f64),
    CommentTooLong { max: usize },
    Repo(RepoError),
}

impl FeedbackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Link(err) => err.kind(),
            Self::InvalidRating(_) | Self::CommentTooLong { .. } => ErrorKind::ValidationError,
            Self::Repo(_) => ErrorKind::StorageFailure,
        }
    }
}

impl Display for FeedbackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Link(err) => write!(f, "{err}"),
            Self::InvalidRating(value) => write!(f, "rating must be a finite number, got {value}"),
            Self::CommentTooLong { max } => write!(f, "comment exceeds {max} characters"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FeedbackError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Link(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LinkError> for FeedbackError {
    fn from(value: LinkError) -> Self {
        Self::Link(value)
    }
}

impl From<RepoError> for FeedbackError {
    fn from(value: RepoError) -> Self {
        match value {
            // The tutor vanished between verification and write.
            RepoError::NotFound {
                entity: Entity::Tutor,
                ..
            } => Self::Link(LinkError::Invalid),
            other => Self::Repo(other),
        }
    }
}

/// Feedback service facade over a feedback repository and link signer.
pub struct FeedbackService<R: FeedbackRepository> {
    repo: R,
    signer: FeedbackLinkSigner,
    max_age_secs: u64,
}

impl<R: FeedbackRepository> FeedbackService<R> {
    pub fn new(repo: R, signer: FeedbackLinkSigner) -> Self {
        Self {
            repo,
            signer,
            max_age_secs: DEFAULT_MAX_AGE_SECS,
        }
    }

    /// Overrides the link validity window.
    pub fn with_max_age(mut self, max_age_secs: u64) -> Self {
        self.max_age_secs = max_age_secs;
        self
    }

    /// Resolves a feedback link to its tutor.
    pub fn redeem(&self, token: &str) -> Result<Tutor, FeedbackError> {
        self.redeem_at(token, now_epoch_secs())
    }

    /// Resolves a feedback link as if the current time were `now`.
    pub fn redeem_at(&self, token: &str, now: i64) -> Result<Tutor, FeedbackError> {
        let claims = self
            .signer
            .verify_at(token, now, self.max_age_secs)
            .map_err(|err| {
                info!(
                    "event=feedback_redeem module=service status=rejected kind={}",
                    err.kind()
                );
                err
            })?;

        match self.repo.get_tutor(claims.tutor_id)? {
            Some(tutor) => Ok(tutor),
            None => {
                info!(
                    "event=feedback_redeem module=service status=rejected kind=invalid reason=unknown_tutor"
                );
                Err(LinkError::Invalid.into())
            }
        }
    }

    /// Redeems `token` and records one feedback entry for its tutor.
    /// Returns the tutor with the refreshed rating.
    pub fn submit(
        &mut self,
        token: &str,
        rating: f64,
        comment: Option<&str>,
    ) -> Result<Tutor, FeedbackError> {
        self.submit_at(token, rating, comment, now_epoch_secs())
    }

    pub fn submit_at(
        &mut self,
        token: &str,
        rating: f64,
        comment: Option<&str>,
        now: i64,
    ) -> Result<Tutor, FeedbackError> {
        if !rating.is_finite() {
            return Err(FeedbackError::InvalidRating(rating));
        }
        let comment = comment.map(str::trim).filter(|text| !text.is_empty());
        if comment.is_some_and(|text| text.chars().count() > COMMENT_MAX_CHARS) {
            return Err(FeedbackError::CommentTooLong {
                max: COMMENT_MAX_CHARS,
            });
        }

        let tutor = self.redeem_at(token, now)?;
        let (feedback, tutor) = self
            .repo
            .record_feedback(tutor.id, rating, comment)
            .map_err(|err| {
                warn!(
                    "event=feedback_submit module=service status=error tutor_id={} error={err}",
                    tutor.id
                );
                FeedbackError::from(err)
            })?;

        info!(
            "event=feedback_submit module=service status=ok feedback_id={} tutor_id={} rating={:.2}",
            feedback.id, tutor.id, tutor.rating
        );
        Ok(tutor)
    }
}
