//! Feedback entries and rating aggregation math.
//!
//! # Invariants
//! - Feedback is immutable once stored.
//! - A tutor's rating is the mean of its feedback ratings, clamped into
//!   `[MIN_RATING, MAX_RATING]`; with no feedback it is left unchanged.

use crate::model::tutor::TutorId;
use serde::{Deserialize, Serialize};

pub type FeedbackId = i64;

pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 5.0;
/// Longest accepted feedback comment.
pub const COMMENT_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: FeedbackId,
    pub tutor_id: TutorId,
    /// Stored as submitted; expected in `[0, 5]` but not clamped.
    pub rating: f64,
    pub comment: Option<String>,
}

/// Arithmetic mean of `ratings`, or `None` for an empty set.
pub fn mean_rating(ratings: &[f64]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: f64 = ratings.iter().sum();
    Some(sum / ratings.len() as f64)
}

/// Clamps an aggregate into the range a tutor rating may hold.
pub fn clamp_rating(value: f64) -> f64 {
    value.clamp(MIN_RATING, MAX_RATING)
}

#[cfg(test)]
mod tests {
    use super::{clamp_rating, mean_rating};

    #[test]
    fn mean_of_three_ratings() {
        assert_eq!(mean_rating(&[4.0, 5.0, 3.0]), Some(4.0));
    }

    #[test]
    fn empty_set_has_no_mean() {
        assert_eq!(mean_rating(&[]), None);
    }

    #[test]
    fn clamp_keeps_out_of_range_aggregates_in_bounds() {
        assert_eq!(clamp_rating(7.5), 5.0);
        assert_eq!(clamp_rating(-1.0), 0.0);
        assert_eq!(clamp_rating(3.25), 3.25);
    }
}
