//! Feedback repository and rating aggregation storage.
//!
//! # Responsibility
//! - Append feedback rows for a tutor.
//! - Recompute `tutors.rating` from the full feedback set.
//!
//! # Invariants
//! - Feedback insert and the rating recompute it triggers commit together.
//! - Recompute reads the feedback set and writes the rating inside one
//!   immediate transaction, so the written value matches a consistent
//!   snapshot.
//! - With no feedback rows the stored rating is left as it is.

use crate::model::feedback::{clamp_rating, mean_rating, Feedback};
use crate::model::tutor::{Tutor, TutorId};
use crate::repo::tutor_repo::{load_tutor, tutor_exists};
use crate::repo::{ensure_schema_ready, Entity, RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

/// Repository interface for feedback and tutor ratings.
pub trait FeedbackRepository {
    fn get_tutor(&self, id: TutorId) -> RepoResult<Option<Tutor>>;
    /// Stores one feedback entry and recomputes the tutor rating.
    fn record_feedback(
        &mut self,
        tutor_id: TutorId,
        rating: f64,
        comment: Option<&str>,
    ) -> RepoResult<(Feedback, Tutor)>;
    fn list_feedback(&self, tutor_id: TutorId) -> RepoResult<Vec<Feedback>>;
    fn recompute_rating(&mut self, tutor_id: TutorId) -> RepoResult<Tutor>;
}

/// SQLite-backed feedback repository.
pub struct SqliteFeedbackRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteFeedbackRepository<'conn> {
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl FeedbackRepository for SqliteFeedbackRepository<'_> {
    fn get_tutor(&self, id: TutorId) -> RepoResult<Option<Tutor>> {
        load_tutor(self.conn, id)
    }

    fn record_feedback(
        &mut self,
        tutor_id: TutorId,
        rating: f64,
        comment: Option<&str>,
    ) -> RepoResult<(Feedback, Tutor)> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !tutor_exists(&tx, tutor_id)? {
            return Err(RepoError::not_found(Entity::Tutor, tutor_id));
        }

        tx.execute(
            "INSERT INTO feedback (tutor_id, rating, comment) VALUES (?1, ?2, ?3);",
            params![tutor_id, rating, comment],
        )?;
        let feedback = Feedback {
            id: tx.last_insert_rowid(),
            tutor_id,
            rating,
            comment: comment.map(str::to_string),
        };

        let tutor = recompute_in_tx(&tx, tutor_id)?;
        tx.commit()?;
        Ok((feedback, tutor))
    }

    fn list_feedback(&self, tutor_id: TutorId) -> RepoResult<Vec<Feedback>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, tutor_id, rating, comment
             FROM feedback
             WHERE tutor_id = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([tutor_id])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(Feedback {
                id: row.get("id")?,
                tutor_id: row.get("tutor_id")?,
                rating: row.get("rating")?,
                comment: row.get("comment")?,
            });
        }
        Ok(entries)
    }

    fn recompute_rating(&mut self, tutor_id: TutorId) -> RepoResult<Tutor> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let tutor = recompute_in_tx(&tx, tutor_id)?;
        tx.commit()?;
        Ok(tutor)
    }
}

fn recompute_in_tx(tx: &Transaction<'_>, tutor_id: TutorId) -> RepoResult<Tutor> {
    if !tutor_exists(tx, tutor_id)? {
        return Err(RepoError::not_found(Entity::Tutor, tutor_id));
    }

    let ratings = {
        let mut stmt = tx.prepare("SELECT rating FROM feedback WHERE tutor_id = ?1;")?;
        let mut rows = stmt.query([tutor_id])?;
        let mut ratings = Vec::new();
        while let Some(row) = rows.next()? {
            ratings.push(row.get::<_, f64>(0)?);
        }
        ratings
    };

    if let Some(mean) = mean_rating(&ratings) {
        let rating = clamp_rating(mean);
        tx.execute(
            "UPDATE tutors SET rating = ?2 WHERE id = ?1;",
            params![tutor_id, rating],
        )?;
        debug!(
            "event=rating_recompute module=repo status=ok tutor_id={tutor_id} samples={} rating={rating}",
            ratings.len()
        );
    } else {
        debug!("event=rating_recompute module=repo status=skipped tutor_id={tutor_id} samples=0");
    }

    load_tutor(tx, tutor_id)?.ok_or_else(|| RepoError::not_found(Entity::Tutor, tutor_id))
}
