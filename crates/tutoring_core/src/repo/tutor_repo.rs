//! Tutor directory repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Read tutor profiles joined with account names.
//! - Maintain majors, subject classes and which tutors offer them.
//!
//! # Invariants
//! - Directory listing is deterministic: `last_name, first_name, id`.
//! - Profile updates never touch `rating`; only feedback aggregation does.

use crate::model::tutor::{
    ClassId, Major, MajorId, SubjectClass, Tutor, TutorFilter, TutorId, TutorProfileUpdate,
};
use crate::repo::{
    ensure_schema_ready, is_unique_violation, row_exists, Entity, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const TUTOR_SELECT_SQL: &str = "SELECT
    t.id,
    t.account_id,
    a.first_name,
    a.last_name,
    t.minutes_tutored,
    t.rating,
    t.major_id,
    t.description
FROM tutors t
INNER JOIN accounts a ON a.id = t.account_id";

const CLASS_SELECT_SQL: &str = "SELECT
    c.id,
    c.major_id,
    m.abbreviation,
    c.course_num,
    c.course_name
FROM classes c
INNER JOIN majors m ON m.id = c.major_id";

/// Repository interface for the tutor directory and course catalog.
pub trait TutorRepository {
    fn get_tutor(&self, id: TutorId) -> RepoResult<Option<Tutor>>;
    fn list_tutors(&self, filter: &TutorFilter) -> RepoResult<Vec<Tutor>>;
    fn update_profile(&self, id: TutorId, update: &TutorProfileUpdate) -> RepoResult<Tutor>;
    fn create_major(&self, name: &str, abbreviation: &str) -> RepoResult<Major>;
    fn list_majors(&self) -> RepoResult<Vec<Major>>;
    fn create_class(
        &self,
        major_id: MajorId,
        course_num: i64,
        course_name: Option<&str>,
    ) -> RepoResult<SubjectClass>;
    fn get_class(&self, id: ClassId) -> RepoResult<Option<SubjectClass>>;
    /// Marks `tutor_id` as offering `class_id`. Repeating it is a no-op.
    fn offer_class(&self, class_id: ClassId, tutor_id: TutorId) -> RepoResult<()>;
    fn classes_for_tutor(&self, tutor_id: TutorId) -> RepoResult<Vec<SubjectClass>>;
}

/// SQLite-backed tutor directory repository.
pub struct SqliteTutorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTutorRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TutorRepository for SqliteTutorRepository<'_> {
    fn get_tutor(&self, id: TutorId) -> RepoResult<Option<Tutor>> {
        load_tutor(self.conn, id)
    }

    fn list_tutors(&self, filter: &TutorFilter) -> RepoResult<Vec<Tutor>> {
        let mut sql = format!("{TUTOR_SELECT_SQL} LEFT JOIN majors m ON m.id = t.major_id WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(major) = filter.major.as_ref() {
            sql.push_str(" AND m.name = ?");
            bind_values.push(Value::Text(major.clone()));
        }

        if let Some(search) = filter.search.as_ref() {
            sql.push_str(
                " AND (instr(lower(a.first_name), lower(?)) > 0
                    OR instr(lower(a.last_name), lower(?)) > 0)",
            );
            bind_values.push(Value::Text(search.clone()));
            bind_values.push(Value::Text(search.clone()));
        }

        sql.push_str(" ORDER BY a.last_name ASC, a.first_name ASC, t.id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tutors = Vec::new();
        while let Some(row) = rows.next()? {
            tutors.push(parse_tutor_row(row)?);
        }
        Ok(tutors)
    }

    fn update_profile(&self, id: TutorId, update: &TutorProfileUpdate) -> RepoResult<Tutor> {
        if let Some(major_id) = update.major_id {
            if !row_exists(
                self.conn,
                "SELECT EXISTS(SELECT 1 FROM majors WHERE id = ?1);",
                major_id,
            )? {
                return Err(RepoError::not_found(Entity::Major, major_id));
            }
        }

        let changed = self.conn.execute(
            "UPDATE tutors
             SET
                description = ?2,
                major_id = ?3,
                minutes_tutored = ?4
             WHERE id = ?1;",
            params![
                id,
                update.description.as_deref(),
                update.major_id,
                update.minutes_tutored,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(Entity::Tutor, id));
        }

        load_tutor(self.conn, id)?.ok_or_else(|| RepoError::not_found(Entity::Tutor, id))
    }

    fn create_major(&self, name: &str, abbreviation: &str) -> RepoResult<Major> {
        self.conn
            .execute(
                "INSERT INTO majors (name, abbreviation) VALUES (?1, ?2);",
                params![name, abbreviation],
            )
            .map_err(|err| {
                if is_unique_violation(&err) {
                    RepoError::Duplicate("major name")
                } else {
                    err.into()
                }
            })?;

        Ok(Major {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
        })
    }

    fn list_majors(&self) -> RepoResult<Vec<Major>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, abbreviation FROM majors ORDER BY name ASC;")?;
        let mut rows = stmt.query([])?;
        let mut majors = Vec::new();
        while let Some(row) = rows.next()? {
            majors.push(Major {
                id: row.get("id")?,
                name: row.get("name")?,
                abbreviation: row.get("abbreviation")?,
            });
        }
        Ok(majors)
    }

    fn create_class(
        &self,
        major_id: MajorId,
        course_num: i64,
        course_name: Option<&str>,
    ) -> RepoResult<SubjectClass> {
        if !row_exists(
            self.conn,
            "SELECT EXISTS(SELECT 1 FROM majors WHERE id = ?1);",
            major_id,
        )? {
            return Err(RepoError::not_found(Entity::Major, major_id));
        }

        self.conn
            .execute(
                "INSERT INTO classes (major_id, course_num, course_name) VALUES (?1, ?2, ?3);",
                params![major_id, course_num, course_name],
            )
            .map_err(|err| {
                if is_unique_violation(&err) {
                    RepoError::Duplicate("class course number")
                } else {
                    err.into()
                }
            })?;

        let id = self.conn.last_insert_rowid();
        load_class(self.conn, id)?
            .ok_or_else(|| RepoError::InvalidData(format!("class {id} missing after insert")))
    }

    fn get_class(&self, id: ClassId) -> RepoResult<Option<SubjectClass>> {
        load_class(self.conn, id)
    }

    fn offer_class(&self, class_id: ClassId, tutor_id: TutorId) -> RepoResult<()> {
        if load_class(self.conn, class_id)?.is_none() {
            return Err(RepoError::not_found(Entity::SubjectClass, class_id));
        }
        if !tutor_exists(self.conn, tutor_id)? {
            return Err(RepoError::not_found(Entity::Tutor, tutor_id));
        }

        self.conn.execute(
            "INSERT INTO class_tutors (class_id, tutor_id) VALUES (?1, ?2)
             ON CONFLICT (class_id, tutor_id) DO NOTHING;",
            params![class_id, tutor_id],
        )?;
        Ok(())
    }

    fn classes_for_tutor(&self, tutor_id: TutorId) -> RepoResult<Vec<SubjectClass>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CLASS_SELECT_SQL}
             INNER JOIN class_tutors ct ON ct.class_id = c.id
             WHERE ct.tutor_id = ?1
             ORDER BY m.abbreviation ASC, c.course_num ASC;"
        ))?;
        let mut rows = stmt.query([tutor_id])?;
        let mut classes = Vec::new();
        while let Some(row) = rows.next()? {
            classes.push(parse_class_row(row)?);
        }
        Ok(classes)
    }
}

/// Loads one tutor profile; shared with the feedback and session repositories.
pub(crate) fn load_tutor(conn: &Connection, id: TutorId) -> RepoResult<Option<Tutor>> {
    let tutor = conn
        .query_row(&format!("{TUTOR_SELECT_SQL} WHERE t.id = ?1;"), [id], |row| {
            Ok(parse_tutor_row(row))
        })
        .optional()?
        .transpose()?;
    Ok(tutor)
}

pub(crate) fn tutor_exists(conn: &Connection, id: TutorId) -> RepoResult<bool> {
    row_exists(conn, "SELECT EXISTS(SELECT 1 FROM tutors WHERE id = ?1);", id)
}

fn load_class(conn: &Connection, id: ClassId) -> RepoResult<Option<SubjectClass>> {
    let class = conn
        .query_row(&format!("{CLASS_SELECT_SQL} WHERE c.id = ?1;"), [id], |row| {
            Ok(parse_class_row(row))
        })
        .optional()?
        .transpose()?;
    Ok(class)
}

fn parse_tutor_row(row: &Row<'_>) -> RepoResult<Tutor> {
    let minutes_tutored: i64 = row.get("minutes_tutored")?;
    if minutes_tutored < 0 {
        return Err(RepoError::InvalidData(format!(
            "negative minutes_tutored `{minutes_tutored}` in tutors.minutes_tutored"
        )));
    }

    Ok(Tutor {
        id: row.get("id")?,
        account_id: row.get("account_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        minutes_tutored,
        rating: row.get("rating")?,
        major_id: row.get("major_id")?,
        description: row.get("description")?,
    })
}

fn parse_class_row(row: &Row<'_>) -> RepoResult<SubjectClass> {
    Ok(SubjectClass {
        id: row.get("id")?,
        major_id: row.get("major_id")?,
        major_abbreviation: row.get("abbreviation")?,
        course_num: row.get("course_num")?,
        course_name: row.get("course_name")?,
    })
}
