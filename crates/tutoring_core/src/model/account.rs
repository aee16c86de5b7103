//! Account and role-profile model.
//!
//! # Responsibility
//! - Define accounts, their single role, and the profile record each role
//!   implies.
//! - Validate and normalize new-account input.
//!
//! # Invariants
//! - An account has exactly one `Role` at a time.
//! - A `RoleProfile` variant always matches the role it was created for.
//! - Stored emails have a lowercase domain part.

use crate::model::tutor::TutorId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AccountId = i64;
pub type StudentId = i64;
pub type AdminId = i64;

/// Maximum length of first/last name fields.
pub const NAME_MAX_CHARS: usize = 30;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

/// Role of an account. Replaces independent student/tutor/admin flags so
/// that two roles can never be active at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Tutor,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Tutor, Role::Admin];

    /// Storage/wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Tutor => "tutor",
            Self::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Self::Student),
            "tutor" => Some(Self::Tutor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl Account {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Profile record attached to an account according to its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum RoleProfile {
    Student(StudentId),
    Tutor(TutorId),
    Admin(AdminId),
}

impl RoleProfile {
    pub fn new(role: Role, profile_id: i64) -> Self {
        match role {
            Role::Student => Self::Student(profile_id),
            Role::Tutor => Self::Tutor(profile_id),
            Role::Admin => Self::Admin(profile_id),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::Student(_) => Role::Student,
            Self::Tutor(_) => Role::Tutor,
            Self::Admin(_) => Role::Admin,
        }
    }

    pub fn profile_id(&self) -> i64 {
        match *self {
            Self::Student(id) | Self::Tutor(id) | Self::Admin(id) => id,
        }
    }

    pub fn student_id(&self) -> Option<StudentId> {
        match *self {
            Self::Student(id) => Some(id),
            _ => None,
        }
    }

    pub fn tutor_id(&self) -> Option<TutorId> {
        match *self {
            Self::Tutor(id) => Some(id),
            _ => None,
        }
    }
}

/// An account together with the one profile its role implies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredAccount {
    pub account: Account,
    pub profile: RoleProfile,
}

/// Input for account creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl NewAccount {
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            role,
        }
    }

    /// Returns a trimmed copy with a normalized email, or the first field
    /// that fails validation.
    pub fn normalized(&self) -> Result<NewAccount, AccountValidationError> {
        Ok(NewAccount {
            email: normalize_email(&self.email)?,
            first_name: normalize_name("first_name", &self.first_name)?,
            last_name: normalize_name("last_name", &self.last_name)?,
            role: self.role,
        })
    }
}

/// Validation failure for account input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyField(&'static str),
    FieldTooLong { field: &'static str, max: usize },
    InvalidEmail,
}

impl Display for AccountValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{field} must be set"),
            Self::FieldTooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            Self::InvalidEmail => write!(f, "email address is not valid"),
        }
    }
}

impl Error for AccountValidationError {}

/// Trims the address and lowercases its domain part.
pub fn normalize_email(email: &str) -> Result<String, AccountValidationError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(AccountValidationError::EmptyField("email"));
    }
    if !EMAIL_RE.is_match(trimmed) {
        return Err(AccountValidationError::InvalidEmail);
    }
    let (local, domain) = trimmed
        .rsplit_once('@')
        .ok_or(AccountValidationError::InvalidEmail)?;
    Ok(format!("{local}@{}", domain.to_lowercase()))
}

fn normalize_name(field: &'static str, value: &str) -> Result<String, AccountValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AccountValidationError::EmptyField(field));
    }
    if trimmed.chars().count() > NAME_MAX_CHARS {
        return Err(AccountValidationError::FieldTooLong {
            field,
            max: NAME_MAX_CHARS,
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_domain_is_lowercased_but_local_part_kept() {
        assert_eq!(
            normalize_email("  Ada.Lovelace@Example.EDU ").unwrap(),
            "Ada.Lovelace@example.edu"
        );
    }

    #[test]
    fn malformed_email_is_rejected() {
        assert_eq!(
            normalize_email("no-at-sign"),
            Err(AccountValidationError::InvalidEmail)
        );
        assert_eq!(
            normalize_email("   "),
            Err(AccountValidationError::EmptyField("email"))
        );
    }

    #[test]
    fn long_names_are_rejected() {
        let input = NewAccount::new("a@b.co", "x".repeat(31), "Smith", Role::Student);
        assert_eq!(
            input.normalized(),
            Err(AccountValidationError::FieldTooLong {
                field: "first_name",
                max: NAME_MAX_CHARS
            })
        );
    }

    #[test]
    fn role_profile_reports_matching_role() {
        for role in Role::ALL {
            let profile = RoleProfile::new(role, 3);
            assert_eq!(profile.role(), role);
            assert_eq!(profile.profile_id(), 3);
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }
}
