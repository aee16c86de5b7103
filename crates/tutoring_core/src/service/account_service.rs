//! Account and role management use-cases.
//!
//! # Responsibility
//! - Validate account input before persistence.
//! - Route every role change through one explicit entry point so profile
//!   reconciliation always runs with it.
//!
//! # Invariants
//! - After any successful call, the account owns exactly one profile and it
//!   matches the account's role.
//! - A failed call leaves both role and profiles as they were.

use crate::error::ErrorKind;
use crate::model::account::{
    normalize_email, Account, AccountId, AccountValidationError, NewAccount, RegisteredAccount,
    Role, RoleProfile,
};
use crate::repo::account_repo::AccountRepository;
use crate::repo::{Entity, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from account use-cases.
#[derive(Debug)]
pub enum AccountError {
    Validation(AccountValidationError),
    /// Another account already uses the email.
    EmailTaken,
    AccountNotFound(AccountId),
    Repo(RepoError),
}

impl AccountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::EmailTaken => ErrorKind::ValidationError,
            Self::AccountNotFound(_) => ErrorKind::NotFound,
            Self::Repo(_) => ErrorKind::StorageFailure,
        }
    }
}

impl Display for AccountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::EmailTaken => write!(f, "email address is already registered"),
            Self::AccountNotFound(id) => write!(f, "account not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AccountValidationError> for AccountError {
    fn from(value: AccountValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for AccountError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: Entity::Account,
                id,
            } => Self::AccountNotFound(id),
            RepoError::Duplicate(_) => Self::EmailTaken,
            other => Self::Repo(other),
        }
    }
}

/// Account service facade over repository implementations.
pub struct AccountService<R: AccountRepository> {
    repo: R,
}

impl<R: AccountRepository> AccountService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an account and the profile its role implies, atomically.
    pub fn create_account(&mut self, input: NewAccount) -> Result<RegisteredAccount, AccountError> {
        let normalized = input.normalized()?;
        match self.repo.create_account(&normalized) {
            Ok(registered) => {
                info!(
                    "event=account_create module=service status=ok account_id={} role={} profile_id={}",
                    registered.account.id,
                    registered.account.role,
                    registered.profile.profile_id()
                );
                Ok(registered)
            }
            Err(err) => {
                warn!(
                    "event=account_create module=service status=error role={} error={}",
                    normalized.role, err
                );
                Err(err.into())
            }
        }
    }

    /// Switches the account to `role`, creating the matching profile if
    /// needed and removing the others. Repeating the current role is a no-op.
    pub fn change_role(
        &mut self,
        id: AccountId,
        role: Role,
    ) -> Result<RegisteredAccount, AccountError> {
        let registered = self.repo.change_role(id, role).map_err(|err| {
            warn!(
                "event=account_role_change module=service status=error account_id={id} role={role} error={err}"
            );
            AccountError::from(err)
        })?;
        info!(
            "event=account_role_change module=service status=ok account_id={id} role={role} profile_id={}",
            registered.profile.profile_id()
        );
        Ok(registered)
    }

    pub fn get_account(&self, id: AccountId) -> Result<Account, AccountError> {
        self.repo
            .get_account(id)?
            .ok_or(AccountError::AccountNotFound(id))
    }

    /// Looks up an account by email, normalizing the address first.
    pub fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let normalized = normalize_email(email)?;
        Ok(self.repo.find_by_email(&normalized)?)
    }

    /// Every profile row the account currently owns.
    pub fn role_profiles(&self, id: AccountId) -> Result<Vec<RoleProfile>, AccountError> {
        if self.repo.get_account(id)?.is_none() {
            return Err(AccountError::AccountNotFound(id));
        }
        Ok(self.repo.role_profiles(id)?)
    }
}
