//! Account repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist accounts and their role.
//! - Run role-profile reconciliation in the same transaction as every
//!   account write.
//!
//! # Invariants
//! - `create_account` and `change_role` are all-or-nothing: the role column
//!   and the profile rows are committed together or not at all.
//! - Emails are unique; a clash is reported as `RepoError::Duplicate`.

use crate::model::account::{Account, AccountId, NewAccount, RegisteredAccount, Role, RoleProfile};
use crate::repo::role_sync::{load_role_profiles, on_account_created, on_account_updated};
use crate::repo::{ensure_schema_ready, is_unique_violation, Entity, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

const ACCOUNT_SELECT_SQL: &str = "SELECT id, email, first_name, last_name, role FROM accounts";

/// Repository interface for account persistence.
pub trait AccountRepository {
    /// Inserts an already-normalized account together with its profile.
    fn create_account(&mut self, account: &NewAccount) -> RepoResult<RegisteredAccount>;
    /// Writes a new role and reconciles profile rows.
    fn change_role(&mut self, id: AccountId, role: Role) -> RepoResult<RegisteredAccount>;
    fn get_account(&self, id: AccountId) -> RepoResult<Option<Account>>;
    fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>>;
    /// Every profile row currently owned by the account.
    fn role_profiles(&self, id: AccountId) -> RepoResult<Vec<RoleProfile>>;
}

/// SQLite-backed account repository.
pub struct SqliteAccountRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteAccountRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl AccountRepository for SqliteAccountRepository<'_> {
    fn create_account(&mut self, account: &NewAccount) -> RepoResult<RegisteredAccount> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO accounts (email, first_name, last_name, role)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                account.email.as_str(),
                account.first_name.as_str(),
                account.last_name.as_str(),
                account.role.as_str(),
            ],
        )
        .map_err(|err| {
            if is_unique_violation(&err) {
                RepoError::Duplicate("email")
            } else {
                err.into()
            }
        })?;

        let id = tx.last_insert_rowid();
        let stored = load_account(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("account {id} missing after insert"))
        })?;
        let profile = on_account_created(&tx, &stored)?;
        tx.commit()?;

        Ok(RegisteredAccount {
            account: stored,
            profile,
        })
    }

    fn change_role(&mut self, id: AccountId, role: Role) -> RepoResult<RegisteredAccount> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE accounts
             SET
                role = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, role.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(Entity::Account, id));
        }

        let stored = load_account(&tx, id)?
            .ok_or_else(|| RepoError::not_found(Entity::Account, id))?;
        let profile = on_account_updated(&tx, &stored)?;
        tx.commit()?;

        Ok(RegisteredAccount {
            account: stored,
            profile,
        })
    }

    fn get_account(&self, id: AccountId) -> RepoResult<Option<Account>> {
        load_account(self.conn, id)
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>> {
        let account = self
            .conn
            .query_row(
                &format!("{ACCOUNT_SELECT_SQL} WHERE email = ?1;"),
                [email],
                |row| Ok(parse_account_row(row)),
            )
            .optional()?
            .transpose()?;
        Ok(account)
    }

    fn role_profiles(&self, id: AccountId) -> RepoResult<Vec<RoleProfile>> {
        load_role_profiles(self.conn, id)
    }
}

fn load_account(conn: &Connection, id: AccountId) -> RepoResult<Option<Account>> {
    let account = conn
        .query_row(
            &format!("{ACCOUNT_SELECT_SQL} WHERE id = ?1;"),
            [id],
            |row| Ok(parse_account_row(row)),
        )
        .optional()?
        .transpose()?;
    Ok(account)
}

fn parse_account_row(row: &Row<'_>) -> RepoResult<Account> {
    let role_text: String = row.get("role")?;
    let role = Role::parse(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid role `{role_text}` in accounts.role"))
    })?;

    Ok(Account {
        id: row.get("id")?,
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        role,
    })
}
