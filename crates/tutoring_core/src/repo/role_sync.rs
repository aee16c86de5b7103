//! Role-profile reconciliation.
//!
//! # Responsibility
//! - Keep exactly one profile row (`students`, `tutors` or `admins`) per
//!   account, matching the account's role.
//!
//! # Invariants
//! - Both entry points run on the caller's open transaction; they never
//!   commit. A failure leaves the caller to drop (roll back) the whole unit.
//! - `on_account_updated` is idempotent: an account already in the right
//!   state produces no row changes.
//! - `UNIQUE(account_id)` on each profile table backstops concurrent
//!   get-or-create races.

use crate::model::account::{Account, AccountId, Role, RoleProfile};
use crate::repo::{RepoError, RepoResult};
use log::debug;
use rusqlite::{Connection, OptionalExtension, Transaction};

fn profile_table(role: Role) -> &'static str {
    match role {
        Role::Student => "students",
        Role::Tutor => "tutors",
        Role::Admin => "admins",
    }
}

/// Creates the one profile matching a freshly inserted account.
pub fn on_account_created(tx: &Transaction<'_>, account: &Account) -> RepoResult<RoleProfile> {
    let table = profile_table(account.role);
    tx.execute(
        &format!("INSERT INTO {table} (account_id) VALUES (?1);"),
        [account.id],
    )?;
    let profile = RoleProfile::new(account.role, tx.last_insert_rowid());
    debug!(
        "event=role_sync module=repo status=ok trigger=created account_id={} role={}",
        account.id, account.role
    );
    Ok(profile)
}

/// Gets or creates the profile matching the account's role and deletes
/// every profile of another role.
pub fn on_account_updated(tx: &Transaction<'_>, account: &Account) -> RepoResult<RoleProfile> {
    let table = profile_table(account.role);
    let created = tx.execute(
        &format!("INSERT INTO {table} (account_id) VALUES (?1) ON CONFLICT (account_id) DO NOTHING;"),
        [account.id],
    )?;
    let profile_id = profile_id_for(tx, account.role, account.id)?.ok_or_else(|| {
        RepoError::InvalidData(format!(
            "{table} row missing after get-or-create for account {}",
            account.id
        ))
    })?;

    let mut removed = 0;
    for other in Role::ALL.into_iter().filter(|role| *role != account.role) {
        removed += tx.execute(
            &format!("DELETE FROM {} WHERE account_id = ?1;", profile_table(other)),
            [account.id],
        )?;
    }

    debug!(
        "event=role_sync module=repo status=ok trigger=updated account_id={} role={} created={} removed={}",
        account.id, account.role, created, removed
    );
    Ok(RoleProfile::new(account.role, profile_id))
}

/// Lists every profile row owned by an account, in `Role::ALL` order.
pub fn load_role_profiles(conn: &Connection, account_id: AccountId) -> RepoResult<Vec<RoleProfile>> {
    let mut profiles = Vec::new();
    for role in Role::ALL {
        if let Some(id) = profile_id_for(conn, role, account_id)? {
            profiles.push(RoleProfile::new(role, id));
        }
    }
    Ok(profiles)
}

fn profile_id_for(conn: &Connection, role: Role, account_id: AccountId) -> RepoResult<Option<i64>> {
    let id = conn
        .query_row(
            &format!(
                "SELECT id FROM {} WHERE account_id = ?1;",
                profile_table(role)
            ),
            [account_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}
