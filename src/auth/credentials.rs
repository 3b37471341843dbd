//! Credential storage and management
//!
//! Identity verification sits behind [`CredentialStore`] so the protocol
//! engine never depends on where accounts are kept.

use std::collections::HashMap;

use serde::Deserialize;

use crate::auth::Role;
use crate::error::AuthError;

/// Accounts shipped with the server when the configuration lists none.
const BUILTIN_ACCOUNTS: &[(&str, &str, Role)] = &[
    ("admin", "admin123", Role::Admin),
    ("user1", "user123", Role::UserLvl1),
    ("user2", "user456", Role::UserLvl2),
    ("user3", "user789", Role::UserLvl3),
];

/// One account entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Backing store for identity verification.
pub trait CredentialStore: Send + Sync {
    /// Whether `username` names a known account.
    fn contains_user(&self, username: &str) -> bool;

    /// Verifies the password and returns the account's role.
    fn authenticate(&self, username: &str, password: &str) -> Result<Role, AuthError>;
}

/// Immutable in-memory credential table, read-only after startup.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    accounts: HashMap<String, Credential>,
}

impl StaticCredentials {
    pub fn from_entries(entries: impl IntoIterator<Item = Credential>) -> Self {
        let accounts = entries
            .into_iter()
            .map(|credential| (credential.username.clone(), credential))
            .collect();
        Self { accounts }
    }

    /// Uses `entries` when non-empty, the built-in accounts otherwise.
    pub fn from_config(entries: &[Credential]) -> Self {
        if entries.is_empty() {
            Self::default()
        } else {
            Self::from_entries(entries.iter().cloned())
        }
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

impl Default for StaticCredentials {
    fn default() -> Self {
        Self::from_entries(BUILTIN_ACCOUNTS.iter().map(|(username, password, role)| {
            Credential {
                username: username.to_string(),
                password: password.to_string(),
                role: *role,
            }
        }))
    }
}

impl CredentialStore for StaticCredentials {
    fn contains_user(&self, username: &str) -> bool {
        self.accounts.contains_key(username)
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<Role, AuthError> {
        match self.accounts.get(username) {
            Some(account) if account.password == password => Ok(account.role),
            Some(_) => Err(AuthError::InvalidPassword(username.to_string())),
            None => Err(AuthError::UnknownUser(username.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_accounts_cover_every_role() {
        let store = StaticCredentials::default();
        assert_eq!(store.authenticate("admin", "admin123").unwrap(), Role::Admin);
        assert_eq!(store.authenticate("user1", "user123").unwrap(), Role::UserLvl1);
        assert_eq!(store.authenticate("user2", "user456").unwrap(), Role::UserLvl2);
        assert_eq!(store.authenticate("user3", "user789").unwrap(), Role::UserLvl3);
    }

    #[test]
    fn wrong_password_and_unknown_user_differ() {
        let store = StaticCredentials::default();
        assert!(matches!(
            store.authenticate("admin", "nope"),
            Err(AuthError::InvalidPassword(_))
        ));
        assert!(matches!(
            store.authenticate("mallory", "admin123"),
            Err(AuthError::UnknownUser(_))
        ));
    }

    #[test]
    fn configured_entries_replace_builtins() {
        let store = StaticCredentials::from_config(&[Credential {
            username: "ops".into(),
            password: "hunter2".into(),
            role: Role::UserLvl2,
        }]);
        assert_eq!(store.account_count(), 1);
        assert!(store.contains_user("ops"));
        assert!(!store.contains_user("admin"));
    }
}
