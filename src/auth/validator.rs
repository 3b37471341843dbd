//! Authentication validator
//!
//! Implements the USER/PASS checks on top of a [`CredentialStore`],
//! including input sanitation of usernames and passwords.

use crate::auth::{CredentialStore, Role};
use crate::error::AuthError;

/// Upper bound on usernames and passwords.
pub const MAX_CREDENTIAL_LENGTH: usize = 64;

/// Performs basic input sanitation to check for malicious or malformed usernames/passwords.
fn is_valid_input(input: &str, max_length: usize) -> bool {
    !input.trim().is_empty() && input.len() <= max_length && !input.contains(['\r', '\n', '\0'])
}

/// Validates that the given username exists in the credential store.
pub fn validate_user(store: &dyn CredentialStore, username: &str) -> Result<(), AuthError> {
    if !is_valid_input(username, MAX_CREDENTIAL_LENGTH) {
        return Err(AuthError::MalformedInput("invalid username format".into()));
    }

    if store.contains_user(username) {
        Ok(())
    } else {
        Err(AuthError::UnknownUser(username.to_string()))
    }
}

/// Validates the password for `username` and returns the account's role.
pub fn validate_password(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> Result<Role, AuthError> {
    if !is_valid_input(password, MAX_CREDENTIAL_LENGTH) {
        return Err(AuthError::MalformedInput("invalid password format".into()));
    }

    store.authenticate(username, password)
}
