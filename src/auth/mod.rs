//! Authentication system
//!
//! Handles user authentication, credential validation, and role-based
//! authorization.

pub mod credentials;
pub mod policy;
pub mod role;
pub mod validator;

pub use credentials::{Credential, CredentialStore, StaticCredentials};
pub use policy::allowed;
pub use role::Role;
pub use validator::{validate_password, validate_user};
