//! Role-based command authorization
//!
//! One declarative table decides which roles may run which verb. Adding a
//! role or a command means editing [`PERMISSIONS`], not the handlers.

use crate::auth::Role;
use crate::protocol::Verb;

const EVERYONE: &[Role] = &Role::ALL;

/// Roles allowed to run each verb. Verbs missing here are denied to all.
pub const PERMISSIONS: &[(Verb, &[Role])] = &[
    (Verb::User, EVERYONE),
    (Verb::Pass, EVERYONE),
    (Verb::Quit, EVERYONE),
    (Verb::Pwd, EVERYONE),
    (Verb::Cwd, EVERYONE),
    (Verb::Cdup, EVERYONE),
    (Verb::List, EVERYONE),
    (Verb::Retr, &[Role::Admin, Role::UserLvl1, Role::UserLvl2]),
    (Verb::Stor, &[Role::Admin, Role::UserLvl1]),
    (Verb::Mkd, &[Role::Admin, Role::UserLvl1]),
    (Verb::Dele, &[Role::Admin]),
    (Verb::Rmd, &[Role::Admin]),
];

/// Whether `role` may execute `verb`.
pub fn allowed(role: Role, verb: Verb) -> bool {
    PERMISSIONS
        .iter()
        .find(|(entry, _)| *entry == verb)
        .is_some_and(|(_, roles)| roles.contains(&role))
}
