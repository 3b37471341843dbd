//! Module `state`
//!
//! Defines the `Session` struct holding the mutable state of one control
//! connection: login progress, the authenticated user and role, and the
//! session's own working directory.

use std::net::SocketAddr;

use crate::auth::Role;

/// State of one connected FTP client.
///
/// Owned by the task serving the connection and never shared. The working
/// directory is a virtual path where `/` is the server root.
#[derive(Debug)]
pub struct Session {
    peer_addr: SocketAddr,
    pending_user: Option<String>,
    authenticated: bool,
    username: Option<String>,
    role: Option<Role>,
    current_dir: String,
}

impl Session {
    pub fn new(peer_addr: SocketAddr) -> Self {
        Self {
            peer_addr,
            pending_user: None,
            authenticated: false,
            username: None,
            role: None,
            current_dir: "/".to_string(),
        }
    }

    /// Records a username accepted by USER. Any previous login is dropped.
    pub fn begin_login(&mut self, username: String) {
        self.logout();
        self.pending_user = Some(username);
    }

    /// Takes the username recorded by the last USER, if any.
    ///
    /// PASS always consumes it, so a failed password needs a new USER.
    pub fn take_pending_user(&mut self) -> Option<String> {
        self.pending_user.take()
    }

    pub fn complete_login(&mut self, username: String, role: Role) {
        self.pending_user = None;
        self.authenticated = true;
        self.username = Some(username);
        self.role = Some(role);
    }

    /// Resets the session to its freshly connected state.
    pub fn logout(&mut self) {
        self.pending_user = None;
        self.authenticated = false;
        self.username = None;
        self.role = None;
        self.current_dir = "/".to_string();
    }

    // --------------------
    // Getter methods
    // --------------------

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn has_pending_user(&self) -> bool {
        self.pending_user.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Role of the logged-in user; `None` before PASS succeeds.
    pub fn role(&self) -> Option<Role> {
        self.role.filter(|_| self.authenticated)
    }

    pub fn current_dir(&self) -> &str {
        &self.current_dir
    }

    // --------------------
    // Setter methods
    // --------------------

    pub fn set_current_dir(&mut self, path: String) {
        self.current_dir = path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new("127.0.0.1:50000".parse().unwrap())
    }

    #[test]
    fn starts_unauthenticated_at_root() {
        let s = session();
        assert!(!s.is_authenticated());
        assert_eq!(s.role(), None);
        assert_eq!(s.current_dir(), "/");
    }

    #[test]
    fn login_round() {
        let mut s = session();
        s.begin_login("admin".into());
        assert!(s.has_pending_user());
        let user = s.take_pending_user().unwrap();
        s.complete_login(user, Role::Admin);
        assert!(s.is_authenticated());
        assert_eq!(s.username(), Some("admin"));
        assert_eq!(s.role(), Some(Role::Admin));
        assert!(!s.has_pending_user());
    }

    #[test]
    fn new_user_command_drops_previous_login() {
        let mut s = session();
        s.complete_login("admin".into(), Role::Admin);
        s.set_current_dir("/Uploads".into());
        s.begin_login("user3".into());
        assert!(!s.is_authenticated());
        assert_eq!(s.role(), None);
        assert_eq!(s.current_dir(), "/");
    }
}
