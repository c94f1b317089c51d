//! # Session State
//!
//! In-memory mirror of the logged-in user.
//!
//! ```text
//! login / register ──► set(Some(user)) ──► session table (slot 1)
//! logout / delete  ──► set(None)       ──► session table cleared
//! profile edits    ──► refresh(user)   (only if it is the same id)
//! ```
//!
//! The mirror is written after the database, never before, so a failed
//! save leaves the previous user in place.

use std::sync::{Arc, Mutex};

use lowlow_core::User;

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    user: Arc<Mutex<Option<User>>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current user.
    pub fn current(&self) -> Option<User> {
        self.user.lock().expect("Session mutex poisoned").clone()
    }

    pub fn set(&self, user: Option<User>) {
        *self.user.lock().expect("Session mutex poisoned") = user;
    }

    /// Replaces the mirror if `user` is the logged-in account.
    ///
    /// Returns `true` if it was.
    pub fn refresh(&self, user: &User) -> bool {
        let mut current = self.user.lock().expect("Session mutex poisoned");
        match current.as_mut() {
            Some(existing) if existing.id == user.id => {
                *existing = user.clone();
                true
            }
            _ => false,
        }
    }

    /// Checks whether `id` is the logged-in account.
    pub fn is(&self, id: &str) -> bool {
        self.user
            .lock()
            .expect("Session mutex poisoned")
            .as_ref()
            .is_some_and(|u| u.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lowlow_core::{timestamp, Money, Role};

    fn user(id: &str, nickname: &str) -> User {
        let now = timestamp();
        User {
            id: id.to_string(),
            role: Role::User,
            email: format!("{}@lowlow.kz", id),
            password_hash: String::new(),
            nickname: Some(nickname.to_string()),
            company_name: None,
            is_active: true,
            balance: Money::zero(),
            avatar: None,
            first_name: None,
            phone: None,
            city: None,
            address: None,
            bin: None,
            director_first_name: None,
            director_last_name: None,
            opening_time: None,
            closing_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_refresh_only_same_user() {
        let session = SessionState::new();
        assert!(!session.refresh(&user("a", "Anna")));
        assert!(session.current().is_none());

        session.set(Some(user("a", "Anna")));
        assert!(!session.refresh(&user("b", "Bota")));
        assert!(session.refresh(&user("a", "Anel")));
        assert_eq!(session.current().unwrap().nickname.as_deref(), Some("Anel"));
        assert!(session.is("a"));

        session.set(None);
        assert!(!session.is("a"));
    }
}
