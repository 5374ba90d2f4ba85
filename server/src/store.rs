//! User directory behind the registration endpoint.
//!
//! Persistence is pluggable through [`UserStore`]; [`MemoryUserStore`] is the
//! process-local implementation the binary runs with.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    #[default]
    Volunteer,
    Admin,
    ProjectLead,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string. Never serialised.
    pub password_hash: String,
    pub role: Role,
    pub profile_complete: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            profile_complete: self.profile_complete,
        }
    }
}

/// Public view of a user returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile_complete: bool,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user with email {0} already exists")]
    Duplicate(String),
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

pub trait UserStore: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert a user. Fails with [`StoreError::Duplicate`] if the email is taken.
    fn insert(&self, user: NewUser) -> Result<User, StoreError>;
}

/// In-memory [`UserStore`] keyed by email.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.lock().map(|users| users.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserStore for MemoryUserStore {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self
            .users
            .lock()
            .map_err(|_| StoreError::Unavailable("user table lock poisoned".to_string()))?;
        Ok(users.get(email).cloned())
    }

    fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| StoreError::Unavailable("user table lock poisoned".to_string()))?;
        if users.contains_key(&user.email) {
            return Err(StoreError::Duplicate(user.email));
        }

        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: Role::default(),
            profile_complete: false,
            created_at: Utc::now(),
        };
        users.insert(created.email.clone(), created.clone());
        Ok(created)
    }
}
