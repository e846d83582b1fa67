use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Cleaner,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => write!(f, "host"),
            Role::Cleaner => write!(f, "cleaner"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "host" => Ok(Role::Host),
            "cleaner" => Ok(Role::Cleaner),
            "admin" => Ok(Role::Admin),
            other => Err(Error::InvalidRole(other.to_string())),
        }
    }
}

/// A registered account. The role is fixed at registration; there is no
/// role-change operation.
#[derive(Debug, Clone)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Registration and login records. Append-only in this scope: accounts are
/// never deleted and roles never change.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: HashMap<u64, User>,
    by_email: HashMap<String, u64>,
    next_id: u64,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new account. The password must already be hashed; plaintext
    /// never reaches the directory.
    pub fn register(
        &mut self,
        email: &str,
        password_hash: String,
        role: Role,
        name: Option<String>,
    ) -> Result<&User> {
        let email = email.trim().to_ascii_lowercase();
        if self.by_email.contains_key(&email) {
            return Err(Error::EmailTaken);
        }

        self.next_id += 1;
        let id = self.next_id;
        let user = User {
            id,
            email: email.clone(),
            password_hash,
            role,
            name,
            created_at: Utc::now(),
        };
        self.by_email.insert(email, id);
        self.users.insert(id, user);
        tracing::info!(user_id = id, role = %role, "User registered");
        Ok(&self.users[&id])
    }

    pub fn get(&self, id: u64) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        let email = email.trim().to_ascii_lowercase();
        self.by_email.get(&email).and_then(|id| self.users.get(id))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
