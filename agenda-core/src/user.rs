//! Accounts known to the backend and the lookup tables built from them.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    #[serde(rename = "user")]
    User,
    /// Room-bound account; its location filter is pinned to the meeting room.
    #[serde(rename = "salaWit")]
    SalaWit,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::SalaWit => "salaWit",
        }
    }

    pub fn is_room_bound(&self) -> bool {
        matches!(self, Role::SalaWit)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "user" => Ok(Role::User),
            "salaWit" | "sala-wit" => Ok(Role::SalaWit),
            other => Err(format!("Unknown role '{other}'. Expected 'user' or 'salaWit'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Users indexed by id (for resolving fetched meetings) and by display name
/// (for preparing writes). Later entries win when two users share a name.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: Vec<User>,
    by_id: HashMap<i64, usize>,
    by_name: HashMap<String, usize>,
}

impl UserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        let mut by_id = HashMap::with_capacity(users.len());
        let mut by_name = HashMap::with_capacity(users.len());

        for (idx, user) in users.iter().enumerate() {
            by_id.insert(user.id, idx);
            by_name.insert(user.name.clone(), idx);
        }

        UserDirectory {
            users,
            by_id,
            by_name,
        }
    }

    pub fn by_id(&self, id: i64) -> Option<&User> {
        self.by_id.get(&id).map(|&idx| &self.users[idx])
    }

    pub fn by_name(&self, name: &str) -> Option<&User> {
        self.by_name.get(name).map(|&idx| &self.users[idx])
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Display names in backend order, used to populate executive pickers.
    pub fn names(&self) -> Vec<String> {
        self.users.iter().map(|u| u.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
