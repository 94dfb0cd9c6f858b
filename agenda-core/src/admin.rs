//! Account management: list, create, edit and delete users.

use serde::{Deserialize, Serialize};

use crate::constants::MIN_PASSWORD_LEN;
use crate::error::{AgendaError, AgendaResult};
use crate::gateway::Gateway;
use crate::repository::RefreshOutcome;
use crate::user::{Role, User};

/// Body of `POST /users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl NewUser {
    /// Trim fields and check that everything required is present.
    pub fn normalized(self) -> AgendaResult<Self> {
        let user = NewUser {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
            role: self.role,
        };

        if user.name.is_empty() || user.email.is_empty() || user.password.is_empty() {
            return Err(AgendaError::Validation(
                "Name, email and password are required".into(),
            ));
        }
        check_password(&user.password)?;
        Ok(user)
    }
}

/// Body of `PUT /users/:id`; only the fields being changed are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserUpdate {
    /// Drop blank fields, validate the password if one is given, and refuse
    /// an update that changes nothing.
    pub fn normalized(self) -> AgendaResult<Self> {
        let trimmed = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };

        let update = UserUpdate {
            name: trimmed(self.name),
            email: trimmed(self.email),
            password: self.password.filter(|p| !p.is_empty()),
            role: self.role,
        };

        if let Some(password) = &update.password {
            check_password(password)?;
        }

        if update == UserUpdate::default() {
            return Err(AgendaError::Validation("No changes to save".into()));
        }
        Ok(update)
    }
}

fn check_password(password: &str) -> AgendaResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AgendaError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// User list kept in sync with the server: every successful mutation is
/// followed by a fresh `GET /users`.
pub struct UserAdmin {
    gateway: Gateway,
    users: Vec<User>,
}

impl UserAdmin {
    pub fn new(gateway: Gateway) -> Self {
        UserAdmin {
            gateway,
            users: Vec::new(),
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn find(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub async fn refresh(&mut self) -> AgendaResult<&[User]> {
        self.users = self.gateway.list_users().await?;
        Ok(&self.users)
    }

    /// Refetch after a confirmed mutation. Only auth failures are errors;
    /// otherwise the previous list is kept and reported as stale.
    async fn resync(&mut self) -> AgendaResult<RefreshOutcome> {
        match self.refresh().await {
            Ok(_) => Ok(RefreshOutcome::Applied),
            Err(e) if e.is_auth_failure() => Err(e),
            Err(e) => {
                tracing::warn!("Change saved but the user list could not be reloaded: {e}");
                Ok(RefreshOutcome::Stale)
            }
        }
    }

    pub async fn create(&mut self, user: NewUser) -> AgendaResult<RefreshOutcome> {
        let user = user.normalized()?;
        self.gateway.create_user(&user).await?;
        tracing::info!("Created user {}", user.email);
        self.resync().await
    }

    pub async fn update(&mut self, id: i64, update: UserUpdate) -> AgendaResult<RefreshOutcome> {
        let update = update.normalized()?;
        self.gateway.update_user(id, &update).await?;
        tracing::info!("Updated user {id}");
        self.resync().await
    }

    pub async fn delete(&mut self, id: i64) -> AgendaResult<RefreshOutcome> {
        self.gateway.delete_user(id).await?;
        tracing::info!("Deleted user {id}");
        self.resync().await
    }
}
