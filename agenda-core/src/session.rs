//! Bearer token and cached profile, shared by every API call.
//!
//! `Session` is a cheap-to-clone handle injected wherever requests are made.
//! It is initialised from storage when opened and torn down on logout or on
//! the first 401 seen for the current token.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{AgendaError, AgendaResult};
use crate::user::{Role, User};

/// What is persisted between runs, under two fixed keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(rename = "currentUser", skip_serializing_if = "Option::is_none")]
    pub current_user: Option<User>,
}

pub trait SessionStorage: Send + Sync {
    fn load(&self) -> AgendaResult<StoredSession>;
    fn save(&self, session: &StoredSession) -> AgendaResult<()>;
    fn clear(&self) -> AgendaResult<()>;
}

/// TOML file readable only by its owner.
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSessionStorage { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> AgendaResult<StoredSession> {
        if !self.path.exists() {
            return Ok(StoredSession::default());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        toml::from_str(&contents).map_err(|e| {
            AgendaError::Serialization(format!(
                "Failed to parse session from {}: {e}",
                self.path.display()
            ))
        })
    }

    fn save(&self, session: &StoredSession) -> AgendaResult<()> {
        let contents = toml::to_string_pretty(session)
            .map_err(|e| AgendaError::Serialization(format!("Failed to serialize session: {e}")))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&self.path, contents)?;

        // Owner-only (0600) since the file holds a bearer token:
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn clear(&self) -> AgendaResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local storage, for tests and one-shot use.
#[derive(Default)]
pub struct MemorySessionStorage {
    inner: Mutex<StoredSession>,
}

impl MemorySessionStorage {
    pub fn new(initial: StoredSession) -> Self {
        MemorySessionStorage {
            inner: Mutex::new(initial),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoredSession> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> AgendaResult<StoredSession> {
        Ok(self.lock().clone())
    }

    fn save(&self, session: &StoredSession) -> AgendaResult<()> {
        *self.lock() = session.clone();
        Ok(())
    }

    fn clear(&self) -> AgendaResult<()> {
        *self.lock() = StoredSession::default();
        Ok(())
    }
}

impl<S: SessionStorage + ?Sized> SessionStorage for Arc<S> {
    fn load(&self) -> AgendaResult<StoredSession> {
        (**self).load()
    }

    fn save(&self, session: &StoredSession) -> AgendaResult<()> {
        (**self).save(session)
    }

    fn clear(&self) -> AgendaResult<()> {
        (**self).clear()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Unauthenticated,
    /// A stored token exists but has not been checked against the server yet.
    Unverified,
    Authenticated(User),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

/// Token captured for one request, tagged with the session epoch it belongs to.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub token: String,
    pub epoch: u64,
}

struct SessionState {
    token: Option<String>,
    user: Option<User>,
    /// Bumped whenever the token changes, so a 401 for an old token can't end
    /// a newer session.
    epoch: u64,
}

struct SessionInner {
    storage: Box<dyn SessionStorage>,
    state: Mutex<SessionState>,
    auth_tx: watch::Sender<AuthState>,
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Read whatever the storage holds. Unreadable storage starts a clean,
    /// unauthenticated session.
    pub fn open(storage: impl SessionStorage + 'static) -> Self {
        let stored = storage.load().unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable session: {e}");
            StoredSession::default()
        });

        let initial = if stored.token.is_some() {
            AuthState::Unverified
        } else {
            AuthState::Unauthenticated
        };
        let (auth_tx, _) = watch::channel(initial);

        Session {
            inner: Arc::new(SessionInner {
                storage: Box::new(storage),
                state: Mutex::new(SessionState {
                    token: stored.token,
                    user: stored.current_user,
                    epoch: 0,
                }),
                auth_tx,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    pub fn credentials(&self) -> Option<Credentials> {
        let state = self.lock();
        state.token.as_ref().map(|token| Credentials {
            token: token.clone(),
            epoch: state.epoch,
        })
    }

    /// Cached profile (may be stale until the session has been verified).
    pub fn current_user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    pub fn role(&self) -> Option<Role> {
        self.lock().user.as_ref().map(|u| u.role)
    }

    pub fn auth_state(&self) -> AuthState {
        self.inner.auth_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.auth_tx.subscribe()
    }

    /// Store a freshly issued token and profile.
    pub fn establish(&self, token: String, user: User) -> AgendaResult<()> {
        let mut state = self.lock();
        self.inner.storage.save(&StoredSession {
            token: Some(token.clone()),
            current_user: Some(user.clone()),
        })?;
        state.token = Some(token);
        state.user = Some(user.clone());
        state.epoch += 1;
        drop(state);

        self.inner.auth_tx.send_replace(AuthState::Authenticated(user));
        Ok(())
    }

    /// Record the profile returned by session introspection.
    pub fn confirm(&self, user: User) -> AgendaResult<()> {
        let mut state = self.lock();
        self.inner.storage.save(&StoredSession {
            token: state.token.clone(),
            current_user: Some(user.clone()),
        })?;
        state.user = Some(user.clone());
        drop(state);

        self.inner.auth_tx.send_replace(AuthState::Authenticated(user));
        Ok(())
    }

    /// Clear token and profile unconditionally.
    pub fn logout(&self) -> AgendaResult<()> {
        let mut state = self.lock();
        state.token = None;
        state.user = None;
        state.epoch += 1;
        let result = self.inner.storage.clear();
        drop(state);

        self.inner.auth_tx.send_replace(AuthState::Unauthenticated);
        result
    }

    /// Forced logout after the server rejected the token from `epoch`.
    ///
    /// Returns `true` only for the call that actually ended the session; any
    /// other 401s for the same token are no-ops.
    pub fn expire(&self, epoch: u64) -> bool {
        let mut state = self.lock();
        if state.epoch != epoch || state.token.is_none() {
            return false;
        }

        state.token = None;
        state.user = None;
        state.epoch += 1;
        if let Err(e) = self.inner.storage.clear() {
            tracing::error!("Failed to clear stored session: {e}");
        }
        drop(state);

        tracing::warn!("Session expired; logged out");
        self.inner.auth_tx.send_replace(AuthState::Unauthenticated);
        true
    }
}
